/// Contributor model and database operations
///
/// A contributor row joins a user to a project and is what grants access to
/// everything scoped under that project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contributors (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT contributors_project_user_key UNIQUE (project_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::models::contributor::{Contributor, CreateContributor};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
/// Contributor::create(&pool, CreateContributor { project_id, user_id }).await?;
///
/// assert!(Contributor::is_contributor(&pool, project_id, user_id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Name of the unique constraint on `(project_id, user_id)`
pub const UNIQUE_CONSTRAINT: &str = "contributors_project_user_key";

/// Contributor row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contributor {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a user to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContributor {
    pub project_id: i64,
    pub user_id: i64,
}

impl Contributor {
    /// Adds a user to a project
    ///
    /// Accepts any executor so project creation can run it inside its
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`UNIQUE_CONSTRAINT`] if the user
    /// already contributes, or a foreign-key violation if the user or project
    /// does not exist.
    pub async fn create<'e, E>(executor: E, data: CreateContributor) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Contributor>(
            r#"
            INSERT INTO contributors (project_id, user_id)
            VALUES ($1, $2)
            RETURNING id, user_id, project_id, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .fetch_one(executor)
        .await
    }

    /// Checks whether a user contributes to a project
    pub async fn is_contributor(
        pool: &PgPool,
        project_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contributors
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Finds a contributor by ID within a project
    ///
    /// A contributor ID belonging to another project yields `None`.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contributor>(
            r#"
            SELECT id, user_id, project_id, created_at
            FROM contributors
            WHERE project_id = $1 AND id = $2
            "#,
        )
        .bind(project_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the contributors of a project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contributor>(
            r#"
            SELECT id, user_id, project_id, created_at
            FROM contributors
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Removes a contributor
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contributors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
