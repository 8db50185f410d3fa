/// Project model and database operations
///
/// A project is owned by its author and exclusively owns its contributors and
/// issues (both cascade on delete).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_type AS ENUM ('BACKEND', 'FRONTEND', 'IOS', 'ANDROID');
///
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     project_type project_type NOT NULL,
///     author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Author invariant
///
/// Every project has at least one contributor: its author. [`Project::create`]
/// inserts the project and the author's contributor row in one transaction, so
/// a failure on either insert leaves nothing behind.
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::models::project::{CreateProject, Project, ProjectType};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, author_id: i64) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     name: "Helpdesk".to_string(),
///     description: "Support ticket tracker".to_string(),
///     project_type: ProjectType::Backend,
///     author_id,
/// }).await?;
///
/// let mine = Project::list_for_contributor(&pool, author_id).await?;
/// assert!(mine.iter().any(|p| p.id == project.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::contributor::{Contributor, CreateContributor};

const PROJECT_COLUMNS: &str = "id, name, description, project_type, author_id, created_at";

/// Target platform of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    Backend,
    Frontend,
    Ios,
    Android,
}

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub project_type: ProjectType,

    /// Owning user, immutable after creation
    pub author_id: i64,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
///
/// `author_id` always comes from the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub project_type: ProjectType,
    pub author_id: i64,
}

/// Input for updating a project
///
/// The author is not updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.project_type.is_none()
    }
}

impl Project {
    /// Creates a project and registers its author as the first contributor
    ///
    /// Both inserts share one transaction. If the contributor insert fails
    /// the transaction is dropped without commit and the project row is
    /// rolled back.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO projects (name, description, project_type, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.project_type)
            .bind(data.author_id)
            .fetch_one(&mut *tx)
            .await?;

        Contributor::create(
            &mut *tx,
            CreateContributor {
                project_id: project.id,
                user_id: project.author_id,
            },
        )
        .await?;

        tx.commit().await?;

        debug!(
            project_id = project.id,
            author_id = project.author_id,
            "Created project with author as contributor"
        );

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every project (superuser view)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC");

        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Lists the projects a user contributes to
    pub async fn list_for_contributor(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE EXISTS (
                SELECT 1 FROM contributors c
                WHERE c.project_id = projects.id AND c.user_id = $1
            )
            ORDER BY id ASC
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a project
    ///
    /// # Returns
    ///
    /// The updated project, or `None` if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE projects SET ");
        let mut set = builder.separated(", ");

        if let Some(name) = data.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(description) = data.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(project_type) = data.project_type {
            set.push("project_type = ").push_bind_unseparated(project_type);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(PROJECT_COLUMNS);

        builder
            .build_query_as::<Project>()
            .fetch_optional(pool)
            .await
    }

    /// Deletes a project; contributors, issues and comments cascade
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
