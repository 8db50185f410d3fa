/// Comment model and database operations
///
/// Comments belong to exactly one issue and carry an opaque
/// `unique_identifier` generated at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "id, text, unique_identifier, issue_id, author_id, time_created";

/// Comment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,

    /// UUID v4 assigned on insert, immutable
    pub unique_identifier: Uuid,

    pub issue_id: i64,
    pub author_id: i64,
    pub time_created: DateTime<Utc>,
}

/// Input for creating a comment
///
/// `issue_id` comes from the URL path and `author_id` from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub text: String,
    pub issue_id: i64,
    pub author_id: i64,
}

impl Comment {
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO comments (text, unique_identifier, issue_id, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(data.text)
            .bind(Uuid::new_v4())
            .bind(data.issue_id)
            .bind(data.author_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a comment by ID within an issue
    pub async fn find_in_issue(
        pool: &PgPool,
        issue_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = $1 AND id = $2");

        sqlx::query_as::<_, Comment>(&query)
            .bind(issue_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the comments on an issue, oldest first
    pub async fn list_by_issue(pool: &PgPool, issue_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = $1 \
             ORDER BY time_created ASC, id ASC"
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(issue_id)
            .fetch_all(pool)
            .await
    }

    /// Replaces the text of a comment within an issue
    pub async fn update_text(
        pool: &PgPool,
        issue_id: i64,
        id: i64,
        text: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET text = $3 WHERE issue_id = $1 AND id = $2 \
             RETURNING {COMMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(issue_id)
            .bind(id)
            .bind(text)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
