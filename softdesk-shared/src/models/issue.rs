/// Issue model and database operations
///
/// Issues belong to exactly one project. Every query here is scoped by
/// `project_id`, so an issue ID from another project is simply not found.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE issues (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(128) NOT NULL,
///     description VARCHAR(2048) NOT NULL DEFAULT '',
///     priority issue_priority NOT NULL,
///     tag issue_tag NOT NULL,
///     status issue_status NOT NULL DEFAULT 'To Do',
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     time_created TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const ISSUE_COLUMNS: &str = "id, title, description, priority, tag, status, project_id, \
     author_id, assigned_to_id, time_created";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_tag", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueTag {
    Bug,
    Feature,
    Task,
}

/// Workflow state of an issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status")]
pub enum IssueStatus {
    #[default]
    #[sqlx(rename = "To Do")]
    #[serde(rename = "To Do")]
    ToDo,

    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,

    #[sqlx(rename = "Finished")]
    #[serde(rename = "Finished")]
    Finished,
}

/// Issue row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub tag: IssueTag,
    pub status: IssueStatus,
    pub project_id: i64,
    pub author_id: i64,
    pub assigned_to_id: i64,

    /// Set by the database on insert, never updated
    pub time_created: DateTime<Utc>,
}

/// Input for creating an issue
///
/// `project_id` comes from the URL path and `author_id` from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssue {
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub tag: IssueTag,
    pub status: IssueStatus,
    pub project_id: i64,
    pub author_id: i64,
    pub assigned_to_id: i64,
}

/// Input for updating an issue; project, author and creation time are fixed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<IssuePriority>,
    pub tag: Option<IssueTag>,
    pub status: Option<IssueStatus>,
    pub assigned_to_id: Option<i64>,
}

impl UpdateIssue {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tag.is_none()
            && self.status.is_none()
            && self.assigned_to_id.is_none()
    }
}

impl Issue {
    pub async fn create(pool: &PgPool, data: CreateIssue) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO issues (title, description, priority, tag, status,
                                project_id, author_id, assigned_to_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ISSUE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.tag)
            .bind(data.status)
            .bind(data.project_id)
            .bind(data.author_id)
            .bind(data.assigned_to_id)
            .fetch_one(pool)
            .await
    }

    /// Finds an issue by ID within a project
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id = $1 AND id = $2");

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the issues of a project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id = $1 \
             ORDER BY time_created ASC, id ASC"
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Updates an issue within a project
    pub async fn update(
        pool: &PgPool,
        project_id: i64,
        id: i64,
        data: UpdateIssue,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_in_project(pool, project_id, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE issues SET ");
        let mut set = builder.separated(", ");

        if let Some(title) = data.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = data.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(priority) = data.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(tag) = data.tag {
            set.push("tag = ").push_bind_unseparated(tag);
        }
        if let Some(status) = data.status {
            set.push("status = ").push_bind_unseparated(status);
        }
        if let Some(assigned_to_id) = data.assigned_to_id {
            set.push("assigned_to_id = ")
                .push_bind_unseparated(assigned_to_id);
        }

        builder.push(" WHERE project_id = ").push_bind(project_id);
        builder.push(" AND id = ").push_bind(id);
        builder.push(" RETURNING ").push(ISSUE_COLUMNS);

        builder
            .build_query_as::<Issue>()
            .fetch_optional(pool)
            .await
    }

    /// Deletes an issue; its comments cascade
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_todo() {
        assert_eq!(IssueStatus::default(), IssueStatus::ToDo);
    }

    #[test]
    fn test_status_wire_names_have_spaces() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: IssueStatus = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(parsed, IssueStatus::ToDo);
    }

    #[test]
    fn test_priority_and_tag_wire_names() {
        let priority: IssuePriority = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(priority, IssuePriority::High);

        let tag: IssueTag = serde_json::from_str("\"FEATURE\"").unwrap();
        assert_eq!(tag, IssueTag::Feature);

        assert!(serde_json::from_str::<IssueTag>("\"bug\"").is_err());
    }
}
