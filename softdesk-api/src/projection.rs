/// Response shapes for every resource
///
/// Each entity has a compact list shape and a richer detail shape. The
/// [`Operation`] a handler performs selects the shape: listing uses the list
/// shape, everything else (retrieve, create, update) the detail shape.
///
/// Detail shapes of projects and issues embed their children in list shape,
/// loaded from the database at render time.
///
/// User records are redacted according to the owner's privacy flags unless
/// the caller is looking at their own record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use softdesk_shared::{
    auth::middleware::AuthContext,
    models::{
        comment::Comment,
        contributor::Contributor,
        issue::{Issue, IssuePriority, IssueStatus, IssueTag},
        project::{Project, ProjectType},
        user::User,
    },
};
use sqlx::PgPool;
use uuid::Uuid;

/// What the handler is doing with the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Detail,
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Detail,
}

impl Operation {
    pub fn shape(self) -> Shape {
        match self {
            Operation::List => Shape::List,
            Operation::Detail | Operation::Create | Operation::Update => Shape::Detail,
        }
    }
}

/// Either shape of one entity, serialized without a tag
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Projected<L, D> {
    List(L),
    Detail(D),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectList {
    pub id: i64,
    pub name: String,
    pub project_type: ProjectType,
    pub author: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub project_type: ProjectType,
    pub author: i64,
    pub created_at: DateTime<Utc>,
    pub issues: Vec<IssueList>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueList {
    pub id: i64,
    pub title: String,
    pub priority: IssuePriority,
    pub project: i64,
    pub assigned_to: i64,
    pub status: IssueStatus,
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub tag: IssueTag,
    pub status: IssueStatus,
    pub project: i64,
    pub author: i64,
    pub assigned_to: i64,
    pub time_created: DateTime<Utc>,
    pub comments: Vec<CommentList>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentList {
    pub id: i64,
    pub unique_identifier: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDetail {
    pub id: i64,
    pub unique_identifier: Uuid,
    pub text: String,
    pub issue: i64,
    pub author: i64,
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributorList {
    pub id: i64,
    pub user: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributorDetail {
    pub id: i64,
    pub user: i64,
    pub project: i64,
    pub created_at: DateTime<Utc>,
}

/// `None` fields are redacted and serialize as `null`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserList {
    pub id: i64,
    pub username: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&Project> for ProjectList {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            project_type: project.project_type,
            author: project.author_id,
        }
    }
}

impl From<&Issue> for IssueList {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            title: issue.title.clone(),
            priority: issue.priority,
            project: issue.project_id,
            assigned_to: issue.assigned_to_id,
            status: issue.status,
            time_created: issue.time_created,
        }
    }
}

impl From<&Comment> for CommentList {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            unique_identifier: comment.unique_identifier,
        }
    }
}

impl From<&Comment> for CommentDetail {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            unique_identifier: comment.unique_identifier,
            text: comment.text.clone(),
            issue: comment.issue_id,
            author: comment.author_id,
            time_created: comment.time_created,
        }
    }
}

impl From<&Contributor> for ContributorList {
    fn from(contributor: &Contributor) -> Self {
        Self {
            id: contributor.id,
            user: contributor.user_id,
        }
    }
}

impl From<&Contributor> for ContributorDetail {
    fn from(contributor: &Contributor) -> Self {
        Self {
            id: contributor.id,
            user: contributor.user_id,
            project: contributor.project_id,
            created_at: contributor.created_at,
        }
    }
}

pub async fn render_project(
    pool: &PgPool,
    project: &Project,
    op: Operation,
) -> Result<Projected<ProjectList, ProjectDetail>, sqlx::Error> {
    match op.shape() {
        Shape::List => Ok(Projected::List(ProjectList::from(project))),
        Shape::Detail => {
            let issues = Issue::list_by_project(pool, project.id).await?;

            Ok(Projected::Detail(ProjectDetail {
                id: project.id,
                name: project.name.clone(),
                description: project.description.clone(),
                project_type: project.project_type,
                author: project.author_id,
                created_at: project.created_at,
                issues: issues.iter().map(IssueList::from).collect(),
            }))
        }
    }
}

pub async fn render_issue(
    pool: &PgPool,
    issue: &Issue,
    op: Operation,
) -> Result<Projected<IssueList, IssueDetail>, sqlx::Error> {
    match op.shape() {
        Shape::List => Ok(Projected::List(IssueList::from(issue))),
        Shape::Detail => {
            let comments = Comment::list_by_issue(pool, issue.id).await?;

            Ok(Projected::Detail(IssueDetail {
                id: issue.id,
                title: issue.title.clone(),
                description: issue.description.clone(),
                priority: issue.priority,
                tag: issue.tag,
                status: issue.status,
                project: issue.project_id,
                author: issue.author_id,
                assigned_to: issue.assigned_to_id,
                time_created: issue.time_created,
                comments: comments.iter().map(CommentList::from).collect(),
            }))
        }
    }
}

pub fn render_comment(comment: &Comment, op: Operation) -> Projected<CommentList, CommentDetail> {
    match op.shape() {
        Shape::List => Projected::List(CommentList::from(comment)),
        Shape::Detail => Projected::Detail(CommentDetail::from(comment)),
    }
}

pub fn render_contributor(
    contributor: &Contributor,
    op: Operation,
) -> Projected<ContributorList, ContributorDetail> {
    match op.shape() {
        Shape::List => Projected::List(ContributorList::from(contributor)),
        Shape::Detail => Projected::Detail(ContributorDetail::from(contributor)),
    }
}

/// Renders a user as seen by `viewer`
///
/// `can_be_contacted == false` hides the email, `can_data_be_shared == false`
/// hides username, age and names. Neither applies to the user's own record.
pub fn render_user(user: &User, viewer: &AuthContext, op: Operation) -> Projected<UserList, UserDetail> {
    let is_self = user.id == viewer.user_id;
    let shared = is_self || user.can_data_be_shared;
    let contactable = is_self || user.can_be_contacted;

    let username = shared.then(|| user.username.clone());
    let age = shared.then_some(user.age);

    match op.shape() {
        Shape::List => Projected::List(UserList {
            id: user.id,
            username,
            age,
        }),
        Shape::Detail => Projected::Detail(UserDetail {
            id: user.id,
            username,
            age,
            email: if contactable { user.email.clone() } else { None },
            first_name: shared.then(|| user.first_name.clone()),
            last_name: shared.then(|| user.last_name.clone()),
        }),
    }
}
