/// Database models for SoftDesk
///
/// This module contains the entity store: one model per table with its CRUD
/// operations.
///
/// # Models
///
/// - `user`: accounts and privacy flags
/// - `project`: projects, created together with the author's contributor row
/// - `contributor`: user-project membership
/// - `issue`: issues scoped to a project
/// - `comment`: comments scoped to an issue
///
/// # Ownership
///
/// Project → Contributor, Project → Issue → Comment. Deleting a parent
/// cascades to its children at the database level.

pub mod comment;
pub mod contributor;
pub mod issue;
pub mod project;
pub mod user;
