//! Domain store trait and entities — the only durable shared resource.
//!
//! The store holds the dashboard's project-management entities. Every
//! lookup and mutation is scoped by `OwnerId`: a guessable identifier
//! belonging to another caller yields a plain miss, never data. Hierarchy
//! creation (project + sprints + tasks) commits as one atomic unit; a
//! partial hierarchy must never be observable by a subsequent read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The caller identity every store operation is scoped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A top-level project. `slug` is the human-readable unique key,
/// unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner_id: OwnerId,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A sprint within a project, addressed by its 1-based number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub project_id: String,
    pub number: u32,
    pub name: String,
}

/// A task within a sprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub sprint_id: String,
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// A note folder. `slug` is unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub owner_id: OwnerId,
    pub slug: String,
    pub name: String,
}

/// A note filed in a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub folder_id: String,
    pub owner_id: OwnerId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// --- Creation drafts ---

/// Input for an atomic project-hierarchy creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sprints: Vec<SprintDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintDraft {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
}

/// The domain store trait.
///
/// Implementations: in-memory (tests, ephemeral sessions) and SQLite.
/// Parent/child reads take the owner so ownership is re-checked on every
/// link of a lookup chain, not just at the root.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Create a project with its nested sprints and tasks as one atomic
    /// unit. The slug is derived from the draft name inside the same
    /// unit of work, re-checking the live store on each collision
    /// attempt. Any validation or storage failure leaves zero rows.
    async fn create_project(
        &self,
        owner: &OwnerId,
        draft: ProjectDraft,
    ) -> Result<Project, StoreError>;

    /// Find a project by its slug, scoped to the owner.
    async fn find_project(
        &self,
        owner: &OwnerId,
        slug: &str,
    ) -> Result<Option<Project>, StoreError>;

    /// List all projects for the owner, newest first.
    async fn list_projects(&self, owner: &OwnerId) -> Result<Vec<Project>, StoreError>;

    /// Sprints of a project, by number. Empty if the project is not the
    /// owner's.
    async fn sprints_for(
        &self,
        owner: &OwnerId,
        project_id: &str,
    ) -> Result<Vec<Sprint>, StoreError>;

    /// Find a sprint by number within an owned project.
    async fn find_sprint(
        &self,
        owner: &OwnerId,
        project_id: &str,
        number: u32,
    ) -> Result<Option<Sprint>, StoreError>;

    /// Tasks of a sprint. Empty if the chain of ownership doesn't hold.
    async fn tasks_for(&self, owner: &OwnerId, sprint_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Create a note folder for the owner.
    async fn create_folder(&self, owner: &OwnerId, name: &str) -> Result<Folder, StoreError>;

    /// Find a folder by slug, scoped to the owner.
    async fn find_folder(&self, owner: &OwnerId, slug: &str) -> Result<Option<Folder>, StoreError>;

    /// Create a note in an owned folder.
    async fn create_note(
        &self,
        owner: &OwnerId,
        folder_id: &str,
        draft: NoteDraft,
    ) -> Result<Note, StoreError>;
}
