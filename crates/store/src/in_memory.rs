//! In-memory backend — useful for testing and ephemeral sessions.
//!
//! All tables live behind one `RwLock`. A hierarchy creation stages its
//! rows locally and commits them in a single push at the end of the
//! write-lock critical section, so a validation failure partway through
//! leaves zero rows and concurrent readers never observe a partial
//! hierarchy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use atelier_core::error::StoreError;
use atelier_core::store::{
    Folder, Note, NoteDraft, OwnerId, Project, ProjectDraft, ProjectStore, Sprint, Task,
    TaskStatus,
};

use crate::slug::{candidate, slugify};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    sprints: Vec<Sprint>,
    tasks: Vec<Task>,
    folders: Vec<Folder>,
    notes: Vec<Note>,
}

impl Tables {
    fn project_slug_taken(&self, owner: &OwnerId, slug: &str) -> bool {
        self.projects
            .iter()
            .any(|p| p.owner_id == *owner && p.slug == slug)
    }

    fn folder_slug_taken(&self, owner: &OwnerId, slug: &str) -> bool {
        self.folders
            .iter()
            .any(|f| f.owner_id == *owner && f.slug == slug)
    }

    fn owned_project(&self, owner: &OwnerId, project_id: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == project_id && p.owner_id == *owner)
    }
}

/// An in-memory store backed by Vec tables.
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create_project(
        &self,
        owner: &OwnerId,
        draft: ProjectDraft,
    ) -> Result<Project, StoreError> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::InvalidDraft("project name is empty".into()));
        }

        // Single writer: the lock is held from slug check to commit, so
        // the collision re-query always sees the live table.
        let mut tables = self.tables.write().await;

        let base = slugify(&draft.name);
        let mut attempt = 0;
        let slug = loop {
            let c = candidate(&base, attempt);
            if !tables.project_slug_taken(owner, &c) {
                break c;
            }
            attempt += 1;
        };

        let project = Project {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.clone(),
            slug,
            name: draft.name.trim().to_string(),
            description: draft.description,
            created_at: Utc::now(),
        };

        // Stage children; nothing touches the tables until every row
        // has validated.
        let mut staged_sprints = Vec::new();
        let mut staged_tasks = Vec::new();
        for (index, sprint_draft) in draft.sprints.into_iter().enumerate() {
            if sprint_draft.name.trim().is_empty() {
                return Err(StoreError::InvalidDraft(format!(
                    "sprint {} has an empty name",
                    index + 1
                )));
            }
            let sprint = Sprint {
                id: Uuid::new_v4().to_string(),
                project_id: project.id.clone(),
                number: index as u32 + 1,
                name: sprint_draft.name.trim().to_string(),
            };
            for task_draft in sprint_draft.tasks {
                if task_draft.title.trim().is_empty() {
                    return Err(StoreError::InvalidDraft(format!(
                        "sprint {} has a task with an empty title",
                        index + 1
                    )));
                }
                staged_tasks.push(Task {
                    id: Uuid::new_v4().to_string(),
                    sprint_id: sprint.id.clone(),
                    title: task_draft.title.trim().to_string(),
                    status: TaskStatus::Todo,
                });
            }
            staged_sprints.push(sprint);
        }

        // Commit point.
        tables.projects.push(project.clone());
        tables.sprints.extend(staged_sprints);
        tables.tasks.extend(staged_tasks);
        Ok(project)
    }

    async fn find_project(
        &self,
        owner: &OwnerId,
        slug: &str,
    ) -> Result<Option<Project>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.owner_id == *owner && p.slug == slug)
            .cloned())
    }

    async fn list_projects(&self, owner: &OwnerId) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .filter(|p| p.owner_id == *owner)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn sprints_for(
        &self,
        owner: &OwnerId,
        project_id: &str,
    ) -> Result<Vec<Sprint>, StoreError> {
        let tables = self.tables.read().await;
        if tables.owned_project(owner, project_id).is_none() {
            return Ok(Vec::new());
        }
        let mut sprints: Vec<Sprint> = tables
            .sprints
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        sprints.sort_by_key(|s| s.number);
        Ok(sprints)
    }

    async fn find_sprint(
        &self,
        owner: &OwnerId,
        project_id: &str,
        number: u32,
    ) -> Result<Option<Sprint>, StoreError> {
        let tables = self.tables.read().await;
        if tables.owned_project(owner, project_id).is_none() {
            return Ok(None);
        }
        Ok(tables
            .sprints
            .iter()
            .find(|s| s.project_id == project_id && s.number == number)
            .cloned())
    }

    async fn tasks_for(&self, owner: &OwnerId, sprint_id: &str) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let owned = tables
            .sprints
            .iter()
            .find(|s| s.id == sprint_id)
            .and_then(|s| tables.owned_project(owner, &s.project_id));
        if owned.is_none() {
            return Ok(Vec::new());
        }
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.sprint_id == sprint_id)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, owner: &OwnerId, name: &str) -> Result<Folder, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidDraft("folder name is empty".into()));
        }
        let mut tables = self.tables.write().await;
        let base = slugify(name);
        let mut attempt = 0;
        let slug = loop {
            let c = candidate(&base, attempt);
            if !tables.folder_slug_taken(owner, &c) {
                break c;
            }
            attempt += 1;
        };
        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.clone(),
            slug,
            name: name.trim().to_string(),
        };
        tables.folders.push(folder.clone());
        Ok(folder)
    }

    async fn find_folder(&self, owner: &OwnerId, slug: &str) -> Result<Option<Folder>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .iter()
            .find(|f| f.owner_id == *owner && f.slug == slug)
            .cloned())
    }

    async fn create_note(
        &self,
        owner: &OwnerId,
        folder_id: &str,
        draft: NoteDraft,
    ) -> Result<Note, StoreError> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::InvalidDraft("note title is empty".into()));
        }
        let mut tables = self.tables.write().await;
        let owned = tables
            .folders
            .iter()
            .any(|f| f.id == folder_id && f.owner_id == *owner);
        if !owned {
            return Err(StoreError::QueryFailed("folder not found".into()));
        }
        let note = Note {
            id: Uuid::new_v4().to_string(),
            folder_id: folder_id.to_string(),
            owner_id: owner.clone(),
            title: draft.title.trim().to_string(),
            body: draft.body,
            created_at: Utc::now(),
        };
        tables.notes.push(note.clone());
        Ok(note)
    }
}
