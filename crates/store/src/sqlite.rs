//! SQLite backend via sqlx.
//!
//! A single database file holds the five tables the assistant's tools
//! touch: projects, sprints, tasks, folders, notes. Schema is applied at
//! open. Hierarchy creation runs inside one transaction: the slug
//! collision check, the project row, and every sprint/task row commit or
//! roll back together. CHECK constraints on names/titles make a bad row
//! abort the whole transaction server-side.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use atelier_core::error::StoreError;
use atelier_core::store::{
    Folder, Note, NoteDraft, OwnerId, Project, ProjectDraft, ProjectStore, Sprint, Task,
    TaskStatus,
};

use crate::slug::{candidate, slugify};

/// A durable SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL,
                slug        TEXT NOT NULL,
                name        TEXT NOT NULL CHECK (length(trim(name)) > 0),
                description TEXT,
                created_at  TEXT NOT NULL,
                UNIQUE (owner_id, slug)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sprints (
                id         TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                number     INTEGER NOT NULL,
                name       TEXT NOT NULL CHECK (length(trim(name)) > 0),
                UNIQUE (project_id, number)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id        TEXT PRIMARY KEY,
                sprint_id TEXT NOT NULL REFERENCES sprints(id) ON DELETE CASCADE,
                title     TEXT NOT NULL CHECK (length(trim(title)) > 0),
                status    TEXT NOT NULL DEFAULT 'todo'
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS folders (
                id       TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                slug     TEXT NOT NULL,
                name     TEXT NOT NULL CHECK (length(trim(name)) > 0),
                UNIQUE (owner_id, slug)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id         TEXT PRIMARY KEY,
                folder_id  TEXT NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
                owner_id   TEXT NOT NULL,
                title      TEXT NOT NULL CHECK (length(trim(title)) > 0),
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id)",
            "CREATE INDEX IF NOT EXISTS idx_sprints_project ON sprints(project_id)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_sprint ON tasks(sprint_id)",
            "CREATE INDEX IF NOT EXISTS idx_folders_owner ON folders(owner_id)",
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_project(row: &SqliteRow) -> Result<Project, StoreError> {
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::QueryFailed(format!("bad created_at: {e}")))?
            .with_timezone(&Utc);
        Ok(Project {
            id: row.try_get("id").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            owner_id: OwnerId::new(
                row.try_get::<String, _>("owner_id")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            ),
            slug: row.try_get("slug").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            name: row.try_get("name").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            description: row
                .try_get("description")
                .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            created_at,
        })
    }

    fn row_to_sprint(row: &SqliteRow) -> Result<Sprint, StoreError> {
        Ok(Sprint {
            id: row.try_get("id").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            project_id: row
                .try_get("project_id")
                .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            number: row
                .try_get::<i64, _>("number")
                .map_err(|e| StoreError::QueryFailed(e.to_string()))? as u32,
            name: row.try_get("name").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
        })
    }

    fn parse_status(raw: &str) -> TaskStatus {
        match raw {
            "in_progress" => TaskStatus::InProgress,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_project(
        &self,
        owner: &OwnerId,
        draft: ProjectDraft,
    ) -> Result<Project, StoreError> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::InvalidDraft("project name is empty".into()));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        // Slug uniqueness is checked against the live store inside the
        // same transaction that inserts the row.
        let base = slugify(&draft.name);
        let mut attempt = 0;
        let slug = loop {
            let c = candidate(&base, attempt);
            let taken: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE owner_id = ? AND slug = ?)",
            )
            .bind(owner.as_str())
            .bind(&c)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            if taken == 0 {
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

        sqlx::query(
            "INSERT INTO projects (id, owner_id, slug, name, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&project.id)
        .bind(owner.as_str())
        .bind(&project.slug)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        for (index, sprint_draft) in draft.sprints.into_iter().enumerate() {
            let sprint_id = Uuid::new_v4().to_string();
            // An empty name trips the CHECK constraint and aborts the
            // whole transaction.
            sqlx::query("INSERT INTO sprints (id, project_id, number, name) VALUES (?, ?, ?, ?)")
                .bind(&sprint_id)
                .bind(&project.id)
                .bind(index as i64 + 1)
                .bind(sprint_draft.name.trim())
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::InvalidDraft(format!("sprint {}: {e}", index + 1)))?;

            for task_draft in sprint_draft.tasks {
                sqlx::query("INSERT INTO tasks (id, sprint_id, title, status) VALUES (?, ?, ?, 'todo')")
                    .bind(Uuid::new_v4().to_string())
                    .bind(&sprint_id)
                    .bind(task_draft.title.trim())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StoreError::InvalidDraft(format!("sprint {}: {e}", index + 1)))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        debug!(slug = %project.slug, "Project hierarchy committed");
        Ok(project)
    }

    async fn find_project(
        &self,
        owner: &OwnerId,
        slug: &str,
    ) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query("SELECT * FROM projects WHERE owner_id = ? AND slug = ?")
            .bind(owner.as_str())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.as_ref().map(Self::row_to_project).transpose()
    }

    async fn list_projects(&self, owner: &OwnerId) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query("SELECT * FROM projects WHERE owner_id = ? ORDER BY created_at DESC")
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        rows.iter().map(Self::row_to_project).collect()
    }

    async fn sprints_for(
        &self,
        owner: &OwnerId,
        project_id: &str,
    ) -> Result<Vec<Sprint>, StoreError> {
        let rows = sqlx::query(
            "SELECT s.* FROM sprints s
             JOIN projects p ON p.id = s.project_id
             WHERE s.project_id = ? AND p.owner_id = ?
             ORDER BY s.number",
        )
        .bind(project_id)
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        rows.iter().map(Self::row_to_sprint).collect()
    }

    async fn find_sprint(
        &self,
        owner: &OwnerId,
        project_id: &str,
        number: u32,
    ) -> Result<Option<Sprint>, StoreError> {
        let row = sqlx::query(
            "SELECT s.* FROM sprints s
             JOIN projects p ON p.id = s.project_id
             WHERE s.project_id = ? AND p.owner_id = ? AND s.number = ?",
        )
        .bind(project_id)
        .bind(owner.as_str())
        .bind(number as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.as_ref().map(Self::row_to_sprint).transpose()
    }

    async fn tasks_for(&self, owner: &OwnerId, sprint_id: &str) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query(
            "SELECT t.* FROM tasks t
             JOIN sprints s ON s.id = t.sprint_id
             JOIN projects p ON p.id = s.project_id
             WHERE t.sprint_id = ? AND p.owner_id = ?",
        )
        .bind(sprint_id)
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let status: String = row
                    .try_get("status")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
                Ok(Task {
                    id: row.try_get("id").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    sprint_id: row
                        .try_get("sprint_id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    title: row
                        .try_get("title")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    status: Self::parse_status(&status),
                })
            })
            .collect()
    }

    async fn create_folder(&self, owner: &OwnerId, name: &str) -> Result<Folder, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidDraft("folder name is empty".into()));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let base = slugify(name);
        let mut attempt = 0;
        let slug = loop {
            let c = candidate(&base, attempt);
            let taken: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM folders WHERE owner_id = ? AND slug = ?)",
            )
            .bind(owner.as_str())
            .bind(&c)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            if taken == 0 {
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

        sqlx::query("INSERT INTO folders (id, owner_id, slug, name) VALUES (?, ?, ?, ?)")
            .bind(&folder.id)
            .bind(owner.as_str())
            .bind(&folder.slug)
            .bind(&folder.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(folder)
    }

    async fn find_folder(&self, owner: &OwnerId, slug: &str) -> Result<Option<Folder>, StoreError> {
        let row = sqlx::query("SELECT * FROM folders WHERE owner_id = ? AND slug = ?")
            .bind(owner.as_str())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        row.map(|row| {
            Ok(Folder {
                id: row.try_get("id").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                owner_id: OwnerId::new(
                    row.try_get::<String, _>("owner_id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                ),
                slug: row.try_get("slug").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                name: row.try_get("name").map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            })
        })
        .transpose()
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

        // Ownership re-checked on the parent before the child insert.
        let owned: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE id = ? AND owner_id = ?)",
        )
        .bind(folder_id)
        .bind(owner.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        if owned == 0 {
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

        sqlx::query(
            "INSERT INTO notes (id, folder_id, owner_id, title, body, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&note.id)
        .bind(&note.folder_id)
        .bind(owner.as_str())
        .bind(&note.title)
        .bind(&note.body)
        .bind(note.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(note)
    }
}
