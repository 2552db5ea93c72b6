//! Domain store backends for the Atelier assistant.
//!
//! Two implementations of `atelier_core::ProjectStore`:
//! - `InMemoryStore` — Vec-backed, for tests and ephemeral sessions
//! - `SqliteStore` — durable, via sqlx (feature `sqlite`, on by default)
//!
//! Both enforce the same contract: every lookup filtered by owner,
//! hierarchy creation committed as one atomic unit, and slugs made
//! unique against the live store at creation time.

pub mod in_memory;
pub mod slug;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use slug::slugify;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
