//! Durable publish records.
//!
//! One row is appended per initiated round. Round 2 locates round 1's
//! repository through [`RecordStore::find_latest`]; rows are never updated.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub email: String,
    pub task: String,
    pub round: u8,
    pub nonce: Option<String>,
    /// `owner/name`
    pub repo_full: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only table of publish events.
///
/// `insert` and `find_latest` are each atomic, but nothing serialises a
/// lookup followed by an insert: concurrent rounds for the same pair may both
/// observe the same latest row, and whichever inserts last wins later lookups.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends `record` and returns the id the store assigned.
    async fn insert(&self, record: &PublishRecord) -> Result<i64>;

    /// Most recently inserted record for `(email, task)`.
    async fn find_latest(&self, email: &str, task: &str) -> Result<Option<PublishRecord>>;
}
