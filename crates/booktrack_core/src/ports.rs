//! crates/booktrack_core/src/ports.rs
//!
//! Defines the service contracts (traits) consumed by the engine.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or sibling services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Book, Profile, ReadingActivitySample, ReadingDna, ReadingStatus, StoredGoal, UserBook,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Timeout or temporary unavailability of a collaborator. The dashboard
    /// aggregator turns this into a per-section failure, never a crash.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Filters
//=========================================================================================

/// The time range a ledger read is scoped to, inclusive at both ends.
#[derive(Debug, Clone, Copy)]
pub struct ActivityWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Narrows a user-book read. `None` fields mean "any".
#[derive(Debug, Clone, Default)]
pub struct UserBookFilter {
    pub status: Option<ReadingStatus>,
    pub since: Option<DateTime<Utc>>,
}

/// Narrows the candidate pool for recommendation runs.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub genres: Vec<String>,
    pub limit: Option<u32>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read access to the records this engine derives from. The storage
/// collaborator owns consistency; no call here takes a lock.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile>;

    async fn get_goals(&self, user_id: Uuid) -> PortResult<Vec<StoredGoal>>;

    async fn get_activity_samples(
        &self,
        user_id: Uuid,
        window: ActivityWindow,
    ) -> PortResult<Vec<ReadingActivitySample>>;

    async fn get_user_books(
        &self,
        user_id: Uuid,
        filter: UserBookFilter,
    ) -> PortResult<Vec<UserBook>>;

    async fn get_candidate_books(&self, filter: CandidateFilter) -> PortResult<Vec<Book>>;
}

/// The Reading DNA summarizer boundary. Best-effort: a new user yields a
/// partially or fully empty profile rather than an error.
#[async_trait]
pub trait ReadingDnaSource: Send + Sync {
    async fn get_reading_dna(&self, user_id: Uuid) -> PortResult<ReadingDna>;
}
