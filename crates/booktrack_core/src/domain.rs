//! crates/booktrack_core/src/domain.rs
//!
//! Defines the pure, core data structures for the reading tracker.
//! These structs are independent of any database or transport; the view
//! types derive `Serialize` because the presentation collaborator receives
//! them as plain data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

//=========================================================================================
// Stored Entities (owned by the storage collaborator, read-only here)
//=========================================================================================

/// A user profile. One per user; mutated only by the owning user or billing.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub display_name: String,
    pub tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Plus,
}

/// A catalog book. Immutable once ingested.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    /// Pages are unknown for some catalog sources.
    pub page_count: Option<u32>,
    pub genres: Vec<String>,
    pub external_ref: Option<String>,
    /// Catalog-wide popularity signal, used only as a ranking tiebreak.
    pub popularity: u32,
}

/// The reading state a user has attached to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

/// Join entity between a user and a catalog book. Never hard-deleted;
/// removal is a soft status transition.
#[derive(Debug, Clone, Serialize)]
pub struct UserBook {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub status: ReadingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub current_page: Option<u32>,
    pub genres: Vec<String>,
}

/// One timestamped progress delta in the append-only activity ledger.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingActivitySample {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub pages: u32,
    pub minutes: u32,
}

//=========================================================================================
// Goals
//=========================================================================================

/// What a goal counts. Each variant has exactly one accumulation strategy,
/// dispatched exhaustively in the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalKind {
    BookCount,
    PageCount,
    MinuteCount,
    GenreCount { genre: String },
}

/// A goal as persisted: the target definition only. Editable until its
/// end date passes, then read-only.
#[derive(Debug, Clone, Serialize)]
pub struct StoredGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: GoalKind,
    pub target: u32,
    pub starts_on: DateTime<Utc>,
    /// `None` means open-ended: no deadline, no pace math.
    pub ends_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    Behind,
    Completed,
    Expired,
}

/// Pace fields for a goal whose closed window has started.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PaceReport {
    pub required_per_day: f64,
    pub actual_per_day: f64,
    pub days_remaining: i64,
}

/// The derived, UI-ready form of a goal. Recomputed on every read,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ViewGoal {
    pub id: Uuid,
    pub kind: GoalKind,
    pub target: u32,
    pub starts_on: DateTime<Utc>,
    pub ends_on: Option<DateTime<Utc>>,
    pub accumulated: u32,
    /// Clamped to [0, 100].
    pub percent_complete: f64,
    /// `None` for open-ended goals and for windows that have not started.
    pub pace: Option<PaceReport>,
    pub status: GoalStatus,
    /// True when the fetch backing this goal's accumulation source failed
    /// for this request: the progress numbers are placeholders, not
    /// measurements, and pace is withheld.
    pub progress_degraded: bool,
}

//=========================================================================================
// Reading DNA (consumed from the summarizer collaborator)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

/// Aggregate taste signal for one user. Produced elsewhere; this crate
/// only consumes its shape. All fields may be empty for a new user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadingDna {
    /// Dominant genres, strongest first.
    pub top_genres: Vec<String>,
    pub preferred_length: Option<LengthBucket>,
    /// Typical books completed per month.
    pub completion_velocity: Option<f64>,
    pub mood_tags: Vec<String>,
}

impl ReadingDna {
    /// True when the signal carries nothing usable for taste ranking.
    pub fn is_empty(&self) -> bool {
        self.top_genres.is_empty() && self.preferred_length.is_none() && self.mood_tags.is_empty()
    }
}

//=========================================================================================
// Dashboard Payload (partial-failure structure)
//=========================================================================================

/// One independently fallible section of the dashboard payload. A failed
/// fetch marks only its own section; siblings still render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Section<T> {
    Ok { data: T },
    Failed { reason: String },
}

impl<T> Section<T> {
    pub fn ok(data: T) -> Self {
        Section::Ok { data }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Section::Failed { reason: reason.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Section::Ok { .. })
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Section::Ok { data } => Some(data),
            Section::Failed { .. } => None,
        }
    }
}

/// A stored goal the normalizer refused, kept in the payload with its
/// reason rather than silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedGoal {
    pub goal_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalsSection {
    pub goals: Vec<ViewGoal>,
    pub rejected: Vec<RejectedGoal>,
}

/// Everything one dashboard view needs, assembled per request.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub profile: Section<Profile>,
    pub goals: Section<GoalsSection>,
    pub recent_books: Section<Vec<UserBook>>,
    /// Consecutive calendar days with activity, ending today or yesterday.
    pub streak: Section<u32>,
    /// Trailing-window average pages per day.
    pub velocity: Section<f64>,
}
