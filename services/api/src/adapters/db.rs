//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `Storage` port from the `core` crate. It handles all read access to
//! the PostgreSQL records the engine derives from, using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use booktrack_core::domain::{
    Book, GoalKind, Profile, ReadingActivitySample, ReadingStatus, StoredGoal, SubscriptionTier,
    UserBook,
};
use booktrack_core::ports::{
    ActivityWindow, CandidateFilter, PortError, PortResult, Storage, UserBookFilter,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `Storage` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a sqlx error onto the port taxonomy: missing rows become
/// `NotFound`, connectivity problems become `Unavailable` (a per-section
/// failure upstream), everything else is `Unexpected`.
fn map_err(context: &str, e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(context.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            PortError::Unavailable(format!("{}: {}", context, e))
        }
        _ => PortError::Unexpected(format!("{}: {}", context, e)),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    display_name: String,
    tier: String,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let tier = match self.tier.as_str() {
            "free" => SubscriptionTier::Free,
            "plus" => SubscriptionTier::Plus,
            other => {
                return Err(PortError::Unexpected(format!(
                    "Unknown subscription tier '{}'",
                    other
                )))
            }
        };
        Ok(Profile {
            user_id: self.user_id,
            display_name: self.display_name,
            tier,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct GoalRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    genre: Option<String>,
    target: i32,
    starts_on: DateTime<Utc>,
    ends_on: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl GoalRecord {
    fn to_domain(self) -> PortResult<StoredGoal> {
        let kind = match (self.kind.as_str(), self.genre) {
            ("book_count", _) => GoalKind::BookCount,
            ("page_count", _) => GoalKind::PageCount,
            ("minute_count", _) => GoalKind::MinuteCount,
            ("genre_count", Some(genre)) => GoalKind::GenreCount { genre },
            ("genre_count", None) => {
                return Err(PortError::Unexpected(format!(
                    "Goal {} is genre_count but has no genre",
                    self.id
                )))
            }
            (other, _) => {
                return Err(PortError::Unexpected(format!(
                    "Unknown goal kind '{}'",
                    other
                )))
            }
        };
        Ok(StoredGoal {
            id: self.id,
            user_id: self.user_id,
            kind,
            // Non-positive stored targets are surfaced by the normalizer's
            // validation, not hidden here.
            target: self.target.max(0) as u32,
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRecord {
    id: Uuid,
    user_id: Uuid,
    user_book_id: Uuid,
    recorded_at: DateTime<Utc>,
    pages: i32,
    minutes: i32,
}
impl ActivityRecord {
    fn to_domain(self) -> ReadingActivitySample {
        ReadingActivitySample {
            id: self.id,
            user_id: self.user_id,
            user_book_id: self.user_book_id,
            recorded_at: self.recorded_at,
            pages: self.pages.max(0) as u32,
            minutes: self.minutes.max(0) as u32,
        }
    }
}

#[derive(FromRow)]
struct UserBookRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    status: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    current_page: Option<i32>,
    genres: Vec<String>,
}
impl UserBookRecord {
    fn to_domain(self) -> PortResult<UserBook> {
        let status = match self.status.as_str() {
            "not_started" => ReadingStatus::NotStarted,
            "in_progress" => ReadingStatus::InProgress,
            "completed" => ReadingStatus::Completed,
            "abandoned" => ReadingStatus::Abandoned,
            other => {
                return Err(PortError::Unexpected(format!(
                    "Unknown reading status '{}'",
                    other
                )))
            }
        };
        Ok(UserBook {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            current_page: self.current_page.map(|p| p.max(0) as u32),
            genres: self.genres,
        })
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    authors: Vec<String>,
    page_count: Option<i32>,
    genres: Vec<String>,
    external_ref: Option<String>,
    popularity: i32,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            authors: self.authors,
            page_count: self.page_count.map(|p| p.max(0) as u32),
            genres: self.genres,
            external_ref: self.external_ref,
            popularity: self.popularity.max(0) as u32,
        }
    }
}

//=========================================================================================
// `Storage` Trait Implementation
//=========================================================================================

#[async_trait]
impl Storage for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, display_name, tier, created_at FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(&format!("Profile {}", user_id), e))?;

        record.to_domain()
    }

    async fn get_goals(&self, user_id: Uuid) -> PortResult<Vec<StoredGoal>> {
        let records = sqlx::query_as::<_, GoalRecord>(
            "SELECT id, user_id, kind, genre, target, starts_on, ends_on, created_at \
             FROM reading_goals WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(&format!("Goals for user {}", user_id), e))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_activity_samples(
        &self,
        user_id: Uuid,
        window: ActivityWindow,
    ) -> PortResult<Vec<ReadingActivitySample>> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, user_id, user_book_id, recorded_at, pages, minutes \
             FROM reading_activity \
             WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at <= $3 \
             ORDER BY recorded_at ASC",
        )
        .bind(user_id)
        .bind(window.from)
        .bind(window.until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(&format!("Activity for user {}", user_id), e))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_user_books(
        &self,
        user_id: Uuid,
        filter: UserBookFilter,
    ) -> PortResult<Vec<UserBook>> {
        let status = filter.status.map(|s| match s {
            ReadingStatus::NotStarted => "not_started",
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Completed => "completed",
            ReadingStatus::Abandoned => "abandoned",
        });

        // The user book carries its catalog book's genre tags so the
        // normalizer can count genre goals without a second fetch.
        let records = sqlx::query_as::<_, UserBookRecord>(
            "SELECT ub.id, ub.user_id, ub.book_id, ub.status, ub.started_at, ub.finished_at, \
                    ub.current_page, b.genres \
             FROM user_books ub JOIN books b ON b.id = ub.book_id \
             WHERE ub.user_id = $1 \
               AND ($2::text IS NULL OR ub.status = $2) \
               AND ($3::timestamptz IS NULL OR COALESCE(ub.finished_at, ub.started_at) >= $3) \
             ORDER BY COALESCE(ub.finished_at, ub.started_at) DESC NULLS LAST",
        )
        .bind(user_id)
        .bind(status)
        .bind(filter.since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(&format!("User books for user {}", user_id), e))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_candidate_books(&self, filter: CandidateFilter) -> PortResult<Vec<Book>> {
        let limit = filter.limit.unwrap_or(500) as i64;

        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, authors, page_count, genres, external_ref, popularity \
             FROM books \
             WHERE cardinality($1::text[]) = 0 OR genres && $1 \
             ORDER BY popularity DESC, id ASC \
             LIMIT $2",
        )
        .bind(&filter.genres)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("Candidate books", e))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
