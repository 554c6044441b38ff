//! services/api/src/adapters/dna.rs
//!
//! Adapter for the Reading DNA summarizer boundary. The summarizer runs as a
//! separate pipeline and maintains one precomputed row per user; this adapter
//! only reads it. A missing row (new user) degrades to an empty profile so
//! recommendation generation proceeds with reduced signal instead of failing.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use booktrack_core::domain::{LengthBucket, ReadingDna};
use booktrack_core::ports::{PortError, PortResult, ReadingDnaSource};

/// Reads the collaborator-maintained Reading DNA rows.
#[derive(Clone)]
pub struct DbDnaAdapter {
    pool: PgPool,
}

impl DbDnaAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DnaRecord {
    top_genres: Vec<String>,
    preferred_length: Option<String>,
    completion_velocity: Option<f64>,
    mood_tags: Vec<String>,
}

impl DnaRecord {
    fn to_domain(self) -> PortResult<ReadingDna> {
        let preferred_length = match self.preferred_length.as_deref() {
            None => None,
            Some("short") => Some(LengthBucket::Short),
            Some("medium") => Some(LengthBucket::Medium),
            Some("long") => Some(LengthBucket::Long),
            Some(other) => {
                return Err(PortError::Unexpected(format!(
                    "Unknown length bucket '{}'",
                    other
                )))
            }
        };
        Ok(ReadingDna {
            top_genres: self.top_genres,
            preferred_length,
            completion_velocity: self.completion_velocity,
            mood_tags: self.mood_tags,
        })
    }
}

#[async_trait]
impl ReadingDnaSource for DbDnaAdapter {
    async fn get_reading_dna(&self, user_id: Uuid) -> PortResult<ReadingDna> {
        let record = sqlx::query_as::<_, DnaRecord>(
            "SELECT top_genres, preferred_length, completion_velocity, mood_tags \
             FROM reading_dna WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(format!("Reading DNA for user {}: {}", user_id, e)))?;

        match record {
            Some(record) => record.to_domain(),
            None => {
                warn!(%user_id, "no reading DNA row; proceeding with empty taste signal");
                Ok(ReadingDna::default())
            }
        }
    }
}
