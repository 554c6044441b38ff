//! crates/booktrack_core/src/dashboard.rs
//!
//! The Dashboard Data Aggregator: fetches everything one dashboard view
//! needs through the storage port, normalizes each goal, and assembles a
//! partial-failure payload. A failed fetch marks its own section and never
//! aborts the rest.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    DashboardPayload, GoalKind, GoalStatus, GoalsSection, ReadingActivitySample, RejectedGoal,
    Section, StoredGoal, UserBook,
};
use crate::goals::{self, DEFAULT_PACE_TOLERANCE};
use crate::metrics::{self, DEFAULT_VELOCITY_WINDOW_DAYS};
use crate::ports::{ActivityWindow, PortResult, Storage, UserBookFilter};

/// Default reach of the ledger fetch. Goal windows older than this
/// accumulate only from the fetched range, so deployments with long-running
/// goals raise it through configuration.
pub const DEFAULT_LEDGER_LOOKBACK_DAYS: u32 = 365;

/// Tuning constants for the derived metrics and pace classification.
#[derive(Debug, Clone, Copy)]
pub struct DashboardTuning {
    pub pace_tolerance: f64,
    pub velocity_window_days: u32,
    pub ledger_lookback_days: u32,
}

impl Default for DashboardTuning {
    fn default() -> Self {
        Self {
            pace_tolerance: DEFAULT_PACE_TOLERANCE,
            velocity_window_days: DEFAULT_VELOCITY_WINDOW_DAYS,
            ledger_lookback_days: DEFAULT_LEDGER_LOOKBACK_DAYS,
        }
    }
}

/// Builds `DashboardPayload`s for dashboard view requests. Holds no state
/// beyond the storage port and tuning; safe to share across users.
#[derive(Clone)]
pub struct DashboardBuilder {
    storage: Arc<dyn Storage>,
    tuning: DashboardTuning,
}

impl DashboardBuilder {
    pub fn new(storage: Arc<dyn Storage>, tuning: DashboardTuning) -> Self {
        Self { storage, tuning }
    }

    /// Assembles one dashboard payload. The four storage reads are
    /// independent and issued concurrently; normalization runs after all of
    /// them resolve or fail. This function itself never errors: every
    /// failure lands in its section.
    pub async fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> DashboardPayload {
        let ledger_window = ActivityWindow {
            from: now - Duration::days(self.tuning.ledger_lookback_days as i64),
            until: now,
        };

        let (profile, goals, samples, user_books) = futures::join!(
            timed("profile", self.storage.get_profile(user_id)),
            timed("goals", self.storage.get_goals(user_id)),
            timed("activity", self.storage.get_activity_samples(user_id, ledger_window)),
            timed("user_books", self.storage.get_user_books(user_id, UserBookFilter::default())),
        );

        let activity_ok = samples.is_ok();
        let books_ok = user_books.is_ok();

        let goals_section = match &goals {
            Ok(stored) => {
                let sample_slice = samples.as_deref().unwrap_or(&[]);
                let book_slice = user_books.as_deref().unwrap_or(&[]);
                Section::ok(self.normalize_goals(
                    stored,
                    sample_slice,
                    book_slice,
                    now,
                    activity_ok,
                    books_ok,
                ))
            }
            Err(e) => Section::failed(e.to_string()),
        };

        let streak_section = match &samples {
            Ok(ledger) => Section::ok(metrics::streak(ledger, now)),
            Err(e) => Section::failed(e.to_string()),
        };
        let velocity_section = match &samples {
            Ok(ledger) => {
                Section::ok(metrics::velocity(ledger, now, self.tuning.velocity_window_days))
            }
            Err(e) => Section::failed(e.to_string()),
        };

        let recent_books_section = match user_books {
            Ok(books) => Section::ok(recent_books(books, now, self.tuning.velocity_window_days)),
            Err(e) => Section::failed(e.to_string()),
        };

        let profile_section = match profile {
            Ok(p) => Section::ok(p),
            Err(e) => Section::failed(e.to_string()),
        };

        DashboardPayload {
            profile: profile_section,
            goals: goals_section,
            recent_books: recent_books_section,
            streak: streak_section,
            velocity: velocity_section,
        }
    }

    /// Normalizes every stored goal independently: a validation failure on
    /// one lands in `rejected` with its reason and the rest still complete.
    /// When the fetch backing a goal's accumulation source failed, that goal
    /// is normalized against an empty slice and marked degraded: pace is
    /// withheld and no `Behind` verdict is issued, since zero accumulation
    /// is a placeholder there, not a measurement. Date-only verdicts
    /// (`Expired`) stand.
    fn normalize_goals(
        &self,
        stored: &[StoredGoal],
        samples: &[ReadingActivitySample],
        user_books: &[UserBook],
        now: DateTime<Utc>,
        activity_ok: bool,
        books_ok: bool,
    ) -> GoalsSection {
        let mut views = Vec::with_capacity(stored.len());
        let mut rejected = Vec::new();

        for goal in stored {
            let source_ok = match &goal.kind {
                GoalKind::PageCount | GoalKind::MinuteCount => activity_ok,
                GoalKind::BookCount | GoalKind::GenreCount { .. } => books_ok,
            };
            match goals::normalize(goal, samples, user_books, now, self.tuning.pace_tolerance) {
                Ok(mut view) => {
                    if !source_ok {
                        view.pace = None;
                        view.progress_degraded = true;
                        if view.status == GoalStatus::Behind {
                            view.status = GoalStatus::OnTrack;
                        }
                    }
                    views.push(view);
                }
                Err(e) => {
                    warn!(goal_id = %goal.id, reason = %e, "excluding invalid goal from dashboard");
                    rejected.push(RejectedGoal {
                        goal_id: goal.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        GoalsSection { goals: views, rejected }
    }
}

/// Books started or finished inside the trailing window, newest first.
fn recent_books(mut books: Vec<UserBook>, now: DateTime<Utc>, window_days: u32) -> Vec<UserBook> {
    let cutoff = now - Duration::days(window_days as i64);
    books.retain(|b| {
        b.finished_at.map_or(false, |t| t > cutoff) || b.started_at.map_or(false, |t| t > cutoff)
    });
    books.sort_by_key(|b| std::cmp::Reverse(b.finished_at.or(b.started_at)));
    books
}

/// Times one fetch stage. The timing is diagnostics only and never part of
/// the payload.
async fn timed<T>(
    stage: &'static str,
    fut: impl std::future::Future<Output = PortResult<T>>,
) -> PortResult<T> {
    let started = Instant::now();
    let result = fut.await;
    debug!(
        stage,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "dashboard fetch stage finished"
    );
    result
}

//=========================================================================================
// Tests
//=========================================================================================
