//! crates/booktrack_core/src/goals.rs
//!
//! The Goal Normalizer: turns a stored goal plus the slice of the activity
//! ledger and completed-book records overlapping its window into a `ViewGoal`.
//! Pure and deterministic for fixed inputs; performs no I/O and never mutates
//! the stored goal.

use chrono::{DateTime, Utc};

use crate::domain::{
    GoalKind, GoalStatus, PaceReport, ReadingActivitySample, ReadingStatus, StoredGoal, UserBook,
    ViewGoal,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default fraction of the required pace a goal may trail by and still
/// count as on track. Overridable through service configuration.
pub const DEFAULT_PACE_TOLERANCE: f64 = 0.9;

/// A stored goal that fails input validation. Surfaced to the caller with
/// its reason; the goal is excluded from the dashboard, not silently dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GoalValidationError {
    #[error("Goal target must be positive")]
    NonPositiveTarget,
    #[error("Goal end date {ends_on} is before its start date {starts_on}")]
    InvertedWindow {
        starts_on: DateTime<Utc>,
        ends_on: DateTime<Utc>,
    },
}

/// Normalizes one stored goal against its activity ledger and completed-book
/// records.
///
/// `samples` and `completed_books` should already be scoped to the goal's
/// user; anything outside the goal window is filtered here, so stray records
/// are harmless. `tolerance` is the pace slack factor (see
/// [`DEFAULT_PACE_TOLERANCE`]).
pub fn normalize(
    goal: &StoredGoal,
    samples: &[ReadingActivitySample],
    completed_books: &[UserBook],
    now: DateTime<Utc>,
    tolerance: f64,
) -> Result<ViewGoal, GoalValidationError> {
    if goal.target == 0 {
        return Err(GoalValidationError::NonPositiveTarget);
    }
    if let Some(ends_on) = goal.ends_on {
        if ends_on < goal.starts_on {
            return Err(GoalValidationError::InvertedWindow {
                starts_on: goal.starts_on,
                ends_on,
            });
        }
    }

    // A window that has not opened yet accumulates nothing, regardless of
    // stray samples.
    if now < goal.starts_on {
        return Ok(ViewGoal {
            id: goal.id,
            kind: goal.kind.clone(),
            target: goal.target,
            starts_on: goal.starts_on,
            ends_on: goal.ends_on,
            accumulated: 0,
            percent_complete: 0.0,
            pace: None,
            status: GoalStatus::OnTrack,
            progress_degraded: false,
        });
    }

    // Accumulation stops at the window end even when `now` is past it.
    let window_close = match goal.ends_on {
        Some(ends_on) => ends_on.min(now),
        None => now,
    };
    let accumulated = accumulate(goal, samples, completed_books, window_close);

    let percent_complete =
        (accumulated as f64 / goal.target as f64 * 100.0).clamp(0.0, 100.0);

    let status = classify(goal, accumulated, now, tolerance);
    let pace = pace_report(goal, accumulated, now);

    Ok(ViewGoal {
        id: goal.id,
        kind: goal.kind.clone(),
        target: goal.target,
        starts_on: goal.starts_on,
        ends_on: goal.ends_on,
        accumulated,
        percent_complete,
        pace,
        status,
        progress_degraded: false,
    })
}

/// One accumulation strategy per goal kind, dispatched exhaustively so a new
/// variant fails to compile until it is handled.
fn accumulate(
    goal: &StoredGoal,
    samples: &[ReadingActivitySample],
    completed_books: &[UserBook],
    window_close: DateTime<Utc>,
) -> u32 {
    let in_window = |at: DateTime<Utc>| at >= goal.starts_on && at <= window_close;

    match &goal.kind {
        GoalKind::BookCount => completed_books
            .iter()
            .filter(|b| b.status == ReadingStatus::Completed)
            .filter(|b| b.finished_at.is_some_and(|t| in_window(t)))
            .count() as u32,
        GoalKind::GenreCount { genre } => completed_books
            .iter()
            .filter(|b| b.status == ReadingStatus::Completed)
            .filter(|b| b.finished_at.is_some_and(|t| in_window(t)))
            .filter(|b| b.genres.iter().any(|g| g.eq_ignore_ascii_case(genre)))
            .count() as u32,
        GoalKind::PageCount => samples
            .iter()
            .filter(|s| in_window(s.recorded_at))
            .map(|s| s.pages)
            .sum(),
        GoalKind::MinuteCount => samples
            .iter()
            .filter(|s| in_window(s.recorded_at))
            .map(|s| s.minutes)
            .sum(),
    }
}

fn classify(
    goal: &StoredGoal,
    accumulated: u32,
    now: DateTime<Utc>,
    tolerance: f64,
) -> GoalStatus {
    // Hitting the target wins over every date consideration.
    if accumulated >= goal.target {
        return GoalStatus::Completed;
    }

    let Some(ends_on) = goal.ends_on else {
        // Open-ended goals have no required pace to fall behind.
        return GoalStatus::OnTrack;
    };

    if now > ends_on {
        return GoalStatus::Expired;
    }

    let window = (ends_on - goal.starts_on).num_seconds() as f64;
    if window <= 0.0 {
        // Degenerate same-instant window that is not yet past: nothing is
        // required of it yet.
        return GoalStatus::OnTrack;
    }
    let elapsed_fraction =
        ((now - goal.starts_on).num_seconds() as f64 / window).clamp(0.0, 1.0);
    let required = goal.target as f64 * elapsed_fraction;

    if accumulated as f64 >= required * tolerance {
        GoalStatus::OnTrack
    } else {
        GoalStatus::Behind
    }
}

/// Pace fields are only meaningful for a closed window that has started;
/// open-ended goals get `None` rather than made-up numbers.
fn pace_report(goal: &StoredGoal, accumulated: u32, now: DateTime<Utc>) -> Option<PaceReport> {
    let ends_on = goal.ends_on?;

    let window_days = (ends_on - goal.starts_on).num_seconds() as f64 / SECONDS_PER_DAY;
    if window_days <= 0.0 {
        return None;
    }
    let elapsed_days =
        ((now.min(ends_on) - goal.starts_on).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);

    let required_per_day = goal.target as f64 / window_days;
    let actual_per_day = if elapsed_days > 0.0 {
        accumulated as f64 / elapsed_days
    } else {
        0.0
    };
    let days_remaining = (ends_on - now).num_days().max(0);

    Some(PaceReport {
        required_per_day,
        actual_per_day,
        days_remaining,
    })
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn page_goal(target: u32, start_day: u32, end_day: u32) -> StoredGoal {
        StoredGoal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: GoalKind::PageCount,
            target,
            starts_on: ts(start_day, 0),
            ends_on: Some(ts(end_day, 0)),
            created_at: ts(start_day, 0),
        }
    }

    fn sample(goal: &StoredGoal, at: DateTime<Utc>, pages: u32, minutes: u32) -> ReadingActivitySample {
        ReadingActivitySample {
            id: Uuid::new_v4(),
            user_id: goal.user_id,
            user_book_id: Uuid::new_v4(),
            recorded_at: at,
            pages,
            minutes,
        }
    }

    fn completed_book(goal: &StoredGoal, finished: DateTime<Utc>, genres: &[&str]) -> UserBook {
        UserBook {
            id: Uuid::new_v4(),
            user_id: goal.user_id,
            book_id: Uuid::new_v4(),
            status: ReadingStatus::Completed,
            started_at: None,
            finished_at: Some(finished),
            current_page: None,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn exact_required_pace_is_on_track() {
        // 300 pages over 30 days, 150 pages at the 15-day mark.
        let goal = page_goal(300, 1, 31);
        let samples = vec![sample(&goal, ts(8, 0), 70, 0), sample(&goal, ts(16, 0), 80, 0)];

        let view = normalize(&goal, &samples, &[], ts(16, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 150);
        assert_eq!(view.percent_complete, 50.0);
        assert_eq!(view.status, GoalStatus::OnTrack);
    }

    #[test]
    fn below_tolerated_pace_is_behind() {
        let goal = page_goal(300, 1, 31);
        let samples = vec![sample(&goal, ts(8, 0), 90, 0)];

        let view = normalize(&goal, &samples, &[], ts(16, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 90);
        assert_eq!(view.status, GoalStatus::Behind);
    }

    #[test]
    fn hitting_target_completes_regardless_of_date() {
        let goal = page_goal(300, 1, 31);
        let samples = vec![sample(&goal, ts(3, 0), 300, 0)];

        // Mid-window.
        let view = normalize(&goal, &samples, &[], ts(5, 0), DEFAULT_PACE_TOLERANCE).unwrap();
        assert_eq!(view.status, GoalStatus::Completed);
        assert_eq!(view.percent_complete, 100.0);

        // Long after the window closed it stays completed, never expired.
        let view = normalize(&goal, &samples, &[], ts(31, 12), DEFAULT_PACE_TOLERANCE).unwrap();
        assert_eq!(view.status, GoalStatus::Completed);
    }

    #[test]
    fn past_window_without_target_is_expired() {
        let goal = page_goal(300, 1, 10);
        let samples = vec![sample(&goal, ts(5, 0), 100, 0)];

        let view = normalize(&goal, &samples, &[], ts(20, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.status, GoalStatus::Expired);
        assert_eq!(view.accumulated, 100);
    }

    #[test]
    fn percent_complete_is_clamped_to_100() {
        let goal = page_goal(100, 1, 31);
        let samples = vec![sample(&goal, ts(5, 0), 250, 0)];

        let view = normalize(&goal, &samples, &[], ts(10, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.percent_complete, 100.0);
        assert_eq!(view.accumulated, 250);
    }

    #[test]
    fn window_not_started_ignores_stray_samples() {
        let goal = page_goal(300, 10, 31);
        // Sample recorded before the goal opens.
        let samples = vec![sample(&goal, ts(2, 0), 500, 0)];

        let view = normalize(&goal, &samples, &[], ts(5, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 0);
        assert_eq!(view.percent_complete, 0.0);
        assert_eq!(view.status, GoalStatus::OnTrack);
        assert!(view.pace.is_none());
    }

    #[test]
    fn samples_outside_window_are_excluded() {
        let goal = page_goal(300, 10, 20);
        let samples = vec![
            sample(&goal, ts(9, 23), 40, 0),  // before
            sample(&goal, ts(12, 0), 60, 0),  // inside
            sample(&goal, ts(21, 0), 80, 0),  // after
        ];

        let view = normalize(&goal, &samples, &[], ts(25, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 60);
    }

    #[test]
    fn minute_goal_sums_minutes() {
        let mut goal = page_goal(600, 1, 31);
        goal.kind = GoalKind::MinuteCount;
        let samples = vec![
            sample(&goal, ts(2, 0), 30, 45),
            sample(&goal, ts(3, 0), 10, 25),
        ];

        let view = normalize(&goal, &samples, &[], ts(4, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 70);
    }

    #[test]
    fn book_count_goal_completes_before_window_ends() {
        let mut goal = page_goal(5, 1, 31);
        goal.kind = GoalKind::BookCount;
        let books: Vec<UserBook> = (0..5)
            .map(|i| completed_book(&goal, ts(2 + i, 12), &["fiction"]))
            .collect();

        let view = normalize(&goal, &[], &books, ts(10, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 5);
        assert_eq!(view.percent_complete, 100.0);
        assert_eq!(view.status, GoalStatus::Completed);
    }

    #[test]
    fn book_count_ignores_unfinished_and_out_of_window_books() {
        let mut goal = page_goal(5, 10, 20);
        goal.kind = GoalKind::BookCount;
        let mut abandoned = completed_book(&goal, ts(12, 0), &[]);
        abandoned.status = ReadingStatus::Abandoned;
        let books = vec![
            completed_book(&goal, ts(12, 0), &[]),
            completed_book(&goal, ts(5, 0), &[]), // finished before window
            abandoned,
        ];

        let view = normalize(&goal, &[], &books, ts(15, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 1);
    }

    #[test]
    fn genre_count_matches_case_insensitively() {
        let mut goal = page_goal(3, 1, 31);
        goal.kind = GoalKind::GenreCount { genre: "Science Fiction".to_string() };
        let books = vec![
            completed_book(&goal, ts(4, 0), &["science fiction", "space opera"]),
            completed_book(&goal, ts(5, 0), &["fantasy"]),
            completed_book(&goal, ts(6, 0), &["SCIENCE FICTION"]),
        ];

        let view = normalize(&goal, &[], &books, ts(10, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert_eq!(view.accumulated, 2);
    }

    #[test]
    fn open_ended_goal_has_no_pace_and_never_expires() {
        let mut goal = page_goal(1000, 1, 31);
        goal.ends_on = None;
        let samples = vec![sample(&goal, ts(2, 0), 10, 0)];

        let view = normalize(&goal, &samples, &[], ts(30, 0), DEFAULT_PACE_TOLERANCE).unwrap();

        assert!(view.pace.is_none());
        assert_eq!(view.status, GoalStatus::OnTrack);
    }

    #[test]
    fn zero_target_is_a_validation_error() {
        let goal = page_goal(0, 1, 31);
        let err = normalize(&goal, &[], &[], ts(5, 0), DEFAULT_PACE_TOLERANCE).unwrap_err();
        assert_eq!(err, GoalValidationError::NonPositiveTarget);
    }

    #[test]
    fn inverted_window_is_a_validation_error() {
        let mut goal = page_goal(100, 20, 31);
        goal.ends_on = Some(ts(10, 0));
        let err = normalize(&goal, &[], &[], ts(25, 0), DEFAULT_PACE_TOLERANCE).unwrap_err();
        assert!(matches!(err, GoalValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn pace_report_matches_window_math() {
        let goal = page_goal(300, 1, 31);
        let samples = vec![sample(&goal, ts(8, 0), 150, 0)];

        let view = normalize(&goal, &samples, &[], ts(16, 0), DEFAULT_PACE_TOLERANCE).unwrap();
        let pace = view.pace.unwrap();

        assert!((pace.required_per_day - 10.0).abs() < 1e-9);
        assert!((pace.actual_per_day - 10.0).abs() < 1e-9);
        assert_eq!(pace.days_remaining, 15);
    }
}
