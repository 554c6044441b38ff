pub mod dashboard;
pub mod domain;
pub mod goals;
pub mod metrics;
pub mod ports;
pub mod recommend;

pub use dashboard::{DashboardBuilder, DashboardTuning};
pub use domain::{
    Book, DashboardPayload, GoalKind, GoalStatus, GoalsSection, LengthBucket, PaceReport, Profile,
    ReadingActivitySample, ReadingDna, ReadingStatus, RejectedGoal, Section, StoredGoal,
    SubscriptionTier, UserBook, ViewGoal,
};
pub use goals::{normalize, GoalValidationError, DEFAULT_PACE_TOLERANCE};
pub use ports::{
    ActivityWindow, CandidateFilter, PortError, PortResult, ReadingDnaSource, Storage,
    UserBookFilter,
};
pub use recommend::{recommend, ScoringWeights};
