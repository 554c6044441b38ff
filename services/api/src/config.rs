//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The engine's tuning constants (pace
//! tolerance, recommendation scoring weights, velocity window) live here so
//! they are explicit configuration rather than numbers buried in call sites.

use std::net::SocketAddr;
use tracing::Level;

use booktrack_core::dashboard::{DashboardTuning, DEFAULT_LEDGER_LOOKBACK_DAYS};
use booktrack_core::goals::DEFAULT_PACE_TOLERANCE;
use booktrack_core::metrics::DEFAULT_VELOCITY_WINDOW_DAYS;
use booktrack_core::recommend::ScoringWeights;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    /// Fraction of required pace a goal may trail by and still be on track.
    pub pace_tolerance: f64,
    pub velocity_window_days: u32,
    /// How far back the dashboard's ledger fetch reaches. Must cover the
    /// oldest goal window a deployment wants fully accumulated.
    pub ledger_lookback_days: u32,
    /// Default number of recommendations when the caller does not ask for one.
    pub recommendation_limit: usize,
    pub scoring_weights: ScoringWeights,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Engine Tuning Constants ---
        let pace_tolerance = parse_or("PACE_TOLERANCE", DEFAULT_PACE_TOLERANCE)?;
        if !(0.0..=1.0).contains(&pace_tolerance) {
            return Err(ConfigError::InvalidValue(
                "PACE_TOLERANCE".to_string(),
                format!("{} is outside [0.0, 1.0]", pace_tolerance),
            ));
        }

        let velocity_window_days = parse_or("VELOCITY_WINDOW_DAYS", DEFAULT_VELOCITY_WINDOW_DAYS)?;
        let ledger_lookback_days = parse_or("LEDGER_LOOKBACK_DAYS", DEFAULT_LEDGER_LOOKBACK_DAYS)?;
        let recommendation_limit = parse_or("RECOMMENDATION_LIMIT", 10usize)?;

        let defaults = ScoringWeights::default();
        let scoring_weights = ScoringWeights {
            genre: parse_or("GENRE_WEIGHT", defaults.genre)?,
            length: parse_or("LENGTH_WEIGHT", defaults.length)?,
            popularity: parse_or("POPULARITY_WEIGHT", defaults.popularity)?,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            pace_tolerance,
            velocity_window_days,
            ledger_lookback_days,
            recommendation_limit,
            scoring_weights,
        })
    }

    /// The tuning slice the dashboard builder consumes.
    pub fn dashboard_tuning(&self) -> DashboardTuning {
        DashboardTuning {
            pace_tolerance: self.pace_tolerance,
            velocity_window_days: self.velocity_window_days,
            ledger_lookback_days: self.ledger_lookback_days,
        }
    }
}

/// Parses an optional environment variable, falling back to `default` when
/// it is unset.
fn parse_or<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
