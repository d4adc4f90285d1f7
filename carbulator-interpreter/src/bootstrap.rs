use carbulator_domain::{CommunityId, RoundingMode, SettlementContext, UnsupportedScale};
use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCALE: u32 = 2;
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_COMMUNITY: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got '{value}'")]
    NotANumber { name: &'static str, value: String },
    #[error("CARBULATOR_ROUNDING must be 'half_up' or 'half_even', got '{0}'")]
    UnknownRounding(String),
    #[error(transparent)]
    Scale(#[from] UnsupportedScale),
}

/// Settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub context: SettlementContext,
    pub community_id: CommunityId,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scale = parse_number(&lookup, "CARBULATOR_MONEY_SCALE")?
            .map_or(Ok(DEFAULT_SCALE), |scale| {
                u32::try_from(scale).map_err(|_| ConfigError::NotANumber {
                    name: "CARBULATOR_MONEY_SCALE",
                    value: scale.to_string(),
                })
            })?;

        let rounding_mode = match lookup("CARBULATOR_ROUNDING").as_deref().map(str::trim) {
            None | Some("") => RoundingMode::HalfEven,
            Some(value) if value.eq_ignore_ascii_case("half_even") => RoundingMode::HalfEven,
            Some(value) if value.eq_ignore_ascii_case("half_up") => RoundingMode::HalfUp,
            Some(value) => return Err(ConfigError::UnknownRounding(value.to_string())),
        };

        let community_id = parse_number(&lookup, "CARBULATOR_COMMUNITY")?
            .map_or(CommunityId(DEFAULT_COMMUNITY), CommunityId);

        let log_filter = lookup("CARBULATOR_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            context: SettlementContext::new(scale, rounding_mode)?,
            community_id,
            log_filter,
        })
    }
}

fn parse_number<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { name, value }),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
