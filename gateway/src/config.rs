//! Gateway configuration
//!
//! Everything comes from the environment (optionally seeded from a `.env`
//! file). Unset variables fall back to defaults; set-but-unparseable ones are
//! an error naming the variable.

use anyhow::{Context, Result};
use emitter_catalog::SAMPLE_EMITTER_COUNT;
use std::str::FromStr;
use std::time::Duration;
use threat_sim::ConfidenceBounds;

use crate::realtime::FeedConfig;

const DEFAULT_PORT: u16 = 18700;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub cors_origins: CorsOrigins,
    pub feed: FeedConfig,
    /// Unset means every RNG is seeded from OS entropy
    pub sim_seed: Option<u64>,
    pub llm: LlmConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_raw = lookup("EW_GATEWAY_PORT").or_else(|| lookup("PORT"));
        let port = match port_raw {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("EW_GATEWAY_PORT/PORT is not a port: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let host = lookup("EW_BIND_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let cors_origins = match lookup("CORS_ORIGINS") {
            None => CorsOrigins::Any,
            Some(raw) if raw.trim() == "*" => CorsOrigins::Any,
            Some(raw) => CorsOrigins::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        let defaults = FeedConfig::default();
        let interval_ms: u64 = parse_or(&lookup, "EW_FEED_INTERVAL_MS", defaults.interval.as_millis() as u64)?;
        if interval_ms == 0 {
            anyhow::bail!("EW_FEED_INTERVAL_MS must be greater than zero");
        }
        let working_set = parse_or(&lookup, "EW_FEED_WORKING_SET", defaults.working_set)?;
        if working_set == 0 || working_set > SAMPLE_EMITTER_COUNT {
            anyhow::bail!(
                "EW_FEED_WORKING_SET must be between 1 and {SAMPLE_EMITTER_COUNT}, got {working_set}"
            );
        }

        let ceiling = ConfidenceBounds::default().ceiling;
        let floor = match lookup("EW_CONFIDENCE_FLOOR") {
            None => ConfidenceBounds::default().floor,
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) => {
                let floor = raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("EW_CONFIDENCE_FLOOR is not a number: {raw}"))?;
                if !floor.is_finite() || floor > ceiling {
                    anyhow::bail!("EW_CONFIDENCE_FLOOR must be a finite value <= {ceiling}, got {raw}");
                }
                Some(floor)
            }
        };

        let sim_seed = match lookup("EW_SIM_SEED") {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("EW_SIM_SEED is not a u64: {raw}"))?,
            ),
        };

        let api_key = lookup("EW_LLM_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            bind_addr: format!("{host}:{port}"),
            cors_origins,
            feed: FeedConfig {
                interval: Duration::from_millis(interval_ms),
                working_set,
                bounds: ConfidenceBounds { floor, ceiling },
            },
            sim_seed,
            llm: LlmConfig {
                api_key,
                model: lookup("EW_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                base_url: lookup("EW_LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            cors_origins: CorsOrigins::Any,
            feed: FeedConfig::default(),
            sim_seed: None,
            llm: LlmConfig {
                api_key: None,
                model: DEFAULT_LLM_MODEL.to_string(),
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
