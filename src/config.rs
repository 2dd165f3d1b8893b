use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

/// Connection settings for the InfluxDB query API.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub endpoint: String,
    pub credential: String,
    pub organization: String,
    pub bucket: String,
    pub timeout_seconds: u64,
}

/// Poll periods for the three dashboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub latest: Duration,
    pub history: Duration,
    pub images: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            latest: Duration::from_millis(5_000),
            history: Duration::from_millis(60_000),
            images: Duration::from_millis(120_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // InfluxDB
    pub influx: InfluxConfig,

    // Sensor registry
    pub sensors_config_path: String,
    /// Sensor selected at startup; the first configured one if unset.
    pub initial_sensor: Option<String>,

    // Polling
    pub poll_intervals: PollIntervals,

    // Display
    pub gauge_max_level: f64,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = PollIntervals::default();

        Ok(Self {
            // InfluxDB
            influx: InfluxConfig {
                endpoint: env::var("INFLUX_URL").map_err(|_| ConfigError::Missing("INFLUX_URL"))?,
                credential: env::var("INFLUX_TOKEN")
                    .map_err(|_| ConfigError::Missing("INFLUX_TOKEN"))?,
                organization: env::var("INFLUX_ORG")
                    .map_err(|_| ConfigError::Missing("INFLUX_ORG"))?,
                bucket: env::var("INFLUX_BUCKET")
                    .map_err(|_| ConfigError::Missing("INFLUX_BUCKET"))?,
                timeout_seconds: env::var("INFLUX_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },

            // Sensor registry
            sensors_config_path: env::var("SENSORS_CONFIG")
                .unwrap_or_else(|_| "config/sensors.json".to_string()),
            initial_sensor: env::var("SENSOR_ID").ok().filter(|s| !s.is_empty()),

            // Polling
            poll_intervals: PollIntervals {
                latest: millis_var("POLL_LATEST_INTERVAL_MS", defaults.latest),
                history: millis_var("POLL_HISTORY_INTERVAL_MS", defaults.history),
                images: millis_var("POLL_IMAGES_INTERVAL_MS", defaults.images),
            },

            // Display
            gauge_max_level: env::var("GAUGE_MAX_LEVEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| *v > 0.0)
                .unwrap_or(1000.0),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }
}

/// Zero or unparseable periods fall back to the default; a zero period would
/// make `tokio::time::interval` panic.
fn millis_var(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map_or(default, Duration::from_millis)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
