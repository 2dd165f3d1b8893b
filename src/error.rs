#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("InfluxDB error: {0}")]
    Influx(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Sensor configuration error: {0}")]
    SensorConfig(String),

    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        Self::Parse(format!("CSV: {e}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;
