mod types;

pub use types::{ImageFrame, PollResult, QueryKind, Reading, SensorSubject, SeriesPoint, TimeWindow};
