use super::binning::BinningError;
use polars::error::PolarsError;
use std::error::Error;
use std::fmt::Display;

#[derive(Debug)]
pub enum CorrError {
    Binning(BinningError),
    Config(String),
    File(std::io::Error),
    DataFrame(PolarsError),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    EmptyInput,
    MissingValue { column: String, row: usize },
    InvalidValue { column: String, row: usize, value: i64 },
    JetCountMismatch { event: i64, row: usize, expected: u32, found: u32 },
    TrackCapacity { event: usize, tracks: usize, capacity: usize },
    EventIndex { index: usize, len: usize },
}

impl From<BinningError> for CorrError {
    fn from(err: BinningError) -> CorrError {
        CorrError::Binning(err)
    }
}

impl From<std::io::Error> for CorrError {
    fn from(err: std::io::Error) -> CorrError {
        CorrError::File(err)
    }
}

impl From<PolarsError> for CorrError {
    fn from(err: PolarsError) -> CorrError {
        CorrError::DataFrame(err)
    }
}

impl From<serde_yaml::Error> for CorrError {
    fn from(err: serde_yaml::Error) -> CorrError {
        CorrError::Yaml(err)
    }
}

impl From<serde_json::Error> for CorrError {
    fn from(err: serde_json::Error) -> CorrError {
        CorrError::Json(err)
    }
}

impl Display for CorrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrError::Binning(x) => write!(f, "Correlation had a binning error: {x}"),
            CorrError::Config(x) => write!(f, "Correlation had a configuration error: {x}"),
            CorrError::File(x) => write!(f, "Correlation had a file error: {x}"),
            CorrError::DataFrame(x) => write!(f, "Correlation had a DataFrame error: {x}"),
            CorrError::Yaml(x) => write!(f, "Correlation could not parse YAML: {x}"),
            CorrError::Json(x) => write!(f, "Correlation could not write JSON: {x}"),
            CorrError::EmptyInput => write!(f, "Correlation found no events in the input"),
            CorrError::MissingValue { column, row } => write!(
                f,
                "Correlation found a missing value in column '{column}' at row {row}"
            ),
            CorrError::InvalidValue { column, row, value } => write!(
                f,
                "Correlation found the invalid value {value} in column '{column}' at row {row}"
            ),
            CorrError::JetCountMismatch {
                event,
                row,
                expected,
                found,
            } => write!(
                f,
                "Event {event} has n_jets {found} at row {row} but {expected} on its earlier rows"
            ),
            CorrError::TrackCapacity {
                event,
                tracks,
                capacity,
            } => write!(
                f,
                "Event {event} has {tracks} tracks, more than the capacity of {capacity}"
            ),
            CorrError::EventIndex { index, len } => write!(
                f,
                "Event index {index} is out of range for a source of {len} events"
            ),
        }
    }
}

impl Error for CorrError {}
