use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use super::error::CorrError;
use super::track::{RawEvent, Track};

/// Random-access provider of events.
pub trait EventSource {
    fn num_events(&self) -> usize;
    fn load_event(&self, index: usize) -> Result<RawEvent, CorrError>;
}

/// Events held in memory, mostly for tests and toy studies.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: Vec<RawEvent>,
}

impl MemorySource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for MemorySource {
    fn num_events(&self) -> usize {
        self.events.len()
    }

    fn load_event(&self, index: usize) -> Result<RawEvent, CorrError> {
        self.events
            .get(index)
            .cloned()
            .ok_or(CorrError::EventIndex {
                index,
                len: self.events.len(),
            })
    }
}

/// Track tables read from parquet files with one row per track.
///
/// Required columns are `event`, `n_jets`, `charge` and `id`, plus either
/// `pt`/`eta`/`phi` or `px`/`py`/`pz`. Events keep the order of the files and
/// ascending event number inside each file.
#[derive(Debug, Clone, Default)]
pub struct ParquetSource {
    events: Vec<RawEvent>,
}

impl ParquetSource {
    pub fn open(files: &[PathBuf]) -> Result<Self, CorrError> {
        let mut events = Vec::new();
        for path in files {
            let file = File::open(path)?;
            let df = ParquetReader::new(file).finish()?;
            let file_events = events_from_dataframe(&df)?;
            log::info!(
                "Read {} events ({} tracks) from {}",
                file_events.len(),
                df.height(),
                path.display()
            );
            events.extend(file_events);
        }

        Ok(Self { events })
    }
}

impl EventSource for ParquetSource {
    fn num_events(&self) -> usize {
        self.events.len()
    }

    fn load_event(&self, index: usize) -> Result<RawEvent, CorrError> {
        self.events
            .get(index)
            .cloned()
            .ok_or(CorrError::EventIndex {
                index,
                len: self.events.len(),
            })
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|column| column.as_str() == name)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, CorrError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    column
        .f64()?
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| CorrError::MissingValue {
                column: name.to_owned(),
                row,
            })
        })
        .collect()
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, CorrError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    column
        .i64()?
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| CorrError::MissingValue {
                column: name.to_owned(),
                row,
            })
        })
        .collect()
}

fn checked_int<T: TryFrom<i64>>(values: &[i64], column: &str, row: usize) -> Result<T, CorrError> {
    T::try_from(values[row])
        .ok()
        .ok_or_else(|| CorrError::InvalidValue {
            column: column.to_owned(),
            row,
            value: values[row],
        })
}

/// Groups the rows of a track table into events ordered by event number.
/// Every row of an event must carry the same `n_jets`.
pub fn events_from_dataframe(df: &DataFrame) -> Result<Vec<RawEvent>, CorrError> {
    let event_numbers = int_column(df, "event")?;
    let jet_counts = int_column(df, "n_jets")?;
    let charges = int_column(df, "charge")?;
    let ids = int_column(df, "id")?;

    let (first, second, third) = if has_column(df, "pt") {
        (
            float_column(df, "pt")?,
            float_column(df, "eta")?,
            float_column(df, "phi")?,
        )
    } else {
        (
            float_column(df, "px")?,
            float_column(df, "py")?,
            float_column(df, "pz")?,
        )
    };
    let from_momentum = !has_column(df, "pt");

    let mut grouped: BTreeMap<i64, RawEvent> = BTreeMap::new();
    for row in 0..df.height() {
        let jet_count: u32 = checked_int(&jet_counts, "n_jets", row)?;
        let charge: i32 = checked_int(&charges, "charge", row)?;

        let track = if from_momentum {
            Track::from_momentum(first[row], second[row], third[row], charge, ids[row])
        } else {
            Track::new(second[row], third[row], first[row], charge, ids[row])
        };

        let event = grouped
            .entry(event_numbers[row])
            .or_insert_with(|| RawEvent::new(Vec::new(), jet_count));
        if event.jet_count != jet_count {
            return Err(CorrError::JetCountMismatch {
                event: event_numbers[row],
                row,
                expected: event.jet_count,
                found: jet_count,
            });
        }
        event.tracks.push(track);
    }

    Ok(grouped.into_values().collect())
}

/// Reads a text list of input files. Blank lines and `#` comments are
/// skipped; relative entries are taken relative to the list's directory.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>, CorrError> {
    let contents = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let files = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let entry = PathBuf::from(line);
            if entry.is_relative() {
                base.join(entry)
            } else {
                entry
            }
        })
        .collect();

    Ok(files)
}

/// Expands `.txt` file lists and passes every other path through.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CorrError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.extension().is_some_and(|ext| ext == "txt") {
            let listed = read_file_list(input)?;
            log::info!("{} lists {} input files", input.display(), listed.len());
            files.extend(listed);
        } else {
            files.push(input.clone());
        }
    }
    if files.is_empty() {
        return Err(CorrError::EmptyInput);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dihadron_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_parquet(path: &Path, df: &mut DataFrame) {
        let file = File::create(path).unwrap();
        ParquetWriter::new(file).finish(df).unwrap();
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new(vec![RawEvent::new(Vec::new(), 3)]);
        assert_eq!(source.num_events(), 1);
        assert_eq!(source.load_event(0).unwrap().jet_count, 3);
        assert!(matches!(
            source.load_event(1),
            Err(CorrError::EventIndex { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_parquet_rows_grouped_by_event() {
        let dir = temp_dir("grouping");
        let path = dir.join("tracks.parquet");
        let mut df = df!(
            "event" => [7i64, 2, 7, 2, 2],
            "n_jets" => [1i64, 3, 1, 3, 3],
            "charge" => [1i64, -1, 0, 1, 1],
            "id" => [0i64, 0, 1, 1, 2],
            "pt" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "eta" => [0.1, 0.2, 0.3, 0.4, 0.5],
            "phi" => [0.5, 1.0, 1.5, 2.0, 2.5],
        )
        .unwrap();
        write_parquet(&path, &mut df);

        let source = ParquetSource::open(std::slice::from_ref(&path)).unwrap();
        assert_eq!(source.num_events(), 2);

        let first = source.load_event(0).unwrap();
        assert_eq!(first.jet_count, 3);
        let pts: Vec<f64> = first.tracks.iter().map(|t| t.pt).collect();
        assert_eq!(pts, vec![2.0, 4.0, 5.0]);

        let second = source.load_event(1).unwrap();
        assert_eq!(second.jet_count, 1);
        assert_eq!(second.tracks[1], Track::new(0.3, 1.5, 3.0, 0, 1));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_parquet_momentum_columns() {
        let dir = temp_dir("momentum");
        let path = dir.join("tracks.parquet");
        let mut df = df!(
            "event" => [0i64],
            "n_jets" => [2i64],
            "charge" => [1i64],
            "id" => [5i64],
            "px" => [3.0],
            "py" => [4.0],
            "pz" => [0.0],
        )
        .unwrap();
        write_parquet(&path, &mut df);

        let source = ParquetSource::open(&[path]).unwrap();
        let track = source.load_event(0).unwrap().tracks[0];
        assert!((track.pt - 5.0).abs() < 1e-12);
        assert!(track.eta.abs() < 1e-12);
        assert!((track.phi - 4.0f64.atan2(3.0)).abs() < 1e-12);
        assert_eq!(track.id, 5);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_parquet_null_is_an_error() {
        let dir = temp_dir("nulls");
        let path = dir.join("tracks.parquet");
        let mut df = df!(
            "event" => [0i64, 0],
            "n_jets" => [1i64, 1],
            "charge" => [1i64, 1],
            "id" => [0i64, 1],
            "pt" => [Some(1.0), None],
            "eta" => [0.0, 0.0],
            "phi" => [0.0, 0.0],
        )
        .unwrap();
        write_parquet(&path, &mut df);

        assert!(matches!(
            ParquetSource::open(&[path]),
            Err(CorrError::MissingValue { row: 1, .. })
        ));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_negative_jet_count_is_a_data_error() {
        let df = df!(
            "event" => [0i64, 1],
            "n_jets" => [1i64, -2],
            "charge" => [1i64, 1],
            "id" => [0i64, 0],
            "pt" => [1.0, 2.0],
            "eta" => [0.0, 0.0],
            "phi" => [0.0, 0.0],
        )
        .unwrap();
        match events_from_dataframe(&df) {
            Err(CorrError::InvalidValue { column, row, value }) => {
                assert_eq!(column, "n_jets");
                assert_eq!(row, 1);
                assert_eq!(value, -2);
            }
            other => panic!("expected an invalid n_jets value, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_charge_is_a_data_error() {
        let df = df!(
            "event" => [0i64],
            "n_jets" => [1i64],
            "charge" => [i64::from(i32::MAX) + 1],
            "id" => [0i64],
            "pt" => [1.0],
            "eta" => [0.0],
            "phi" => [0.0],
        )
        .unwrap();
        assert!(matches!(
            events_from_dataframe(&df),
            Err(CorrError::InvalidValue { row: 0, .. })
        ));
    }

    #[test]
    fn test_disagreeing_jet_counts_are_an_error() {
        let df = df!(
            "event" => [4i64, 4, 4],
            "n_jets" => [2i64, 2, 3],
            "charge" => [1i64, 1, 1],
            "id" => [0i64, 1, 2],
            "pt" => [1.0, 2.0, 3.0],
            "eta" => [0.0, 0.0, 0.0],
            "phi" => [0.0, 0.0, 0.0],
        )
        .unwrap();
        assert!(matches!(
            events_from_dataframe(&df),
            Err(CorrError::JetCountMismatch {
                event: 4,
                row: 2,
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("dihadron_does_not_exist.parquet");
        assert!(matches!(
            ParquetSource::open(&[path]),
            Err(CorrError::File(_))
        ));
    }

    #[test]
    fn test_read_file_list() {
        let dir = temp_dir("file_list");
        let list = dir.join("inputs.txt");
        std::fs::write(
            &list,
            "# run 1\nrun1.parquet\n\n  /data/run2.parquet  \n# done\n",
        )
        .unwrap();

        let files = read_file_list(&list).unwrap();
        assert_eq!(
            files,
            vec![dir.join("run1.parquet"), PathBuf::from("/data/run2.parquet")]
        );

        let expanded = expand_inputs(&[list, PathBuf::from("other.parquet")]).unwrap();
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[2], PathBuf::from("other.parquet"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_empty_file_list_is_an_error() {
        let dir = temp_dir("empty_list");
        let list = dir.join("inputs.txt");
        std::fs::write(&list, "# nothing here\n").unwrap();
        assert!(matches!(expand_inputs(&[list]), Err(CorrError::EmptyInput)));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
