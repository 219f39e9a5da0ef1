use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::accumulator::{CorrelationResults, RunSummary};
use super::config::{AnalysisConfig, AxisConfig, Binning};
use super::error::CorrError;
use super::histoer::store::{CorrelationKey, HistogramKind};
use super::histoer::{Histogram, Histogram2D};
use super::yields::{
    ContributionFractions, MergedQuantification, away_side_yield, contribution_fractions,
    multiplicity_integrated, near_side_yield,
};

pub const SAME_EVENT_DIR: &str = "SameEvent";
pub const MIXED_EVENT_DIR: &str = "MixedEvent";
pub const CORRELATION_DIR: &str = "Correlation";

/// Dense, self-describing form of a 2-D histogram.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HistogramRecord<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub entries: u64,
    pub overflow: u64,
    pub underflow: u64,
    pub integral: f64,
    /// `contents[x][y]`
    pub contents: Vec<Vec<f64>>,
    pub delta_phi_projection: Vec<f64>,
    pub delta_eta_projection: Vec<f64>,
}

impl<'a> HistogramRecord<'a> {
    pub fn new(histogram: &'a Histogram2D) -> Self {
        let x_axis = AxisConfig::new(
            histogram.bins.x,
            histogram.range.x.min,
            histogram.range.x.max,
        );
        let y_axis = AxisConfig::new(
            histogram.bins.y,
            histogram.range.y.min,
            histogram.range.y.max,
        );
        Self {
            name: &histogram.name,
            title: &histogram.title,
            x_axis,
            y_axis,
            entries: histogram.entries,
            overflow: histogram.overflow,
            underflow: histogram.underflow,
            integral: histogram.integral(),
            contents: histogram.dense_contents(),
            delta_phi_projection: histogram.y_projection(x_axis.min, x_axis.max),
            delta_eta_projection: histogram.x_projection(y_axis.min, y_axis.max),
        }
    }
}

/// Persistence of finished histograms. `directory` is relative to the sink's
/// root, the empty string being the root itself.
pub trait HistogramSink {
    fn write_2d(&mut self, directory: &str, histogram: &Histogram2D) -> Result<(), CorrError>;
    fn write_1d(&mut self, directory: &str, histogram: &Histogram) -> Result<(), CorrError>;
}

/// Writes one JSON file per histogram below a root directory.
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    root: PathBuf,
    written: usize,
}

impl JsonDirectorySink {
    pub fn new(root: &Path) -> Result<Self, CorrError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn file_path(&self, directory: &str, name: &str) -> Result<PathBuf, CorrError> {
        let dir = if directory.is_empty() {
            self.root.clone()
        } else {
            self.root.join(directory)
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("{name}.json")))
    }

    fn write_json<T: serde::Serialize>(&mut self, path: &Path, value: &T) -> Result<(), CorrError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, value)?;
        self.written += 1;
        Ok(())
    }

    /// Writes `summary.json` with the run bookkeeping, configuration and yields.
    pub fn write_summary(&mut self, results: &CorrelationResults) -> Result<(), CorrError> {
        let summary = SummaryRecord::new(results);
        let path = self.root.join("summary.json");
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        log::info!("Wrote run summary to {}", path.display());
        Ok(())
    }
}

impl HistogramSink for JsonDirectorySink {
    fn write_2d(&mut self, directory: &str, histogram: &Histogram2D) -> Result<(), CorrError> {
        let path = self.file_path(directory, &histogram.name)?;
        self.write_json(&path, &HistogramRecord::new(histogram))
    }

    fn write_1d(&mut self, directory: &str, histogram: &Histogram) -> Result<(), CorrError> {
        let path = self.file_path(directory, &histogram.name)?;
        self.write_json(&path, histogram)
    }
}

/// Near-side and away-side yields of one ratio histogram.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct YieldRecord {
    pub key: CorrelationKey,
    pub name: String,
    pub near_side: f64,
    pub away_side: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryRecord<'a> {
    pub summary: &'a RunSummary,
    pub config: &'a AnalysisConfig,
    pub binning: &'a Binning,
    pub yields: Vec<YieldRecord>,
    pub contribution_fractions: Vec<ContributionFractions>,
    pub multiplicity_integrated: Vec<MergedQuantification>,
}

impl<'a> SummaryRecord<'a> {
    pub fn new(results: &'a CorrelationResults) -> Self {
        let yields = results
            .ratios
            .iter()
            .map(|(key, ratio)| YieldRecord {
                key: *key,
                name: ratio.name.clone(),
                near_side: near_side_yield(ratio, results),
                away_side: away_side_yield(ratio, results),
            })
            .collect();
        Self {
            summary: &results.summary,
            config: &results.config,
            binning: results.histograms.binning(),
            yields,
            contribution_fractions: contribution_fractions(results),
            multiplicity_integrated: multiplicity_integrated(results),
        }
    }
}

/// Sends every histogram of a run to `sink`: same-event, mixed-event and ratio
/// histograms in their own directories, QA and global histograms at the root.
pub fn write_results<S: HistogramSink + ?Sized>(
    sink: &mut S,
    results: &CorrelationResults,
) -> Result<(), CorrError> {
    for (_, histogram) in results.histograms.sorted(HistogramKind::Same) {
        sink.write_2d(SAME_EVENT_DIR, histogram)?;
    }
    for (_, histogram) in results.histograms.sorted(HistogramKind::Mixed) {
        sink.write_2d(MIXED_EVENT_DIR, histogram)?;
    }
    // every same-event histogram gets a mixed-event partner, even an empty one
    let missing_mixed = results.histograms.missing_mixed();
    for histogram in &missing_mixed {
        sink.write_2d(MIXED_EVENT_DIR, histogram)?;
    }
    for (_, histogram) in &results.ratios {
        sink.write_2d(CORRELATION_DIR, histogram)?;
    }

    sink.write_2d("", &results.histograms.global_same)?;
    sink.write_2d("", &results.histograms.global_mixed)?;
    if let Some(global_ratio) = &results.global_ratio {
        sink.write_2d("", global_ratio)?;
    }
    for histogram in results.qa.all() {
        sink.write_1d("", histogram)?;
    }

    log::info!(
        "Wrote {} same-event, {} mixed-event ({} empty) and {} ratio histograms",
        results.histograms.len(HistogramKind::Same),
        results.histograms.len(HistogramKind::Mixed) + missing_mixed.len(),
        missing_mixed.len(),
        results.ratios.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::CorrelationAccumulator;
    use crate::event_source::MemorySource;
    use crate::track::{RawEvent, Track};

    #[derive(Default)]
    struct RecordingSink {
        written: Vec<(String, String)>,
    }

    impl HistogramSink for RecordingSink {
        fn write_2d(&mut self, directory: &str, histogram: &Histogram2D) -> Result<(), CorrError> {
            self.written
                .push((directory.to_owned(), histogram.name.clone()));
            Ok(())
        }

        fn write_1d(&mut self, directory: &str, histogram: &Histogram) -> Result<(), CorrError> {
            self.written
                .push((directory.to_owned(), histogram.name.clone()));
            Ok(())
        }
    }

    fn results() -> CorrelationResults {
        let config = AnalysisConfig {
            mixing_depth: 2,
            ..Default::default()
        };
        let events = [1, 2, 4]
            .map(|jets| {
                RawEvent::new(
                    vec![
                        Track::new(0.2, 0.5, 5.0, 1, 0),
                        Track::new(-0.1, 3.0, 2.0, -1, 1),
                    ],
                    jets,
                )
            })
            .to_vec();
        let mut accumulator = CorrelationAccumulator::new(config).unwrap();
        accumulator.run(&MemorySource::new(events), None).unwrap();
        accumulator.finish()
    }

    #[test]
    fn test_write_results_layout() {
        let results = results();
        let mut sink = RecordingSink::default();
        write_results(&mut sink, &results).unwrap();

        let in_dir = |dir: &str| sink.written.iter().filter(|(d, _)| d == dir).count();
        assert_eq!(in_dir(SAME_EVENT_DIR), 4);
        // the single-jet key never mixes and gets an empty partner
        assert_eq!(in_dir(MIXED_EVENT_DIR), 4);
        assert_eq!(in_dir(CORRELATION_DIR), 4);
        // global same, mixed, ratio and four QA histograms
        assert_eq!(in_dir(""), 7);
        assert!(sink.written.contains(&(
            SAME_EVENT_DIR.to_owned(),
            "hSame_Single_trig3_assoc1_mult0".to_owned()
        )));
        assert!(sink.written.contains(&(
            CORRELATION_DIR.to_owned(),
            "hRatio_trig3_assoc1_mult0".to_owned()
        )));
        assert!(sink.written.contains(&(
            MIXED_EVENT_DIR.to_owned(),
            "hMixed_Single_trig3_assoc1_mult0".to_owned()
        )));
        assert!(sink.written.contains(&(
            CORRELATION_DIR.to_owned(),
            "hRatio_Single_trig3_assoc1_mult0".to_owned()
        )));
        assert!(sink.written.contains(&(String::new(), "hMult".to_owned())));
    }

    #[test]
    fn test_json_directory_sink() {
        let results = results();
        let root = std::env::temp_dir().join(format!("dihadron_output_{}", std::process::id()));
        let mut sink = JsonDirectorySink::new(&root).unwrap();
        write_results(&mut sink, &results).unwrap();
        sink.write_summary(&results).unwrap();
        assert_eq!(sink.written(), 19);

        let contents =
            std::fs::read_to_string(root.join(MIXED_EVENT_DIR).join("hMixed_trig3_assoc1_mult0.json"))
                .unwrap();
        let record: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(record["integral"], 3.0);
        assert_eq!(record["contents"].as_array().unwrap().len(), 32);
        assert_eq!(record["delta_phi_projection"].as_array().unwrap().len(), 200);
        assert_eq!(record["delta_eta_projection"].as_array().unwrap().len(), 32);

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(root.join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["summary"]["events_accumulated"], 3);
        assert_eq!(summary["summary"]["mixed_pairs"], 3);
        assert_eq!(summary["yields"].as_array().unwrap().len(), 4);
        let merged = summary["multiplicity_integrated"].as_array().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0]["jet_category"], "Single");
        assert_eq!(merged[0]["near_side_yield"], 0.0);

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_record_projection_matches_integral() {
        let mut histogram = Histogram2D::new("h", (4, 8), ((-1.0, 1.0), (0.0, 8.0)));
        histogram.fill(0.1, 0.5);
        histogram.fill(-0.6, 0.5);
        histogram.fill(0.9, 7.5);
        let record = HistogramRecord::new(&histogram);
        assert_eq!(record.delta_phi_projection.iter().sum::<f64>(), record.integral);
        assert_eq!(record.delta_phi_projection[0], 2.0);
        assert_eq!(record.delta_eta_projection.iter().sum::<f64>(), record.integral);
        assert_eq!(record.delta_eta_projection, vec![1.0, 0.0, 1.0, 1.0]);
        assert_eq!(record.x_axis, AxisConfig::new(4, -1.0, 1.0));
    }
}
