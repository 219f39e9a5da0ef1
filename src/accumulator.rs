use std::f64::consts::TAU;

use indicatif::ProgressBar;
use rayon::prelude::*;

use super::binning::BinSet;
use super::config::{AnalysisConfig, Binning, ZeroJetPolicy};
use super::correlator::correlate;
use super::error::CorrError;
use super::event_buffer::EventBuffer;
use super::event_source::EventSource;
use super::histoer::store::{CorrelationHistograms, CorrelationKey, HistogramKind};
use super::histoer::{Histogram, Histogram2D};
use super::track::{RawEvent, Track, TrackFilter};

/// Jet-multiplicity class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum JetCategory {
    Single,
    Dijet,
    Multijet,
}

impl JetCategory {
    pub const ALL: [JetCategory; 3] = [
        JetCategory::Single,
        JetCategory::Dijet,
        JetCategory::Multijet,
    ];

    pub fn from_jet_count(jet_count: u32) -> Option<Self> {
        match jet_count {
            0 => None,
            1 => Some(JetCategory::Single),
            2 => Some(JetCategory::Dijet),
            _ => Some(JetCategory::Multijet),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JetCategory::Single => "Single",
            JetCategory::Dijet => "Dijet",
            JetCategory::Multijet => "Multijet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ZeroMultiplicity,
    MultiplicityOutOfRange,
    NoJets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Skipped(SkipReason),
    Accumulated {
        multiplicity_bin: usize,
        jet_category: Option<JetCategory>,
        same_pairs: u64,
        mixed_pairs: u64,
    },
}

/// Tracks of one event that passed the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredEvent {
    pub tracks: Vec<Track>,
    pub jet_count: u32,
}

impl FilteredEvent {
    pub fn multiplicity(&self) -> usize {
        self.tracks.len()
    }
}

/// A filtered event placed in its multiplicity bin with its tracks bucketed
/// by trigger and associate pT bin.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub tracks: Vec<Track>,
    pub multiplicity_bin: usize,
    pub jet_category: Option<JetCategory>,
    pub trigger_buckets: Vec<Vec<Track>>,
    pub associate_buckets: Vec<Vec<Track>>,
}

fn bucket_by_pt(tracks: &[Track], bins: &BinSet) -> Vec<Vec<Track>> {
    let mut buckets = vec![Vec::new(); bins.n_bins()];
    for track in tracks {
        if let Some(bin) = bins.bin_index(track.pt) {
            buckets[bin].push(*track);
        }
    }
    buckets
}

/// Same-event pairs of `event` and mixed-event pairs against the buffered
/// history of its multiplicity bin. Returns the (same, mixed) pair counts.
fn correlate_event(
    binning: &Binning,
    histograms: &mut CorrelationHistograms,
    buffer: &EventBuffer,
    event: &ClassifiedEvent,
) -> (u64, u64) {
    let mut same_pairs = 0;
    let mut mixed_pairs = 0;

    let has_triggers = event.trigger_buckets.iter().any(|bucket| !bucket.is_empty());
    let mixing_pools: Vec<Vec<Vec<Track>>> = if has_triggers {
        buffer
            .events_in_bin(event.multiplicity_bin)
            .map(|tracks| bucket_by_pt(tracks, &binning.associate_pt))
            .collect()
    } else {
        Vec::new()
    };

    for (trigger_bin, triggers) in event.trigger_buckets.iter().enumerate() {
        if triggers.is_empty() {
            continue;
        }

        for (associate_bin, associates) in event.associate_buckets.iter().enumerate() {
            if associates.is_empty() {
                continue;
            }
            let key = CorrelationKey::new(trigger_bin, associate_bin, event.multiplicity_bin, None);
            for pair in correlate(triggers, associates, true) {
                histograms.fill_pair(
                    HistogramKind::Same,
                    key,
                    event.jet_category,
                    pair.delta_eta,
                    pair.delta_phi,
                );
                same_pairs += 1;
            }
        }

        for pool in &mixing_pools {
            for (associate_bin, associates) in pool.iter().enumerate() {
                if associates.is_empty() {
                    continue;
                }
                let key =
                    CorrelationKey::new(trigger_bin, associate_bin, event.multiplicity_bin, None);
                for pair in correlate(triggers, associates, false) {
                    histograms.fill_pair(
                        HistogramKind::Mixed,
                        key,
                        event.jet_category,
                        pair.delta_eta,
                        pair.delta_phi,
                    );
                    mixed_pairs += 1;
                }
            }
        }
    }

    (same_pairs, mixed_pairs)
}

/// Track-level and event-level quality histograms.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QaHistograms {
    pub pt: Histogram,
    pub eta: Histogram,
    pub phi: Histogram,
    pub multiplicity: Histogram,
}

impl QaHistograms {
    pub fn new(max_abs_eta: f64) -> Self {
        Self {
            pt: Histogram::new("hPt", "Accepted track pT", 100, (0.0, 10.0)),
            eta: Histogram::new(
                "hEta",
                "Accepted track eta",
                100,
                (-2.0 * max_abs_eta, 2.0 * max_abs_eta),
            ),
            phi: Histogram::new("hPhi", "Accepted track phi", 100, (0.0, TAU)),
            multiplicity: Histogram::new("hMult", "Event multiplicity", 100, (0.0, 100.0)),
        }
    }

    fn fill_event(&mut self, event: &FilteredEvent) {
        for track in &event.tracks {
            self.pt.fill(track.pt);
            self.eta.fill(track.eta);
            self.phi.fill(track.phi);
        }
        self.multiplicity.fill(event.multiplicity() as f64);
    }

    pub fn all(&self) -> [&Histogram; 4] {
        [&self.pt, &self.eta, &self.phi, &self.multiplicity]
    }
}

/// Counts split by jet category, `inclusive` holding the uncategorized entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CategoryCounts {
    pub inclusive: u64,
    pub single: u64,
    pub dijet: u64,
    pub multijet: u64,
}

impl CategoryCounts {
    pub fn add(&mut self, jet_category: Option<JetCategory>) {
        match jet_category {
            None => self.inclusive += 1,
            Some(JetCategory::Single) => self.single += 1,
            Some(JetCategory::Dijet) => self.dijet += 1,
            Some(JetCategory::Multijet) => self.multijet += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RunSummary {
    pub events_loaded: u64,
    pub events_accumulated: u64,
    pub skipped_zero_multiplicity: u64,
    pub skipped_multiplicity_out_of_range: u64,
    pub skipped_no_jets: u64,
    /// Accumulated events by jet category, zero-jet events counted as inclusive.
    pub events_per_category: CategoryCounts,
    pub same_pairs: u64,
    pub mixed_pairs: u64,
    pub same_histograms: CategoryCounts,
    pub mixed_histograms: CategoryCounts,
    pub ratio_histograms: CategoryCounts,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &EventOutcome) {
        match *outcome {
            EventOutcome::Skipped(SkipReason::ZeroMultiplicity) => {
                self.skipped_zero_multiplicity += 1;
            }
            EventOutcome::Skipped(SkipReason::MultiplicityOutOfRange) => {
                self.skipped_multiplicity_out_of_range += 1;
            }
            EventOutcome::Skipped(SkipReason::NoJets) => self.skipped_no_jets += 1,
            EventOutcome::Accumulated {
                jet_category,
                same_pairs,
                mixed_pairs,
                ..
            } => {
                self.events_accumulated += 1;
                self.events_per_category.add(jet_category);
                self.same_pairs += same_pairs;
                self.mixed_pairs += mixed_pairs;
            }
        }
    }

    pub fn log(&self) {
        log::info!(
            "Loaded {} events, accumulated {}",
            self.events_loaded,
            self.events_accumulated
        );
        log::info!(
            "Skipped {} with zero multiplicity, {} out of the multiplicity range, {} without jets",
            self.skipped_zero_multiplicity,
            self.skipped_multiplicity_out_of_range,
            self.skipped_no_jets
        );
        log::info!(
            "Filled {} same-event and {} mixed-event pairs",
            self.same_pairs,
            self.mixed_pairs
        );
        log::info!(
            "Ratio histograms: {} inclusive, {} single, {} dijet, {} multijet",
            self.ratio_histograms.inclusive,
            self.ratio_histograms.single,
            self.ratio_histograms.dijet,
            self.ratio_histograms.multijet
        );
    }
}

/// Everything an analysis run produced.
#[derive(Debug, Clone)]
pub struct CorrelationResults {
    pub config: AnalysisConfig,
    pub histograms: CorrelationHistograms,
    pub ratios: Vec<(CorrelationKey, Histogram2D)>,
    pub global_ratio: Option<Histogram2D>,
    pub qa: QaHistograms,
    pub summary: RunSummary,
}

impl CorrelationResults {
    pub fn same(&self, key: &CorrelationKey) -> Option<&Histogram2D> {
        self.histograms.get(HistogramKind::Same, key)
    }

    pub fn mixed(&self, key: &CorrelationKey) -> Option<&Histogram2D> {
        self.histograms.get(HistogramKind::Mixed, key)
    }

    pub fn ratio(&self, key: &CorrelationKey) -> Option<&Histogram2D> {
        self.ratios
            .binary_search_by_key(key, |(k, _)| *k)
            .ok()
            .map(|index| &self.ratios[index].1)
    }
}

/// Aggregation context of one analysis run: mixing buffer, histograms and
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct CorrelationAccumulator {
    config: AnalysisConfig,
    filter: TrackFilter,
    binning: Binning,
    buffer: EventBuffer,
    histograms: CorrelationHistograms,
    qa: QaHistograms,
    summary: RunSummary,
}

impl CorrelationAccumulator {
    pub fn new(config: AnalysisConfig) -> Result<Self, CorrError> {
        let binning = config.validate()?;
        Ok(Self {
            filter: config.track_filter(),
            buffer: EventBuffer::new(config.mixing_depth),
            histograms: CorrelationHistograms::new(
                binning.clone(),
                config.delta_eta,
                config.delta_phi,
            ),
            qa: QaHistograms::new(config.max_abs_eta),
            summary: RunSummary::default(),
            binning,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn histograms(&self) -> &CorrelationHistograms {
        &self.histograms
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Applies the track filter and fills the QA histograms.
    pub fn filter_event(&mut self, event: &RawEvent) -> FilteredEvent {
        let filtered = FilteredEvent {
            tracks: self.filter.apply(&event.tracks),
            jet_count: event.jet_count,
        };
        self.qa.fill_event(&filtered);
        self.summary.events_loaded += 1;
        filtered
    }

    pub fn classify(&self, event: FilteredEvent) -> Result<ClassifiedEvent, SkipReason> {
        if event.multiplicity() == 0 {
            return Err(SkipReason::ZeroMultiplicity);
        }
        let multiplicity_bin = self
            .binning
            .multiplicity
            .bin_index(event.multiplicity() as f64)
            .ok_or(SkipReason::MultiplicityOutOfRange)?;

        let jet_category = JetCategory::from_jet_count(event.jet_count);
        if jet_category.is_none() && self.config.zero_jet_policy == ZeroJetPolicy::Skip {
            return Err(SkipReason::NoJets);
        }

        Ok(ClassifiedEvent {
            trigger_buckets: bucket_by_pt(&event.tracks, &self.binning.trigger_pt),
            associate_buckets: bucket_by_pt(&event.tracks, &self.binning.associate_pt),
            tracks: event.tracks,
            multiplicity_bin,
            jet_category,
        })
    }

    /// Correlates a classified event and then adds it to the mixing buffer.
    fn correlate_and_buffer(&mut self, event: ClassifiedEvent) -> EventOutcome {
        let (same_pairs, mixed_pairs) =
            correlate_event(&self.binning, &mut self.histograms, &self.buffer, &event);
        let outcome = EventOutcome::Accumulated {
            multiplicity_bin: event.multiplicity_bin,
            jet_category: event.jet_category,
            same_pairs,
            mixed_pairs,
        };
        self.buffer.add_event(event.multiplicity_bin, event.tracks);
        outcome
    }

    /// Runs one event through every stage.
    pub fn process_event(&mut self, event: &RawEvent) -> EventOutcome {
        let filtered = self.filter_event(event);
        let outcome = match self.classify(filtered) {
            Ok(classified) => self.correlate_and_buffer(classified),
            Err(reason) => EventOutcome::Skipped(reason),
        };
        self.summary.record(&outcome);
        outcome
    }

    fn load_checked<S: EventSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<RawEvent, CorrError> {
        let event = source.load_event(index)?;
        if let Some(capacity) = self.config.max_tracks_per_event {
            if event.tracks.len() > capacity {
                return Err(CorrError::TrackCapacity {
                    event: index,
                    tracks: event.tracks.len(),
                    capacity,
                });
            }
        }
        Ok(event)
    }

    fn check_not_empty<S: EventSource + ?Sized>(source: &S) -> Result<usize, CorrError> {
        let num_events = source.num_events();
        if num_events == 0 {
            return Err(CorrError::EmptyInput);
        }
        log::info!("Processing {num_events} events");
        Ok(num_events)
    }

    /// Sequential event loop over a whole source.
    pub fn run<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        progress: Option<&ProgressBar>,
    ) -> Result<(), CorrError> {
        let num_events = Self::check_not_empty(source)?;

        for index in 0..num_events {
            let event = self.load_checked(source, index)?;
            self.process_event(&event);

            if let Some(progress) = progress {
                progress.inc(1);
            }
            if (index + 1) % 10_000 == 0 {
                log::debug!("Processed {}/{num_events} events", index + 1);
            }
        }

        Ok(())
    }

    /// Event loop that correlates each multiplicity bin on its own rayon
    /// worker. Events are filtered and classified in source order first, so
    /// every bin sees its events in the same order as `run`.
    pub fn run_partitioned<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        progress: Option<&ProgressBar>,
    ) -> Result<(), CorrError> {
        let num_events = Self::check_not_empty(source)?;
        let n_bins = self.binning.multiplicity.n_bins();
        let mut partitions: Vec<Vec<ClassifiedEvent>> = vec![Vec::new(); n_bins];

        for index in 0..num_events {
            let event = self.load_checked(source, index)?;
            let filtered = self.filter_event(&event);
            match self.classify(filtered) {
                Ok(classified) => partitions[classified.multiplicity_bin].push(classified),
                Err(reason) => self.summary.record(&EventOutcome::Skipped(reason)),
            }
            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        let work: Vec<(usize, Vec<ClassifiedEvent>, EventBuffer)> = partitions
            .into_iter()
            .enumerate()
            .filter(|(_, events)| !events.is_empty())
            .map(|(bin, events)| (bin, events, self.buffer.split_bin(bin)))
            .collect();
        log::info!("Correlating {} multiplicity bins in parallel", work.len());

        let binning = &self.binning;
        let (delta_eta, delta_phi) = (self.config.delta_eta, self.config.delta_phi);
        let finished: Vec<(CorrelationHistograms, EventBuffer, Vec<EventOutcome>)> = work
            .into_par_iter()
            .map(|(bin, events, mut buffer)| {
                let mut histograms = CorrelationHistograms::new(binning.clone(), delta_eta, delta_phi);
                let mut outcomes = Vec::with_capacity(events.len());
                for event in events {
                    let (same_pairs, mixed_pairs) =
                        correlate_event(binning, &mut histograms, &buffer, &event);
                    outcomes.push(EventOutcome::Accumulated {
                        multiplicity_bin: bin,
                        jet_category: event.jet_category,
                        same_pairs,
                        mixed_pairs,
                    });
                    buffer.add_event(bin, event.tracks);
                }
                (histograms, buffer, outcomes)
            })
            .collect();

        for (histograms, buffer, outcomes) in finished {
            self.histograms.merge(histograms);
            self.buffer.absorb(buffer);
            for outcome in &outcomes {
                self.summary.record(outcome);
            }
        }

        Ok(())
    }

    /// Computes the normalized ratios and the final summary.
    pub fn finish(&self) -> CorrelationResults {
        let ratios = self.histograms.ratios();
        let global_ratio = self.histograms.global_ratio();

        let mut summary = self.summary.clone();
        summary.same_histograms = CategoryCounts::default();
        summary.mixed_histograms = CategoryCounts::default();
        summary.ratio_histograms = CategoryCounts::default();
        for (key, _) in self.histograms.sorted(HistogramKind::Same) {
            summary.same_histograms.add(key.jet_category);
        }
        for (key, _) in self.histograms.sorted(HistogramKind::Mixed) {
            summary.mixed_histograms.add(key.jet_category);
        }
        for (key, _) in &ratios {
            summary.ratio_histograms.add(key.jet_category);
        }
        summary.log();

        CorrelationResults {
            config: self.config.clone(),
            histograms: self.histograms.clone(),
            ratios,
            global_ratio,
            qa: self.qa.clone(),
            summary,
        }
    }
}
