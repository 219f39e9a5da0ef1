use fnv::FnvHashMap;
use rayon::prelude::*;

use super::histo2d::histogram2d::Histogram2D;
use crate::accumulator::JetCategory;
use crate::config::{AxisConfig, Binning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramKind {
    Same,
    Mixed,
}

impl HistogramKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            HistogramKind::Same => "hSame",
            HistogramKind::Mixed => "hMixed",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HistogramKind::Same => "Same event",
            HistogramKind::Mixed => "Mixed event",
        }
    }
}

/// Identifies one correlation histogram. `jet_category == None` is the
/// inclusive histogram of the (trigger, associate, multiplicity) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct CorrelationKey {
    pub trigger_bin: usize,
    pub associate_bin: usize,
    pub multiplicity_bin: usize,
    pub jet_category: Option<JetCategory>,
}

impl CorrelationKey {
    pub fn new(
        trigger_bin: usize,
        associate_bin: usize,
        multiplicity_bin: usize,
        jet_category: Option<JetCategory>,
    ) -> Self {
        Self {
            trigger_bin,
            associate_bin,
            multiplicity_bin,
            jet_category,
        }
    }

    pub fn inclusive(&self) -> Self {
        Self {
            jet_category: None,
            ..*self
        }
    }

    pub fn with_category(&self, jet_category: JetCategory) -> Self {
        Self {
            jet_category: Some(jet_category),
            ..*self
        }
    }

    /// `hSame_trig0_assoc1_mult2` or `hSame_Dijet_trig0_assoc1_mult2`.
    pub fn histogram_name(&self, prefix: &str) -> String {
        match self.jet_category {
            Some(category) => format!(
                "{prefix}_{}_trig{}_assoc{}_mult{}",
                category.name(),
                self.trigger_bin,
                self.associate_bin,
                self.multiplicity_bin
            ),
            None => format!(
                "{prefix}_trig{}_assoc{}_mult{}",
                self.trigger_bin, self.associate_bin, self.multiplicity_bin
            ),
        }
    }

    pub fn histogram_title(&self, label: &str, binning: &Binning) -> String {
        let category = match self.jet_category {
            Some(category) => format!(" ({})", category.name()),
            None => String::new(),
        };
        format!(
            "{label}{category}: {} <= trig pT < {}, {} <= assoc pT < {}, {} <= mult < {}",
            binning.trigger_pt.lower(self.trigger_bin),
            binning.trigger_pt.upper(self.trigger_bin),
            binning.associate_pt.lower(self.associate_bin),
            binning.associate_pt.upper(self.associate_bin),
            binning.multiplicity.lower(self.multiplicity_bin),
            binning.multiplicity.upper(self.multiplicity_bin),
        )
    }
}

/// Every same-event and mixed-event (delta-eta, delta-phi) histogram of a run,
/// created on first fill, plus the all-bin global pair.
#[derive(Debug, Clone)]
pub struct CorrelationHistograms {
    binning: Binning,
    delta_eta: AxisConfig,
    delta_phi: AxisConfig,
    same: FnvHashMap<CorrelationKey, Histogram2D>,
    mixed: FnvHashMap<CorrelationKey, Histogram2D>,
    pub global_same: Histogram2D,
    pub global_mixed: Histogram2D,
}

impl CorrelationHistograms {
    pub fn new(binning: Binning, delta_eta: AxisConfig, delta_phi: AxisConfig) -> Self {
        let template = Histogram2D::new(
            "",
            (delta_eta.bins, delta_phi.bins),
            (delta_eta.range(), delta_phi.range()),
        );
        Self {
            global_same: template.empty_like("hSame_global", "Same event: all bins"),
            global_mixed: template.empty_like("hMixed_global", "Mixed event: all bins"),
            binning,
            delta_eta,
            delta_phi,
            same: FnvHashMap::default(),
            mixed: FnvHashMap::default(),
        }
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    fn map(&self, kind: HistogramKind) -> &FnvHashMap<CorrelationKey, Histogram2D> {
        match kind {
            HistogramKind::Same => &self.same,
            HistogramKind::Mixed => &self.mixed,
        }
    }

    fn new_histogram(&self, kind: HistogramKind, key: &CorrelationKey) -> Histogram2D {
        Histogram2D::new(
            &key.histogram_name(kind.prefix()),
            (self.delta_eta.bins, self.delta_phi.bins),
            (self.delta_eta.range(), self.delta_phi.range()),
        )
        .with_title(&key.histogram_title(kind.label(), &self.binning))
    }

    /// Adds one pair to the histogram of `key`.
    pub fn accumulate(
        &mut self,
        kind: HistogramKind,
        key: CorrelationKey,
        delta_eta: f64,
        delta_phi: f64,
    ) {
        let exists = self.map(kind).contains_key(&key);
        if !exists {
            let histogram = self.new_histogram(kind, &key);
            self.map_mut(kind).insert(key, histogram);
        }
        if let Some(histogram) = self.map_mut(kind).get_mut(&key) {
            histogram.fill(delta_eta, delta_phi);
        }
    }

    /// Fills one pair into the inclusive histogram of `key`, the jet-category
    /// histogram when the event has a category, and the global histogram.
    pub fn fill_pair(
        &mut self,
        kind: HistogramKind,
        key: CorrelationKey,
        jet_category: Option<JetCategory>,
        delta_eta: f64,
        delta_phi: f64,
    ) {
        self.accumulate(kind, key.inclusive(), delta_eta, delta_phi);
        if let Some(category) = jet_category {
            self.accumulate(kind, key.with_category(category), delta_eta, delta_phi);
        }
        self.accumulate_global(kind, delta_eta, delta_phi);
    }

    pub fn accumulate_global(&mut self, kind: HistogramKind, delta_eta: f64, delta_phi: f64) {
        match kind {
            HistogramKind::Same => self.global_same.fill(delta_eta, delta_phi),
            HistogramKind::Mixed => self.global_mixed.fill(delta_eta, delta_phi),
        }
    }

    fn map_mut(&mut self, kind: HistogramKind) -> &mut FnvHashMap<CorrelationKey, Histogram2D> {
        match kind {
            HistogramKind::Same => &mut self.same,
            HistogramKind::Mixed => &mut self.mixed,
        }
    }

    pub fn get(&self, kind: HistogramKind, key: &CorrelationKey) -> Option<&Histogram2D> {
        self.map(kind).get(key)
    }

    pub fn len(&self, kind: HistogramKind) -> usize {
        self.map(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.same.is_empty() && self.mixed.is_empty()
    }

    /// Histograms of one kind ordered by key.
    pub fn sorted(&self, kind: HistogramKind) -> Vec<(&CorrelationKey, &Histogram2D)> {
        let mut histograms: Vec<(&CorrelationKey, &Histogram2D)> = self.map(kind).iter().collect();
        histograms.sort_unstable_by_key(|(key, _)| **key);
        histograms
    }

    /// Adds every histogram of `other`, which must share this binning.
    pub fn merge(&mut self, other: Self) {
        for (kind, histograms) in [
            (HistogramKind::Same, other.same),
            (HistogramKind::Mixed, other.mixed),
        ] {
            let map = self.map_mut(kind);
            for (key, histogram) in histograms {
                match map.get_mut(&key) {
                    Some(existing) => existing.add(&histogram),
                    None => {
                        map.insert(key, histogram);
                    }
                }
            }
        }
        self.global_same.add(&other.global_same);
        self.global_mixed.add(&other.global_mixed);
    }

    /// Normalized same/mixed ratio for every filled same-event key, ordered by
    /// key. A key without mixed-event entries gets an all-zero ratio.
    pub fn ratios(&self) -> Vec<(CorrelationKey, Histogram2D)> {
        self.sorted(HistogramKind::Same)
            .par_iter()
            .map(|&(key, same)| {
                let title = key.histogram_title("Same / mixed", &self.binning);
                let ratio = Self::ratio_of(
                    same,
                    self.mixed.get(key),
                    &key.histogram_name("hRatio"),
                    &title,
                );
                (*key, ratio)
            })
            .collect()
    }

    /// Empty mixed-event histograms for the same-event keys that never mixed,
    /// ordered by key.
    pub fn missing_mixed(&self) -> Vec<Histogram2D> {
        let mut keys: Vec<CorrelationKey> = self
            .same
            .keys()
            .filter(|key| !self.mixed.contains_key(key))
            .copied()
            .collect();
        keys.sort_unstable();
        keys.iter()
            .map(|key| self.new_histogram(HistogramKind::Mixed, key))
            .collect()
    }

    /// `None` until a same-event pair has been filled.
    pub fn global_ratio(&self) -> Option<Histogram2D> {
        if self.global_same.entries == 0 {
            return None;
        }
        Some(Self::ratio_of(
            &self.global_same,
            Some(&self.global_mixed),
            "hRatio_global",
            "Same / mixed: all bins",
        ))
    }

    fn ratio_of(
        same: &Histogram2D,
        mixed: Option<&Histogram2D>,
        name: &str,
        title: &str,
    ) -> Histogram2D {
        match mixed {
            Some(mixed) if mixed.integral() > 0.0 => same.normalized_ratio(mixed, name, title),
            _ => {
                let mut ratio = same.empty_like(name, title);
                ratio.entries = same.entries;
                ratio
            }
        }
    }
}
