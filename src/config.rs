use std::f64::consts::{FRAC_PI_2, PI};
use std::path::Path;

use super::binning::BinSet;
use super::error::CorrError;
use super::track::TrackFilter;

/// How events without any reconstructed jet take part in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroJetPolicy {
    /// Correlated and buffered like any other event, filling inclusive histograms only.
    #[default]
    Inclusive,
    /// Dropped before correlation and never buffered.
    Skip,
}

/// Uniform histogram axis.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AxisConfig {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl AxisConfig {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    fn validate(&self, name: &str) -> Result<(), CorrError> {
        if self.bins == 0 {
            return Err(CorrError::Config(format!("{name} axis needs at least one bin")));
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(CorrError::Config(format!(
                "{name} axis range [{}, {}) is empty or not finite",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Rectangular (delta-eta, delta-phi) region used for yields.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Window {
    pub max_abs_delta_eta: f64,
    pub delta_phi_min: f64,
    pub delta_phi_max: f64,
}

impl Window {
    pub fn new(max_abs_delta_eta: f64, delta_phi_min: f64, delta_phi_max: f64) -> Self {
        Self {
            max_abs_delta_eta,
            delta_phi_min,
            delta_phi_max,
        }
    }

    pub fn near_side() -> Self {
        Self::new(1.0, -FRAC_PI_2, FRAC_PI_2)
    }

    pub fn away_side() -> Self {
        Self::new(0.5, 0.75 * PI, 1.25 * PI)
    }

    fn validate(&self, name: &str) -> Result<(), CorrError> {
        if !(self.max_abs_delta_eta >= 0.0 && self.delta_phi_min <= self.delta_phi_max) {
            return Err(CorrError::Config(format!("{name} window is empty")));
        }
        Ok(())
    }
}

/// Validated bin sets for one analysis.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Binning {
    pub trigger_pt: BinSet,
    pub associate_pt: BinSet,
    pub multiplicity: BinSet,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub trigger_pt_bins: Vec<f64>,
    pub associate_pt_bins: Vec<f64>,
    pub multiplicity_bins: Vec<f64>,
    pub max_abs_eta: f64,
    pub min_pt: f64,
    pub charged_only: bool,
    pub mixing_depth: usize,
    pub delta_eta: AxisConfig,
    pub delta_phi: AxisConfig,
    pub zero_jet_policy: ZeroJetPolicy,
    pub max_tracks_per_event: Option<usize>,
    pub near_side: Window,
    pub away_side: Window,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trigger_pt_bins: vec![1.0, 2.0, 3.0, 4.0, 8.0],
            associate_pt_bins: vec![1.0, 2.0, 3.0, 4.0, 8.0],
            multiplicity_bins: vec![0.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 100.0],
            max_abs_eta: 1.0,
            min_pt: 0.2,
            charged_only: false,
            mixing_depth: 50,
            delta_eta: AxisConfig::new(32, -4.8, 4.8),
            delta_phi: AxisConfig::new(200, -FRAC_PI_2, 1.5 * PI),
            zero_jet_policy: ZeroJetPolicy::Inclusive,
            max_tracks_per_event: None,
            near_side: Window::near_side(),
            away_side: Window::away_side(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, CorrError> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CorrError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        log::info!("Loaded analysis configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, CorrError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn track_filter(&self) -> TrackFilter {
        TrackFilter::new(self.max_abs_eta, self.min_pt, self.charged_only)
    }

    /// Checks every setting and returns the bin sets it describes.
    pub fn validate(&self) -> Result<Binning, CorrError> {
        let binning = Binning {
            trigger_pt: BinSet::new("trigger_pt", self.trigger_pt_bins.clone())?,
            associate_pt: BinSet::new("associate_pt", self.associate_pt_bins.clone())?,
            multiplicity: BinSet::new("multiplicity", self.multiplicity_bins.clone())?,
        };

        self.delta_eta.validate("delta_eta")?;
        self.delta_phi.validate("delta_phi")?;
        self.near_side.validate("near_side")?;
        self.away_side.validate("away_side")?;

        if self.max_abs_eta.is_nan() || self.max_abs_eta <= 0.0 {
            return Err(CorrError::Config(format!(
                "max_abs_eta must be positive, found {}",
                self.max_abs_eta
            )));
        }
        if self.min_pt.is_nan() || self.min_pt < 0.0 {
            return Err(CorrError::Config(format!(
                "min_pt must not be negative, found {}",
                self.min_pt
            )));
        }
        if self.mixing_depth == 0 {
            log::warn!("mixing_depth is 0, mixed-event histograms will stay empty");
        }

        Ok(binning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinningError;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        let binning = config.validate().unwrap();
        assert_eq!(binning.trigger_pt.n_bins(), 4);
        assert_eq!(binning.associate_pt.n_bins(), 4);
        assert_eq!(binning.multiplicity.n_bins(), 8);
        assert_eq!(config.mixing_depth, 50);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AnalysisConfig::from_yaml_str(
            "mixing_depth: 5\nzero_jet_policy: skip\ntrigger_pt_bins: [2.0, 4.0]\n",
        )
        .unwrap();
        assert_eq!(config.mixing_depth, 5);
        assert_eq!(config.zero_jet_policy, ZeroJetPolicy::Skip);
        assert_eq!(config.trigger_pt_bins, vec![2.0, 4.0]);
        assert_eq!(config.delta_eta.bins, 32);
        assert_eq!(config.min_pt, 0.2);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AnalysisConfig::default();
        let parsed = AnalysisConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_bins_are_rejected() {
        let config = AnalysisConfig {
            multiplicity_bins: vec![0.0, 10.0, 10.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CorrError::Binning(BinningError::NonIncreasing { .. }))
        ));

        let config = AnalysisConfig {
            trigger_pt_bins: vec![1.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CorrError::Binning(BinningError::TooFewBoundaries { .. }))
        ));
    }

    #[test]
    fn test_invalid_axes_and_cuts_are_rejected() {
        let config = AnalysisConfig {
            delta_eta: AxisConfig::new(0, -1.0, 1.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CorrError::Config(_))));

        let config = AnalysisConfig {
            delta_phi: AxisConfig::new(10, 1.0, 1.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CorrError::Config(_))));

        let config = AnalysisConfig {
            max_abs_eta: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CorrError::Config(_))));

        let config = AnalysisConfig {
            min_pt: -0.1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CorrError::Config(_))));
    }

    #[test]
    fn test_track_filter_from_config() {
        let config = AnalysisConfig {
            charged_only: true,
            ..Default::default()
        };
        let filter = config.track_filter();
        assert_eq!(filter, TrackFilter::new(1.0, 0.2, true));
    }
}
