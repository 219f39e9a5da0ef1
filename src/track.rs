use super::kinematics::{normalize_phi, pt_eta_phi};

/// A reconstructed particle of one event.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub eta: f64,
    pub phi: f64, // always in [0, 2pi)
    pub pt: f64,
    pub charge: i32,
    pub id: i64, // unique within the source event
}

impl Track {
    pub fn new(eta: f64, phi: f64, pt: f64, charge: i32, id: i64) -> Self {
        Self {
            eta,
            phi: normalize_phi(phi),
            pt,
            charge,
            id,
        }
    }

    pub fn from_momentum(px: f64, py: f64, pz: f64, charge: i32, id: i64) -> Self {
        let (pt, eta, phi) = pt_eta_phi(px, py, pz);
        Self::new(eta, phi, pt, charge, id)
    }

    pub fn is_finite(&self) -> bool {
        self.eta.is_finite() && self.phi.is_finite() && self.pt.is_finite()
    }
}

/// One collision as delivered by an event source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub tracks: Vec<Track>,
    pub jet_count: u32,
}

impl RawEvent {
    pub fn new(tracks: Vec<Track>, jet_count: u32) -> Self {
        Self { tracks, jet_count }
    }
}

/// Acceptance cuts applied to every track before correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFilter {
    pub max_abs_eta: f64,
    pub min_pt: f64,
    pub charged_only: bool,
}

impl Default for TrackFilter {
    fn default() -> Self {
        Self {
            max_abs_eta: 1.0,
            min_pt: 0.2,
            charged_only: false,
        }
    }
}

impl TrackFilter {
    pub fn new(max_abs_eta: f64, min_pt: f64, charged_only: bool) -> Self {
        Self {
            max_abs_eta,
            min_pt,
            charged_only,
        }
    }

    pub fn accept(&self, track: &Track) -> bool {
        if !track.is_finite() {
            return false;
        }
        if track.eta.abs() > self.max_abs_eta || track.pt < self.min_pt {
            return false;
        }
        !(self.charged_only && track.charge == 0)
    }

    pub fn apply(&self, tracks: &[Track]) -> Vec<Track> {
        tracks.iter().filter(|t| self.accept(t)).copied().collect()
    }
}
