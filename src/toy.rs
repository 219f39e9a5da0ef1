use std::f64::consts::{PI, TAU};
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use rand::{Rng, SeedableRng, distributions::Uniform, rngs::StdRng};

use super::error::CorrError;
use super::track::{RawEvent, Track};

/// Shape of the toy events: a flat underlying event plus collimated jets,
/// every second jet recoiling back-to-back against the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToyConfig {
    pub max_background_tracks: usize,
    pub max_jets: u32,
    pub max_tracks_per_jet: usize,
    pub eta_range: f64,
    pub jet_cone: f64,
    pub background_mean_pt: f64,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            max_background_tracks: 40,
            max_jets: 4,
            max_tracks_per_jet: 6,
            eta_range: 1.5,
            jet_cone: 0.3,
            background_mean_pt: 0.7,
        }
    }
}

pub struct ToyGenerator {
    rng: StdRng,
    config: ToyConfig,
}

impl ToyGenerator {
    pub fn new(config: ToyConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    fn charge(&mut self) -> i32 {
        if self.rng.gen_bool(0.5) { 1 } else { -1 }
    }

    pub fn generate_event(&mut self) -> RawEvent {
        let eta_dist = Uniform::new(-self.config.eta_range, self.config.eta_range);
        let phi_dist = Uniform::new(0.0, TAU);
        let cone_dist = Uniform::new(-self.config.jet_cone, self.config.jet_cone);

        let mut tracks = Vec::new();
        let n_background = self.rng.gen_range(1..=self.config.max_background_tracks);
        for _ in 0..n_background {
            // exponential pT spectrum above a 0.15 floor
            let u: f64 = self.rng.gen_range(f64::EPSILON..1.0);
            let pt = 0.15 - self.config.background_mean_pt * u.ln();
            let charge = self.charge();
            let id = tracks.len() as i64;
            tracks.push(Track::new(
                self.rng.sample(eta_dist),
                self.rng.sample(phi_dist),
                pt,
                charge,
                id,
            ));
        }

        let jet_count = self.rng.gen_range(0..=self.config.max_jets);
        let mut axis_phi = 0.0;
        let mut axis_eta = 0.0;
        for jet in 0..jet_count {
            if jet % 2 == 0 {
                axis_phi = self.rng.sample(phi_dist);
                axis_eta = self.rng.gen_range(-0.8..0.8);
            } else {
                axis_phi += PI;
                axis_eta = -axis_eta;
            }
            let n_constituents = self.rng.gen_range(2..=self.config.max_tracks_per_jet);
            for _ in 0..n_constituents {
                let pt = self.rng.gen_range(1.0..8.0);
                let charge = self.charge();
                let id = tracks.len() as i64;
                tracks.push(Track::new(
                    axis_eta + self.rng.sample(cone_dist),
                    axis_phi + self.rng.sample(cone_dist),
                    pt,
                    charge,
                    id,
                ));
            }
        }

        RawEvent::new(tracks, jet_count)
    }

    pub fn generate(&mut self, n_events: usize) -> Vec<RawEvent> {
        (0..n_events).map(|_| self.generate_event()).collect()
    }
}

/// Flattens events into the one-row-per-track layout read by `ParquetSource`.
pub fn events_to_dataframe(events: &[RawEvent]) -> Result<DataFrame, CorrError> {
    let n_tracks: usize = events.iter().map(|event| event.tracks.len()).sum();
    let mut event_numbers = Vec::with_capacity(n_tracks);
    let mut jet_counts = Vec::with_capacity(n_tracks);
    let mut charges = Vec::with_capacity(n_tracks);
    let mut ids = Vec::with_capacity(n_tracks);
    let mut pts = Vec::with_capacity(n_tracks);
    let mut etas = Vec::with_capacity(n_tracks);
    let mut phis = Vec::with_capacity(n_tracks);

    for (number, event) in events.iter().enumerate() {
        for track in &event.tracks {
            event_numbers.push(number as i64);
            jet_counts.push(i64::from(event.jet_count));
            charges.push(i64::from(track.charge));
            ids.push(track.id);
            pts.push(track.pt);
            etas.push(track.eta);
            phis.push(track.phi);
        }
    }

    let df = df!(
        "event" => event_numbers,
        "n_jets" => jet_counts,
        "charge" => charges,
        "id" => ids,
        "pt" => pts,
        "eta" => etas,
        "phi" => phis,
    )?;
    Ok(df)
}

pub fn write_parquet(events: &[RawEvent], path: &Path) -> Result<(), CorrError> {
    let mut df = events_to_dataframe(events)?;
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(&mut df)?;
    log::info!(
        "Wrote {} toy events ({} tracks) to {}",
        events.len(),
        df.height(),
        path.display()
    );
    Ok(())
}
