#![warn(clippy::all, rust_2018_idioms)]

//! Same-event and mixed-event two-particle angular correlations, binned in
//! trigger pT, associate pT, event multiplicity and jet multiplicity.

pub mod accumulator;
pub mod binning;
pub mod config;
pub mod correlator;
pub mod error;
pub mod event_buffer;
pub mod event_source;
pub mod histoer;
pub mod kinematics;
pub mod output;
pub mod toy;
pub mod track;
pub mod yields;

pub use accumulator::{CorrelationAccumulator, CorrelationResults, EventOutcome, JetCategory};
pub use config::AnalysisConfig;
pub use error::CorrError;
