pub mod histo1d;
pub mod histo2d;
pub mod store;

pub use histo1d::histogram1d::Histogram;
pub use histo2d::histogram2d::Histogram2D;
