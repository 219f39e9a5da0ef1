pub mod histogram2d;
pub mod projections;
pub mod ratio;
pub mod statistics;
