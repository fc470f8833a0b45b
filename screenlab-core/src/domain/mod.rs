//! Domain types for ScreenLab

pub mod bar;
pub mod series;

pub use bar::PriceBar;
pub use series::{PriceSeries, SeriesError};

