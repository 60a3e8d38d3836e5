//! Analysis modules.
//!
//! Pure computations over rental tables: grouped summaries, the monthly
//! trend and day-over-day anomaly detection.

pub mod aggregator;
pub mod anomaly;
pub mod stats;

pub use aggregator::*;
pub use anomaly::{detect_anomalies, DEFAULT_SIGMA_MULTIPLIER};
