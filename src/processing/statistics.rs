//! Per-axis summary statistics for a capture.
//!
//! This is the only place capture statistics are computed. The save path
//! persists the result inside the record; loads read the persisted values
//! back instead of recomputing, so both sites agree bit-for-bit.

use crate::types::{AxisStats, AXES};
use statrs::statistics::Statistics;

/// Summary statistics for one axis: min, max, mean, and population
/// standard deviation (divide by N).
pub fn axis_statistics(samples: &[f32]) -> AxisStats {
    if samples.is_empty() {
        return AxisStats::default();
    }

    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    for &v in samples {
        min = min.min(v);
        max = max.max(v);
    }

    let mean = samples.iter().map(|&v| f64::from(v)).mean();
    let sd = samples.iter().map(|&v| f64::from(v)).population_std_dev();

    AxisStats {
        min,
        max,
        mean: mean as f32,
        sd: sd as f32,
    }
}

/// Statistics for all three axes of a capture.
pub fn capture_statistics(axes: &[Vec<f32>; AXES]) -> [AxisStats; AXES] {
    [
        axis_statistics(&axes[0]),
        axis_statistics(&axes[1]),
        axis_statistics(&axes[2]),
    ]
}
