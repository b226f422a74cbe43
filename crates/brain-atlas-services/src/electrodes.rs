// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Electrode coordinate validity heuristic
//!
//! Many recordings store probe-relative positions or placeholders instead
//! of atlas coordinates. Atlas positions lie inside the brain (roughly
//! 0..13200 µm per axis), so the median electrode should sit well away
//! from zero on at least two axes. Files in 10 µm voxel units get a
//! proportionally smaller cutoff.

use crate::types::Coordinate;

/// Above this maximum magnitude values are taken to be micrometers
const MICROMETER_SCALE_MIN: f64 = 1500.0;
/// Median cutoff for micrometer data
const MICROMETER_MEDIAN_CUTOFF: f64 = 1000.0;
/// Median cutoff for voxel-unit data
const VOXEL_MEDIAN_CUTOFF: f64 = 100.0;
/// Axes that must clear the cutoff
const MIN_AXES_ABOVE_CUTOFF: usize = 2;

/// Round to one decimal place
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Keep only coordinates that look like atlas positions
///
/// Rows with any non-finite value are dropped and the rest are rounded to
/// 0.1. Returns `None` when nothing remains or the set as a whole fails
/// the median test.
pub fn filter_anatomical_coordinates(rows: &[Coordinate]) -> Option<Vec<Coordinate>> {
    let coords: Vec<Coordinate> = rows
        .iter()
        .filter(|row| row.iter().all(|v| v.is_finite()))
        .map(|row| [round_tenth(row[0]), round_tenth(row[1]), round_tenth(row[2])])
        .collect();

    if coords.is_empty() {
        return None;
    }

    let mut max_magnitude = 0.0_f64;
    let mut medians = [0.0_f64; 3];
    for (axis, median) in medians.iter_mut().enumerate() {
        let mut magnitudes: Vec<f64> = coords.iter().map(|c| c[axis].abs()).collect();
        magnitudes.sort_by(f64::total_cmp);
        *median = magnitudes[magnitudes.len() / 2];
        max_magnitude = max_magnitude.max(magnitudes[magnitudes.len() - 1]);
    }

    let cutoff = if max_magnitude > MICROMETER_SCALE_MIN {
        MICROMETER_MEDIAN_CUTOFF
    } else {
        VOXEL_MEDIAN_CUTOFF
    };

    let axes_above = medians.iter().filter(|&&m| m > cutoff).count();
    (axes_above >= MIN_AXES_ABOVE_CUTOFF).then_some(coords)
}
