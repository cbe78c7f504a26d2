//! Module containing miscellaneous utility functions.
//!
//! The order-dependent primitives (`diff`, `prev`, `step_means`, `ndarrcumsum`) are
//! explicit forward scans carrying a single piece of prior-row state.

use itertools::Itertools;

use crate::imports::*;

/// First difference; the first element has no predecessor and is zero.
pub fn diff(x: &Array1<f64>) -> Array1<f64> {
    match x.first() {
        Some(&first) => x - &prev(x, first),
        None => Array1::zeros(0),
    }
}

/// Previous-row values of `x`, with `fill` standing in for the first row.
pub fn prev(x: &Array1<f64>, fill: f64) -> Array1<f64> {
    let mut last = fill;
    x.iter()
        .map(|&xi| {
            let out = last;
            last = xi;
            out
        })
        .collect()
}

/// Mean of each sample and its predecessor; zero for the first sample.
pub fn step_means(x: &Array1<f64>) -> Array1<f64> {
    let mut prev: Option<f64> = None;
    x.iter()
        .map(|&xi| {
            let avg = prev.map_or(0.0, |p| 0.5 * (xi + p));
            prev = Some(xi);
            avg
        })
        .collect()
}

/// return cumsum <f64> of arr
pub fn ndarrcumsum(arr: &Array1<f64>) -> Array1<f64> {
    arr.iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// return max <f64> of arr, ignoring NaN; NaN if arr is empty
pub fn ndarrmax(arr: &Array1<f64>) -> f64 {
    arr.iter().copied().fold(f64::NAN, f64::max)
}

/// return true if the array is all zeros
pub fn ndarrallzeros(arr: &Array1<f64>) -> bool {
    arr.iter().all(|x| *x == 0.0)
}

/// Returns `x` if finite, else zero
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Return first index of `arr` for which `pred` holds
pub fn first_where<F: Fn(f64) -> bool>(arr: &Array1<f64>, pred: F) -> Option<usize> {
    arr.iter().position(|&x| pred(x))
}

/// True if every element is no smaller than its predecessor
pub fn is_non_decreasing(arr: &Array1<f64>) -> bool {
    arr.iter().tuple_windows().all(|(prev, next)| prev <= next)
}

/// Serde adapter that reads and writes an [`Array1`] column as a plain sequence
/// rather than ndarray's `{v, dim, data}` layout
pub mod array_as_vec {
    use serde::{Deserializer, Serializer};

    use super::*;

    pub fn serialize<S: Serializer>(arr: &Array1<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(arr.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Array1<f64>, D::Error> {
        Vec::<f64>::deserialize(deserializer).map(Array1::from)
    }
}
