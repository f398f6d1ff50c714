//! Dataset cleaning passes.
//!
//! Two independent, idempotent passes run before any statistics:
//! masking of overflowed raw values and nulling of configured
//! known-bad (gain, range) combinations on the VIS channel.

use crate::config::BadVisCombo;
use crate::core::loaders::Dataset;

/// Replace saturated raw values with missing.
///
/// Any `ir` or `vis` cell equal to `sentinel` is set to `None`. The
/// sensor reports its maximum representable value (0xFFFF by default)
/// when a channel over-exposes, so such cells carry no information.
pub fn mask_overflow(dataset: &mut Dataset, sentinel: f64) {
    for reading in &mut dataset.readings {
        if reading.ir == Some(sentinel) {
            reading.ir = None;
        }
        if reading.vis == Some(sentinel) {
            reading.vis = None;
        }
    }
}

/// Null VIS readings for configured known-bad (gain, range) combinations.
///
/// Range labels are compared case-insensitively. Only the VIS channel is
/// affected; IR readings of the same rows stay valid.
pub fn mask_bad_combos(dataset: &mut Dataset, combos: &[BadVisCombo]) {
    for reading in &mut dataset.readings {
        let bad = combos.iter().any(|combo| {
            (reading.gain - combo.gain).abs() < f64::EPSILON
                && reading.range.eq_ignore_ascii_case(&combo.range)
        });
        if bad {
            reading.vis = None;
        }
    }
}
