// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape packer: flattens shapes into one float32 run with NaN terminators.
//!
//! Layout of a packed run for shapes `[[a, b], [], [c]]`:
//!
//! ```text
//! a b NaN | NaN | c NaN
//! ```
//!
//! Every shape, empty or not, is followed by exactly one [`SENTINEL`].
//! Boundaries are found with `is_nan`, never with `==`.

use crate::error::{Result, TurfError};

/// Shape-boundary marker (IEEE-754 quiet NaN, bits `0x7FC0_0000`).
pub const SENTINEL: f32 = f32::from_bits(0x7FC0_0000);

/// A decoded shape, kept at wire precision.
pub type Shape = Vec<f32>;

/// Ordered collection of decoded shapes.
pub type ShapeSet = Vec<Shape>;

/// Anything that can be narrowed to a single-precision coordinate.
///
/// Returns `None` when the value is not a number at all. Special values
/// (NaN, infinities) are numbers and pass through unchanged.
pub trait Coordinate {
    /// Narrow to `f32`, truncating precision.
    fn to_f32(&self) -> Option<f32>;
}

impl Coordinate for f32 {
    fn to_f32(&self) -> Option<f32> {
        Some(*self)
    }
}

impl Coordinate for f64 {
    #[allow(clippy::cast_possible_truncation)]
    fn to_f32(&self) -> Option<f32> {
        Some(*self as f32)
    }
}

impl Coordinate for serde_json::Value {
    #[allow(clippy::cast_possible_truncation)]
    fn to_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }
}

/// Returns `true` if `value` marks a shape boundary.
#[inline]
#[must_use]
pub fn is_sentinel(value: f32) -> bool {
    value.is_nan()
}

/// Number of floats [`flatten`] produces for `shapes`.
pub fn packed_len<S, C>(shapes: &[S]) -> usize
where
    S: AsRef<[C]>,
{
    shapes.iter().map(|s| s.as_ref().len() + 1).sum()
}

/// Flatten `shapes` into one float32 run, appending a sentinel after each shape.
///
/// All-or-nothing: the first non-numeric coordinate aborts with
/// [`TurfError::InvalidCoordinate`] and no partial run is returned.
pub fn flatten<S, C>(shapes: &[S]) -> Result<Vec<f32>>
where
    S: AsRef<[C]>,
    C: Coordinate,
{
    let mut out = Vec::with_capacity(packed_len::<S, C>(shapes));
    for (shape_idx, shape) in shapes.iter().enumerate() {
        for (index, coord) in shape.as_ref().iter().enumerate() {
            let value = coord.to_f32().ok_or(TurfError::InvalidCoordinate {
                shape: shape_idx,
                index,
            })?;
            out.push(value);
        }
        out.push(SENTINEL);
    }
    Ok(out)
}

/// Split a packed float run back into shapes.
///
/// Floats after the last sentinel mean the run was truncated or is not a
/// packed run at all; that is reported as [`TurfError::MalformedFrame`].
pub fn split(floats: &[f32]) -> Result<ShapeSet> {
    let mut shapes = Vec::with_capacity(sentinel_count(floats));
    let mut current = Vec::new();
    for &value in floats {
        if is_sentinel(value) {
            shapes.push(core::mem::take(&mut current));
        } else {
            current.push(value);
        }
    }
    if !current.is_empty() {
        return Err(TurfError::malformed(format!(
            "{} trailing floats without a shape terminator",
            current.len()
        )));
    }
    Ok(shapes)
}

/// Number of shape boundaries in a packed run.
pub fn sentinel_count(floats: &[f32]) -> usize {
    floats.iter().filter(|v| is_sentinel(**v)).count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_appends_one_sentinel_per_shape() {
        let shapes = vec![vec![1.0f64, 2.0], vec![], vec![3.0]];
        let floats = flatten(&shapes).unwrap();
        assert_eq!(floats.len(), packed_len::<_, f64>(&shapes));
        assert_eq!(floats.len(), 6);
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[1], 2.0);
        assert!(floats[2].is_nan());
        assert!(floats[3].is_nan());
        assert_eq!(floats[4], 3.0);
        assert!(floats[5].is_nan());
        assert_eq!(sentinel_count(&floats), 3);
    }

    #[test]
    fn flatten_narrows_to_single_precision() {
        let floats = flatten(&[[0.1f64]]).unwrap();
        assert_eq!(floats[0], 0.1f32);
        assert_ne!(f64::from(floats[0]), 0.1f64);
    }

    #[test]
    fn flatten_empty_set_is_empty() {
        let shapes: Vec<Vec<f64>> = Vec::new();
        assert!(flatten(&shapes).unwrap().is_empty());
    }

    #[test]
    fn flatten_rejects_non_numeric_coordinates() {
        let shapes = vec![vec![json!(1.0), json!(2)], vec![json!(3), json!("a")]];
        let err = flatten(&shapes).unwrap_err();
        assert_eq!(err, TurfError::InvalidCoordinate { shape: 1, index: 1 });
    }

    #[test]
    fn flatten_passes_special_values_through() {
        let floats = flatten(&[[f64::INFINITY, f64::NEG_INFINITY]]).unwrap();
        assert_eq!(floats[0], f32::INFINITY);
        assert_eq!(floats[1], f32::NEG_INFINITY);
    }

    #[test]
    fn split_inverts_flatten() {
        let shapes = vec![vec![1.5f32, -2.25], vec![], vec![8.0, 9.0, 10.0]];
        let floats = flatten(&shapes).unwrap();
        assert_eq!(split(&floats).unwrap(), shapes);
    }

    #[test]
    fn split_rejects_unterminated_tail() {
        let err = split(&[1.0, SENTINEL, 2.0]).unwrap_err();
        assert!(matches!(err, TurfError::MalformedFrame(_)));
    }

    #[test]
    fn sentinel_detection_ignores_nan_payload_bits() {
        let other_nan = f32::from_bits(0x7FC0_0001);
        assert!(is_sentinel(other_nan));
        assert_eq!(split(&[other_nan]).unwrap(), vec![Vec::<f32>::new()]);
    }
}
