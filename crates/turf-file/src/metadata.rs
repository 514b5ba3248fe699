// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Metadata serialization port.
//!
//! The codec never picks a text format itself; it is handed a
//! [`MetadataFormat`] at construction. [`JsonFormat`] is the stock adapter and
//! produces the same compact text as `JSON.stringify` for plain records:
//! whole-number floats are written in integer form (`1.0` becomes `1`), since a
//! script host hands every number over as a double. Exponent notation for very
//! large or small magnitudes still follows `serde_json` (`1e21`, not `1e+21`).

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Number, Value};

use crate::error::{Result, TurfError};

/// Serializer for the metadata region.
pub trait MetadataFormat {
    /// Serialize an ordered sequence of records into the region bytes.
    ///
    /// Failures map to [`TurfError::Serialization`].
    fn to_bytes<T: Serialize>(&self, records: &[T]) -> Result<Vec<u8>>;

    /// Parse region bytes back into records.
    ///
    /// Failures map to [`TurfError::MalformedFrame`].
    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Vec<T>>;

    /// Quick pre-check used while scanning headerless frames: can a region
    /// start with these bytes at all?
    fn may_start_with(&self, _bytes: &[u8]) -> bool {
        true
    }
}

/// Compact JSON metadata region (`[{"id":1}]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormat;

impl MetadataFormat for JsonFormat {
    fn to_bytes<T: Serialize>(&self, records: &[T]) -> Result<Vec<u8>> {
        let mut tree =
            serde_json::to_value(records).map_err(|e| TurfError::Serialization(e.to_string()))?;
        integral_floats_to_ints(&mut tree);
        serde_json::to_vec(&tree).map_err(|e| TurfError::Serialization(e.to_string()))
    }

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Vec<T>> {
        serde_json::from_slice(bytes)
            .map_err(|e| TurfError::malformed(format!("invalid metadata region: {e}")))
    }

    fn may_start_with(&self, bytes: &[u8]) -> bool {
        bytes.first() == Some(&b'[')
    }
}

/// Rewrite finite whole-number floats as integers, matching how a script
/// host prints its doubles. Values outside the `i64`/`u64` range stay floats.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn integral_floats_to_ints(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            let Some(f) = n.as_f64() else { return };
            if !f.is_finite() || f.fract() != 0.0 {
                return;
            }
            if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                *n = Number::from(f as i64);
            } else if f >= 0.0 && f < u64::MAX as f64 {
                *n = Number::from(f as u64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integral_floats_to_ints),
        Value::Object(map) => map.values_mut().for_each(integral_floats_to_ints),
        _ => {}
    }
}
