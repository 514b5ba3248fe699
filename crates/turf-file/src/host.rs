// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dynamic-argument entry points.
//!
//! Hosts that hand over untyped values (a script runtime, an RPC layer) call
//! [`Host::pack`] and [`Host::unpack`] with a slice of [`HostValue`]s. The
//! checks run in a fixed order and each failure maps to one [`TurfError`]
//! variant:
//!
//! 1. argument count ([`TurfError::Arity`])
//! 2. both arguments are arrays ([`TurfError::TypeMismatch`])
//! 3. equal lengths ([`TurfError::LengthMismatch`])
//! 4. every shape is an array ([`TurfError::TypeMismatch`])
//! 5. every coordinate is a number ([`TurfError::InvalidCoordinate`])

use serde_json::Value;
use tracing::instrument;

use crate::error::{Result, TurfError};
use crate::frame::FrameCodec;
use crate::metadata::{JsonFormat, MetadataFormat};
use crate::shape::ShapeSet;

/// An untyped argument as received from a host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Any JSON-shaped value (arrays, objects, numbers, strings, ...).
    Json(Value),
    /// A raw byte buffer.
    Buffer(Vec<u8>),
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

/// Result of [`Host::unpack`].
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    /// Decoded shapes at wire precision.
    pub shapes: ShapeSet,
    /// Metadata records, index-aligned with `shapes`.
    pub metadata: Vec<Value>,
}

/// Host-facing `pack`/`unpack` pair bound to one codec instance.
#[derive(Debug, Clone)]
pub struct Host<F = JsonFormat> {
    codec: FrameCodec<F>,
}

impl Default for Host<JsonFormat> {
    fn default() -> Self {
        Self::new(FrameCodec::default())
    }
}

impl<F: MetadataFormat> Host<F> {
    /// Bind the entry points to `codec`.
    pub fn new(codec: FrameCodec<F>) -> Self {
        Self { codec }
    }

    /// Underlying codec.
    pub fn codec(&self) -> &FrameCodec<F> {
        &self.codec
    }

    /// `pack(shapes, metadata) -> frame`.
    #[instrument(level = "debug", skip_all, fields(args = args.len()))]
    pub fn pack(&self, args: &[HostValue]) -> Result<Vec<u8>> {
        let [shapes, metadata] = args else {
            return Err(TurfError::Arity("pack takes two arguments"));
        };
        let HostValue::Json(Value::Array(shapes)) = shapes else {
            return Err(TurfError::TypeMismatch(
                "pack takes 1st argument array of shapes",
            ));
        };
        let HostValue::Json(Value::Array(metadata)) = metadata else {
            return Err(TurfError::TypeMismatch(
                "pack takes 2nd argument array of turfs",
            ));
        };
        if shapes.len() != metadata.len() {
            return Err(TurfError::LengthMismatch {
                shapes: shapes.len(),
                metadata: metadata.len(),
            });
        }
        let shapes = shapes
            .iter()
            .map(|shape| match shape {
                Value::Array(coords) => Ok(coords.as_slice()),
                _ => Err(TurfError::TypeMismatch(
                    "pack takes 1st argument array of arrays",
                )),
            })
            .collect::<Result<Vec<&[Value]>>>()?;
        self.codec.encode::<&[Value], Value, Value>(&shapes, metadata)
    }

    /// `unpack(frame) -> { shapes, metadata }`.
    #[instrument(level = "debug", skip_all, fields(args = args.len()))]
    pub fn unpack(&self, args: &[HostValue]) -> Result<Unpacked> {
        let [frame] = args else {
            return Err(TurfError::Arity("unpack takes one argument"));
        };
        let HostValue::Buffer(frame) = frame else {
            return Err(TurfError::TypeMismatch("unpack takes a buffer argument"));
        };
        let (shapes, metadata) = self.codec.decode::<Value>(frame)?;
        Ok(Unpacked { shapes, metadata })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{FrameConfig, FrameLayout};
    use serde_json::json;

    fn arg(value: Value) -> HostValue {
        HostValue::Json(value)
    }

    #[test]
    fn pack_then_unpack() {
        let host = Host::default();
        let frame = host
            .pack(&[arg(json!([[1, 2], [3.5]])), arg(json!([{"id": 1}, {"id": 2}]))])
            .unwrap();
        let out = host.unpack(&[HostValue::Buffer(frame)]).unwrap();
        assert_eq!(out.shapes, vec![vec![1.0f32, 2.0], vec![3.5]]);
        assert_eq!(out.metadata, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn legacy_host_writes_headerless_frames() {
        let host = Host::new(FrameCodec::new(FrameConfig::legacy()).unwrap());
        assert_eq!(host.codec().config().layout, FrameLayout::Legacy);
        let frame = host
            .pack(&[arg(json!([[1.0]])), arg(json!([{"id": 1.0}]))])
            .unwrap();
        assert_eq!(&frame[8..], br#"[{"id":1}]"#);
        let out = host.unpack(&[HostValue::Buffer(frame)]).unwrap();
        assert_eq!(out.shapes, vec![vec![1.0f32]]);
        assert_eq!(out.metadata, vec![json!({"id": 1})]);
    }

    #[test]
    fn unpack_requires_a_buffer() {
        let err = Host::default().unpack(&[arg(json!([]))]).unwrap_err();
        assert!(matches!(err, TurfError::TypeMismatch(_)));
    }

    #[test]
    fn shape_type_check_precedes_coordinate_check() {
        let err = Host::default()
            .pack(&[arg(json!([[1, "x"], "y"])), arg(json!([1, 2]))])
            .unwrap_err();
        assert_eq!(
            err,
            TurfError::TypeMismatch("pack takes 1st argument array of arrays")
        );
    }
}
