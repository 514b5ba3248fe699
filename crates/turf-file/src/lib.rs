// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pack shape coordinates and per-shape metadata into one binary frame.
//!
//! A frame carries two regions back to back:
//!
//! - **FloatRegion**: every shape's coordinates as IEEE-754 `f32`, each shape
//!   terminated by a NaN sentinel (see [`shape`]).
//! - **MetadataRegion**: the metadata records, one per shape, serialized by
//!   an injected [`MetadataFormat`] (compact JSON by default).
//!
//! [`FrameCodec`] does the typed work. [`Host`] wraps a codec with the
//! arity/type checks needed when arguments arrive as untyped host values.
//!
//! ```
//! use serde_json::{json, Value};
//! use turf_file::{FrameCodec, ShapeSet};
//!
//! let codec = FrameCodec::default();
//! let frame = codec.encode(&[[1.0f64, 2.0, 3.0, 4.0]], &[json!({"id": 1})])?;
//! let (shapes, meta): (ShapeSet, Vec<Value>) = codec.decode(&frame)?;
//! assert_eq!(shapes, vec![vec![1.0f32, 2.0, 3.0, 4.0]]);
//! assert_eq!(meta, vec![json!({"id": 1})]);
//! # Ok::<(), turf_file::TurfError>(())
//! ```
//!
//! Everything here is pure and synchronous: no I/O, no global state, and one
//! codec may be shared freely between threads.

pub mod codec;
pub mod config;
mod error;
pub mod frame;
pub mod host;
pub mod metadata;
pub mod shape;

pub use config::{FloatOrder, FrameConfig, FrameLayout};
pub use error::{Result, TurfError};
pub use frame::FrameCodec;
pub use host::{Host, HostValue, Unpacked};
pub use metadata::{JsonFormat, MetadataFormat};
pub use shape::{Coordinate, Shape, ShapeSet, SENTINEL};

use serde::{de::DeserializeOwned, Serialize};

/// Pack with the default codec (prefixed layout, JSON metadata).
pub fn pack<S, C, T>(shapes: &[S], metadata: &[T]) -> Result<Vec<u8>>
where
    S: AsRef<[C]>,
    C: Coordinate,
    T: Serialize,
{
    FrameCodec::default().encode(shapes, metadata)
}

/// Unpack with the default codec (prefixed layout, JSON metadata).
pub fn unpack<T: DeserializeOwned>(frame: &[u8]) -> Result<(ShapeSet, Vec<T>)> {
    FrameCodec::default().decode(frame)
}
