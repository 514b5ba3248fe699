// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for packing and unpacking frames.

use thiserror::Error;

/// Errors produced by the shape packer, the frame codec and the host boundary.
///
/// Every error is raised before any output is produced; callers should treat
/// each one as a permanent rejection of that call's input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurfError {
    /// A boundary function was called with the wrong number of arguments.
    #[error("{0}")]
    Arity(&'static str),
    /// An argument was not the expected sequence or buffer shape.
    #[error("{0}")]
    TypeMismatch(&'static str),
    /// Shape and metadata sequences have different lengths.
    #[error("Array lengths don't match (shapes={shapes}, metadata={metadata})")]
    LengthMismatch {
        /// Number of shapes supplied.
        shapes: usize,
        /// Number of metadata records supplied.
        metadata: usize,
    },
    /// A coordinate was not a number.
    #[error("pack takes 1st argument array of arrays of floats (shape {shape}, index {index})")]
    InvalidCoordinate {
        /// Index of the offending shape.
        shape: usize,
        /// Index of the offending coordinate within the shape.
        index: usize,
    },
    /// The metadata could not be serialized.
    #[error("Error stringifying data: {0}")]
    Serialization(String),
    /// The input to `decode` is not a valid packed frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The frame exceeds the configured size bound.
    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// Actual (or projected) frame length.
        len: usize,
        /// Configured bound.
        max: usize,
    },
    /// A frame configuration could not be parsed or is inconsistent.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),
}

impl TurfError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedFrame(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, TurfError>;
