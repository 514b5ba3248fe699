// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TurfError};

/// Default upper bound on a single frame (64 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Physical layout of a packed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLayout {
    /// `FloatRegion || MetadataRegion` with no header.
    ///
    /// Bit-compatible with existing headerless (v0) frames.
    /// The region boundary is recovered by scanning.
    Legacy,
    /// `HEADER(12) || FloatRegion || MetadataRegion || CHECKSUM(32)?`.
    #[default]
    Prefixed,
}

/// Byte order of the float region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatOrder {
    /// Host byte order.
    #[default]
    Native,
    /// Little-endian.
    Little,
    /// Big-endian.
    Big,
}

impl FloatOrder {
    /// Resolve [`FloatOrder::Native`] to the concrete order of this target.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Native if cfg!(target_endian = "big") => Self::Big,
            Self::Native => Self::Little,
            other => other,
        }
    }

    /// Returns `true` if this order writes big-endian words.
    #[must_use]
    pub fn is_big(self) -> bool {
        self.resolve() == Self::Big
    }

    pub(crate) fn encode(self, value: f32) -> [u8; 4] {
        match self {
            Self::Native => value.to_ne_bytes(),
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    pub(crate) fn decode(self, word: [u8; 4]) -> f32 {
        match self {
            Self::Native => f32::from_ne_bytes(word),
            Self::Little => f32::from_le_bytes(word),
            Self::Big => f32::from_be_bytes(word),
        }
    }
}

/// Codec settings.
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "layout": "prefixed", "float_order": "little", "checksum": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Frame layout written by `encode` and expected by `decode`.
    pub layout: FrameLayout,
    /// Byte order of the float region. Prefixed frames record the resolved
    /// order in their flags, so this only governs what `encode` writes there.
    pub float_order: FloatOrder,
    /// Append a BLAKE3 checksum trailer (prefixed layout only).
    pub checksum: bool,
    /// Upper bound on frame size for both directions.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            layout: FrameLayout::Prefixed,
            float_order: FloatOrder::Native,
            checksum: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl FrameConfig {
    /// Preset for reading and writing headerless (v0) frames.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            layout: FrameLayout::Legacy,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config blob.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let cfg: Self =
            serde_json::from_slice(bytes).map_err(|e| TurfError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len == 0 {
            return Err(TurfError::InvalidConfig(
                "max_frame_len must be non-zero".into(),
            ));
        }
        if self.checksum && self.layout == FrameLayout::Legacy {
            return Err(TurfError::InvalidConfig(
                "checksum requires the prefixed layout".into(),
            ));
        }
        Ok(())
    }
}
