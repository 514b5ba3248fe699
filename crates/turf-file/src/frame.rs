// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame codec: joins a packed float region with a metadata region.
//!
//! Prefixed layout (default):
//!
//! ``MAGIC(4) || VERSION(2) || FLAGS(2) || FLOAT_COUNT(4) || FLOATS || METADATA || CHECKSUM(32)?``
//!
//! * header scalars are little-endian
//! * FLAGS bit 0: BLAKE3-256 checksum over everything before it is appended
//! * FLAGS bit 1: FLOATS are big-endian (little-endian otherwise)
//!
//! Legacy layout: ``FLOATS || METADATA`` with no header. The float region uses
//! the configured byte order and its end is recovered by scanning for the
//! sentinel after which the rest of the frame parses as exactly that many
//! metadata records.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, trace};

use crate::codec::{decode_f32s, Reader, Writer};
use crate::config::{FloatOrder, FrameConfig, FrameLayout};
use crate::error::{Result, TurfError};
use crate::metadata::{JsonFormat, MetadataFormat};
use crate::shape::{self, Coordinate, ShapeSet};

/// Frame magic "TURF".
pub const MAGIC: [u8; 4] = *b"TURF";
/// Prefixed layout version.
pub const VERSION: u16 = 0x0001;
/// Header length of the prefixed layout.
pub const HEADER_LEN: usize = 12;
/// Length of the optional checksum trailer.
pub const CHECKSUM_LEN: usize = 32;
/// Flag: checksum trailer present.
pub const FLAG_CHECKSUM: u16 = 0x0001;
/// Flag: float region is big-endian.
pub const FLAG_BIG_ENDIAN: u16 = 0x0002;

const KNOWN_FLAGS: u16 = FLAG_CHECKSUM | FLAG_BIG_ENDIAN;

/// Packs `(shapes, metadata)` into frames and back.
///
/// Holds no mutable state; one instance may be shared across threads.
#[derive(Debug, Clone)]
pub struct FrameCodec<F = JsonFormat> {
    format: F,
    config: FrameConfig,
}

impl Default for FrameCodec<JsonFormat> {
    fn default() -> Self {
        Self {
            format: JsonFormat,
            config: FrameConfig::default(),
        }
    }
}

impl FrameCodec<JsonFormat> {
    /// JSON metadata with the given settings.
    pub fn new(config: FrameConfig) -> Result<Self> {
        Self::with_format(JsonFormat, config)
    }
}

impl<F: MetadataFormat> FrameCodec<F> {
    /// Codec with an explicit metadata format.
    pub fn with_format(format: F, config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { format, config })
    }

    /// Active settings.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Pack shapes and their index-aligned metadata records into one frame.
    #[instrument(level = "debug", skip_all, fields(shapes = shapes.len(), layout = ?self.config.layout))]
    pub fn encode<S, C, T>(&self, shapes: &[S], metadata: &[T]) -> Result<Vec<u8>>
    where
        S: AsRef<[C]>,
        C: Coordinate,
        T: Serialize,
    {
        if shapes.len() != metadata.len() {
            return Err(TurfError::LengthMismatch {
                shapes: shapes.len(),
                metadata: metadata.len(),
            });
        }
        let floats = shape::flatten(shapes)?;
        let region = self.format.to_bytes(metadata)?;

        let out = match self.config.layout {
            FrameLayout::Legacy => self.write_legacy(&floats, &region)?,
            FrameLayout::Prefixed => self.write_prefixed(&floats, &region)?,
        };
        debug!(
            floats = floats.len(),
            metadata_bytes = region.len(),
            frame_bytes = out.len(),
            "packed frame"
        );
        Ok(out)
    }

    /// Unpack a frame into shapes and their metadata records.
    #[instrument(level = "debug", skip_all, fields(len = frame.len(), layout = ?self.config.layout))]
    pub fn decode<T: DeserializeOwned>(&self, frame: &[u8]) -> Result<(ShapeSet, Vec<T>)> {
        self.check_bound(frame.len())?;
        let (shapes, records) = match self.config.layout {
            FrameLayout::Legacy => self.read_legacy(frame)?,
            FrameLayout::Prefixed => self.read_prefixed(frame)?,
        };
        debug!(shapes = shapes.len(), "unpacked frame");
        Ok((shapes, records))
    }

    fn check_bound(&self, len: usize) -> Result<()> {
        if len > self.config.max_frame_len {
            return Err(TurfError::FrameTooLarge {
                len,
                max: self.config.max_frame_len,
            });
        }
        Ok(())
    }

    fn write_legacy(&self, floats: &[f32], region: &[u8]) -> Result<Vec<u8>> {
        let total = floats.len() * 4 + region.len();
        self.check_bound(total)?;
        let mut w = Writer::with_capacity(total);
        w.write_f32s(floats, self.config.float_order);
        w.write_bytes(region);
        Ok(w.into_vec())
    }

    fn write_prefixed(&self, floats: &[f32], region: &[u8]) -> Result<Vec<u8>> {
        let trailer = if self.config.checksum { CHECKSUM_LEN } else { 0 };
        let total = HEADER_LEN + floats.len() * 4 + region.len() + trailer;
        self.check_bound(total)?;
        let count = u32::try_from(floats.len()).map_err(|_| TurfError::FrameTooLarge {
            len: total,
            max: self.config.max_frame_len,
        })?;

        let order = self.config.float_order.resolve();
        let mut flags = 0u16;
        if self.config.checksum {
            flags |= FLAG_CHECKSUM;
        }
        if order.is_big() {
            flags |= FLAG_BIG_ENDIAN;
        }

        let mut w = Writer::with_capacity(total);
        w.write_bytes(&MAGIC);
        w.write_u16_le(VERSION);
        w.write_u16_le(flags);
        w.write_u32_le(count);
        w.write_f32s(floats, order);
        w.write_bytes(region);
        if self.config.checksum {
            let digest = blake3::hash(w.as_slice());
            w.write_bytes(digest.as_bytes());
        }
        Ok(w.into_vec())
    }

    fn read_prefixed<T: DeserializeOwned>(&self, frame: &[u8]) -> Result<(ShapeSet, Vec<T>)> {
        let mut header = Reader::new(frame);
        if header.take(4)? != MAGIC {
            return Err(TurfError::malformed("bad magic"));
        }
        let version = header.read_u16_le()?;
        if version != VERSION {
            return Err(TurfError::malformed(format!(
                "unsupported version: {version}"
            )));
        }
        let flags = header.read_u16_le()?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(TurfError::malformed(format!("unknown flags: {flags:#06x}")));
        }
        let count = header.read_u32_le()? as usize;

        let body = if flags & FLAG_CHECKSUM == 0 {
            frame
        } else {
            let split = frame
                .len()
                .checked_sub(CHECKSUM_LEN)
                .filter(|n| *n >= HEADER_LEN)
                .ok_or_else(|| TurfError::malformed("missing checksum trailer"))?;
            let (body, checksum) = frame.split_at(split);
            if blake3::hash(body).as_bytes() != checksum {
                return Err(TurfError::malformed("checksum mismatch"));
            }
            body
        };

        let order = if flags & FLAG_BIG_ENDIAN == 0 {
            FloatOrder::Little
        } else {
            FloatOrder::Big
        };
        let mut reader = Reader::new(body);
        reader.take(HEADER_LEN)?;
        let floats = reader.read_f32s(count, order)?;
        let shapes = shape::split(&floats)?;
        let records = self.format.from_bytes::<T>(reader.remaining())?;
        pair(shapes, records)
    }

    fn read_legacy<T: DeserializeOwned>(&self, frame: &[u8]) -> Result<(ShapeSet, Vec<T>)> {
        let order = self.config.float_order;
        let mut pos = 0usize;
        let mut shapes_seen = 0usize;
        let mut at_boundary = true;
        let mut last_err = None;
        loop {
            if at_boundary {
                let rest = &frame[pos..];
                if self.format.may_start_with(rest) {
                    match self.format.from_bytes::<T>(rest) {
                        Ok(records) if records.len() == shapes_seen => {
                            trace!(offset = pos, shapes = shapes_seen, "region boundary found");
                            let floats = decode_f32s(&frame[..pos], order);
                            return pair(shape::split(&floats)?, records);
                        }
                        Ok(records) => {
                            trace!(offset = pos, records = records.len(), "record count disagrees");
                            last_err = Some(TurfError::malformed(format!(
                                "{} metadata records at offset {pos} but {shapes_seen} shapes",
                                records.len()
                            )));
                        }
                        Err(err) => {
                            trace!(offset = pos, %err, "not a metadata region");
                            last_err = Some(err);
                        }
                    }
                }
            }
            let Some(word) = frame.get(pos..pos + 4) else {
                break;
            };
            let value = order.decode([word[0], word[1], word[2], word[3]]);
            at_boundary = shape::is_sentinel(value);
            if at_boundary {
                shapes_seen += 1;
            }
            pos += 4;
        }
        let msg = "no boundary between float and metadata regions";
        Err(TurfError::malformed(match last_err {
            Some(err) => format!("{msg} (last candidate: {err})"),
            None => msg.to_owned(),
        }))
    }
}

fn pair<T>(shapes: ShapeSet, records: Vec<T>) -> Result<(ShapeSet, Vec<T>)> {
    if shapes.len() != records.len() {
        return Err(TurfError::malformed(format!(
            "{} shapes but {} metadata records",
            shapes.len(),
            records.len()
        )));
    }
    Ok((shapes, records))
}
