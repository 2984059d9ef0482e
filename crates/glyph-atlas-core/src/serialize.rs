//! Binary packer state.
//!
//! Little-endian, fixed-width fields:
//!
//! ```text
//! magic       u32   b"GLAT"
//! version     u32   1
//! size        i32
//! padding     i32
//! margin      i32
//! glyph_size  i32
//! node_count  i32
//! nodes[node_count]: x i32, y i32, width i32
//! ```
//!
//! Decoding installs the node list exactly as stored. Bytes after the last
//! node are ignored.

use std::io::{self, Read, Write};

use tracing::{debug, instrument};

use crate::config::AtlasConfig;
use crate::error::{GlyphAtlasError, Result};
use crate::model::SkylineSegment;
use crate::packer::AtlasPacker;

pub const MAGIC: u32 = u32::from_le_bytes(*b"GLAT");
pub const VERSION: u32 = 1;
/// Bytes before the first node.
pub const HEADER_LEN: usize = 7 * 4;
/// Bytes per encoded node.
pub const NODE_LEN: usize = 3 * 4;

impl AtlasPacker {
    /// Exact encoded size of this packer's state.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + NODE_LEN * self.segments().len()
    }

    /// Encode into a fresh buffer. Fails only when the skyline holds more
    /// segments than the `i32` node count can describe.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let cfg = self.config();
        let segments = self.segments();
        let count = node_count(segments.len())?;
        w.put_u32(MAGIC)?;
        w.put_u32(VERSION)?;
        w.put_i32(cfg.size)?;
        w.put_i32(cfg.padding)?;
        w.put_i32(cfg.margin)?;
        w.put_i32(cfg.glyph_size)?;
        w.put_i32(count)?;
        for seg in segments {
            w.put_i32(seg.x)?;
            w.put_i32(seg.y)?;
            w.put_i32(seg.width)?;
        }
        Ok(())
    }

    /// Rebuild a packer from [`AtlasPacker::encode`] output.
    ///
    /// Magic and version are checked first; a short buffer is an error rather
    /// than a partial read. The stored skyline replaces the default one without
    /// any validation.
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            // Report a wrong format before a short one when the magic is readable.
            if let Some(head) = bytes.get(..4) {
                let found = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
                if found != MAGIC {
                    return Err(GlyphAtlasError::BadMagic { found });
                }
            }
            return Err(GlyphAtlasError::Truncated {
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }
        let mut r = bytes;
        let (config, count) = read_header(&mut r)?;
        let needed = NODE_LEN
            .checked_mul(count)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .unwrap_or(usize::MAX);
        if bytes.len() < needed {
            return Err(GlyphAtlasError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        let segments = read_nodes(&mut r, count)?;
        debug!(segments = segments.len(), "decoded atlas state");
        Ok(Self::with_segments(config, segments))
    }

    /// Like [`AtlasPacker::decode`], then rejects a skyline that breaks the
    /// ordering, coverage or merge invariants.
    pub fn decode_strict(bytes: &[u8]) -> Result<Self> {
        let packer = Self::decode(bytes)?;
        let cfg = packer.config();
        packer
            .skyline()
            .check_invariants(cfg.margin, cfg.usable_limit())?;
        Ok(packer)
    }

    /// Streaming counterpart of [`AtlasPacker::decode`].
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let (config, count) = read_header(r)?;
        let segments = read_nodes(r, count)?;
        Ok(Self::with_segments(config, segments))
    }
}

fn node_count(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| GlyphAtlasError::Encode(format!("{len} segments do not fit the format")))
}

fn read_header<R: Read>(r: &mut R) -> Result<(AtlasConfig, usize)> {
    let magic = r.next_u32().map_err(|e| short(e, 0))?;
    if magic != MAGIC {
        return Err(GlyphAtlasError::BadMagic { found: magic });
    }
    let version = r.next_u32().map_err(|e| short(e, 4))?;
    if version != VERSION {
        return Err(GlyphAtlasError::UnsupportedVersion { found: version });
    }
    let mut fields = [0i32; 5];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = r.next_i32().map_err(|e| short(e, 8 + 4 * i))?;
    }
    let [size, padding, margin, glyph_size, node_count] = fields;
    let count = usize::try_from(node_count)
        .map_err(|_| GlyphAtlasError::Corrupt(format!("negative node count {node_count}")))?;
    let config = AtlasConfig {
        size,
        padding,
        margin,
        glyph_size,
    };
    Ok((config, count))
}

fn read_nodes<R: Read>(r: &mut R, count: usize) -> Result<Vec<SkylineSegment>> {
    // Cap the up-front allocation; a stream may lie about its length.
    let mut nodes = Vec::with_capacity(count.min(4096));
    for i in 0..count {
        let offset = HEADER_LEN + NODE_LEN * i;
        let x = r.next_i32().map_err(|e| short(e, offset))?;
        let y = r.next_i32().map_err(|e| short(e, offset + 4))?;
        let width = r.next_i32().map_err(|e| short(e, offset + 8))?;
        nodes.push(SkylineSegment { x, y, width });
    }
    Ok(nodes)
}

/// Map an end-of-input while reading the 4-byte field at `offset`.
fn short(e: io::Error, offset: usize) -> GlyphAtlasError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        GlyphAtlasError::Truncated {
            needed: offset + 4,
            available: offset,
        }
    } else {
        GlyphAtlasError::Io(e)
    }
}

trait ReadLe {
    fn next_u32(&mut self) -> io::Result<u32>;
    fn next_i32(&mut self) -> io::Result<i32>;
}

impl<R: Read + ?Sized> ReadLe for R {
    fn next_u32(&mut self) -> io::Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn next_i32(&mut self) -> io::Result<i32> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(i32::from_le_bytes(bytes))
    }
}

trait WriteLe {
    fn put_u32(&mut self, v: u32) -> io::Result<()>;
    fn put_i32(&mut self, v: i32) -> io::Result<()>;
}

impl<W: Write + ?Sized> WriteLe for W {
    fn put_u32(&mut self, v: u32) -> io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }

    fn put_i32(&mut self, v: i32) -> io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AtlasPacker {
        let cfg = AtlasConfig::builder()
            .size(128)
            .padding(3)
            .margin(1)
            .glyph_size(24)
            .build();
        let mut p = AtlasPacker::new(cfg);
        p.place(20, 30).unwrap();
        p.place(10, 12).unwrap();
        p
    }

    #[test]
    fn layout_is_little_endian_and_exact() {
        let p = sample();
        let bytes = p.encode().unwrap();
        assert_eq!(bytes.len(), p.encoded_len());
        assert_eq!(&bytes[0..4], b"GLAT");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &128i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &1i32.to_le_bytes());
        assert_eq!(&bytes[20..24], &24i32.to_le_bytes());
        assert_eq!(&bytes[24..28], &(p.segments().len() as i32).to_le_bytes());
        assert_eq!(&bytes[28..32], &p.segments()[0].x.to_le_bytes());
    }

    #[test]
    fn stream_and_slice_decoding_agree() {
        let p = sample();
        let bytes = p.encode().unwrap();
        let from_slice = AtlasPacker::decode(&bytes).unwrap();
        let from_stream = AtlasPacker::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(from_slice, p);
        assert_eq!(from_stream, p);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = sample().encode().unwrap();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            AtlasPacker::decode(&bytes),
            Err(GlyphAtlasError::UnsupportedVersion { found: 2 })
        ));
    }

    #[test]
    fn negative_node_count_is_corrupt() {
        let mut bytes = sample().encode().unwrap();
        bytes[24..28].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            AtlasPacker::decode(&bytes),
            Err(GlyphAtlasError::Corrupt(_))
        ));
    }

    #[test]
    fn node_count_rejects_lengths_past_i32() {
        assert_eq!(node_count(0).unwrap(), 0);
        assert_eq!(node_count(i32::MAX as usize).unwrap(), i32::MAX);
        assert!(matches!(
            node_count(i32::MAX as usize + 1),
            Err(GlyphAtlasError::Encode(_))
        ));
    }

    #[test]
    fn short_stream_reports_truncation() {
        let bytes = sample().encode().unwrap();
        let cut = &bytes[..bytes.len() - 2];
        assert!(matches!(
            AtlasPacker::read_from(&mut &cut[..]),
            Err(GlyphAtlasError::Truncated { .. })
        ));
    }
}
