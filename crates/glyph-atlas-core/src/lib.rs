//! Incremental glyph-atlas packing.
//!
//! - Skyline profile with bottom-left placement on one fixed square surface
//! - Batch packing of caller-owned glyph records, written back in place
//! - Compact binary state so an atlas can be resumed in a later session
//!
//! Quick example:
//! ```
//! use glyph_atlas_core::prelude::*;
//!
//! let cfg = AtlasConfig::builder().size(128).margin(1).build();
//! let mut atlas = AtlasPacker::new(cfg);
//! let mut glyphs = vec![
//!     GlyphRequest::new(36, 50, 50),
//!     GlyphRequest::new(37, 50, 30),
//!     GlyphRequest::new(38, 40, 30),
//! ];
//! assert_eq!(atlas.pack_glyphs(&mut glyphs), 3);
//!
//! let bytes = atlas.encode().unwrap();
//! let restored = AtlasPacker::decode(&bytes).unwrap();
//! assert_eq!(restored.segments(), atlas.segments());
//! ```

pub mod config;
pub mod error;
pub mod glyph;
pub mod model;
pub mod packer;
pub mod placement;
pub mod serialize;
pub mod skyline;

pub use config::*;
pub use error::*;
pub use glyph::*;
pub use model::*;
pub use packer::*;
pub use skyline::*;

/// Convenience prelude for common types and functions.
/// Importing `glyph_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, SortOrder};
    pub use crate::error::{GlyphAtlasError, Result};
    pub use crate::glyph::{
        AtlasRect, FontUnitMetrics, GlyphMetrics, GlyphRequest, UNPLACED, sort_glyphs,
        unique_glyph_indices,
    };
    pub use crate::model::{AtlasState, AtlasStats, Placement, SkylineSegment};
    pub use crate::packer::AtlasPacker;
    pub use crate::skyline::Skyline;
}
