use serde::{Deserialize, Serialize};

use crate::config::AtlasConfig;
use crate::error::{GlyphAtlasError, Result};

/// One horizontal run of the skyline profile.
///
/// Coordinates are top-down: `y = 0` is the top of the surface and the profile
/// grows towards larger `y` as rectangles are stacked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SkylineSegment {
    pub x: i32,
    pub y: i32,
    pub width: i32,
}

impl SkylineSegment {
    pub fn new(x: i32, y: i32, width: i32) -> Self {
        Self { x, y, width }
    }
    /// Exclusive right edge (`x + width`), saturating for loaded skylines.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }
}

/// Result of a placement query or commit, in internal top-down coordinates.
///
/// `width`/`height` are the margin-inflated node dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Placement {
    /// Bottom edge of the node (top-down), i.e. the new skyline height under it.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Bottom-left corner in the caller-facing Y-up system of a `size` surface.
    #[inline]
    pub fn to_atlas_origin(&self, size: i32) -> (i32, i32) {
        (self.x, size.saturating_sub(self.bottom()))
    }
}

/// Plain-data snapshot of a packer: its configuration and skyline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasState {
    pub config: AtlasConfig,
    pub segments: Vec<SkylineSegment>,
}

impl AtlasState {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GlyphAtlasError::Encode(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| GlyphAtlasError::Corrupt(e.to_string()))
    }
}

/// Statistics about how much of the surface the skyline has consumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtlasStats {
    /// Surface side length in pixels.
    pub size: i32,
    /// Number of skyline segments.
    pub num_segments: usize,
    /// Shallowest skyline height (top-down), i.e. the most open column.
    pub min_height: i32,
    /// Deepest skyline height (top-down).
    pub max_height: i32,
    /// Usable area inside the margins.
    pub usable_area: u64,
    /// Area above the skyline: placed nodes plus gaps trapped beneath them.
    pub consumed_area: u64,
    /// `consumed_area / usable_area` (0.0 to 1.0).
    pub fill_ratio: f64,
}

impl AtlasStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Size: {0}x{0}, Segments: {1}, Skyline: {2}..{3} px, Consumed: {4}/{5} px² ({6:.2}%)",
            self.size,
            self.num_segments,
            self.min_height,
            self.max_height,
            self.consumed_area,
            self.usable_area,
            self.fill_ratio * 100.0,
        )
    }

    /// Area still open below the skyline.
    pub fn free_area(&self) -> u64 {
        self.usable_area.saturating_sub(self.consumed_area)
    }
}
