use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::config::SortOrder;

/// Coordinate written to both axes of an item that could not be placed.
pub const UNPLACED: i32 = -1;

/// A caller-owned record the packer can size and position in place.
///
/// `width`/`height` are the content size in pixels, without margin. Positions
/// written back are the bottom-left corner in the Y-up atlas space.
pub trait AtlasRect {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn set_position(&mut self, x: i32, y: i32);

    fn mark_unplaced(&mut self) {
        self.set_position(UNPLACED, UNPLACED);
    }
}

/// Minimal packing request: a glyph index and the pixel box to reserve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlyphRequest {
    pub index: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "unplaced")]
    pub x: i32,
    #[serde(default = "unplaced")]
    pub y: i32,
}

impl GlyphRequest {
    pub fn new(index: i32, width: i32, height: i32) -> Self {
        Self {
            index,
            width,
            height,
            x: UNPLACED,
            y: UNPLACED,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

impl AtlasRect for GlyphRequest {
    fn width(&self) -> i32 {
        self.width
    }
    fn height(&self) -> i32 {
        self.height
    }
    fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }
}

fn unplaced() -> i32 {
    UNPLACED
}

/// Glyph outline box in font units, as reported by the font provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FontUnitMetrics {
    pub width: i32,
    pub height: i32,
    /// Horizontal bearing: pen position to the left edge of the outline.
    pub bearing_x: i32,
    /// Vertical bearing: baseline to the top edge of the outline.
    pub bearing_y: i32,
}

/// Per-glyph atlas record: where the glyph lives in the atlas (pixels) and the
/// font-unit box needed to lay it out.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub index: i32,
    pub atlas_x: i32,
    pub atlas_y: i32,
    pub atlas_width: i32,
    pub atlas_height: i32,
    pub width_fu: i32,
    pub height_fu: i32,
    pub left_fu: i32,
    pub top_fu: i32,
}

impl GlyphMetrics {
    /// Scale a font-unit outline box to `glyph_size` pixels per em and grow it
    /// by `padding` on every side. The result starts unplaced.
    pub fn from_font_units(
        index: i32,
        metrics: FontUnitMetrics,
        units_per_em: i32,
        glyph_size: i32,
        padding: i32,
    ) -> Self {
        let scale = |fu: i32| -> i32 {
            if units_per_em <= 0 {
                return 0;
            }
            let px = i64::from(fu) * i64::from(glyph_size) / i64::from(units_per_em);
            px.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        };
        Self {
            index,
            atlas_x: UNPLACED,
            atlas_y: UNPLACED,
            atlas_width: scale(metrics.width) + 2 * padding,
            atlas_height: scale(metrics.height) + 2 * padding,
            width_fu: metrics.width,
            height_fu: metrics.height,
            left_fu: metrics.bearing_x,
            top_fu: metrics.bearing_y,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.atlas_x >= 0 && self.atlas_y >= 0
    }

    /// Normalized `[x, y, w, h]` of the glyph box within an `atlas_size` surface.
    pub fn uv_rect(&self, atlas_size: i32) -> Option<[f32; 4]> {
        if !self.is_placed() || atlas_size <= 0 {
            return None;
        }
        let s = atlas_size as f32;
        Some([
            self.atlas_x as f32 / s,
            self.atlas_y as f32 / s,
            self.atlas_width as f32 / s,
            self.atlas_height as f32 / s,
        ])
    }
}

impl AtlasRect for GlyphMetrics {
    fn width(&self) -> i32 {
        self.atlas_width
    }
    fn height(&self) -> i32 {
        self.atlas_height
    }
    fn set_position(&mut self, x: i32, y: i32) {
        self.atlas_x = x;
        self.atlas_y = y;
    }
}

/// Distinct glyph indices of a shaped run, ascending.
pub fn unique_glyph_indices<I>(indices: I) -> Vec<i32>
where
    I: IntoIterator<Item = i32>,
{
    indices
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Stable sort of a batch into the given packing order.
pub fn sort_glyphs<G: AtlasRect>(glyphs: &mut [G], order: SortOrder) {
    match order {
        SortOrder::HeightDesc => glyphs.sort_by_key(|g| Reverse(g.height())),
        SortOrder::AreaDesc => {
            glyphs.sort_by_key(|g| Reverse(i64::from(g.width()) * i64::from(g.height())))
        }
        SortOrder::MaxSideDesc => glyphs.sort_by_key(|g| Reverse(g.width().max(g.height()))),
        SortOrder::None => {}
    }
}
