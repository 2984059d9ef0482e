use tracing::{debug, instrument, trace, warn};

use crate::config::AtlasConfig;
use crate::glyph::AtlasRect;
use crate::model::{AtlasState, AtlasStats, Placement, SkylineSegment};
use crate::placement;
use crate::skyline::Skyline;

/// Incremental glyph packer for one fixed-size square surface.
///
/// Single owner, no interior locking: callers sharing a packer across threads
/// must wrap it in their own lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasPacker {
    config: AtlasConfig,
    skyline: Skyline,
}

impl AtlasPacker {
    /// Create a packer with a single free segment spanning the usable width.
    ///
    /// The configuration is not rejected: if `size <= 2 * margin` the skyline
    /// starts empty and every placement reports no room. Call
    /// [`AtlasConfig::validate`] first to catch that up front.
    pub fn new(config: AtlasConfig) -> Self {
        if !config.has_usable_space() {
            warn!(
                size = config.size,
                margin = config.margin,
                "atlas margins leave no usable space; every placement will fail"
            );
        }
        Self {
            skyline: Skyline::new(&config),
            config,
        }
    }

    /// Rebuild a packer from a snapshot. The segments are installed verbatim.
    pub fn from_state(state: AtlasState) -> Self {
        Self::with_segments(state.config, state.segments)
    }

    pub(crate) fn with_segments(config: AtlasConfig, segments: Vec<SkylineSegment>) -> Self {
        let mut packer = Self::new(config);
        packer.skyline = Skyline::from_segments(segments);
        packer
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }

    pub fn segments(&self) -> &[SkylineSegment] {
        self.skyline.segments()
    }

    /// Discard every placement and start over with the initial skyline.
    pub fn reset(&mut self) {
        self.skyline.reset(&self.config);
    }

    /// Rough check whether a glyph of `estimated_height` still fits under the
    /// deepest part of the skyline. A real placement may still succeed or fail.
    pub fn is_full(&self, estimated_height: i32) -> bool {
        match self.skyline.max_height() {
            Some(deepest) => {
                i64::from(deepest) + i64::from(estimated_height)
                    > i64::from(self.config.usable_limit())
            }
            None => true,
        }
    }

    /// Whether a `width x height` glyph would be placed right now.
    pub fn can_place(&self, width: i32, height: i32) -> bool {
        self.find_node(width, height).is_some()
    }

    /// Place one `width x height` glyph and return its bottom-left corner in
    /// Y-up atlas space, or `None` if the size is not positive or there is no room.
    pub fn place(&mut self, width: i32, height: i32) -> Option<(i32, i32)> {
        let node = self.find_node(width, height)?;
        placement::commit(&mut self.skyline, &self.config, &node);
        trace!(x = node.x, y = node.y, width, height, "placed glyph");
        Some(node.to_atlas_origin(self.config.size))
    }

    /// Pack a batch in order, writing each item's atlas position in place.
    ///
    /// Items with a non-positive width or height are marked unplaced and
    /// skipped. The first item that does not fit stops the batch: it and every
    /// item after it are marked unplaced. Returns the number of items placed.
    #[instrument(skip_all, fields(count = glyphs.len()))]
    pub fn pack_glyphs<G: AtlasRect>(&mut self, glyphs: &mut [G]) -> usize {
        let mut placed = 0;
        for i in 0..glyphs.len() {
            let (w, h) = (glyphs[i].width(), glyphs[i].height());
            if w <= 0 || h <= 0 {
                trace!(item = i, width = w, height = h, "skipping empty glyph");
                glyphs[i].mark_unplaced();
                continue;
            }
            match self.place(w, h) {
                Some((x, y)) => {
                    glyphs[i].set_position(x, y);
                    placed += 1;
                }
                None => {
                    debug!(item = i, width = w, height = h, "atlas full; stopping batch");
                    for g in &mut glyphs[i..] {
                        g.mark_unplaced();
                    }
                    break;
                }
            }
        }
        debug!(placed, remaining = glyphs.len() - placed, "packed glyph batch");
        placed
    }

    /// Plain-data copy of the configuration and skyline.
    pub fn snapshot(&self) -> AtlasState {
        AtlasState {
            config: self.config,
            segments: self.skyline.segments().to_vec(),
        }
    }

    pub fn stats(&self) -> AtlasStats {
        let usable_area =
            (self.config.usable_extent() as u64) * (self.config.usable_limit().max(0) as u64);
        let consumed_area = self.skyline.area_above();
        let fill_ratio = if usable_area > 0 {
            consumed_area as f64 / usable_area as f64
        } else {
            0.0
        };
        AtlasStats {
            size: self.config.size,
            num_segments: self.skyline.len(),
            min_height: self.skyline.min_height().unwrap_or(0),
            max_height: self.skyline.max_height().unwrap_or(0),
            usable_area,
            consumed_area,
            fill_ratio,
        }
    }

    fn find_node(&self, width: i32, height: i32) -> Option<Placement> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let node_width = width.checked_add(self.config.margin)?;
        let node_height = height.checked_add(self.config.margin)?;
        placement::find_position(&self.skyline, &self.config, node_width, node_height)
    }
}
