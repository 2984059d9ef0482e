use crate::config::AtlasConfig;
use crate::error::{GlyphAtlasError, Result};
use crate::model::SkylineSegment;

/// Ordered profile of the packed content's boundary across the surface width.
///
/// When built from a config the segments are sorted by `x`, cover
/// `[margin, size - margin)` without gaps or overlaps, and no two neighbours
/// share a height. [`Skyline::insert_top`] is the only mutator and keeps
/// those properties. A skyline restored with [`Skyline::from_segments`] is taken
/// verbatim; use [`Skyline::check_invariants`] to verify it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Skyline {
    segments: Vec<SkylineSegment>,
}

impl Skyline {
    /// A single free segment spanning the margin-inset width, or an empty
    /// skyline when the margins leave no room.
    pub fn new(config: &AtlasConfig) -> Self {
        let mut skyline = Self::default();
        skyline.reset(config);
        skyline
    }

    pub fn from_segments(segments: Vec<SkylineSegment>) -> Self {
        Self { segments }
    }

    pub fn reset(&mut self, config: &AtlasConfig) {
        self.segments.clear();
        if config.has_usable_space() {
            self.segments.push(SkylineSegment::new(
                config.margin,
                0,
                config.usable_extent(),
            ));
        }
    }

    pub fn segments(&self) -> &[SkylineSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<SkylineSegment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Deepest point of the profile (largest top-down `y`).
    pub fn max_height(&self) -> Option<i32> {
        self.segments.iter().map(|s| s.y).max()
    }

    /// Shallowest point of the profile (smallest top-down `y`).
    pub fn min_height(&self) -> Option<i32> {
        self.segments.iter().map(|s| s.y).min()
    }

    /// Area between the top of the surface and the profile.
    pub fn area_above(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| (s.width.max(0) as u64) * (s.y.max(0) as u64))
            .fold(0u64, u64::saturating_add)
    }

    /// Raise the profile over `[x, x + width)` to the new top `y`.
    ///
    /// Segments fully under the span are dropped, partially covered ones are
    /// trimmed to their uncovered remainder, and a segment that contains the
    /// whole span is split into left and right remainders. The new segment is
    /// spliced in at its sorted position and equal-height neighbours are merged.
    ///
    /// Every segment overlapping the span must sit above `y` (smaller top-down
    /// value); placements produced by the packer always satisfy this.
    pub fn insert_top(&mut self, x: i32, y: i32, width: i32) {
        if width <= 0 {
            return;
        }
        let right = x.saturating_add(width);
        let start = self
            .segments
            .iter()
            .position(|s| s.right() > x)
            .unwrap_or(self.segments.len());
        let end = start
            + self.segments[start..]
                .iter()
                .take_while(|s| s.x < right)
                .count();

        let top = SkylineSegment::new(x, y, width);
        let mut replacement = Vec::with_capacity(3);
        if start < end {
            let first = self.segments[start];
            let last = self.segments[end - 1];
            if first.x < x {
                let left = x.saturating_sub(first.x);
                replacement.push(SkylineSegment::new(first.x, first.y, left));
            }
            replacement.push(top);
            if last.right() > right {
                replacement.push(SkylineSegment::new(
                    right,
                    last.y,
                    last.right().saturating_sub(right),
                ));
            }
        } else {
            replacement.push(top);
        }
        self.segments.splice(start..end, replacement);
        self.merge_adjacent();
    }

    /// Combine touching neighbours of equal height. Returns how many segments
    /// were folded away; a second call in a row always returns 0.
    pub fn merge_adjacent(&mut self) -> usize {
        let before = self.segments.len();
        self.segments.dedup_by(|next, prev| {
            if prev.y == next.y && prev.right() == next.x {
                prev.width = prev.width.saturating_add(next.width);
                true
            } else {
                false
            }
        });
        before - self.segments.len()
    }

    /// Verify the profile covers `[left, right)` in order, contiguously, with
    /// positive widths and no equal-height neighbours.
    pub fn check_invariants(&self, left: i32, right: i32) -> Result<()> {
        let Some(first) = self.segments.first() else {
            if left < right {
                return Err(GlyphAtlasError::InvalidSkyline(format!(
                    "no segments cover [{left}, {right})"
                )));
            }
            return Ok(());
        };
        if first.x != left {
            return Err(GlyphAtlasError::InvalidSkyline(format!(
                "first segment starts at {} instead of {left}",
                first.x
            )));
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.width <= 0 {
                return Err(GlyphAtlasError::InvalidSkyline(format!(
                    "segment {i} has non-positive width {}",
                    seg.width
                )));
            }
            if i == 0 {
                continue;
            }
            let prev = &self.segments[i - 1];
            if prev.right() != seg.x {
                return Err(GlyphAtlasError::InvalidSkyline(format!(
                    "segment {i} starts at {} but previous ends at {}",
                    seg.x,
                    prev.right()
                )));
            }
            if prev.y == seg.y {
                return Err(GlyphAtlasError::InvalidSkyline(format!(
                    "segments {} and {i} share height {}",
                    i - 1,
                    seg.y
                )));
            }
        }
        let end = self.segments[self.segments.len() - 1].right();
        if end != right {
            return Err(GlyphAtlasError::InvalidSkyline(format!(
                "last segment ends at {end} instead of {right}"
            )));
        }
        Ok(())
    }
}
