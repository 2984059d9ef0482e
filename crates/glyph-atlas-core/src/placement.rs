//! Bottom-left placement against a [`Skyline`].
//!
//! Nodes are glyph boxes inflated by the configured margin. The margin leads
//! the content vertically (the profile starts at `y = 0` and each node's first
//! `margin` rows are the gap above its glyph) and trails it horizontally (the
//! profile starts at `x = margin`). A node touching the right edge may let its
//! trailing margin overlap the surface border, so the committed span is
//! clamped to `size - margin`.

use crate::config::AtlasConfig;
use crate::model::{Placement, SkylineSegment};
use crate::skyline::Skyline;

/// Find the lowest, then leftmost, position for a `node_width x node_height`
/// node. Pure query; the skyline is not modified.
pub fn find_position(
    skyline: &Skyline,
    config: &AtlasConfig,
    node_width: i32,
    node_height: i32,
) -> Option<Placement> {
    if node_width <= 0 || node_height <= 0 {
        return None;
    }
    let limit = config.usable_limit();
    let segments = skyline.segments();
    let mut best: Option<Placement> = None;

    // i64: a loaded skyline may carry arbitrary coordinates.
    let (limit_w, margin_w) = (i64::from(limit), i64::from(config.margin));
    for i in 0..segments.len() {
        let x = segments[i].x;
        if i64::from(x) + i64::from(node_width) - margin_w > limit_w {
            continue;
        }
        let span = i64::from(node_width).min(limit_w - i64::from(x));
        let Some(y) = span_height(&segments[i..], span) else {
            continue;
        };
        if i64::from(y) + i64::from(node_height) > limit_w {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => y < b.y || (y == b.y && x < b.x),
        };
        if better {
            best = Some(Placement {
                x,
                y,
                width: node_width,
                height: node_height,
            });
        }
    }
    best
}

/// Commit a placement found by [`find_position`]: raise the skyline under the
/// node's span (clamped to the usable area) to the node's bottom edge.
pub fn commit(skyline: &mut Skyline, config: &AtlasConfig, placement: &Placement) {
    let span = placement
        .width
        .min(config.usable_limit().saturating_sub(placement.x));
    skyline.insert_top(placement.x, placement.bottom(), span);
}

/// Tallest obstruction under a window of `span` pixels starting at `run[0].x`,
/// or `None` when the run has a break or ends before the window is covered.
fn span_height(run: &[SkylineSegment], span: i64) -> Option<i32> {
    let first = run.first()?;
    let end = i64::from(first.x) + span;
    let mut covered = i64::from(first.x);
    let mut top = first.y;
    for seg in run {
        if i64::from(seg.x) != covered {
            return None;
        }
        top = top.max(seg.y);
        covered = i64::from(seg.x) + i64::from(seg.width);
        if covered >= end {
            return Some(top);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: i32, margin: i32) -> AtlasConfig {
        AtlasConfig::builder().size(size).margin(margin).build()
    }

    fn seg(x: i32, y: i32, width: i32) -> SkylineSegment {
        SkylineSegment::new(x, y, width)
    }

    #[test]
    fn first_node_goes_top_left() {
        let c = cfg(64, 2);
        let sky = Skyline::new(&c);
        let p = find_position(&sky, &c, 12, 7).unwrap();
        assert_eq!((p.x, p.y), (2, 0));
    }

    #[test]
    fn prefers_shallowest_then_leftmost() {
        let c = cfg(100, 0);
        let sky = Skyline::from_segments(vec![
            seg(0, 30, 20),
            seg(20, 10, 20),
            seg(40, 20, 20),
            seg(60, 10, 40),
        ]);
        let p = find_position(&sky, &c, 15, 5).unwrap();
        assert_eq!((p.x, p.y), (20, 10));
    }

    #[test]
    fn window_takes_tallest_obstruction() {
        let c = cfg(100, 0);
        let sky = Skyline::from_segments(vec![seg(0, 5, 10), seg(10, 25, 10), seg(20, 40, 80)]);
        // 15 wide starting at 0 spans both the 5 and the 25 segment.
        let p = find_position(&sky, &c, 15, 5).unwrap();
        assert_eq!((p.x, p.y), (0, 25));
    }

    #[test]
    fn rejects_windows_across_gaps() {
        let c = cfg(100, 0);
        let sky = Skyline::from_segments(vec![seg(0, 0, 10), seg(12, 50, 88)]);
        let p = find_position(&sky, &c, 11, 5).unwrap();
        assert_eq!((p.x, p.y), (12, 50));
    }

    #[test]
    fn rejects_nodes_past_the_bottom() {
        let c = cfg(32, 1);
        let sky = Skyline::from_segments(vec![seg(1, 20, 30)]);
        assert!(find_position(&sky, &c, 5, 11).is_some());
        assert!(find_position(&sky, &c, 5, 12).is_none());
    }

    #[test]
    fn trailing_margin_may_touch_border() {
        let c = cfg(32, 2);
        let sky = Skyline::new(&c);
        // content 28 = 32 - 2*2; node is 30 wide and ends exactly at the surface edge.
        assert!(find_position(&sky, &c, 30, 3).is_some());
        assert!(find_position(&sky, &c, 31, 3).is_none());
    }

    #[test]
    fn commit_clamps_span_to_usable_width() {
        let c = cfg(32, 2);
        let mut sky = Skyline::new(&c);
        let p = find_position(&sky, &c, 30, 5).unwrap();
        commit(&mut sky, &c, &p);
        assert_eq!(sky.segments(), &[seg(2, 5, 28)]);
        assert!(sky.check_invariants(2, 30).is_ok());
    }

    #[test]
    fn empty_skyline_finds_nothing() {
        let c = cfg(4, 2);
        let sky = Skyline::new(&c);
        assert!(find_position(&sky, &c, 3, 3).is_none());
    }
}
