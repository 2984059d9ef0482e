use glyph_atlas_core::prelude::*;

fn atlas(size: i32, margin: i32) -> AtlasPacker {
    AtlasPacker::new(AtlasConfig::builder().size(size).margin(margin).build())
}

#[test]
fn three_glyphs_share_a_small_surface() {
    let mut atlas = atlas(128, 1);
    let mut glyphs = vec![
        GlyphRequest::new(1, 50, 30),
        GlyphRequest::new(2, 40, 30),
        GlyphRequest::new(3, 50, 50),
    ];
    sort_glyphs(&mut glyphs, SortOrder::HeightDesc);
    assert_eq!(atlas.pack_glyphs(&mut glyphs), 3);

    let by_index = |i: i32| *glyphs.iter().find(|g| g.index == i).unwrap();
    let (a, b, c) = (by_index(1), by_index(2), by_index(3));
    // The tall glyph goes first, top-left; the two short ones sit side by side.
    assert_eq!((c.x, c.y), (1, 77));
    assert_eq!((a.x, a.y), (52, 97));
    assert_eq!((b.x, b.y), (52, 66));
    for g in [a, b, c] {
        assert!(g.x >= 1 && g.y >= 1 && g.x + g.width <= 127 && g.y + g.height <= 127);
    }
}

#[test]
fn glyph_wider_than_surface_is_unplaced() {
    let mut atlas = atlas(64, 2);
    let mut glyphs = vec![GlyphRequest::new(0, 70, 10)];
    assert_eq!(atlas.pack_glyphs(&mut glyphs), 0);
    assert_eq!((glyphs[0].x, glyphs[0].y), (UNPLACED, UNPLACED));
}

#[test]
fn full_width_glyph_fits_exactly_once() {
    let mut atlas = atlas(64, 2);
    assert!(atlas.place(60, 60).is_some());
    assert!(atlas.place(1, 1).is_none());

    atlas.reset();
    let mut glyphs = vec![GlyphRequest::new(0, 60, 60), GlyphRequest::new(1, 1, 1)];
    assert_eq!(atlas.pack_glyphs(&mut glyphs), 1);
    assert_eq!((glyphs[0].x, glyphs[0].y), (2, 2));
    assert!(!glyphs[1].is_placed());
}

#[test]
fn batch_stops_at_first_unplaceable_glyph() {
    let mut atlas = atlas(64, 1);
    let mut glyphs = vec![
        GlyphRequest::new(0, 30, 30),
        GlyphRequest::new(1, 80, 5),
        GlyphRequest::new(2, 5, 5),
    ];
    assert_eq!(atlas.pack_glyphs(&mut glyphs), 1);
    assert!(glyphs[0].is_placed());
    assert!(!glyphs[1].is_placed());
    // Would fit, but the batch already stopped.
    assert!(!glyphs[2].is_placed());
    assert!(atlas.can_place(5, 5));
}

#[test]
fn stopped_batch_leaves_skyline_untouched_after_failure() {
    let mut atlas = atlas(64, 1);
    let mut glyphs = vec![GlyphRequest::new(0, 20, 20), GlyphRequest::new(1, 100, 100)];
    atlas.pack_glyphs(&mut glyphs);
    let before = atlas.segments().to_vec();
    let mut more = vec![GlyphRequest::new(2, 100, 1)];
    assert_eq!(atlas.pack_glyphs(&mut more), 0);
    assert_eq!(atlas.segments(), before.as_slice());
}

#[test]
fn empty_batch_places_nothing() {
    let mut atlas = atlas(64, 1);
    let mut glyphs: Vec<GlyphRequest> = Vec::new();
    assert_eq!(atlas.pack_glyphs(&mut glyphs), 0);
    assert_eq!(atlas.segments().len(), 1);
}

#[test]
fn font_unit_metrics_pack_in_place() {
    let cfg = AtlasConfig::builder()
        .size(256)
        .margin(1)
        .padding(2)
        .glyph_size(32)
        .build();
    let mut atlas = AtlasPacker::new(cfg);
    let outlines = [(10, 1200, 1400), (11, 600, 1000), (12, 0, 0)];
    let mut glyphs: Vec<GlyphMetrics> = outlines
        .iter()
        .map(|&(index, w, h)| {
            let fu = FontUnitMetrics {
                width: w,
                height: h,
                bearing_x: 40,
                bearing_y: h,
            };
            GlyphMetrics::from_font_units(index, fu, 2048, cfg.glyph_size, cfg.padding)
        })
        .collect();

    assert_eq!(atlas.pack_glyphs(&mut glyphs), 3);
    for g in &glyphs {
        let uv = g.uv_rect(cfg.size).unwrap();
        assert!(uv.iter().all(|v| (0.0..=1.0).contains(v)));
    }
    // 1200 * 32 / 2048 = 18, plus 2px padding each side.
    assert_eq!(glyphs[0].atlas_width, 22);
}

#[test]
fn is_full_heuristic_flips_as_skyline_deepens() {
    let mut atlas = atlas(128, 1);
    assert!(!atlas.is_full(100));
    let mut column: Vec<GlyphRequest> = (0..3).map(|i| GlyphRequest::new(i, 126, 30)).collect();
    assert_eq!(atlas.pack_glyphs(&mut column), 3);
    // Skyline now sits at 93; 127 - 93 = 34 rows left.
    assert!(!atlas.is_full(34));
    assert!(atlas.is_full(35));
}
