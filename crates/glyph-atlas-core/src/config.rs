use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sorting orders callers apply to a glyph batch before packing.
///
/// The packer processes items strictly in the order given; `HeightDesc` is the
/// expected convention since a batch stops at its first unplaceable item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    HeightDesc,
    AreaDesc,
    MaxSideDesc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height_desc" => Ok(Self::HeightDesc),
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Atlas surface configuration. Immutable once a packer is built from it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Side length of the square surface in pixels.
    #[serde(default = "default_size")]
    pub size: i32,
    /// Pixels added around each glyph's rendered box before packing.
    /// Carried for the rasterizer; the packer only enforces `margin`.
    #[serde(default = "default_padding")]
    pub padding: i32,
    /// Minimum empty gap around every placed rectangle and along the surface edge.
    #[serde(default = "default_margin")]
    pub margin: i32,
    /// Nominal glyph rendering size in pixels per em.
    #[serde(default = "default_glyph_size")]
    pub glyph_size: i32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            padding: default_padding(),
            margin: default_margin(),
            glyph_size: default_glyph_size(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// This is opt-in: packers accept any configuration, and one that leaves no
    /// usable space simply never places anything. Returns an error if:
    /// - `size` is not positive
    /// - `margin`, `padding` or `glyph_size` is negative
    /// - the margins leave no usable space (`size <= 2 * margin`)
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::GlyphAtlasError;

        if self.size <= 0 {
            return Err(GlyphAtlasError::InvalidConfig(format!(
                "size must be positive, got {}",
                self.size
            )));
        }
        if self.margin < 0 || self.padding < 0 || self.glyph_size < 0 {
            return Err(GlyphAtlasError::InvalidConfig(format!(
                "margin ({}), padding ({}) and glyph_size ({}) must not be negative",
                self.margin, self.padding, self.glyph_size
            )));
        }
        if !self.has_usable_space() {
            return Err(GlyphAtlasError::InvalidConfig(format!(
                "margin ({}) * 2 leaves no usable space in a {}px surface",
                self.margin, self.size
            )));
        }
        Ok(())
    }

    /// True when the margins leave at least one usable column.
    pub fn has_usable_space(&self) -> bool {
        i64::from(self.size) > 2 * i64::from(self.margin)
    }

    /// Width (and height) of the usable area inside the margins.
    pub fn usable_extent(&self) -> i32 {
        self.size.saturating_sub(self.margin.saturating_mul(2)).max(0)
    }

    /// Exclusive right/bottom bound of the usable area (`size - margin`).
    pub fn usable_limit(&self) -> i32 {
        self.size.saturating_sub(self.margin)
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_size() -> i32 {
    1024
}
fn default_padding() -> i32 {
    4
}
fn default_margin() -> i32 {
    1
}
fn default_glyph_size() -> i32 {
    32
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn size(mut self, v: i32) -> Self {
        self.cfg.size = v;
        self
    }
    pub fn padding(mut self, v: i32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn margin(mut self, v: i32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn glyph_size(mut self, v: i32) -> Self {
        self.cfg.glyph_size = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_snake_case() {
        assert_eq!("height_desc".parse(), Ok(SortOrder::HeightDesc));
        assert_eq!("AREA_DESC".parse(), Ok(SortOrder::AreaDesc));
        assert_eq!("none".parse(), Ok(SortOrder::None));
        assert!("tallest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn usable_extent_clamps_at_zero() {
        let cfg = AtlasConfig::builder().size(4).margin(3).build();
        assert!(!cfg.has_usable_space());
        assert_eq!(cfg.usable_extent(), 0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn yaml_style_partial_json_uses_defaults() {
        let cfg: AtlasConfig = serde_json::from_str(r#"{"size": 256}"#).unwrap();
        assert_eq!(cfg.size, 256);
        assert_eq!(cfg.margin, 1);
        assert_eq!(cfg.glyph_size, 32);
    }
}
