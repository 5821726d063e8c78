//! Rounded-corner resources: which corners are rounded and how large
//! their masks are.
//!
//! Derived from [`DecorConfig`] plus an optional tuning override. All
//! inconsistencies degrade to a usable size rather than failing.

use super::config::DecorConfig;
use super::edge::Size;

/// Tuning key that overrides the rounded corner size.
pub const ROUNDED_SIZE_KEY: &str = "sysui_rounded_size";

/// Resolved rounded-corner geometry for one composition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundedCornerResources {
    pub has_top: bool,
    pub has_bottom: bool,
    pub top_size: Size,
    pub bottom_size: Size,
    pub padding: u32,
}

impl RoundedCornerResources {
    /// Resolve from configuration and the current tuning override.
    ///
    /// Top and bottom radii fall back to the uniform radius when unset.
    /// The mask size is the configured artwork size; a radius without
    /// artwork falls back to a square of the radius. A tuning override
    /// replaces both sizes with a square of the override.
    pub fn resolve(config: &DecorConfig, size_override: Option<u32>) -> Self {
        let top_radius = if config.radius_top > 0 {
            config.radius_top
        } else {
            config.radius
        };
        let bottom_radius = if config.radius_bottom > 0 {
            config.radius_bottom
        } else {
            config.radius
        };

        let has_top = top_radius > 0;
        let has_bottom = bottom_radius > 0;

        let size_for = |radius: u32, artwork: Option<Size>| -> Size {
            if radius == 0 {
                return Size::default();
            }
            match (size_override, artwork) {
                (Some(side), _) if side > 0 => Size::square(side),
                (_, Some(size)) if !size.is_empty() => size,
                _ => {
                    tracing::debug!(radius, "no corner artwork size, using radius");
                    Size::square(radius)
                }
            }
        };

        Self {
            has_top,
            has_bottom,
            top_size: size_for(top_radius, config.top_corner_size),
            bottom_size: size_for(bottom_radius, config.bottom_corner_size),
            padding: config.padding,
        }
    }

    pub fn has_any(&self) -> bool {
        self.has_top || self.has_bottom
    }
}

/// Parse a rounded-size tuning value. Absent, non-numeric and zero
/// values clear the override.
pub fn parse_size_override(value: Option<&str>) -> Option<u32> {
    let raw = value?.trim();
    match raw.parse::<u32>() {
        Ok(0) => None,
        Ok(side) => Some(side),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "ignoring invalid rounded size tuning");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(radius: u32, top: u32, bottom: u32) -> DecorConfig {
        DecorConfig {
            radius,
            radius_top: top,
            radius_bottom: bottom,
            ..DecorConfig::default()
        }
    }

    #[test]
    fn no_radius_means_no_corners() {
        let res = RoundedCornerResources::resolve(&config(0, 0, 0), None);
        assert!(!res.has_any());
        assert_eq!(res.top_size, Size::default());
    }

    #[test]
    fn uniform_radius_rounds_both() {
        let res = RoundedCornerResources::resolve(&config(20, 0, 0), None);
        assert!(res.has_top);
        assert!(res.has_bottom);
        assert_eq!(res.top_size, Size::square(20));
    }

    #[test]
    fn top_only_radius() {
        let res = RoundedCornerResources::resolve(&config(0, 10, 0), None);
        assert!(res.has_top);
        assert!(!res.has_bottom);
    }

    #[test]
    fn bottom_only_radius() {
        let res = RoundedCornerResources::resolve(&config(0, 0, 20), None);
        assert!(!res.has_top);
        assert!(res.has_bottom);
        assert_eq!(res.bottom_size, Size::square(20));
    }

    #[test]
    fn artwork_size_wins_over_radius() {
        let mut cfg = config(1, 1, 1);
        cfg.top_corner_size = Some(Size::square(4));
        cfg.bottom_corner_size = Some(Size::square(3));
        let res = RoundedCornerResources::resolve(&cfg, None);
        assert_eq!(res.top_size, Size::square(4));
        assert_eq!(res.bottom_size, Size::square(3));
    }

    #[test]
    fn tuning_override_replaces_sizes() {
        let mut cfg = config(20, 0, 0);
        cfg.top_corner_size = Some(Size::square(3));
        let res = RoundedCornerResources::resolve(&cfg, Some(7));
        assert_eq!(res.top_size, Size::square(7));
        assert_eq!(res.bottom_size, Size::square(7));
    }

    #[test]
    fn tuning_override_does_not_create_corners() {
        let res = RoundedCornerResources::resolve(&config(0, 0, 0), Some(7));
        assert!(!res.has_any());
    }

    #[test]
    fn parse_override_values() {
        assert_eq!(parse_size_override(Some("12")), Some(12));
        assert_eq!(parse_size_override(Some(" 5 ")), Some(5));
        assert_eq!(parse_size_override(Some("0")), None);
        assert_eq!(parse_size_override(Some("big")), None);
        assert_eq!(parse_size_override(None), None);
    }
}
