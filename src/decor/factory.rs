//! Concrete provider factories: rounded corners, privacy dots, cutout
//! fill and face scanning.
//!
//! Each factory is built from the inputs of one composition pass and
//! answers `has_providers` / `providers` without side effects.

use super::config::DecorConfig;
use super::edge::{CutoutBounds, Edge};
use super::provider::{Corner, DecorProvider, DecorProviderFactory, ProviderContent, ViewId};
use super::rounded::RoundedCornerResources;

/// Rounded-corner masks for every rounded corner.
#[derive(Debug, Clone)]
pub struct RoundedCornerFactory {
    resources: RoundedCornerResources,
}

impl RoundedCornerFactory {
    pub fn new(resources: RoundedCornerResources) -> Self {
        Self { resources }
    }
}

impl DecorProviderFactory for RoundedCornerFactory {
    fn has_providers(&self) -> bool {
        self.resources.has_any()
    }

    fn providers(&self) -> Vec<DecorProvider> {
        let res = &self.resources;
        Corner::ALL
            .into_iter()
            .filter(|c| if c.is_top() { res.has_top } else { res.has_bottom })
            .map(|corner| {
                let size = if corner.is_top() {
                    res.top_size
                } else {
                    res.bottom_size
                };
                DecorProvider::corner(
                    ViewId::RoundedCorner { corner },
                    corner,
                    ProviderContent::RoundedCorner {
                        size,
                        padding: res.padding,
                    },
                )
            })
            .collect()
    }
}

/// Privacy indicator dots, one per corner.
#[derive(Debug, Clone)]
pub struct PrivacyDotFactory {
    enabled: bool,
}

impl PrivacyDotFactory {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl DecorProviderFactory for PrivacyDotFactory {
    fn has_providers(&self) -> bool {
        self.enabled
    }

    fn providers(&self) -> Vec<DecorProvider> {
        if !self.enabled {
            return Vec::new();
        }
        Corner::ALL
            .into_iter()
            .map(|corner| {
                DecorProvider::corner(
                    ViewId::PrivacyDot { corner },
                    corner,
                    ProviderContent::PrivacyDot,
                )
            })
            .collect()
    }
}

/// Cutout fill, one provider per logical edge carrying a cutout bound.
/// Nothing is produced unless filling is enabled.
#[derive(Debug, Clone)]
pub struct CutoutFactory {
    fill: bool,
    cutout: CutoutBounds,
}

impl CutoutFactory {
    /// `cutout` must already be in the logical frame.
    pub fn new(fill: bool, cutout: CutoutBounds) -> Self {
        Self { fill, cutout }
    }
}

impl DecorProviderFactory for CutoutFactory {
    fn has_providers(&self) -> bool {
        self.fill && !self.cutout.is_empty()
    }

    fn providers(&self) -> Vec<DecorProvider> {
        if !self.fill {
            return Vec::new();
        }
        Edge::ALL
            .into_iter()
            .filter_map(|edge| {
                let bounds = self.cutout.get(edge)?;
                Some(DecorProvider::edge(
                    ViewId::CutoutFill { edge },
                    edge,
                    ProviderContent::CutoutFill { bounds },
                ))
            })
            .collect()
    }
}

/// Face-scanning animation around the camera cutout.
#[derive(Debug, Clone)]
pub struct FaceScanningFactory {
    enabled: bool,
    cutout: CutoutBounds,
}

impl FaceScanningFactory {
    /// `cutout` must already be in the logical frame.
    pub fn new(enabled: bool, cutout: CutoutBounds) -> Self {
        Self { enabled, cutout }
    }
}

impl DecorProviderFactory for FaceScanningFactory {
    fn has_providers(&self) -> bool {
        self.enabled && !self.cutout.is_empty()
    }

    fn providers(&self) -> Vec<DecorProvider> {
        if !self.enabled {
            return Vec::new();
        }
        Edge::ALL
            .into_iter()
            .filter_map(|edge| {
                let bounds = self.cutout.get(edge)?;
                Some(DecorProvider::edge(
                    ViewId::FaceScanning { edge },
                    edge,
                    ProviderContent::FaceScanning { bounds },
                ))
            })
            .collect()
    }
}

/// Build the standard factory set for one pass.
///
/// `cutout` is the logical-frame cutout; `size_override` is the current
/// rounded-size tuning value.
pub fn standard_factories(
    config: &DecorConfig,
    cutout: CutoutBounds,
    size_override: Option<u32>,
) -> Vec<Box<dyn DecorProviderFactory>> {
    vec![
        Box::new(PrivacyDotFactory::new(config.privacy_dot)),
        Box::new(FaceScanningFactory::new(config.face_scanning, cutout)),
        Box::new(RoundedCornerFactory::new(RoundedCornerResources::resolve(
            config,
            size_override,
        ))),
        Box::new(CutoutFactory::new(config.fill_cutout, cutout)),
    ]
}
