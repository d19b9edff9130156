//! What the engine needs from whoever draws it.

use std::fmt;

/// A render target the presentation layer must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mount {
    ButtonContainer,
    PointsDisplay,
    UpgradesList,
}

impl Mount {
    pub fn all() -> &'static [Mount] {
        &[Mount::ButtonContainer, Mount::PointsDisplay, Mount::UpgradesList]
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mount::ButtonContainer => "button container",
            Mount::PointsDisplay => "points display",
            Mount::UpgradesList => "upgrades list",
        };
        f.write_str(name)
    }
}

/// Size of the playable area in surface units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub trait Surface {
    fn has_mount(&self, mount: Mount) -> bool;
    fn viewport(&self) -> Viewport;
}

/// A surface with fixed mounts, for tests and headless use.
#[cfg(test)]
pub struct StaticSurface {
    pub mounts: Vec<Mount>,
    pub viewport: Viewport,
}

#[cfg(test)]
impl StaticSurface {
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            mounts: Mount::all().to_vec(),
            viewport: Viewport::new(width, height),
        }
    }
}

#[cfg(test)]
impl Surface for StaticSurface {
    fn has_mount(&self, mount: Mount) -> bool {
        self.mounts.contains(&mount)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
