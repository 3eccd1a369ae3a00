//! Simulated device frames and zoom for preview surfaces.

use serde::{Deserialize, Serialize};

/// Device frame a preview is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewDevice {
    /// Fills the available area.
    #[default]
    Window,
    #[serde(rename = "tab")]
    Tablet,
    Phone,
}

impl PreviewDevice {
    /// Frame size in CSS pixels, or `None` when the frame fills its container.
    pub fn viewport(&self) -> Option<(u32, u32)> {
        match self {
            PreviewDevice::Window => None,
            PreviewDevice::Tablet => Some((768, 1024)),
            PreviewDevice::Phone => Some((375, 667)),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "window" | "desktop" => Some(PreviewDevice::Window),
            "tab" | "tablet" => Some(PreviewDevice::Tablet),
            "phone" | "mobile" => Some(PreviewDevice::Phone),
            _ => None,
        }
    }
}

/// Preview zoom factor, always within [`Zoom::MIN`, `Zoom::MAX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f64);

impl Default for Zoom {
    fn default() -> Self {
        Zoom(1.0)
    }
}

impl Zoom {
    pub const MIN: f64 = 0.25;
    pub const MAX: f64 = 2.0;
    pub const STEP: f64 = 0.1;

    pub fn new(factor: f64) -> Self {
        Zoom(factor.clamp(Self::MIN, Self::MAX))
    }

    pub fn zoom_in(self) -> Self {
        Self::new(self.0 + Self::STEP)
    }

    pub fn zoom_out(self) -> Self {
        Self::new(self.0 - Self::STEP)
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Rounded percentage for display, e.g. `110`.
    pub fn percent(&self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}
