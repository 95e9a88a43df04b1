use std::fmt;
use std::path::PathBuf;

use wgpu::naga::ShaderStage;

/// Which programmable stage a shader source targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub(crate) fn stage(self) -> ShaderStage {
        match self {
            ShaderKind::Vertex => ShaderStage::Vertex,
            ShaderKind::Fragment => ShaderStage::Fragment,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "cell mosaic vertex",
            ShaderKind::Fragment => "cell mosaic fragment",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Adapter selection hint forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer an integrated or otherwise power-saving adapter.
    #[default]
    Low,
    /// Prefer a discrete adapter.
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl fmt::Display for GpuPowerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuPowerPreference::Low => f.write_str("low"),
            GpuPowerPreference::High => f.write_str("high"),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// The drawing surface has no size of its own until an image is loaded; the
/// placeholder size only shapes the empty window shown before the first
/// selection.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Image to load as soon as the window is up.
    pub initial_image: Option<PathBuf>,
    /// Base window title; the session state is appended to it.
    pub title: String,
    /// Window size in physical pixels before any image is loaded.
    pub placeholder_size: (u32, u32),
    /// Adapter power preference.
    pub gpu_power: GpuPowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            initial_image: None,
            title: "cellmosaic".to_string(),
            placeholder_size: (640, 480),
            gpu_power: GpuPowerPreference::default(),
        }
    }
}
