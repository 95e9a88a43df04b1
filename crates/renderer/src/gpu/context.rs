use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use winit::window::Window;

use crate::error::RenderError;
use crate::loader::Viewport;
use crate::types::GpuPowerPreference;

/// Instance, device and surface for one window.
///
/// The surface stays unconfigured until the first image arrives, because the
/// drawing surface takes its size from the image rather than the other way
/// round.
pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    alpha_mode: wgpu::CompositeAlphaMode,
    present_mode: wgpu::PresentMode,
    max_dimension: u32,
    config: Option<wgpu::SurfaceConfiguration>,
}

impl GpuContext {
    pub(crate) fn new(window: Arc<Window>, gpu_power: GpuPowerPreference) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: gpu_power.to_wgpu(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            max_dimension = limits.max_texture_dimension_2d,
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("cellmosaic device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = caps.formats.first() else {
            anyhow::bail!("surface reports no supported formats");
        };
        // Image bytes go to the surface unconverted, so prefer a non-sRGB target.
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no linear (non-sRGB) surface format available; colours will be re-encoded"
                );
                first_format
            });

        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            caps.present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        };
        tracing::debug!(?surface_format, ?alpha_mode, ?present_mode, "surface capabilities");

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            surface_format,
            alpha_mode,
            present_mode,
            max_dimension: limits.max_texture_dimension_2d,
            config: None,
        })
    }

    /// Sizes the surface to exactly `viewport`.
    pub(crate) fn configure(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        check_dimensions(viewport, self.max_dimension)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            width: viewport.width,
            height: viewport.height,
            present_mode: self.present_mode,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        self.surface.configure(&self.device, &config);
        self.config = Some(config);
        tracing::debug!(width = viewport.width, height = viewport.height, "configured surface");
        Ok(())
    }

    /// Reapplies the last configuration after the surface was lost or went
    /// out of date. Does nothing before the first image.
    pub(crate) fn reconfigure(&self) {
        if let Some(config) = &self.config {
            self.surface.configure(&self.device, config);
        }
    }

    pub(crate) fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.config.is_some()
    }
}

pub(crate) fn check_dimensions(viewport: Viewport, limit: u32) -> Result<(), RenderError> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(RenderError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    if viewport.width > limit || viewport.height > limit {
        return Err(RenderError::ImageTooLarge {
            width: viewport.width,
            height: viewport.height,
            limit,
        });
    }
    Ok(())
}
