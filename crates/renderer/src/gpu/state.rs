use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::error::RenderError;
use crate::loader::{SourceImage, Viewport};
use crate::types::GpuPowerPreference;

use super::context::{check_dimensions, GpuContext};
use super::pass::EffectPass;

/// Window-facing GPU state: the device wiring plus the pass for the image
/// currently on screen, if any.
pub(crate) struct GpuState {
    context: GpuContext,
    pass: Option<EffectPass>,
}

impl GpuState {
    pub(crate) fn new(window: Arc<Window>, gpu_power: GpuPowerPreference) -> Result<Self> {
        Ok(Self {
            context: GpuContext::new(window, gpu_power)?,
            pass: None,
        })
    }

    /// Replaces whatever is on screen with a fresh render of `image`.
    ///
    /// An image the surface cannot hold is rejected while the current pass is
    /// still on screen. Otherwise the previous pass is released before
    /// anything new is created, and a later failure leaves no pass behind.
    pub(crate) fn render_image(&mut self, image: &SourceImage) -> Result<Viewport, RenderError> {
        let viewport = image.viewport();
        release_for(&mut self.pass, viewport, self.context.max_dimension())?;
        self.context.configure(viewport)?;
        let pass = EffectPass::build(
            &self.context.device,
            &self.context.queue,
            self.context.surface_format,
            image,
        )?;
        self.pass = Some(pass);
        self.present()?;
        tracing::info!(
            path = %image.path().display(),
            width = viewport.width,
            height = viewport.height,
            "rendered image"
        );
        Ok(viewport)
    }

    /// Draws the current pass again. Used for expose events; never rebuilds.
    pub(crate) fn present(&mut self) -> Result<(), RenderError> {
        let Some(pass) = self.pass.as_ref() else {
            return Ok(());
        };
        if !self.context.is_configured() {
            return Ok(());
        }

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                self.context.surface.get_current_texture()?
            }
            Err(err) => return Err(err.into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("cell mosaic encoder"),
                });
        pass.encode(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub(crate) fn viewport(&self) -> Option<Viewport> {
        self.pass.as_ref().map(EffectPass::viewport)
    }
}

/// Drops `current` once `viewport` is known to fit, keeping it otherwise.
pub(crate) fn release_for(
    current: &mut Option<EffectPass>,
    viewport: Viewport,
    limit: u32,
) -> Result<(), RenderError> {
    check_dimensions(viewport, limit)?;
    if current.take().is_some() {
        tracing::debug!("released previous effect pass");
    }
    Ok(())
}
