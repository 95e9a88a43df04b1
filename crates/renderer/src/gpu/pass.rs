use crate::compile::{self, ShaderSource};
use crate::error::RenderError;
use crate::loader::{SourceImage, Viewport};
use crate::program;
use crate::types::ShaderKind;

use super::geometry::{QuadGeometry, QUAD_VERTEX_COUNT};
use super::pipeline::ShaderProgram;
use super::texture::ImageTexture;

/// Every GPU object needed to draw one image.
///
/// A pass is built from scratch per image and never reused; dropping it
/// releases the program, buffers and texture together.
pub(crate) struct EffectPass {
    program: ShaderProgram,
    geometry: QuadGeometry,
    _texture: ImageTexture,
    bind_group: wgpu::BindGroup,
    viewport: Viewport,
}

impl EffectPass {
    /// Compiles, links, binds and uploads in order, stopping at the first
    /// failure.
    pub(crate) fn build(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        image: &SourceImage,
    ) -> Result<Self, RenderError> {
        let source = ShaderSource::CELL_MOSAIC;
        let vertex = compile::compile(device, ShaderKind::Vertex, source.vertex)?;
        let fragment = compile::compile(device, ShaderKind::Fragment, source.fragment)?;

        let interface = program::link_interface(&vertex.parsed, &fragment.parsed)?;
        let locations = interface.locations();
        tracing::debug!(
            position = locations.position,
            tex_coord = locations.tex_coord,
            image_sampler = locations.image_sampler,
            image_texture = locations.image_texture,
            "resolved program locations"
        );
        let locations = locations.require()?;

        let program = ShaderProgram::new(device, vertex, fragment, &locations, target_format)?;
        let geometry = QuadGeometry::upload(device);
        let texture = ImageTexture::upload(device, queue, image);
        let bind_group = program.bind_image(device, &locations, &texture.view, &texture.sampler);

        Ok(Self {
            program,
            geometry,
            _texture: texture,
            bind_group,
            viewport: image.viewport(),
        })
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Clears `view` to transparent black and draws the quad once.
    pub(crate) fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cell mosaic pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.program.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.geometry.bind(&mut pass);
        pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }
}
