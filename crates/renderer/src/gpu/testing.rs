//! Headless device and off-screen readback for GPU tests.

use crossbeam_channel::bounded;
use image::RgbaImage;

use crate::error::RenderError;
use crate::loader::SourceImage;

use super::pass::EffectPass;

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) struct HeadlessGpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl HeadlessGpu {
    /// Returns `None` when the machine has no usable adapter.
    pub(crate) fn new() -> Option<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = match pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        )) {
            Ok(adapter) => adapter,
            Err(err) => {
                eprintln!("skipping GPU test: no adapter ({err})");
                return None;
            }
        };
        let (device, queue) = match pollster::block_on(
            adapter.request_device(&wgpu::DeviceDescriptor {
                label: Some("cellmosaic test device"),
                ..Default::default()
            }),
        ) {
            Ok(pair) => pair,
            Err(err) => {
                eprintln!("skipping GPU test: no device ({err})");
                return None;
            }
        };
        Some(Self { device, queue })
    }

    /// Builds a pass for `image`, draws it into an image-sized texture and
    /// reads the pixels back.
    pub(crate) fn render_offscreen(&self, image: &SourceImage) -> Result<RgbaImage, RenderError> {
        let pass = EffectPass::build(&self.device, &self.queue, TARGET_FORMAT, image)?;
        Ok(self.draw(&pass))
    }

    pub(crate) fn draw(&self, pass: &EffectPass) -> RgbaImage {
        let viewport = pass.viewport();
        let size = wgpu::Extent3d {
            width: viewport.width,
            height: viewport.height,
            depth_or_array_layers: 1,
        };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded = viewport.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen readback"),
            size: u64::from(padded) * u64::from(viewport.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen encoder"),
            });
        pass.encode(&mut encoder, &view);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(viewport.height),
                },
            },
            size,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut pixels = Vec::with_capacity((unpadded * viewport.height) as usize);
        for row in self.map_read(&readback).chunks(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        RgbaImage::from_raw(viewport.width, viewport.height, pixels).unwrap()
    }

    /// Copies a `COPY_SRC` buffer into host memory.
    pub(crate) fn read_buffer(&self, source: &wgpu::Buffer) -> Vec<u8> {
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("buffer readback"),
            size: source.size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("buffer readback encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &readback, 0, source.size());
        self.queue.submit(std::iter::once(encoder.finish()));
        self.map_read(&readback)
    }

    fn map_read(&self, readback: &wgpu::Buffer) -> Vec<u8> {
        let slice = readback.slice(..);
        let (sender, receiver) = bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::Wait);
        receiver.recv().unwrap().unwrap();

        let bytes = slice.get_mapped_range().to_vec();
        readback.unmap();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, ShaderSource};
    use crate::gpu::geometry::{vertex_bytes, QuadGeometry, QUAD_POSITIONS, QUAD_TEX_COORDS};
    use crate::gpu::state::release_for;
    use crate::loader::Viewport;
    use crate::types::ShaderKind;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 40) as u8, ((x + y) * 20) as u8, 255])
        })
    }

    #[test]
    fn solid_red_renders_solid_red() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let image = SourceImage::from_rgba("red.png", red.clone());
        let rendered = gpu.render_offscreen(&image).unwrap();
        assert_eq!(rendered.dimensions(), (2, 2));
        assert_eq!(rendered, red);
    }

    #[test]
    fn second_render_matches_reference_of_second_image() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let blue = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 255, 255]));
        let first = SourceImage::from_rgba("first.png", blue);
        let second = SourceImage::from_rgba("second.png", gradient(5, 3));
        let build = |image: &SourceImage| {
            EffectPass::build(&gpu.device, &gpu.queue, TARGET_FORMAT, image).unwrap()
        };

        let mut current = Some(build(&first));
        if let Some(pass) = &current {
            gpu.draw(pass);
        }
        current.take();
        current = Some(build(&second));
        let replaced = gpu.draw(current.as_ref().unwrap());

        let reference = gpu.render_offscreen(&second).unwrap();
        assert_eq!(replaced.dimensions(), (5, 3));
        assert_eq!(replaced, reference);
    }

    #[test]
    fn every_rendered_pixel_comes_from_the_image() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let source = gradient(4, 4);
        let rendered = gpu
            .render_offscreen(&SourceImage::from_rgba("gradient.png", source.clone()))
            .unwrap();
        for pixel in rendered.pixels() {
            assert!(source.pixels().any(|candidate| candidate == pixel), "{pixel:?}");
        }
    }

    #[test]
    fn device_accepts_both_stages() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let source = ShaderSource::CELL_MOSAIC;
        assert!(compile(&gpu.device, ShaderKind::Vertex, source.vertex).is_ok());
        assert!(compile(&gpu.device, ShaderKind::Fragment, source.fragment).is_ok());
    }

    #[test]
    fn broken_shader_produces_no_module() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let broken = ShaderSource::CELL_MOSAIC
            .fragment
            .replace("vec2 gv = fract(uv);", "vec2 gv = fract(uvw);");
        assert!(matches!(
            compile(&gpu.device, ShaderKind::Fragment, &broken),
            Err(RenderError::ShaderCompile { .. })
        ));
    }

    #[test]
    fn quad_upload_is_bit_identical_across_uploads() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let first = QuadGeometry::upload(&gpu.device);
        let second = QuadGeometry::upload(&gpu.device);
        let expected = [vertex_bytes(&QUAD_POSITIONS), vertex_bytes(&QUAD_TEX_COORDS)];

        for ((a, b), expected) in first.buffers().into_iter().zip(second.buffers()).zip(expected) {
            let a = gpu.read_buffer(a);
            let b = gpu.read_buffer(b);
            assert_eq!(a.len(), 48);
            assert_eq!(a, b);
            assert_eq!(a.as_slice(), expected);
        }
    }

    #[test]
    fn oversized_image_keeps_the_current_pass() {
        let Some(gpu) = HeadlessGpu::new() else {
            return;
        };
        let limit = gpu.device.limits().max_texture_dimension_2d;
        let shown = SourceImage::from_rgba("shown.png", gradient(3, 3));
        let mut current =
            Some(EffectPass::build(&gpu.device, &gpu.queue, TARGET_FORMAT, &shown).unwrap());

        let huge = Viewport {
            width: limit + 1,
            height: 1,
        };
        assert!(matches!(
            release_for(&mut current, huge, limit),
            Err(RenderError::ImageTooLarge { .. })
        ));
        let kept = current.as_ref().expect("pass should survive a rejected image");
        assert_eq!(gpu.draw(kept), gpu.render_offscreen(&shown).unwrap());

        let fits = Viewport {
            width: 2,
            height: 2,
        };
        release_for(&mut current, fits, limit).unwrap();
        assert!(current.is_none());
    }
}
