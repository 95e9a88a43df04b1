use crate::compile::CompiledShader;
use crate::error::RenderError;
use crate::program::ResolvedLocations;

use super::geometry::QuadLayout;

/// A linked program: the render pipeline plus the layout of texture unit 0.
pub(crate) struct ShaderProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub image_layout: wgpu::BindGroupLayout,
    _vertex: wgpu::ShaderModule,
    _fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    /// Builds the pipeline from two compiled stages.
    ///
    /// Validation errors raised by the device while creating the layouts or
    /// the pipeline are reported as link failures; the partially built
    /// objects are dropped.
    pub(crate) fn new(
        device: &wgpu::Device,
        vertex: CompiledShader,
        fragment: CompiledShader,
        locations: &ResolvedLocations,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let image_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image layout"),
            entries: &image_layout_entries(locations),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cell mosaic pipeline layout"),
            bind_group_layouts: &[&image_layout],
            push_constant_ranges: &[],
        });

        let quad_layout = QuadLayout::new(locations);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cell mosaic pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some("main"),
                buffers: &quad_layout.buffers(),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            drop(pipeline);
            let err = RenderError::ProgramLink {
                diagnostics: error.to_string(),
            };
            tracing::error!(error = %err, "program link failed");
            return Err(err);
        }

        tracing::debug!(?target_format, "linked shader program");
        Ok(Self {
            pipeline,
            image_layout,
            _vertex: vertex.module,
            _fragment: fragment.module,
        })
    }

    pub(crate) fn bind_image(
        &self,
        device: &wgpu::Device,
        locations: &ResolvedLocations,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("image bind group"),
            layout: &self.image_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: locations.image_texture,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: locations.image_sampler,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

fn image_layout_entries(locations: &ResolvedLocations) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: locations.image_texture,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: locations.image_sampler,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}
