use wgpu::util::DeviceExt;

use crate::program::ResolvedLocations;

/// Two triangles covering clip space.
pub const QUAD_POSITIONS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [1.0, 1.0],
];

/// Texture coordinates per vertex, flipped vertically against the positions.
pub const QUAD_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
];

pub const QUAD_VERTEX_COUNT: u32 = QUAD_POSITIONS.len() as u32;

/// Tightly packed `vec2<f32>`.
pub const VERTEX_STRIDE: wgpu::BufferAddress = std::mem::size_of::<[f32; 2]>() as u64;

pub fn vertex_bytes(vertices: &[[f32; 2]]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// One vertex buffer per attribute; slot 0 feeds `position`, slot 1 feeds
/// `texCoord`.
pub(crate) struct QuadLayout {
    position: [wgpu::VertexAttribute; 1],
    tex_coord: [wgpu::VertexAttribute; 1],
}

impl QuadLayout {
    pub(crate) fn new(locations: &ResolvedLocations) -> Self {
        Self {
            position: [attribute(locations.position)],
            tex_coord: [attribute(locations.tex_coord)],
        }
    }

    pub(crate) fn buffers(&self) -> [wgpu::VertexBufferLayout<'_>; 2] {
        [
            wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &self.position,
            },
            wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &self.tex_coord,
            },
        ]
    }
}

fn attribute(location: u32) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: location,
    }
}

pub(crate) struct QuadGeometry {
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
}

impl QuadGeometry {
    pub(crate) fn upload(device: &wgpu::Device) -> Self {
        Self {
            positions: upload_attribute(device, "quad positions", &QUAD_POSITIONS),
            tex_coords: upload_attribute(device, "quad texture coordinates", &QUAD_TEX_COORDS),
        }
    }

    #[cfg(test)]
    pub(crate) fn buffers(&self) -> [&wgpu::Buffer; 2] {
        [&self.positions, &self.tex_coords]
    }

    pub(crate) fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.tex_coords.slice(..));
    }
}

fn upload_attribute(device: &wgpu::Device, label: &str, vertices: &[[f32; 2]]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: vertex_bytes(vertices),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC,
    })
}
