//! Program linking and location lookup over naga IR.
//!
//! Linking pairs a vertex and a fragment stage and checks that every located
//! fragment input is fed by a vertex output of the same type. Locations are
//! then resolved by name the way a GL program would report them: vertex
//! attributes by `location`, samplers and textures by their binding index in
//! group 0 (texture unit 0). Names that do not resolve report `-1`.

use wgpu::naga;

use crate::compile::ParsedShader;
use crate::error::RenderError;
use crate::types::ShaderKind;

pub const POSITION: &str = "position";
pub const TEX_COORD: &str = "texCoord";
pub const IMAGE_SAMPLER: &str = "imageSampler";
pub const IMAGE_TEXTURE: &str = "imageTexture";

/// Location reported for a name the program does not expose.
pub const UNRESOLVED: i32 = -1;

/// Bind group that stands in for texture unit 0.
pub const TEXTURE_UNIT: u32 = 0;

/// Reflection over a linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    vertex: naga::Module,
    fragment: naga::Module,
}

/// Locations resolved from a linked program; `-1` marks an unused name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLocations {
    pub position: i32,
    pub tex_coord: i32,
    pub image_sampler: i32,
    pub image_texture: i32,
}

/// Locations that are known to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocations {
    pub position: u32,
    pub tex_coord: u32,
    pub image_sampler: u32,
    pub image_texture: u32,
}

impl AttributeLocations {
    /// Rejects the set if any location is unresolved.
    pub fn require(self) -> Result<ResolvedLocations, RenderError> {
        Ok(ResolvedLocations {
            position: required(self.position, POSITION)?,
            tex_coord: required(self.tex_coord, TEX_COORD)?,
            image_sampler: required(self.image_sampler, IMAGE_SAMPLER)?,
            image_texture: required(self.image_texture, IMAGE_TEXTURE)?,
        })
    }
}

fn required(location: i32, name: &'static str) -> Result<u32, RenderError> {
    u32::try_from(location).map_err(|_| RenderError::UnresolvedBinding { name })
}

struct Varying {
    name: Option<String>,
    location: u32,
    inner: naga::TypeInner,
}

/// Links a vertex and fragment stage into a program interface.
///
/// All mismatches are collected into one diagnostic rather than stopping at
/// the first.
pub fn link_interface(
    vertex: &ParsedShader,
    fragment: &ParsedShader,
) -> Result<ProgramInterface, RenderError> {
    let mut problems = Vec::new();

    if vertex.kind != ShaderKind::Vertex {
        problems.push(format!(
            "a {} shader is attached in the vertex slot",
            vertex.kind
        ));
    }
    if fragment.kind != ShaderKind::Fragment {
        problems.push(format!(
            "a {} shader is attached in the fragment slot",
            fragment.kind
        ));
    }

    let vertex_entry = entry_point(&vertex.module, naga::ShaderStage::Vertex);
    let fragment_entry = entry_point(&fragment.module, naga::ShaderStage::Fragment);
    if vertex_entry.is_none() {
        problems.push("vertex module has no vertex entry point".to_string());
    }
    if fragment_entry.is_none() {
        problems.push("fragment module has no fragment entry point".to_string());
    }

    if let (Some(vertex_entry), Some(fragment_entry)) = (vertex_entry, fragment_entry) {
        let outputs = vertex_outputs(&vertex.module, vertex_entry);
        for input in entry_inputs(&fragment.module, fragment_entry) {
            let name = input.name.as_deref().unwrap_or("<unnamed>");
            match outputs.iter().find(|output| output.location == input.location) {
                None => problems.push(format!(
                    "fragment input `{name}` (location {}) has no matching vertex output",
                    input.location
                )),
                Some(output) if output.inner != input.inner => problems.push(format!(
                    "fragment input `{name}` (location {}) is {:?} but the vertex stage writes {:?}",
                    input.location, input.inner, output.inner
                )),
                Some(_) => {}
            }
        }
    }

    if problems.is_empty() {
        Ok(ProgramInterface {
            vertex: vertex.module.clone(),
            fragment: fragment.module.clone(),
        })
    } else {
        Err(RenderError::ProgramLink {
            diagnostics: problems.join("\n"),
        })
    }
}

impl ProgramInterface {
    /// Looks up one name, returning [`UNRESOLVED`] when it is not exposed.
    pub fn resolve(&self, name: &str) -> i32 {
        self.attribute_location(name)
            .or_else(|| self.uniform_location(name))
            .and_then(|location| i32::try_from(location).ok())
            .unwrap_or(UNRESOLVED)
    }

    pub fn resolve_all<'a>(&self, names: &[&'a str]) -> Vec<(&'a str, i32)> {
        names.iter().map(|name| (*name, self.resolve(name))).collect()
    }

    pub fn locations(&self) -> AttributeLocations {
        AttributeLocations {
            position: self.resolve(POSITION),
            tex_coord: self.resolve(TEX_COORD),
            image_sampler: self.resolve(IMAGE_SAMPLER),
            image_texture: self.resolve(IMAGE_TEXTURE),
        }
    }

    fn attribute_location(&self, name: &str) -> Option<u32> {
        let entry = entry_point(&self.vertex, naga::ShaderStage::Vertex)?;
        entry_inputs(&self.vertex, entry)
            .into_iter()
            .find(|input| input.name.as_deref() == Some(name))
            .map(|input| input.location)
    }

    fn uniform_location(&self, name: &str) -> Option<u32> {
        [&self.vertex, &self.fragment]
            .into_iter()
            .flat_map(|module| module.global_variables.iter())
            .find_map(|(_, variable)| {
                if variable.name.as_deref() != Some(name) {
                    return None;
                }
                match &variable.binding {
                    Some(binding) if binding.group == TEXTURE_UNIT => Some(binding.binding),
                    Some(binding) => {
                        tracing::debug!(
                            name,
                            group = binding.group,
                            "uniform is bound outside texture unit 0; treating as unresolved"
                        );
                        None
                    }
                    None => None,
                }
            })
    }
}

fn entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|entry| entry.stage == stage)
}

fn location_of(binding: &naga::Binding) -> Option<u32> {
    match binding {
        naga::Binding::Location { location, .. } => Some(*location),
        _ => None,
    }
}

fn struct_varyings(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Vec<Varying> {
    match &module.types[ty].inner {
        naga::TypeInner::Struct { members, .. } => members
            .iter()
            .filter_map(|member| {
                let location = location_of(member.binding.as_ref()?)?;
                Some(Varying {
                    name: member.name.clone(),
                    location,
                    inner: module.types[member.ty].inner.clone(),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn vertex_outputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<Varying> {
    let Some(result) = &entry.function.result else {
        return Vec::new();
    };
    match &result.binding {
        Some(binding) => location_of(binding)
            .map(|location| Varying {
                name: None,
                location,
                inner: module.types[result.ty].inner.clone(),
            })
            .into_iter()
            .collect(),
        None => struct_varyings(module, result.ty),
    }
}

fn entry_inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<Varying> {
    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        match &argument.binding {
            Some(binding) => {
                if let Some(location) = location_of(binding) {
                    inputs.push(Varying {
                        name: argument.name.clone(),
                        location,
                        inner: module.types[argument.ty].inner.clone(),
                    });
                }
            }
            None => inputs.extend(struct_varyings(module, argument.ty)),
        }
    }
    inputs
}
