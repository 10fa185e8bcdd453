use bytemuck::{Pod, Zeroable};

const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// Vertex of the lit cube: position, normal and texture coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LitVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl LitVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::interleaved(&[3, 3, 2])
    }
}

/// Vertex of the textured quad: position, vertex colour and texture coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl ColoredVertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::interleaved(&[3, 3, 2])
    }
}

/// One `f32` vertex attribute inside an interleaved buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeDesc {
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

impl AttributeDesc {
    pub fn size(&self) -> u32 {
        self.components * FLOAT_SIZE
    }

    fn format(&self) -> Option<wgpu::VertexFormat> {
        match self.components {
            1 => Some(wgpu::VertexFormat::Float32),
            2 => Some(wgpu::VertexFormat::Float32x2),
            3 => Some(wgpu::VertexFormat::Float32x3),
            4 => Some(wgpu::VertexFormat::Float32x4),
            _ => None,
        }
    }
}

/// Byte layout of an interleaved vertex buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<AttributeDesc>,
}

impl VertexLayout {
    /// Packs attributes back to back in location order, one location per entry.
    pub fn interleaved(components: &[u32]) -> Self {
        let mut offset = 0;
        let attributes = components
            .iter()
            .enumerate()
            .map(|(location, &components)| {
                let attribute = AttributeDesc {
                    location: location as u32,
                    components,
                    offset,
                };
                offset += attribute.size();
                attribute
            })
            .collect();
        Self {
            stride: offset,
            attributes,
        }
    }

    /// Attribute descriptors for pipeline creation. Attributes wider than four
    /// components have no wgpu format and are skipped.
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .filter_map(|attribute| {
                attribute.format().map(|format| wgpu::VertexAttribute {
                    format,
                    offset: u64::from(attribute.offset),
                    shader_location: attribute.location,
                })
            })
            .collect()
    }
}

const fn lit(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> LitVertex {
    LitVertex {
        position,
        normal,
        uv,
    }
}

const fn colored(position: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> ColoredVertex {
    ColoredVertex {
        position,
        color,
        uv,
    }
}

/// Unit cube as 12 non-indexed triangles, six vertices per face.
pub const CUBE_VERTICES: [LitVertex; 36] = [
    lit([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
    lit([0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 0.0]),
    lit([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
    lit([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
    lit([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 1.0]),
    lit([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
    lit([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
    lit([0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0]),
    lit([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
    lit([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
    lit([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 1.0]),
    lit([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
    lit([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    lit([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    lit([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    lit([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    lit([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    lit([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    lit([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
    lit([0.5, 0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 1.0]),
    lit([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
    lit([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
    lit([0.5, -0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 0.0]),
    lit([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
    lit([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
    lit([0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [1.0, 1.0]),
    lit([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
    lit([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
    lit([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [0.0, 0.0]),
    lit([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
    lit([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
    lit([0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 1.0]),
    lit([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
    lit([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
    lit([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0]),
    lit([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
];

pub const QUAD_VERTICES: [ColoredVertex; 4] = [
    colored([-0.5, 0.5, 0.0], [1.0, 0.3, 0.3], [0.0, 1.0]), // top left
    colored([0.5, 0.5, 0.0], [0.3, 1.0, 0.3], [1.0, 1.0]),  // top right
    colored([-0.5, -0.5, 0.0], [0.3, 0.3, 1.0], [0.0, 0.0]), // bottom left
    colored([0.5, -0.5, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0]), // bottom right
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 3, 2, 1];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_packed(layout: &VertexLayout) {
        let total: u32 = layout.attributes.iter().map(|a| a.components).sum();
        assert_eq!(layout.stride, total * FLOAT_SIZE);

        let mut end = 0;
        for attribute in &layout.attributes {
            assert!(attribute.offset >= end, "{attribute:?} overlaps previous");
            end = attribute.offset + attribute.size();
        }
        assert!(end <= layout.stride);
    }

    #[test]
    fn layouts_match_vertex_structs() {
        let lit = LitVertex::layout();
        assert_packed(&lit);
        assert_eq!(lit.stride as usize, std::mem::size_of::<LitVertex>());
        assert_eq!(lit.attributes[1].offset, 12);
        assert_eq!(lit.attributes[2].offset, 24);

        let colored = ColoredVertex::layout();
        assert_packed(&colored);
        assert_eq!(colored.stride as usize, std::mem::size_of::<ColoredVertex>());
    }

    #[test]
    fn arbitrary_layouts_are_packed() {
        for components in [&[4u32][..], &[3, 2], &[1, 1, 1, 4], &[2, 3, 4, 1, 3]] {
            assert_packed(&VertexLayout::interleaved(components));
        }
    }

    #[test]
    fn wgpu_attributes_follow_layout() {
        let attributes = LitVertex::layout().wgpu_attributes();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes[2].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attributes[2].offset, 24);
        assert_eq!(attributes[2].shader_location, 2);
    }

    #[test]
    fn cube_faces_point_outwards() {
        for vertex in CUBE_VERTICES {
            let normal = glam::Vec3::from(vertex.normal);
            let position = glam::Vec3::from(vertex.position);
            assert!((normal.dot(position) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn quad_indices_reference_quad() {
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }
}
