//! Per-sector triangle meshes grouped into material batches.

use sectorscope_core::{TileId, WallId};

/// How a surface is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Palette index 255 is cut out.
    Masked,
    Translucent,
    TranslucentInverse,
}

impl BlendMode {
    pub fn is_transparent(self) -> bool {
        self != Self::Opaque
    }
}

/// Part of a wall a section covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSection {
    /// Floor to ceiling of a solid wall.
    Full,
    /// Own ceiling down to the neighbor's ceiling.
    UpperGap,
    /// Own floor up to the neighbor's floor.
    LowerGap,
    /// Neighbor floor to neighbor ceiling, mask texture.
    Mask,
    /// Floor to ceiling across a portal.
    OneWay,
}

impl WallSection {
    pub fn is_gap(self) -> bool {
        matches!(self, Self::UpperGap | Self::LowerGap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Floor,
    Ceiling,
    Wall { wall: WallId, section: WallSection },
}

/// Everything a renderer needs to pick textures and state for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialKey {
    pub tile: Option<TileId>,
    pub palette: u8,
    pub shade: i8,
    pub blend: BlendMode,
    pub parallax: bool,
}

/// A contiguous run of indices sharing one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub material: MaterialKey,
    pub start_index: u32,
    pub index_count: u32,
}

impl Surface {
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.start_index as usize..(self.start_index + self.index_count) as usize
    }
}

/// Receives finished geometry batches.
pub trait MeshSink {
    fn surface(&mut self, material: &MaterialKey, positions: &[[f32; 3]], uvs: &[[f32; 2]], indices: &[u32]);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub surfaces: Vec<Surface>,
    /// Wall sections dropped because they had no height.
    pub skipped_sections: u32,
}

impl SectorMesh {
    /// Append a batch; `indices` are relative to `positions`.
    pub(crate) fn push(
        &mut self,
        kind: SurfaceKind,
        material: MaterialKey,
        positions: &[[f32; 3]],
        uvs: &[[f32; 2]],
        indices: impl IntoIterator<Item = u32>,
    ) {
        let base = self.positions.len() as u32;
        let start = self.indices.len() as u32;
        self.positions.extend_from_slice(positions);
        self.uvs.extend_from_slice(uvs);
        self.indices.extend(indices.into_iter().map(|i| i + base));
        self.surfaces.push(Surface {
            kind,
            material,
            start_index: start,
            index_count: self.indices.len() as u32 - start,
        });
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn surfaces_of(&self, kind: SurfaceKind) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(move |s| s.kind == kind)
    }

    pub fn surface_indices(&self, surface: &Surface) -> &[u32] {
        &self.indices[surface.range()]
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Hand every surface to `sink`, sharing the vertex buffers.
    pub fn emit(&self, sink: &mut dyn MeshSink) {
        for surface in &self.surfaces {
            sink.surface(
                &surface.material,
                &self.positions,
                &self.uvs,
                self.surface_indices(surface),
            );
        }
    }
}
