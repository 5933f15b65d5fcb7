//! Vertex formats and mesh buffers handed to the renderer.
//!
//! All positions are relative to the chunk origin. Every face is emitted as
//! four unshared vertices (per-face UVs and textures) and two triangles.

use bytemuck::{Pod, Zeroable};

use lithos_core::TileLight;
use lithos_shared::{ChunkPosition, AMBIENT_LIGHT_FLOOR, MAX_TEXTURE_LAYERS};
use lithos_shared::constants::MAX_LIGHT_CHANNEL;

// =============================================================================
// VERTEX FORMATS
// =============================================================================

/// Raw cube vertex: unsmoothed, unlit. For collision and tooling.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CubeVertex {
    /// Position.
    pub position: [f32; 3],
    /// Axis normal of the face.
    pub normal: [f32; 3],
    /// Corner UV.
    pub uv: [f32; 2],
    /// Texture index.
    pub texture: u32,
}

/// Low detail vertex: smoothed, one texture per face.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LowDetailVertex {
    /// Smoothed position.
    pub position: [f32; 3],
    /// Averaged vertex normal.
    pub normal: [f32; 3],
    /// Corner UV.
    pub uv: [f32; 2],
    /// Texture index.
    pub texture: u32,
    /// Tile colour, 0.0-1.0.
    pub color: f32,
    /// RGB light, 0.0-1.0 per channel.
    pub light: [f32; 3],
}

/// High detail vertex: smoothed, up to [`MAX_TEXTURE_LAYERS`] blended textures.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct HighDetailVertex {
    /// Smoothed position.
    pub position: [f32; 3],
    /// Averaged vertex normal.
    pub normal: [f32; 3],
    /// Tile colour, 0.0-1.0.
    pub color: f32,
    /// RGB light, 0.0-1.0 per channel.
    pub light: [f32; 3],
    /// UV per layer; base layer first.
    pub uvs: [[f32; 2]; MAX_TEXTURE_LAYERS],
    /// Texture per layer; 0 is blank.
    pub textures: [u32; MAX_TEXTURE_LAYERS],
}

/// Normalized colour of a 0-127 colour byte.
#[inline]
#[must_use]
pub fn color_value(color: u8) -> f32 {
    f32::from(color.min(127)) / 127.0
}

/// Normalized RGB of a tile light, never below the ambient floor.
#[inline]
#[must_use]
pub fn light_value(light: TileLight) -> [f32; 3] {
    let channel = |v: u8| f32::from(v.max(AMBIENT_LIGHT_FLOOR)) / f32::from(MAX_LIGHT_CHANNEL);
    [channel(light.red()), channel(light.green()), channel(light.blue())]
}

// =============================================================================
// BUFFERS
// =============================================================================

/// Vertex + index buffer pair.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBuffers<V> {
    /// Vertex buffer data.
    pub vertices: Vec<V>,
    /// Index buffer data.
    pub indices: Vec<u32>,
}

impl<V> Default for MeshBuffers<V> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V: Pod> MeshBuffers<V> {
    /// Appends one quad, corners in winding order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_quad(&mut self, corners: [V; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Number of quads.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// True if the buffer holds no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex data as bytes, ready for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes, ready for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

// =============================================================================
// CHUNK MESHES
// =============================================================================

/// Counters from one mesh build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Faces extracted, border included.
    pub faces: usize,
    /// Faces inside the chunk (the ones emitted).
    pub real_faces: usize,
    /// Vertices after welding.
    pub welded_vertices: usize,
    /// Vertex moves over all smoothing passes.
    pub smoothing_moves: usize,
    /// Non-blank layers above the base, over all emitted corners.
    pub blended_layers: usize,
}

/// Every mesh tier for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMeshes {
    /// Chunk the meshes belong to.
    pub position: ChunkPosition,
    /// Unsmoothed, unlit cubes.
    pub cube: MeshBuffers<CubeVertex>,
    /// Smoothed, single texture.
    pub low_detail: MeshBuffers<LowDetailVertex>,
    /// Smoothed, layered textures.
    pub high_detail: MeshBuffers<HighDetailVertex>,
    /// Build counters.
    pub stats: MeshStats,
}

impl ChunkMeshes {
    /// True if the chunk has no visible surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cube.is_empty()
    }

    /// Number of emitted faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.cube.quad_count()
    }
}
