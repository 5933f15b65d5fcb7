//! # Surface Mesher
//!
//! Turns the tiles around a chunk into smoothed, multi-textured geometry.
//!
//! ## Pipeline
//!
//! ```text
//! extract   chunk + border -> boundary quads, corners welded
//! smooth    N passes, vertex -> average centroid of its faces (budgeted)
//! normals   face = edge cross product, vertex = normalized sum
//! layers    per face corner: base texture + up to 4 buddy textures
//! emit      cube (raw), low detail, high detail; real faces only
//! ```
//!
//! The border (default [`SMOOTHING_BORDER`] tiles) gives smoothing real
//! neighbour data at chunk edges; border faces shape the result but are
//! never emitted, so neighbouring chunks meet without seams.

pub mod extract;
pub mod graph;
pub mod layers;
pub mod output;
pub mod smooth;
pub mod uv;

pub use graph::{Direction, Face, MeshGraph, MeshVertex};
pub use layers::{CornerLayers, Layer};
pub use output::{ChunkMeshes, CubeVertex, HighDetailVertex, LowDetailVertex, MeshBuffers, MeshStats};
pub use uv::{resolve_layer_uv, Quad, UvCache, UvMapping};

use tracing::debug;

use lithos_shared::{ChunkPosition, Vec3, SMOOTHING_BORDER, SMOOTHING_ITERATIONS};

use crate::light::ChunkLight;
use crate::materials::MaterialTable;
use crate::view::WorldView;

use output::{color_value, light_value};
use uv::CORNER_UVS;

/// Mesher settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshOptions {
    /// Chunk edge length in tiles.
    pub chunk_size: i32,
    /// Border tiles read on every side.
    pub border: i32,
    /// Smoothing passes; at most `border` keeps the chunk edge seam-free.
    pub iterations: u32,
}

impl MeshOptions {
    /// Default border and iterations for a chunk size.
    #[must_use]
    pub const fn for_chunk_size(chunk_size: i32) -> Self {
        Self {
            chunk_size,
            border: SMOOTHING_BORDER,
            iterations: SMOOTHING_ITERATIONS,
        }
    }
}

impl Default for MeshOptions {
    #[allow(clippy::cast_possible_wrap)]
    fn default() -> Self {
        Self::for_chunk_size(lithos_shared::DEFAULT_CHUNK_SIZE as i32)
    }
}

/// Builds chunk meshes. Owns the material table and the UV-mapping cache.
#[derive(Debug, Default)]
pub struct SurfaceMesher {
    options: MeshOptions,
    materials: MaterialTable,
    uv_cache: UvCache,
}

impl SurfaceMesher {
    /// Creates a mesher with the default materials.
    #[must_use]
    pub fn new(options: MeshOptions) -> Self {
        Self::with_materials(options, MaterialTable::default())
    }

    /// Creates a mesher with custom materials.
    #[must_use]
    pub fn with_materials(options: MeshOptions, materials: MaterialTable) -> Self {
        Self {
            options,
            materials,
            uv_cache: UvCache::new(),
        }
    }

    /// Mesher settings.
    #[must_use]
    pub const fn options(&self) -> MeshOptions {
        self.options
    }

    /// Material table.
    #[must_use]
    pub const fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// UV-mapping cache.
    #[must_use]
    pub const fn uv_cache(&self) -> &UvCache {
        &self.uv_cache
    }

    /// Extracts, smooths and computes normals. Returns the graph and the
    /// number of smoothing moves.
    #[must_use]
    pub fn build_graph(
        &self,
        view: &dyn WorldView,
        position: ChunkPosition,
        light: Option<&ChunkLight>,
    ) -> (MeshGraph, usize) {
        let MeshOptions {
            chunk_size,
            border,
            iterations,
        } = self.options;
        let mut graph = extract::extract_faces(view, position, chunk_size, border, &self.materials, light);
        let moves = smooth::smooth(&mut graph, &self.materials, iterations);
        smooth::compute_normals(&mut graph);
        (graph, moves)
    }

    /// Builds every mesh tier for one chunk.
    #[must_use]
    pub fn build_mesh(
        &self,
        view: &dyn WorldView,
        position: ChunkPosition,
        light: Option<&ChunkLight>,
    ) -> ChunkMeshes {
        let (graph, moves) = self.build_graph(view, position, light);
        let mut meshes = ChunkMeshes {
            position,
            ..ChunkMeshes::default()
        };
        let mut blended = 0;

        for (index, face) in graph.real_faces() {
            let normal = face.direction.normal().to_array();
            let color = color_value(face.color);
            let lit = light_value(face.light);

            let mut cube = [CubeVertex::default(); 4];
            let mut low = [LowDetailVertex::default(); 4];
            let mut high = [HighDetailVertex::default(); 4];
            for corner in 0..4 {
                let vertex = &graph.vertices[face.vertices[corner] as usize];
                let uv = CORNER_UVS[corner].to_array();

                cube[corner] = CubeVertex {
                    position: Vec3::from_ints(vertex.original).to_array(),
                    normal,
                    uv,
                    texture: face.texture,
                };
                low[corner] = LowDetailVertex {
                    position: vertex.position.to_array(),
                    normal: vertex.normal.to_array(),
                    uv,
                    texture: face.texture,
                    color,
                    light: lit,
                };

                let corner_layers = layers::resolve_layers(&graph, index, corner, &self.uv_cache);
                blended += corner_layers[1..].iter().filter(|l| !l.is_blank()).count();
                high[corner] = HighDetailVertex {
                    position: vertex.position.to_array(),
                    normal: vertex.normal.to_array(),
                    color,
                    light: lit,
                    uvs: corner_layers.map(|l| l.uv.to_array()),
                    textures: corner_layers.map(|l| l.texture),
                };
            }
            meshes.cube.push_quad(cube);
            meshes.low_detail.push_quad(low);
            meshes.high_detail.push_quad(high);
        }

        meshes.stats = MeshStats {
            faces: graph.face_count(),
            real_faces: meshes.cube.quad_count(),
            welded_vertices: graph.vertex_count(),
            smoothing_moves: moves,
            blended_layers: blended,
        };
        debug!(
            %position,
            faces = meshes.stats.real_faces,
            border_faces = meshes.stats.faces - meshes.stats.real_faces,
            vertices = meshes.stats.welded_vertices,
            "built chunk mesh"
        );
        meshes
    }
}
