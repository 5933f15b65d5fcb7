//! Vertex/face arena used while meshing.
//!
//! Faces hold four vertex indices; vertices hold the `(face, corner)` pairs
//! that touch them. Everything is addressed by index, so the graph has no
//! reference cycles and can be inspected directly in tests.

use std::collections::HashMap;

use lithos_core::{Tile, TileLight};
use lithos_shared::Vec3;

/// Axis-aligned face direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +X
    PosX,
    /// -X
    NegX,
    /// +Y
    PosY,
    /// -Y
    NegY,
    /// +Z
    PosZ,
    /// -Z
    NegZ,
}

impl Direction {
    /// All six directions.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Stable index 0..6.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::PosX => 0,
            Self::NegX => 1,
            Self::PosY => 2,
            Self::NegY => 3,
            Self::PosZ => 4,
            Self::NegZ => 5,
        }
    }

    /// Offset to the neighbouring tile.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> [i32; 3] {
        match self {
            Self::PosX => [1, 0, 0],
            Self::NegX => [-1, 0, 0],
            Self::PosY => [0, 1, 0],
            Self::NegY => [0, -1, 0],
            Self::PosZ => [0, 0, 1],
            Self::NegZ => [0, 0, -1],
        }
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        Vec3::from_ints(self.offset())
    }

    /// Corner offsets from the tile's minimum corner.
    ///
    /// Counter-clockwise seen from outside: with `u = c1 - c0` and
    /// `v = c3 - c0`, `u x v` points along the outward normal.
    #[must_use]
    pub const fn corners(self) -> [[i32; 3]; 4] {
        match self {
            Self::PosX => [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
            Self::NegX => [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
            Self::PosY => [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
            Self::NegY => [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
            Self::PosZ => [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
            Self::NegZ => [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
        }
    }
}

/// One quad face.
#[derive(Clone, Debug)]
pub struct Face {
    /// Vertex indices in winding order.
    pub vertices: [u32; 4],
    /// World position of the tile the face belongs to.
    pub tile_position: [i32; 3],
    /// Side of the tile.
    pub direction: Direction,
    /// Tile type.
    pub tile: Tile,
    /// Texture index.
    pub texture: u32,
    /// Colour sample of the tile (0-127).
    pub color: u8,
    /// Light of the air tile in front of the face.
    pub light: TileLight,
    /// Layer ordering key.
    pub z_index: u32,
    /// True for tiles inside the chunk, false for the smoothing border.
    pub real: bool,
    /// Face normal, filled in after smoothing.
    pub normal: Vec3,
}

/// One welded vertex.
#[derive(Clone, Debug)]
pub struct MeshVertex {
    /// Current (possibly smoothed) position.
    pub position: Vec3,
    /// Integer corner the vertex was welded at.
    pub original: [i32; 3],
    /// `(face, corner)` pairs touching this vertex.
    pub touches: Vec<(u32, u8)>,
    /// Smoothing iterations that moved this vertex.
    pub smooth_count: u32,
    /// Vertex normal, filled in after smoothing.
    pub normal: Vec3,
}

/// Arena of faces and welded vertices.
#[derive(Clone, Debug, Default)]
pub struct MeshGraph {
    /// Welded vertices.
    pub vertices: Vec<MeshVertex>,
    /// Faces in extraction order.
    pub faces: Vec<Face>,
    weld: HashMap<[i32; 3], u32>,
}

impl MeshGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex at `corner`, creating it if this corner is new.
    #[allow(clippy::cast_possible_truncation)]
    pub fn weld(&mut self, corner: [i32; 3]) -> u32 {
        if let Some(&index) = self.weld.get(&corner) {
            return index;
        }
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position: Vec3::from_ints(corner),
            original: corner,
            touches: Vec::with_capacity(4),
            smooth_count: 0,
            normal: Vec3::ZERO,
        });
        self.weld.insert(corner, index);
        index
    }

    /// Adds a face whose corners are already welded and records the touches.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_face(&mut self, face: Face) -> u32 {
        let index = self.faces.len() as u32;
        for (corner, &vertex) in face.vertices.iter().enumerate() {
            self.vertices[vertex as usize]
                .touches
                .push((index, corner as u8));
        }
        self.faces.push(face);
        index
    }

    /// Number of faces, border included.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of welded vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Faces inside the chunk.
    pub fn real_faces(&self) -> impl Iterator<Item = (usize, &Face)> {
        self.faces.iter().enumerate().filter(|(_, face)| face.real)
    }

    /// Current corner positions of a face.
    #[must_use]
    pub fn face_positions(&self, face: &Face) -> [Vec3; 4] {
        face.vertices.map(|v| self.vertices[v as usize].position)
    }

    /// Welded integer corners of a face.
    #[must_use]
    pub fn face_corners(&self, face: &Face) -> [[i32; 3]; 4] {
        face.vertices.map(|v| self.vertices[v as usize].original)
    }

    /// Average of a face's current corner positions.
    #[must_use]
    pub fn centroid(&self, face: &Face) -> Vec3 {
        let [a, b, c, d] = self.face_positions(face);
        (a + b + c + d) * 0.25
    }
}
