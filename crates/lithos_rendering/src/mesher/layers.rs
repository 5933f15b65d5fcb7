//! Texture-layer resolution at a face corner.
//!
//! The candidates at a corner are the corner's own face plus its buddies:
//! faces touching the same vertex that share an edge with it. Faces that only
//! meet the base at a point cannot be UV-mapped and never take a slot.
//! Candidates are ordered by z-index, the own face becomes the base, anything
//! ordered below the base is dropped, and at most [`MAX_TEXTURE_LAYERS`]
//! survive (the base plus the topmost). Unused slots stay blank.

use lithos_shared::{Vec2, MAX_TEXTURE_LAYERS};

use crate::materials::BLANK_TEXTURE;
use crate::mesher::graph::MeshGraph;
use crate::mesher::uv::{shared_edge, Quad, UvCache, CORNER_UVS};

/// One texture layer at a vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    /// UV in the layer texture's space.
    pub uv: Vec2,
    /// Texture index; [`BLANK_TEXTURE`] for an empty layer.
    pub texture: u32,
}

impl Layer {
    /// An empty layer.
    pub const BLANK: Self = Self {
        uv: Vec2::ZERO,
        texture: BLANK_TEXTURE,
    };

    /// True if nothing is drawn in this layer.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.texture == BLANK_TEXTURE
    }
}

/// Layers at one face corner, base first.
pub type CornerLayers = [Layer; MAX_TEXTURE_LAYERS];

/// Resolves the layers at `corner` of face `face`.
#[must_use]
pub fn resolve_layers(graph: &MeshGraph, face: usize, corner: usize, uv_cache: &UvCache) -> CornerLayers {
    let mut layers = [Layer::BLANK; MAX_TEXTURE_LAYERS];
    let base = &graph.faces[face];
    layers[0] = Layer {
        uv: CORNER_UVS[corner],
        texture: base.texture,
    };

    let base_quad = Quad::new(graph.face_corners(base));
    let vertex = &graph.vertices[base.vertices[corner] as usize];
    let mut candidates: Vec<usize> = vertex
        .touches
        .iter()
        .map(|&(f, _)| f as usize)
        .filter(|&f| {
            f == face || shared_edge(&base_quad, &Quad::new(graph.face_corners(&graph.faces[f]))).is_some()
        })
        .collect();
    candidates.sort_by_key(|&f| (graph.faces[f].z_index, f));

    let Some(own) = candidates.iter().position(|&f| f == face) else {
        return layers;
    };
    let above = &candidates[own + 1..];
    let kept = &above[above.len().saturating_sub(MAX_TEXTURE_LAYERS - 1)..];

    for (slot, &other) in layers[1..].iter_mut().zip(kept) {
        let neighbor = &graph.faces[other];
        let neighbor_quad = Quad::new(graph.face_corners(neighbor));
        if let Some(mapping) = uv_cache.resolve(&base_quad, &neighbor_quad) {
            *slot = Layer {
                uv: mapping.apply(CORNER_UVS[corner]),
                texture: neighbor.texture,
            };
        }
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialTable;
    use crate::mesher::extract::extract_faces;
    use crate::view::ChunkNeighborhood;
    use lithos_core::{Chunk, ChunkExtent, Tile};
    use lithos_shared::{ChunkPosition, LocalTilePosition};
    use std::sync::Arc;

    fn slab() -> MeshGraph {
        let mut chunk = Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Air);
        for z in 0..8 {
            for x in 0..8 {
                chunk.set_tile(LocalTilePosition::new(x, 0, z), Tile::Ground);
            }
        }
        let view = ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, 8, [Arc::new(chunk)]);
        extract_faces(&view, ChunkPosition::ORIGIN, 8, 1, &MaterialTable::default(), None)
    }

    #[test]
    fn test_base_layer_is_own_face() {
        let graph = slab();
        let cache = UvCache::new();
        for (index, face) in graph.real_faces() {
            for corner in 0..4 {
                let layers = resolve_layers(&graph, index, corner, &cache);
                assert_eq!(layers[0].texture, face.texture);
                assert_eq!(layers[0].uv, CORNER_UVS[corner]);
            }
        }
    }

    #[test]
    fn test_layers_above_base_only() {
        let graph = slab();
        let cache = UvCache::new();
        for (index, face) in graph.real_faces() {
            for corner in 0..4 {
                let vertex = &graph.vertices[face.vertices[corner] as usize];
                let higher = vertex
                    .touches
                    .iter()
                    .filter(|&&(f, _)| {
                        let other = &graph.faces[f as usize];
                        (other.z_index, f as usize) > (face.z_index, index)
                    })
                    .count();
                let layers = resolve_layers(&graph, index, corner, &cache);
                let used = layers[1..].iter().filter(|l| !l.is_blank()).count();
                assert!(used <= higher.min(MAX_TEXTURE_LAYERS - 1));
            }
        }
    }

    /// Ground scattered so corners gather many faces.
    fn scattered() -> MeshGraph {
        let mut chunk = Chunk::uniform(ChunkPosition::ORIGIN, 0, ChunkExtent::cube(8), Tile::Air);
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    if (x * 7 + y * 13 + z * 5) % 3 == 0 {
                        chunk.set_tile(LocalTilePosition::new(x, y, z), Tile::Ground);
                    }
                }
            }
        }
        let view = ChunkNeighborhood::from_chunks(ChunkPosition::ORIGIN, 8, [Arc::new(chunk)]);
        extract_faces(&view, ChunkPosition::ORIGIN, 8, 3, &MaterialTable::default(), None)
    }

    #[test]
    fn test_mappable_buddies_are_never_displaced_by_blanks() {
        let graph = scattered();
        let cache = UvCache::new();
        let mut checked = 0;
        for (index, face) in graph.real_faces() {
            let base_quad = Quad::new(graph.face_corners(face));
            for corner in 0..4 {
                let vertex = &graph.vertices[face.vertices[corner] as usize];
                let buddies_above = vertex
                    .touches
                    .iter()
                    .map(|&(f, _)| f as usize)
                    .filter(|&f| {
                        let other = &graph.faces[f];
                        (other.z_index, f) > (face.z_index, index)
                            && shared_edge(&base_quad, &Quad::new(graph.face_corners(other))).is_some()
                    })
                    .count();
                let layers = resolve_layers(&graph, index, corner, &cache);
                let used = layers[1..].iter().filter(|l| !l.is_blank()).count();
                assert_eq!(used, buddies_above.min(MAX_TEXTURE_LAYERS - 1));
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_unused_layers_are_blank() {
        let graph = slab();
        let cache = UvCache::new();
        let mut blanks = 0;
        for (index, _) in graph.real_faces() {
            for corner in 0..4 {
                for layer in &resolve_layers(&graph, index, corner, &cache)[1..] {
                    if layer.is_blank() {
                        assert_eq!(layer.uv, Vec2::ZERO);
                        blanks += 1;
                    }
                }
            }
        }
        assert!(blanks > 0);
    }
}
