//! Boundary-face extraction and vertex welding.
//!
//! Walks the chunk plus its smoothing border and emits one quad for every
//! side of a solid tile that faces air. Corners are welded on their integer
//! position, chunk-relative.

use lithos_core::TileLight;
use lithos_shared::{ChunkPosition, GlobalTilePosition};

use crate::light::ChunkLight;
use crate::materials::MaterialTable;
use crate::mesher::graph::{Direction, Face, MeshGraph};
use crate::view::WorldView;

/// Stable pseudo-random layer key for a face.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn face_z_index(position: GlobalTilePosition, direction: Direction) -> u32 {
    let mut h = 0u64;
    for value in [
        position.x as u32,
        position.y as u32,
        position.z as u32,
        u32::from(direction.index()),
    ] {
        h = splitmix64(h ^ u64::from(value));
    }
    (h >> 32) as u32
}

#[inline]
const fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Extracts every boundary face of the chunk and its border.
///
/// Faces of tiles inside `[0, chunk_size)` on all axes are marked real.
/// Without `light`, faces are treated as fully lit.
#[must_use]
pub fn extract_faces(
    view: &dyn WorldView,
    position: ChunkPosition,
    chunk_size: i32,
    border: i32,
    materials: &MaterialTable,
    light: Option<&ChunkLight>,
) -> MeshGraph {
    let origin = position.origin(chunk_size);
    let inside = |v: i32| (0..chunk_size).contains(&v);
    let mut graph = MeshGraph::new();

    for z in -border..chunk_size + border {
        for y in -border..chunk_size + border {
            for x in -border..chunk_size + border {
                let global = origin.offset(x, y, z);
                let tile = view.tile(global);
                if tile.is_air() {
                    continue;
                }
                let real = inside(x) && inside(y) && inside(z);
                let color = view.color(global);

                for direction in Direction::ALL {
                    let [dx, dy, dz] = direction.offset();
                    let front = global.offset(dx, dy, dz);
                    if view.tile(front).is_solid() {
                        continue;
                    }

                    let z_index = face_z_index(global, direction);
                    let vertices = direction
                        .corners()
                        .map(|c| graph.weld([x + c[0], y + c[1], z + c[2]]));
                    graph.push_face(Face {
                        vertices,
                        tile_position: [global.x, global.y, global.z],
                        direction,
                        tile,
                        texture: materials.texture_for(tile, z_index),
                        color,
                        light: light.and_then(|l| l.at(front)).unwrap_or(TileLight::SUN),
                        z_index,
                        real,
                        normal: direction.normal(),
                    });
                }
            }
        }
    }
    graph
}
