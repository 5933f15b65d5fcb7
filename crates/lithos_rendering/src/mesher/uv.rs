//! Texture continuity across shared edges.
//!
//! Each quad maps its corners to the unit square:
//!
//! ```text
//! c3 (0,1) ---- c2 (1,1)
//!    |              |
//! c0 (0,0) ---- c1 (1,0)
//! ```
//!
//! When a neighbouring face's texture is layered over a base face, the base
//! vertices need UVs in the *neighbour's* texture space, as if the
//! neighbour's texture kept going across the shared edge and folded onto
//! the base. [`resolve_layer_uv`] finds that affine map.

use std::collections::HashMap;

use parking_lot::Mutex;

use lithos_shared::Vec2;

/// UV of each corner index.
pub const CORNER_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// A quad by its four integer corners, in winding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quad {
    /// Corner positions.
    pub corners: [[i32; 3]; 4],
}

impl Quad {
    /// Creates a quad.
    #[must_use]
    pub const fn new(corners: [[i32; 3]; 4]) -> Self {
        Self { corners }
    }
}

/// The edge two quads share, as corner indices into each quad.
///
/// `base[k]` and `neighbor[k]` are the same point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SharedEdge {
    /// Two consecutive corners of the base quad.
    pub base: [u8; 2],
    /// The matching corners of the neighbouring quad.
    pub neighbor: [u8; 2],
}

/// Affine map from base UV space into a neighbour's UV space (2x3 matrix).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvMapping {
    /// Rows `[a, b, tx]` and `[c, d, ty]`.
    pub matrix: [[f32; 3]; 2],
}

impl UvMapping {
    /// The identity map.
    pub const IDENTITY: Self = Self {
        matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    };

    /// Applies the map.
    #[inline]
    #[must_use]
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        let [r0, r1] = self.matrix;
        Vec2::new(
            r0[0] * uv.x + r0[1] * uv.y + r0[2],
            r1[0] * uv.x + r1[1] * uv.y + r1[2],
        )
    }
}

/// Finds the edge two quads share, if any.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn shared_edge(base: &Quad, neighbor: &Quad) -> Option<SharedEdge> {
    let find = |point: [i32; 3]| neighbor.corners.iter().position(|&c| c == point);
    for i in 0..4 {
        let j = (i + 1) % 4;
        let (Some(ni), Some(nj)) = (find(base.corners[i]), find(base.corners[j])) else {
            continue;
        };
        if (ni + 1) % 4 == nj || (nj + 1) % 4 == ni {
            return Some(SharedEdge {
                base: [i as u8, j as u8],
                neighbor: [ni as u8, nj as u8],
            });
        }
    }
    None
}

/// Map that continues the neighbour's texture across `edge` onto the base.
///
/// The shared edge maps onto itself; the base's inward direction maps onto
/// the neighbour's outward direction.
#[must_use]
pub fn mapping_for_edge(edge: SharedEdge) -> UvMapping {
    let center = Vec2::new(0.5, 0.5);
    let uv = |i: u8| CORNER_UVS[usize::from(i)];

    let (a, b) = (uv(edge.base[0]), uv(edge.base[1]));
    let e = b - a;
    let inward = perpendicular_towards(e, center - a);

    let (na, nb) = (uv(edge.neighbor[0]), uv(edge.neighbor[1]));
    let e2 = nb - na;
    let outward = perpendicular_towards(e2, center - na) * -1.0;

    // L = e2 * e^T + outward * inward^T; e and inward are orthonormal.
    let l00 = e2.x * e.x + outward.x * inward.x;
    let l01 = e2.x * e.y + outward.x * inward.y;
    let l10 = e2.y * e.x + outward.y * inward.x;
    let l11 = e2.y * e.y + outward.y * inward.y;
    let tx = na.x - (l00 * a.x + l01 * a.y);
    let ty = na.y - (l10 * a.x + l11 * a.y);

    UvMapping {
        matrix: [[l00, l01, tx], [l10, l11, ty]],
    }
}

/// Unit perpendicular of `edge` on the side `towards` points to.
fn perpendicular_towards(edge: Vec2, towards: Vec2) -> Vec2 {
    let perp = Vec2::new(-edge.y, edge.x);
    if perp.dot(towards) >= 0.0 {
        perp
    } else {
        perp * -1.0
    }
}

/// UV mapping that lays `neighbor`'s texture over `base`.
///
/// `None` when the quads do not share an edge.
#[must_use]
pub fn resolve_layer_uv(base: &Quad, neighbor: &Quad) -> Option<UvMapping> {
    shared_edge(base, neighbor).map(mapping_for_edge)
}

/// Memoized [`mapping_for_edge`].
///
/// The map depends only on which corner indices meet, so there are at most
/// a few dozen distinct entries.
#[derive(Debug, Default)]
pub struct UvCache {
    mappings: Mutex<HashMap<SharedEdge, UvMapping>>,
}

impl UvCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`resolve_layer_uv`].
    #[must_use]
    pub fn resolve(&self, base: &Quad, neighbor: &Quad) -> Option<UvMapping> {
        let edge = shared_edge(base, neighbor)?;
        let mut mappings = self.mappings.lock();
        Some(*mappings.entry(edge).or_insert_with(|| mapping_for_edge(edge)))
    }

    /// Number of distinct mappings seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.lock().len()
    }

    /// True if nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.lock().is_empty()
    }
}
