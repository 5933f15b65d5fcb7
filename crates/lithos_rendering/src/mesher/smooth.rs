//! Budgeted Laplacian smoothing and normal averaging.

use lithos_shared::Vec3;

use crate::materials::MaterialTable;
use crate::mesher::graph::MeshGraph;

/// Smoothing budget of each vertex: the smallest `max_smooths` of the
/// materials of the faces touching it.
#[must_use]
pub fn vertex_budgets(graph: &MeshGraph, materials: &MaterialTable) -> Vec<u32> {
    graph
        .vertices
        .iter()
        .map(|vertex| {
            vertex
                .touches
                .iter()
                .map(|&(face, _)| materials.max_smooths(graph.faces[face as usize].tile))
                .min()
                .unwrap_or(0)
        })
        .collect()
}

/// Runs `iterations` smoothing passes.
///
/// Each pass recomputes every face centroid from the previous pass, then
/// moves each vertex still under its budget to the average centroid of its
/// faces. Returns the total number of vertex moves.
#[allow(clippy::cast_precision_loss)]
pub fn smooth(graph: &mut MeshGraph, materials: &MaterialTable, iterations: u32) -> usize {
    let budgets = vertex_budgets(graph, materials);
    let mut moves = 0;

    for _ in 0..iterations {
        let centroids: Vec<Vec3> = graph.faces.iter().map(|f| graph.centroid(f)).collect();
        let targets: Vec<Option<Vec3>> = graph
            .vertices
            .iter()
            .zip(&budgets)
            .map(|(vertex, &budget)| {
                if vertex.smooth_count >= budget || vertex.touches.is_empty() {
                    return None;
                }
                let sum = vertex
                    .touches
                    .iter()
                    .fold(Vec3::ZERO, |acc, &(face, _)| acc + centroids[face as usize]);
                Some(sum * (1.0 / vertex.touches.len() as f32))
            })
            .collect();

        for (vertex, target) in graph.vertices.iter_mut().zip(targets) {
            if let Some(position) = target {
                vertex.position = position;
                vertex.smooth_count += 1;
                moves += 1;
            }
        }
    }
    moves
}

/// Face normals from the smoothed corners, then vertex normals as the
/// normalized sum of the touching face normals.
pub fn compute_normals(graph: &mut MeshGraph) {
    let face_normals: Vec<Vec3> = graph
        .faces
        .iter()
        .map(|face| {
            let [p0, p1, _, p3] = graph.face_positions(face);
            let normal = (p1 - p0).cross(p3 - p0).normalized();
            if normal == Vec3::ZERO {
                face.direction.normal()
            } else {
                normal
            }
        })
        .collect();
    for (face, normal) in graph.faces.iter_mut().zip(&face_normals) {
        face.normal = *normal;
    }

    for vertex in &mut graph.vertices {
        let sum = vertex
            .touches
            .iter()
            .fold(Vec3::ZERO, |acc, &(face, _)| acc + face_normals[face as usize]);
        let normal = sum.normalized();
        vertex.normal = match vertex.touches.first() {
            Some(&(face, _)) if normal == Vec3::ZERO => face_normals[face as usize],
            _ => normal,
        };
    }
}
