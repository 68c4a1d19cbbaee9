//! Triangle numerics shared by mesh shapes and triangulated CSG shapes.

use rayon::prelude::*;
use solidkit_math::{scale_components, Point3, Vec3};

use crate::bbox::BoundingBox;
use crate::error::{Result, ShapeError};
use crate::track::TrackDirection;

/// Padding added on each side of a zero-width bounding-box axis.
pub const THIN_AXIS_PAD: f64 = 1e-5;

/// Meshes with more triangles than this are summed in parallel.
const PARALLEL_TRIANGLES: usize = 4096;

/// Resolve a triangle's vertex indices.
pub fn triangle_vertices(vertices: &[Point3], triangle: &[u32; 3]) -> Option<[Point3; 3]> {
    Some([
        *vertices.get(triangle[0] as usize)?,
        *vertices.get(triangle[1] as usize)?,
        *vertices.get(triangle[2] as usize)?,
    ])
}

/// Signed solid angle of triangle `abc` seen from `observer`.
///
/// Van Oosterom and Strackee. A triangle wound anticlockwise when seen
/// from the observer gives a negative value. Zero when the observer lies
/// in the triangle's plane with a vanishing denominator.
pub fn triangle_solid_angle(a: &Point3, b: &Point3, c: &Point3, observer: &Point3) -> f64 {
    let ao = a - observer;
    let bo = b - observer;
    let co = c - observer;
    let (mod_ao, mod_bo, mod_co) = (ao.norm(), bo.norm(), co.norm());
    let triple = ao.dot(&bo.cross(&co));
    let denom = mod_ao * mod_bo * mod_co
        + mod_co * ao.dot(&bo)
        + mod_bo * ao.dot(&co)
        + mod_ao * bo.dot(&co);
    if denom == 0.0 {
        return 0.0;
    }
    2.0 * triple.atan2(denom)
}

fn signed_sums<I>(observer: &Point3, triangles: I) -> (f64, f64)
where
    I: Iterator<Item = [Point3; 3]>,
{
    triangles.fold((0.0, 0.0), |(pos, neg), [a, b, c]| {
        let sa = triangle_solid_angle(&a, &b, &c, observer);
        if sa > 0.0 {
            (pos + sa, neg)
        } else {
            (pos, neg + sa)
        }
    })
}

/// Solid angle of a closed triangle mesh.
///
/// Positive and negative triangle contributions are summed separately and
/// averaged, so a mesh with mixed winding still gives a sensible answer.
pub fn solid_angle(observer: &Point3, vertices: &[Point3], triangles: &[[u32; 3]]) -> f64 {
    let (pos, neg) = if triangles.len() > PARALLEL_TRIANGLES {
        triangles
            .par_chunks(PARALLEL_TRIANGLES)
            .map(|chunk| {
                signed_sums(
                    observer,
                    chunk.iter().filter_map(|t| triangle_vertices(vertices, t)),
                )
            })
            .reduce(|| (0.0, 0.0), |(p1, n1), (p2, n2)| (p1 + p2, n1 + n2))
    } else {
        signed_sums(
            observer,
            triangles.iter().filter_map(|t| triangle_vertices(vertices, t)),
        )
    };
    0.5 * (pos - neg)
}

/// Solid angle of the mesh with every vertex scaled component-wise.
pub fn solid_angle_scaled(
    observer: &Point3,
    vertices: &[Point3],
    triangles: &[[u32; 3]],
    scale: &Vec3,
) -> f64 {
    let scaled: Vec<Point3> = vertices
        .iter()
        .map(|v| Point3::from(scale_components(&v.coords, scale)))
        .collect();
    solid_angle(observer, &scaled, triangles)
}

/// Moller-Trumbore ray/triangle intersection.
///
/// Returns the hit point and whether the ray enters or leaves, assuming
/// triangles are wound anticlockwise seen from outside. Rays (nearly)
/// parallel to the triangle's plane never hit.
pub fn ray_intersects_triangle(
    start: &Point3,
    direction: &Vec3,
    v1: &Point3,
    v2: &Point3,
    v3: &Point3,
) -> Option<(Point3, TrackDirection)> {
    let edge1 = v2 - v1;
    let edge2 = v3 - v1;
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    let eps = 1e-7 * edge1.norm();
    if a > -eps && a < eps {
        return None;
    }
    let f = 1.0 / a;
    let s = start - v1;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(&q);
    if t < -eps {
        return None;
    }
    let point = start + direction * t;
    let normal = edge1.cross(&edge2);
    let flag = if normal.dot(direction) > 0.0 {
        TrackDirection::Leaving
    } else {
        TrackDirection::Entering
    };
    Some((point, flag))
}

/// Every crossing of the ray with the mesh, in triangle order.
pub fn intersections(
    start: &Point3,
    direction: &Vec3,
    vertices: &[Point3],
    triangles: &[[u32; 3]],
) -> Vec<(Point3, TrackDirection)> {
    triangles
        .iter()
        .filter_map(|t| triangle_vertices(vertices, t))
        .filter_map(|[a, b, c]| ray_intersects_triangle(start, direction, &a, &b, &c))
        .collect()
}

/// Axis-aligned box around a vertex set; null for no vertices.
///
/// Zero-width axes are padded by [`THIN_AXIS_PAD`] on each side.
pub fn vertex_bounding_box(vertices: &[Point3]) -> BoundingBox {
    let Some(mut bounds) = solidkit_math::Bounds::enclosing(vertices.iter()) else {
        return BoundingBox::null();
    };
    for i in 0..3 {
        if bounds.max[i] - bounds.min[i] <= 0.0 {
            bounds.min[i] -= THIN_AXIS_PAD;
            bounds.max[i] += THIN_AXIS_PAD;
        }
    }
    BoundingBox::from_bounds(&bounds).unwrap_or_default()
}

/// Fail if a vertex count cannot be addressed by `u32` triangle indices.
pub fn check_vertex_limit(count: usize) -> Result<()> {
    if count > u32::MAX as usize {
        return Err(ShapeError::InvalidArgument(format!(
            "{count} vertices exceed the u32 index limit"
        )));
    }
    Ok(())
}

/// Signed volume of a closed triangle mesh, using `centre` as the common
/// apex of the tetrahedra.
pub fn signed_volume(centre: &Point3, vertices: &[Point3], triangles: &[[u32; 3]]) -> f64 {
    let six_v: f64 = triangles
        .iter()
        .filter_map(|t| triangle_vertices(vertices, t))
        .map(|[v1, v2, v3]| {
            let (a, b, c) = (v1 - centre, v2 - centre, v3 - centre);
            a.dot(&b.cross(&c))
        })
        .sum();
    six_v / 6.0
}
