//! Closed triangulations of canonical shapes.
//!
//! Every triangle is wound anticlockwise when seen from outside, so the
//! mesh numerics in [`crate::mesh_common`] give entry/exit flags, solid
//! angles and signed volumes with the usual signs.

use std::f64::consts::PI;

use solidkit_math::{orthonormal_basis, Point3, Vec3};

use crate::settings::TessellationParams;
use crate::shape_info::ShapeInfo;

/// Vertex and triangle buffers of a closed surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<[u32; 3]>,
}

impl Triangulation {
    /// Create an empty triangulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Flat `[x0, y0, z0, x1, ...]` vertex coordinates.
    pub fn vertex_coordinates(&self) -> Vec<f64> {
        self.vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Flat `[i0, i1, i2, ...]` triangle indices.
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    fn push(&mut self, p: Point3) -> u32 {
        self.vertices.push(p);
        (self.vertices.len() - 1) as u32
    }

    fn ring(&mut self, centre: &Point3, u: &Vec3, v: &Vec3, radius: f64, segments: usize) -> Vec<u32> {
        (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * (i as f64 / segments as f64);
                self.push(centre + radius * (angle.cos() * u + angle.sin() * v))
            })
            .collect()
    }

    /// Reverse the winding of every triangle.
    pub fn flip(&mut self) {
        for t in &mut self.triangles {
            t.swap(1, 2);
        }
    }
}

/// Triangulate a canonical shape.
pub fn triangulate(info: &ShapeInfo, params: &TessellationParams) -> Triangulation {
    let n = params.circle_segments.max(3) as usize;
    match info {
        ShapeInfo::Cuboid { .. } => cuboid(info),
        ShapeInfo::Sphere { centre, radius } => {
            sphere(centre, *radius, n, params.latitude_segments.max(2) as usize)
        }
        ShapeInfo::Cylinder {
            centre_of_bottom_base,
            axis,
            radius,
            height,
        } => cylinder(centre_of_bottom_base, axis, *radius, *height, n),
        ShapeInfo::HollowCylinder {
            centre_of_bottom_base,
            axis,
            inner_radius,
            radius,
            height,
        } => hollow_cylinder(centre_of_bottom_base, axis, *inner_radius, *radius, *height, n),
        ShapeInfo::Cone {
            tip,
            axis,
            radius,
            height,
        } => cone(tip, axis, *radius, *height, n),
    }
}

fn cuboid(info: &ShapeInfo) -> Triangulation {
    let (Some(corners), Some([w, d, h])) = (info.cuboid_corners(), info.cuboid_edges()) else {
        return Triangulation::new();
    };
    // Corner bits: 1 = width, 2 = depth, 4 = height.
    let mut t = Triangulation {
        vertices: corners.to_vec(),
        triangles: vec![
            [0, 2, 1],
            [1, 2, 3],
            [4, 5, 6],
            [5, 7, 6],
            [0, 1, 5],
            [0, 5, 4],
            [2, 6, 7],
            [2, 7, 3],
            [0, 4, 6],
            [0, 6, 2],
            [1, 3, 7],
            [1, 7, 5],
        ],
    };
    if w.cross(&d).dot(&h) < 0.0 {
        t.flip();
    }
    t
}

fn sphere(centre: &Point3, radius: f64, n_lon: usize, n_lat: usize) -> Triangulation {
    let mut t = Triangulation::new();
    let south = t.push(centre - radius * Vec3::z());
    let mut bands = Vec::with_capacity(n_lat - 1);
    for j in 1..n_lat {
        let lat = -PI / 2.0 + PI * (j as f64 / n_lat as f64);
        let ring_centre = centre + radius * lat.sin() * Vec3::z();
        bands.push(t.ring(&ring_centre, &Vec3::x(), &Vec3::y(), radius * lat.cos(), n_lon));
    }
    let north = t.push(centre + radius * Vec3::z());

    let first = &bands[0];
    for i in 0..n_lon {
        t.triangles.push([south, first[(i + 1) % n_lon], first[i]]);
    }
    for pair in bands.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        for i in 0..n_lon {
            let j = (i + 1) % n_lon;
            t.triangles.push([lo[i], lo[j], hi[j]]);
            t.triangles.push([lo[i], hi[j], hi[i]]);
        }
    }
    let last = &bands[bands.len() - 1];
    for i in 0..n_lon {
        t.triangles.push([north, last[i], last[(i + 1) % n_lon]]);
    }
    t
}

/// Side quads between two rings, facing away from the axis unless
/// `inward`.
fn side(t: &mut Triangulation, lo: &[u32], hi: &[u32], inward: bool) {
    let n = lo.len();
    for i in 0..n {
        let j = (i + 1) % n;
        if inward {
            t.triangles.push([lo[i], hi[j], lo[j]]);
            t.triangles.push([lo[i], hi[i], hi[j]]);
        } else {
            t.triangles.push([lo[i], lo[j], hi[j]]);
            t.triangles.push([lo[i], hi[j], hi[i]]);
        }
    }
}

/// Disc fan facing along `+axis` unless `down`.
fn cap(t: &mut Triangulation, centre: u32, ring: &[u32], down: bool) {
    let n = ring.len();
    for i in 0..n {
        let j = (i + 1) % n;
        if down {
            t.triangles.push([centre, ring[j], ring[i]]);
        } else {
            t.triangles.push([centre, ring[i], ring[j]]);
        }
    }
}

/// Annulus between two rings facing along `+axis` unless `down`.
fn annulus(t: &mut Triangulation, inner: &[u32], outer: &[u32], down: bool) {
    let n = inner.len();
    for i in 0..n {
        let j = (i + 1) % n;
        if down {
            t.triangles.push([inner[i], outer[j], outer[i]]);
            t.triangles.push([inner[i], inner[j], outer[j]]);
        } else {
            t.triangles.push([inner[i], outer[i], outer[j]]);
            t.triangles.push([inner[i], outer[j], inner[j]]);
        }
    }
}

fn cylinder(base: &Point3, axis: &Vec3, radius: f64, height: f64, n: usize) -> Triangulation {
    let (u, v) = orthonormal_basis(axis);
    let top = base + axis * height;
    let mut t = Triangulation::new();
    let lo = t.ring(base, &u, &v, radius, n);
    let hi = t.ring(&top, &u, &v, radius, n);
    let cb = t.push(*base);
    let ct = t.push(top);
    side(&mut t, &lo, &hi, false);
    cap(&mut t, cb, &lo, true);
    cap(&mut t, ct, &hi, false);
    t
}

fn hollow_cylinder(
    base: &Point3,
    axis: &Vec3,
    inner_radius: f64,
    radius: f64,
    height: f64,
    n: usize,
) -> Triangulation {
    let (u, v) = orthonormal_basis(axis);
    let top = base + axis * height;
    let mut t = Triangulation::new();
    let outer_lo = t.ring(base, &u, &v, radius, n);
    let outer_hi = t.ring(&top, &u, &v, radius, n);
    let inner_lo = t.ring(base, &u, &v, inner_radius, n);
    let inner_hi = t.ring(&top, &u, &v, inner_radius, n);
    side(&mut t, &outer_lo, &outer_hi, false);
    side(&mut t, &inner_lo, &inner_hi, true);
    annulus(&mut t, &inner_lo, &outer_lo, true);
    annulus(&mut t, &inner_hi, &outer_hi, false);
    t
}

fn cone(tip: &Point3, axis: &Vec3, radius: f64, height: f64, n: usize) -> Triangulation {
    let (u, v) = orthonormal_basis(axis);
    let base = tip + axis * height;
    let mut t = Triangulation::new();
    let ring = t.ring(&base, &u, &v, radius, n);
    let apex = t.push(*tip);
    let centre = t.push(base);
    for i in 0..n {
        t.triangles.push([apex, ring[(i + 1) % n], ring[i]]);
    }
    cap(&mut t, centre, &ring, false);
    t
}
