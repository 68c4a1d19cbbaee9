//! Random points inside shapes.
//!
//! Closed-form samplers exist for the canonical primitives; anything else
//! is sampled by rejection from a bounding box.

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use solidkit_math::{orthonormal_basis, Point3, Vec3};

use crate::bbox::BoundingBox;
use crate::shape::Shape;
use crate::shape_info::ShapeInfo;

/// Uniform point in the parallelepiped spanned by `edges` from `origin`.
pub fn in_cuboid(origin: &Point3, edges: &[Vec3; 3], rng: &mut dyn RngCore) -> Point3 {
    let (r1, r2, r3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
    origin + edges[0] * r1 + edges[1] * r2 + edges[2] * r3
}

/// Uniform point in a solid cylinder.
pub fn in_cylinder(base: &Point3, axis: &Vec3, radius: f64, height: f64, rng: &mut dyn RngCore) -> Point3 {
    in_hollow_cylinder(base, axis, 0.0, radius, height, rng)
}

/// Uniform point in a cylindrical shell.
///
/// The radius is drawn so that its density grows linearly with `r`.
pub fn in_hollow_cylinder(
    base: &Point3,
    axis: &Vec3,
    inner_radius: f64,
    radius: f64,
    height: f64,
    rng: &mut dyn RngCore,
) -> Point3 {
    let (r1, r2, r3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
    let polar = 2.0 * PI * r1;
    let (c1, c2) = (inner_radius * inner_radius, radius * radius);
    let r = (c1 + (c2 - c1) * r2).sqrt();
    let z = height * r3;
    let (u, v) = orthonormal_basis(axis);
    base + u * (r * polar.cos()) + v * (r * polar.sin()) + axis * z
}

/// Uniform point in a ball.
pub fn in_sphere(centre: &Point3, radius: f64, rng: &mut dyn RngCore) -> Point3 {
    let (r1, r2, r3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
    let azimuthal = 2.0 * PI * r1;
    let polar = (2.0 * r2 - 1.0).acos();
    let r = radius * r3.cbrt();
    centre
        + Vec3::new(
            r * polar.sin() * azimuthal.cos(),
            r * polar.sin() * azimuthal.sin(),
            r * polar.cos(),
        )
}

/// One closed-form sample from a canonical shape; `None` for shapes with
/// no direct sampler.
pub fn in_shape(info: &ShapeInfo, rng: &mut dyn RngCore) -> Option<Point3> {
    match info {
        ShapeInfo::Cuboid {
            left_front_bottom, ..
        } => {
            let edges = info.cuboid_edges()?;
            Some(in_cuboid(left_front_bottom, &edges, rng))
        }
        ShapeInfo::Sphere { centre, radius } => Some(in_sphere(centre, *radius, rng)),
        ShapeInfo::Cylinder {
            centre_of_bottom_base,
            axis,
            radius,
            height,
        } => Some(in_cylinder(centre_of_bottom_base, axis, *radius, *height, rng)),
        ShapeInfo::HollowCylinder {
            centre_of_bottom_base,
            axis,
            inner_radius,
            radius,
            height,
        } => Some(in_hollow_cylinder(
            centre_of_bottom_base,
            axis,
            *inner_radius,
            *radius,
            *height,
            rng,
        )),
        ShapeInfo::Cone { .. } => None,
    }
}

/// Closed-form samples restricted to `region`, also checked against the
/// shape itself.
pub fn bounded_canonical<S: Shape + ?Sized>(
    shape: &S,
    info: &ShapeInfo,
    rng: &mut dyn RngCore,
    region: &BoundingBox,
    max_attempts: usize,
) -> Option<Point3> {
    for _ in 0..max_attempts {
        let p = in_shape(info, rng)?;
        if region.is_point_inside(&p) && shape.is_valid(&p) {
            return Some(p);
        }
    }
    None
}

/// Rejection sampling: uniform points in `region` until one is inside
/// `shape`.
pub fn bounded<S: Shape + ?Sized>(
    shape: &S,
    rng: &mut dyn RngCore,
    region: &BoundingBox,
    max_attempts: usize,
) -> Option<Point3> {
    if region.is_null() {
        return None;
    }
    for _ in 0..max_attempts {
        let (r1, r2, r3): (f64, f64, f64) = (rng.gen(), rng.gen(), rng.gen());
        let p = region.generate_point_inside(r1, r2, r3);
        if shape.is_valid(&p) {
            return Some(p);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_cuboid_samples_stay_inside() {
        let mut rng = Pcg64::seed_from_u64(1);
        let edges = [Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 3.0)];
        for _ in 0..1000 {
            let p = in_cuboid(&Point3::new(1.0, 1.0, 1.0), &edges, &mut rng);
            assert!((1.0..=3.0).contains(&p.x));
            assert!((1.0..=2.0).contains(&p.y));
            assert!((1.0..=4.0).contains(&p.z));
        }
    }

    #[test]
    fn test_hollow_cylinder_samples_in_shell() {
        let mut rng = Pcg64::seed_from_u64(2);
        let axis = Vec3::new(1.0, 1.0, 0.0).normalize();
        let base = Point3::new(0.0, 0.0, 5.0);
        for _ in 0..1000 {
            let p = in_hollow_cylinder(&base, &axis, 1.0, 2.0, 3.0, &mut rng);
            let d = p - base;
            let h = d.dot(&axis);
            let rho = (d - h * axis).norm();
            assert!((-1e-12..=3.0 + 1e-12).contains(&h));
            assert!(rho >= 1.0 - 1e-12 && rho <= 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_cylinder_radial_density_is_uniform_in_area() {
        let mut rng = Pcg64::seed_from_u64(3);
        let n = 20_000;
        let inside_half = (0..n)
            .map(|_| in_cylinder(&Point3::origin(), &Vec3::z(), 1.0, 1.0, &mut rng))
            .filter(|p| p.coords.xy().norm() < 0.5)
            .count();
        // A quarter of the disc area lies within half the radius.
        let frac = inside_half as f64 / n as f64;
        assert!((frac - 0.25).abs() < 0.02, "{frac}");
    }

    #[test]
    fn test_sphere_samples_uniform_in_volume() {
        let mut rng = Pcg64::seed_from_u64(4);
        let n = 20_000;
        let centre = Point3::new(1.0, -1.0, 2.0);
        let mut inner = 0;
        for _ in 0..n {
            let p = in_sphere(&centre, 2.0, &mut rng);
            let r = (p - centre).norm();
            assert!(r <= 2.0 + 1e-12);
            if r < 1.0 {
                inner += 1;
            }
        }
        let frac = inner as f64 / n as f64;
        assert!((frac - 0.125).abs() < 0.015, "{frac}");
    }

    #[test]
    fn test_cone_has_no_closed_form() {
        let mut rng = Pcg64::seed_from_u64(5);
        let cone = ShapeInfo::Cone {
            tip: Point3::origin(),
            axis: Vec3::z(),
            radius: 1.0,
            height: 1.0,
        };
        assert!(in_shape(&cone, &mut rng).is_none());
    }
}
