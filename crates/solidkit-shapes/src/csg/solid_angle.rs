//! Solid angle of CSG solids.
//!
//! Spheres use the closed form unless scaled unevenly. Cuboids, cylinders and cones are
//! triangulated on the fly. Anything else sums its triangulation when it
//! has a small one and otherwise integrates over directions by casting
//! rays.

use std::f64::consts::PI;

use solidkit_math::{orthonormal_basis, scale_components, Point3, Tolerance, Vec3};

use super::CsgObject;
use crate::bbox::BoundingBox;
use crate::mesh_common;
use crate::settings::{
    SolidAngleParams, TessellationParams, MAX_TRIANGLES_FOR_SOLID_ANGLE, RAY_TRACE_MIN_PHI_STEPS,
    RAY_TRACE_RESOLUTION_WITHOUT_BOX, RAY_TRACE_RESOLUTION_WITH_BOX,
};
use crate::shape::Shape;
use crate::shape_info::ShapeInfo;
use crate::tessellate::triangulate;
use crate::track::Track;

/// Ray-trace passes with fewer hits than this are repeated at a finer
/// resolution.
const MIN_RAY_TRACE_HITS: usize = 10;

/// Resolution multiplier for the repeated pass.
const REFINE_FACTOR: usize = 4;

fn scaled(p: &Point3, scale: Option<&Vec3>) -> Point3 {
    match scale {
        Some(s) => Point3::from(scale_components(&p.coords, s)),
        None => *p,
    }
}

fn unscaled(p: &Point3, scale: Option<&Vec3>) -> Point3 {
    match scale {
        Some(s) => Point3::from(p.coords.component_div(s)),
        None => *p,
    }
}

/// The common magnitude of `s` when all three components agree; a sphere
/// scaled by anything else is an ellipsoid.
fn uniform_factor(s: &Vec3) -> Option<f64> {
    let tol = Tolerance::DEFAULT.linear * s.x.abs().max(1.0);
    ((s.y - s.x).abs() <= tol && (s.z - s.x).abs() <= tol).then(|| s.x.abs())
}

/// Solid angle of a sphere seen from outside.
fn sphere_solid_angle(observer: &Point3, centre: &Point3, radius: f64) -> f64 {
    let d = (observer - centre).norm();
    if d <= radius {
        return if (d - radius).abs() < Tolerance::DEFAULT.linear {
            2.0 * PI
        } else {
            4.0 * PI
        };
    }
    let sin_half = radius / d;
    2.0 * PI * (1.0 - (1.0 - sin_half * sin_half).sqrt())
}

impl CsgObject {
    pub(super) fn solid_angle_at(&self, params: &SolidAngleParams, scale: Option<&Vec3>) -> f64 {
        if scale.is_some_and(|s| s.iter().any(|c| *c == 0.0)) {
            return 0.0;
        }
        let observer = params.observer;
        let local = unscaled(&observer, scale);
        if self.is_valid(&local) {
            return if self.is_on_side(&local) { 2.0 * PI } else { 4.0 * PI };
        }

        if let Some(info) = &self.shape_info {
            if let Some(sa) = self.canonical_solid_angle(info, params, scale) {
                log::debug!("{}: closed-form {} solid angle", self.id, info.kind_name());
                return sa;
            }
        }

        let triangulation = self.triangulation();
        let n = triangulation.num_triangles();
        if n > 0 && n <= MAX_TRIANGLES_FOR_SOLID_ANGLE {
            log::debug!("{}: triangulated solid angle over {n} triangles", self.id);
            return match scale {
                Some(s) => mesh_common::solid_angle_scaled(&observer, &triangulation.vertices, &triangulation.triangles, s),
                None => mesh_common::solid_angle(&observer, &triangulation.vertices, &triangulation.triangles),
            };
        }
        log::debug!("{}: ray-traced solid angle ({n} triangles)", self.id);
        self.ray_trace_solid_angle(&observer, scale)
    }

    fn canonical_solid_angle(&self, info: &ShapeInfo, params: &SolidAngleParams, scale: Option<&Vec3>) -> Option<f64> {
        match info {
            ShapeInfo::Sphere { centre, radius } => {
                let factor = match scale {
                    None => 1.0,
                    Some(s) => uniform_factor(s)?,
                };
                Some(sphere_solid_angle(
                    &params.observer,
                    &scaled(centre, scale),
                    radius * factor,
                ))
            }
            ShapeInfo::Cuboid { .. } | ShapeInfo::Cylinder { .. } | ShapeInfo::Cone { .. } => {
                let tess = TessellationParams {
                    circle_segments: params.cylinder_slices.max(3) as u32,
                    ..TessellationParams::default()
                };
                let t = triangulate(info, &tess);
                Some(match scale {
                    Some(s) => mesh_common::solid_angle_scaled(&params.observer, &t.vertices, &t.triangles, s),
                    None => mesh_common::solid_angle(&params.observer, &t.vertices, &t.triangles),
                })
            }
            ShapeInfo::HollowCylinder { .. } => None,
        }
    }

    /// Whether the ray from `observer` along `dir` passes through the
    /// (scaled) solid.
    fn ray_hits(&self, observer: &Point3, dir: &Vec3, scale: Option<&Vec3>, prefilter: &BoundingBox) -> bool {
        let start = unscaled(observer, scale);
        let dir = match scale {
            Some(s) => dir.component_div(s),
            None => *dir,
        };
        if !prefilter.is_null() && !prefilter.does_line_intersect(&start, &dir) {
            return false;
        }
        match Track::new(start, dir) {
            Ok(mut track) => self.intercept_surface(&mut track) > 0,
            Err(_) => false,
        }
    }

    /// Double integral over directions around `axis` out to `theta_max`.
    ///
    /// Returns the solid angle and the number of rays that hit.
    fn integrate_rays(
        &self,
        observer: &Point3,
        axis: &Vec3,
        theta_max: f64,
        resolution: usize,
        scale: Option<&Vec3>,
        prefilter: &BoundingBox,
    ) -> (f64, usize) {
        let (u, v) = orthonormal_basis(axis);
        let dtheta = theta_max / resolution as f64;
        let mut sum = 0.0;
        let mut hits = 0;
        for i in 0..resolution {
            let theta = (i as f64 + 0.5) * dtheta;
            let (st, ct) = theta.sin_cos();
            let n_phi = ((resolution as f64 * st).ceil() as usize).max(RAY_TRACE_MIN_PHI_STEPS);
            let dphi = 2.0 * PI / n_phi as f64;
            for j in 0..n_phi {
                let (sp, cp) = ((j as f64 + 0.5) * dphi).sin_cos();
                let dir = st * cp * u + st * sp * v + ct * axis;
                if self.ray_hits(observer, &dir, scale, prefilter) {
                    sum += dtheta * dphi * st;
                    hits += 1;
                }
            }
        }
        (sum, hits)
    }

    fn ray_trace_solid_angle(&self, observer: &Point3, scale: Option<&Vec3>) -> f64 {
        let bbox = self.bounding_box();
        let view_box = match scale {
            Some(_) => {
                let corners = bbox.corners().map(|c| scaled(&c, scale));
                solidkit_math::Bounds::enclosing(corners.iter())
                    .and_then(|b| BoundingBox::from_bounds(&b))
                    .unwrap_or_default()
            }
            None => bbox,
        };

        let use_box = !view_box.is_null() && !view_box.is_point_inside(observer);
        let (axis, theta_max, resolution) = if use_box {
            (
                view_box.centre_point() - observer,
                view_box.angular_width(observer).min(PI),
                RAY_TRACE_RESOLUTION_WITH_BOX,
            )
        } else {
            let axis = self
                .point_in_object()
                .map(|p| scaled(&p, scale) - observer)
                .unwrap_or_else(Vec3::z);
            (axis, PI, RAY_TRACE_RESOLUTION_WITHOUT_BOX)
        };
        let axis = axis.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::z);

        let (sum, hits) = self.integrate_rays(observer, &axis, theta_max, resolution, scale, &bbox);
        if hits >= MIN_RAY_TRACE_HITS {
            return sum;
        }
        log::debug!("{}: {hits} ray hits, refining", self.id);
        let (sum, _) = self.integrate_rays(
            observer,
            &axis,
            theta_max,
            resolution * REFINE_FACTOR,
            scale,
            &bbox,
        );
        sum
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use solidkit_math::{Point3, Vec3};
    use solidkit_surfaces::{Sphere, Surface, SurfaceMap};

    use super::sphere_solid_angle;
    use crate::csg::CsgObject;
    use crate::factory;
    use crate::settings::SolidAngleParams;
    use crate::shape::Shape;

    fn rectangle(a: f64, b: f64, d: f64) -> f64 {
        4.0 * (a * b / ((a * a + 4.0 * d * d) * (b * b + 4.0 * d * d)).sqrt()).asin()
    }

    fn disc(r: f64, d: f64) -> f64 {
        2.0 * PI * (1.0 - d / (d * d + r * r).sqrt())
    }

    fn plain_sphere(radius: f64) -> CsgObject {
        let mut map = SurfaceMap::new();
        map.insert(1, Arc::new(Sphere::new(Point3::origin(), radius).unwrap()) as Arc<dyn Surface>);
        CsgObject::new("-1", &map).unwrap()
    }

    #[test]
    fn test_inside_and_on_surface() {
        let cube = factory::make_centred_cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(cube.solid_angle(&SolidAngleParams::new(Point3::origin())), 4.0 * PI);
        assert_eq!(
            cube.solid_angle(&SolidAngleParams::new(Point3::new(0.5, 0.0, 0.0))),
            2.0 * PI
        );
    }

    #[test]
    fn test_sphere_closed_form() {
        let sphere = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let sa = sphere.solid_angle(&SolidAngleParams::new(Point3::new(0.0, 0.0, 2.0)));
        // Half-angle 30 degrees.
        assert_relative_eq!(sa, 2.0 * PI * (1.0 - 0.75_f64.sqrt()), epsilon = 1e-12);
        assert_eq!(sphere_solid_angle(&Point3::origin(), &Point3::origin(), 1.0), 4.0 * PI);
    }

    #[test]
    fn test_cuboid_face_on() {
        let cube = factory::make_centred_cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let sa = cube.solid_angle(&SolidAngleParams::new(Point3::new(0.0, 0.0, 10.0)));
        assert_relative_eq!(sa, rectangle(1.0, 1.0, 9.5), max_relative = 1e-9);
    }

    #[test]
    fn test_scaled_cuboid() {
        let cube = factory::make_centred_cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let params = SolidAngleParams::new(Point3::new(0.0, 0.0, 10.0));
        let sa = cube.solid_angle_scaled(&params, &Vec3::new(2.0, 2.0, 1.0));
        assert_relative_eq!(sa, rectangle(2.0, 2.0, 9.5), max_relative = 1e-9);
        assert_eq!(cube.solid_angle_scaled(&params, &Vec3::new(0.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_cylinder_side_on() {
        let cyl = factory::make_cylinder(Point3::new(0.0, 0.0, -1.0), Vec3::z(), 1.0, 2.0).unwrap();
        let params = SolidAngleParams::new(Point3::new(100.0, 0.0, 0.0)).with_cylinder_slices(64);
        let sa = cyl.solid_angle(&params);
        // Far away the cylinder looks like a 2 x 2 rectangle.
        assert_relative_eq!(sa, rectangle(2.0, 2.0, 99.5), max_relative = 1.5e-2);
    }

    #[test]
    fn test_ray_traced_sphere() {
        let sphere = plain_sphere(1.0);
        assert_eq!(sphere.number_of_triangles(), 0);
        let observer = Point3::new(0.0, 0.0, 5.0);
        let sa = sphere.solid_angle(&SolidAngleParams::new(observer));
        let exact = sphere_solid_angle(&observer, &Point3::origin(), 1.0);
        assert_relative_eq!(sa, exact, max_relative = 3e-2);
    }

    #[test]
    fn test_ray_traced_scaled_sphere() {
        let sphere = plain_sphere(1.0);
        let observer = Point3::new(0.0, 0.0, 10.0);
        let sa = sphere.solid_angle_scaled(&SolidAngleParams::new(observer), &Vec3::new(2.0, 2.0, 2.0));
        let exact = sphere_solid_angle(&observer, &Point3::origin(), 2.0);
        assert_relative_eq!(sa, exact, max_relative = 3e-2);
    }

    #[test]
    fn test_uniformly_scaled_factory_sphere_matches_rule_sphere() {
        let canonical = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let plain = plain_sphere(1.0);
        let observer = Point3::new(0.0, 0.0, 10.0);
        let params = SolidAngleParams::new(observer);
        let scale = Vec3::new(2.0, 2.0, 2.0);

        let sa = canonical.solid_angle_scaled(&params, &scale);
        assert_relative_eq!(sa, 2.0 * PI * (1.0 - 0.96_f64.sqrt()), max_relative = 1e-12);
        assert_relative_eq!(sa, plain.solid_angle_scaled(&params, &scale), max_relative = 3e-2);
        assert!(sa > 3.0 * canonical.solid_angle(&params));
    }

    #[test]
    fn test_unevenly_scaled_sphere_is_an_ellipsoid() {
        let canonical = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let plain = plain_sphere(1.0);
        let params = SolidAngleParams::new(Point3::new(0.0, 0.0, 10.0));
        let scale = Vec3::new(2.0, 2.0, 1.0);

        let sa = canonical.solid_angle_scaled(&params, &scale);
        // The tangent cone from the observer touches the ellipsoid at z = 0.1.
        let outline = 2.0 * PI * (1.0 - (99.0_f64 / 103.0).sqrt());
        assert_relative_eq!(sa, outline, max_relative = 5e-2);
        assert_relative_eq!(sa, plain.solid_angle_scaled(&params, &scale), max_relative = 5e-2);
    }

    #[test]
    fn test_cone_seen_from_base_side() {
        let cone = factory::make_cone(Point3::origin(), Vec3::z(), 1.0, 1.0).unwrap();
        let params = SolidAngleParams::new(Point3::new(0.0, 0.0, 100.0)).with_cylinder_slices(128);
        assert_relative_eq!(cone.solid_angle(&params), disc(1.0, 99.0), max_relative = 2e-3);
    }

    #[test]
    fn test_cone_seen_from_apex_side() {
        let cone = factory::make_cone(Point3::origin(), Vec3::z(), 1.0, 1.0).unwrap();
        let params = SolidAngleParams::new(Point3::new(0.0, 0.0, -100.0)).with_cylinder_slices(128);
        assert_relative_eq!(cone.solid_angle(&params), disc(1.0, 101.0), max_relative = 2e-3);
    }

    #[test]
    fn test_hollow_cylinder_uses_triangulation() {
        let pipe = factory::make_hollow_cylinder(Point3::origin(), Vec3::z(), 1.0, 2.0, 1.0).unwrap();
        let inside = pipe.solid_angle(&SolidAngleParams::new(Point3::new(1.5, 0.0, 0.5)));
        assert_eq!(inside, 4.0 * PI);
        let far = pipe.solid_angle(&SolidAngleParams::new(Point3::new(0.0, 0.0, 100.0)));
        let annulus = PI * (4.0 - 1.0) / (99.0 * 99.0);
        assert_relative_eq!(far, annulus, max_relative = 3e-2);
    }
}
