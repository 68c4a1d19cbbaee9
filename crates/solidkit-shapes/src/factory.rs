//! Builders for the canonical primitives.
//!
//! Each factory creates the bounding surfaces, the rule joining them and
//! the [`ShapeInfo`] that lets the solid use closed-form algorithms. The
//! stored description is the JSON form of the [`ShapeInfo`].

use std::sync::Arc;

use solidkit_math::{Dir3, Point3, Vec3};
use solidkit_surfaces::{Cone, Cylinder, Plane, Sphere, Surface, SurfaceMap};

use crate::csg::CsgObject;
use crate::error::{Result, ShapeError};
use crate::shape_info::ShapeInfo;

fn unit_axis(axis: Vec3) -> Result<Vec3> {
    Dir3::try_new(axis, 1e-12)
        .map(Dir3::into_inner)
        .ok_or_else(|| ShapeError::DegenerateGeometry("axis has zero length".into()))
}

fn build(info: ShapeInfo, rule: &str, surfaces: Vec<Arc<dyn Surface>>) -> Result<CsgObject> {
    info.validate()?;
    let map: SurfaceMap = (1..).zip(surfaces).collect();
    let description =
        serde_json::to_string(&info).map_err(|e| ShapeError::InvalidArgument(e.to_string()))?;
    Ok(CsgObject::new(rule, &map)?
        .with_name(info.kind_name())
        .with_description(description)
        .with_shape_info(info))
}

/// Planes through `origin` and `origin + c` bounding the slab spanned by
/// `a` and `b`, with normals pointing out of the slab.
fn face_pair(origin: &Point3, a: &Vec3, b: &Vec3, c: &Vec3) -> Result<[Arc<dyn Surface>; 2]> {
    let mut n = a.cross(b);
    if n.dot(c) < 0.0 {
        n = -n;
    }
    let low: Arc<dyn Surface> = Arc::new(Plane::from_point_normal(origin, -n)?);
    let high: Arc<dyn Surface> = Arc::new(Plane::from_point_normal(&(origin + c), n)?);
    Ok([low, high])
}

/// A parallelepiped from one corner and its three neighbours.
pub fn make_cuboid(
    left_front_bottom: Point3,
    left_front_top: Point3,
    left_back_bottom: Point3,
    right_front_bottom: Point3,
) -> Result<CsgObject> {
    let info = ShapeInfo::Cuboid {
        left_front_bottom,
        left_front_top,
        left_back_bottom,
        right_front_bottom,
    };
    info.validate()?;
    let [w, d, h] = info
        .cuboid_edges()
        .ok_or_else(|| ShapeError::DegenerateGeometry("cuboid has no edges".into()))?;
    let o = left_front_bottom;
    let mut surfaces = Vec::with_capacity(6);
    surfaces.extend(face_pair(&o, &d, &h, &w)?);
    surfaces.extend(face_pair(&o, &w, &h, &d)?);
    surfaces.extend(face_pair(&o, &w, &d, &h)?);
    build(info, "-1 -2 -3 -4 -5 -6", surfaces)
}

/// An axis-aligned box of the given `size` centred on `centre`.
pub fn make_centred_cuboid(centre: Point3, size: Vec3) -> Result<CsgObject> {
    let half = size / 2.0;
    let lfb = centre - half;
    make_cuboid(
        lfb,
        lfb + Vec3::new(0.0, 0.0, size.z),
        lfb + Vec3::new(0.0, size.y, 0.0),
        lfb + Vec3::new(size.x, 0.0, 0.0),
    )
}

/// A ball.
pub fn make_sphere(centre: Point3, radius: f64) -> Result<CsgObject> {
    let info = ShapeInfo::Sphere { centre, radius };
    info.validate()?;
    let surface: Arc<dyn Surface> = Arc::new(Sphere::new(centre, radius)?);
    build(info, "-1", vec![surface])
}

/// Axis-normal planes closing a cylinder between `base` and `base + axis * height`.
fn caps(base: &Point3, axis: &Vec3, height: f64) -> Result<[Arc<dyn Surface>; 2]> {
    let bottom: Arc<dyn Surface> = Arc::new(Plane::from_point_normal(base, -axis)?);
    let top: Arc<dyn Surface> = Arc::new(Plane::from_point_normal(&(base + axis * height), *axis)?);
    Ok([bottom, top])
}

/// A solid cylinder standing on `centre_of_bottom_base`.
pub fn make_cylinder(centre_of_bottom_base: Point3, axis: Vec3, radius: f64, height: f64) -> Result<CsgObject> {
    let axis = unit_axis(axis)?;
    let info = ShapeInfo::Cylinder {
        centre_of_bottom_base,
        axis,
        radius,
        height,
    };
    info.validate()?;
    let [bottom, top] = caps(&centre_of_bottom_base, &axis, height)?;
    let side: Arc<dyn Surface> = Arc::new(Cylinder::new(centre_of_bottom_base, axis, radius)?);
    build(info, "-1 -2 -3", vec![side, bottom, top])
}

/// A cylindrical shell standing on `centre_of_bottom_base`.
pub fn make_hollow_cylinder(
    centre_of_bottom_base: Point3,
    axis: Vec3,
    inner_radius: f64,
    radius: f64,
    height: f64,
) -> Result<CsgObject> {
    let axis = unit_axis(axis)?;
    let info = ShapeInfo::HollowCylinder {
        centre_of_bottom_base,
        axis,
        inner_radius,
        radius,
        height,
    };
    info.validate()?;
    let [bottom, top] = caps(&centre_of_bottom_base, &axis, height)?;
    let outer: Arc<dyn Surface> = Arc::new(Cylinder::new(centre_of_bottom_base, axis, radius)?);
    let inner: Arc<dyn Surface> = Arc::new(Cylinder::new(centre_of_bottom_base, axis, inner_radius)?);
    build(info, "-1 2 -3 -4", vec![outer, inner, bottom, top])
}

/// A solid cone with its apex at `tip`, opening along `axis` to a base of
/// `radius` at distance `height`.
pub fn make_cone(tip: Point3, axis: Vec3, radius: f64, height: f64) -> Result<CsgObject> {
    let axis = unit_axis(axis)?;
    let info = ShapeInfo::Cone {
        tip,
        axis,
        radius,
        height,
    };
    info.validate()?;
    let [apex_plane, base_plane] = caps(&tip, &axis, height)?;
    let side: Arc<dyn Surface> = Arc::new(Cone::new(tip, axis, (radius / height).atan())?);
    build(info, "-1 -2 -3", vec![side, apex_plane, base_plane])
}
