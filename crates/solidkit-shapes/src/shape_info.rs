//! Canonical shape parameters.
//!
//! A factory that builds a recognised primitive records its parameters
//! here. Volume, solid angle, bounding box and point sampling dispatch on
//! this instead of inspecting the rule tree.

use serde::{Deserialize, Serialize};
use solidkit_math::{Bounds, Point3, Vec3};

use crate::error::{Result, ShapeError};

/// Parameters of a recognised primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeInfo {
    /// A parallelepiped spanned by three edges from one corner.
    Cuboid {
        /// Reference corner.
        left_front_bottom: Point3,
        /// Corner along the height edge.
        left_front_top: Point3,
        /// Corner along the depth edge.
        left_back_bottom: Point3,
        /// Corner along the width edge.
        right_front_bottom: Point3,
    },
    /// A ball.
    Sphere {
        /// Centre.
        centre: Point3,
        /// Radius.
        radius: f64,
    },
    /// A solid right circular cylinder.
    Cylinder {
        /// Centre of the base disc.
        centre_of_bottom_base: Point3,
        /// Unit axis from the base towards the top.
        axis: Vec3,
        /// Radius.
        radius: f64,
        /// Length along the axis.
        height: f64,
    },
    /// A cylindrical shell.
    HollowCylinder {
        /// Centre of the base annulus.
        centre_of_bottom_base: Point3,
        /// Unit axis from the base towards the top.
        axis: Vec3,
        /// Inner radius.
        inner_radius: f64,
        /// Outer radius.
        radius: f64,
        /// Length along the axis.
        height: f64,
    },
    /// A solid right circular cone.
    Cone {
        /// Apex.
        tip: Point3,
        /// Unit axis from the apex towards the base.
        axis: Vec3,
        /// Base radius.
        radius: f64,
        /// Apex to base distance.
        height: f64,
    },
}

/// Extent along each world axis of a circle of `radius` perpendicular to
/// the unit vector `axis`.
pub(crate) fn disc_extent(axis: &Vec3, radius: f64) -> Vec3 {
    axis.map(|a| radius * (1.0 - a * a).max(0.0).sqrt())
}

impl ShapeInfo {
    /// Short lowercase name of the primitive.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShapeInfo::Cuboid { .. } => "cuboid",
            ShapeInfo::Sphere { .. } => "sphere",
            ShapeInfo::Cylinder { .. } => "cylinder",
            ShapeInfo::HollowCylinder { .. } => "hollow cylinder",
            ShapeInfo::Cone { .. } => "cone",
        }
    }

    /// Reject parameters describing a degenerate solid.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64, what: &str| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ShapeError::DegenerateGeometry(format!("{what} must be positive, got {v}")))
            }
        };
        let unit = |a: &Vec3| {
            if (a.norm() - 1.0).abs() < 1e-9 {
                Ok(())
            } else {
                Err(ShapeError::DegenerateGeometry("axis must be a unit vector".into()))
            }
        };
        match self {
            ShapeInfo::Cuboid { .. } => {
                let Some([w, d, h]) = self.cuboid_edges() else {
                    return Ok(());
                };
                if w.cross(&d).dot(&h).abs() < 1e-12 {
                    return Err(ShapeError::DegenerateGeometry(
                        "cuboid edges are coplanar".into(),
                    ));
                }
                Ok(())
            }
            ShapeInfo::Sphere { radius, .. } => positive(*radius, "radius"),
            ShapeInfo::Cylinder {
                axis,
                radius,
                height,
                ..
            }
            | ShapeInfo::Cone {
                axis,
                radius,
                height,
                ..
            } => {
                unit(axis)?;
                positive(*radius, "radius")?;
                positive(*height, "height")
            }
            ShapeInfo::HollowCylinder {
                axis,
                inner_radius,
                radius,
                height,
                ..
            } => {
                unit(axis)?;
                positive(*inner_radius, "inner radius")?;
                positive(*height, "height")?;
                if radius <= inner_radius || !radius.is_finite() {
                    return Err(ShapeError::DegenerateGeometry(format!(
                        "outer radius {radius} must exceed inner radius {inner_radius}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Width, depth and height edge vectors of a cuboid.
    pub fn cuboid_edges(&self) -> Option<[Vec3; 3]> {
        match self {
            ShapeInfo::Cuboid {
                left_front_bottom,
                left_front_top,
                left_back_bottom,
                right_front_bottom,
            } => Some([
                right_front_bottom - left_front_bottom,
                left_back_bottom - left_front_bottom,
                left_front_top - left_front_bottom,
            ]),
            _ => None,
        }
    }

    /// The eight cuboid corners, width varying fastest.
    pub fn cuboid_corners(&self) -> Option<[Point3; 8]> {
        let ShapeInfo::Cuboid {
            left_front_bottom, ..
        } = self
        else {
            return None;
        };
        let [w, d, h] = self.cuboid_edges()?;
        let o = *left_front_bottom;
        Some([
            o,
            o + w,
            o + d,
            o + w + d,
            o + h,
            o + w + h,
            o + d + h,
            o + w + d + h,
        ])
    }

    /// Exact axis-aligned limits of the primitive.
    pub fn bounds(&self) -> Bounds {
        match self {
            ShapeInfo::Cuboid { .. } => self
                .cuboid_corners()
                .and_then(|c| Bounds::enclosing(c.iter()))
                .unwrap_or_else(Bounds::empty),
            ShapeInfo::Sphere { centre, radius } => {
                let r = Vec3::repeat(*radius);
                Bounds::new(centre - r, centre + r)
            }
            ShapeInfo::Cylinder {
                centre_of_bottom_base,
                axis,
                radius,
                height,
            }
            | ShapeInfo::HollowCylinder {
                centre_of_bottom_base,
                axis,
                radius,
                height,
                ..
            } => {
                let e = disc_extent(axis, *radius);
                let top = centre_of_bottom_base + axis * *height;
                Bounds::new(centre_of_bottom_base - e, centre_of_bottom_base + e)
                    .union(&Bounds::new(top - e, top + e))
            }
            ShapeInfo::Cone {
                tip,
                axis,
                radius,
                height,
            } => {
                let e = disc_extent(axis, *radius);
                let base = tip + axis * *height;
                let mut b = Bounds::new(base - e, base + e);
                b.include_point(tip);
                b
            }
        }
    }

    /// Closed-form volume where the kernel uses one.
    ///
    /// Cones return `None` and are measured by Monte-Carlo integration.
    pub fn exact_volume(&self) -> Option<f64> {
        use std::f64::consts::PI;
        match self {
            ShapeInfo::Cuboid { .. } => {
                let [w, d, h] = self.cuboid_edges()?;
                Some(w.cross(&d).dot(&h).abs())
            }
            ShapeInfo::Sphere { radius, .. } => Some(4.0 / 3.0 * PI * radius.powi(3)),
            ShapeInfo::Cylinder { radius, height, .. } => Some(PI * radius * radius * height),
            ShapeInfo::HollowCylinder {
                inner_radius,
                radius,
                height,
                ..
            } => Some(PI * (radius * radius - inner_radius * inner_radius) * height),
            ShapeInfo::Cone { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cuboid() -> ShapeInfo {
        ShapeInfo::Cuboid {
            left_front_bottom: Point3::new(-0.5, -0.5, -0.5),
            left_front_top: Point3::new(-0.5, -0.5, 0.5),
            left_back_bottom: Point3::new(-0.5, 0.5, -0.5),
            right_front_bottom: Point3::new(0.5, -0.5, -0.5),
        }
    }

    #[test]
    fn test_cuboid_volume_and_bounds() {
        let c = unit_cuboid();
        assert_eq!(c.exact_volume(), Some(1.0));
        let b = c.bounds();
        assert_eq!(b.min, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(b.max, Point3::new(0.5, 0.5, 0.5));
        assert_eq!(c.cuboid_corners().unwrap()[7], Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_tilted_cylinder_bounds() {
        let axis = Vec3::new(1.0, 0.0, 1.0).normalize();
        let c = ShapeInfo::Cylinder {
            centre_of_bottom_base: Point3::origin(),
            axis,
            radius: 1.0,
            height: 2.0_f64.sqrt(),
        };
        let b = c.bounds();
        let half = 0.5_f64.sqrt();
        assert_relative_eq!(b.min.x, -half, epsilon = 1e-12);
        assert_relative_eq!(b.max.x, 1.0 + half, epsilon = 1e-12);
        assert_relative_eq!(b.max.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.max.z, 1.0 + half, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_bounds_include_tip() {
        let c = ShapeInfo::Cone {
            tip: Point3::new(0.0, 0.0, 2.0),
            axis: -Vec3::z(),
            radius: 1.0,
            height: 2.0,
        };
        let b = c.bounds();
        assert_eq!(b.min, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 1.0, 2.0));
        assert_eq!(c.exact_volume(), None);
    }

    #[test]
    fn test_validation() {
        assert!(unit_cuboid().validate().is_ok());
        let flat = ShapeInfo::Cuboid {
            left_front_bottom: Point3::origin(),
            left_front_top: Point3::new(1.0, 1.0, 0.0),
            left_back_bottom: Point3::new(0.0, 1.0, 0.0),
            right_front_bottom: Point3::new(1.0, 0.0, 0.0),
        };
        assert!(flat.validate().is_err());
        let hollow = ShapeInfo::HollowCylinder {
            centre_of_bottom_base: Point3::origin(),
            axis: Vec3::z(),
            inner_radius: 2.0,
            radius: 1.0,
            height: 1.0,
        };
        assert!(matches!(hollow.validate(), Err(ShapeError::DegenerateGeometry(_))));
        let sphere = ShapeInfo::Sphere {
            centre: Point3::origin(),
            radius: -1.0,
        };
        assert!(sphere.validate().is_err());
    }

    #[test]
    fn test_json_is_tagged() {
        let s = ShapeInfo::Sphere {
            centre: Point3::origin(),
            radius: 2.0,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"type\":\"sphere\""));
        let back: ShapeInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
