#![warn(missing_docs)]

//! Computational-geometry kernel for sample, container and instrument
//! shapes.
//!
//! Re-exports the math, surface and shape crates under one name.
//!
//! # Example
//!
//! ```
//! use solidkit::{factory, Point3, Shape, SolidAngleParams, Vec3};
//!
//! let cube = factory::make_centred_cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
//! assert!(cube.is_valid(&Point3::new(0.2, 0.0, 0.0)));
//! assert!((cube.volume() - 1.0).abs() < 1e-12);
//!
//! let inside = SolidAngleParams::new(Point3::origin());
//! assert!((cube.solid_angle(&inside) - 4.0 * std::f64::consts::PI).abs() < 1e-12);
//! ```

pub use solidkit_math;
pub use solidkit_shapes;
pub use solidkit_surfaces;

pub use solidkit_math::{Bounds, Dir3, Mat3, Point3, Tolerance, Transform, Vec3};
pub use solidkit_shapes::{
    factory, random_point, triangulate, BoundingBox, CsgObject, IntersectionPoint, Link, Material,
    MeshObject, MonteCarloSettings, RuleTree, Shape, ShapeError, ShapeId, ShapeInfo,
    SolidAngleParams, TessellationParams, Track, TrackDirection, Triangulation,
};
pub use solidkit_surfaces::{Cone, Cylinder, Plane, Ray, Sphere, Surface, SurfaceError, SurfaceMap};
