#![warn(missing_docs)]

//! Shapes for the solidkit geometry kernel.
//!
//! Two solid representations answer the same [`Shape`] queries: whether a
//! point is inside, where a ray enters and leaves, the solid angle seen
//! from an observer, the enclosed volume, and random interior points.
//!
//! # Architecture
//!
//! - [`CsgObject`] - boolean [`RuleTree`] over analytic surfaces
//! - [`MeshObject`] - closed triangle mesh
//! - [`factory`] - canonical cuboid, sphere, cylinder, shell and cone builders
//! - [`BoundingBox`] - cached, optionally rotated box used for culling and sampling
//! - [`Track`] - a ray and the segments shapes add to it
//! - [`random_point`] - closed-form and rejection samplers
//! - [`mesh_common`] - triangle numerics shared by both representations
//!
//! # Example
//!
//! ```
//! use solidkit_shapes::{factory, Shape, Track};
//! use solidkit_math::{Point3, Vec3};
//!
//! let sphere = factory::make_sphere(Point3::origin(), 2.0).unwrap();
//! let mut track = Track::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x()).unwrap();
//! assert_eq!(sphere.intercept_surface(&mut track), 1);
//! assert!((track.total_distance_inside_object() - 4.0).abs() < 1e-9);
//! ```

pub mod bbox;
pub mod csg;
pub mod error;
pub mod factory;
pub mod material;
pub mod mesh;
pub mod mesh_common;
pub mod random_point;
pub mod rules;
pub mod settings;
pub mod shape;
pub mod shape_info;
pub mod tessellate;
pub mod track;

pub use bbox::{BoundingBox, Frame};
pub use csg::CsgObject;
pub use error::{Result, ShapeError};
pub use material::Material;
pub use mesh::MeshObject;
pub use rules::{NodeId, RuleKind, RuleNode, RuleTree};
pub use settings::{MonteCarloSettings, SolidAngleParams, TessellationParams};
pub use shape::{Shape, ShapeId};
pub use shape_info::ShapeInfo;
pub use tessellate::{triangulate, Triangulation};
pub use track::{IntersectionPoint, Link, Track, TrackDirection};
