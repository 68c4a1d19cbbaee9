//! Closed triangle meshes.
//!
//! A [`MeshObject`] answers the shape queries directly from its triangles:
//! membership by casting a ray and reading the nearest crossing, tracks by
//! intersecting every triangle, solid angle and volume by summing per
//! triangle. Triangles are expected to be wound anticlockwise when seen
//! from outside.

use std::f64::consts::PI;
use std::sync::OnceLock;

use rand::RngCore;
use solidkit_math::{Mat3, Point3, Tolerance, Transform, Vec3};

use crate::bbox::BoundingBox;
use crate::error::{Result, ShapeError};
use crate::material::Material;
use crate::mesh_common;
use crate::random_point;
use crate::settings::SolidAngleParams;
use crate::shape::{find_point_in_object, Shape, ShapeId};
use crate::track::{Track, TrackDirection};

/// Fewest vertices or triangles that can enclose a volume.
const MIN_ELEMENTS: usize = 4;

/// Ray directions tried in turn by [`MeshObject::is_on_side`].
const SIDE_PROBES: [[f64; 3]; 3] = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];

/// A solid bounded by a closed triangle mesh.
///
/// Clones keep the [`ShapeId`].
#[derive(Debug, Clone)]
pub struct MeshObject {
    id: ShapeId,
    name: String,
    vertices: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
    material: Material,
    bbox: OnceLock<BoundingBox>,
}

impl MeshObject {
    /// Build a mesh from vertices and index triples.
    ///
    /// Fails if an index is out of range or the mesh has fewer than four
    /// vertices or triangles.
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        mesh_common::check_vertex_limit(vertices.len())?;
        if vertices.len() < MIN_ELEMENTS || triangles.len() < MIN_ELEMENTS {
            return Err(ShapeError::InvalidArgument(format!(
                "a closed mesh needs at least {MIN_ELEMENTS} vertices and triangles, got {} and {}",
                vertices.len(),
                triangles.len()
            )));
        }
        let n = vertices.len();
        if let Some(bad) = triangles.iter().flatten().find(|&&i| i as usize >= n) {
            return Err(ShapeError::InvalidArgument(format!(
                "triangle index {bad} out of range for {n} vertices"
            )));
        }
        let mesh = Self {
            id: ShapeId::next(),
            name: String::new(),
            vertices,
            triangles,
            material: Material::default(),
            bbox: OnceLock::new(),
        };
        log::debug!(
            "{}: mesh with {} vertices, {} triangles",
            mesh.id,
            mesh.vertices.len(),
            mesh.triangles.len()
        );
        Ok(mesh)
    }

    /// Build a mesh from flat `x y z` coordinates and flat index triples.
    pub fn from_flat(coordinates: &[f64], indices: &[u32]) -> Result<Self> {
        if coordinates.len() % 3 != 0 {
            return Err(ShapeError::InvalidArgument(format!(
                "{} coordinates do not form whole vertices",
                coordinates.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(ShapeError::InvalidArgument(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }
        let vertices = coordinates
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
        Self::new(vertices, triangles)
    }

    /// Builder-style name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Corner points of triangle `i`.
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        mesh_common::triangle_vertices(&self.vertices, self.triangles.get(i)?)
    }

    /// The vertices.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// The index triples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Vertices as flat `x y z` coordinates.
    pub fn vertex_coordinates(&self) -> Vec<f64> {
        self.vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
    }

    fn map_vertices(&mut self, f: impl Fn(&Point3) -> Point3) {
        for v in &mut self.vertices {
            *v = f(v);
        }
        self.bbox.take();
    }

    /// Apply a linear map about the origin to every vertex.
    pub fn rotate(&mut self, rotation: &Mat3) {
        self.transform(&Transform::from_linear(rotation));
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: &Vec3) {
        self.map_vertices(|v| v + offset);
    }

    /// Scale every vertex about the origin.
    pub fn scale(&mut self, factor: f64) {
        self.transform(&Transform::uniform_scale(factor));
    }

    /// Apply an affine transform to every vertex.
    pub fn transform(&mut self, transform: &Transform) {
        self.map_vertices(|v| transform.apply_point(v));
    }

    fn hits(&self, start: &Point3, direction: &Vec3) -> Vec<(Point3, TrackDirection)> {
        mesh_common::intersections(start, direction, &self.vertices, &self.triangles)
    }

    /// Solid angle from an observer already mapped into the mesh's frame.
    fn solid_angle_from(&self, local_observer: &Point3, sum: impl FnOnce() -> f64) -> f64 {
        if self.is_on_side(local_observer) {
            return 2.0 * PI;
        }
        if self.is_valid(local_observer) {
            return 4.0 * PI;
        }
        sum()
    }
}

impl Shape for MeshObject {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn has_valid_shape(&self) -> bool {
        self.vertices.len() >= MIN_ELEMENTS && self.triangles.len() >= MIN_ELEMENTS
    }

    fn is_valid(&self, p: &Point3) -> bool {
        if !self.bounding_box().is_point_inside(p) {
            return false;
        }
        let tol = Tolerance::DEFAULT.linear;
        let nearest = self
            .hits(p, &Vec3::z())
            .into_iter()
            .map(|(q, flag)| ((q - p).norm(), flag))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        match nearest {
            Some((d, _)) if d < tol => true,
            Some((_, flag)) => flag == TrackDirection::Leaving,
            None => false,
        }
    }

    fn is_on_side(&self, p: &Point3) -> bool {
        if !self.bounding_box().is_point_inside(p) {
            return false;
        }
        let tol = Tolerance::DEFAULT.linear;
        for d in SIDE_PROBES {
            let hits = self.hits(p, &Vec3::from(d));
            if hits.is_empty() {
                return false;
            }
            if hits.iter().any(|(q, _)| (q - p).norm() < tol) {
                return true;
            }
        }
        false
    }

    fn intercept_surface(&self, track: &mut Track) -> usize {
        let original = track.count();
        let start = track.start_point();
        let direction = track.direction().into_inner();
        if !self.bounding_box().does_line_intersect(&start, &direction) {
            return 0;
        }
        let hits = self.hits(&start, &direction);
        let crossings = hits.len();
        for (point, flag) in hits {
            track.add_point(flag, point, self.id);
        }
        track.build_link();
        let added = track.count() - original;
        log::trace!("{crossings} crossings, {added} segments for {}", self.id);
        added
    }

    fn distance(&self, track: &Track) -> Result<f64> {
        let start = track.start_point();
        self.hits(&start, &track.direction())
            .into_iter()
            .map(|(q, _)| (q - start).norm())
            .min_by(f64::total_cmp)
            .ok_or(ShapeError::NoIntersection)
    }

    fn solid_angle(&self, params: &SolidAngleParams) -> f64 {
        let observer = params.observer;
        self.solid_angle_from(&observer, || {
            mesh_common::solid_angle(&observer, &self.vertices, &self.triangles)
        })
    }

    fn solid_angle_scaled(&self, params: &SolidAngleParams, scale: &Vec3) -> f64 {
        if scale.iter().any(|s| *s == 0.0) {
            return 0.0;
        }
        let observer = params.observer;
        let local = Point3::from(observer.coords.component_div(scale));
        self.solid_angle_from(&local, || {
            mesh_common::solid_angle_scaled(&observer, &self.vertices, &self.triangles, scale)
        })
    }

    fn volume(&self) -> f64 {
        let centre = self.bounding_box().centre_point();
        mesh_common::signed_volume(&centre, &self.vertices, &self.triangles)
    }

    fn bounding_box(&self) -> BoundingBox {
        *self
            .bbox
            .get_or_init(|| mesh_common::vertex_bounding_box(&self.vertices))
    }

    fn point_in_object(&self) -> Option<Point3> {
        find_point_in_object(self)
    }

    fn generate_point_in_object(&self, rng: &mut dyn RngCore, max_attempts: usize) -> Option<Point3> {
        random_point::bounded(self, rng, &self.bounding_box(), max_attempts)
    }

    fn generate_point_in_region(
        &self,
        rng: &mut dyn RngCore,
        region: &BoundingBox,
        max_attempts: usize,
    ) -> Option<Point3> {
        random_point::bounded(self, rng, region, max_attempts)
    }
}
