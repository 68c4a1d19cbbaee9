//! Solids defined by a boolean rule over analytic surfaces.
//!
//! A [`CsgObject`] owns a [`RuleTree`] and a flat list of the surfaces the
//! tree references. Membership queries walk the tree; ray queries walk the
//! flat list. Solids built by the [`crate::factory`] functions also carry a
//! [`ShapeInfo`], which unlocks closed-form volume, solid angle, bounds and
//! point sampling.

mod bounds;
mod intercept;
mod solid_angle;
mod volume;

use std::sync::{Arc, OnceLock};

use rand::RngCore;
use solidkit_math::{Point3, Vec3};
use solidkit_surfaces::{Surface, SurfaceMap};

use crate::bbox::BoundingBox;
use crate::error::{Result, ShapeError};
use crate::material::Material;
use crate::random_point;
use crate::rules::RuleTree;
use crate::settings::{MonteCarloSettings, SolidAngleParams, TessellationParams};
use crate::shape::{find_point_in_object, Shape, ShapeId};
use crate::shape_info::ShapeInfo;
use crate::tessellate::{triangulate, Triangulation};
use crate::track::Track;

/// Cheap bounding-box rejection tries made before any smarter sampler.
const NAIVE_SAMPLING_ATTEMPTS: usize = 10;

/// A constructive-solid-geometry shape.
///
/// Clones share surfaces but copy the rule tree and keep the [`ShapeId`].
#[derive(Debug, Clone)]
pub struct CsgObject {
    id: ShapeId,
    name: String,
    tree: RuleTree,
    surfaces: Vec<(i32, Arc<dyn Surface>)>,
    material: Material,
    description: String,
    shape_info: Option<ShapeInfo>,
    mc_settings: MonteCarloSettings,
    bbox: OnceLock<BoundingBox>,
    triangulation: OnceLock<Triangulation>,
}

impl CsgObject {
    /// Parse `rule` and bind its surfaces from `surfaces`.
    ///
    /// The rule text is kept as the description.
    pub fn new(rule: &str, surfaces: &SurfaceMap) -> Result<Self> {
        let mut tree = RuleTree::parse(rule)?;
        tree.populate(surfaces)?;
        let mut obj = Self::from_tree(tree)?;
        obj.description = rule.trim().to_string();
        Ok(obj)
    }

    /// Wrap an existing tree, which may still need [`CsgObject::populate`].
    pub fn from_tree(tree: RuleTree) -> Result<Self> {
        if tree.root().is_none() {
            return Err(ShapeError::EmptyRuleTree);
        }
        let surfaces = tree.surfaces();
        Ok(Self {
            id: ShapeId::next(),
            name: String::new(),
            tree,
            surfaces,
            material: Material::default(),
            description: String::new(),
            shape_info: None,
            mc_settings: MonteCarloSettings::default(),
            bbox: OnceLock::new(),
            triangulation: OnceLock::new(),
        })
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Replace the stored description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Record the canonical parameters this solid was built from.
    pub fn with_shape_info(mut self, info: ShapeInfo) -> Self {
        self.shape_info = Some(info);
        self.triangulation = OnceLock::new();
        self.bbox = OnceLock::new();
        self
    }

    /// Replace the material.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Bind (or rebind) every leaf of the tree from `surfaces`.
    pub fn populate(&mut self, surfaces: &SurfaceMap) -> Result<()> {
        self.tree.populate(surfaces)?;
        self.surfaces = self.tree.surfaces();
        self.bbox = OnceLock::new();
        Ok(())
    }

    /// Swap surface `old_key` for `surface` under `new_key`.
    ///
    /// Canonical parameters and the derived triangulation are dropped,
    /// since they no longer describe the geometry.
    pub fn substitute_surface(&mut self, old_key: i32, new_key: i32, surface: Arc<dyn Surface>) -> Result<usize> {
        let changed = self.tree.substitute_surface(old_key, new_key, &surface);
        if changed == 0 {
            return Err(ShapeError::SurfaceNotFound(old_key));
        }
        self.surfaces = self.tree.surfaces();
        self.shape_info = None;
        self.triangulation = OnceLock::new();
        self.bbox = OnceLock::new();
        Ok(changed)
    }

    /// The rule tree.
    pub fn rule_tree(&self) -> &RuleTree {
        &self.tree
    }

    /// The rule written back as text.
    pub fn rule_text(&self) -> String {
        self.tree.to_string()
    }

    /// Keys of the surfaces the rule uses.
    pub fn surface_keys(&self) -> Vec<i32> {
        self.tree.surface_keys()
    }

    /// Bound surfaces the rule uses, one per key.
    pub fn surfaces(&self) -> &[(i32, Arc<dyn Surface>)] {
        &self.surfaces
    }

    /// True if the rule contains a complement.
    pub fn has_complement(&self) -> bool {
        self.tree.has_complement()
    }

    /// The description this solid was built from, verbatim.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Canonical parameters, for solids built by a factory.
    pub fn shape_info(&self) -> Option<&ShapeInfo> {
        self.shape_info.as_ref()
    }

    /// Monte-Carlo volume settings.
    pub fn monte_carlo_settings(&self) -> &MonteCarloSettings {
        &self.mc_settings
    }

    /// Replace the Monte-Carlo volume settings.
    pub fn set_monte_carlo_settings(&mut self, settings: MonteCarloSettings) {
        self.mc_settings = settings;
    }

    /// Use `bbox` instead of computing one.
    pub fn define_bounding_box(&mut self, bbox: BoundingBox) -> Result<()> {
        if bbox.is_null() {
            return Err(ShapeError::NullBoundingBox);
        }
        BoundingBox::check_valid(&bbox.min(), &bbox.max())?;
        self.bbox = OnceLock::from(bbox);
        Ok(())
    }

    /// Forget the cached bounding box; the next request recomputes it.
    pub fn set_null_bounding_box(&mut self) {
        self.bbox = OnceLock::new();
    }

    /// Replace the triangulation used for solid angles and vertex bounds.
    pub fn set_triangulation(&mut self, triangulation: Triangulation) {
        self.triangulation = OnceLock::from(triangulation);
        self.bbox = OnceLock::new();
    }

    /// The triangulation: the one set explicitly, else one derived from
    /// the canonical parameters, else empty.
    pub fn triangulation(&self) -> &Triangulation {
        self.triangulation.get_or_init(|| {
            self.shape_info
                .as_ref()
                .map(|info| triangulate(info, &TessellationParams::default()))
                .unwrap_or_default()
        })
    }

    /// Triangles in the triangulation.
    pub fn number_of_triangles(&self) -> usize {
        self.triangulation().num_triangles()
    }

    /// Vertices in the triangulation.
    pub fn number_of_vertices(&self) -> usize {
        self.triangulation().num_vertices()
    }

    /// Flat triangle indices of the triangulation.
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.triangulation().triangle_indices()
    }

    /// Flat vertex coordinates of the triangulation.
    pub fn vertex_coordinates(&self) -> Vec<f64> {
        self.triangulation().vertex_coordinates()
    }
}

impl Shape for CsgObject {
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
        self.tree.is_populated()
    }

    fn is_valid(&self, p: &Point3) -> bool {
        self.tree.is_valid(p).unwrap_or(false)
    }

    fn is_on_side(&self, p: &Point3) -> bool {
        self.on_side(p)
    }

    fn intercept_surface(&self, track: &mut Track) -> usize {
        self.intercept(track)
    }

    fn distance(&self, track: &Track) -> Result<f64> {
        self.nearest_crossing(track)
    }

    fn solid_angle(&self, params: &SolidAngleParams) -> f64 {
        self.solid_angle_at(params, None)
    }

    fn solid_angle_scaled(&self, params: &SolidAngleParams, scale: &Vec3) -> f64 {
        self.solid_angle_at(params, Some(scale))
    }

    fn volume(&self) -> f64 {
        self.enclosed_volume()
    }

    fn bounding_box(&self) -> BoundingBox {
        *self.bbox.get_or_init(|| self.compute_bounding_box())
    }

    fn point_in_object(&self) -> Option<Point3> {
        find_point_in_object(self)
    }

    fn generate_point_in_object(&self, rng: &mut dyn RngCore, max_attempts: usize) -> Option<Point3> {
        let region = self.bounding_box();
        self.generate_point_in_region(rng, &region, max_attempts)
    }

    fn generate_point_in_region(
        &self,
        rng: &mut dyn RngCore,
        region: &BoundingBox,
        max_attempts: usize,
    ) -> Option<Point3> {
        let naive = NAIVE_SAMPLING_ATTEMPTS.min(max_attempts);
        if let Some(p) = random_point::bounded(self, rng, region, naive) {
            return Some(p);
        }
        let remaining = max_attempts - naive;
        match &self.shape_info {
            Some(info) if !matches!(info, ShapeInfo::Cone { .. }) => {
                random_point::bounded_canonical(self, info, rng, region, remaining)
            }
            _ => random_point::bounded(self, rng, region, remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use solidkit_surfaces::{Plane, Sphere};

    fn sphere_map(radius: f64) -> SurfaceMap {
        let mut map = SurfaceMap::new();
        map.insert(1, Arc::new(Sphere::new(Point3::origin(), radius).unwrap()) as Arc<dyn Surface>);
        map
    }

    #[test]
    fn test_new_keeps_rule_and_description() {
        let obj = CsgObject::new("  -1 ", &sphere_map(1.0)).unwrap();
        assert_eq!(obj.description(), "-1");
        assert_eq!(obj.rule_text(), "-1");
        assert_eq!(obj.surface_keys(), vec![1]);
        assert_eq!(obj.surfaces().len(), 1);
        assert!(!obj.has_complement());
        assert!(obj.has_valid_shape());
        assert!(obj.shape_info().is_none());
    }

    #[test]
    fn test_missing_surface_fails() {
        let err = CsgObject::new("-1 2", &sphere_map(1.0)).unwrap_err();
        assert_eq!(err, ShapeError::SurfaceNotFound(2));
    }

    #[test]
    fn test_from_tree_then_populate() {
        let tree = RuleTree::parse("-1").unwrap();
        let mut obj = CsgObject::from_tree(tree).unwrap();
        assert!(!obj.has_valid_shape());
        assert!(!obj.is_valid(&Point3::origin()));
        obj.populate(&sphere_map(1.0)).unwrap();
        assert!(obj.is_valid(&Point3::origin()));
        assert!(CsgObject::from_tree(RuleTree::new()).is_err());
    }

    #[test]
    fn test_substitute_surface() {
        let mut obj = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let bigger: Arc<dyn Surface> = Arc::new(Sphere::new(Point3::origin(), 3.0).unwrap());
        assert_eq!(obj.substitute_surface(1, 7, bigger.clone()).unwrap(), 1);
        assert_eq!(obj.rule_text(), "-7");
        assert!(obj.shape_info().is_none());
        assert!(obj.is_valid(&Point3::new(2.5, 0.0, 0.0)));
        assert!(obj.substitute_surface(1, 8, bigger).is_err());
    }

    #[test]
    fn test_clone_keeps_identity() {
        let obj = factory::make_sphere(Point3::origin(), 1.0).unwrap().with_name("ball");
        let copy = obj.clone();
        assert_eq!(copy.id(), obj.id());
        assert_eq!(copy.name(), "ball");
        assert_eq!(copy.description(), obj.description());
    }

    #[test]
    fn test_define_and_reset_bounding_box() {
        let mut obj = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let custom = BoundingBox::new(Point3::new(-5.0, -5.0, -5.0), Point3::new(5.0, 5.0, 5.0)).unwrap();
        obj.define_bounding_box(custom).unwrap();
        assert_eq!(obj.bounding_box().max(), Point3::new(5.0, 5.0, 5.0));
        assert!(obj.define_bounding_box(BoundingBox::null()).is_err());
        obj.set_null_bounding_box();
        assert_eq!(obj.bounding_box().max(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_triangulation_accessors() {
        let obj = factory::make_centred_cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(obj.number_of_triangles(), 12);
        assert_eq!(obj.number_of_vertices(), 8);
        assert_eq!(obj.triangle_indices().len(), 36);
        assert_eq!(obj.vertex_coordinates().len(), 24);

        let mut plain = CsgObject::new("-1", &sphere_map(1.0)).unwrap();
        assert_eq!(plain.number_of_triangles(), 0);
        plain.set_triangulation(crate::tessellate::triangulate(
            &ShapeInfo::Sphere {
                centre: Point3::origin(),
                radius: 1.0,
            },
            &TessellationParams::default(),
        ));
        assert!(plain.number_of_triangles() > 0);
    }

    #[test]
    fn test_point_in_object_off_origin() {
        let mut map = SurfaceMap::new();
        map.insert(1, Arc::new(Sphere::new(Point3::new(10.0, 0.0, 0.0), 1.0).unwrap()) as Arc<dyn Surface>);
        let obj = CsgObject::new("-1", &map).unwrap();
        let p = obj.point_in_object().unwrap();
        assert!(obj.is_valid(&p));
        assert!((p.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_object_needs_box_centre() {
        // A slab that misses every axis ray from the origin.
        let mut map = SurfaceMap::new();
        for (k, n, d) in [
            (1, Vec3::new(1.0, 0.0, 0.0), 6.0),
            (2, Vec3::new(-1.0, 0.0, 0.0), -4.0),
            (3, Vec3::new(0.0, 1.0, 0.0), 6.0),
            (4, Vec3::new(0.0, -1.0, 0.0), -4.0),
            (5, Vec3::new(0.0, 0.0, 1.0), 1.0),
            (6, Vec3::new(0.0, 0.0, -1.0), 1.0),
        ] {
            map.insert(k, Arc::new(Plane::new(n, d).unwrap()) as Arc<dyn Surface>);
        }
        let obj = CsgObject::new("-1 -2 -3 -4 -5 -6", &map).unwrap();
        let p = obj.point_in_object().unwrap();
        assert!(obj.is_valid(&p));
    }

    #[test]
    fn test_generated_points_are_valid() {
        let mut rng = Pcg64::seed_from_u64(11);
        let shapes = vec![
            factory::make_centred_cuboid(Point3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 0.5)).unwrap(),
            factory::make_sphere(Point3::new(-1.0, 0.0, 0.0), 0.7).unwrap(),
            factory::make_cylinder(Point3::origin(), Vec3::new(0.0, 1.0, 1.0), 0.5, 2.0).unwrap(),
            factory::make_hollow_cylinder(Point3::origin(), Vec3::z(), 0.8, 1.0, 0.2).unwrap(),
            factory::make_cone(Point3::origin(), Vec3::x(), 1.0, 2.0).unwrap(),
        ];
        for shape in &shapes {
            for _ in 0..200 {
                let p = shape.generate_point_in_object(&mut rng, 500).unwrap();
                assert!(shape.is_valid(&p), "{} produced {p}", shape.name());
            }
        }
    }

    #[test]
    fn test_generate_point_in_region() {
        let mut rng = Pcg64::seed_from_u64(12);
        let obj = factory::make_sphere(Point3::origin(), 1.0).unwrap();
        let region = BoundingBox::new(Point3::new(0.5, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0)).unwrap();
        for _ in 0..100 {
            let p = obj.generate_point_in_region(&mut rng, &region, 200).unwrap();
            assert!(region.is_point_inside(&p));
            assert!(obj.is_valid(&p));
        }
        let far = BoundingBox::new(Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0)).unwrap();
        assert!(obj.generate_point_in_region(&mut rng, &far, 50).is_none());
    }
}
