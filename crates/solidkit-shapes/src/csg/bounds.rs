//! Bounding-box derivation for CSG solids.
//!
//! Strategies are tried in order: the rule tree, the canonical parameters,
//! the triangulation's vertices. If all fail the solid gets an oversized
//! sentinel box.

use solidkit_math::{Bounds, Point3};

use super::CsgObject;
use crate::bbox::BoundingBox;
use crate::mesh_common::vertex_bounding_box;

/// Starting limits handed to the rule tree.
const RULE_SEARCH_EXTENT: f64 = 1e10;

/// Rule-tree limits beyond this were not refined by any surface.
const RULE_ACCEPT_EXTENT: f64 = 1e4;

/// Half-width of the box returned when every strategy fails.
const SENTINEL_EXTENT: f64 = 100.0;

fn sane(bounds: &Bounds, limit: f64) -> bool {
    bounds.is_finite()
        && bounds.is_ordered()
        && (0..3).all(|i| bounds.min[i] >= -limit && bounds.max[i] <= limit)
}

impl CsgObject {
    fn bounds_from_rules(&self) -> Option<BoundingBox> {
        let mut bounds = Bounds::symmetric(RULE_SEARCH_EXTENT);
        self.tree.refine_bounds(&mut bounds);
        if !sane(&bounds, RULE_ACCEPT_EXTENT) {
            return None;
        }
        BoundingBox::from_bounds(&bounds)
    }

    fn bounds_from_shape_info(&self) -> Option<BoundingBox> {
        let bounds = self.shape_info.as_ref()?.bounds();
        if !sane(&bounds, f64::MAX) {
            return None;
        }
        BoundingBox::from_bounds(&bounds)
    }

    fn bounds_from_vertices(&self) -> Option<BoundingBox> {
        let triangulation = self.triangulation();
        if triangulation.vertices.is_empty() {
            return None;
        }
        let bbox = vertex_bounding_box(&triangulation.vertices);
        (!bbox.is_null() && sane(&bbox.world_bounds(), f64::MAX)).then_some(bbox)
    }

    pub(super) fn compute_bounding_box(&self) -> BoundingBox {
        if let Some(b) = self.bounds_from_rules() {
            log::debug!("{}: bounding box from rule tree", self.id);
            return b;
        }
        if let Some(b) = self.bounds_from_shape_info() {
            log::debug!("{}: bounding box from shape parameters", self.id);
            return b;
        }
        if let Some(b) = self.bounds_from_vertices() {
            log::debug!("{}: bounding box from triangulation", self.id);
            return b;
        }
        log::warn!(
            "{}: could not derive a bounding box, using +/-{SENTINEL_EXTENT} sentinel",
            self.id
        );
        let e = SENTINEL_EXTENT;
        BoundingBox::new(Point3::new(-e, -e, -e), Point3::new(e, e, e)).unwrap_or_default()
    }
}
