//! Material tag attached to a shape.

use serde::{Deserialize, Serialize};

/// The material a shape is made of. Carried by value; the kernel never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name, e.g. a chemical formula.
    pub name: String,
    /// Number density in atoms per cubic angstrom.
    pub number_density: f64,
}

impl Material {
    /// A named material.
    pub fn new(name: impl Into<String>, number_density: f64) -> Self {
        Self {
            name: name.into(),
            number_density,
        }
    }

    /// True for the default, empty material.
    pub fn is_vacuum(&self) -> bool {
        self.name.is_empty() && self.number_density == 0.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("", 0.0)
    }
}
