//! Boolean rule trees over surfaces.
//!
//! A [`RuleTree`] is an arena of [`RuleNode`]s addressed by [`NodeId`].
//! Interior nodes combine their children by intersection, union or
//! complement; leaves select one side of a surface. Every node records its
//! parent so a subtree can be found and replaced without walking from the
//! root.

mod parse;

pub use parse::MAX_NESTING;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use slotmap::SlotMap;
use solidkit_math::{Bounds, Point3};
use solidkit_surfaces::{Sense, Surface, SurfaceMap};

use crate::error::{Result, ShapeError};

slotmap::new_key_type! {
    /// Handle to a node in a [`RuleTree`].
    pub struct NodeId;
}

/// What a rule node does.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Inside both children.
    Intersection(NodeId, NodeId),
    /// Inside either child.
    Union(NodeId, NodeId),
    /// Outside the child.
    Complement(NodeId),
    /// One side of a surface.
    Surface {
        /// Key into the surface map.
        key: i32,
        /// Side selected.
        sense: Sense,
        /// Bound surface, once the tree is populated.
        surface: Option<Arc<dyn Surface>>,
    },
}

type LeafTest<'a> = dyn FnMut(i32, Sense, Option<&Arc<dyn Surface>>) -> Result<bool> + 'a;

/// A node and its parent link.
#[derive(Debug, Clone)]
pub struct RuleNode {
    /// Operation or leaf.
    pub kind: RuleKind,
    /// Parent node; `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,
}

/// A boolean expression tree over surfaces.
///
/// Cloning copies the node arena; surfaces stay shared.
#[derive(Debug, Clone, Default)]
pub struct RuleTree {
    nodes: SlotMap<NodeId, RuleNode>,
    root: Option<NodeId>,
}

impl RuleTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Make `id` the root.
    pub fn set_root(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
            self.root = Some(id);
        }
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&RuleNode> {
        self.nodes.get(id)
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a surface leaf from a signed key (`-3` is the negative side of
    /// surface 3).
    pub fn leaf(&mut self, signed_key: i32) -> NodeId {
        let (key, sense) = Sense::split_signed(signed_key);
        self.nodes.insert(RuleNode {
            kind: RuleKind::Surface {
                key,
                sense,
                surface: None,
            },
            parent: None,
        })
    }

    /// Add an intersection of two detached nodes.
    pub fn intersection(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.join(RuleKind::Intersection(a, b), &[a, b])
    }

    /// Add a union of two detached nodes.
    pub fn union(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.join(RuleKind::Union(a, b), &[a, b])
    }

    /// Add the complement of a detached node.
    pub fn complement(&mut self, inner: NodeId) -> NodeId {
        self.join(RuleKind::Complement(inner), &[inner])
    }

    fn join(&mut self, kind: RuleKind, children: &[NodeId]) -> NodeId {
        let id = self.nodes.insert(RuleNode { kind, parent: None });
        for &c in children {
            if let Some(node) = self.nodes.get_mut(c) {
                node.parent = Some(id);
            }
        }
        id
    }

    /// Put the detached node `replacement` where `target` is and drop the
    /// `target` subtree.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> Result<()> {
        if !self.nodes.contains_key(target) {
            return Err(ShapeError::InvalidArgument("replace target is not in the tree".into()));
        }
        match self.nodes.get(replacement) {
            None => {
                return Err(ShapeError::InvalidArgument(
                    "replacement node is not in the tree".into(),
                ))
            }
            Some(n) if n.parent.is_some() || self.root == Some(replacement) => {
                return Err(ShapeError::InvalidArgument(
                    "replacement node is already attached".into(),
                ))
            }
            Some(_) => {}
        }

        let parent = self.parent(target);
        match parent {
            None => self.root = Some(replacement),
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    match &mut node.kind {
                        RuleKind::Intersection(a, b) | RuleKind::Union(a, b) => {
                            if *a == target {
                                *a = replacement;
                            } else {
                                *b = replacement;
                            }
                        }
                        RuleKind::Complement(inner) => *inner = replacement,
                        RuleKind::Surface { .. } => {}
                    }
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(replacement) {
            node.parent = parent;
        }
        self.remove_subtree(target);
        Ok(())
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.remove(n) {
                stack.extend(Self::children(&node.kind));
            }
        }
    }

    fn children(kind: &RuleKind) -> Vec<NodeId> {
        match kind {
            RuleKind::Intersection(a, b) | RuleKind::Union(a, b) => vec![*a, *b],
            RuleKind::Complement(inner) => vec![*inner],
            RuleKind::Surface { .. } => Vec::new(),
        }
    }

    /// Leaves reachable from the root, left to right.
    fn leaves(&self) -> Vec<&RuleKind> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            match &node.kind {
                RuleKind::Surface { .. } => out.push(&node.kind),
                other => stack.extend(Self::children(other).into_iter().rev()),
            }
        }
        out
    }

    /// Surface keys used by the tree, in order of first appearance.
    pub fn surface_keys(&self) -> Vec<i32> {
        let mut keys = Vec::new();
        for leaf in self.leaves() {
            if let RuleKind::Surface { key, .. } = leaf {
                if !keys.contains(key) {
                    keys.push(*key);
                }
            }
        }
        keys
    }

    /// Bound surfaces used by the tree, one per key, in order of first
    /// appearance.
    pub fn surfaces(&self) -> Vec<(i32, Arc<dyn Surface>)> {
        let mut out: Vec<(i32, Arc<dyn Surface>)> = Vec::new();
        for leaf in self.leaves() {
            if let RuleKind::Surface {
                key,
                surface: Some(s),
                ..
            } = leaf
            {
                if !out.iter().any(|(k, _)| k == key) {
                    out.push((*key, Arc::clone(s)));
                }
            }
        }
        out
    }

    /// True if any complement node is reachable from the root.
    pub fn has_complement(&self) -> bool {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match self.nodes.get(id).map(|n| &n.kind) {
                Some(RuleKind::Complement(_)) => return true,
                Some(kind) => stack.extend(Self::children(kind)),
                None => {}
            }
        }
        false
    }

    /// Bind every leaf to its surface from `map`.
    pub fn populate(&mut self, map: &SurfaceMap) -> Result<()> {
        let root = self.root.ok_or(ShapeError::EmptyRuleTree)?;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            match &mut node.kind {
                RuleKind::Surface { key, surface, .. } => {
                    let s = map.get(key).ok_or(ShapeError::SurfaceNotFound(*key))?;
                    *surface = Some(Arc::clone(s));
                }
                other => stack.extend(Self::children(other)),
            }
        }
        Ok(())
    }

    /// Rebind every leaf keyed `old_key` to `surface` under `new_key`.
    ///
    /// Returns the number of leaves changed.
    pub fn substitute_surface(&mut self, old_key: i32, new_key: i32, surface: &Arc<dyn Surface>) -> usize {
        let mut changed = 0;
        for node in self.nodes.values_mut() {
            if let RuleKind::Surface {
                key,
                surface: bound,
                ..
            } = &mut node.kind
            {
                if *key == old_key {
                    *key = new_key;
                    *bound = Some(Arc::clone(surface));
                    changed += 1;
                }
            }
        }
        changed
    }

    /// True when every reachable leaf is bound to a surface.
    pub fn is_populated(&self) -> bool {
        self.root.is_some()
            && self
                .leaves()
                .iter()
                .all(|l| matches!(l, RuleKind::Surface { surface: Some(_), .. }))
    }

    /// Whether `p` satisfies the rule.
    pub fn is_valid(&self, p: &Point3) -> Result<bool> {
        let root = self.root.ok_or(ShapeError::EmptyRuleTree)?;
        self.eval(root, &mut |key, sense, surface| match surface {
            Some(s) => Ok(sense.accepts(s.side(p))),
            None => Err(ShapeError::UnresolvedSurface(key)),
        })
    }

    /// Evaluate the rule from per-surface states: `true` means the point
    /// is on the positive side of that surface.
    pub fn is_valid_with(&self, states: &BTreeMap<i32, bool>) -> Result<bool> {
        let root = self.root.ok_or(ShapeError::EmptyRuleTree)?;
        self.eval(root, &mut |key, sense, _| {
            let positive = *states.get(&key).ok_or(ShapeError::SurfaceNotFound(key))?;
            Ok(match sense {
                Sense::Positive => positive,
                Sense::Negative => !positive,
            })
        })
    }

    fn eval(&self, id: NodeId, leaf: &mut LeafTest<'_>) -> Result<bool> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| ShapeError::InvalidArgument("dangling rule node".into()))?;
        match &node.kind {
            RuleKind::Intersection(a, b) => Ok(self.eval(*a, leaf)? && self.eval(*b, leaf)?),
            RuleKind::Union(a, b) => Ok(self.eval(*a, leaf)? || self.eval(*b, leaf)?),
            RuleKind::Complement(inner) => Ok(!self.eval(*inner, leaf)?),
            RuleKind::Surface {
                key,
                sense,
                surface,
            } => leaf(*key, *sense, surface.as_ref()),
        }
    }

    /// Narrow `bounds` to the region the rule can occupy.
    ///
    /// Only surfaces that can express their side as a box tighten the
    /// limits; anything else leaves them as they were.
    pub fn refine_bounds(&self, bounds: &mut Bounds) {
        if let Some(root) = self.root {
            *bounds = self.node_bounds(root, bounds);
        }
    }

    fn node_bounds(&self, id: NodeId, input: &Bounds) -> Bounds {
        let Some(node) = self.nodes.get(id) else {
            return *input;
        };
        match &node.kind {
            RuleKind::Surface {
                sense,
                surface: Some(s),
                ..
            } => {
                let mut b = *input;
                s.refine_bounds(&mut b, *sense);
                b
            }
            RuleKind::Surface { surface: None, .. } => *input,
            RuleKind::Intersection(a, b) => self.node_bounds(*a, input).intersect(&self.node_bounds(*b, input)),
            RuleKind::Union(a, b) => self.node_bounds(*a, input).union(&self.node_bounds(*b, input)),
            RuleKind::Complement(inner) => {
                // Input corners outside the inner box plus inner corners
                // inside the input.
                let inner_box = self.node_bounds(*inner, input);
                let mut points: Vec<Point3> = input
                    .corners()
                    .into_iter()
                    .filter(|c| !inner_box.contains(c))
                    .collect();
                points.extend(inner_box.corners().into_iter().filter(|c| input.contains(c)));
                Bounds::enclosing(points.iter()).unwrap_or(*input)
            }
        }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, parent_is_intersection: bool) -> fmt::Result {
        let Some(node) = self.nodes.get(id) else {
            return Ok(());
        };
        match &node.kind {
            RuleKind::Surface { key, sense, .. } => write!(f, "{}", sense.sign() as i32 * key),
            RuleKind::Intersection(a, b) => {
                self.write_node(f, *a, true)?;
                f.write_str(" ")?;
                self.write_node(f, *b, true)
            }
            RuleKind::Union(a, b) => {
                if parent_is_intersection {
                    f.write_str("(")?;
                }
                self.write_node(f, *a, false)?;
                f.write_str(" : ")?;
                self.write_node(f, *b, false)?;
                if parent_is_intersection {
                    f.write_str(")")?;
                }
                Ok(())
            }
            RuleKind::Complement(inner) => {
                f.write_str("#(")?;
                self.write_node(f, *inner, false)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for RuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.write_node(f, root, false),
            None => Ok(()),
        }
    }
}
