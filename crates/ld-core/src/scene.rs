//! The primitive scene: everything the host renders.
//!
//! The scene is a tree of primitives (groups, paths, circles, rects, lines)
//! stored in a `petgraph` stable graph with parent→child edges. Primitives
//! are addressed by interned `PrimitiveId`s. The editor creates its segment
//! paths, endpoint markers and overlay visuals here; the host reads the
//! scene back to draw it.

use crate::id::PrimitiveId;
use crate::path_data::{parse_path_data, to_bez_path};
use kurbo::{Affine, Point, Rect, Shape};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    Root,
    Group,
    Path { d: String },
    Circle { center: Point, r: f64 },
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        corner: f64,
    },
    Line { from: Point, to: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub stroke_width: f64,
    pub visible: bool,
}

impl Default for PrimitiveStyle {
    fn default() -> Self {
        Self {
            stroke: None,
            fill: None,
            stroke_width: 1.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    pub style: PrimitiveStyle,
    /// Local-to-parent transform.
    pub transform: Affine,
}

impl Primitive {
    pub fn new(id: PrimitiveId, kind: PrimitiveKind) -> Self {
        Self {
            id,
            kind,
            style: PrimitiveStyle::default(),
            transform: Affine::IDENTITY,
        }
    }

    pub fn group(id: PrimitiveId) -> Self {
        Self::new(id, PrimitiveKind::Group)
    }

    pub fn path(id: PrimitiveId, d: impl Into<String>) -> Self {
        Self::new(id, PrimitiveKind::Path { d: d.into() })
    }

    pub fn circle(id: PrimitiveId, center: Point, r: f64) -> Self {
        Self::new(id, PrimitiveKind::Circle { center, r })
    }

    /// A square of side `size` centred on `center`, optionally rounded.
    pub fn square(id: PrimitiveId, center: Point, size: f64, corner: f64) -> Self {
        Self::new(
            id,
            PrimitiveKind::Rect {
                origin: Point::new(center.x - size / 2.0, center.y - size / 2.0),
                width: size,
                height: size,
                corner,
            },
        )
    }

    pub fn line(id: PrimitiveId, from: Point, to: Point) -> Self {
        Self::new(id, PrimitiveKind::Line { from, to })
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.style.stroke = Some(color.into());
        self.style.stroke_width = width;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.style.visible = false;
        self
    }

    /// Bounding box in the primitive's own coordinate space.
    pub fn local_bounds(&self) -> Option<Rect> {
        match &self.kind {
            PrimitiveKind::Root | PrimitiveKind::Group => None,
            PrimitiveKind::Path { d } => {
                let cmds = parse_path_data(d).ok()?;
                if cmds.is_empty() {
                    return None;
                }
                Some(to_bez_path(&cmds).bounding_box())
            }
            PrimitiveKind::Circle { center, r } => Some(Rect::new(
                center.x - r,
                center.y - r,
                center.x + r,
                center.y + r,
            )),
            PrimitiveKind::Rect {
                origin,
                width,
                height,
                ..
            } => Some(Rect::new(
                origin.x,
                origin.y,
                origin.x + width,
                origin.y + height,
            )),
            PrimitiveKind::Line { from, to } => Some(Rect::from_points(*from, *to)),
        }
    }
}

/// Tree of primitives rooted at an implicit root group.
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: StableDiGraph<Primitive, ()>,
    pub root: NodeIndex,
    id_index: HashMap<PrimitiveId, NodeIndex>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = PrimitiveId::intern("root");
        let root = graph.add_node(Primitive::new(root_id, PrimitiveKind::Root));
        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);
        Self {
            graph,
            root,
            id_index,
        }
    }

    pub fn root_id(&self) -> PrimitiveId {
        self.graph[self.root].id
    }

    /// Add a primitive under `parent` (the root when `parent` is unknown).
    /// Re-adding an id already in the scene replaces nothing and returns it.
    pub fn add(&mut self, parent: PrimitiveId, primitive: Primitive) -> PrimitiveId {
        let id = primitive.id;
        if self.id_index.contains_key(&id) {
            return id;
        }
        let parent_idx = self.id_index.get(&parent).copied().unwrap_or(self.root);
        let idx = self.graph.add_node(primitive);
        self.graph.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        id
    }

    /// Remove a primitive and all of its descendants. Returns the primitive.
    pub fn remove(&mut self, id: PrimitiveId) -> Option<Primitive> {
        let idx = self.id_index.get(&id).copied()?;
        if idx == self.root {
            return None;
        }
        for child in self.children_idx(idx) {
            let child_id = self.graph[child].id;
            self.remove(child_id);
        }
        let removed = self.graph.remove_node(idx)?;
        self.id_index.remove(&removed.id);
        Some(removed)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn parent(&self, id: PrimitiveId) -> Option<PrimitiveId> {
        let idx = self.id_index.get(&id).copied()?;
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
            .map(|p| self.graph[p].id)
    }

    /// Move a primitive (and its subtree) under `new_parent`. Returns false
    /// when either id is unknown or the move would create a cycle.
    pub fn reparent(&mut self, id: PrimitiveId, new_parent: PrimitiveId) -> bool {
        let (Some(idx), Some(parent_idx)) = (
            self.id_index.get(&id).copied(),
            self.id_index.get(&new_parent).copied(),
        ) else {
            return false;
        };
        if idx == self.root || self.is_ancestor(idx, parent_idx) {
            log::warn!("reparent: cannot move {id} under {new_parent}");
            return false;
        }
        let incoming: Vec<_> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for edge in incoming {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(parent_idx, idx, ());
        true
    }

    /// True when `ancestor` is `idx` itself or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeIndex, idx: NodeIndex) -> bool {
        let mut current = Some(idx);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self
                .graph
                .neighbors_directed(c, petgraph::Direction::Incoming)
                .next();
        }
        false
    }

    fn children_idx(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Children of a primitive, sorted by index for a deterministic order.
    pub fn children(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        match self.id_index.get(&id) {
            Some(idx) => self
                .children_idx(*idx)
                .into_iter()
                .map(|c| self.graph[c].id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn set_visible(&mut self, id: PrimitiveId, visible: bool) {
        if let Some(p) = self.get_mut(id) {
            p.style.visible = visible;
        }
    }

    /// Visible if the primitive and every ancestor is visible.
    pub fn is_visible(&self, id: PrimitiveId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            match self.get(c) {
                Some(p) if p.style.visible => current = self.parent(c),
                _ => return false,
            }
        }
        true
    }

    pub fn set_stroke(&mut self, id: PrimitiveId, color: &str) {
        if let Some(p) = self.get_mut(id) {
            p.style.stroke = Some(color.to_string());
        }
    }

    pub fn path_data(&self, id: PrimitiveId) -> Option<&str> {
        match &self.get(id)?.kind {
            PrimitiveKind::Path { d } => Some(d),
            _ => None,
        }
    }

    /// Replace the geometry of a path primitive. Returns false when `id` is
    /// not a path.
    pub fn set_path_data(&mut self, id: PrimitiveId, data: String) -> bool {
        match self.get_mut(id).map(|p| &mut p.kind) {
            Some(PrimitiveKind::Path { d }) => {
                *d = data;
                true
            }
            _ => false,
        }
    }

    /// Composite transform from a primitive's local space to scene space.
    pub fn world_transform(&self, id: PrimitiveId) -> Affine {
        let mut affine = Affine::IDENTITY;
        let mut current = Some(id);
        while let Some(c) = current {
            if let Some(p) = self.get(c) {
                affine = p.transform * affine;
            }
            current = self.parent(c);
        }
        affine
    }

    /// Bounding box in scene space, after all ancestor transforms.
    pub fn bounding_box(&self, id: PrimitiveId) -> Option<Rect> {
        let primitive = self.get(id)?;
        match primitive.kind {
            PrimitiveKind::Root | PrimitiveKind::Group => self
                .children(id)
                .into_iter()
                .filter_map(|c| self.bounding_box(c))
                .reduce(|a, b| a.union(b)),
            _ => {
                let local = primitive.local_bounds()?;
                Some(self.world_transform(id).transform_rect_bbox(local))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 1
    }
}
