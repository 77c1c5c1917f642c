//! Arena scene graph with body-tagged nodes.
//!
//! Children inherit only their parent's translation, so a label follows its
//! body around the orbit without picking up the body's spin or size.

use glam::{Vec2, Vec3};

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a body in the body registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

/// Identity carried by a node for picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeTag {
    #[default]
    Untagged,
    Body(BodyId),
}

/// Pick geometry of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Camera-facing square, `size` world units across before node scale.
    /// Only the centered `text_extent` share of it (width, height in 0..=1)
    /// is opaque, and only that part can be picked.
    Billboard { size: f32, text_extent: Vec2 },
    /// Flat ring in the node's XZ plane.
    Ring { radius: f32, thickness: f32 },
}

/// Which render pass sees a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderLayer {
    /// Main scene: drawn, and eligible for picking.
    #[default]
    Main,
    /// Only drawn by the sun's cube capture.
    Capture,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub tag: NodeTag,
    pub translation: Vec3,
    /// Rotation about +Y in radians.
    pub spin: f32,
    /// Uniform x/y scale.
    pub scale: f32,
    pub visible: bool,
    pub layer: RenderLayer,
    pub shape: Option<Shape>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            tag: NodeTag::Untagged,
            translation: Vec3::ZERO,
            spin: 0.0,
            scale: 1.0,
            visible: true,
            layer: RenderLayer::Main,
            shape: None,
        }
    }

    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn on_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            ..node
        });
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add(node);
        self.nodes[id.0].parent = Some(parent);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Translation accumulated from the root down to `id`.
    pub fn world_translation(&self, id: NodeId) -> Vec3 {
        self.ancestry(id).map(|n| n.translation).sum()
    }

    /// Visible only if the node and every ancestor are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.ancestry(id).all(|n| n.visible)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.visible = visible;
        }
    }

    /// The body a node stands for: its own tag, or the nearest tagged ancestor.
    pub fn resolve_body(&self, id: NodeId) -> Option<BodyId> {
        self.ancestry(id).find_map(|n| match n.tag {
            NodeTag::Body(body) => Some(body),
            NodeTag::Untagged => None,
        })
    }

    /// The node followed by its ancestors up to the root.
    fn ancestry(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.get(id), |n| n.parent.and_then(|p| self.get(p)))
    }
}
