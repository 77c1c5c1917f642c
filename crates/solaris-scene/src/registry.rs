//! Body registry and one-shot scene composition from a manifest.

use glam::{Vec2, Vec3};

use crate::graph::{BodyId, Node, NodeId, NodeTag, RenderLayer, SceneGraph, Shape};
use crate::labels::estimated_text_extent;
use crate::manifest::BodyDescriptor;

/// One orbiting body: its manifest entry, its nodes, and its integrated spin.
#[derive(Debug, Clone)]
pub struct CelestialBody {
    pub id: BodyId,
    pub descriptor: BodyDescriptor,
    pub node: NodeId,
    pub label: NodeId,
    /// Accumulated every frame; the only integrated state of a body.
    pub spin_angle: f32,
}

impl CelestialBody {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Static ring marking a body's orbit, built once and never updated.
#[derive(Debug, Clone)]
pub struct OrbitGuide {
    pub body: BodyId,
    pub radius: f32,
    pub node: NodeId,
    pub segments: u32,
}

impl OrbitGuide {
    /// Closed polyline on the XZ plane; the first point is repeated at the end.
    pub fn points(&self) -> Vec<Vec3> {
        let segments = self.segments.max(3);
        (0..=segments)
            .map(|i| {
                let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
                Vec3::new(self.radius * angle.cos(), 0.0, self.radius * angle.sin())
            })
            .collect()
    }
}

/// Ordered, closed list of bodies. Nothing is added or removed after composition.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<CelestialBody>,
}

impl BodyRegistry {
    pub fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(id.0)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut CelestialBody> {
        self.bodies.get_mut(id.0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CelestialBody> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CelestialBody> {
        self.bodies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Scene-building parameters taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub sun_radius: f32,
    /// Half-width of an orbit guide ring for picking.
    pub guide_thickness: f32,
    pub orbit_guide_segments: u32,
    /// Label quad size before distance scaling.
    pub label_size: f32,
    /// Gap between a body's surface and its label.
    pub label_gap: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            sun_radius: 16.0,
            guide_thickness: 0.5,
            orbit_guide_segments: 128,
            label_size: 1.0,
            label_gap: 2.0,
        }
    }
}

/// Everything the main scene draws and picks.
#[derive(Debug)]
pub struct SolarScene {
    pub graph: SceneGraph,
    pub registry: BodyRegistry,
    pub guides: Vec<OrbitGuide>,
    pub sun: NodeId,
    /// Capture-only sphere emitting the turbulence pattern.
    pub noise_sphere: NodeId,
}

impl SolarScene {
    /// Narrow the pickable part of a body's label to the text actually drawn.
    /// `false` if the body is unknown.
    pub fn set_label_text_extent(&mut self, id: BodyId, extent: Vec2) -> bool {
        let Some(label) = self.registry.get(id).map(|body| body.label) else {
            return false;
        };
        let Some(Shape::Billboard { text_extent, .. }) =
            self.graph.get_mut(label).and_then(|node| node.shape.as_mut())
        else {
            return false;
        };
        *text_extent = extent.clamp(Vec2::ZERO, Vec2::ONE);
        true
    }
}

/// Build the sun, the capture sphere, and one body, label and orbit guide per entry.
pub fn compose_scene(manifest: &[BodyDescriptor], settings: &SceneSettings) -> SolarScene {
    let mut graph = SceneGraph::new();

    let sun = graph.add(Node::new("Sun").with_shape(Shape::Sphere {
        radius: settings.sun_radius,
    }));
    let noise_sphere = graph.add(
        Node::new("Sun turbulence")
            .with_shape(Shape::Sphere {
                radius: settings.sun_radius,
            })
            .on_layer(RenderLayer::Capture),
    );

    let mut bodies = Vec::with_capacity(manifest.len());
    let mut guides = Vec::with_capacity(manifest.len());

    for (index, descriptor) in manifest.iter().enumerate() {
        let id = BodyId(index);
        let node = graph.add(
            Node::new(descriptor.name.clone())
                .with_tag(NodeTag::Body(id))
                .with_translation(Vec3::new(descriptor.orbit_radius, 0.0, 0.0))
                .with_shape(Shape::Sphere {
                    radius: descriptor.display_size,
                }),
        );
        let label = graph.add_child(
            node,
            Node::new(format!("{} label", descriptor.name))
                .with_translation(Vec3::Y * (descriptor.display_size + settings.label_gap))
                .with_shape(Shape::Billboard {
                    size: settings.label_size,
                    text_extent: estimated_text_extent(&descriptor.name),
                }),
        );
        let guide_node = graph.add(Node::new(format!("{} orbit", descriptor.name)).with_shape(
            Shape::Ring {
                radius: descriptor.orbit_radius,
                thickness: settings.guide_thickness,
            },
        ));

        bodies.push(CelestialBody {
            id,
            descriptor: descriptor.clone(),
            node,
            label,
            spin_angle: 0.0,
        });
        guides.push(OrbitGuide {
            body: id,
            radius: descriptor.orbit_radius,
            node: guide_node,
            segments: settings.orbit_guide_segments,
        });
    }

    tracing::info!(
        "Composed scene: {} bodies, {} nodes",
        bodies.len(),
        graph.len()
    );

    SolarScene {
        graph,
        registry: BodyRegistry { bodies },
        guides,
        sun,
        noise_sphere,
    }
}
