//! Pointer picking against the scene graph.
//!
//! Every visible main-layer node with a shape is intersected. Hits resolve to
//! a body through the node's ancestors; untagged hits (sun, guides) are
//! discarded and the closest remaining body wins.

use glam::{Vec2, Vec3};
use solaris_render::Ray;

use crate::graph::{BodyId, NodeId, RenderLayer, SceneGraph, Shape};

/// The body under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub body: BodyId,
    /// Node actually hit (the body or its label).
    pub node: NodeId,
    pub distance: f32,
}

/// Surface pixel to normalized device coordinates (+Y up).
///
/// `None` for a zero-sized surface.
pub fn pointer_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Option<Vec2> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vec2::new(x / width * 2.0 - 1.0, 1.0 - y / height * 2.0))
}

/// Closest body hit by `ray`, ignoring untagged nodes.
pub fn pick(graph: &SceneGraph, ray: &Ray) -> Option<PickHit> {
    graph
        .iter()
        .filter(|(id, node)| node.layer == RenderLayer::Main && graph.is_visible(*id))
        .filter_map(|(id, node)| {
            let shape = node.shape?;
            let center = graph.world_translation(id);
            let distance = intersect_shape(ray, shape, center, node.scale)?;
            let body = graph.resolve_body(id)?;
            Some(PickHit {
                body,
                node: id,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

fn intersect_shape(ray: &Ray, shape: Shape, center: Vec3, scale: f32) -> Option<f32> {
    match shape {
        Shape::Sphere { radius } => ray.intersect_sphere(center, radius),
        Shape::Billboard { size, text_extent } => {
            // The quad faces the eye, so its plane normal points back along the ray origin.
            let normal = (ray.origin - center).try_normalize()?;
            let t = ray.intersect_plane(center, normal)?;
            let offset = ray.at(t) - center;
            let (right, up) = billboard_axes(normal);
            // Transparent margins around the text are not part of the label.
            let half = text_extent * size * scale * 0.5;
            (offset.dot(right).abs() <= half.x && offset.dot(up).abs() <= half.y).then_some(t)
        }
        Shape::Ring { radius, thickness } => {
            let t = ray.intersect_plane(center, Vec3::Y)?;
            let from_center = (ray.at(t) - center).length();
            ((from_center - radius).abs() <= thickness).then_some(t)
        }
    }
}

/// Screen-aligned right and up of a billboard facing along `normal`.
fn billboard_axes(normal: Vec3) -> (Vec3, Vec3) {
    let up = if normal.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let right = up.cross(normal).normalize();
    (right, normal.cross(right))
}
