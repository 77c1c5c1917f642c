//! GPU-free core of the orrery: the body manifest and scene graph, per-frame
//! kinematics and label scaling, picking and selection, render sessions, and
//! the bridge from selection to overlays.

pub mod bridge;
pub mod frame;
pub mod graph;
pub mod kinematics;
pub mod labels;
pub mod manifest;
pub mod picking;
pub mod registry;
pub mod selection;
pub mod session;

pub use bridge::{OverlayView, PreviewError, PreviewLauncher, UiBridge};
pub use frame::{FrameStages, run_frame};
pub use graph::{BodyId, Node, NodeId, NodeTag, RenderLayer, SceneGraph, Shape};
pub use kinematics::{SimulationState, orbital_position, spin_rate_per_frame, update_bodies};
pub use labels::{
    LABEL_FONT_SHARE, LABEL_LINE_SHARE, estimated_text_extent, label_scale, update_label_scales,
};
pub use manifest::{
    BodyDescriptor, BodyInfo, ManifestError, default_manifest, load_manifest, validate_manifest,
};
pub use picking::{PickHit, pick, pointer_to_ndc};
pub use registry::{
    BodyRegistry, CelestialBody, OrbitGuide, SceneSettings, SolarScene, compose_scene,
};
pub use selection::{Selection, SelectionChange};
pub use session::{
    CancelToken, FrameClock, FrameScheduler, FrameTask, FrameTime, ManualScheduler,
    RenderSession,
};
