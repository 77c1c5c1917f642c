//! Selection to overlay lifecycle.
//!
//! Selection is the only state the overlay layer observes. Selecting a body
//! opens its details and starts an isolated preview session; closing stops
//! the preview before the selection is cleared, so no preview frame outlives
//! its overlay.

use std::time::Instant;

use tracing::{error, info};

use crate::graph::BodyId;
use crate::manifest::BodyInfo;
use crate::registry::{BodyRegistry, CelestialBody};
use crate::selection::{Selection, SelectionChange};
use crate::session::{FrameScheduler, FrameTask, RenderSession};

/// Overlay panels shown over the render surface.
pub trait OverlayView {
    fn show_welcome(&mut self);
    fn hide_welcome(&mut self);
    fn show_details(&mut self, name: &str, info: &BodyInfo);
    fn hide_details(&mut self);
}

/// Errors from creating a detail preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("failed to create preview window: {0}")]
    Window(String),

    #[error("failed to initialise preview renderer: {0}")]
    Render(String),
}

/// Builds the isolated preview renderer for one body.
pub trait PreviewLauncher {
    type Task: FrameTask;
    type Scheduler: FrameScheduler;

    fn launch(
        &mut self,
        body: &CelestialBody,
    ) -> Result<(Self::Task, Self::Scheduler), PreviewError>;
}

pub struct UiBridge<V: OverlayView, T: FrameTask, S: FrameScheduler> {
    view: V,
    welcome_visible: bool,
    details: Option<BodyId>,
    preview: Option<RenderSession<T, S>>,
}

impl<V: OverlayView, T: FrameTask, S: FrameScheduler> UiBridge<V, T, S> {
    /// Shows the welcome overlay.
    pub fn new(mut view: V) -> Self {
        view.show_welcome();
        Self {
            view,
            welcome_visible: true,
            details: None,
            preview: None,
        }
    }

    /// Hide the welcome overlay. Later calls do nothing.
    pub fn dismiss_welcome(&mut self) {
        if self.welcome_visible {
            self.welcome_visible = false;
            self.view.hide_welcome();
        }
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    /// The welcome overlay is modal: picks are ignored until it is dismissed.
    pub fn picking_enabled(&self) -> bool {
        !self.welcome_visible
    }

    /// Open the details and preview for a newly selected body, replacing any
    /// preview that is already running.
    pub fn on_selection<L>(
        &mut self,
        change: SelectionChange,
        registry: &BodyRegistry,
        launcher: &mut L,
    ) where
        L: PreviewLauncher<Task = T, Scheduler = S>,
    {
        let SelectionChange::Selected { current, .. } = change else {
            return;
        };
        let Some(body) = registry.get(current) else {
            error!("Selected body {current:?} is not registered");
            return;
        };

        self.stop_preview();
        self.view.show_details(body.name(), &body.descriptor.info);
        self.details = Some(current);

        match launcher.launch(body) {
            Ok((task, scheduler)) => {
                self.preview = Some(RenderSession::start(
                    format!("{} preview", body.name()),
                    task,
                    scheduler,
                ));
            }
            Err(e) => error!("Preview for {} unavailable: {e}", body.name()),
        }
    }

    /// The close action: stop the preview, hide details, then clear the selection.
    pub fn close(&mut self, selection: &mut Selection) {
        self.stop_preview();
        if self.details.take().is_some() {
            self.view.hide_details();
        }
        if let Some(body) = selection.clear() {
            info!("Selection cleared ({body:?})");
        }
    }

    /// Drive the preview loop; returns whether a preview frame ran.
    pub fn pump_preview(&mut self, now: Instant) -> bool {
        self.preview.as_mut().is_some_and(|p| p.pump(now))
    }

    pub fn details_body(&self) -> Option<BodyId> {
        self.details
    }

    pub fn preview(&self) -> Option<&RenderSession<T, S>> {
        self.preview.as_ref()
    }

    pub fn preview_task(&self) -> Option<&T> {
        self.preview.as_ref().and_then(|p| p.task())
    }

    pub fn preview_task_mut(&mut self) -> Option<&mut T> {
        self.preview.as_mut().and_then(|p| p.task_mut())
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    fn stop_preview(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::default_manifest;
    use crate::registry::{SceneSettings, SolarScene, compose_scene};
    use crate::session::{FrameTime, ManualScheduler};
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        ShowWelcome,
        HideWelcome,
        ShowDetails(String),
        HideDetails,
    }

    #[derive(Default)]
    struct RecordingView {
        events: Rc<RefCell<Vec<Event>>>,
    }

    impl OverlayView for RecordingView {
        fn show_welcome(&mut self) {
            self.events.borrow_mut().push(Event::ShowWelcome);
        }
        fn hide_welcome(&mut self) {
            self.events.borrow_mut().push(Event::HideWelcome);
        }
        fn show_details(&mut self, name: &str, info: &BodyInfo) {
            assert!(!info.facts.is_empty(), "payload is passed verbatim");
            self.events
                .borrow_mut()
                .push(Event::ShowDetails(name.to_string()));
        }
        fn hide_details(&mut self) {
            self.events.borrow_mut().push(Event::HideDetails);
        }
    }

    struct PreviewTask {
        frames: Rc<Cell<u64>>,
        _gpu: Rc<()>,
    }

    impl FrameTask for PreviewTask {
        fn frame(&mut self, _time: &FrameTime) {
            self.frames.set(self.frames.get() + 1);
        }
    }

    #[derive(Default)]
    struct TestLauncher {
        frames: Rc<Cell<u64>>,
        contexts: Vec<Weak<()>>,
        launched: Vec<String>,
        fail: bool,
    }

    impl PreviewLauncher for TestLauncher {
        type Task = PreviewTask;
        type Scheduler = ManualScheduler;

        fn launch(
            &mut self,
            body: &CelestialBody,
        ) -> Result<(PreviewTask, ManualScheduler), PreviewError> {
            if self.fail {
                return Err(PreviewError::Window("no display".into()));
            }
            let gpu = Rc::new(());
            self.contexts.push(Rc::downgrade(&gpu));
            self.launched.push(body.name().to_string());
            Ok((
                PreviewTask {
                    frames: self.frames.clone(),
                    _gpu: gpu,
                },
                ManualScheduler::new(),
            ))
        }
    }

    type Bridge = UiBridge<RecordingView, PreviewTask, ManualScheduler>;

    fn setup() -> (Bridge, Rc<RefCell<Vec<Event>>>, SolarScene) {
        let view = RecordingView::default();
        let events = view.events.clone();
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        (UiBridge::new(view), events, scene)
    }

    fn pick(
        bridge: &mut Bridge,
        selection: &mut Selection,
        scene: &SolarScene,
        launcher: &mut TestLauncher,
        name: &str,
    ) {
        let id = scene.registry.find_by_name(name).unwrap().id;
        let change = selection.select(id);
        bridge.on_selection(change, &scene.registry, launcher);
    }

    #[test]
    fn test_welcome_shown_once_and_blocks_picking() {
        let (mut bridge, events, _) = setup();
        assert!(!bridge.picking_enabled());
        bridge.dismiss_welcome();
        bridge.dismiss_welcome();
        assert!(bridge.picking_enabled());
        assert_eq!(
            *events.borrow(),
            vec![Event::ShowWelcome, Event::HideWelcome]
        );
    }

    #[test]
    fn test_selection_opens_details_and_preview() {
        let (mut bridge, events, scene) = setup();
        let mut selection = Selection::new();
        let mut launcher = TestLauncher::default();
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Earth");

        assert!(events.borrow().contains(&Event::ShowDetails("Earth".into())));
        assert!(bridge.preview().is_some_and(|p| p.is_running()));
        assert!(bridge.pump_preview(Instant::now()));
        assert_eq!(launcher.frames.get(), 1);
    }

    #[test]
    fn test_close_tears_down_preview_before_clearing() {
        let (mut bridge, events, scene) = setup();
        let mut selection = Selection::new();
        let mut launcher = TestLauncher::default();
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Mars");

        let t0 = Instant::now();
        for i in 0..3 {
            bridge.pump_preview(t0 + Duration::from_millis(16 * i));
        }
        assert_eq!(launcher.frames.get(), 3);

        bridge.close(&mut selection);
        assert_eq!(selection.current(), None);
        assert!(bridge.preview().is_none());
        assert!(
            launcher.contexts.iter().all(|c| c.upgrade().is_none()),
            "preview GPU context must be released"
        );
        assert_eq!(events.borrow().last(), Some(&Event::HideDetails));

        for i in 3..10 {
            assert!(!bridge.pump_preview(t0 + Duration::from_millis(16 * i)));
        }
        assert_eq!(launcher.frames.get(), 3, "no preview frame after close");
    }

    #[test]
    fn test_switching_bodies_replaces_preview() {
        let (mut bridge, _, scene) = setup();
        let mut selection = Selection::new();
        let mut launcher = TestLauncher::default();
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Venus");
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Saturn");

        assert_eq!(launcher.launched, vec!["Venus", "Saturn"]);
        assert!(launcher.contexts[0].upgrade().is_none(), "old preview released");
        assert!(launcher.contexts[1].upgrade().is_some());
        let saturn = scene.registry.find_by_name("Saturn").unwrap().id;
        assert_eq!(bridge.details_body(), Some(saturn));
        assert_eq!(selection.current(), Some(saturn));
    }

    #[test]
    fn test_reselecting_same_body_keeps_preview() {
        let (mut bridge, _, scene) = setup();
        let mut selection = Selection::new();
        let mut launcher = TestLauncher::default();
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Jupiter");
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Jupiter");
        assert_eq!(launcher.launched.len(), 1);
        assert!(launcher.contexts[0].upgrade().is_some());
    }

    #[test]
    fn test_failed_launch_still_shows_details() {
        let (mut bridge, events, scene) = setup();
        let mut selection = Selection::new();
        let mut launcher = TestLauncher {
            fail: true,
            ..Default::default()
        };
        pick(&mut bridge, &mut selection, &scene, &mut launcher, "Neptune");

        assert!(events.borrow().contains(&Event::ShowDetails("Neptune".into())));
        assert!(bridge.preview().is_none());
        assert!(selection.current().is_some());
        assert!(!bridge.pump_preview(Instant::now()));
    }

    #[test]
    fn test_close_without_selection_is_harmless() {
        let (mut bridge, events, _) = setup();
        let mut selection = Selection::new();
        bridge.close(&mut selection);
        assert_eq!(*events.borrow(), vec![Event::ShowWelcome]);
    }
}
