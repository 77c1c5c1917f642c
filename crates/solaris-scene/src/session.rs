//! Host-driven frame loops.
//!
//! A [`RenderSession`] owns one [`FrameTask`] and asks a [`FrameScheduler`]
//! for one frame at a time. The host calls [`RenderSession::pump`] when the
//! requested frame is due. Stopping a session cancels its pending request and
//! drops the task together with the GPU resources it owns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

/// Longest frame delta handed to tasks, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Timing of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the session's first frame.
    pub elapsed: f32,
    /// Seconds since the previous frame, clamped to [`MAX_FRAME_DELTA`].
    pub delta: f32,
    /// Zero-based frame index.
    pub frame: u64,
}

/// Produces one [`FrameTime`] per tick.
#[derive(Debug, Default)]
pub struct FrameClock {
    start: Option<Instant>,
    previous: Option<Instant>,
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first tick starts the clock at zero.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let start = *self.start.get_or_insert(now);
        let delta = self
            .previous
            .map(|previous| now.saturating_duration_since(previous).as_secs_f32())
            .unwrap_or(0.0);
        if delta > MAX_FRAME_DELTA {
            warn!(
                "Frame delta {:.1}ms exceeds maximum, clamping to {:.1}ms",
                delta * 1000.0,
                MAX_FRAME_DELTA * 1000.0
            );
        }
        self.previous = Some(now);

        let time = FrameTime {
            elapsed: now.saturating_duration_since(start).as_secs_f32(),
            delta: delta.min(MAX_FRAME_DELTA),
            frame: self.frame,
        };
        self.frame += 1;
        time
    }
}

/// Shared cancelled flag of one frame request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Host hook that arranges for the next frame to be pumped.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> CancelToken;
}

/// Scheduler for tests and headless stepping: records every request.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    requests: Rc<RefCell<Vec<CancelToken>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Requests that have not been cancelled.
    pub fn live_requests(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|t| !t.is_cancelled())
            .count()
    }

    pub fn latest(&self) -> Option<CancelToken> {
        self.requests.borrow().last().cloned()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> CancelToken {
        let token = CancelToken::new();
        self.requests.borrow_mut().push(token.clone());
        token
    }
}

/// Per-frame work of a session.
pub trait FrameTask {
    fn frame(&mut self, time: &FrameTime);
}

/// One frame loop with explicit start and stop.
pub struct RenderSession<T: FrameTask, S: FrameScheduler> {
    label: String,
    task: Option<T>,
    scheduler: S,
    pending: Option<CancelToken>,
    clock: FrameClock,
    frames: u64,
}

impl<T: FrameTask, S: FrameScheduler> RenderSession<T, S> {
    /// Take ownership of `task` and request the first frame.
    pub fn start(label: impl Into<String>, task: T, mut scheduler: S) -> Self {
        let label = label.into();
        let pending = Some(scheduler.request_frame());
        info!("Render session '{label}' started");
        Self {
            label,
            task: Some(task),
            scheduler,
            pending,
            clock: FrameClock::new(),
            frames: 0,
        }
    }

    /// Run the requested frame, if one is pending, then request the next.
    ///
    /// Returns whether a frame ran.
    pub fn pump(&mut self, now: Instant) -> bool {
        let Some(token) = self.pending.take() else {
            return false;
        };
        if token.is_cancelled() {
            debug!("Render session '{}': frame request cancelled", self.label);
            return false;
        }
        let Some(task) = self.task.as_mut() else {
            return false;
        };

        let time = self.clock.tick(now);
        task.frame(&time);
        self.frames += 1;
        self.pending = Some(self.scheduler.request_frame());
        true
    }

    /// Cancel the pending frame and drop the task. Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        if self.task.take().is_some() {
            info!(
                "Render session '{}' stopped after {} frames",
                self.label, self.frames
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn task(&self) -> Option<&T> {
        self.task.as_ref()
    }

    pub fn task_mut(&mut self) -> Option<&mut T> {
        self.task.as_mut()
    }
}

impl<T: FrameTask, S: FrameScheduler> Drop for RenderSession<T, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Weak;
    use std::time::Duration;

    /// Counts frames into a shared cell and holds a stand-in for GPU resources.
    struct CountingTask {
        calls: Rc<Cell<u64>>,
        times: Rc<RefCell<Vec<FrameTime>>>,
        _resources: Rc<()>,
    }

    impl FrameTask for CountingTask {
        fn frame(&mut self, time: &FrameTime) {
            self.calls.set(self.calls.get() + 1);
            self.times.borrow_mut().push(*time);
        }
    }

    fn counting_task() -> (CountingTask, Rc<Cell<u64>>, Weak<()>) {
        let calls = Rc::new(Cell::new(0));
        let resources = Rc::new(());
        let weak = Rc::downgrade(&resources);
        let task = CountingTask {
            calls: calls.clone(),
            times: Rc::new(RefCell::new(Vec::new())),
            _resources: resources,
        };
        (task, calls, weak)
    }

    #[test]
    fn test_start_requests_first_frame() {
        let scheduler = ManualScheduler::new();
        let (task, calls, _) = counting_task();
        let _session = RenderSession::start("main", task, scheduler.clone());
        assert_eq!(scheduler.request_count(), 1);
        assert_eq!(calls.get(), 0, "no frame runs until pumped");
    }

    #[test]
    fn test_each_pump_runs_one_frame_and_requests_next() {
        let scheduler = ManualScheduler::new();
        let (task, calls, _) = counting_task();
        let mut session = RenderSession::start("main", task, scheduler.clone());
        let t0 = Instant::now();
        for i in 0..5 {
            assert!(session.pump(t0 + Duration::from_millis(16 * i)));
        }
        assert_eq!(calls.get(), 5);
        assert_eq!(session.frames(), 5);
        assert_eq!(scheduler.request_count(), 6);
        assert_eq!(scheduler.live_requests(), 6);
    }

    #[test]
    fn test_stop_halts_frames_and_releases_task() {
        let scheduler = ManualScheduler::new();
        let (task, calls, resources) = counting_task();
        let mut session = RenderSession::start("preview", task, scheduler.clone());
        let t0 = Instant::now();
        session.pump(t0);
        session.pump(t0 + Duration::from_millis(16));
        assert_eq!(calls.get(), 2);

        session.stop();
        assert!(!session.is_running());
        assert!(resources.upgrade().is_none(), "task resources must be released");
        assert!(scheduler.latest().is_some_and(|t| t.is_cancelled()));
        assert_eq!(scheduler.live_requests(), 0);

        for i in 2..10 {
            assert!(!session.pump(t0 + Duration::from_millis(16 * i)));
        }
        assert_eq!(calls.get(), 2, "frame counter must stop after close");
        session.stop();
    }

    #[test]
    fn test_drop_stops_session() {
        let scheduler = ManualScheduler::new();
        let (task, _, resources) = counting_task();
        let session = RenderSession::start("preview", task, scheduler.clone());
        drop(session);
        assert!(resources.upgrade().is_none());
        assert_eq!(scheduler.live_requests(), 0);
    }

    #[test]
    fn test_externally_cancelled_request_skips_frame() {
        let scheduler = ManualScheduler::new();
        let (task, calls, _) = counting_task();
        let mut session = RenderSession::start("main", task, scheduler.clone());
        scheduler.latest().unwrap().cancel();
        assert!(!session.pump(Instant::now()));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_frame_times_are_monotonic() {
        let scheduler = ManualScheduler::new();
        let calls = Rc::new(Cell::new(0));
        let times = Rc::new(RefCell::new(Vec::new()));
        let task = CountingTask {
            calls,
            times: times.clone(),
            _resources: Rc::new(()),
        };
        let mut session = RenderSession::start("main", task, scheduler);
        let t0 = Instant::now();
        session.pump(t0);
        session.pump(t0 + Duration::from_millis(20));
        session.pump(t0 + Duration::from_millis(50));

        let times = times.borrow();
        assert_eq!(times[0].elapsed, 0.0);
        assert_eq!(times[0].delta, 0.0);
        assert!((times[1].delta - 0.020).abs() < 1e-4);
        assert!((times[2].elapsed - 0.050).abs() < 1e-4);
        assert_eq!(
            times.iter().map(|t| t.frame).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_clock_clamps_long_frames() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick(t0);
        let time = clock.tick(t0 + Duration::from_secs(3));
        assert_eq!(time.delta, MAX_FRAME_DELTA);
        assert!((time.elapsed - 3.0).abs() < 1e-4, "elapsed is not clamped");
    }
}
