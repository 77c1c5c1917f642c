//! Overlay panels rendered as the window title plus log output.

use std::sync::Arc;

use solaris_scene::{BodyInfo, OverlayView};
use tracing::info;
use winit::window::Window;

/// Shows the welcome and detail panels through the main window's title bar,
/// writing the full detail payload to the log.
pub struct ConsoleOverlay {
    window: Arc<Window>,
    base_title: String,
    welcome: bool,
    details: Option<String>,
}

impl ConsoleOverlay {
    pub fn new(window: Arc<Window>, base_title: impl Into<String>) -> Self {
        Self {
            window,
            base_title: base_title.into(),
            welcome: false,
            details: None,
        }
    }

    fn refresh(&self) {
        self.window.set_title(&overlay_title(
            &self.base_title,
            self.welcome,
            self.details.as_deref(),
        ));
    }
}

impl OverlayView for ConsoleOverlay {
    fn show_welcome(&mut self) {
        self.welcome = true;
        info!("Welcome to {}! Press Enter to start exploring.", self.base_title);
        info!("Drag to orbit, scroll to zoom, click a planet for details, Esc to close them.");
        self.refresh();
    }

    fn hide_welcome(&mut self) {
        self.welcome = false;
        self.refresh();
    }

    fn show_details(&mut self, name: &str, body: &BodyInfo) {
        self.details = Some(name.to_string());
        for line in detail_lines(name, body) {
            info!("{line}");
        }
        self.refresh();
    }

    fn hide_details(&mut self) {
        self.details = None;
        self.refresh();
    }
}

pub fn overlay_title(base: &str, welcome: bool, details: Option<&str>) -> String {
    match (welcome, details) {
        (true, _) => format!("{base} - press Enter to begin"),
        (false, Some(name)) => format!("{base} - {name} (Esc to close)"),
        (false, None) => base.to_string(),
    }
}

/// The detail panel, one line per field, payload verbatim.
pub fn detail_lines(name: &str, body: &BodyInfo) -> Vec<String> {
    let mut lines = vec![
        format!("== {name} =="),
        format!("Day length: {}", body.day_length),
        format!("Gravity: {}", body.gravity),
        format!("Diameter: {}", body.diameter),
    ];
    lines.extend(body.facts.iter().map(|fact| format!("* {fact}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use solaris_scene::default_manifest;

    #[test]
    fn test_title_states() {
        assert_eq!(overlay_title("Solaris", false, None), "Solaris");
        assert!(overlay_title("Solaris", true, Some("Mars")).contains("Enter"));
        assert_eq!(
            overlay_title("Solaris", false, Some("Mars")),
            "Solaris - Mars (Esc to close)"
        );
    }

    #[test]
    fn test_detail_lines_carry_payload_verbatim() {
        let manifest = default_manifest();
        let earth = manifest.iter().find(|b| b.name == "Earth").unwrap();
        let lines = detail_lines(&earth.name, &earth.info);
        assert_eq!(lines[0], "== Earth ==");
        assert!(lines.iter().any(|l| l.ends_with(&earth.info.day_length)));
        assert!(lines.iter().any(|l| l.ends_with(&earth.info.gravity)));
        assert_eq!(lines.len(), 4 + earth.info.facts.len());
        for fact in &earth.info.facts {
            assert!(lines.contains(&format!("* {fact}")));
        }
    }
}
