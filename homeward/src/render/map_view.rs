use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::data::coordinate::Coordinate;
use crate::models::decoration::{DecorationSet, MarkerKind, StatusText};

/// The map widget as seen by the reconciler.
pub trait MapView: Send {
    /// Replaces every position and route overlay with `decorations`.
    fn set_decorations(&mut self, decorations: &DecorationSet);
    fn center_on(&mut self, at: Coordinate, zoom: f64);
    fn show_status(&mut self, status: &StatusText);
    /// Transient message, shown once.
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Clone, Default)]
pub struct ViewRecord {
    pub frames: Vec<DecorationSet>,
    pub centerings: Vec<(Coordinate, f64)>,
    pub statuses: Vec<StatusText>,
    pub notices: Vec<String>,
}

/// Keeps everything it was asked to show. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingMapView {
    record: Arc<Mutex<ViewRecord>>,
}

impl RecordingMapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewRecord {
        self.record.lock().clone()
    }

    pub fn last_frame(&self) -> Option<DecorationSet> {
        self.record.lock().frames.last().cloned()
    }

    pub fn last_status(&self) -> Option<StatusText> {
        self.record.lock().statuses.last().cloned()
    }

    pub fn centering_count(&self) -> usize {
        self.record.lock().centerings.len()
    }
}

impl MapView for RecordingMapView {
    fn set_decorations(&mut self, decorations: &DecorationSet) {
        self.record.lock().frames.push(decorations.clone());
    }

    fn center_on(&mut self, at: Coordinate, zoom: f64) {
        self.record.lock().centerings.push((at, zoom));
    }

    fn show_status(&mut self, status: &StatusText) {
        self.record.lock().statuses.push(status.clone());
    }

    fn notify(&mut self, message: &str) {
        self.record.lock().notices.push(message.to_string());
    }
}

/// Prints each frame for headless runs.
#[derive(Debug, Default)]
pub struct ConsoleMapView {
    frames_drawn: usize,
    last_status: StatusText,
}

impl ConsoleMapView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapView for ConsoleMapView {
    fn set_decorations(&mut self, decorations: &DecorationSet) {
        self.frames_drawn += 1;
        let describe = |kind| {
            decorations
                .marker(kind)
                .map(|m| m.position.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "[frame {}] self: {} | home: {} | route: {}",
            self.frames_drawn,
            describe(MarkerKind::SelfPosition),
            describe(MarkerKind::Home),
            decorations
                .line
                .as_ref()
                .map(|l| format!("{} points", l.path.len()))
                .unwrap_or_else(|| "none".to_string()),
        );
    }

    fn center_on(&mut self, at: Coordinate, zoom: f64) {
        info!(%at, zoom, "Centering map");
    }

    fn show_status(&mut self, status: &StatusText) {
        if *status == self.last_status {
            return;
        }
        if status.permission_denied {
            println!("  ! {}", crate::config::constants::PERMISSION_DENIED_MESSAGE);
        }
        if let Some(location) = &status.current_location {
            println!("  {}", location);
        }
        if let Some(error) = &status.error {
            println!("  error: {}", error);
        }
        self.last_status = status.clone();
    }

    fn notify(&mut self, message: &str) {
        println!("  >> {}", message);
    }
}
