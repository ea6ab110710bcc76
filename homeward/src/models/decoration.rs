use serde::Serialize;

use crate::config::constants::{
    HOME_MARKER_TITLE, ROUTE_LINE_COLOR, ROUTE_LINE_WIDTH, SELF_MARKER_TITLE,
};
use crate::data::coordinate::Coordinate;
use crate::models::route::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    SelfPosition,
    Home,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Coordinate,
    pub title: String,
}

impl Marker {
    pub fn self_position(position: Coordinate) -> Self {
        Self {
            kind: MarkerKind::SelfPosition,
            position,
            title: SELF_MARKER_TITLE.to_string(),
        }
    }

    pub fn home(position: Coordinate) -> Self {
        Self {
            kind: MarkerKind::Home,
            position,
            title: HOME_MARKER_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLine {
    pub path: Path,
    pub color: String,
    pub width: f32,
}

impl RouteLine {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            color: ROUTE_LINE_COLOR.to_string(),
            width: ROUTE_LINE_WIDTH,
        }
    }
}

/// The complete set of position and route overlays for one frame. A view
/// replaces whatever it showed before with this set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecorationSet {
    pub markers: Vec<Marker>,
    pub line: Option<RouteLine>,
}

impl DecorationSet {
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.line.is_none()
    }
}

/// Text lines shown above the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusText {
    pub current_location: Option<String>,
    pub error: Option<String>,
    pub permission_denied: bool,
}
