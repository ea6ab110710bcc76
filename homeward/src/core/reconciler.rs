use tracing::{debug, info, warn};

use crate::config::constants::{CLOSE_ZOOM_LEVEL, HOME_DELETED_NOTICE, SELECT_HOME_NOTICE};
use crate::data::coordinate::Coordinate;
use crate::data::home_store::HomeStore;
use crate::models::decoration::{DecorationSet, Marker, RouteLine, StatusText};
use crate::models::route::{RouteRequest, RouteResult};
use crate::render::map_view::MapView;
use crate::utils::logging::{self, OperationCategory, ReconcileType};

/// Everything the map screen knows. Only [`MapStateReconciler`] mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapState {
    current: Option<Coordinate>,
    home: Option<Coordinate>,
    route: Option<RouteResult>,
    selecting_home: bool,
    has_centered_once: bool,
    error: Option<String>,
    permission_denied: bool,
}

impl MapState {
    pub fn current(&self) -> Option<Coordinate> {
        self.current
    }

    pub fn home(&self) -> Option<Coordinate> {
        self.home
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn selecting_home(&self) -> bool {
        self.selecting_home
    }

    pub fn has_centered_once(&self) -> bool {
        self.has_centered_once
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn permission_denied(&self) -> bool {
        self.permission_denied
    }
}

/// A route request the caller must dispatch, tagged with its issue order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub seq: u64,
    pub request: RouteRequest,
}

/// Applies map events to [`MapState`] and redraws the view after each
/// mutation. Only the most recently issued route request may update the
/// route.
pub struct MapStateReconciler<S: HomeStore, V: MapView> {
    state: MapState,
    store: S,
    view: V,
    close_zoom: f64,
    next_seq: u64,
    awaited_seq: Option<u64>,
}

impl<S: HomeStore, V: MapView> MapStateReconciler<S, V> {
    pub fn new(store: S, view: V) -> Self {
        Self::with_close_zoom(store, view, CLOSE_ZOOM_LEVEL)
    }

    /// Loads the persisted home and draws the initial frame.
    pub fn with_close_zoom(store: S, view: V, close_zoom: f64) -> Self {
        let home = store.get();
        if let Some(home) = home {
            info!(%home, "Loaded saved home");
        }

        let mut reconciler = Self {
            state: MapState {
                home,
                ..MapState::default()
            },
            store,
            view,
            close_zoom,
            next_seq: 0,
            awaited_seq: None,
        };
        reconciler.rebuild();
        reconciler
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Sequence number of the request whose result is still wanted.
    pub fn awaited_seq(&self) -> Option<u64> {
        self.awaited_seq
    }

    pub fn on_position_update(&mut self, loc: Coordinate) -> Option<RouteTicket> {
        let _timing = logging::start_timing("on_position_update",
            OperationCategory::Reconcile { subcategory: ReconcileType::Event });

        debug!(%loc, "Position update");
        self.state.current = Some(loc);
        self.state.error = None;
        let ticket = self.issue_request();
        self.rebuild();
        ticket
    }

    pub fn on_select_mode_enabled(&mut self) {
        self.state.selecting_home = true;
        self.view.notify(SELECT_HOME_NOTICE);
        self.rebuild();
    }

    /// Ignored unless select mode is on.
    pub fn on_home_selected(&mut self, p: Coordinate) -> Option<RouteTicket> {
        let _timing = logging::start_timing("on_home_selected",
            OperationCategory::Reconcile { subcategory: ReconcileType::Event });

        if !self.state.selecting_home {
            debug!(%p, "Ignoring home selection outside select mode");
            return None;
        }

        info!(home = %p, "Home selected");
        self.state.home = Some(p);
        self.store.set(p);
        self.state.selecting_home = false;
        self.view.notify(&format!("Home saved at: {}", p));
        let ticket = self.issue_request();
        self.rebuild();
        ticket
    }

    pub fn on_home_deleted(&mut self) {
        let _timing = logging::start_timing("on_home_deleted",
            OperationCategory::Reconcile { subcategory: ReconcileType::Event });

        info!("Home deleted");
        self.state.home = None;
        self.state.route = None;
        self.state.error = None;
        // Any in-flight result belongs to the deleted home
        self.awaited_seq = None;
        self.store.clear();
        self.view.notify(HOME_DELETED_NOTICE);
        self.rebuild();
    }

    pub fn on_permission_denied(&mut self) {
        warn!("Location permission denied; no position will be shown");
        self.state.permission_denied = true;
        self.rebuild();
    }

    /// Returns false when the result is stale and was discarded.
    pub fn on_route_result(&mut self, seq: u64, result: RouteResult) -> bool {
        let _timing = logging::start_timing("on_route_result",
            OperationCategory::Reconcile { subcategory: ReconcileType::Event });

        if self.awaited_seq != Some(seq) {
            debug!(seq, awaited = ?self.awaited_seq, "Discarding stale route result");
            return false;
        }

        self.state.error = match &result {
            Ok(_) => None,
            Err(failure) => Some(failure.user_message().to_string()),
        };
        self.state.route = Some(result);
        self.rebuild();
        true
    }

    fn issue_request(&mut self) -> Option<RouteTicket> {
        let (origin, destination) = match (self.state.current, self.state.home) {
            (Some(origin), Some(destination)) => (origin, destination),
            _ => return None,
        };

        self.next_seq += 1;
        let seq = self.next_seq;
        self.awaited_seq = Some(seq);
        debug!(seq, %origin, %destination, "Issuing route request");
        Some(RouteTicket {
            seq,
            request: RouteRequest::new(origin, destination),
        })
    }

    fn rebuild(&mut self) {
        let _timing = logging::start_timing("rebuild_decorations",
            OperationCategory::Reconcile { subcategory: ReconcileType::Rebuild });

        let mut decorations = DecorationSet::default();

        if let Some(Ok(path)) = &self.state.route {
            if !path.is_empty() {
                decorations.line = Some(RouteLine::new(path.clone()));
            }
        }

        if let Some(current) = self.state.current {
            decorations.markers.push(Marker::self_position(current));
        }

        if let Some(home) = self.state.home {
            decorations.markers.push(Marker::home(home));
        }

        self.view.set_decorations(&decorations);

        if let Some(current) = self.state.current {
            if !self.state.has_centered_once {
                self.view.center_on(current, self.close_zoom);
                self.state.has_centered_once = true;
            }
        }

        self.view.show_status(&StatusText {
            current_location: self.state.current.map(|c| format!("Current location: {}", c)),
            error: self.state.error.clone(),
            permission_denied: self.state.permission_denied,
        });
    }
}
