use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::constants::EVENT_CHANNEL_CAPACITY;
use crate::core::reconciler::{MapState, MapStateReconciler, RouteTicket};
use crate::data::coordinate::Coordinate;
use crate::data::home_store::HomeStore;
use crate::data::location::LocationFix;
use crate::models::route::RouteResult;
use crate::render::map_view::MapView;
use crate::services::directions::DirectionsProvider;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    SelectModeEnabled,
    LongPress(Coordinate),
    HomeDeleted,
    PermissionDenied,
}

/// UI side of a running session. The session tears down once every handle
/// is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<MapEvent>,
}

impl SessionHandle {
    /// Returns false if the session has already ended.
    pub async fn send(&self, event: MapEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn enable_select_mode(&self) -> bool {
        self.send(MapEvent::SelectModeEnabled).await
    }

    pub async fn long_press(&self, at: Coordinate) -> bool {
        self.send(MapEvent::LongPress(at)).await
    }

    pub async fn delete_home(&self) -> bool {
        self.send(MapEvent::HomeDeleted).await
    }

    pub async fn permission_denied(&self) -> bool {
        self.send(MapEvent::PermissionDenied).await
    }
}

/// Control loop for one map screen. All state mutation and redraws happen
/// on the task running [`MapSession::run`]; route requests run on spawned
/// tasks and report back into the same loop.
pub struct MapSession<S: HomeStore, V: MapView> {
    reconciler: MapStateReconciler<S, V>,
    directions: Arc<dyn DirectionsProvider>,
    events: mpsc::Receiver<MapEvent>,
    requests: JoinSet<(u64, RouteResult)>,
}

impl<S: HomeStore, V: MapView> MapSession<S, V> {
    pub fn new(
        reconciler: MapStateReconciler<S, V>,
        directions: Arc<dyn DirectionsProvider>,
    ) -> (SessionHandle, Self) {
        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = Self {
            reconciler,
            directions,
            events,
            requests: JoinSet::new(),
        };
        (SessionHandle { tx }, session)
    }

    /// Runs until every handle is dropped, or until `location` ends with no
    /// route request in flight. UI events queued before a location fix are
    /// applied first. Dropping the session aborts in-flight requests.
    pub async fn run<L>(mut self, mut location: L) -> MapState
    where
        L: Stream<Item = LocationFix> + Unpin,
    {
        let mut location_open = true;

        loop {
            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        info!("All session handles dropped; tearing down");
                        break;
                    }
                },

                Some(joined) = self.requests.join_next(), if !self.requests.is_empty() => match joined {
                    Ok((seq, result)) => {
                        self.reconciler.on_route_result(seq, result);
                    }
                    Err(e) => error!("Route request task failed: {}", e),
                },

                fix = location.next(), if location_open => match fix {
                    Some(fix) => {
                        let ticket = self.reconciler.on_position_update(fix.coordinate);
                        self.dispatch(ticket);
                    }
                    None => {
                        debug!("Location stream ended");
                        location_open = false;
                    }
                },
            }

            if !location_open && self.requests.is_empty() {
                info!("Location source exhausted and no route pending; ending session");
                break;
            }
        }

        self.requests.abort_all();
        self.reconciler.state().clone()
    }

    fn apply(&mut self, event: MapEvent) {
        match event {
            MapEvent::SelectModeEnabled => self.reconciler.on_select_mode_enabled(),
            MapEvent::LongPress(at) => {
                let ticket = self.reconciler.on_home_selected(at);
                self.dispatch(ticket);
            }
            MapEvent::HomeDeleted => self.reconciler.on_home_deleted(),
            MapEvent::PermissionDenied => self.reconciler.on_permission_denied(),
        }
    }

    fn dispatch(&mut self, ticket: Option<RouteTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let directions = Arc::clone(&self.directions);
        self.requests.spawn(async move {
            let result = directions.request_route(ticket.request).await;
            (ticket.seq, result)
        });
    }
}
