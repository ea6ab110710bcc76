use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homeward::core::reconciler::MapStateReconciler;
use homeward::core::session::MapSession;
use homeward::data::coordinate::Coordinate;
use homeward::data::home_store::{HomeStore, MemoryHomeStore};
use homeward::data::location::{ChannelLocationSource, LocationFix, LocationSource, UpdateInterval};
use homeward::models::decoration::MarkerKind;
use homeward::models::route::{RouteFailure, RouteRequest, RouteResult};
use homeward::render::map_view::RecordingMapView;
use homeward::services::directions::DirectionsProvider;
use parking_lot::Mutex;

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

/// Answers with a straight origin-to-destination line after a delay keyed by
/// the origin latitude.
struct ScriptedDirections {
    delays: Vec<(f64, Duration)>,
    calls: Mutex<Vec<RouteRequest>>,
}

impl ScriptedDirections {
    fn new(delays: Vec<(f64, Duration)>) -> Self {
        Self {
            delays,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<RouteRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DirectionsProvider for ScriptedDirections {
    async fn request_route(&self, request: RouteRequest) -> RouteResult {
        self.calls.lock().push(request);
        let delay = self
            .delays
            .iter()
            .find(|(lat, _)| *lat == request.origin.latitude())
            .map(|(_, delay)| *delay)
            .unwrap_or(Duration::from_millis(10));
        tokio::time::sleep(delay).await;
        Ok(vec![request.origin, request.destination])
    }
}

struct FailingDirections;

#[async_trait]
impl DirectionsProvider for FailingDirections {
    async fn request_route(&self, _request: RouteRequest) -> RouteResult {
        Err(RouteFailure::NoRouteFound)
    }
}

struct HangingDirections;

#[async_trait]
impl DirectionsProvider for HangingDirections {
    async fn request_route(&self, _request: RouteRequest) -> RouteResult {
        futures::future::pending::<RouteResult>().await
    }
}

#[tokio::test(start_paused = true)]
async fn slower_older_response_does_not_overwrite_newer_route() {
    let home = coord(10.1, 20.1);
    let view = RecordingMapView::new();
    let reconciler = MapStateReconciler::new(MemoryHomeStore::with_home(home), view.clone());
    let directions = Arc::new(ScriptedDirections::new(vec![
        (10.0, Duration::from_secs(5)),
        (10.05, Duration::from_secs(1)),
    ]));
    let (_handle, session) = MapSession::new(reconciler, directions.clone());

    let (sender, source) = ChannelLocationSource::new();
    sender.send(LocationFix::now(coord(10.0, 20.0))).await;
    sender.send(LocationFix::now(coord(10.05, 20.05))).await;
    drop(sender);

    let state = session.run(source.subscribe(UpdateInterval::default())).await;

    assert_eq!(directions.calls().len(), 2);
    assert_eq!(state.route(), Some(&Ok(vec![coord(10.05, 20.05), home])));
    assert_eq!(
        view.last_frame().unwrap().line.unwrap().path,
        vec![coord(10.05, 20.05), home]
    );
}

#[tokio::test]
async fn select_home_then_fix_draws_route_and_persists_home() {
    let store = MemoryHomeStore::new();
    let view = RecordingMapView::new();
    let reconciler = MapStateReconciler::new(store.clone(), view.clone());
    let directions = Arc::new(ScriptedDirections::new(Vec::new()));
    let (handle, session) = MapSession::new(reconciler, directions.clone());

    let home = coord(9.95, -84.05);
    handle.enable_select_mode().await;
    handle.long_press(home).await;

    let (sender, source) = ChannelLocationSource::new();
    sender.send(LocationFix::now(coord(9.93, -84.08))).await;
    drop(sender);

    let state = session.run(source.subscribe(UpdateInterval::default())).await;

    assert_eq!(store.get(), Some(home));
    assert_eq!(state.home(), Some(home));
    assert!(!state.selecting_home());
    assert_eq!(directions.calls(), vec![RouteRequest::new(coord(9.93, -84.08), home)]);

    let frame = view.last_frame().unwrap();
    assert!(frame.marker(MarkerKind::SelfPosition).is_some());
    assert!(frame.marker(MarkerKind::Home).is_some());
    assert_eq!(frame.line.unwrap().path.len(), 2);
    assert_eq!(view.centering_count(), 1);
}

#[tokio::test]
async fn long_press_without_select_mode_is_ignored() {
    let store = MemoryHomeStore::new();
    let reconciler = MapStateReconciler::new(store.clone(), RecordingMapView::new());
    let directions = Arc::new(ScriptedDirections::new(Vec::new()));
    let (handle, session) = MapSession::new(reconciler, directions.clone());

    handle.long_press(coord(9.95, -84.05)).await;

    let (sender, source) = ChannelLocationSource::new();
    sender.send(LocationFix::now(coord(9.93, -84.08))).await;
    drop(sender);

    let state = session.run(source.subscribe(UpdateInterval::default())).await;
    assert_eq!(state.home(), None);
    assert_eq!(store.get(), None);
    assert!(directions.calls().is_empty());
}

#[tokio::test]
async fn failed_route_surfaces_error_text() {
    let view = RecordingMapView::new();
    let reconciler = MapStateReconciler::new(MemoryHomeStore::with_home(coord(40.0, 60.0)), view.clone());
    let (_handle, session) = MapSession::new(reconciler, Arc::new(FailingDirections));

    let (sender, source) = ChannelLocationSource::new();
    sender.send(LocationFix::now(coord(10.0, 20.0))).await;
    drop(sender);

    let state = session.run(source.subscribe(UpdateInterval::default())).await;
    assert_eq!(state.route(), Some(&Err(RouteFailure::NoRouteFound)));
    assert_eq!(state.error(), Some("no route found"));
    assert_eq!(view.last_status().unwrap().error.as_deref(), Some("no route found"));
    assert!(view.last_frame().unwrap().line.is_none());
}

#[tokio::test]
async fn silent_location_source_keeps_session_alive_until_teardown() {
    let view = RecordingMapView::new();
    let reconciler = MapStateReconciler::new(MemoryHomeStore::new(), view.clone());
    let (handle, session) = MapSession::new(reconciler, Arc::new(FailingDirections));

    // Sender stays alive: no fix is ever delivered
    let (_sender, source) = ChannelLocationSource::new();
    let running = tokio::spawn(session.run(source.subscribe(UpdateInterval::default())));

    handle.permission_denied().await;
    drop(handle);

    let state = running.await.unwrap();
    assert_eq!(state.current(), None);
    assert!(state.permission_denied());
    assert!(view.last_status().unwrap().permission_denied);
    assert_eq!(view.centering_count(), 0);
}

#[tokio::test]
async fn teardown_abandons_in_flight_request() {
    let reconciler = MapStateReconciler::new(MemoryHomeStore::with_home(coord(10.1, 20.1)), RecordingMapView::new());
    let (handle, session) = MapSession::new(reconciler, Arc::new(HangingDirections));

    let (sender, source) = ChannelLocationSource::new();
    let running = tokio::spawn(session.run(source.subscribe(UpdateInterval::default())));

    sender.send(LocationFix::now(coord(10.0, 20.0))).await;
    tokio::task::yield_now().await;
    drop(handle);

    let state = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("session should end on teardown")
        .unwrap();
    assert!(state.route().is_none());
}
