use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::constants::{
    DESIRED_UPDATE_INTERVAL_MS, FASTEST_UPDATE_INTERVAL_MS, LOCATION_CHANNEL_CAPACITY,
};
use crate::data::coordinate::{Coordinate, CoordinateError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub recorded_at: DateTime<Utc>,
    pub accuracy_m: Option<f64>,
}

impl LocationFix {
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            recorded_at: Utc::now(),
            accuracy_m: None,
        }
    }
}

/// Requested delivery cadence. `fastest_ms` is a hard floor between two
/// deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateInterval {
    pub desired_ms: u64,
    pub fastest_ms: u64,
}

impl Default for UpdateInterval {
    fn default() -> Self {
        Self {
            desired_ms: DESIRED_UPDATE_INTERVAL_MS,
            fastest_ms: FASTEST_UPDATE_INTERVAL_MS,
        }
    }
}

impl UpdateInterval {
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.desired_ms.max(self.fastest_ms))
    }
}

/// A platform position provider. Subscribing consumes the source.
pub trait LocationSource {
    fn subscribe(self, interval: UpdateInterval) -> LocationSubscription;
}

/// Live feed of position fixes. Dropping it stops the producer.
pub struct LocationSubscription {
    rx: mpsc::Receiver<LocationFix>,
    producer: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    pub fn from_receiver(rx: mpsc::Receiver<LocationFix>) -> Self {
        Self { rx, producer: None }
    }

    fn with_producer(rx: mpsc::Receiver<LocationFix>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }
}

impl Stream for LocationSubscription {
    type Item = LocationFix;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// Source fed by an external bridge through a [`LocationSender`].
pub struct ChannelLocationSource {
    rx: mpsc::Receiver<LocationFix>,
}

#[derive(Clone)]
pub struct LocationSender {
    tx: mpsc::Sender<LocationFix>,
}

impl LocationSender {
    /// Returns false once the subscriber is gone.
    pub async fn send(&self, fix: LocationFix) -> bool {
        self.tx.send(fix).await.is_ok()
    }
}

impl ChannelLocationSource {
    pub fn new() -> (LocationSender, Self) {
        let (tx, rx) = mpsc::channel(LOCATION_CHANNEL_CAPACITY);
        (LocationSender { tx }, Self { rx })
    }
}

impl LocationSource for ChannelLocationSource {
    fn subscribe(self, _interval: UpdateInterval) -> LocationSubscription {
        LocationSubscription::from_receiver(self.rx)
    }
}

#[derive(Debug, Error)]
pub enum TrackLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid point on row {row}: {source}")]
    InvalidPoint { row: usize, source: CoordinateError },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
}

#[derive(Deserialize)]
struct TrackRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    accuracy: Option<f64>,
}

pub fn load_track(path: &Path) -> Result<Vec<TrackPoint>, TrackLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    load_track_from_reader(contents.as_bytes())
}

pub fn load_track_from_reader<R: Read>(reader: R) -> Result<Vec<TrackPoint>, TrackLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (index, result) in reader.deserialize::<TrackRow>().enumerate() {
        let row = result?;
        let coordinate = Coordinate::new(row.latitude, row.longitude)
            .map_err(|source| TrackLoadError::InvalidPoint { row: index + 1, source })?;
        points.push(TrackPoint {
            coordinate,
            accuracy_m: row.accuracy,
        });
    }
    Ok(points)
}

/// Replays a recorded track at the subscribed cadence.
pub struct ReplayLocationSource {
    points: Vec<TrackPoint>,
    paced: bool,
}

impl ReplayLocationSource {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points, paced: true }
    }

    /// Emit fixes back to back, ignoring the cadence.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl LocationSource for ReplayLocationSource {
    /// Must be called from within a tokio runtime.
    fn subscribe(self, interval: UpdateInterval) -> LocationSubscription {
        let (tx, rx) = mpsc::channel(LOCATION_CHANNEL_CAPACITY);
        let spacing = interval.spacing();
        let paced = self.paced;
        let points = self.points;
        info!(points = points.len(), ?spacing, paced, "Starting track replay");

        let producer = tokio::spawn(async move {
            for (index, point) in points.into_iter().enumerate() {
                if index > 0 && paced {
                    tokio::time::sleep(spacing).await;
                }
                let fix = LocationFix {
                    coordinate: point.coordinate,
                    recorded_at: Utc::now(),
                    accuracy_m: point.accuracy_m,
                };
                if tx.send(fix).await.is_err() {
                    debug!("Location subscriber dropped; stopping replay");
                    return;
                }
            }
            debug!("Track replay exhausted");
        });

        LocationSubscription::with_producer(rx, producer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::time::Instant;

    fn point(lat: f64, lon: f64) -> TrackPoint {
        TrackPoint {
            coordinate: Coordinate::new(lat, lon).unwrap(),
            accuracy_m: None,
        }
    }

    #[test]
    fn loads_track_with_optional_accuracy() {
        let csv = "latitude,longitude,accuracy\n9.93,-84.08,5.0\n9.94,-84.07\n";
        let points = load_track_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].accuracy_m, Some(5.0));
        assert_eq!(points[1].accuracy_m, None);
        assert_eq!(points[1].coordinate.longitude(), -84.07);
    }

    #[test]
    fn rejects_out_of_range_track_point() {
        let csv = "latitude,longitude\n9.93,-84.08\n95.0,0.0\n";
        let err = load_track_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrackLoadError::InvalidPoint { row: 2, .. }));
    }

    #[test]
    fn spacing_never_drops_below_fastest() {
        let interval = UpdateInterval { desired_ms: 1_000, fastest_ms: 8_000 };
        assert_eq!(interval.spacing(), Duration::from_millis(8_000));
        assert_eq!(UpdateInterval::default().spacing(), Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_respects_cadence() {
        let source = ReplayLocationSource::new(vec![point(1.0, 1.0), point(2.0, 2.0), point(3.0, 3.0)]);
        let mut subscription = source.subscribe(UpdateInterval::default());

        let start = Instant::now();
        let first = subscription.next().await.unwrap();
        assert_eq!(first.coordinate.latitude(), 1.0);
        assert!(start.elapsed() < Duration::from_millis(1));

        let second = subscription.next().await.unwrap();
        assert_eq!(second.coordinate.latitude(), 2.0);
        assert!(start.elapsed() >= Duration::from_millis(10_000));

        subscription.next().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20_000));
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn unpaced_replay_drains_immediately() {
        let source = ReplayLocationSource::new(vec![point(1.0, 1.0), point(2.0, 2.0)]).unpaced();
        let fixes: Vec<_> = source.subscribe(UpdateInterval::default()).collect().await;
        assert_eq!(fixes.len(), 2);
    }

    #[tokio::test]
    async fn channel_source_forwards_until_subscription_dropped() {
        let (sender, source) = ChannelLocationSource::new();
        let mut subscription = source.subscribe(UpdateInterval::default());
        let fix = LocationFix::now(Coordinate::new(10.0, 20.0).unwrap());
        assert!(sender.send(fix).await);
        assert_eq!(subscription.next().await, Some(fix));
        drop(subscription);
        assert!(!sender.send(fix).await);
    }
}
