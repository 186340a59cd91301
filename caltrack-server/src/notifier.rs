//! Real-time "data changed" notifications over Server-Sent Events
//!
//! Best-effort only: events go to whoever is subscribed at broadcast time.
//! Nothing is queued for clients that connect later.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, info, warn};

/// Events pushed to connected clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// Calibration data changed; clients should refetch
    CalibrationsUpdated,
}

impl NotifyEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            NotifyEvent::CalibrationsUpdated => "update_calibrations",
        }
    }
}

/// Fans notifications out to every connected client
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<NotifyEvent>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` events per slow client
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Tell every connected client to refetch calibration data
    ///
    /// Returns the number of clients reached (0 when nobody is connected).
    pub fn notify_calibrations_updated(&self) -> usize {
        match self.tx.send(NotifyEvent::CalibrationsUpdated) {
            Ok(count) => {
                debug!("Broadcast update_calibrations to {} clients", count);
                count
            }
            Err(_) => {
                debug!("No clients connected for update_calibrations");
                0
            }
        }
    }

    /// Raw subscription to the event channel
    pub fn subscribe(&self) -> broadcast::Receiver<NotifyEvent> {
        self.tx.subscribe()
    }

    /// Current number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// SSE stream for one client; logs when the client goes away
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let mut events = BroadcastStream::new(self.tx.subscribe());
        let guard = DisconnectLog;

        async_stream::stream! {
            let _guard = guard;
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => yield Ok(Event::default().event(event.name()).data("")),
                    Err(BroadcastStreamRecvError::Lagged(missed)) => {
                        warn!("SSE client lagged, skipped {} notifications", missed);
                    }
                }
            }
        }
    }

    /// Axum SSE response for GET /events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let stream = self.subscribe_stream();
        info!("Client connected, total clients: {}", self.client_count());

        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}

/// Logs the disconnect when the client's stream is dropped
struct DisconnectLog;

impl Drop for DisconnectLog {
    fn drop(&mut self) {
        info!("Client disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_matches_client_listener() {
        assert_eq!(NotifyEvent::CalibrationsUpdated.name(), "update_calibrations");
    }

    #[test]
    fn notify_without_clients_is_dropped() {
        let notifier = Notifier::new(8);
        assert_eq!(notifier.client_count(), 0);
        assert_eq!(notifier.notify_calibrations_updated(), 0);

        // A late subscriber never sees earlier events
        let mut rx = notifier.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn every_subscriber_gets_each_event() {
        let notifier = Notifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        assert_eq!(notifier.notify_calibrations_updated(), 2);
        assert_eq!(first.try_recv().unwrap(), NotifyEvent::CalibrationsUpdated);
        assert_eq!(second.try_recv().unwrap(), NotifyEvent::CalibrationsUpdated);
        assert!(first.try_recv().is_err());
    }

    #[tokio::test]
    async fn sse_stream_yields_event_and_tracks_clients() {
        let notifier = Notifier::new(8);
        let stream = notifier.subscribe_stream();
        tokio::pin!(stream);
        assert_eq!(notifier.client_count(), 1);

        notifier.notify_calibrations_updated();
        let item = stream.next().await.expect("stream should yield");
        assert!(item.is_ok());
    }

    #[tokio::test]
    async fn dropping_stream_disconnects_client() {
        let notifier = Notifier::new(8);
        let stream = notifier.subscribe_stream();
        assert_eq!(notifier.client_count(), 1);

        drop(stream);
        assert_eq!(notifier.client_count(), 0);
    }
}
