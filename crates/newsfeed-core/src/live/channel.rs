//! Push channel client.
//!
//! Each [`LiveChannel::subscribe`] call spawns a task that owns one WebSocket
//! connection. Once the socket is open the task sends the login directive
//! with the session token, then multiplexes the heartbeat timer, inbound
//! frames, and the cancellation signal until one of them ends the connection.
//! Nothing is retried: after a failure or remote close the handler simply
//! stops receiving payloads.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::auth::Session;

/// Interval between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// Heartbeat payload sent as a text frame.
pub const PING_PAYLOAD: &str = "ping";

const LOGIN_COMMAND: &str = "/login";

/// Build the control line that authenticates a live connection.
pub fn login_directive(token: &str) -> String {
    format!("{} {}", LOGIN_COMMAND, token)
}

/// Receives every inbound payload of a live subscription, unmodified.
pub trait MessageHandler: Send + 'static {
    fn on_message(&mut self, payload: String);
}

impl<F> MessageHandler for F
where
    F: FnMut(String) + Send + 'static,
{
    fn on_message(&mut self, payload: String) {
        self(payload)
    }
}

/// Entry point for opening live subscriptions.
#[derive(Clone, Debug)]
pub struct LiveChannel {
    endpoint: String,
    session: Session,
    heartbeat_interval: Duration,
}

impl LiveChannel {
    /// Creates a channel for the push endpoint (e.g. `ws://localhost:3000/ws`).
    pub fn new(endpoint: impl Into<String>, session: Session) -> Self {
        Self {
            endpoint: endpoint.into(),
            session,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Opens a connection in the background and feeds its payloads to `handler`.
    ///
    /// Must be called from within a tokio runtime. The session token is read
    /// once, when the socket becomes ready.
    pub fn subscribe<H: MessageHandler>(&self, handler: H) -> Subscription {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_channel(
            self.endpoint.clone(),
            self.session.clone(),
            self.heartbeat_interval,
            handler,
            shutdown_rx,
        ));
        Subscription {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

/// Handle to one live connection. Dropping it cancels the connection.
#[derive(Debug)]
pub struct Subscription {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Close the connection and stop the heartbeat.
    ///
    /// Idempotent, and safe before the connection is ready.
    pub fn cancel(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether the connection task has finished.
    pub fn is_closed(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait until the connection task has finished, whatever the reason.
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                warn!(error = %e, "Live channel task did not finish cleanly");
            }
            self.task = None;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Resolves once `cancel` ran or the subscription handle was dropped.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|cancelled| *cancelled).await;
}

async fn run_channel<H: MessageHandler>(
    endpoint: String,
    session: Session,
    heartbeat_interval: Duration,
    mut handler: H,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(%endpoint, "Opening live channel");

    let socket = tokio::select! {
        _ = cancelled(&mut shutdown) => {
            debug!(%endpoint, "Live channel cancelled before it was ready");
            return;
        }
        result = connect_async(endpoint.as_str()) => match result {
            Ok((socket, _)) => socket,
            Err(e) => {
                warn!(%endpoint, error = %e, "Failed to open live channel");
                return;
            }
        }
    };
    info!(%endpoint, "Live channel established");

    let (mut sink, mut stream) = socket.split();

    if let Err(e) = sink
        .send(Message::Text(login_directive(&session.token())))
        .await
    {
        warn!(error = %e, "Failed to send login directive");
        return;
    }

    let mut heartbeat = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancelled(&mut shutdown) => {
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "Error while closing live channel");
                }
                break;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = sink.send(Message::Text(PING_PAYLOAD.to_string())).await {
                    warn!(error = %e, "Heartbeat failed, dropping live channel");
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => handler.on_message(text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => handler.on_message(text),
                    Err(_) => warn!("Dropping binary live frame that is not UTF-8"),
                },
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Live channel closed by server");
                    break;
                }
                // Transport ping/pong is answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Live channel error");
                    break;
                }
                None => {
                    info!("Live channel stream ended");
                    break;
                }
            }
        }
    }

    debug!(%endpoint, "Live channel task finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_directive() {
        assert_eq!(login_directive("T1"), "/login T1");
        assert_eq!(login_directive(""), "/login ");
    }

    #[test]
    fn test_closure_is_a_handler() {
        use std::sync::{Arc, Mutex};

        fn deliver(handler: &mut impl MessageHandler, payload: &str) {
            handler.on_message(payload.to_string());
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut handler = move |payload: String| sink.lock().unwrap().push(payload);
        deliver(&mut handler, "hello");
        deliver(&mut handler, "world");
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string(), "world".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_before_ready_is_safe() {
        // Nothing listens on port 9 locally; cancel races the failing connect either way.
        let channel = LiveChannel::new("ws://127.0.0.1:9/ws", Session::in_memory());
        let mut subscription = channel.subscribe(|_payload: String| {});
        subscription.cancel();
        subscription.cancel();
        tokio::time::timeout(Duration::from_secs(5), subscription.closed())
            .await
            .expect("task should stop after cancel");
        assert!(subscription.is_closed());
    }
}
