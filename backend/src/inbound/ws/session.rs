//! Per-connection WebSocket handler for the change notification feed.
//!
//! Keeps framing, heartbeats, and subscription bookkeeping at the edge
//! while deferring identity checks to the injected [`TokenVerifier`]. The
//! public contract pings every 5s and considers a connection idle after
//! 10s without client traffic. Tests shorten these intervals to speed up
//! feedback; adjust the constants below if SLAs change so clients and
//! intermediaries stay aligned.
//!
//! A session must authenticate before subscribing. Events are filtered
//! against the session's topic set; a lagging session receives a `resync`
//! frame and is expected to refetch rather than replay.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast;
use tokio::time;
use tracing::warn;

use crate::domain::ports::{TokenVerificationError, TokenVerifier};
use crate::domain::{Actor, RideEvent, Topic};
use crate::inbound::ws::messages::{ClientFrame, ServerFrame};
use crate::inbound::ws::state::WsState;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(state: WsState, session: Session, stream: MessageStream) {
    let feed = state.events.subscribe();
    WsSession::new(state.tokens.clone())
        .run(session, stream, feed)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    AuthRejected,
    AuthUnavailable,
    FeedClosed,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    tokens: Arc<dyn TokenVerifier>,
    actor: Option<Actor>,
    topics: HashSet<Topic>,
}

impl WsSession {
    fn new(tokens: Arc<dyn TokenVerifier>) -> Self {
        Self {
            tokens,
            actor: None,
            topics: HashSet::new(),
        }
    }

    async fn run(
        &mut self,
        mut session: Session,
        mut stream: MessageStream,
        mut feed: broadcast::Receiver<RideEvent>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                event = feed.recv() => {
                    self.handle_feed_event(&mut session, event).await
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        match frame {
            ClientFrame::Authenticate { token } => self.handle_authenticate(session, &token).await,
            ClientFrame::Subscribe { topics } => {
                self.handle_subscription_change(session, &topics, true).await
            }
            ClientFrame::Unsubscribe { topics } => {
                self.handle_subscription_change(session, &topics, false)
                    .await
            }
        }
    }

    async fn handle_authenticate(
        &mut self,
        session: &mut Session,
        token: &str,
    ) -> Result<(), SessionError> {
        if self.actor.is_some() {
            return self
                .send_frame(
                    session,
                    &ServerFrame::error("already_authenticated", "session is already identified"),
                )
                .await;
        }

        match self.tokens.verify(token).await {
            Ok(actor) => {
                let user_id = actor.id;
                self.actor = Some(actor);
                self.send_frame(session, &ServerFrame::Authenticated { user_id })
                    .await
            }
            Err(TokenVerificationError::Invalid(_)) => Err(SessionError::AuthRejected),
            Err(TokenVerificationError::Unavailable(_)) => Err(SessionError::AuthUnavailable),
        }
    }

    async fn handle_subscription_change(
        &mut self,
        session: &mut Session,
        raw_topics: &[String],
        subscribe: bool,
    ) -> Result<(), SessionError> {
        let Some(actor) = self.actor else {
            return self
                .send_frame(
                    session,
                    &ServerFrame::error("unauthenticated", "authenticate before subscribing"),
                )
                .await;
        };

        let mut parsed = Vec::with_capacity(raw_topics.len());
        for raw in raw_topics {
            let Some(topic) = Topic::parse(raw) else {
                return self
                    .send_frame(
                        session,
                        &ServerFrame::error("unknown_topic", format!("unknown topic: {raw}")),
                    )
                    .await;
            };
            if subscribe && !may_subscribe(&actor, &topic) {
                return self
                    .send_frame(
                        session,
                        &ServerFrame::error("forbidden", format!("not allowed to watch {topic}")),
                    )
                    .await;
            }
            parsed.push(topic);
        }

        for topic in parsed {
            if subscribe {
                self.topics.insert(topic);
            } else {
                self.topics.remove(&topic);
            }
        }

        let mut topics: Vec<String> = self.topics.iter().map(Topic::to_string).collect();
        topics.sort();
        self.send_frame(session, &ServerFrame::Subscribed { topics })
            .await
    }

    async fn handle_feed_event(
        &self,
        session: &mut Session,
        event: Result<RideEvent, broadcast::error::RecvError>,
    ) -> Result<(), SessionError> {
        match event {
            Ok(event) => {
                for topic in event.topics() {
                    if self.topics.contains(&topic) {
                        self.send_frame(
                            session,
                            &ServerFrame::Event {
                                topic: topic.to_string(),
                                event,
                            },
                        )
                        .await?;
                    }
                }
                Ok(())
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Dropped events are unrecoverable here; tell the client to
                // refetch instead of pretending the feed is gapless.
                if self.topics.is_empty() {
                    return Ok(());
                }
                self.send_frame(session, &ServerFrame::Resync { skipped })
                    .await
            }
            Err(broadcast::error::RecvError::Closed) => Err(SessionError::FeedClosed),
        }
    }

    async fn send_frame(
        &self,
        session: &mut Session,
        frame: &ServerFrame,
    ) -> Result<(), SessionError> {
        self.send_json(session, frame)
            .await
            .map_err(SessionError::Network)
    }

    async fn send_json<T: serde::Serialize>(
        &self,
        session: &mut Session,
        payload: &T,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                // In debug builds fail fast so schema drift is fixed; in release we log and keep the connection alive.
                if cfg!(debug_assertions) {
                    panic!("server frames must serialize: {error}");
                } else {
                    warn!(error = %error, "Failed to serialize WebSocket payload");
                }
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::AuthUnavailable => {
                warn!("Token verification unavailable; closing connection");
            }
            SessionError::FeedClosed => {
                warn!("Ride event feed closed; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::AuthRejected
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::AuthRejected => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid token".to_owned()),
            })),
            SessionError::AuthUnavailable => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Again,
                description: Some("authentication unavailable".to_owned()),
            })),
            SessionError::FeedClosed => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("server shutting down".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

/// Whether `actor` may watch `topic`.
///
/// User-scoped topics are restricted to that user (or an administrator).
/// Per-ride and pending topics carry identifiers and statuses only, so any
/// authenticated user may watch them; ride data itself stays behind the
/// query-side authorization.
fn may_subscribe(actor: &Actor, topic: &Topic) -> bool {
    match topic {
        Topic::PendingRides | Topic::Ride(_) => true,
        Topic::DriverRides(id) | Topic::PassengerRides(id) => *id == actor.id || actor.is_admin(),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
