//! Gateway connection state machine
//!
//! One task owns the transport, the session and the heartbeat. Inbound
//! frames, heartbeat deadlines, configuration changes, the persistence
//! timer and the stop signal are all awaited in a single `select!`, and
//! each event is then handled with exclusive access to the state.

use chrono::Utc;
use presence_core::{ConfigChange, ConfigSource, CredentialSource, ElapsedStore, PresenceSpec};
use std::fmt;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use super::elapsed::ElapsedTimeTracker;
use super::heartbeat::{HeartbeatAction, HeartbeatScheduler};
use super::options::GatewayOptions;
use super::reconnect::{random_delay, DisconnectReason, ReconnectDecision, ReconnectPolicy};
use super::session::SessionState;
use crate::error::{GatewayError, GatewayResult};
use crate::handlers::{HandshakeHandler, MessageDispatcher, PresenceHandler, ServerEvent};
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload, ReadyPayload};
use crate::transport::{Connector, Inbound, Transport};

/// Close code for a user-requested shutdown; the server drops the session
const CLOSE_NORMAL: u16 = 1000;

/// Close code used when reconnecting; the session stays resumable
const CLOSE_RECONNECT: u16 = 4000;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Resuming,
    Ready,
    Reconnecting,
}

impl ConnectionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingHello => "awaiting_hello",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Ready => "ready",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control handle for a running [`GatewayConnection`]
#[derive(Clone)]
pub struct GatewayHandle {
    stop_tx: Arc<watch::Sender<bool>>,
    phase_rx: watch::Receiver<ConnectionPhase>,
}

impl GatewayHandle {
    /// Request a graceful shutdown; pending waits are cancelled
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase_rx.borrow()
    }

    /// Watch phase transitions
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase_rx.clone()
    }
}

impl fmt::Debug for GatewayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayHandle")
            .field("phase", &self.phase())
            .finish()
    }
}

/// How one connection ended
#[derive(Debug)]
enum SessionEnd {
    Stopped,
    Fatal(GatewayError),
    /// Reconnect immediately with a fresh identify
    Restart,
    Disconnected(DisconnectReason),
}

#[derive(Debug, Clone, Copy)]
enum Teardown {
    Graceful(u16),
    Abort,
}

enum Flow {
    Continue,
    End(SessionEnd, Teardown),
}

impl Flow {
    fn disconnect(reason: DisconnectReason, teardown: Teardown) -> Self {
        Self::End(SessionEnd::Disconnected(reason), teardown)
    }

    fn fatal(error: GatewayError) -> Self {
        Self::End(SessionEnd::Fatal(error), Teardown::Graceful(CLOSE_NORMAL))
    }
}

enum Event {
    Stop,
    HeartbeatDue,
    Deadline,
    Inbound(Option<Inbound>),
    Config(Option<ConfigChange>),
    PersistTick,
}

/// Presence gateway client
pub struct GatewayConnection {
    connector: Box<dyn Connector>,
    options: GatewayOptions,
    phase: ConnectionPhase,
    phase_tx: watch::Sender<ConnectionPhase>,
    stop_rx: watch::Receiver<bool>,
    session: SessionState,
    heartbeat: HeartbeatScheduler,
    policy: ReconnectPolicy,
    tracker: ElapsedTimeTracker,
    last_reason: Option<DisconnectReason>,
    spec: PresenceSpec,
}

impl GatewayConnection {
    pub fn new(
        connector: Box<dyn Connector>,
        options: GatewayOptions,
        store: Arc<dyn ElapsedStore>,
    ) -> (Self, GatewayHandle) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Disconnected);

        let policy = ReconnectPolicy::new(
            options.reconnect_base_delay,
            options.reconnect_max_delay,
            options.max_reconnect_attempts,
        );

        let connection = Self {
            connector,
            options,
            phase: ConnectionPhase::Disconnected,
            phase_tx,
            stop_rx,
            session: SessionState::new(),
            heartbeat: HeartbeatScheduler::new(),
            policy,
            tracker: ElapsedTimeTracker::new(store),
            last_reason: None,
            spec: PresenceSpec::new(String::new()),
        };
        let handle = GatewayHandle {
            stop_tx: Arc::new(stop_tx),
            phase_rx,
        };
        (connection, handle)
    }

    /// Run until stopped or until a fatal error.
    ///
    /// The elapsed time is persisted one final time on every exit path.
    pub async fn start<S, K>(mut self, mut config: S, credentials: K) -> GatewayResult<()>
    where
        S: ConfigSource,
        K: CredentialSource,
    {
        self.spec = config.snapshot();
        self.tracker.on_startup(self.spec.elapsed_mode, Utc::now());

        let result = self.run(&mut config, &credentials).await;

        self.heartbeat.cancel();
        self.tracker.on_shutdown(Utc::now());
        self.set_phase(ConnectionPhase::Disconnected);

        match &result {
            Ok(()) => tracing::info!("Gateway client stopped"),
            Err(e) => tracing::error!(
                error = %e,
                exit_code = e.exit_code(),
                "Gateway client terminated"
            ),
        }
        result
    }

    async fn run<S, K>(&mut self, config: &mut S, credentials: &K) -> GatewayResult<()>
    where
        S: ConfigSource,
        K: CredentialSource,
    {
        let mut config_open = true;

        loop {
            if *self.stop_rx.borrow() {
                return Ok(());
            }

            self.set_phase(ConnectionPhase::Connecting);
            let end = self
                .connect_and_serve(config, &mut config_open, credentials)
                .await;
            self.heartbeat.cancel();

            let reason = match end {
                SessionEnd::Stopped => return Ok(()),
                SessionEnd::Fatal(e) => return Err(e),
                SessionEnd::Restart => {
                    self.tracker.persist(Utc::now());
                    self.last_reason = None;
                    continue;
                }
                SessionEnd::Disconnected(reason) => reason,
            };

            self.tracker.persist(Utc::now());
            if reason.invalidates_session() {
                self.session.clear();
            }
            self.set_phase(ConnectionPhase::Reconnecting);

            let delay = match self.policy.on_failure() {
                ReconnectDecision::GiveUp { attempts } => {
                    tracing::error!(attempts, reason = %reason, "Reconnect attempts exhausted");
                    return Err(GatewayError::ReconnectExhausted { attempts });
                }
                ReconnectDecision::Retry { attempt, delay } => {
                    let delay = if matches!(reason, DisconnectReason::SessionInvalidated { .. }) {
                        random_delay(&self.options.invalid_session_delay)
                    } else {
                        delay
                    };
                    tracing::warn!(
                        attempt,
                        max_attempts = self.options.max_reconnect_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Connection lost, reconnecting"
                    );
                    delay
                }
            };

            self.last_reason = Some(reason);
            if !self.sleep_or_stop(delay).await {
                return Ok(());
            }
        }
    }

    async fn connect_and_serve<S, K>(
        &mut self,
        config: &mut S,
        config_open: &mut bool,
        credentials: &K,
    ) -> SessionEnd
    where
        S: ConfigSource,
        K: CredentialSource,
    {
        let resume = ReconnectPolicy::should_resume(&self.session, self.last_reason.as_ref());
        let url = match self.session.resume_url() {
            Some(base) if resume => self.options.resume_url(base),
            _ => self.options.url.clone(),
        };
        tracing::info!(url = %url, resume, "Connecting to gateway");

        let connected = tokio::select! {
            () = stop_requested(&mut self.stop_rx) => return SessionEnd::Stopped,
            result = self.connector.connect(&url) => result,
        };
        let mut transport = match connected {
            Ok(transport) => transport,
            Err(e) if e.is_fatal() => return SessionEnd::Fatal(e),
            Err(e) => {
                return SessionEnd::Disconnected(DisconnectReason::Transport(e.to_string()));
            }
        };

        self.set_phase(ConnectionPhase::AwaitingHello);
        let mut deadline = Some(Instant::now() + self.options.hello_timeout);

        let save_interval = self.options.elapsed_save_interval;
        let mut persist = tokio::time::interval_at(Instant::now() + save_interval, save_interval);
        persist.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let (end, teardown) = loop {
            let event = tokio::select! {
                () = stop_requested(&mut self.stop_rx) => Event::Stop,
                () = self.heartbeat.wait() => Event::HeartbeatDue,
                () = sleep_until(deadline) => Event::Deadline,
                inbound = transport.recv() => Event::Inbound(inbound),
                change = config.next_change(), if *config_open => Event::Config(change),
                _ = persist.tick() => Event::PersistTick,
            };

            let flow = match event {
                Event::Stop => {
                    tracing::info!("Stop requested, closing connection");
                    Flow::End(SessionEnd::Stopped, Teardown::Graceful(CLOSE_NORMAL))
                }
                Event::HeartbeatDue => self.on_heartbeat_due(&transport).await,
                Event::Deadline => {
                    deadline = None;
                    self.on_deadline()
                }
                Event::Inbound(inbound) => {
                    self.on_inbound(inbound, &transport, credentials, &mut deadline)
                        .await
                }
                Event::Config(change) => self.on_config_change(change, config_open, &transport).await,
                Event::PersistTick => {
                    self.tracker.on_tick(Utc::now());
                    Flow::Continue
                }
            };

            if let Flow::End(end, teardown) = flow {
                break (end, teardown);
            }
        };

        self.heartbeat.cancel();
        match teardown {
            Teardown::Graceful(code) => transport.close(code, "closing").await,
            Teardown::Abort => transport.abort(),
        }
        end
    }

    async fn on_heartbeat_due(&mut self, transport: &Transport) -> Flow {
        match self.heartbeat.on_due() {
            HeartbeatAction::Send => self.send_heartbeat(transport).await,
            HeartbeatAction::Zombie => {
                tracing::warn!(
                    seq = ?self.session.sequence(),
                    "Heartbeat not acknowledged, dropping zombie connection"
                );
                Flow::disconnect(DisconnectReason::Zombie, Teardown::Abort)
            }
        }
    }

    async fn send_heartbeat(&mut self, transport: &Transport) -> Flow {
        let frame = GatewayMessage::heartbeat(self.session.sequence()).to_json();
        match frame {
            Ok(frame) => {
                tracing::trace!(seq = ?self.session.sequence(), "Sending heartbeat");
                self.send(transport, frame).await
            }
            Err(e) => Flow::disconnect(DisconnectReason::Protocol(e.to_string()), Teardown::Abort),
        }
    }

    fn on_deadline(&self) -> Flow {
        let reason = if self.phase == ConnectionPhase::AwaitingHello {
            DisconnectReason::HelloTimeout
        } else {
            DisconnectReason::HandshakeTimeout
        };
        tracing::warn!(phase = %self.phase, reason = %reason, "Gateway did not respond in time");
        Flow::disconnect(reason, Teardown::Abort)
    }

    async fn on_inbound<K: CredentialSource>(
        &mut self,
        inbound: Option<Inbound>,
        transport: &Transport,
        credentials: &K,
        deadline: &mut Option<Instant>,
    ) -> Flow {
        let text = match inbound {
            Some(Inbound::Message(text)) => text,
            Some(Inbound::Malformed(e)) => {
                return Flow::disconnect(DisconnectReason::Protocol(e), Teardown::Abort);
            }
            Some(Inbound::Failed(e)) => {
                return Flow::disconnect(DisconnectReason::Transport(e), Teardown::Abort);
            }
            Some(Inbound::Closed { code, reason }) => return self.on_closed(code, reason),
            None => {
                return Flow::disconnect(
                    DisconnectReason::Transport("transport closed".to_string()),
                    Teardown::Abort,
                );
            }
        };

        match MessageDispatcher::dispatch(&text) {
            Ok(event) => {
                self.on_server_event(event, transport, credentials, deadline)
                    .await
            }
            Err(e) => {
                tracing::warn!(phase = %self.phase, error = %e, "Dropping connection");
                Flow::disconnect(DisconnectReason::Protocol(e.to_string()), Teardown::Abort)
            }
        }
    }

    fn on_closed(&self, code: Option<u16>, reason: String) -> Flow {
        match code.and_then(CloseCode::from_u16) {
            Some(CloseCode::AuthenticationFailed) => {
                tracing::error!(code = 4004, reason = %reason, "Gateway rejected the credential");
                Flow::End(
                    SessionEnd::Fatal(GatewayError::AuthRejected(reason)),
                    Teardown::Abort,
                )
            }
            Some(close) if close.is_fatal() => {
                tracing::error!(
                    code = close.as_u16(),
                    reason = %reason,
                    "Gateway closed with a fatal code: {}",
                    close.description()
                );
                Flow::End(
                    SessionEnd::Fatal(GatewayError::FatalClose {
                        code: close.as_u16(),
                        reason,
                    }),
                    Teardown::Abort,
                )
            }
            _ => {
                tracing::info!(code = ?code, reason = %reason, "Gateway closed the connection");
                Flow::disconnect(DisconnectReason::Closed { code, reason }, Teardown::Abort)
            }
        }
    }

    async fn on_server_event<K: CredentialSource>(
        &mut self,
        event: ServerEvent,
        transport: &Transport,
        credentials: &K,
        deadline: &mut Option<Instant>,
    ) -> Flow {
        match event {
            ServerEvent::Hello(hello) => {
                if self.phase != ConnectionPhase::AwaitingHello {
                    return self.unexpected("Hello");
                }
                let flow = self.on_hello(&hello, transport, credentials).await;
                *deadline = Some(Instant::now() + self.options.handshake_timeout);
                flow
            }
            ServerEvent::Ready { sequence, ready } => {
                if !matches!(
                    self.phase,
                    ConnectionPhase::Identifying | ConnectionPhase::Resuming
                ) {
                    return self.unexpected("READY");
                }
                *deadline = None;
                self.on_ready(sequence, ready, transport).await
            }
            ServerEvent::Resumed { sequence } => {
                if self.phase != ConnectionPhase::Resuming {
                    return self.unexpected("RESUMED");
                }
                *deadline = None;
                if let Some(seq) = sequence {
                    self.session.observe_sequence(seq);
                }
                self.enter_ready();
                self.push_presence(transport).await
            }
            ServerEvent::Dispatch { sequence, event } => {
                if let Some(seq) = sequence {
                    self.session.observe_sequence(seq);
                }
                tracing::trace!(event = ?event, seq = ?sequence, "Dispatch ignored");
                Flow::Continue
            }
            ServerEvent::HeartbeatRequest => {
                tracing::debug!("Gateway requested a heartbeat");
                self.send_heartbeat(transport).await
            }
            ServerEvent::HeartbeatAck => {
                self.heartbeat.on_ack();
                tracing::trace!(latency = ?self.heartbeat.latency(), "Heartbeat acknowledged");
                Flow::Continue
            }
            ServerEvent::Reconnect => {
                tracing::info!("Gateway requested a reconnect");
                Flow::disconnect(
                    DisconnectReason::ServerReconnect,
                    Teardown::Graceful(CLOSE_RECONNECT),
                )
            }
            ServerEvent::InvalidSession { resumable } => {
                tracing::warn!(resumable, "Gateway invalidated the session");
                if !resumable {
                    self.session.clear();
                }
                Flow::disconnect(
                    DisconnectReason::SessionInvalidated { resumable },
                    Teardown::Graceful(CLOSE_RECONNECT),
                )
            }
        }
    }

    async fn on_hello<K: CredentialSource>(
        &mut self,
        hello: &HelloPayload,
        transport: &Transport,
        credentials: &K,
    ) -> Flow {
        let interval = Duration::from_millis(hello.heartbeat_interval);
        self.heartbeat.start(interval);
        tracing::debug!(interval_ms = hello.heartbeat_interval, "Hello received");

        let token = match credentials.credential().await.map_err(GatewayError::from) {
            Ok(token) => token,
            Err(e) if e.is_fatal() => return Flow::fatal(e),
            Err(e) => {
                tracing::warn!(error = %e, "Credential unavailable");
                return Flow::disconnect(
                    DisconnectReason::CredentialUnavailable(e.to_string()),
                    Teardown::Graceful(CLOSE_RECONNECT),
                );
            }
        };

        let target = ReconnectPolicy::should_resume(&self.session, self.last_reason.as_ref())
            .then(|| self.session.resume_target())
            .flatten()
            .map(|(session_id, seq)| (session_id.to_string(), seq));

        let frame = match target {
            Some((session_id, seq)) => {
                tracing::info!(session_id = %session_id, seq, "Resuming session");
                self.set_phase(ConnectionPhase::Resuming);
                HandshakeHandler::resume(token, &session_id, seq)
            }
            None => {
                self.session.clear();
                let now = Utc::now();
                let record = self.tracker.current_record(now);
                let presence = PresenceHandler::build(&self.spec, record.as_ref(), now);
                self.set_phase(ConnectionPhase::Identifying);
                HandshakeHandler::identify(token, &self.options.identity, presence)
            }
        };

        match frame {
            Ok(frame) => self.send(transport, frame).await,
            Err(e) => Flow::disconnect(DisconnectReason::Protocol(e.to_string()), Teardown::Abort),
        }
    }

    async fn on_ready(
        &mut self,
        sequence: Option<u64>,
        ready: ReadyPayload,
        transport: &Transport,
    ) -> Flow {
        if let Some(seq) = sequence {
            self.session.observe_sequence(seq);
        }
        self.session
            .establish(ready.session_id, ready.resume_gateway_url);

        if let Some(user) = &ready.user {
            tracing::info!(user = %user.display_name(), user_id = %user.id, "Logged in");
        }

        self.enter_ready();
        self.push_presence(transport).await
    }

    fn enter_ready(&mut self) {
        self.policy.reset();
        self.last_reason = None;
        self.set_phase(ConnectionPhase::Ready);
        tracing::info!(
            session_id = ?self.session.session_id(),
            seq = ?self.session.sequence(),
            "Gateway session ready"
        );
    }

    async fn on_config_change(
        &mut self,
        change: Option<ConfigChange>,
        config_open: &mut bool,
        transport: &Transport,
    ) -> Flow {
        let Some(change) = change else {
            tracing::debug!("Config source closed, keeping the current presence");
            *config_open = false;
            return Flow::Continue;
        };

        let now = Utc::now();
        if change.spec.elapsed_mode != self.spec.elapsed_mode {
            self.tracker.on_mode_change(change.spec.elapsed_mode, now);
        }

        let application_changed =
            change.spec.effective_application_id() != self.spec.effective_application_id();
        self.spec = change.spec;

        if change.credential_changed || application_changed {
            tracing::info!(
                credential_changed = change.credential_changed,
                application_changed,
                "Configuration change requires a new session"
            );
            self.session.clear();
            return Flow::End(SessionEnd::Restart, Teardown::Graceful(CLOSE_NORMAL));
        }

        tracing::info!(activity = %self.spec.name, "Configuration changed, updating presence");
        self.push_presence(transport).await
    }

    /// Send the current presence; only in `Ready`
    async fn push_presence(&mut self, transport: &Transport) -> Flow {
        if self.phase != ConnectionPhase::Ready {
            return Flow::Continue;
        }

        let now = Utc::now();
        let record = self.tracker.current_record(now);
        let Some(payload) = PresenceHandler::build(&self.spec, record.as_ref(), now) else {
            return Flow::Continue;
        };

        match PresenceHandler::frame(&payload) {
            Ok(frame) => {
                tracing::info!(
                    activity = %self.spec.name,
                    status = %payload.status,
                    "Presence updated"
                );
                self.send(transport, frame).await
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode presence");
                Flow::Continue
            }
        }
    }

    async fn send(&mut self, transport: &Transport, frame: String) -> Flow {
        match transport.send(frame).await {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::disconnect(DisconnectReason::Transport(e.to_string()), Teardown::Abort),
        }
    }

    fn unexpected(&self, what: &str) -> Flow {
        tracing::warn!(phase = %self.phase, "Unexpected {what} for the current phase");
        Flow::disconnect(
            DisconnectReason::Protocol(format!("unexpected {what} in phase {}", self.phase)),
            Teardown::Abort,
        )
    }

    /// Sleep for `delay`; `false` if stop was requested first
    async fn sleep_or_stop(&mut self, delay: Duration) -> bool {
        tokio::select! {
            () = stop_requested(&mut self.stop_rx) => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    fn set_phase(&mut self, phase: ConnectionPhase) {
        if self.phase == phase {
            return;
        }
        tracing::info!(
            from = %self.phase,
            phase = %phase,
            attempt = self.policy.failures(),
            "Connection phase changed"
        );
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }
}

/// Resolves once stop is requested; pending forever if it never can be
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    let stopped = rx.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        pending::<()>().await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
