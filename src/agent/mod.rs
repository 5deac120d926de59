//! Agent lifecycle: broker session, presence and the call loop.
//!
//! ```text
//!                 retry interval elapsed
//!  Disconnected ─────────────────────────▶ Connecting
//!       ▲  ▲                                 │    │
//!       │  └──────── connect/announce failed ┘    │ announced
//!       │                                         ▼
//!       └──────── link lost / poll error ───── Connected
//! ```
//!
//! Everything runs from [`Agent::tick`]; the caller drives it from its
//! control loop. One inbound message is handled per tick.

pub mod identity;

use log::{debug, error, info, warn};

use crate::app::ports::{BrokerPort, ClockPort, LastWill, Qos, SessionOptions};
use crate::config::AgentConfig;
use crate::error::{CommsError, Error, Result};
use crate::rpc::discovery::{AgentInfo, AgentStatus};
use crate::rpc::registry::Registry;
use crate::rpc::router::{Publication, Router};
use crate::rpc::topic::agent_info_topic;

pub use identity::AgentIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Disconnected,
    Connecting,
    Connected,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub connect_attempts: u32,
    pub calls_dispatched: u32,
    pub replies_published: u32,
    pub replies_dropped: u32,
}

pub struct Agent<'r, B: BrokerPort, C: ClockPort> {
    router: Router<'r>,
    broker: B,
    clock: C,
    identity: AgentIdentity,
    keep_alive_secs: u16,
    retry_interval_ms: u64,
    state: AgentState,
    last_attempt_ms: Option<u64>,
    stats: AgentStats,
}

impl<'r, B: BrokerPort, C: ClockPort> Agent<'r, B, C> {
    pub fn new(
        registry: &'r Registry,
        config: &AgentConfig,
        identity: AgentIdentity,
        broker: B,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            router: Router::new(
                registry,
                &identity.domain,
                &identity.agent_id,
                config.max_payload_bytes,
            ),
            broker,
            clock,
            identity,
            keep_alive_secs: config.keep_alive_secs,
            retry_interval_ms: u64::from(config.retry_interval_ms),
            state: AgentState::Disconnected,
            last_attempt_ms: None,
            stats: AgentStats::default(),
        })
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    /// Advance the state machine by one step.
    pub fn tick(&mut self) -> AgentState {
        match self.state {
            AgentState::Disconnected | AgentState::Connecting => {
                if self.retry_due() {
                    self.connect();
                }
            }
            AgentState::Connected => self.service(),
        }
        self.state
    }

    /// Publish the offline presence and close the session.
    pub fn shutdown(&mut self) {
        if self.state != AgentState::Connected {
            return;
        }
        let offline = self.presence(AgentStatus::Offline);
        if let Err(e) = self.send(&offline) {
            warn!("VRPC: offline announcement failed: {}", e);
        }
        self.broker.disconnect();
        self.state = AgentState::Disconnected;
        info!("VRPC: agent {} shut down", self.identity.agent_id);
    }

    /// Session options: client id, credentials and the offline last will.
    pub fn session_options(&self) -> SessionOptions {
        let offline = self.presence(AgentStatus::Offline);
        SessionOptions {
            client_id: self.identity.client_id(),
            username: Some(self.identity.username.clone()),
            password: Some(self.identity.token.clone()),
            keep_alive_secs: self.keep_alive_secs,
            last_will: LastWill {
                topic: offline.topic,
                payload: offline.payload,
                retain: offline.retain,
                qos: offline.qos,
            },
        }
    }

    fn retry_due(&self) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => self.clock.now_ms().saturating_sub(last) >= self.retry_interval_ms,
        }
    }

    fn connect(&mut self) {
        self.state = AgentState::Connecting;
        self.last_attempt_ms = Some(self.clock.now_ms());
        self.stats.connect_attempts = self.stats.connect_attempts.wrapping_add(1);

        let options = self.session_options();
        info!(
            "VRPC: connecting as {} (attempt {})",
            options.client_id, self.stats.connect_attempts
        );
        if let Err(e) = self.broker.connect(&options) {
            error!("VRPC: connect failed: {:?}", e);
            self.state = AgentState::Disconnected;
            return;
        }

        match self.announce() {
            Ok(()) => {
                self.state = AgentState::Connected;
                info!("VRPC: agent {} online", self.identity.agent_id);
            }
            Err(e) => {
                error!("VRPC: announce failed: {}", e);
                self.broker.disconnect();
                self.state = AgentState::Disconnected;
            }
        }
    }

    /// Presence, then one capability advertisement per context, then one
    /// subscription per static method.
    fn announce(&mut self) -> Result<()> {
        let online = self.presence(AgentStatus::Online);
        self.send(&online)?;

        for advert in self.router.describe_capabilities() {
            self.send(&advert)?;
        }

        for topic in self.router.subscriptions() {
            debug!("VRPC: subscribing to {}", topic);
            self.broker
                .subscribe(&topic, Qos::AtLeastOnce)
                .map_err(|e| {
                    error!("VRPC: subscribe '{}' failed: {:?}", topic, e);
                    Error::from(CommsError::SubscribeFailed)
                })?;
        }
        Ok(())
    }

    fn service(&mut self) {
        if !self.broker.is_connected() {
            warn!("VRPC: broker link lost");
            self.state = AgentState::Disconnected;
            return;
        }

        let msg = match self.broker.poll() {
            Ok(Some(msg)) => msg,
            Ok(None) => return,
            Err(e) => {
                error!("VRPC: poll failed: {:?}", e);
                self.broker.disconnect();
                self.state = AgentState::Disconnected;
                return;
            }
        };

        let Some(routed) = self.router.route(msg.topic.as_str(), &msg.payload) else {
            return;
        };
        if routed.dispatched {
            self.stats.calls_dispatched = self.stats.calls_dispatched.wrapping_add(1);
        }

        let Some(reply) = self.router.reply_for(routed) else {
            self.stats.replies_dropped = self.stats.replies_dropped.wrapping_add(1);
            return;
        };
        match self.send(&reply) {
            Ok(()) => self.stats.replies_published = self.stats.replies_published.wrapping_add(1),
            Err(e) => {
                warn!("VRPC: reply to '{}' failed: {}", reply.topic, e);
                self.stats.replies_dropped = self.stats.replies_dropped.wrapping_add(1);
            }
        }
    }

    fn presence(&self, status: AgentStatus) -> Publication {
        Publication {
            topic: agent_info_topic(&self.identity.domain, &self.identity.agent_id),
            payload: AgentInfo::new(status, &self.identity.hostname).to_json(),
            retain: true,
            qos: Qos::AtLeastOnce,
        }
    }

    fn send(&mut self, p: &Publication) -> Result<()> {
        self.broker
            .publish(&p.topic, p.payload.as_bytes(), p.retain, p.qos)
            .map_err(|e| {
                error!("VRPC: publish '{}' failed: {:?}", p.topic, e);
                Error::from(CommsError::PublishFailed)
            })
    }
}
