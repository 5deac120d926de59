//! WiFi station link supervision.
//!
//! The firmware joins the access point once at boot. After that
//! [`WifiSupervisor::poll`] runs every control-loop pass, notices when the
//! station drops off and re-runs the platform connect step.
//!
//! ## Reconnection policy
//!
//! On link loss the first retry is immediate. Every failed retry doubles
//! the wait (2 s → 4 s → 8 s … capped at 60 s); a successful one resets it.

use log::{info, warn};

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Connected,
    Reconnecting { attempt: u32 },
}

pub struct WifiSupervisor {
    state: WifiState,
    backoff_ms: u64,
    next_attempt_ms: u64,
}

impl Default for WifiSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiSupervisor {
    /// Starts in `Connected`; the boot sequence has already joined.
    pub fn new() -> Self {
        Self {
            state: WifiState::Connected,
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Advances the supervisor. `link_up` is the driver's current view of the
    /// station; `reconnect` performs one blocking connect attempt and reports
    /// whether the interface came back up.
    pub fn poll<F>(&mut self, now_ms: u64, link_up: bool, reconnect: F) -> WifiState
    where
        F: FnOnce() -> bool,
    {
        match self.state {
            WifiState::Connected => {
                if !link_up {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.next_attempt_ms = now_ms;
                    self.try_reconnect(now_ms, 0, reconnect);
                }
            }
            WifiState::Reconnecting { attempt } => {
                if link_up {
                    self.mark_connected();
                } else if now_ms >= self.next_attempt_ms {
                    self.try_reconnect(now_ms, attempt, reconnect);
                }
            }
        }
        self.state
    }

    fn try_reconnect<F>(&mut self, now_ms: u64, attempt: u32, reconnect: F)
    where
        F: FnOnce() -> bool,
    {
        info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt, self.backoff_ms);
        if reconnect() {
            self.mark_connected();
        } else {
            self.next_attempt_ms = now_ms.saturating_add(self.backoff_ms);
            self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
            self.state = WifiState::Reconnecting {
                attempt: attempt.wrapping_add(1),
            };
        }
    }

    fn mark_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
        info!("WiFi: reconnected");
    }
}
