use std::{fmt::Debug, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::remote::Remoter;

const DEFAULT_MAX_RESTARTS: u32 = 3;
const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(500);

/// Configuration structure for engines.
#[derive(Clone)]
pub struct EngineConfig {
    remote: Option<Arc<dyn Remoter>>,
    // How often a panicking receiver is recreated before its process gives up.
    max_restarts: u32,
    restart_delay: Duration,
}

impl Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        f.debug_struct("EngineConfig")
            .field("remote", &self.remote.as_ref().map(|remote| remote.address()))
            .field("max_restarts", &self.max_restarts)
            .field("restart_delay", &self.restart_delay)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote: None,
            max_restarts: DEFAULT_MAX_RESTARTS,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote, making the engine capable of sending and receiving messages over the
    /// network. The engine takes over the address of the remote.
    pub fn with_remote(mut self, remote: Arc<dyn Remoter>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Default restart limit for processes that don't set their own.
    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Default delay before a crashed receiver is recreated.
    pub fn with_restart_delay(mut self, restart_delay: Duration) -> Self {
        self.restart_delay = restart_delay;
        self
    }

    pub fn remote(&self) -> Option<&Arc<dyn Remoter>> {
        self.remote.as_ref()
    }

    pub fn max_restarts(&self) -> u32 {
        self.max_restarts
    }

    pub fn restart_delay(&self) -> Duration {
        self.restart_delay
    }
}

/// Per-process settings used when spawning.
///
/// Fields that are left unset fall back to the defaults of the [`EngineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    id: Option<String>,
    max_restarts: Option<u32>,
    restart_delay: Option<Duration>,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed id instead of a generated one. The process will be registered as `kind/id`.
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = Some(max_restarts);
        self
    }

    pub fn with_restart_delay(mut self, restart_delay: Duration) -> Self {
        self.restart_delay = Some(restart_delay);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn max_restarts_or(&self, default: u32) -> u32 {
        self.max_restarts.unwrap_or(default)
    }

    pub(crate) fn restart_delay_or(&self, default: Duration) -> Duration {
        self.restart_delay.unwrap_or(default)
    }
}
