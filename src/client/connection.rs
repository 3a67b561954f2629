//! client::connection
//!
//! Process-wide metafile factory resolution.
//!
//! # Design
//!
//! The factory is created on first use and cached for the life of the
//! connection. How it is created is fixed by a [`FactoryStrategy`] chosen
//! before the first access:
//!
//! - `SelfContained`: an in-process factory handed in directly
//! - `Activated`: a factory located through an [`Activator`]
//!
//! The strategy cannot change once the factory exists. Activation failure
//! is fatal through [`Connection::factory`]; [`Connection::try_factory`]
//! returns the error instead for hosts with a different policy.
//!
//! # Concurrency
//!
//! The slot is double-checked: a read lock serves the common case, and
//! creation happens under the write lock so concurrent first users
//! converge on one factory.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::core::config::{Config, ConfigError, DEFAULT_EVENT_BUFFER};
use crate::service::{
    ActivationError, Activator, MemoryMetafileFactory, Metafile, MetafileFactory,
};

/// Supported factory strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// In-process factory
    SelfContained,
    /// Factory located through an activator
    Activated,
}

impl StrategyKind {
    /// Get all strategies.
    pub fn all() -> &'static [StrategyKind] {
        &[StrategyKind::SelfContained, StrategyKind::Activated]
    }

    /// Get the strategy name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::SelfContained => "self-contained",
            StrategyKind::Activated => "activated",
        }
    }

    /// Parse a strategy from a string.
    ///
    /// # Example
    ///
    /// ```
    /// use dirmeta::client::StrategyKind;
    ///
    /// assert_eq!(StrategyKind::parse("activated"), Some(StrategyKind::Activated));
    /// assert_eq!(StrategyKind::parse("remote"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "self-contained" => Some(StrategyKind::SelfContained),
            "activated" => Some(StrategyKind::Activated),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Get the list of valid strategy names.
pub fn valid_strategy_names() -> Vec<&'static str> {
    StrategyKind::all().iter().map(|k| k.name()).collect()
}

/// How the connection obtains its factory.
#[derive(Clone)]
pub enum FactoryStrategy {
    /// Use this factory directly.
    SelfContained(Arc<dyn MetafileFactory>),
    /// Ask `activator` for the factory registered under `server`.
    Activated {
        server: String,
        activator: Arc<dyn Activator>,
    },
}

impl FactoryStrategy {
    /// Self-contained strategy over a fresh in-memory store.
    pub fn self_contained() -> Self {
        FactoryStrategy::SelfContained(Arc::new(MemoryMetafileFactory::new()))
    }

    /// Activated strategy for `server`.
    pub fn activated(server: impl Into<String>, activator: Arc<dyn Activator>) -> Self {
        FactoryStrategy::Activated {
            server: server.into(),
            activator,
        }
    }

    /// Get the kind of this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            FactoryStrategy::SelfContained(_) => StrategyKind::SelfContained,
            FactoryStrategy::Activated { .. } => StrategyKind::Activated,
        }
    }
}

impl Default for FactoryStrategy {
    fn default() -> Self {
        Self::self_contained()
    }
}

impl fmt::Debug for FactoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryStrategy::SelfContained(_) => f.write_str("SelfContained"),
            FactoryStrategy::Activated { server, .. } => f
                .debug_struct("Activated")
                .field("server", server)
                .finish_non_exhaustive(),
        }
    }
}

/// Errors from connection operations.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The strategy was changed after the factory was created.
    #[error("factory strategy cannot change once the factory is in use")]
    FactoryInUse,

    /// The factory was already released.
    #[error("connection has been shut down")]
    ShutDown,

    /// The activator could not produce a factory.
    #[error("failed to activate metafile factory server '{server}': {}", .source.details())]
    Activation {
        server: String,
        #[source]
        source: ActivationError,
    },
}

/// Abort after a failed activation.
///
/// Activation failing means the installation is broken, so there is no
/// sensible fallback.
pub fn die_on_failed_activation(server: &str, error: &ActivationError) -> ! {
    let details = error.details();
    error!(server, details = %details, "failed to activate metafile factory");
    panic!(
        "Failed to activate the server {server}; this may indicate a broken \
         installation or an incorrect search path. Details: '{details}'"
    )
}

enum FactorySlot {
    Unresolved,
    Resolved(Arc<dyn MetafileFactory>),
    Released,
}

struct FactoryState {
    strategy: FactoryStrategy,
    slot: FactorySlot,
}

/// Process-wide connection to the metadata service.
///
/// Share it as `Arc<Connection>` between every [`Directory`].
///
/// [`Directory`]: crate::client::Directory
pub struct Connection {
    state: RwLock<FactoryState>,
    event_buffer: usize,
}

impl Connection {
    /// Create a connection with the given strategy.
    pub fn new(strategy: FactoryStrategy) -> Self {
        Self {
            state: RwLock::new(FactoryState {
                strategy,
                slot: FactorySlot::Unresolved,
            }),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Set the capacity of each directory's event channel.
    ///
    /// Values below one are raised to one.
    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }

    /// Build a connection from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingActivator` if the configuration selects
    /// the activated strategy and no activator is supplied.
    pub fn from_config(
        config: &Config,
        activator: Option<Arc<dyn Activator>>,
    ) -> Result<Self, ConfigError> {
        let kind = StrategyKind::parse(config.strategy()).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "invalid factory strategy '{}', must be one of: {}",
                config.strategy(),
                valid_strategy_names().join(", ")
            ))
        })?;

        let strategy = match kind {
            StrategyKind::SelfContained => FactoryStrategy::self_contained(),
            StrategyKind::Activated => {
                let activator = activator
                    .ok_or_else(|| ConfigError::MissingActivator(config.server().to_string()))?;
                FactoryStrategy::activated(config.server(), activator)
            }
        };

        Ok(Self::new(strategy).with_event_buffer(config.event_buffer()))
    }

    /// Get the per-directory event channel capacity.
    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    /// Get the kind of the selected strategy.
    pub async fn strategy_kind(&self) -> StrategyKind {
        self.state.read().await.strategy.kind()
    }

    /// Check whether the factory has been created.
    pub async fn has_factory(&self) -> bool {
        matches!(self.state.read().await.slot, FactorySlot::Resolved(_))
    }

    /// Select the factory strategy.
    ///
    /// # Errors
    ///
    /// - `FactoryInUse` if the factory was already created
    /// - `ShutDown` if the connection was shut down
    pub async fn use_strategy(&self, strategy: FactoryStrategy) -> Result<(), ConnectionError> {
        let mut state = self.state.write().await;
        match state.slot {
            FactorySlot::Resolved(_) => return Err(ConnectionError::FactoryInUse),
            FactorySlot::Released => return Err(ConnectionError::ShutDown),
            FactorySlot::Unresolved => {}
        }

        state.strategy = strategy;
        Ok(())
    }

    /// Select the self-contained strategy with the given factory.
    pub async fn use_self_contained_factory(
        &self,
        factory: Arc<dyn MetafileFactory>,
    ) -> Result<(), ConnectionError> {
        self.use_strategy(FactoryStrategy::SelfContained(factory))
            .await
    }

    /// Get the factory, creating it on first call.
    ///
    /// A failed activation leaves the slot unresolved, so the next call
    /// tries again.
    pub async fn try_factory(&self) -> Result<Arc<dyn MetafileFactory>, ConnectionError> {
        {
            let state = self.state.read().await;
            match &state.slot {
                FactorySlot::Resolved(factory) => return Ok(factory.clone()),
                FactorySlot::Released => return Err(ConnectionError::ShutDown),
                FactorySlot::Unresolved => {}
            }
        }

        let mut state = self.state.write().await;
        match &state.slot {
            FactorySlot::Resolved(factory) => return Ok(factory.clone()),
            FactorySlot::Released => return Err(ConnectionError::ShutDown),
            FactorySlot::Unresolved => {}
        }

        let factory = match &state.strategy {
            FactoryStrategy::SelfContained(factory) => factory.clone(),
            FactoryStrategy::Activated { server, activator } => activator
                .activate(server)
                .await
                .map_err(|source| ConnectionError::Activation {
                    server: server.clone(),
                    source,
                })?,
        };

        debug!(strategy = %state.strategy.kind(), "metafile factory created");
        state.slot = FactorySlot::Resolved(factory.clone());
        Ok(factory)
    }

    /// Get the factory, creating it on first call.
    ///
    /// # Panics
    ///
    /// Panics if activation fails or the connection was shut down.
    pub async fn factory(&self) -> Arc<dyn MetafileFactory> {
        match self.try_factory().await {
            Ok(factory) => factory,
            Err(ConnectionError::Activation { server, source }) => {
                die_on_failed_activation(&server, &source)
            }
            Err(err) => panic!("metafile factory unavailable: {err}"),
        }
    }

    /// Open the metafile for a directory URI.
    ///
    /// Returns `None` if the service refuses; the failure is only logged.
    pub async fn open_metafile(&self, uri: &str) -> Option<Arc<dyn Metafile>> {
        let factory = self.factory().await;
        match factory.open(uri).await {
            Ok(metafile) => Some(metafile),
            Err(err) => {
                debug!(uri, error = %err, "failed to open metafile");
                None
            }
        }
    }

    /// Release the factory.
    ///
    /// Later factory access panics. Shutting down twice is a caller bug.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        return_if_fail!(!matches!(state.slot, FactorySlot::Released));

        if matches!(state.slot, FactorySlot::Resolved(_)) {
            debug!("metafile factory released");
        }
        state.slot = FactorySlot::Released;
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(FactoryStrategy::default())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("event_buffer", &self.event_buffer)
            .finish_non_exhaustive()
    }
}
