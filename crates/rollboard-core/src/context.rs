//! RollboardContext - the shared state behind every interface.
//!
//! The HTTP server (and anything else embedding the core) builds one context
//! at startup and hands it to its handlers:
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │     RollboardContext     │
//!                 ├──────────────────────────┤
//!                 │  - DraftPublishController│
//!                 │  - LogManager            │
//!                 │  - UserStore             │
//!                 │  - TvUrlStore            │
//!                 │  - UploadStore           │
//!                 │  - EventBus              │
//!                 └────────────┬─────────────┘
//!                              │
//!                  ┌───────────┴───────────┐
//!                  ▼                       ▼
//!           ┌─────────────┐        ┌──────────────┐
//!           │ HTTP routes │        │  WebSocket   │
//!           └─────────────┘        └──────────────┘
//! ```

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::draft::DraftPublishController;
use crate::event_bus::EventBus;
use crate::logs::LogManager;
use crate::persistence::{TvUrlStore, UploadStore, UserStore};

/// Builder for [`RollboardContext`].
pub struct RollboardContextBuilder {
    config: StoreConfig,
    event_bus: Option<Arc<EventBus>>,
}

impl RollboardContextBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            event_bus: None,
        }
    }

    /// Use an existing EventBus (for testing or sharing across servers).
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn build(self) -> RollboardContext {
        let config = self.config;
        let snapshots = Arc::new(DraftPublishController::new(&config));
        let tv_urls = Arc::new(TvUrlStore::new(config.tv_urls_path()));

        RollboardContext {
            logs: LogManager::new(Arc::clone(&snapshots)),
            users: UserStore::new(config.users_path()),
            uploads: UploadStore::new(&config, Arc::clone(&tv_urls)),
            snapshots,
            tv_urls,
            event_bus: self.event_bus.unwrap_or_else(|| Arc::new(EventBus::new())),
            config,
        }
    }
}

/// Everything a request handler needs.
pub struct RollboardContext {
    pub config: StoreConfig,
    pub snapshots: Arc<DraftPublishController>,
    pub logs: LogManager,
    pub users: UserStore,
    pub tv_urls: Arc<TvUrlStore>,
    pub uploads: UploadStore,
    pub event_bus: Arc<EventBus>,
}

impl RollboardContext {
    pub fn new(config: StoreConfig) -> Self {
        RollboardContextBuilder::new(config).build()
    }

    pub fn builder(config: StoreConfig) -> RollboardContextBuilder {
        RollboardContextBuilder::new(config)
    }
}
