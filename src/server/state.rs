//! Shared application state for the queue server

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, SettingsStore};
use crate::events::EventBus;
use crate::queue::store::QueueStore;
use crate::runner::env::MineruResolver;
use crate::runner::progress::MarkerProgress;
use crate::runner::ProcessRunner;
use crate::scheduler::Scheduler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    scheduler: Scheduler,
    settings: SettingsStore,
    events: EventBus,
    resolver: Arc<MineruResolver>,
}

impl AppState {
    /// Wire up the queue, runner, resolver and scheduler from configuration.
    pub fn new(config: AppConfig) -> Self {
        let events = EventBus::default();
        let store = QueueStore::new(events.clone());

        let progress = Arc::new(MarkerProgress::new(
            config.queue.progress_step,
            config.queue.progress_cap,
        ));
        let runner = Arc::new(ProcessRunner::new(store.clone(), progress));
        let resolver = Arc::new(MineruResolver::new(&config.tool));
        let scheduler = Scheduler::new(
            store,
            runner,
            resolver.clone(),
            Duration::from_millis(config.queue.pause_ms),
        );
        let settings = SettingsStore::new(config.settings_path());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                scheduler,
                settings,
                events,
                resolver,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn resolver(&self) -> &Arc<MineruResolver> {
        &self.inner.resolver
    }
}
