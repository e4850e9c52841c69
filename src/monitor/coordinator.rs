//! Monitor loop - polling orchestration
//!
//! This module contains the loop that drives every configured source:
//! - Sources are checked sequentially with a short pause in between
//! - Each check runs fetch, parse, change detection, persistence and
//!   notification in that order
//! - Per-source failures are logged and never stop the loop
//!
//! The runtime controls used by an external chat layer live here too.

use crate::config::{Config, FlagConfig, MonitorConfig, NotifyConfig};
use crate::country::{confirm_flag, FlagResolver};
use crate::fetch::Fetcher;
use crate::monitor::countdown::{CountdownNotifier, RepeatSettings};
use crate::monitor::registry::{lock_monitor, Registry, SharedMonitor};
use crate::monitor::source_monitor::{Change, CheckOutcome, SourceMonitor};
use crate::notify::{Notification, NotificationState, Notifier};
use crate::parser::{ContentParser, ParseOutcome};
use crate::state::{Source, SourceKind};
use crate::storage::{SourceSnapshot, SourceStore};
use crate::RelayError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Counters for one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub skipped: usize,
    pub changed: usize,
    pub notified: usize,
}

/// Drives all sources and owns the shared runtime state
pub struct Monitor {
    monitor_config: MonitorConfig,
    notify_config: NotifyConfig,
    flag_config: FlagConfig,
    parser: ContentParser,
    registry: Arc<Registry>,
    store: Mutex<Box<dyn SourceStore>>,
    notifier: Arc<dyn Notifier>,
    countdown: CountdownNotifier,
}

impl Monitor {
    /// Creates a monitor from configuration
    ///
    /// Every source's last known state is loaded from `store` once here.
    ///
    /// # Returns
    ///
    /// * `Ok(Monitor)` - ready to run
    /// * `Err(RelayError)` - the HTTP client could not be built or the store
    ///   could not be read
    pub fn new(
        config: &Config,
        store: Box<dyn SourceStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, RelayError> {
        let fetcher = Fetcher::new(&config.fetch)?;
        let parser = ContentParser::new(
            &config.parser,
            config.api.as_ref(),
            fetcher,
            FlagResolver::new(config.flags.template.clone()),
        );

        let policy = config.selection.anchor_missing;
        let mut monitors = Vec::with_capacity(config.source.len());
        for source_config in &config.source {
            let source = Source::from_config(source_config, &config.rewrite);
            let monitor = match store.load(&source.id)? {
                Some(snapshot) => {
                    tracing::info!(
                        source = %source.id,
                        last = snapshot.last_value.as_deref().unwrap_or("-"),
                        "restored state"
                    );
                    SourceMonitor::restore(source, &snapshot, policy)
                }
                None => SourceMonitor::new(source, policy),
            };
            monitors.push(monitor);
        }

        let countdown = CountdownNotifier::new(
            Arc::clone(&notifier),
            RepeatSettings {
                enabled: config.repeat.enabled,
                interval: Duration::from_secs(config.repeat.interval),
            },
            Duration::from_millis(config.repeat.tick),
        );

        Ok(Self {
            monitor_config: config.monitor.clone(),
            notify_config: config.notify.clone(),
            flag_config: config.flags.clone(),
            parser,
            registry: Arc::new(Registry::new(monitors)),
            store: Mutex::new(store),
            notifier,
            countdown,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn countdown(&self) -> &CountdownNotifier {
        &self.countdown
    }

    pub fn parser(&self) -> &ContentParser {
        &self.parser
    }

    /// Returns a copy of a source's current record
    pub fn source(&self, source_id: &str) -> Option<Source> {
        self.registry
            .get(source_id)
            .map(|m| lock_monitor(&m).source().clone())
    }

    /// Runs polling cycles forever
    pub async fn run(&self) {
        tracing::info!(
            sources = self.registry.len(),
            interval = ?self.monitor_config.check_interval(),
            "monitor started"
        );

        loop {
            let report = self.run_cycle().await;
            tracing::debug!(?report, "cycle finished");
            tokio::time::sleep(self.monitor_config.check_interval()).await;
        }
    }

    /// Checks every enabled, due source once, sequentially
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut first = true;

        for source_id in self.registry.ids() {
            let Some(monitor) = self.registry.get(source_id) else {
                continue;
            };
            let (enabled, interval) = {
                let guard = lock_monitor(&monitor);
                (guard.source().enabled, guard.source().check_interval)
            };

            let now = Instant::now();
            if !enabled || (interval.is_some() && !self.registry.is_due(source_id, now)) {
                report.skipped += 1;
                continue;
            }
            if let Some(interval) = interval {
                self.registry.set_next_due(source_id, now + interval);
            }

            if !first {
                tokio::time::sleep(self.monitor_config.source_pause()).await;
            }
            first = false;

            report.checked += 1;
            if let CheckOutcome::Changed(change) = self.check_monitor(&monitor).await {
                report.changed += 1;
                if change.should_notify() {
                    report.notified += 1;
                }
            }
        }

        report
    }

    /// Checks one source now, regardless of its schedule
    pub async fn check_source(&self, source_id: &str) -> Result<CheckOutcome, RelayError> {
        let monitor = self
            .registry
            .get(source_id)
            .ok_or_else(|| RelayError::UnknownSource(source_id.to_string()))?;
        Ok(self.check_monitor(&monitor).await)
    }

    async fn check_monitor(&self, monitor: &SharedMonitor) -> CheckOutcome {
        let (source_id, url, kind) = {
            let guard = lock_monitor(monitor);
            let source = guard.source();
            (source.id.clone(), source.url.clone(), source.effective_kind())
        };

        let parsed = self.parser.parse(&url, kind).await;

        let (outcome, snapshot) = {
            let mut guard = lock_monitor(monitor);
            let outcome = guard.check(parsed.as_ref().map(|p| &p.observation));
            (outcome, guard.snapshot())
        };

        let change = match &outcome {
            CheckOutcome::Changed(change) => change.clone(),
            CheckOutcome::Skipped => {
                tracing::debug!(source = %source_id, "no data this cycle");
                return outcome;
            }
            CheckOutcome::Unchanged => return outcome,
        };

        self.persist(&snapshot);

        let flag = match &parsed {
            Some(parsed) => self.choose_flag(parsed, snapshot.flag_url.as_deref()).await,
            None => snapshot.flag_url.clone(),
        };
        if flag.is_some() && flag != snapshot.flag_url {
            let snapshot = {
                let mut guard = lock_monitor(monitor);
                guard.set_flag_url(flag.clone());
                guard.snapshot()
            };
            self.persist(&snapshot);
        }

        self.dispatch(&source_id, &change, flag).await;
        outcome
    }

    async fn choose_flag(&self, parsed: &ParseOutcome, previous: Option<&str>) -> Option<String> {
        let probe = self
            .flag_config
            .probe
            .then(|| Duration::from_millis(self.flag_config.probe_timeout));
        confirm_flag(
            self.parser.fetcher(),
            parsed.flag_url(),
            &[parsed.page_image.as_deref(), previous],
            probe,
        )
        .await
    }

    fn persist(&self, snapshot: &SourceSnapshot) {
        let mut store = self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = store.save(snapshot) {
            tracing::error!(source = %snapshot.source_id, error = %e, "failed to save state");
        }
    }

    /// Sends the notification(s) for a confirmed change
    ///
    /// Delivery failures are logged; the persisted state stays as is.
    async fn dispatch(&self, source_id: &str, change: &Change, flag_url: Option<String>) {
        if !change.should_notify() {
            tracing::info!(source = %source_id, head = %change.head, "state updated, nothing new to announce");
            return;
        }

        let single_mode = self.notify_config.single_mode
            && change.kind == SourceKind::Multiple
            && !change.is_initial_run
            && change.new_entries.len() > 1;

        if single_mode {
            let pause = Duration::from_millis(self.notify_config.single_mode_pause);
            for (index, entry) in change.new_entries.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(pause).await;
                }
                let notification = Notification {
                    source_id: source_id.to_string(),
                    kind: change.kind,
                    entries: vec![entry.clone()],
                    is_initial_run: false,
                    single_mode: true,
                    flag_url: flag_url.clone(),
                };
                if let Err(e) = self.notifier.notify(&notification).await {
                    tracing::error!(source = %source_id, entry = %entry, error = %e, "notification failed");
                }
            }
            return;
        }

        let mut state = NotificationState::new(Notification {
            source_id: source_id.to_string(),
            kind: change.kind,
            entries: change.new_entries.clone(),
            is_initial_run: change.is_initial_run,
            single_mode: false,
            flag_url,
        });

        match self.notifier.notify(&state.notification).await {
            Ok(handle) => {
                state.message_handle = Some(handle);
                self.countdown.start(&state);
                self.registry.set_latest(state);
            }
            Err(e) => {
                tracing::error!(source = %source_id, error = %e, "notification failed");
            }
        }
    }

    // ===== Runtime controls =====

    fn monitor(&self, source_id: &str) -> Result<SharedMonitor, RelayError> {
        self.registry
            .get(source_id)
            .ok_or_else(|| RelayError::UnknownSource(source_id.to_string()))
    }

    /// Enables or disables polling of a source
    pub fn set_enabled(&self, source_id: &str, enabled: bool) -> Result<(), RelayError> {
        let monitor = self.monitor(source_id)?;
        lock_monitor(&monitor).set_enabled(enabled);
        tracing::info!(source = %source_id, enabled, "source toggled");
        Ok(())
    }

    /// Manually sets a source's head value
    ///
    /// The old head becomes the anchor, the state is persisted and the
    /// source's countdown is cancelled. Returns whether the value changed.
    pub fn set_last_value(&self, source_id: &str, value: &str) -> Result<bool, RelayError> {
        let monitor = self.monitor(source_id)?;
        let snapshot = {
            let mut guard = lock_monitor(&monitor);
            if !guard.override_last_value(value) {
                return Ok(false);
            }
            guard.snapshot()
        };

        self.persist(&snapshot);
        self.countdown.cancel(source_id);
        tracing::info!(source = %source_id, value = snapshot.last_value.as_deref().unwrap_or("-"), "last value set manually");
        Ok(true)
    }

    /// Acknowledges a source's notification, stopping its countdown
    pub fn acknowledge(&self, source_id: &str) -> Result<bool, RelayError> {
        self.monitor(source_id)?;
        Ok(self.countdown.cancel(source_id))
    }

    /// Sets the repeat interval and enables repeat notifications
    ///
    /// Running countdowns stop; if the latest notification had one, it is
    /// re-armed with the new interval.
    pub fn set_repeat_interval(&self, interval: Duration) -> bool {
        let was_counting = self
            .registry
            .latest()
            .map(|latest| self.countdown.is_active(latest.source_id()))
            .unwrap_or(false);

        self.countdown.set_interval(interval);
        self.countdown.set_enabled(true);
        tracing::info!(?interval, "repeat interval set");

        was_counting && self.restart_countdown()
    }

    /// Disables repeat notifications and cancels every countdown
    pub fn stop_repeat(&self) {
        self.countdown.set_enabled(false);
        self.countdown.cancel_all();
        tracing::info!("repeat notifications stopped");
    }

    /// Re-arms the countdown on the most recent notification
    pub fn restart_countdown(&self) -> bool {
        match self.registry.latest() {
            Some(latest) => self.countdown.start(&latest),
            None => false,
        }
    }
}
