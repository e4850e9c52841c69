//! Self-renewing countdown on the latest notification
//!
//! Each source has at most one countdown task. The task edits the sent
//! message's caption every tick with the time left, and stops when:
//! - the interval elapses
//! - it is cancelled (manual update, acknowledgement, stop command)
//! - the repeat settings change
//! - the sender reports the message handle as invalid
//!
//! Cancellation is cooperative: the task checks its flag once per tick.

use crate::notify::{render_caption, MessageHandle, Notification, NotificationState, Notifier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Repeat-notification settings shared with running countdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSettings {
    pub enabled: bool,
    pub interval: Duration,
}

/// Why a countdown task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownExit {
    Expired,
    Cancelled,
    IntervalChanged,
    HandleInvalid,
}

struct ActiveCountdown {
    notification_id: u64,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<CountdownExit>,
}

/// Owns the per-source countdown tasks
pub struct CountdownNotifier {
    notifier: Arc<dyn Notifier>,
    settings: watch::Sender<RepeatSettings>,
    tick: Duration,
    active: Mutex<HashMap<String, ActiveCountdown>>,
}

impl CountdownNotifier {
    pub fn new(notifier: Arc<dyn Notifier>, settings: RepeatSettings, tick: Duration) -> Self {
        let (settings, _) = watch::channel(settings);
        Self {
            notifier,
            settings,
            tick,
            active: Mutex::new(HashMap::new()),
        }
    }

    fn active(&self) -> MutexGuard<'_, HashMap<String, ActiveCountdown>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn settings(&self) -> RepeatSettings {
        *self.settings.borrow()
    }

    /// Changes the countdown length; running countdowns stop
    pub fn set_interval(&self, interval: Duration) {
        self.settings.send_modify(|s| s.interval = interval);
    }

    /// Turns repeat notifications on or off; running countdowns stop
    pub fn set_enabled(&self, enabled: bool) {
        self.settings.send_modify(|s| s.enabled = enabled);
    }

    /// Starts a countdown for a sent notification
    ///
    /// Any countdown already running for the same source is cancelled first.
    ///
    /// # Returns
    ///
    /// * `true` - a countdown task was spawned
    /// * `false` - repeat is disabled or the message handle is unknown
    pub fn start(&self, state: &NotificationState) -> bool {
        let settings = self.settings();
        if !settings.enabled || settings.interval.is_zero() {
            return false;
        }
        let Some(handle) = state.message_handle.clone() else {
            return false;
        };

        let source_id = state.source_id().to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_countdown(
            Arc::clone(&self.notifier),
            state.notification.clone(),
            handle,
            settings,
            self.settings.subscribe(),
            self.tick,
            Arc::clone(&cancelled),
        ));

        let previous = self.active().insert(
            source_id.clone(),
            ActiveCountdown {
                notification_id: state.id,
                cancelled,
                task,
            },
        );
        if let Some(previous) = previous {
            previous.cancelled.store(true, Ordering::SeqCst);
        }

        tracing::debug!(
            source = %source_id,
            notification = state.id,
            interval = ?settings.interval,
            "countdown started"
        );
        true
    }

    /// Cancels the countdown for a source
    ///
    /// Returns whether a running countdown was cancelled.
    pub fn cancel(&self, source_id: &str) -> bool {
        let active = self.active();
        match active.get(source_id) {
            Some(countdown) if !countdown.task.is_finished() => {
                let was_running = !countdown.cancelled.swap(true, Ordering::SeqCst);
                if was_running {
                    tracing::debug!(source = %source_id, "countdown cancelled");
                }
                was_running
            }
            _ => false,
        }
    }

    /// Cancels every running countdown
    pub fn cancel_all(&self) {
        for countdown in self.active().values() {
            countdown.cancelled.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_active(&self, source_id: &str) -> bool {
        self.active()
            .get(source_id)
            .map(|c| !c.cancelled.load(Ordering::SeqCst) && !c.task.is_finished())
            .unwrap_or(false)
    }

    /// Id of the notification the source's countdown belongs to
    pub fn notification_id(&self, source_id: &str) -> Option<u64> {
        self.active().get(source_id).map(|c| c.notification_id)
    }

    /// Waits for a source's countdown task and returns how it ended
    pub async fn join(&self, source_id: &str) -> Option<CountdownExit> {
        let countdown = self.active().remove(source_id)?;
        match countdown.task.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                tracing::error!(source = %source_id, error = %e, "countdown task failed");
                None
            }
        }
    }
}

async fn run_countdown(
    notifier: Arc<dyn Notifier>,
    notification: Notification,
    handle: MessageHandle,
    initial: RepeatSettings,
    settings: watch::Receiver<RepeatSettings>,
    tick: Duration,
    cancelled: Arc<AtomicBool>,
) -> CountdownExit {
    let started = Instant::now();

    loop {
        if cancelled.load(Ordering::SeqCst) {
            return CountdownExit::Cancelled;
        }
        if *settings.borrow() != initial {
            return CountdownExit::IntervalChanged;
        }

        let remaining = initial.interval.saturating_sub(started.elapsed());
        let caption = render_caption(&notification, Some(remaining));
        if let Err(e) = notifier.edit_caption(&handle, &caption).await {
            tracing::warn!(
                source = %notification.source_id,
                handle = %handle,
                error = %e,
                "countdown edit failed, stopping"
            );
            return CountdownExit::HandleInvalid;
        }

        if remaining.is_zero() {
            tracing::debug!(source = %notification.source_id, "countdown expired");
            return CountdownExit::Expired;
        }

        tokio::time::sleep(tick.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::state::SourceKind;

    fn sent_state(source_id: &str) -> NotificationState {
        let mut state = NotificationState::new(Notification {
            source_id: source_id.to_string(),
            kind: SourceKind::Single,
            entries: vec!["123".to_string()],
            is_initial_run: false,
            single_mode: false,
            flag_url: None,
        });
        state.message_handle = Some(MessageHandle("msg-1".to_string()));
        state
    }

    fn countdown(notifier: Arc<RecordingNotifier>, interval_ms: u64) -> CountdownNotifier {
        CountdownNotifier::new(
            notifier,
            RepeatSettings {
                enabled: true,
                interval: Duration::from_millis(interval_ms),
            },
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_countdown_expires() {
        let notifier = Arc::new(RecordingNotifier::default());
        let countdown = countdown(Arc::clone(&notifier), 300);

        assert!(countdown.start(&sent_state("a")));
        assert_eq!(countdown.join("a").await, Some(CountdownExit::Expired));

        let edits = notifier.edits.lock().unwrap();
        assert!(edits.len() >= 2);
        let (_, last) = edits.last().unwrap();
        assert!(last.ends_with("Next notification in: 00 sec"));
    }

    #[tokio::test]
    async fn test_cancel_stops_countdown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let countdown = countdown(Arc::clone(&notifier), 10_000);

        countdown.start(&sent_state("a"));
        assert!(countdown.is_active("a"));
        assert!(countdown.cancel("a"));
        assert!(!countdown.is_active("a"));
        assert!(!countdown.cancel("a"));

        assert_eq!(countdown.join("a").await, Some(CountdownExit::Cancelled));
    }

    #[tokio::test]
    async fn test_interval_change_stops_countdown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let countdown = countdown(Arc::clone(&notifier), 10_000);

        countdown.start(&sent_state("a"));
        countdown.set_interval(Duration::from_secs(60));

        assert_eq!(countdown.join("a").await, Some(CountdownExit::IntervalChanged));
    }

    #[tokio::test]
    async fn test_restart_cancels_previous() {
        let notifier = Arc::new(RecordingNotifier::default());
        let countdown = countdown(Arc::clone(&notifier), 10_000);

        let first = sent_state("a");
        countdown.start(&first);
        let second = sent_state("a");
        countdown.start(&second);

        assert_eq!(countdown.notification_id("a"), Some(second.id));
        assert!(countdown.is_active("a"));
        countdown.cancel_all();
        assert_eq!(countdown.join("a").await, Some(CountdownExit::Cancelled));
    }

    #[tokio::test]
    async fn test_invalid_handle_stops_countdown() {
        let notifier = Arc::new(RecordingNotifier {
            reject_edits: true,
            ..RecordingNotifier::default()
        });
        let countdown = countdown(Arc::clone(&notifier), 10_000);

        countdown.start(&sent_state("a"));
        assert_eq!(countdown.join("a").await, Some(CountdownExit::HandleInvalid));
    }

    #[tokio::test]
    async fn test_not_started_when_disabled_or_unsent() {
        let notifier = Arc::new(RecordingNotifier::default());
        let countdown = countdown(Arc::clone(&notifier), 10_000);

        let mut unsent = sent_state("a");
        unsent.message_handle = None;
        assert!(!countdown.start(&unsent));

        countdown.set_enabled(false);
        assert!(!countdown.start(&sent_state("a")));
        assert!(!countdown.is_active("a"));
    }
}
