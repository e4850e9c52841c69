//! Per-source change detection
//!
//! A `SourceMonitor` owns one source's observed state and decides, for each
//! parse result, whether anything changed and what is new:
//!
//! ```text
//! Uninitialized --first value--> InitialRun --head changed--> Steady
//!                                    |                          |
//!                                    +--- same head: no-op -----+
//! ```
//!
//! An empty or failed parse is never a transition. `previous_last_value` is
//! only written in the same step that writes `last_value`. A source without a
//! declared kind takes the kind of its first observation and keeps it.

use crate::monitor::selector::{select_new_entries, AnchorPolicy};
use crate::state::{normalize_value, Observation, Source, SourceKind};
use crate::storage::SourceSnapshot;
use std::borrow::Cow;

/// Lifecycle phase of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing observed yet
    Uninitialized,
    /// First value observed, no change confirmed yet
    InitialRun,
    /// At least one change confirmed, or state restored from storage
    Steady,
}

/// A confirmed state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: SourceKind,
    /// New head value
    pub head: String,
    /// Head value before this change; `None` on the initial run
    pub previous: Option<String>,
    /// Entries to announce, newest first
    pub new_entries: Vec<String>,
    pub is_initial_run: bool,
}

impl Change {
    /// Whether this change has anything to announce
    pub fn should_notify(&self) -> bool {
        !self.new_entries.is_empty()
    }
}

/// Result of applying one parse to a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No data this cycle; state untouched
    Skipped,
    /// Head value unchanged; state untouched
    Unchanged,
    /// State changed and must be persisted
    Changed(Change),
}

/// Change-detection state machine for one source
#[derive(Debug, Clone)]
pub struct SourceMonitor {
    source: Source,
    phase: Phase,
    policy: AnchorPolicy,
}

impl SourceMonitor {
    /// Creates a monitor for a source that has never been observed
    pub fn new(source: Source, policy: AnchorPolicy) -> Self {
        Self {
            source,
            phase: Phase::Uninitialized,
            policy,
        }
    }

    /// Creates a monitor from persisted state
    ///
    /// A snapshot with a last value starts in `Steady` with the initial-run
    /// flag cleared; an empty snapshot is treated as never observed. Without
    /// a declared kind, a stored list means `Multiple` and none means `Single`.
    pub fn restore(mut source: Source, snapshot: &SourceSnapshot, policy: AnchorPolicy) -> Self {
        let Some(last_value) = snapshot.last_value.clone() else {
            return Self::new(source, policy);
        };

        source.previous_last_value = snapshot
            .previous_last_value
            .clone()
            .or_else(|| Some(last_value.clone()));
        source.last_value = Some(last_value);
        source.flag_url = snapshot.flag_url.clone();
        source.is_initial_run = false;

        if source.kind != Some(SourceKind::Single) {
            source.latest_values = snapshot.latest_values.clone();
        }
        if source.kind.is_none() {
            source.observed_kind = Some(if source.latest_values.is_empty() {
                SourceKind::Single
            } else {
                SourceKind::Multiple
            });
        }

        Self {
            source,
            phase: Phase::Steady,
            policy,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> AnchorPolicy {
        self.policy
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.source.enabled = enabled;
    }

    pub fn set_flag_url(&mut self, flag_url: Option<String>) {
        if flag_url.is_some() {
            self.source.flag_url = flag_url;
        }
    }

    /// Builds the persisted form of the current state
    pub fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot {
            source_id: self.source.id.clone(),
            last_value: self.source.last_value.clone(),
            previous_last_value: self.source.previous_last_value.clone(),
            latest_values: self.source.latest_values.clone(),
            flag_url: self.source.flag_url.clone(),
            updated_at: None,
        }
    }

    /// Applies one parse result
    ///
    /// `None` means no data this cycle and never changes state. Once the
    /// source's kind is known, observations are reshaped to it.
    pub fn check(&mut self, observation: Option<&Observation>) -> CheckOutcome {
        let Some(observation) = observation else {
            return CheckOutcome::Skipped;
        };
        let shaped = match self.source.effective_kind() {
            Some(kind) if kind != observation.kind() => {
                Cow::Owned(observation.clone().into_kind(kind))
            }
            _ => Cow::Borrowed(observation),
        };
        let observation: &Observation = &shaped;

        let head = observation.head().to_string();
        let kind = observation.kind();

        match self.phase {
            Phase::Uninitialized => {
                self.source.last_value = Some(head.clone());
                self.source.previous_last_value = Some(head.clone());
                self.replace_values(observation);
                self.source.is_initial_run = true;
                self.phase = Phase::InitialRun;

                tracing::info!(source = %self.source.id, %head, "first value observed");

                CheckOutcome::Changed(Change {
                    kind,
                    head: head.clone(),
                    previous: None,
                    new_entries: vec![head],
                    is_initial_run: true,
                })
            }
            Phase::InitialRun | Phase::Steady => {
                if self.source.last_value.as_deref() == Some(head.as_str()) {
                    return CheckOutcome::Unchanged;
                }

                let anchor = self.source.last_value.take();
                let new_entries = match observation {
                    Observation::Single { value } => vec![value.clone()],
                    Observation::Multiple { values } => {
                        select_new_entries(values, anchor.as_deref(), self.policy).to_vec()
                    }
                };

                self.source.previous_last_value = anchor.clone();
                self.source.last_value = Some(head.clone());
                self.replace_values(observation);
                self.source.is_initial_run = false;
                self.phase = Phase::Steady;

                tracing::info!(
                    source = %self.source.id,
                    previous = anchor.as_deref().unwrap_or("-"),
                    %head,
                    new = new_entries.len(),
                    "value changed"
                );

                CheckOutcome::Changed(Change {
                    kind,
                    head,
                    previous: anchor,
                    new_entries,
                    is_initial_run: false,
                })
            }
        }
    }

    /// Applies a manual update of the head value
    ///
    /// Follows the same rule as a detected change: the old head becomes the
    /// anchor. Returns `false` when the value is empty or already current.
    pub fn override_last_value(&mut self, value: &str) -> bool {
        let Some(value) = normalize_value(value) else {
            return false;
        };
        if self.source.last_value.as_deref() == Some(value.as_str()) {
            return false;
        }

        let previous = self.source.last_value.take().unwrap_or_else(|| value.clone());
        self.source.previous_last_value = Some(previous);
        self.source.last_value = Some(value);
        self.source.is_initial_run = false;
        self.phase = Phase::Steady;
        true
    }

    fn replace_values(&mut self, observation: &Observation) {
        self.source.observed_kind.get_or_insert(observation.kind());
        self.source.latest_values = match observation {
            Observation::Single { .. } => Vec::new(),
            Observation::Multiple { values } => values.clone(),
        };
    }
}
