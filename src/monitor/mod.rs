//! Monitor module: change detection and the polling loop
//!
//! # Components
//!
//! - `select_new_entries`: which entries of a list are newer than an anchor
//! - `SourceMonitor`: per-source state machine
//! - `CountdownNotifier`: per-source countdown tasks on sent notifications
//! - `Registry`: shared set of source monitors
//! - `Monitor`: the loop, dispatch and runtime controls

mod coordinator;
mod countdown;
mod registry;
mod selector;
mod source_monitor;

pub use coordinator::{CycleReport, Monitor};
pub use countdown::{CountdownExit, CountdownNotifier, RepeatSettings};
pub use registry::{lock_monitor, Registry, SharedMonitor};
pub use selector::{select_new_entries, AnchorPolicy};
pub use source_monitor::{Change, CheckOutcome, Phase, SourceMonitor};
