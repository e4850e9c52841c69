//! New-entry selection
//!
//! Given a freshly parsed list (newest first) and the previously recorded
//! head value, returns the entries that are newer than that anchor.

use serde::Deserialize;

/// What to do when the anchor is no longer in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPolicy {
    /// The anchor rotated out of the window: everything is new
    #[default]
    AllNew,
    /// Nothing can be proven new; report no entries
    NoneNew,
}

/// Returns the entries of `list` that are newer than `anchor`
///
/// - No anchor: the whole list
/// - Anchor at index 0: nothing
/// - Anchor at index `k`: `list[..k]`, in order
/// - Anchor absent: decided by `policy`
pub fn select_new_entries<'a>(
    list: &'a [String],
    anchor: Option<&str>,
    policy: AnchorPolicy,
) -> &'a [String] {
    let Some(anchor) = anchor else {
        return list;
    };

    match list.iter().position(|entry| entry == anchor) {
        Some(index) => &list[..index],
        None => match policy {
            AnchorPolicy::AllNew => list,
            AnchorPolicy::NoneNew => &[],
        },
    }
}
