//! Change-intent detection at the finalize confirmation boundary.
//!
//! Deliberately cheap and approximate: a false positive merely re-opens
//! the ordering loop, it never corrupts state. Used only in the
//! finalize window, not during normal turns.

/// Fixed vocabulary of change-intent words.
const CHANGE_KEYWORDS: [&str; 6] = ["change", "modify", "edit", "add", "remove", "cancel"];

/// Case-insensitive substring match of `fragment` against the
/// change-intent vocabulary. Empty fragments never signal change.
pub fn wants_change(fragment: &str) -> bool {
    if fragment.trim().is_empty() {
        return false;
    }
    let lowered = fragment.to_lowercase();
    CHANGE_KEYWORDS.iter().any(|word| lowered.contains(word))
}
