use std::collections::BTreeSet;

use crate::models::reminder::ReminderId;

/// Smallest id ever handed out. Zero and negative ids are never produced.
pub const FIRST_REMINDER_ID: ReminderId = 1;

/// Returns an id that is not among `used`.
///
/// `used` has to be a fresh snapshot of the reminder store; the result is only
/// free with respect to what was passed in.
pub fn generate_id(used: impl IntoIterator<Item = ReminderId>) -> ReminderId {
    let used: BTreeSet<ReminderId> = used
        .into_iter()
        .filter(|id| *id >= FIRST_REMINDER_ID)
        .collect();

    match used.last() {
        None => FIRST_REMINDER_ID,
        Some(max) => max
            .checked_add(1)
            .unwrap_or_else(|| smallest_free_id(&used)),
    }
}

fn smallest_free_id(used: &BTreeSet<ReminderId>) -> ReminderId {
    let mut expected = FIRST_REMINDER_ID;
    for id in used {
        if *id != expected {
            return expected;
        }
        expected += 1;
    }
    expected
}
