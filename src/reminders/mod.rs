mod allocator;
mod coordinator;
mod factory;
pub mod migration;
mod reconcile;

#[cfg(test)]
pub(crate) mod test_utils;

pub use allocator::{FIRST_REMINDER_ID, generate_id};
pub use coordinator::{AttachmentChange, AttachmentError, ReminderAttachmentCoordinator};
pub use factory::{DEFAULT_LEAD_TIME_MINUTES, ReminderFactory};
pub use reconcile::ReconcileReport;
