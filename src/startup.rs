use std::sync::Arc;

use crate::reminders::{
    ReconcileReport, ReminderAttachmentCoordinator, ReminderFactory,
    migration::{SchedulerMigration, run_scheduler_migration},
};
use crate::scheduler::ReminderScheduler;
use crate::settings::SettingsManager;
use crate::storage::{LessonStorage, ReminderStorage};

pub struct Dependencies {
    pub reminders: Arc<dyn ReminderStorage>,
    pub lessons: Arc<dyn LessonStorage>,
    pub scheduler: Arc<dyn ReminderScheduler>,
    pub settings: Arc<SettingsManager>,
    pub factory: ReminderFactory,
}

/// Runs the one-time scheduler migration and reconciliation, and only then
/// hands out the coordinator that accepts attach/detach requests.
pub async fn prepare_coordinator(
    deps: Dependencies,
    migration: &dyn SchedulerMigration,
) -> anyhow::Result<(ReminderAttachmentCoordinator, ReconcileReport)> {
    if run_scheduler_migration(&deps.settings, migration).await? {
        log::info!("Scheduler API migration applied");
    }

    let coordinator =
        ReminderAttachmentCoordinator::new(deps.reminders, deps.lessons, deps.scheduler, deps.factory);
    let report = coordinator.reconcile().await?;

    Ok((coordinator, report))
}
