//! In-process driver for the daily lifecycle job.

use std::{collections::HashMap, sync::Arc, time::Duration};

use super::{InMemoryScheduler, TenantId};
use crate::{
    clock::Clock,
    engine::{JOB_NAME, RunState, TransitionEngine},
};

/// Run the engine for every tenant whose fire time has arrived, advancing
/// each fired entry by one day. Returns the number of runs that executed
/// both phases (as opposed to skipping on lock contention).
pub async fn run_due_tenants(
    engines: &HashMap<TenantId, Arc<TransitionEngine>>,
    scheduler: &InMemoryScheduler,
    clock: &Arc<dyn Clock>,
) -> u64 {
    let now = clock.now_utc();
    let mut completed = 0u64;

    for (tenant, job) in scheduler.due(now) {
        if job != JOB_NAME {
            continue;
        }
        let Some(engine) = engines.get(&tenant) else {
            tracing::warn!(tenant = %tenant, "Due tenant has no engine wired, skipping");
            scheduler.advance_daily(&tenant, &job, now);
            continue;
        };

        let result = engine.process().await;
        match result.state {
            RunState::Completed => {
                completed += 1;
                tracing::info!(
                    tenant = %tenant,
                    trashed = result.trashed,
                    notices_sent = result.notices_sent,
                    purged = result.purged,
                    "Lifecycle run complete"
                );
            }
            RunState::Skipped => {
                tracing::debug!(tenant = %tenant, "Lifecycle run skipped, lock held");
            }
        }
        scheduler.advance_daily(&tenant, &job, now);
    }

    completed
}

/// Drive registered tenants' lifecycle runs until the task is cancelled.
///
/// The registrar must have scheduled the job before this loop starts;
/// entries registered later are picked up on the next poll.
pub async fn start_lifetime_worker(
    engines: HashMap<TenantId, Arc<TransitionEngine>>,
    scheduler: Arc<InMemoryScheduler>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
) {
    tracing::info!(
        tenants = engines.len(),
        poll_interval_secs = poll_interval.as_secs(),
        "Starting lifecycle worker"
    );

    loop {
        run_due_tenants(&engines, &scheduler, &clock).await;
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::{
        clock::ManualClock,
        models::{ItemStatus, LIFETIME_META_KEY},
        notify::RecordingNotifier,
        schedule::{Registrar, Scheduler},
        store::{ContentStore, MemoryAuthors, MemoryOptions, MemoryStore},
    };

    struct Tenant {
        store: Arc<MemoryStore>,
        engine: Arc<TransitionEngine>,
    }

    fn tenant(clock: &Arc<ManualClock>) -> Tenant {
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let engine = Arc::new(TransitionEngine::new(
            store.clone(),
            Arc::new(MemoryOptions::new()),
            Arc::new(MemoryAuthors::new()),
            Arc::new(RecordingNotifier::new()),
            clock.clone(),
        ));
        Tenant { store, engine }
    }

    #[tokio::test]
    async fn due_tenants_run_and_are_rescheduled() {
        let clock = Arc::new(ManualClock::new("2026-08-05T12:00:00Z".parse().unwrap()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let alpha = tenant(&clock);
        let beta = tenant(&clock);
        let expired = alpha.store.insert("expired", 1, ItemStatus::Published);
        alpha
            .store
            .set_metadata(expired, LIFETIME_META_KEY, "2026-08-01")
            .await
            .unwrap();

        let scheduler = Arc::new(InMemoryScheduler::new(vec![
            TenantId::from("alpha"),
            TenantId::from("beta"),
        ]));
        Registrar::new(scheduler.clone(), dyn_clock.clone())
            .schedule()
            .await
            .unwrap();

        let engines = HashMap::from([
            (TenantId::from("alpha"), alpha.engine.clone()),
            (TenantId::from("beta"), beta.engine.clone()),
        ]);

        let completed = run_due_tenants(&engines, &scheduler, &dyn_clock).await;
        assert_eq!(completed, 2);
        assert_eq!(
            alpha.store.get(expired).unwrap().status,
            ItemStatus::Trashed
        );

        // Nothing due until a day passes.
        assert_eq!(run_due_tenants(&engines, &scheduler, &dyn_clock).await, 0);

        clock.advance(ChronoDuration::days(1));
        assert_eq!(run_due_tenants(&engines, &scheduler, &dyn_clock).await, 2);
    }

    #[tokio::test]
    async fn unscheduled_tenants_never_fire() {
        let clock = Arc::new(ManualClock::new("2026-08-05T12:00:00Z".parse().unwrap()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let alpha = tenant(&clock);
        let scheduler = Arc::new(InMemoryScheduler::new(vec![TenantId::from("alpha")]));
        let engines = HashMap::from([(TenantId::from("alpha"), alpha.engine.clone())]);

        assert_eq!(run_due_tenants(&engines, &scheduler, &dyn_clock).await, 0);

        let registrar = Registrar::new(scheduler.clone(), dyn_clock.clone());
        registrar.schedule().await.unwrap();
        registrar.unschedule().await.unwrap();
        assert_eq!(run_due_tenants(&engines, &scheduler, &dyn_clock).await, 0);
        assert!(
            scheduler
                .next_scheduled(&TenantId::from("alpha"), JOB_NAME)
                .await
                .unwrap()
                .is_none()
        );
    }
}
