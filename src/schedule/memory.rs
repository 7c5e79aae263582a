use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::{ScheduleResult, Scheduler, TenantId};

/// In-process scheduler: a table of (tenant, job) → next fire time.
///
/// The worker loop polls [`due`](Self::due) and advances fired entries by
/// one day.
pub struct InMemoryScheduler {
    tenants: Vec<TenantId>,
    entries: DashMap<(TenantId, String), DateTime<Utc>>,
}

impl InMemoryScheduler {
    pub fn new(tenants: Vec<TenantId>) -> Self {
        Self {
            tenants,
            entries: DashMap::new(),
        }
    }

    pub fn single_tenant() -> Self {
        Self::new(vec![TenantId::from("default")])
    }

    /// Entries whose fire time has arrived.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<(TenantId, String)> {
        self.entries
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Push a fired entry's next invocation one day forward. An entry that
    /// fell several days behind resumes from now rather than replaying the
    /// backlog.
    pub fn advance_daily(&self, tenant: &TenantId, job: &str, now: DateTime<Utc>) {
        if let Some(mut entry) = self.entries.get_mut(&(tenant.clone(), job.to_string())) {
            let next = *entry + Duration::days(1);
            *entry = if next <= now {
                now + Duration::days(1)
            } else {
                next
            };
        }
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn tenants(&self) -> ScheduleResult<Vec<TenantId>> {
        Ok(self.tenants.clone())
    }

    async fn next_scheduled(
        &self,
        tenant: &TenantId,
        job: &str,
    ) -> ScheduleResult<Option<DateTime<Utc>>> {
        Ok(self
            .entries
            .get(&(tenant.clone(), job.to_string()))
            .map(|entry| *entry))
    }

    async fn register_daily(
        &self,
        tenant: &TenantId,
        job: &str,
        first_run: DateTime<Utc>,
    ) -> ScheduleResult<()> {
        self.entries
            .insert((tenant.clone(), job.to_string()), first_run);
        Ok(())
    }

    async fn unregister(&self, tenant: &TenantId, job: &str) -> ScheduleResult<()> {
        self.entries.remove(&(tenant.clone(), job.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-08-05T12:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn register_due_advance_cycle() {
        let scheduler = InMemoryScheduler::single_tenant();
        let tenant = TenantId::from("default");

        assert!(scheduler.due(now()).is_empty());

        scheduler
            .register_daily(&tenant, "posts_lifetime", now())
            .await
            .unwrap();
        assert_eq!(scheduler.due(now()).len(), 1);

        scheduler.advance_daily(&tenant, "posts_lifetime", now());
        assert!(scheduler.due(now()).is_empty());
        assert_eq!(
            scheduler
                .next_scheduled(&tenant, "posts_lifetime")
                .await
                .unwrap(),
            Some(now() + Duration::days(1))
        );
    }

    #[tokio::test]
    async fn advance_skips_backlog() {
        let scheduler = InMemoryScheduler::single_tenant();
        let tenant = TenantId::from("default");

        let three_days_ago = now() - Duration::days(3);
        scheduler
            .register_daily(&tenant, "posts_lifetime", three_days_ago)
            .await
            .unwrap();

        scheduler.advance_daily(&tenant, "posts_lifetime", now());
        assert_eq!(
            scheduler
                .next_scheduled(&tenant, "posts_lifetime")
                .await
                .unwrap(),
            Some(now() + Duration::days(1))
        );
    }

    #[tokio::test]
    async fn unregister_removes_entry() {
        let scheduler = InMemoryScheduler::single_tenant();
        let tenant = TenantId::from("default");

        scheduler
            .register_daily(&tenant, "posts_lifetime", now())
            .await
            .unwrap();
        scheduler.unregister(&tenant, "posts_lifetime").await.unwrap();
        assert!(scheduler.due(now()).is_empty());
    }
}
