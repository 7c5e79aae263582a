//! Daily scheduling of the lifecycle job.
//!
//! The host scheduler is a collaborator behind [`Scheduler`]; the
//! [`Registrar`] registers or cancels the daily job per tenant, and the
//! worker loop in this module drives due tenants in-process.

mod memory;
mod worker;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use memory::InMemoryScheduler;
use serde::{Deserialize, Serialize};
use thiserror::Error;
pub use worker::{run_due_tenants, start_lifetime_worker};

use crate::{clock::Clock, engine::JOB_NAME};

/// An independently configured logical site within a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Scheduler error: {0}")]
    Internal(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Time-based scheduler consumed by the registrar.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// All tenants this scheduler covers.
    async fn tenants(&self) -> ScheduleResult<Vec<TenantId>>;

    /// Next registered invocation of `job` for `tenant`, if any.
    async fn next_scheduled(
        &self,
        tenant: &TenantId,
        job: &str,
    ) -> ScheduleResult<Option<DateTime<Utc>>>;

    /// Register `job` to fire once daily starting at `first_run`.
    async fn register_daily(
        &self,
        tenant: &TenantId,
        job: &str,
        first_run: DateTime<Utc>,
    ) -> ScheduleResult<()>;

    /// Cancel a registered invocation. Cancelling an unregistered job is
    /// not an error.
    async fn unregister(&self, tenant: &TenantId, job: &str) -> ScheduleResult<()>;
}

/// Registers and removes the daily lifecycle job across tenants.
pub struct Registrar {
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
}

impl Registrar {
    pub fn new(scheduler: Arc<dyn Scheduler>, clock: Arc<dyn Clock>) -> Self {
        Self { scheduler, clock }
    }

    /// Register the daily job for every tenant that does not already have
    /// an invocation scheduled. Safe to call on every activation.
    pub async fn schedule(&self) -> ScheduleResult<()> {
        for tenant in self.scheduler.tenants().await? {
            if self
                .scheduler
                .next_scheduled(&tenant, JOB_NAME)
                .await?
                .is_none()
            {
                self.scheduler
                    .register_daily(&tenant, JOB_NAME, self.clock.now_utc())
                    .await?;
                tracing::info!(tenant = %tenant, "Registered daily lifecycle job");
            }
        }
        Ok(())
    }

    /// Cancel the daily job for every tenant that has one registered. Safe
    /// to call on every deactivation.
    pub async fn unschedule(&self) -> ScheduleResult<()> {
        for tenant in self.scheduler.tenants().await? {
            if self
                .scheduler
                .next_scheduled(&tenant, JOB_NAME)
                .await?
                .is_some()
            {
                self.scheduler.unregister(&tenant, JOB_NAME).await?;
                tracing::info!(tenant = %tenant, "Unregistered daily lifecycle job");
            }
        }
        Ok(())
    }
}
