//! The scheduler-invoked transition engine.
//!
//! One invocation walks the full lifecycle pass: take the cron lock, move
//! expired items to the trash (notifying authors), permanently delete
//! trashed items past the retention window, release the lock. Nothing in
//! here propagates an error to the scheduler; every failure degrades to
//! skipping the affected unit of work.

mod transition;

pub use transition::{
    ADMIN_EMAIL_OPTION, JOB_NAME, ProcessResult, RunState, TransitionEngine,
};
