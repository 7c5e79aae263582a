//! Scheduled lifecycle transitions for content items.
//!
//! Items may carry an expiration date under the `pl_post_lifetime`
//! metadata key (`YYYY-MM-DD`). Once a day, per tenant, a lock-gated job
//! moves expired items to the trash and notifies their authors, then
//! permanently deletes trashed items older than the configured retention
//! period.
//!
//! ```text
//! ┌───────────┐     ┌──────────────────┐     ┌──────────────────────────┐
//! │ Registrar │────>│ lifecycle worker │────>│ TransitionEngine         │
//! │ (daily)   │     │ (due tenants)    │     │ lock → trash+notify →    │
//! └───────────┘     └──────────────────┘     │ purge → release          │
//!                                            └──────────────────────────┘
//! ```
//!
//! External collaborators (the content store, the option store, the
//! author directory, the notification transport, the scheduler) are
//! traits in [`store`], [`notify`], and [`schedule`], constructor-injected
//! into the engine. In-memory implementations back the tests; a SQLite
//! backend ships behind the `database-sqlite` feature.

pub mod admin;
pub mod clock;
pub mod config;
pub mod engine;
pub mod lock;
pub mod models;
pub mod notify;
#[cfg(feature = "cli")]
pub mod observability;
pub mod query;
pub mod schedule;
pub mod store;
