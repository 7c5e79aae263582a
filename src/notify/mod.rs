//! Stakeholder notification for lifecycle transitions.
//!
//! The transport is a collaborator behind [`Notifier`]; this module owns
//! only message composition and two built-in implementations: a logging
//! notifier for deployments without a transport, and a recording notifier
//! for tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Returns false when delivery failed; callers
    /// treat that as non-fatal.
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Subject and body for the "your item was moved to trash" notice.
pub fn trash_notice(title: &str, retention_days: u32, edit_link: &str) -> (String, String) {
    let subject = format!("Your post \"{}\" has been moved to trash", title);
    let body = format!(
        "Hello,\n\n\
         Your post titled \"{}\" has been automatically moved to trash because \
         its lifetime expired. It will be permanently deleted in {} days.\n\n\
         You can review and edit your post here: {}\n\n\
         Regards,\nYour Site Team",
        title, retention_days, edit_link
    );
    (subject, body)
}

/// Notifier that logs each notice instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> bool {
        tracing::info!(to = to, subject = subject, "Trash notice (no transport configured)");
        true
    }
}

/// One message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotice {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Test notifier that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotice>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotice> {
        self.sent.lock().clone()
    }

    /// Make every subsequent `send` report failure. Messages are still
    /// recorded so tests can assert the attempt.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        self.sent.lock().push(SentNotice {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        !self.failing.load(Ordering::SeqCst)
    }
}
