//! Batch completion notices.
//!
//! One process-wide [`NoticeCenter`] is created at wiring time and shared by
//! every component that runs batches, so completion banners show up no
//! matter which view triggered the work. Notices expire on their own after
//! a fixed duration; reads past the deadline see nothing.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Severity class of a completion notice. An all-failed batch is still
/// `Partial`, never `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Partial,
}

#[derive(Debug, Clone)]
pub struct BatchNotice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    expires_at: Instant,
}

impl BatchNotice {
    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Holder of the current (at most one) completion notice.
pub struct NoticeCenter {
    ttl: Duration,
    current: Mutex<Option<BatchNotice>>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Mutex::new(None),
        }
    }

    /// Publish the completion summary for a finished batch.
    pub fn publish_completion(&self, succeeded: usize, failed: usize) {
        let notice = if failed == 0 {
            BatchNotice {
                kind: NoticeKind::Success,
                title: "Batch complete".to_string(),
                message: format!(
                    "{} {} completed successfully.",
                    succeeded,
                    pluralize(succeeded)
                ),
                expires_at: Instant::now() + self.ttl,
            }
        } else if succeeded == 0 {
            BatchNotice {
                kind: NoticeKind::Partial,
                title: "Batch failed".to_string(),
                message: format!("{} {} failed.", failed, pluralize(failed)),
                expires_at: Instant::now() + self.ttl,
            }
        } else {
            BatchNotice {
                kind: NoticeKind::Partial,
                title: "Batch partially complete".to_string(),
                message: format!("{} succeeded, {} failed.", succeeded, failed),
                expires_at: Instant::now() + self.ttl,
            }
        };

        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(notice);
    }

    /// The current notice, if one is live. Expired notices are dropped.
    pub fn current(&self) -> Option<BatchNotice> {
        let mut slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|n| n.expired()) {
            *slot = None;
        }
        slot.clone()
    }

    pub fn dismiss(&self) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Default for NoticeCenter {
    fn default() -> Self {
        Self::new()
    }
}

fn pluralize(count: usize) -> &'static str {
    if count == 1 {
        "operation"
    } else {
        "operations"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_success_is_success() {
        let center = NoticeCenter::new();
        center.publish_completion(3, 0);

        let notice = center.current().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "3 operations completed successfully.");
    }

    #[test]
    fn test_single_success_singular_message() {
        let center = NoticeCenter::new();
        center.publish_completion(1, 0);

        let notice = center.current().unwrap();
        assert_eq!(notice.message, "1 operation completed successfully.");
    }

    #[test]
    fn test_mixed_outcome_is_partial() {
        let center = NoticeCenter::new();
        center.publish_completion(2, 1);

        let notice = center.current().unwrap();
        assert_eq!(notice.kind, NoticeKind::Partial);
        assert_eq!(notice.message, "2 succeeded, 1 failed.");
    }

    #[test]
    fn test_all_failed_is_partial_not_success() {
        let center = NoticeCenter::new();
        center.publish_completion(0, 3);

        let notice = center.current().unwrap();
        assert_eq!(notice.kind, NoticeKind::Partial);
        assert_eq!(notice.title, "Batch failed");
        assert_eq!(notice.message, "3 operations failed.");
    }

    #[test]
    fn test_notice_expires() {
        let center = NoticeCenter::with_ttl(Duration::from_millis(1));
        center.publish_completion(2, 0);

        std::thread::sleep(Duration::from_millis(5));
        assert!(center.current().is_none());
    }

    #[test]
    fn test_dismiss() {
        let center = NoticeCenter::new();
        center.publish_completion(2, 0);
        center.dismiss();
        assert!(center.current().is_none());
    }

    #[test]
    fn test_new_notice_replaces_previous() {
        let center = NoticeCenter::new();
        center.publish_completion(2, 0);
        center.publish_completion(0, 1);

        let notice = center.current().unwrap();
        assert_eq!(notice.kind, NoticeKind::Partial);
    }
}
