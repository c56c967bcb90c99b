use chrono::{Datelike, Utc};
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-process daily call budget for one provider, reset at UTC midnight.
///
/// The counter is advanced with a compare-exchange loop so concurrent
/// callers can never overspend the limit: either a slot is reserved for the
/// caller or the acquire fails.
pub struct DailyQuota {
    limit: u32,
    used: AtomicU32,
    day: AtomicU32,
}

fn today_ordinal() -> u32 {
    let now = Utc::now().date_naive();
    now.year() as u32 * 1000 + now.ordinal()
}

impl DailyQuota {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
            day: AtomicU32::new(today_ordinal()),
        }
    }

    /// Reset the counter when the UTC day has rolled over.
    fn roll_day(&self) {
        let today = today_ordinal();
        let stored = self.day.load(Ordering::Acquire);
        if stored != today
            && self
                .day
                .compare_exchange(stored, today, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.used.store(0, Ordering::Release);
        }
    }

    /// Reserve one call against today's budget. Returns false when the
    /// budget is spent; the caller must not hit the network in that case.
    pub fn try_acquire(&self) -> bool {
        self.roll_day();
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                if used < self.limit {
                    Some(used + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    pub fn remaining(&self) -> u32 {
        self.roll_day();
        self.limit.saturating_sub(self.used.load(Ordering::Acquire))
    }

    pub fn exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_acquire_until_exhausted() {
        let quota = DailyQuota::new(3);
        assert!(quota.try_acquire());
        assert!(quota.try_acquire());
        assert!(quota.try_acquire());
        assert!(!quota.try_acquire());
        assert!(quota.exhausted());
        assert_eq!(quota.remaining(), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let quota = DailyQuota::new(5);
        assert_eq!(quota.remaining(), 5);
        quota.try_acquire();
        quota.try_acquire();
        assert_eq!(quota.remaining(), 3);
    }

    #[test]
    fn test_concurrent_acquire_never_overspends() {
        let quota = Arc::new(DailyQuota::new(100));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let q = Arc::clone(&quota);
            handles.push(std::thread::spawn(move || {
                let mut granted = 0u32;
                for _ in 0..50 {
                    if q.try_acquire() {
                        granted += 1;
                    }
                }
                granted
            }));
        }
        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
        assert!(quota.exhausted());
    }
}
