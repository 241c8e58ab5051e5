//! Clock and identifier source for lettrage codes

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Supplies the current time and fresh lettrage codes
pub trait ReconciliationClock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// A code no other reconciliation group uses
    fn next_code(&self) -> String;
}

/// Wall clock with codes made of a timestamp and a random suffix,
/// e.g. `LET20240301143005-9F2C41AB`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ReconciliationClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    fn next_code(&self) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "LET{}-{}",
            self.now().format("%Y%m%d%H%M%S"),
            suffix[..8].to_uppercase()
        )
    }
}

/// Frozen clock handing out sequential codes, for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: NaiveDateTime,
    counter: AtomicUsize,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            counter: AtomicUsize::new(0),
        }
    }
}

impl ReconciliationClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn next_code(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("LET{:06}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_codes_are_unique() {
        let clock = SystemClock;
        let a = clock.next_code();
        let b = clock.next_code();
        assert!(a.starts_with("LET"));
        assert_eq!(a.len(), "LET20240301143005-9F2C41AB".len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_clock_sequence() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let clock = FixedClock::new(now);
        assert_eq!(clock.now(), now);
        assert_eq!(clock.next_code(), "LET000001");
        assert_eq!(clock.next_code(), "LET000002");
    }
}
