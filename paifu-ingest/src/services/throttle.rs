//! Per-player fetch throttle
//!
//! Bulk record fetches hit a scarce provider endpoint, so each player may
//! only be re-checked after a cooldown. The gate is a pure decision over a
//! passed-in timestamp: it never touches the store itself. The caller reads
//! the player's `last_checked_at`, asks the gate, and persists the refreshed
//! timestamp inside its own unit of work so that check and update cannot be
//! split across transactions.

use chrono::{DateTime, Duration, Utc};

/// Cooldown gate for bulk record checks
#[derive(Debug, Clone, Copy)]
pub struct ThrottleGate {
    cooldown: Duration,
}

impl ThrottleGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn from_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    /// True when a check is allowed at `now`
    ///
    /// A player that has never been checked is always allowed.
    pub fn allow(&self, last_checked: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_checked {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Earliest instant at which the next check will pass the gate
    pub fn retry_at(&self, last_checked: DateTime<Utc>) -> DateTime<Utc> {
        last_checked + self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_checked_is_allowed() {
        let gate = ThrottleGate::from_hours(24);
        assert!(gate.allow(None, Utc::now()));
    }

    #[test]
    fn test_within_cooldown_is_denied() {
        let gate = ThrottleGate::from_hours(24);
        let now = Utc::now();
        assert!(!gate.allow(Some(now - Duration::hours(2)), now));
        assert!(!gate.allow(Some(now - Duration::hours(23)), now));
    }

    #[test]
    fn test_after_cooldown_is_allowed() {
        let gate = ThrottleGate::from_hours(24);
        let now = Utc::now();
        assert!(gate.allow(Some(now - Duration::hours(24)), now));
        assert!(gate.allow(Some(now - Duration::hours(25)), now));
    }

    #[test]
    fn test_retry_at_is_last_check_plus_cooldown() {
        let gate = ThrottleGate::from_hours(6);
        let last = Utc::now();
        assert_eq!(gate.retry_at(last), last + Duration::hours(6));
    }
}
