//! Quiet hours for proactive actions.
//!
//! Outside the active window only `High` and `Urgent` intents get through.

use anima_core::config::PresenceConfig;
use anima_core::{BehaviorIntent, Priority};
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveTime, Offset, Utc, Weekday};

#[derive(Debug, Clone)]
pub struct PresenceFilter {
    /// Start of active hours (e.g., 08:00)
    pub active_start: NaiveTime,
    /// End of active hours (e.g., 23:00)
    pub active_end: NaiveTime,
    pub active_days: Vec<Weekday>,
    offset: FixedOffset,
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h.min(23), 0, 0).unwrap_or(NaiveTime::MIN)
}

impl PresenceFilter {
    /// Active between `start_hour` and `end_hour` in the given timezone.
    pub fn new(start_hour: u32, end_hour: u32, offset: FixedOffset) -> Self {
        Self {
            active_start: hour(start_hour),
            active_end: hour(end_hour),
            active_days: ALL_DAYS.to_vec(),
            offset,
        }
    }

    /// Uses the machine's current UTC offset.
    pub fn from_config(config: &PresenceConfig) -> Self {
        let offset = Local::now().offset().fix();
        Self::new(config.active_start_hour, config.active_end_hour, offset)
    }

    /// Never quiet.
    pub fn always() -> Self {
        Self {
            active_start: NaiveTime::MIN,
            active_end: NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN),
            active_days: ALL_DAYS.to_vec(),
            offset: Utc.fix(),
        }
    }

    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.offset);
        if !self.active_days.contains(&local.weekday()) {
            return false;
        }
        let t = local.time();
        // Handles overnight ranges like 22:00-06:00
        if self.active_start <= self.active_end {
            t >= self.active_start && t <= self.active_end
        } else {
            t >= self.active_start || t <= self.active_end
        }
    }

    pub fn admits(&self, priority: Priority, at: DateTime<Utc>) -> bool {
        priority >= Priority::High || self.is_active_at(at)
    }

    pub fn filter(&self, intents: Vec<BehaviorIntent>, at: DateTime<Utc>) -> Vec<BehaviorIntent> {
        intents
            .into_iter()
            .filter(|intent| {
                let ok = self.admits(intent.priority, at);
                if !ok {
                    tracing::debug!("Quiet hours: holding back {}", intent.kind);
                }
                ok
            })
            .collect()
    }
}

impl Default for PresenceFilter {
    fn default() -> Self {
        Self::from_config(&PresenceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::IntentKind;
    use chrono::TimeZone;

    fn utc(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, 30, 0).unwrap()
    }

    fn filter(start: u32, end: u32) -> PresenceFilter {
        PresenceFilter::new(start, end, FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn test_custom_hours() {
        let f = filter(9, 21);
        assert_eq!(f.active_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(f.active_end, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(f.active_days.len(), 7);
    }

    #[test]
    fn test_day_window() {
        let f = filter(8, 23);
        assert!(f.is_active_at(utc(12)));
        assert!(!f.is_active_at(utc(3)));
    }

    #[test]
    fn test_overnight_window() {
        let f = filter(22, 6);
        assert!(f.is_active_at(utc(2)));
        assert!(!f.is_active_at(utc(12)));
    }

    #[test]
    fn test_offset_is_applied() {
        // 03:30 UTC is 11:30 at UTC+8
        let f = PresenceFilter::new(8, 23, FixedOffset::east_opt(8 * 3600).unwrap());
        assert!(f.is_active_at(utc(3)));
    }

    #[test]
    fn test_quiet_hours_keep_urgent_only() {
        let f = filter(8, 23);
        let intents = vec![
            BehaviorIntent::new(IntentKind::FocusSupport, Priority::Low, ""),
            BehaviorIntent::new(IntentKind::SleepReminder, Priority::High, ""),
            BehaviorIntent::new(IntentKind::BatteryWarning, Priority::Urgent, ""),
        ];
        let kept = f.filter(intents, utc(3));
        let kinds: Vec<_> = kept.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IntentKind::SleepReminder, IntentKind::BatteryWarning]);
    }

    #[test]
    fn test_always_admits_everything() {
        let f = PresenceFilter::always();
        for h in 0..24 {
            assert!(f.admits(Priority::Low, utc(h)));
        }
        let last_instant = Utc.with_ymd_and_hms(2024, 3, 4, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        assert!(f.is_active_at(last_instant));
    }
}
