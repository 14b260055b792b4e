//! Exchange session calendar.
//!
//! NSE/BSE hours in IST: Monday to Friday, within the configured clock-time
//! window, both bounds inclusive. Weekends are closed regardless of clock
//! time. Exchange holidays are not modelled.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;
use common::MarketHoursConfig;

pub struct MarketHours {
    open: NaiveTime,
    close: NaiveTime,
}

impl MarketHours {
    pub fn new(config: &MarketHoursConfig) -> Result<Self> {
        let open = NaiveTime::from_hms_opt(config.open_hour, config.open_minute, 0)
            .ok_or_else(|| anyhow!("invalid market open time"))?;
        let close = NaiveTime::from_hms_opt(config.close_hour, config.close_minute, 0)
            .ok_or_else(|| anyhow!("invalid market close time"))?;
        if open >= close {
            return Err(anyhow!("market open must precede close"));
        }
        Ok(Self { open, close })
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&Kolkata);
        if is_weekend(local.weekday()) {
            return false;
        }
        let time = local.time();
        time >= self.open && time <= self.close
    }

    /// The next session start at or after `now`: today's open when we are
    /// before it on a weekday, otherwise the next weekday's open.
    pub fn next_open(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&Kolkata);

        let mut date = local.date_naive();
        if is_weekend(local.weekday()) || local.time() >= self.open {
            date += Duration::days(1);
            while is_weekend(date.weekday()) {
                date += Duration::days(1);
            }
        }

        Kolkata
            .from_local_datetime(&date.and_time(self.open))
            .single()
            .expect("IST has a fixed UTC offset")
            .with_timezone(&Utc)
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Wall-clock timestamp for notifications
pub fn now_ist() -> DateTime<Tz> {
    Utc::now().with_timezone(&Kolkata)
}

pub fn format_ist(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Kolkata)
        .format("%Y-%m-%d %H:%M:%S IST")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> MarketHours {
        MarketHours::new(&MarketHoursConfig::default()).unwrap()
    }

    fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Kolkata
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn saturday_is_closed_regardless_of_clock() {
        // 2026-08-29 is a Saturday
        assert!(!hours().is_open(ist(2026, 8, 29, 10, 0)));
        assert!(!hours().is_open(ist(2026, 8, 30, 12, 0)));
    }

    #[test]
    fn weekday_session_window_is_inclusive() {
        // 2026-08-31 is a Monday
        let hours = hours();
        assert!(hours.is_open(ist(2026, 8, 31, 9, 15)));
        assert!(hours.is_open(ist(2026, 8, 31, 12, 0)));
        assert!(hours.is_open(ist(2026, 8, 31, 15, 30)));
        assert!(!hours.is_open(ist(2026, 8, 31, 9, 14)));
        assert!(!hours.is_open(ist(2026, 8, 31, 15, 31)));
    }

    #[test]
    fn next_open_from_saturday_is_monday_morning() {
        let next = hours().next_open(ist(2026, 8, 29, 10, 0));
        assert_eq!(next, ist(2026, 8, 31, 9, 15));
    }

    #[test]
    fn next_open_before_todays_session_is_today() {
        let next = hours().next_open(ist(2026, 8, 31, 8, 0));
        assert_eq!(next, ist(2026, 8, 31, 9, 15));
    }

    #[test]
    fn next_open_after_close_is_tomorrow() {
        let next = hours().next_open(ist(2026, 8, 31, 16, 0));
        assert_eq!(next, ist(2026, 9, 1, 9, 15));
    }

    #[test]
    fn next_open_on_friday_evening_skips_the_weekend() {
        // 2026-08-28 is a Friday
        let next = hours().next_open(ist(2026, 8, 28, 18, 0));
        assert_eq!(next, ist(2026, 8, 31, 9, 15));
    }

    #[test]
    fn invalid_window_is_rejected() {
        let bad = MarketHoursConfig {
            open_hour: 16,
            open_minute: 0,
            close_hour: 9,
            close_minute: 15,
        };
        assert!(MarketHours::new(&bad).is_err());
    }
}
