use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::time::Instant;

/// Source of wall-clock time and timers for the whole application. Intake bookkeeping reads
/// [Clock::time], the reminder loop paces itself with [Clock::sleep_until], and tests swap in a
/// clock they control.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);

    /// Calendar day as seen by the user. Daily intake resets on this boundary.
    fn calendar_day(&self, time: DateTime<Utc>) -> NaiveDate {
        time.with_timezone(&Local).date_naive()
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeDelta, TimeZone, Utc};

    use super::{Clock, DefaultClock};

    #[test]
    fn test_default_calendar_day_is_local() {
        let instants = [
            Utc.with_ymd_and_hms(2018, 7, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 7, 3, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2018, 12, 31, 12, 0, 0).unwrap(),
        ];
        for instant in instants {
            assert_eq!(
                DefaultClock.calendar_day(instant),
                instant.with_timezone(&Local).date_naive()
            );
        }
    }

    #[test]
    fn test_default_calendar_day_changes_at_local_midnight() {
        let day = NaiveDate::from_ymd_opt(2018, 7, 5).unwrap();
        let midnight = Local
            .from_local_datetime(&day.and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(DefaultClock.calendar_day(midnight), day);
        assert_eq!(
            DefaultClock.calendar_day(midnight - TimeDelta::seconds(1)),
            day.pred_opt().unwrap()
        );
    }
}

#[cfg(test)]
pub mod manual {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Clock whose wall time only moves when a test says so. Calendar days are taken in UTC so
    /// results don't depend on the machine running the tests. Timers still go through tokio, so
    /// `start_paused` tests keep full control over them.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(now)),
            }
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap() = now;
        }

        pub fn advance(&self, delta: TimeDelta) {
            *self.now.lock().unwrap() += delta;
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }

        fn calendar_day(&self, time: DateTime<Utc>) -> NaiveDate {
            time.date_naive()
        }
    }
}
