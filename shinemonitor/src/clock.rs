use chrono::{DateTime, Local, NaiveDate};

/// Source of the wall-clock time used for salts and report dates.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Millisecond timestamp used as the per-login salt.
pub fn salt(now: &DateTime<Local>) -> String {
    now.timestamp_millis().to_string()
}

/// The vendor reports are always requested for the previous calendar day.
pub fn report_date(today: NaiveDate) -> String {
    today
        .pred_opt()
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}
