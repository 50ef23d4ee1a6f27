use chrono::{DateTime, Duration, Utc};

pub fn time_now() -> DateTime<Utc> {
    Utc::now()
}

pub fn time_now_plus_hours(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
