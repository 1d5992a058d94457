use time::{Date, Duration, OffsetDateTime};

/// Wall-clock date the borrowing rules compare against.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn tomorrow() -> Date {
    today() + Duration::days(1)
}
