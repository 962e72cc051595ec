use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Wire format for appointment date-times, e.g. `03/07/2026 12:00`.
pub const APPOINTMENT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Wire format for date-only query parameters, e.g. `2026-07-03`.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Highest page whose offset still fits in an `i64` at the largest limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

/// Helper function to parse an appointment date-time
///
/// This function takes a string in the exact `DD/MM/YYYY HH:MM` format and
/// interprets it as a UTC instant. Every field must be zero-padded and
/// surrounding whitespace is not accepted.
///
/// # Arguments
///
/// * `raw` - The date-time string as received from the client
///
/// # Returns
///
/// The parsed instant, or `None` if the string does not match the format
pub fn parse_appointment_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, APPOINTMENT_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
        .filter(|date| format_appointment_date(*date) == raw)
}

/// Helper function to format an appointment date-time back into its wire format
pub fn format_appointment_date(date: DateTime<Utc>) -> String {
    date.format(APPOINTMENT_DATE_FORMAT).to_string()
}

/// Helper function to parse a `YYYY-MM-DD` query date
pub fn parse_query_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, QUERY_DATE_FORMAT).ok()
}

/// Half-open UTC range `[start_of_day, start_of_day + 24h)` covering `date`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::hours(24))
}

/// Page window for list queries.
///
/// Out-of-range values are clamped rather than rejected: a page below 1
/// becomes 1, a page above `MAX_PAGE` becomes `MAX_PAGE`, and a limit
/// outside `[1, 100]` becomes the default of 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.clamp(1, MAX_PAGE);
        let limit = if (1..=MAX_PAGE_LIMIT).contains(&limit) {
            limit
        } else {
            DEFAULT_PAGE_LIMIT
        };
        Self { page, limit }
    }

    /// Builds a window from raw query strings. Unparseable values fall
    /// through to the same clamping as out-of-range ones.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(|p| p.trim().parse().ok()).unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        Self::new(page, limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}
