use chrono::{DateTime, Local, NaiveDate, Utc};

/// Get current Unix timestamp
pub fn get_current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Format duration in seconds to human readable string
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else {
        format!("{} days", seconds / 86400)
    }
}

/// Render a server timestamp in the local zone
pub fn utc_to_local(time: &DateTime<Utc>) -> String {
    let local_time: DateTime<Local> = DateTime::from(*time);
    local_time.format("%Y-%m-%d %H:%M %Z").to_string()
}

pub fn format_due(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(30), "30 seconds");
        assert_eq!(format_duration(90), "1 minutes");
        assert_eq!(format_duration(3600), "1 hours");
        assert_eq!(format_duration(86400), "1 days");
        assert_eq!(format_duration(-5), "0 seconds");
    }

    #[test]
    fn test_utc_to_local() {
        let time = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let local_time = utc_to_local(&time);
        assert!(local_time.starts_with("2026-10-1"));
        assert!(local_time.contains(':'));
    }

    #[test]
    fn test_dates() {
        let date = parse_date("2026-10-20").unwrap();
        assert_eq!(format_due(Some(date)), "2026-10-20");
        assert_eq!(format_due(None), "-");
        assert!(parse_date("20/10/2026").is_err());
    }
}
