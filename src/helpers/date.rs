//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;
use crate::error::{BlogError, Result};

/// Parse a publication timestamp as sent by the content source
///
/// Accepts RFC 3339 (`2021-03-01T00:00:00Z`), the offset-without-colon form
/// Prismic emits (`2021-03-25T19:25:28+0000`) and bare dates (`2021-03-01`,
/// read as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(date);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).fixed_offset())
}

/// Formats publication dates for display
///
/// Every listing and post page goes through one formatter, so the same
/// timestamp always renders the same way within a build.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    pattern: String,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::pt_BR,
            timezone: Tz::UTC,
            pattern: "%d %b %Y".to_string(),
        }
    }
}

impl DateFormatter {
    /// Create a formatter from a locale name (`pt_BR`), an IANA timezone
    /// and a date-fns style pattern (`dd MMM yyyy`)
    pub fn new(locale: &str, timezone: &str, format: &str) -> Result<Self> {
        let locale = Locale::try_from(locale.replace('-', "_").as_str())
            .map_err(|_| BlogError::Config(format!("Unknown locale: {}", locale)))?;
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| BlogError::Config(format!("Unknown timezone: {}", timezone)))?;

        Ok(Self {
            locale,
            timezone,
            pattern: date_fns_to_chrono_format(format),
        })
    }

    /// Create a formatter from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(&config.locale, &config.timezone, &config.date_format)
    }

    /// Format a parsed date
    pub fn format<Tz2: TimeZone>(&self, date: &DateTime<Tz2>) -> String {
        date.with_timezone(&self.timezone)
            .format_localized(&self.pattern, self.locale)
            .to_string()
    }

    /// Parse and format a raw timestamp
    pub fn format_timestamp(&self, value: &str) -> Result<String> {
        let date = parse_timestamp(value)
            .ok_or_else(|| BlogError::MalformedResponse(format!("Invalid timestamp: {}", value)))?;
        Ok(self.format(&date))
    }
}

/// Convert a date-fns format string to a chrono format string
fn date_fns_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each field
    let replacements = [
        // Year
        ("yyyy", "%Y"),
        ("yy", "%y"),
        // Month (uppercase M)
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("dd", "%d"),
        // Day of week
        ("EEEE", "%A"),
        ("EEE", "%a"),
        // Hour
        ("HH", "%H"),
        // Minute (after MM is gone)
        ("mm", "%M"),
        // Second
        ("ss", "%S"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let utc = parse_timestamp("2021-03-01T00:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2021-03-01T00:00:00+00:00");

        let prismic = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(prismic.to_rfc3339(), "2021-03-25T19:25:28+00:00");

        let bare = parse_timestamp("2021-03-01").unwrap();
        assert_eq!(bare.to_rfc3339(), "2021-03-01T00:00:00+00:00");

        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_format_pt_br() {
        let formatter = DateFormatter::default();
        assert_eq!(
            formatter.format_timestamp("2021-03-01T00:00:00Z").unwrap(),
            "01 mar 2021"
        );
        assert_eq!(
            formatter.format_timestamp("2022-05-20T14:00:00Z").unwrap(),
            "20 mai 2022"
        );
    }

    #[test]
    fn test_format_has_no_locale_artifacts() {
        let formatter = DateFormatter::default();
        for month in 1..=12 {
            let value = format!("2021-{:02}-15T12:00:00Z", month);
            let formatted = formatter.format_timestamp(&value).unwrap();
            assert!(!formatted.contains("de "), "{}", formatted);
            assert!(!formatted.contains('.'), "{}", formatted);
        }
    }

    #[test]
    fn test_format_from_config() {
        let config = SiteConfig::default();
        let formatter = DateFormatter::from_config(&config).unwrap();
        assert_eq!(
            formatter.format_timestamp("2021-03-25T19:25:28+0000").unwrap(),
            "25 mar 2021"
        );
    }

    #[test]
    fn test_format_in_timezone() {
        let formatter = DateFormatter::new("pt_BR", "America/Sao_Paulo", "dd MMM yyyy").unwrap();
        assert_eq!(
            formatter.format_timestamp("2021-03-01T00:00:00Z").unwrap(),
            "28 fev 2021"
        );
    }

    #[test]
    fn test_unknown_locale_and_timezone() {
        assert!(matches!(
            DateFormatter::new("xx_YY", "UTC", "dd MMM yyyy"),
            Err(BlogError::Config(_))
        ));
        assert!(matches!(
            DateFormatter::new("pt_BR", "Mars/Olympus", "dd MMM yyyy"),
            Err(BlogError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_timestamp_is_malformed() {
        let formatter = DateFormatter::default();
        assert!(matches!(
            formatter.format_timestamp("yesterday"),
            Err(BlogError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_date_fns_to_chrono() {
        assert_eq!(date_fns_to_chrono_format("dd MMM yyyy"), "%d %b %Y");
        assert_eq!(date_fns_to_chrono_format("yyyy-MM-dd HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(date_fns_to_chrono_format("EEEE, dd MMMM"), "%A, %d %B");
    }
}
