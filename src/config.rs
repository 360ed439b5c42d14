use chrono::FixedOffset;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    /// Single organization-wide UTC offset, used when formatting report
    /// headers and export filenames. Stored dates stay timezone-naive.
    pub org_tz_offset: FixedOffset,

    /// Upper bound on `employees × days` a computed view may materialize.
    pub max_report_cells: usize,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_export_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_ACCESS_SECRET").expect("JWT_ACCESS_SECRET must be set"),

            org_tz_offset: parse_org_offset(
                &env::var("ORG_TZ_OFFSET").unwrap_or_else(|_| "+00:00".to_string()),
            ),

            max_report_cells: env::var("ATTENDANCE_MAX_CELLS")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()
                .unwrap(),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),
            rate_export_per_min: env::var("RATE_EXPORT_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}

/// Parses offsets in the `+05:00` / `-03:30` form.
fn parse_org_offset(raw: &str) -> FixedOffset {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut parts = rest.splitn(2, ':');
    let hours: i32 = parts
        .next()
        .unwrap_or("0")
        .parse()
        .expect("ORG_TZ_OFFSET hours must be numeric");
    let minutes: i32 = parts
        .next()
        .unwrap_or("0")
        .parse()
        .expect("ORG_TZ_OFFSET minutes must be numeric");
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .expect("ORG_TZ_OFFSET out of range")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_offset() {
        assert_eq!(parse_org_offset("+05:00").local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn parses_negative_offset_with_minutes() {
        assert_eq!(
            parse_org_offset("-03:30").local_minus_utc(),
            -(3 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn bare_hours_are_accepted() {
        assert_eq!(parse_org_offset("+06").local_minus_utc(), 6 * 3600);
    }
}
