use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Spreadsheet formula-injection defense: values beginning with `=`, `+`,
/// `-` or `@` get a leading apostrophe so they import as literal text.
/// Field quoting/escaping itself is the CSV writer's job.
pub fn guard_csv_field(value: &str) -> String {
    match value.chars().next() {
        Some('=') | Some('+') | Some('-') | Some('@') => format!("'{}", value),
        _ => value.to_string(),
    }
}

/// Lowercases and squeezes a free-text filter into a filename-safe slug.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = true;
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub fn org_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Builds the attachment filename for an export: base name, the active
/// filters (range, query, flags), and a generation timestamp in the
/// organization's offset.
#[allow(clippy::too_many_arguments)]
pub fn export_filename(
    base: &str,
    ext: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    query: Option<&str>,
    include_weekends: bool,
    computed: bool,
    now: DateTime<FixedOffset>,
) -> String {
    let mut parts: Vec<String> = vec![base.to_string()];
    if let Some(from) = from {
        parts.push(from.format("%Y-%m-%d").to_string());
    }
    if let Some(to) = to {
        parts.push(to.format("%Y-%m-%d").to_string());
    }
    if let Some(q) = query {
        let slug = slugify(q);
        if !slug.is_empty() {
            parts.push(slug);
        }
    }
    if include_weekends {
        parts.push("weekends".to_string());
    }
    if computed {
        parts.push("computed".to_string());
    }
    parts.push(now.format("%Y%m%d-%H%M%S").to_string());
    format!("{}.{}", parts.join("_"), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formula_prefixes_are_neutralized() {
        assert_eq!(guard_csv_field("=SUM(A1:A9)"), "'=SUM(A1:A9)");
        assert_eq!(guard_csv_field("+8801712345678"), "'+8801712345678");
        assert_eq!(guard_csv_field("-1"), "'-1");
        assert_eq!(guard_csv_field("@mention"), "'@mention");
        assert_eq!(guard_csv_field("John Doe"), "John Doe");
        assert_eq!(guard_csv_field(""), "");
    }

    #[test]
    fn slugs_collapse_non_alphanumerics() {
        assert_eq!(slugify("John  Doe!"), "john-doe");
        assert_eq!(slugify("  EMP-001 / finance  "), "emp-001-finance");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn filename_embeds_filters_and_timestamp() {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        let name = export_filename(
            "attendance",
            "csv",
            Some("2024-03-04".parse().unwrap()),
            Some("2024-03-08".parse().unwrap()),
            Some("John Doe"),
            true,
            false,
            now,
        );
        assert_eq!(
            name,
            "attendance_2024-03-04_2024-03-08_john-doe_weekends_20240304-093000.csv"
        );
    }

    #[test]
    fn filename_skips_absent_filters() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let now = offset.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let name = export_filename("attendance", "pdf", None, None, None, false, true, now);
        assert_eq!(name, "attendance_computed_20240304-000000.pdf");
    }
}
