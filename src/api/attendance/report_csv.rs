use super::engine::{ExceptionRecord, ResolvedDayRow};
use crate::error::ApiError;
use crate::utils::export::guard_csv_field;

const HEADER: [&str; 4] = ["employee_code", "name", "work_date", "status"];

/// Flat CSV row shared by both export modes; the business rules already ran
/// upstream, this layer only formats.
pub struct CsvRow {
    pub employee_code: String,
    pub name: String,
    pub work_date: String,
    pub status: String,
}

impl From<&ExceptionRecord> for CsvRow {
    fn from(r: &ExceptionRecord) -> Self {
        CsvRow {
            employee_code: r.employee_code.clone(),
            name: r.name.clone(),
            // Normalized to the calendar date even if the store hands back
            // a timestamp-typed column.
            work_date: r.work_date.format("%Y-%m-%d").to_string(),
            status: r.status.clone(),
        }
    }
}

impl From<&ResolvedDayRow> for CsvRow {
    fn from(r: &ResolvedDayRow) -> Self {
        CsvRow {
            employee_code: r.employee_code.clone(),
            name: r.name.clone(),
            work_date: r.work_date.format("%Y-%m-%d").to_string(),
            status: r.status.to_string(),
        }
    }
}

/// Serializes rows to CSV bytes. Quoting and escaping are the writer's job;
/// formula-injection guarding is applied per field on top. An empty input
/// still yields the header line.
pub fn write_csv(rows: &[CsvRow]) -> Result<Vec<u8>, ApiError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(HEADER).map_err(csv_internal)?;
    for row in rows {
        wtr.write_record([
            guard_csv_field(&row.employee_code),
            guard_csv_field(&row.name),
            row.work_date.clone(),
            guard_csv_field(&row.status),
        ])
        .map_err(csv_internal)?;
    }

    wtr.into_inner().map_err(|e| {
        tracing::error!(error = %e, "CSV writer flush failed");
        ApiError::Internal
    })
}

fn csv_internal(e: csv::Error) -> ApiError {
    tracing::error!(error = %e, "CSV write failed");
    ApiError::Internal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::NaiveDate;

    fn row(code: &str, name: &str, date: &str, status: &str) -> CsvRow {
        CsvRow {
            employee_code: code.to_string(),
            name: name.to_string(),
            work_date: date.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn empty_export_is_header_only() {
        let bytes = write_csv(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "employee_code,name,work_date,status\n"
        );
    }

    #[test]
    fn round_trips_through_a_csv_reader() {
        let rows = vec![
            row("EMP-001", "Doe, John", "2024-03-04", "ABSENT"),
            row("EMP-002", "A \"quoted\" name", "2024-03-05", "HALF_DAY"),
        ];
        let bytes = write_csv(&rows).unwrap();

        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let parsed: Vec<Vec<String>> = rdr
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(
            parsed,
            vec![
                vec!["EMP-001", "Doe, John", "2024-03-04", "ABSENT"],
                vec!["EMP-002", "A \"quoted\" name", "2024-03-05", "HALF_DAY"],
            ]
        );
    }

    #[test]
    fn formula_fields_are_guarded() {
        let rows = vec![row("=2+5", "@Alice", "2024-03-04", "PRESENT")];
        let text = String::from_utf8(write_csv(&rows).unwrap()).unwrap();
        assert!(text.contains("'=2+5"));
        assert!(text.contains("'@Alice"));
    }

    #[test]
    fn computed_rows_flatten_with_enum_status() {
        let resolved = ResolvedDayRow {
            employee_id: 1,
            employee_code: "EMP-001".to_string(),
            name: "Alice".to_string(),
            work_date: NaiveDate::parse_from_str("2024-03-04", "%Y-%m-%d").unwrap(),
            status: AttendanceStatus::HalfDay,
        };
        let flat = CsvRow::from(&resolved);
        assert_eq!(flat.work_date, "2024-03-04");
        assert_eq!(flat.status, "HALF_DAY");
    }
}
