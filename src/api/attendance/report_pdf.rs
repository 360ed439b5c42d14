use super::engine::ResolvedDayRow;
use crate::error::ApiError;
use crate::model::attendance::AttendanceStatus;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate};
use printpdf::path::PaintMode;
use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rect, Rgb};
use std::collections::HashMap;

/// Per-employee status tallies over the included day set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounters {
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
    pub half_day: u32,
}

impl StatusCounters {
    pub fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Leave => self.leave += 1,
            AttendanceStatus::HalfDay => self.half_day += 1,
        }
    }

    pub fn merge(&mut self, other: &StatusCounters) {
        self.present += other.present;
        self.absent += other.absent;
        self.leave += other.leave;
        self.half_day += other.half_day;
    }

    pub fn total(&self) -> u32 {
        self.present + self.absent + self.leave + self.half_day
    }
}

#[derive(Debug)]
pub struct EmployeeTotals {
    pub employee_code: String,
    pub name: String,
    pub counters: StatusCounters,
}

/// Pivots resolved cells into per-employee counters plus the grand total
/// row. Output is alphabetical by name; the grand total is the column-wise
/// sum of every employee row, so `total` always equals the number of
/// included days times the employee count.
pub fn pivot_counters(rows: &[ResolvedDayRow]) -> (Vec<EmployeeTotals>, StatusCounters) {
    let mut by_employee: HashMap<u64, EmployeeTotals> = HashMap::new();
    for row in rows {
        by_employee
            .entry(row.employee_id)
            .or_insert_with(|| EmployeeTotals {
                employee_code: row.employee_code.clone(),
                name: row.name.clone(),
                counters: StatusCounters::default(),
            })
            .counters
            .record(row.status);
    }

    let mut totals: Vec<EmployeeTotals> = by_employee.into_values().collect();
    totals.sort_by(|a, b| a.name.cmp(&b.name).then(a.employee_code.cmp(&b.employee_code)));

    let mut grand = StatusCounters::default();
    for t in &totals {
        grand.merge(&t.counters);
    }
    (totals, grand)
}

pub struct PdfMeta {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub include_weekends: bool,
    pub generated_at: DateTime<FixedOffset>,
}

// A4 portrait layout, all in millimetres.
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_L: f32 = 14.0;
const MARGIN_R: f32 = 14.0;
const TOP_Y: f32 = 282.0;
const BOTTOM_Y: f32 = 18.0;
const ROW_H: f32 = 7.0;

const COL_CODE: f32 = MARGIN_L;
const COL_NAME: f32 = 44.0;
const COL_PRESENT: f32 = 118.0;
const COL_ABSENT: f32 = 134.0;
const COL_LEAVE: f32 = 150.0;
const COL_HALF: f32 = 164.0;
const COL_TOTAL: f32 = 184.0;

fn truncate_name(name: &str) -> String {
    const MAX: usize = 36;
    if name.chars().count() <= MAX {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX - 1).collect();
        format!("{}…", head)
    }
}

/// Renders the summary table to PDF bytes: header block, column headings,
/// one row per employee with alternating background tint, page breaks when
/// the cursor runs out of printable height, and a bold TOTAL row.
pub fn render_summary_pdf(
    meta: &PdfMeta,
    totals: &[EmployeeTotals],
    grand: &StatusCounters,
) -> Result<Vec<u8>, ApiError> {
    build_document(meta, totals, grand).map_err(|e| {
        tracing::error!(error = %e, "PDF rendering failed");
        ApiError::Internal
    })
}

fn build_document(
    meta: &PdfMeta,
    totals: &[EmployeeTotals],
    grand: &StatusCounters,
) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("Attendance Summary", Mm(PAGE_W), Mm(PAGE_H), "content");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("load Helvetica")?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("load Helvetica-Bold")?;

    let mut layer_ref = doc.get_page(page).get_layer(layer);
    let mut y = TOP_Y;

    // Document header, first page only.
    set_black(&layer_ref);
    layer_ref.use_text("Attendance Summary", 16.0, Mm(MARGIN_L), Mm(y), &bold);
    y -= 8.0;
    layer_ref.use_text(
        format!(
            "Period: {} to {}  ({})",
            meta.date_from.format("%Y-%m-%d"),
            meta.date_to.format("%Y-%m-%d"),
            if meta.include_weekends {
                "weekends included"
            } else {
                "weekdays only"
            }
        ),
        10.0,
        Mm(MARGIN_L),
        Mm(y),
        &font,
    );
    y -= 6.0;
    layer_ref.use_text(
        format!(
            "Generated: {}",
            meta.generated_at.format("%Y-%m-%d %H:%M:%S %:z")
        ),
        9.0,
        Mm(MARGIN_L),
        Mm(y),
        &font,
    );
    y -= 10.0;

    draw_table_header(&layer_ref, &bold, y);
    y -= ROW_H;

    for (idx, row) in totals.iter().enumerate() {
        if y < BOTTOM_Y + ROW_H {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "content");
            layer_ref = doc.get_page(next_page).get_layer(next_layer);
            y = TOP_Y;
            draw_table_header(&layer_ref, &bold, y);
            y -= ROW_H;
        }

        if idx % 2 == 1 {
            fill_row_band(&layer_ref, y, 0.93);
        }
        set_black(&layer_ref);
        layer_ref.use_text(row.employee_code.as_str(), 10.0, Mm(COL_CODE), Mm(y), &font);
        layer_ref.use_text(truncate_name(&row.name), 10.0, Mm(COL_NAME), Mm(y), &font);
        draw_counters(&layer_ref, &font, y, &row.counters);
        y -= ROW_H;
    }

    // Grand-total row, kept on one page with its band.
    if y < BOTTOM_Y + ROW_H {
        let (next_page, next_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "content");
        layer_ref = doc.get_page(next_page).get_layer(next_layer);
        y = TOP_Y;
        draw_table_header(&layer_ref, &bold, y);
        y -= ROW_H;
    }
    fill_row_band(&layer_ref, y, 0.85);
    set_black(&layer_ref);
    layer_ref.use_text("TOTAL", 10.0, Mm(COL_CODE), Mm(y), &bold);
    layer_ref.use_text(
        format!("{} employees", totals.len()),
        10.0,
        Mm(COL_NAME),
        Mm(y),
        &bold,
    );
    draw_counters(&layer_ref, &bold, y, grand);

    doc.save_to_bytes().context("serialize PDF")
}

fn draw_table_header(layer: &printpdf::PdfLayerReference, bold: &printpdf::IndirectFontRef, y: f32) {
    fill_row_band(layer, y, 0.88);
    set_black(layer);
    layer.use_text("Code", 10.0, Mm(COL_CODE), Mm(y), bold);
    layer.use_text("Employee", 10.0, Mm(COL_NAME), Mm(y), bold);
    layer.use_text("Present", 10.0, Mm(COL_PRESENT), Mm(y), bold);
    layer.use_text("Absent", 10.0, Mm(COL_ABSENT), Mm(y), bold);
    layer.use_text("Leave", 10.0, Mm(COL_LEAVE), Mm(y), bold);
    layer.use_text("Half Day", 10.0, Mm(COL_HALF), Mm(y), bold);
    layer.use_text("Total", 10.0, Mm(COL_TOTAL), Mm(y), bold);
}

fn draw_counters(
    layer: &printpdf::PdfLayerReference,
    font: &printpdf::IndirectFontRef,
    y: f32,
    counters: &StatusCounters,
) {
    layer.use_text(counters.present.to_string(), 10.0, Mm(COL_PRESENT), Mm(y), font);
    layer.use_text(counters.absent.to_string(), 10.0, Mm(COL_ABSENT), Mm(y), font);
    layer.use_text(counters.leave.to_string(), 10.0, Mm(COL_LEAVE), Mm(y), font);
    layer.use_text(counters.half_day.to_string(), 10.0, Mm(COL_HALF), Mm(y), font);
    layer.use_text(counters.total().to_string(), 10.0, Mm(COL_TOTAL), Mm(y), font);
}

fn fill_row_band(layer: &printpdf::PdfLayerReference, y: f32, tint: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(tint, tint, tint, None)));
    let band = Rect::new(
        Mm(MARGIN_L - 2.0),
        Mm(y - 2.0),
        Mm(PAGE_W - MARGIN_R + 2.0),
        Mm(y + ROW_H - 2.0),
    )
    .with_mode(PaintMode::Fill);
    layer.add_rect(band);
}

fn set_black(layer: &printpdf::PdfLayerReference) {
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn resolved(id: u64, name: &str, date: &str, status: AttendanceStatus) -> ResolvedDayRow {
        ResolvedDayRow {
            employee_id: id,
            employee_code: format!("EMP-{id:03}"),
            name: name.to_string(),
            work_date: date.parse().unwrap(),
            status,
        }
    }

    #[test]
    fn counters_sum_to_total() {
        let mut c = StatusCounters::default();
        c.record(AttendanceStatus::Present);
        c.record(AttendanceStatus::Present);
        c.record(AttendanceStatus::Absent);
        c.record(AttendanceStatus::Leave);
        c.record(AttendanceStatus::HalfDay);
        assert_eq!(c.total(), 5);
        assert_eq!(c.present, 2);
    }

    #[test]
    fn grand_total_is_the_columnwise_sum() {
        let rows = vec![
            resolved(1, "Alice", "2024-03-04", AttendanceStatus::Present),
            resolved(1, "Alice", "2024-03-05", AttendanceStatus::Absent),
            resolved(2, "Bob", "2024-03-04", AttendanceStatus::Leave),
            resolved(2, "Bob", "2024-03-05", AttendanceStatus::HalfDay),
        ];
        let (totals, grand) = pivot_counters(&rows);

        assert_eq!(totals.len(), 2);
        // Each employee saw both included days.
        for t in &totals {
            assert_eq!(t.counters.total(), 2);
        }
        assert_eq!(grand.present, 1);
        assert_eq!(grand.absent, 1);
        assert_eq!(grand.leave, 1);
        assert_eq!(grand.half_day, 1);
        assert_eq!(
            grand.total(),
            totals.iter().map(|t| t.counters.total()).sum::<u32>()
        );
    }

    #[test]
    fn totals_are_alphabetical_by_name() {
        let rows = vec![
            resolved(1, "Zoe", "2024-03-04", AttendanceStatus::Present),
            resolved(2, "Alice", "2024-03-04", AttendanceStatus::Present),
            resolved(3, "Bob", "2024-03-04", AttendanceStatus::Present),
        ];
        let (totals, _) = pivot_counters(&rows);
        let names: Vec<&str> = totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Zoe"]);
    }

    #[test]
    fn long_names_are_truncated_for_the_cell() {
        let name = "A".repeat(60);
        let cell = truncate_name(&name);
        assert!(cell.chars().count() <= 36);
        assert!(cell.ends_with('…'));
        assert_eq!(truncate_name("Bob"), "Bob");
    }

    #[test]
    fn renders_a_parsable_pdf() {
        let rows: Vec<ResolvedDayRow> = (0..80)
            .map(|i| {
                resolved(
                    i,
                    &format!("Employee {i:02}"),
                    "2024-03-04",
                    AttendanceStatus::Present,
                )
            })
            .collect();
        let (totals, grand) = pivot_counters(&rows);
        let meta = PdfMeta {
            date_from: "2024-03-04".parse().unwrap(),
            date_to: "2024-03-08".parse().unwrap(),
            include_weekends: false,
            generated_at: FixedOffset::east_opt(5 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 3, 8, 18, 0, 0)
                .unwrap(),
        };
        // 80 rows forces at least one page break.
        let bytes = render_summary_pdf(&meta, &totals, &grand).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }
}
