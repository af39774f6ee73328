//! Projects the matrix and analysis results onto the report template.

use std::collections::HashMap;

use time::{macros::format_description, Date};

use super::{
    template::{HEADER_FILL, STATIC_COLUMNS},
    Align, CellStyle, CellValue, ColNum, GridDocument, MergeRange, RowNum, RowSnapshot, Sheet,
    Template, MAX_COLUMNS,
};
use crate::{
    categories::{summary_labels, Category, FeederAnalysis},
    error::{ReportError, ReportResult},
    matrix::FeederMatrix,
    store::FeederView,
};

pub const TITLE_ROW: RowNum = 0;
pub const DATE_HEADER_ROW: RowNum = 2;
pub const SUB_HEADER_ROW: RowNum = 3;
pub const FIRST_DATA_ROW: RowNum = 4;
pub const FIRST_DATE_COL: ColNum = STATIC_COLUMNS.len() as ColNum;
pub const DATE_BLOCK_WIDTH: ColNum = 3;
pub const SUB_HEADERS: [&str; 3] = ["Nomination", "Actual", "Variance"];
/// Longest range whose date blocks still fit in one worksheet.
pub const MAX_DAYS: usize = (MAX_COLUMNS - FIRST_DATE_COL as usize) / DATE_BLOCK_WIDTH as usize;

pub const POSITIVE_FILL: u32 = 0xC6EFCE;
pub const NEGATIVE_FILL: u32 = 0xFFC7CE;
pub const BANNER_FILL: u32 = 0xBDD7EE;

const NUMBER_FORMAT: &str = "#,##0.00";
const DATE_COLUMN_WIDTH: f64 = 13.0;
const SUMMARY_HEADERS: [(&str, f64); 5] = [
    ("Region", 18.0),
    ("Business Hub", 20.0),
    ("Feeder", 28.0),
    ("Date", 14.0),
    ("Failed Checks", 60.0),
];

pub fn format_day(day: Date) -> String {
    day.format(format_description!("[day]-[month repr:short]-[year]"))
        .unwrap_or_else(|_| day.to_string())
}

/// Everything one render needs; `feeders`, `rows` and `analyses` are
/// index-aligned.
pub struct RenderInput<'a> {
    pub title: &'a str,
    pub days: &'a [Date],
    pub feeders: &'a [FeederView],
    pub rows: &'a [FeederMatrix],
    pub analyses: &'a [FeederAnalysis],
    pub include_analysis: bool,
}

fn too_long(days: usize) -> ReportError {
    ReportError::RangeTooLong {
        days,
        max: MAX_DAYS,
    }
}

/// First column of the date block for `day_idx`.
fn date_col(day_idx: usize) -> ReportResult<ColNum> {
    if day_idx >= MAX_DAYS {
        return Err(too_long(day_idx + 1));
    }
    ColNum::try_from(day_idx)
        .ok()
        .and_then(|idx| idx.checked_mul(DATE_BLOCK_WIDTH))
        .and_then(|offset| offset.checked_add(FIRST_DATE_COL))
        .ok_or_else(|| too_long(day_idx + 1))
}

/// Last column any row of the main sheet uses.
fn last_col(day_count: usize) -> ReportResult<ColNum> {
    match day_count {
        0 => Ok(FIRST_DATE_COL - 1),
        n => Ok(date_col(n - 1)? + DATE_BLOCK_WIDTH - 1),
    }
}

fn variance_style(variance: f64) -> CellStyle {
    let style = CellStyle::bordered().with_number_format(NUMBER_FORMAT);
    if variance > 0.0 {
        style.with_fill(POSITIVE_FILL)
    } else if variance < 0.0 {
        style.with_fill(NEGATIVE_FILL)
    } else {
        style
    }
}

fn write_title(sheet: &mut Sheet, title: &str) {
    let mut style = sheet
        .get(TITLE_ROW, 0)
        .map(|c| c.style.clone())
        .unwrap_or_else(|| CellStyle::default().with_bold());
    style.border = true;
    sheet.set(TITLE_ROW, 0, CellValue::text(title), style);
}

fn write_date_headers(sheet: &mut Sheet, days: &[Date]) -> ReportResult<()> {
    let header = CellStyle::bordered()
        .with_bold()
        .with_align(Align::Center);
    let sub_header = CellStyle::bordered()
        .with_bold()
        .with_fill(HEADER_FILL)
        .with_align(Align::Center);

    for (idx, day) in days.iter().enumerate() {
        let col = date_col(idx)?;
        sheet.set(DATE_HEADER_ROW, col, CellValue::text(format_day(*day)), header.clone());
        for offset in 1..DATE_BLOCK_WIDTH {
            sheet.set(DATE_HEADER_ROW, col + offset, CellValue::Blank, header.clone());
        }
        sheet.merge(MergeRange::new(
            DATE_HEADER_ROW,
            col,
            DATE_HEADER_ROW,
            col + DATE_BLOCK_WIDTH - 1,
        ));

        for (offset, label) in SUB_HEADERS.iter().enumerate() {
            let c = col + offset as ColNum;
            sheet.set(SUB_HEADER_ROW, c, CellValue::text(*label), sub_header.clone());
            sheet.set_column_width(c, DATE_COLUMN_WIDTH);
        }
    }
    Ok(())
}

fn write_banner(sheet: &mut Sheet, row: RowNum, last_col: ColNum, region: &str) {
    let style = CellStyle::bordered().with_bold().with_fill(BANNER_FILL);
    sheet.set(row, 0, CellValue::text(region), style.clone());
    for col in 1..=last_col {
        sheet.set(row, col, CellValue::Blank, style.clone());
    }
    sheet.merge(MergeRange::new(row, 0, row, last_col));
}

fn write_feeder_row(
    sheet: &mut Sheet,
    row: RowNum,
    serial: usize,
    feeder: &FeederView,
    matrix: &FeederMatrix,
) -> ReportResult<()> {
    let text = CellStyle::bordered();
    let number = CellStyle::bordered().with_number_format(NUMBER_FORMAT);

    sheet.set(row, 0, CellValue::Number(serial as f64), text.clone().with_align(Align::Center));
    sheet.set(row, 1, CellValue::text(&feeder.business_hub), text.clone());
    sheet.set(row, 2, CellValue::text(&feeder.name), text.clone());
    sheet.set(row, 3, CellValue::text(&feeder.region), text.clone());
    sheet.set(row, 4, CellValue::text(feeder.band.as_str()), text.with_align(Align::Center));
    sheet.set(row, 5, CellValue::Number(feeder.daily_energy_uptake), number.clone());
    sheet.set(row, 6, CellValue::Number(feeder.monthly_delivery_plan), number.clone());

    for (idx, day) in matrix.days.iter().enumerate() {
        let col = date_col(idx)?;
        sheet.set(row, col, CellValue::Number(day.nomination), number.clone());
        sheet.set(row, col + 1, CellValue::Number(day.actual), number.clone());
        sheet.set(row, col + 2, CellValue::Number(day.variance), variance_style(day.variance));
    }
    Ok(())
}

fn write_summary_row(
    sheet: &mut Sheet,
    row: RowNum,
    feeder: &FeederView,
    day: Option<Date>,
    labels: String,
) {
    let style = CellStyle::bordered();
    let values = [
        feeder.region.clone(),
        feeder.business_hub.clone(),
        feeder.name.clone(),
        day.map(format_day).unwrap_or_default(),
        labels,
    ];
    for (col, value) in values.into_iter().enumerate() {
        sheet.set(row, col as ColNum, CellValue::Text(value), style.clone());
    }
}

fn missing_sheet(name: &str) -> ReportError {
    ReportError::TemplateMissing(format!("sheet '{name}' not found in template"))
}

/// Render the main sheet and, when requested, the eight category sheets.
pub fn render(template: &Template, input: &RenderInput<'_>) -> ReportResult<GridDocument> {
    if input.days.len() > MAX_DAYS {
        return Err(too_long(input.days.len()));
    }
    let banner_end = last_col(input.days.len())?;

    let mut doc = template.instantiate();
    let base = template.base_sheet().to_string();
    let main = doc.sheet_mut(&base).ok_or_else(|| missing_sheet(&base))?;

    write_title(main, input.title);
    write_date_headers(main, input.days)?;

    let mut cursor = FIRST_DATA_ROW;
    let mut current_region: Option<&str> = None;
    let mut snapshots: Vec<RowSnapshot> = Vec::with_capacity(input.feeders.len());

    for (serial, (feeder, matrix)) in input.feeders.iter().zip(input.rows).enumerate() {
        if current_region != Some(feeder.region.as_str()) {
            write_banner(main, cursor, banner_end, &feeder.region);
            current_region = Some(feeder.region.as_str());
            cursor += 1;
        }
        write_feeder_row(main, cursor, serial + 1, feeder, matrix)?;
        snapshots.push(main.row_snapshot(cursor));
        cursor += 1;
    }

    if !input.include_analysis {
        return Ok(doc);
    }

    let mut category_sheets: Vec<(Category, Sheet, RowNum)> = {
        let main = doc.sheet(&base).ok_or_else(|| missing_sheet(&base))?;
        Category::ALL
            .iter()
            .map(|&category| {
                let mut sheet = Sheet::new(category.sheet_name());
                sheet.copy_rows_from(main, TITLE_ROW..=SUB_HEADER_ROW);
                (category, sheet, FIRST_DATA_ROW)
            })
            .collect()
    };

    if let Some((_, summary, _)) = category_sheets
        .iter_mut()
        .find(|(c, _, _)| *c == Category::FailedChecks)
    {
        // Relabel the copied static headers for the synthetic columns.
        for (col, (label, width)) in SUMMARY_HEADERS.iter().enumerate() {
            let col = col as ColNum;
            let style = summary
                .get(DATE_HEADER_ROW, col)
                .map(|c| c.style.clone())
                .unwrap_or_else(|| CellStyle::bordered().with_bold().with_fill(HEADER_FILL));
            summary.set(DATE_HEADER_ROW, col, CellValue::text(*label), style);
            summary.set_column_width(col, *width);
        }
        // Remaining static headers sit over columns that stay empty here.
        for col in SUMMARY_HEADERS.len() as ColNum..FIRST_DATE_COL {
            if let Some(style) = summary.get(DATE_HEADER_ROW, col).map(|c| c.style.clone()) {
                summary.set(DATE_HEADER_ROW, col, CellValue::Blank, style);
            }
        }
    }

    let index: HashMap<Category, usize> = category_sheets
        .iter()
        .enumerate()
        .map(|(i, (c, _, _))| (*c, i))
        .collect();
    let last_day = input.days.last().copied();

    for (i, analysis) in input.analyses.iter().enumerate() {
        for category in &analysis.categories {
            let Some(&slot) = index.get(category) else {
                continue;
            };
            let (_, sheet, next_row) = &mut category_sheets[slot];
            if *category == Category::FailedChecks {
                let labels = summary_labels(analysis.classification.failed());
                write_summary_row(sheet, *next_row, &input.feeders[i], last_day, labels);
            } else {
                sheet.write_snapshot(*next_row, snapshots[i].clone());
            }
            *next_row += 1;
        }
    }

    doc.sheets
        .extend(category_sheets.into_iter().map(|(_, sheet, _)| sheet));

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        categories::analyse,
        dates, matrix,
        matrix::tests::{reading, view},
    };
    use time::macros::date;

    struct Fixture {
        days: Vec<Date>,
        feeders: Vec<FeederView>,
        rows: Vec<FeederMatrix>,
        analyses: Vec<FeederAnalysis>,
    }

    fn fixture() -> Fixture {
        let days = dates::expand(date!(2024 - 01 - 01), date!(2024 - 01 - 02)).unwrap();
        let mut west_a = view("f-1", 100.0);
        west_a.name = "Allen".into();
        let mut west_b = view("f-2", 100.0);
        west_b.name = "Bode".into();
        let mut east = view("f-3", 50.0);
        east.region = "Lagos East".into();
        east.business_hub = "Ikoyi".into();
        east.name = "Cole".into();

        let mut feeders = vec![west_a, west_b, east];
        feeders.sort_by(|a, b| (&a.region, &a.name).cmp(&(&b.region, &b.name)));

        let readings = vec![
            reading("f-1", date!(2024 - 01 - 01), 100.0),
            reading("f-1", date!(2024 - 01 - 02), 200.0),
            reading("f-2", date!(2024 - 01 - 01), 100.0),
            reading("f-2", date!(2024 - 01 - 02), 90.0),
            reading("f-3", date!(2024 - 01 - 01), 50.0),
        ];
        let rows = matrix::build(&feeders, &days, &readings);
        let analyses = feeders
            .iter()
            .zip(&rows)
            .map(|(f, r)| analyse(f, r))
            .collect();

        Fixture {
            days,
            feeders,
            rows,
            analyses,
        }
    }

    fn render_fixture(f: &Fixture, include_analysis: bool) -> GridDocument {
        let input = RenderInput {
            title: "FEEDER ENERGY NOMINATION REPORT",
            days: &f.days,
            feeders: &f.feeders,
            rows: &f.rows,
            analyses: &f.analyses,
            include_analysis,
        };
        render(&Template::standard(), &input).unwrap()
    }

    fn text(sheet: &Sheet, row: RowNum, col: ColNum) -> Option<&str> {
        sheet.get(row, col).and_then(|c| c.value.as_text())
    }

    fn number(sheet: &Sheet, row: RowNum, col: ColNum) -> Option<f64> {
        sheet.get(row, col).and_then(|c| c.value.as_number())
    }

    #[test]
    fn day_label_uses_short_month() {
        assert_eq!(format_day(date!(2024 - 03 - 07)), "07-Mar-2024");
    }

    #[test]
    fn headers_are_tripled_per_day() {
        let f = fixture();
        let doc = render_fixture(&f, false);
        let main = doc.sheet("Report").unwrap();

        assert_eq!(text(main, 0, 0), Some("FEEDER ENERGY NOMINATION REPORT"));
        assert_eq!(text(main, 2, 7), Some("01-Jan-2024"));
        assert_eq!(text(main, 2, 10), Some("02-Jan-2024"));
        assert!(main.merges().contains(&MergeRange::new(2, 7, 2, 9)));
        assert!(main.merges().contains(&MergeRange::new(2, 10, 2, 12)));
        assert_eq!(text(main, 3, 8), Some("Actual"));
        assert_eq!(main.get(3, 12).and_then(|c| c.style.fill), Some(HEADER_FILL));
        assert_eq!(doc.sheet_names(), vec!["Report"]);
    }

    #[test]
    fn regions_get_banner_rows_and_variance_colors() {
        let f = fixture();
        let doc = render_fixture(&f, false);
        let main = doc.sheet("Report").unwrap();

        // Lagos East sorts first: banner, Cole, banner, Allen, Bode.
        assert_eq!(text(main, 4, 0), Some("Lagos East"));
        assert!(main.merges().contains(&MergeRange::new(4, 0, 4, 12)));
        assert_eq!(text(main, 5, 2), Some("Cole"));
        assert_eq!(text(main, 6, 0), Some("Lagos West"));
        assert_eq!(text(main, 7, 2), Some("Allen"));
        assert_eq!(text(main, 8, 2), Some("Bode"));
        assert_eq!(number(main, 7, 0), Some(2.0));

        // Allen: day 2 actual 200, nomination 200 -> neutral.
        assert_eq!(number(main, 7, 12), Some(0.0));
        assert_eq!(main.get(7, 12).and_then(|c| c.style.fill), None);
        // Bode: day 2 actual 90 -> negative.
        assert_eq!(main.get(8, 12).and_then(|c| c.style.fill), Some(NEGATIVE_FILL));
        // Cole: day 1 actual 50, nomination 50 -> neutral; day 2 carried 50 vs 100.
        assert_eq!(number(main, 5, 11), Some(50.0));
        assert!((0..13).all(|col| main.get(7, col).is_some_and(|c| c.style.border)));
    }

    #[test]
    fn analysis_sheets_copy_header_and_rows() {
        let f = fixture();
        let doc = render_fixture(&f, true);

        let names = doc.sheet_names();
        assert_eq!(names.len(), 9);
        assert_eq!(&names[1..], Category::ALL.map(|c| c.sheet_name()).as_slice());

        let main = doc.sheet("Report").unwrap();
        let decline = doc.sheet("Decline").unwrap();
        for col in 0..13 {
            assert_eq!(decline.get(2, col), main.get(2, col));
            assert_eq!(decline.get(3, col), main.get(3, col));
        }
        assert!(decline.merges().contains(&MergeRange::new(2, 7, 2, 9)));

        // Only Bode declined; its row is copied verbatim from the main sheet.
        assert_eq!(decline.row_snapshot(4), main.row_snapshot(8));
        assert!(decline.get(5, 0).is_none());

        let no_flags = doc.sheet("No Flags").unwrap();
        assert_eq!(text(no_flags, 4, 2), Some("Allen"));
        let positive = doc.sheet("Positive Variance").unwrap();
        assert_eq!(text(positive, 4, 2), Some("Allen"));
    }

    #[test]
    fn summary_sheet_has_five_synthetic_columns() {
        let f = fixture();
        let doc = render_fixture(&f, true);
        let summary = doc.sheet("Failed Checks").unwrap();

        assert_eq!(text(summary, 2, 4), Some("Failed Checks"));
        assert_eq!(text(summary, 2, 7), Some("01-Jan-2024"));
        assert_eq!(text(summary, 4, 0), Some("Lagos West"));
        assert_eq!(text(summary, 4, 1), Some("Ikeja"));
        assert_eq!(text(summary, 4, 2), Some("Bode"));
        assert_eq!(text(summary, 4, 3), Some("02-Jan-2024"));
        assert!(text(summary, 4, 4).unwrap().starts_with("Actual D-0 < Actual D-1"));
        assert!(summary.get(4, 5).is_none());
        assert!(summary.get(5, 0).is_none());
        assert_eq!(summary.get(2, 5).map(|c| &c.value), Some(&CellValue::Blank));
        assert_eq!(summary.get(2, 6).map(|c| &c.value), Some(&CellValue::Blank));
    }

    #[test]
    fn title_cell_is_bordered() {
        let f = fixture();
        let doc = render_fixture(&f, false);
        let title = doc.sheet("Report").unwrap().get(0, 0).unwrap();
        assert!(title.style.border);
        assert!(title.style.bold);
    }

    #[test]
    fn date_columns_stop_at_the_sheet_edge() {
        assert_eq!(MAX_DAYS, 5459);
        assert_eq!(date_col(0).unwrap(), FIRST_DATE_COL);
        assert_eq!(last_col(MAX_DAYS).unwrap() as usize, MAX_COLUMNS - 1);
        assert!(matches!(
            date_col(MAX_DAYS),
            Err(ReportError::RangeTooLong { days: 5460, max: 5459 })
        ));
        assert!(date_col(usize::MAX - 1).is_err());
    }

    #[test]
    fn overlong_range_is_rejected_before_layout() {
        let f = fixture();
        let days = vec![date!(2024 - 01 - 01); MAX_DAYS + 1];
        let input = RenderInput {
            title: "too long",
            days: &days,
            feeders: &f.feeders,
            rows: &f.rows,
            analyses: &f.analyses,
            include_analysis: false,
        };
        assert!(matches!(
            render(&Template::standard(), &input),
            Err(ReportError::RangeTooLong { .. })
        ));
    }
}
