use std::{collections::HashMap, io::Write};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use super::{Align, CellStyle, CellValue, GridDocument};
use crate::error::ReportResult;

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(rgb) = style.fill {
        format = format.set_background_color(Color::RGB(rgb));
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    match style.align {
        Align::General => {}
        Align::Left => format = format.set_align(FormatAlign::Left),
        Align::Center => {
            format = format
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
        }
    }
    if let Some(num_format) = &style.number_format {
        format = format.set_num_format(num_format);
    }
    format
}

/// Serialize the document to OOXML spreadsheet bytes.
pub fn to_bytes(doc: &GridDocument) -> ReportResult<Vec<u8>> {
    let default_style = CellStyle::default();
    let mut formats: HashMap<&CellStyle, Format> = HashMap::new();
    let mut workbook = Workbook::new();

    for sheet in &doc.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, width) in sheet.column_widths() {
            worksheet.set_column_width(col, width)?;
        }

        for m in sheet.merges() {
            if m.first_row == m.last_row && m.first_col == m.last_col {
                continue;
            }
            let style = sheet
                .get(m.first_row, m.first_col)
                .map(|c| &c.style)
                .unwrap_or(&default_style);
            let format = formats.entry(style).or_insert_with(|| to_format(style));
            worksheet.merge_range(m.first_row, m.first_col, m.last_row, m.last_col, "", format)?;
        }

        for (row, col, cell) in sheet.cells() {
            if sheet.is_merge_covered(row, col) {
                continue;
            }
            let format = formats
                .entry(&cell.style)
                .or_insert_with(|| to_format(&cell.style));
            match &cell.value {
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(row, col, s, format)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number_with_format(row, col, *n, format)?;
                }
                CellValue::Blank => {
                    worksheet.write_blank(row, col, format)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn write_to<W: Write>(doc: &GridDocument, mut out: W) -> ReportResult<()> {
    let bytes = to_bytes(doc)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{MergeRange, Sheet, Template};

    #[test]
    fn writes_a_zip_container() {
        let mut doc = Template::standard().instantiate();
        let sheet = doc.sheet_mut("Report").unwrap();
        sheet.set(0, 0, CellValue::text("title"), CellStyle::default().with_bold());
        sheet.set(4, 7, CellValue::Number(-12.5), CellStyle::bordered().with_fill(0xFFC7CE));

        let mut other = Sheet::new("No Flags");
        other.set(2, 7, CellValue::text("01-Jan-2024"), CellStyle::bordered());
        other.merge(MergeRange::new(2, 7, 2, 9));
        doc.sheets.push(other);

        let bytes = to_bytes(&doc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn write_to_streams_document_bytes() {
        let doc = Template::standard().instantiate();
        let mut out = Vec::new();
        write_to(&doc, &mut out).unwrap();
        assert!(out.starts_with(b"PK"));
    }
}
