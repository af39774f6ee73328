use std::{fs, io, path::Path};

use super::{Align, CellStyle, CellValue, ColNum, GridDocument, MergeRange, Sheet};
use crate::error::{ReportError, ReportResult};

pub const DEFAULT_BASE_SHEET: &str = "Report";

pub const HEADER_FILL: u32 = 0xD9D9D9;

/// Leading static columns, in order, with their widths.
pub const STATIC_COLUMNS: [(&str, f64); 7] = [
    ("S/N", 6.0),
    ("Business Hub", 20.0),
    ("Feeder", 28.0),
    ("Region", 18.0),
    ("Band", 8.0),
    ("Daily Uptake (MWh)", 14.0),
    ("Monthly Plan (MWh)", 14.0),
];

/// Base document the renderer fills in: fixed header rows on a named base
/// sheet.
#[derive(Debug, Clone)]
pub struct Template {
    document: GridDocument,
    base_sheet: String,
}

impl Template {
    pub fn from_document(document: GridDocument, base_sheet: &str) -> ReportResult<Self> {
        if document.sheet(base_sheet).is_none() {
            return Err(ReportError::TemplateMissing(format!(
                "sheet '{base_sheet}' not found in template"
            )));
        }
        Ok(Self {
            document,
            base_sheet: base_sheet.to_string(),
        })
    }

    /// Load a template document stored as JSON.
    pub fn load(path: impl AsRef<Path>, base_sheet: &str) -> ReportResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                ReportError::TemplateMissing(format!("{} does not exist", path.display()))
            }
            _ => ReportError::TemplateMissing(format!("{}: {e}", path.display())),
        })?;
        let document: GridDocument = serde_json::from_str(&contents).map_err(|e| {
            ReportError::TemplateMissing(format!("{} is not a valid template: {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), base_sheet, "loaded report template");
        Self::from_document(document, base_sheet)
    }

    /// Built-in header block: title row, blank row, and the static column
    /// headers spanning rows 3 and 4.
    pub fn standard() -> Self {
        let mut sheet = Sheet::new(DEFAULT_BASE_SHEET);
        let header = CellStyle::bordered()
            .with_bold()
            .with_fill(HEADER_FILL)
            .with_align(Align::Center);

        sheet.set(0, 0, CellValue::Blank, CellStyle::bordered().with_bold());
        sheet.merge(MergeRange::new(0, 0, 0, STATIC_COLUMNS.len() as ColNum - 1));

        for (idx, (label, width)) in STATIC_COLUMNS.iter().enumerate() {
            let col = idx as ColNum;
            sheet.set(2, col, CellValue::text(*label), header.clone());
            sheet.set(3, col, CellValue::Blank, header.clone());
            sheet.merge(MergeRange::new(2, col, 3, col));
            sheet.set_column_width(col, *width);
        }

        Self {
            document: GridDocument {
                sheets: vec![sheet],
            },
            base_sheet: DEFAULT_BASE_SHEET.to_string(),
        }
    }

    pub fn base_sheet(&self) -> &str {
        &self.base_sheet
    }

    /// Fresh copy of the template document for one report run.
    pub fn instantiate(&self) -> GridDocument {
        self.document.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_template_has_static_headers() {
        let t = Template::standard();
        let doc = t.instantiate();
        let sheet = doc.sheet(t.base_sheet()).expect("base sheet");

        assert_eq!(sheet.get(2, 2).and_then(|c| c.value.as_text()), Some("Feeder"));
        assert!(sheet.merges().contains(&MergeRange::new(2, 6, 3, 6)));
    }

    #[test]
    fn missing_file_is_template_missing() {
        let res = Template::load("/nonexistent/report-template.json", DEFAULT_BASE_SHEET);
        assert!(matches!(res, Err(ReportError::TemplateMissing(_))));
    }

    #[test]
    fn missing_base_sheet_is_template_missing() {
        let doc = GridDocument {
            sheets: vec![Sheet::new("Other")],
        };
        let res = Template::from_document(doc, DEFAULT_BASE_SHEET);
        assert!(matches!(res, Err(ReportError::TemplateMissing(_))));
    }

    #[test]
    fn template_loads_from_json_file() {
        let file = format!("report-template-{}.json", std::process::id());
        let path = std::env::temp_dir().join(file);
        let doc = Template::standard().instantiate();
        fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let loaded = Template::load(&path, DEFAULT_BASE_SHEET).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.instantiate(), doc);
    }
}
