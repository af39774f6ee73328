//! In-memory spreadsheet model.
//!
//! The renderer works against this model; [`xlsx`] turns a finished
//! document into OOXML bytes. Rows and columns are zero-based.

pub mod render;
pub mod template;
pub mod xlsx;

use std::{
    collections::BTreeMap,
    ops::RangeInclusive,
};

use serde::{Deserialize, Serialize};

pub use render::{render, RenderInput};
pub use template::Template;

pub type RowNum = u32;
pub type ColNum = u16;

/// Column count of one OOXML worksheet.
pub const MAX_COLUMNS: usize = 16_384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    General,
    Left,
    Center,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub bold: bool,
    /// Background fill as 0xRRGGBB.
    pub fill: Option<u32>,
    /// Thin border on all four sides.
    pub border: bool,
    pub align: Align,
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn bordered() -> Self {
        Self {
            border: true,
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, rgb: u32) -> Self {
        self.fill = Some(rgb);
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default)]
    pub style: CellStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRange {
    pub first_row: RowNum,
    pub first_col: ColNum,
    pub last_row: RowNum,
    pub last_col: ColNum,
}

impl MergeRange {
    pub fn new(first_row: RowNum, first_col: ColNum, last_row: RowNum, last_col: ColNum) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn contains(&self, row: RowNum, col: ColNum) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn within_rows(&self, rows: &RangeInclusive<RowNum>) -> bool {
        rows.contains(&self.first_row) && rows.contains(&self.last_row)
    }

    fn overlaps(&self, other: &MergeRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

/// Cells of one sheet row, detached from the sheet they were taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    pub cells: Vec<(ColNum, Cell)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SheetFile", into = "SheetFile")]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(RowNum, ColNum), Cell>,
    merges: Vec<MergeRange>,
    column_widths: BTreeMap<ColNum, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
            column_widths: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, row: RowNum, col: ColNum, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn get(&self, row: RowNum, col: ColNum) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = (RowNum, ColNum, &Cell)> {
        self.cells.iter().map(|(&(r, c), cell)| (r, c, cell))
    }

    /// Register a merged region. A region overlapping an existing one
    /// replaces it.
    pub fn merge(&mut self, range: MergeRange) {
        self.merges.retain(|m| !m.overlaps(&range));
        self.merges.push(range);
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// True for cells hidden under a merged region (every cell but its
    /// top-left anchor).
    pub fn is_merge_covered(&self, row: RowNum, col: ColNum) -> bool {
        self.merges
            .iter()
            .any(|m| m.contains(row, col) && (m.first_row, m.first_col) != (row, col))
    }

    pub fn set_column_width(&mut self, col: ColNum, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (ColNum, f64)> + '_ {
        self.column_widths.iter().map(|(&c, &w)| (c, w))
    }

    pub fn last_row(&self) -> Option<RowNum> {
        self.cells.keys().map(|&(r, _)| r).max()
    }

    pub fn row_snapshot(&self, row: RowNum) -> RowSnapshot {
        RowSnapshot {
            cells: self
                .cells
                .range((row, 0)..=(row, ColNum::MAX))
                .map(|(&(_, c), cell)| (c, cell.clone()))
                .collect(),
        }
    }

    pub fn write_snapshot(&mut self, row: RowNum, snapshot: RowSnapshot) {
        for (col, cell) in snapshot.cells {
            self.cells.insert((row, col), cell);
        }
    }

    /// Copy the cells of `rows` from `source`, together with its column
    /// widths and every merged region that lies entirely inside `rows`.
    pub fn copy_rows_from(&mut self, source: &Sheet, rows: RangeInclusive<RowNum>) {
        for (&(r, c), cell) in source.cells.range((*rows.start(), 0)..=(*rows.end(), ColNum::MAX)) {
            self.cells.insert((r, c), cell.clone());
        }
        for m in source.merges.iter().filter(|m| m.within_rows(&rows)) {
            self.merge(*m);
        }
        self.column_widths
            .extend(source.column_widths.iter().map(|(&c, &w)| (c, w)));
    }
}

#[derive(Serialize, Deserialize)]
struct PlacedCell {
    row: RowNum,
    col: ColNum,
    value: CellValue,
    #[serde(default)]
    style: CellStyle,
}

/// On-disk shape of a sheet.
#[derive(Serialize, Deserialize)]
struct SheetFile {
    name: String,
    #[serde(default)]
    cells: Vec<PlacedCell>,
    #[serde(default)]
    merges: Vec<MergeRange>,
    #[serde(default)]
    column_widths: BTreeMap<ColNum, f64>,
}

impl From<SheetFile> for Sheet {
    fn from(f: SheetFile) -> Self {
        Sheet {
            name: f.name,
            cells: f
                .cells
                .into_iter()
                .map(|p| {
                    let cell = Cell {
                        value: p.value,
                        style: p.style,
                    };
                    ((p.row, p.col), cell)
                })
                .collect(),
            merges: f.merges,
            column_widths: f.column_widths,
        }
    }
}

impl From<Sheet> for SheetFile {
    fn from(s: Sheet) -> Self {
        SheetFile {
            name: s.name,
            cells: s
                .cells
                .into_iter()
                .map(|((row, col), cell)| PlacedCell {
                    row,
                    col,
                    value: cell.value,
                    style: cell.style,
                })
                .collect(),
            merges: s.merges,
            column_widths: s.column_widths,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    pub sheets: Vec<Sheet>,
}

impl GridDocument {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
