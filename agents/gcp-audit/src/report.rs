//! In-memory report model
//!
//! Sections render into [`SheetData`]; the encoder turns a finished
//! [`ReportWorkbook`] into spreadsheet bytes.

/// Placeholder cell text for "no data"
pub const NO_DATA: &str = "None";

/// One column of a sheet: header text, width in characters, wrap hint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub width: f64,
    pub wrap: bool,
}

impl ColumnSpec {
    const fn new(header: &'static str, width: f64) -> Self {
        Self {
            header,
            width,
            wrap: false,
        }
    }

    const fn wrapped(header: &'static str, width: f64) -> Self {
        Self {
            header,
            width,
            wrap: true,
        }
    }
}

/// Fixed name and column layout of a sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub const IAM_SHEET: SheetSchema = SheetSchema {
    name: "IAM",
    columns: &[
        ColumnSpec::new("User/Group", 20.0),
        ColumnSpec::wrapped("Permissions", 50.0),
    ],
};

pub const BYOK_SHEET: SheetSchema = SheetSchema {
    name: "BYOK",
    columns: &[
        ColumnSpec::new("Key Name", 50.0),
        ColumnSpec::new("Type (ex. RSA-2048)", 20.0),
        ColumnSpec::new("Lifecycle", 15.0),
        ColumnSpec::new("Manager", 15.0),
    ],
};

pub const FIREWALL_SHEET: SheetSchema = SheetSchema {
    name: "Network Rules",
    columns: &[
        ColumnSpec::new("Direction", 15.0),
        ColumnSpec::new("Source Ranges", 30.0),
        ColumnSpec::new("Destination Ranges", 30.0),
        ColumnSpec::new("Name", 30.0),
        ColumnSpec::new("Purpose", 40.0),
    ],
};

/// A rendered sheet: schema plus data rows (header excluded)
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub schema: SheetSchema,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(schema: SheetSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Sheet holding only a sentinel row: `lead`, then [`NO_DATA`] in every other column
    pub fn sentinel(schema: SheetSchema, lead: &str) -> Self {
        let mut sheet = Self::new(schema);
        let row = std::iter::once(lead.to_string())
            .chain(std::iter::repeat(NO_DATA.to_string()))
            .take(schema.columns.len())
            .collect();
        sheet.rows.push(row);
        sheet
    }

    /// Sheet holding only the "no data" sentinel row
    pub fn no_data(schema: SheetSchema) -> Self {
        Self::sentinel(schema, NO_DATA)
    }

    /// Append a row, padding or truncating to the schema width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.schema.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    /// True when the sheet holds exactly one row whose trailing cells are all placeholders
    pub fn is_sentinel(&self) -> bool {
        match self.rows.as_slice() {
            [row] => row.iter().skip(1).all(|cell| cell == NO_DATA),
            _ => false,
        }
    }
}

/// Ordered collection of sheets forming one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportWorkbook {
    pub sheets: Vec<SheetData>,
}

impl ReportWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: SheetData) {
        self.sheets.push(sheet);
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.name() == name)
    }
}

/// `<label>_<year><period>_<projectId>.xlsx`
pub fn report_file_name(label: &str, year: &str, period: &str, project_id: &str) -> String {
    format!("{label}_{year}{period}_{project_id}.xlsx")
}
