//! Excel report encoder
//!
//! Turns a [`ReportWorkbook`] into `.xlsx` bytes. Rendering options are
//! constructor parameters; nothing is read from process state.

use std::borrow::Cow;

use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, warn};

use crate::config::EncoderOptions;
use crate::error::AuditError;
use crate::report::ReportWorkbook;

/// Excel's per-cell text limit, in characters
pub const MAX_CELL_CHARS: usize = 32_767;

/// Appended to a cell cut down to [`MAX_CELL_CHARS`]
pub const TRUNCATION_MARKER: &str = " ... [truncated]";

/// Spreadsheet sink for finished reports
#[derive(Debug, Clone, Default)]
pub struct XlsxEncoder {
    options: EncoderOptions,
}

impl XlsxEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    /// Encode every sheet, in order, into one workbook
    pub fn encode(&self, report: &ReportWorkbook) -> Result<Vec<u8>, AuditError> {
        let mut workbook = Workbook::new();

        let header_format = if self.options.bold_header {
            Format::new().set_bold()
        } else {
            Format::new()
        };
        let wrap_format = Format::new().set_text_wrap();

        for sheet in &report.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name())?;

            for (col, column) in sheet.schema.columns.iter().enumerate() {
                let col = col as u16;
                worksheet.write_string_with_format(0, col, column.header, &header_format)?;
                worksheet.set_column_width(col, column.width)?;
            }

            for (idx, row) in sheet.rows.iter().enumerate() {
                let row_num = idx as u32 + 1;
                for (col, value) in row.iter().enumerate() {
                    let wrap = sheet
                        .schema
                        .columns
                        .get(col)
                        .map(|c| c.wrap)
                        .unwrap_or(false);

                    let value = clamp_cell(value);
                    if let Cow::Owned(_) = value {
                        warn!(
                            sheet = %sheet.name(),
                            row = row_num,
                            column = col,
                            limit = MAX_CELL_CHARS,
                            "Cell exceeds the Excel text limit, truncating"
                        );
                    }

                    if wrap {
                        worksheet.write_string_with_format(row_num, col as u16, &*value, &wrap_format)?;
                    } else {
                        worksheet.write_string(row_num, col as u16, &*value)?;
                    }
                }
            }

            if self.options.freeze_header_row {
                worksheet.set_freeze_panes(1, 0)?;
            }

            debug!(sheet = %sheet.name(), rows = sheet.rows.len(), "Encoded sheet");
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(bytes = bytes.len(), "Report encoded");
        Ok(bytes)
    }
}

/// Cut `value` to at most [`MAX_CELL_CHARS`] characters, ending in [`TRUNCATION_MARKER`]
pub fn clamp_cell(value: &str) -> Cow<'_, str> {
    if value.chars().count() <= MAX_CELL_CHARS {
        return Cow::Borrowed(value);
    }

    let keep = MAX_CELL_CHARS - TRUNCATION_MARKER.chars().count();
    let mut clamped: String = value.chars().take(keep).collect();
    clamped.push_str(TRUNCATION_MARKER);
    Cow::Owned(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{SheetData, BYOK_SHEET, FIREWALL_SHEET, IAM_SHEET, NO_DATA};
    use calamine::{open_workbook_from_rs, Reader, Xlsx};
    use std::io::Cursor;

    fn sample_report() -> ReportWorkbook {
        let mut iam = SheetData::new(IAM_SHEET);
        iam.push_row(vec![
            "user:a@example.com".to_string(),
            "roles/owner\nroles/viewer".to_string(),
        ]);

        let mut report = ReportWorkbook::new();
        report.push(iam);
        report.push(SheetData::no_data(BYOK_SHEET));
        report.push(SheetData::no_data(FIREWALL_SHEET));
        report
    }

    /// Read every sheet back as `(name, rows)` including the header row
    fn read_back(bytes: Vec<u8>) -> Vec<(String, Vec<Vec<String>>)> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names().to_vec();

        names
            .into_iter()
            .map(|name| {
                let range = workbook.worksheet_range(&name).unwrap();
                let rows = range
                    .rows()
                    .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                    .collect();
                (name, rows)
            })
            .collect()
    }

    #[test]
    fn test_encode_produces_zip_container() {
        let bytes = XlsxEncoder::default().encode(&sample_report()).unwrap();

        // xlsx is a zip archive
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_encoded_sheets_read_back() {
        let bytes = XlsxEncoder::default().encode(&sample_report()).unwrap();
        let sheets = read_back(bytes);

        let names: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["IAM", "BYOK", "Network Rules"]);

        let (_, iam) = &sheets[0];
        assert_eq!(iam[0], vec!["User/Group", "Permissions"]);
        assert_eq!(iam[1], vec!["user:a@example.com", "roles/owner\nroles/viewer"]);

        let (_, byok) = &sheets[1];
        assert_eq!(
            byok[0],
            vec!["Key Name", "Type (ex. RSA-2048)", "Lifecycle", "Manager"]
        );
        assert_eq!(byok[1], vec![NO_DATA; 4]);

        let (_, rules) = &sheets[2];
        assert_eq!(
            rules[0],
            vec!["Direction", "Source Ranges", "Destination Ranges", "Name", "Purpose"]
        );
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_encode_without_styling() {
        let encoder = XlsxEncoder::new(EncoderOptions {
            bold_header: false,
            freeze_header_row: false,
        });
        assert!(encoder.encode(&sample_report()).is_ok());
    }

    #[test]
    fn test_clamp_cell() {
        assert!(matches!(clamp_cell("10.0.0.0/8"), Cow::Borrowed(_)));

        let exact = "x".repeat(MAX_CELL_CHARS);
        assert!(matches!(clamp_cell(&exact), Cow::Borrowed(_)));

        let input = "é".repeat(MAX_CELL_CHARS + 1);
        let clamped = clamp_cell(&input);
        assert_eq!(clamped.chars().count(), MAX_CELL_CHARS);
        assert!(clamped.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_oversized_cell_is_truncated_not_rejected() {
        let ranges: Vec<String> = (0..5000)
            .map(|i| format!("10.{}.{}.0/24", i / 256, i % 256))
            .collect();

        let mut rules = SheetData::new(FIREWALL_SHEET);
        rules.push_row(vec![
            "INGRESS".to_string(),
            ranges.join(", "),
            "0.0.0.0/0".to_string(),
            "allow-partners".to_string(),
            "Partner ranges".to_string(),
        ]);
        let mut report = ReportWorkbook::new();
        report.push(rules);

        let bytes = XlsxEncoder::default().encode(&report).unwrap();
        let sheets = read_back(bytes);

        let cell = &sheets[0].1[1][1];
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS);
        assert!(cell.starts_with("10.0.0.0/24, 10.0.1.0/24"));
        assert!(cell.ends_with(TRUNCATION_MARKER));
        assert_eq!(sheets[0].1[1][3], "allow-partners");
    }
}
