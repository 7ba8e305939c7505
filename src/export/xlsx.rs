use rust_xlsxwriter::{Format, Workbook};

use super::{Cell, ExportError, Sheet};

pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Submissions";

/// Render `sheet` as an xlsx workbook with a bold header row.
pub fn render(sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let row_num = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col as u16, f64::from(*n))?;
                }
                Cell::Text(text) => {
                    worksheet.write_string(row_num, col as u16, text)?;
                }
            }
        }
    }

    for (col, width) in sheet.column_widths().into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}
