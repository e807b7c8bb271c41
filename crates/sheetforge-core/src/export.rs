//! One-shot table export without deferred styling

use log::{debug, warn};

use crate::assembler::FieldDescriptor;
use crate::cell::{CellAddress, CellValue};
use crate::codec::{classify, FieldValue};
use crate::error::Result;
use crate::image::ImageSource;
use crate::row::Row;
use crate::workbook::Workbook;
use crate::worksheet::Worksheet;

/// Write `items` as a new sheet: a caption row, then one row per item
///
/// Image fields are embedded as each row is written; a missing source leaves
/// the error text in the cell. No regions or merges are produced. Returns the
/// index of the new sheet.
pub fn export_table<T>(
    workbook: &mut Workbook,
    items: &[T],
    fields: &[FieldDescriptor<T>],
    sheet_name: &str,
    images: &dyn ImageSource,
) -> Result<usize> {
    workbook.validate_sheet_name(sheet_name)?;
    let mut sheet = Worksheet::new(sheet_name);

    let mut header = Row::new(1);
    for (position, field) in fields.iter().enumerate() {
        header.push(position as u32 + 1, CellValue::text(field.caption()), None);
    }
    sheet.insert_row(header);

    for (offset, item) in items.iter().enumerate() {
        let index = offset as u32 + 2;
        let mut row = Row::new(index);

        for (position, field) in fields.iter().enumerate() {
            let column = position as u32 + 1;
            let value = field.value(item);

            let source = value.to_string();
            let classified = match field.image {
                Some(image) if !source.is_empty() => {
                    let address = CellAddress::new(column, index)?;
                    let text = match images.load(&source) {
                        Ok(data) => {
                            sheet.place_image(address, data, source.as_str(), image.width_px)?;
                            String::new()
                        }
                        Err(e) if e.is_missing_image_source() => {
                            warn!("image at {}: {}", address, e);
                            e.to_string()
                        }
                        Err(e) => return Err(e),
                    };
                    classify(&FieldValue::Text(text))
                }
                _ => classify(&value),
            };

            row.push(column, classified.value, classified.style_index);
        }

        sheet.insert_row(row);
    }

    debug!(
        "exported {} rows to sheet '{}' ({} images)",
        items.len(),
        sheet_name,
        sheet.images().len()
    );
    workbook.add_worksheet(sheet)
}
