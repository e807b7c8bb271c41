//! File-level entry points: build a sheet and save it, export a table, read records

use std::path::Path;

use log::{debug, info};

use sheetforge_core::{
    export_table, CatalogSettings, CellStyle, FieldBinding, FieldDescriptor, FieldValue,
    FinalizeReport, FsImageSource, ImageSource, PersistenceSink, Record, SheetAssembler,
    TableSetting, Workbook,
};
use sheetforge_xlsx::{XlsxReader, XlsxResult, XlsxSink};

/// Builds one sheet row by row and saves it as an XLSX file
///
/// ```no_run
/// use sheetforge::prelude::*;
///
/// let mut builder = SheetBuilder::new();
/// builder
///     .append_text("Monthly totals", Some(CellStyle::new().with_merge_count(3)))?
///     .append_line();
/// builder.save_to_file("totals.xlsx", "Totals", true)?;
/// # Ok::<(), sheetforge::XlsxError>(())
/// ```
pub struct SheetBuilder {
    assembler: SheetAssembler,
    settings: CatalogSettings,
    images: Box<dyn ImageSource>,
}

impl Default for SheetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetBuilder {
    /// Builder with default settings, loading images from the file system
    pub fn new() -> Self {
        Self::with_settings(CatalogSettings::default())
    }

    pub fn with_settings(settings: CatalogSettings) -> Self {
        Self {
            assembler: SheetAssembler::new(),
            settings,
            images: Box::new(FsImageSource::new()),
        }
    }

    /// Load image fields through `source` instead of the file system
    pub fn with_image_source<S: ImageSource + 'static>(mut self, source: S) -> Self {
        self.images = Box::new(source);
        self
    }

    /// The underlying assembler, for inspecting queued work
    pub fn assembler(&self) -> &SheetAssembler {
        &self.assembler
    }

    /// Leave the current row empty
    pub fn append_line(&mut self) -> &mut Self {
        self.assembler.append_line();
        self
    }

    /// Write a single value into column A of the current row
    pub fn append_text<V: Into<FieldValue>>(
        &mut self,
        value: V,
        style: Option<CellStyle>,
    ) -> XlsxResult<&mut Self> {
        self.assembler.append_text(value, style)?;
        Ok(self)
    }

    /// Write a header row (unless hidden) and one row per item
    pub fn append_table<T>(
        &mut self,
        items: &[T],
        fields: &[FieldDescriptor<T>],
        setting: &TableSetting,
    ) -> XlsxResult<&mut Self> {
        self.assembler.append_table(items, fields, setting)?;
        Ok(self)
    }

    /// Finalize the sheet and write it to `path`
    ///
    /// With `overwrite_if_exists` unset and an existing file at `path`, the
    /// file is loaded and the sheet is added to it; otherwise the file holds
    /// only the new sheet.
    pub fn save_to_file<P: AsRef<Path>>(
        self,
        path: P,
        sheet_name: &str,
        overwrite_if_exists: bool,
    ) -> XlsxResult<FinalizeReport> {
        let path = path.as_ref();
        let mut workbook = open_target(path, overwrite_if_exists, &self.settings)?;

        let report = self
            .assembler
            .finalize(&mut workbook, sheet_name, self.images.as_ref())?;

        XlsxSink::new(path).persist(&workbook)?;
        info!(
            "saved sheet '{}' to {} ({} sheets)",
            sheet_name,
            path.display(),
            workbook.sheet_count()
        );
        Ok(report)
    }
}

/// Write `items` as a plain table sheet: a caption row, then one row per item
///
/// Images are embedded as rows are written and no styling is applied.
/// Existing files are appended to unless `overwrite_if_exists` is set.
pub fn export_to_file<T, P: AsRef<Path>>(
    items: &[T],
    fields: &[FieldDescriptor<T>],
    path: P,
    sheet_name: &str,
    overwrite_if_exists: bool,
) -> XlsxResult<usize> {
    let path = path.as_ref();
    let settings = CatalogSettings::default();
    let mut workbook = open_target(path, overwrite_if_exists, &settings)?;

    let index = export_table(
        &mut workbook,
        items,
        fields,
        sheet_name,
        &FsImageSource::new(),
    )?;

    XlsxSink::new(path).persist(&workbook)?;
    info!(
        "exported {} items to sheet '{}' in {}",
        items.len(),
        sheet_name,
        path.display()
    );
    Ok(index)
}

/// Read the records of a sheet (by name, or the first sheet)
pub fn read_records<P: AsRef<Path>>(
    path: P,
    sheet_name: Option<&str>,
    bindings: &[FieldBinding],
) -> XlsxResult<Vec<Record>> {
    read_records_with_settings(path, sheet_name, bindings, CatalogSettings::default())
}

/// Read the records of a sheet, decoding with custom settings
pub fn read_records_with_settings<P: AsRef<Path>>(
    path: P,
    sheet_name: Option<&str>,
    bindings: &[FieldBinding],
    settings: CatalogSettings,
) -> XlsxResult<Vec<Record>> {
    let document = XlsxReader::read_raw_file(path, sheet_name, settings)?;
    document.import(bindings)
}

/// The workbook a new sheet is added to
fn open_target(
    path: &Path,
    overwrite_if_exists: bool,
    settings: &CatalogSettings,
) -> XlsxResult<Workbook> {
    if !overwrite_if_exists && path.exists() {
        debug!("appending to existing workbook {}", path.display());
        XlsxReader::read_file_with_settings(path, settings.clone())
    } else {
        Ok(Workbook::with_settings(settings.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetforge_core::MemoryImageSource;

    #[test]
    fn test_open_target_new_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let workbook =
            open_target(&dir.path().join("none.xlsx"), false, &CatalogSettings::default())
                .unwrap();
        assert_eq!(workbook.sheet_count(), 0);
    }

    #[test]
    fn test_builder_tracks_cursor() {
        let mut builder = SheetBuilder::new().with_image_source(MemoryImageSource::new());
        builder.append_text("a", None).unwrap().append_line();
        builder.append_text(1, None).unwrap();
        assert_eq!(builder.assembler().cursor(), 4);
        assert_eq!(builder.assembler().rows().len(), 2);
    }
}
