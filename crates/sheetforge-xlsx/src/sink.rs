//! Persistence of finished workbooks as XLSX files

use std::path::{Path, PathBuf};

use sheetforge_core::{PersistenceSink, Workbook};

use crate::error::XlsxError;
use crate::writer::XlsxWriter;

/// Writes each persisted workbook to a fixed file path
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for XlsxSink {
    type Error = XlsxError;

    fn persist(&mut self, workbook: &Workbook) -> Result<(), XlsxError> {
        XlsxWriter::write_file(workbook, &self.path)
    }
}
