//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::drawing::{read_drawing_xml, rels_path, resolve_target};
use crate::error::{XlsxError, XlsxResult};
use crate::styles::{attr_value, read_styles_xml};
use sheetforge_core::image::{emu_per_pixel, Extent, ImageProbe};
use sheetforge_core::{
    column_number, parse_reference, CatalogSettings, CellAddress, CellRange, CellValue,
    FieldBinding, ImageFormat, ImagePlacement, RawCell, RawCellType, RawRow, RawSheet, Record,
    RecordImporter, Row, StyleCatalog, Workbook, Worksheet,
};

const REL_WORKSHEET: &str = "/worksheet";
const REL_DRAWING: &str = "/drawing";
const REL_IMAGE: &str = "/image";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode characters XML cannot carry, such as
/// `_x000d_` for a carriage return.
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("_x") {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.get(6..7) == Some("_"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// One entry of a relationships part, with its target resolved to a package path
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// A worksheet part as stored
#[derive(Debug, Default)]
struct ParsedSheet {
    rows: Vec<RawRow>,
    heights: HashMap<u32, f64>,
    merges: Vec<CellRange>,
}

/// One sheet's raw cells together with what is needed to decode them
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub catalog: StyleCatalog,
    pub shared_strings: Vec<String>,
    pub sheet: RawSheet,
}

impl RawDocument {
    /// Convert the sheet's data rows into records
    pub fn import(&self, bindings: &[FieldBinding]) -> XlsxResult<Vec<Record>> {
        let records = RecordImporter::new(bindings, &self.catalog, &self.shared_strings)
            .import(&self.sheet)?;
        Ok(records)
    }
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        Self::read_file_with_settings(path, CatalogSettings::default())
    }

    /// Read a workbook from a file path with custom catalog settings
    pub fn read_file_with_settings<P: AsRef<Path>>(
        path: P,
        settings: CatalogSettings,
    ) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read_with_settings(file, settings)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        Self::read_with_settings(reader, CatalogSettings::default())
    }

    /// Read a workbook, restoring its catalog, sheets, merges, row heights and images
    pub fn read_with_settings<R: Read + Seek>(
        reader: R,
        settings: CatalogSettings,
    ) -> XlsxResult<Workbook> {
        let mut archive = Self::open_archive(reader)?;

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let catalog = Self::read_styles(&mut archive, settings)?;
        let mut workbook = Workbook::with_catalog(catalog);

        for (name, path) in Self::sheet_paths(&mut archive)? {
            let parsed = Self::read_worksheet(&mut archive, &path)?;
            let mut sheet = Worksheet::new(&name);

            for raw_row in &parsed.rows {
                let mut row = Row::new(raw_row.index)
                    .with_height(parsed.heights.get(&raw_row.index).copied());
                for (position, raw) in raw_row.cells.iter().enumerate() {
                    let column = Self::cell_column(raw, position)?;
                    let value = Self::cell_value(raw, &shared_strings);
                    row.push(column, value, raw.style_index);
                }
                sheet.insert_row(row);
            }

            for range in parsed.merges {
                sheet.add_merge(range);
            }

            Self::read_worksheet_images(&mut archive, &path, &mut sheet)?;

            debug!(
                "loaded sheet '{}': {} rows, {} merges, {} images",
                name,
                sheet.row_count(),
                sheet.merges().len(),
                sheet.images().len()
            );
            workbook.add_worksheet(sheet)?;
        }

        Ok(workbook)
    }

    /// Read one sheet's stored cells, by name or the first sheet
    pub fn read_raw_file<P: AsRef<Path>>(
        path: P,
        sheet_name: Option<&str>,
        settings: CatalogSettings,
    ) -> XlsxResult<RawDocument> {
        let file = File::open(path)?;
        Self::read_raw(file, sheet_name, settings)
    }

    /// Read one sheet's stored cells, by name or the first sheet
    ///
    /// Sheet names are matched case-insensitively.
    pub fn read_raw<R: Read + Seek>(
        reader: R,
        sheet_name: Option<&str>,
        settings: CatalogSettings,
    ) -> XlsxResult<RawDocument> {
        let mut archive = Self::open_archive(reader)?;

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let catalog = Self::read_styles(&mut archive, settings)?;

        let sheets = Self::sheet_paths(&mut archive)?;
        let (name, path) = match sheet_name {
            Some(wanted) => sheets
                .into_iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| sheetforge_core::Error::SheetNotFound(wanted.to_string()))?,
            None => sheets
                .into_iter()
                .next()
                .ok_or_else(|| XlsxError::InvalidFormat("workbook has no sheets".into()))?,
        };

        let parsed = Self::read_worksheet(&mut archive, &path)?;
        Ok(RawDocument {
            catalog,
            shared_strings,
            sheet: RawSheet {
                name,
                rows: parsed.rows,
            },
        })
    }

    fn open_archive<R: Read + Seek>(reader: R) -> XlsxResult<zip::ZipArchive<R>> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }
        Ok(archive)
    }

    /// Sheet names paired with their part paths, in workbook order
    fn sheet_paths<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let sheet_info = Self::read_workbook_xml(archive)?;
        let rels = Self::read_relationships(archive, "xl/workbook.xml")?
            .ok_or_else(|| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut sheets = Vec::with_capacity(sheet_info.len());
        for (name, r_id) in sheet_info {
            match rels
                .iter()
                .find(|rel| rel.id == r_id && rel.rel_type.ends_with(REL_WORKSHEET))
            {
                Some(rel) => sheets.push((name, rel.target.clone())),
                None => warn!("sheet '{}' has no worksheet part ({})", name, r_id),
            }
        }
        Ok(sheets)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs repeat the text and are not part of the value
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => {
                        in_t = true;
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => {
                        in_t = false;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        settings: CatalogSettings,
    ) -> XlsxResult<StyleCatalog> {
        let file = match archive.by_name("xl/styles.xml") {
            Ok(f) => f,
            Err(_) => return Ok(StyleCatalog::with_settings(settings)),
        };
        read_styles_xml(file, settings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"r:id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read the relationships of a part; `None` when the part has none
    fn read_relationships<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_path: &str,
    ) -> XlsxResult<Option<Vec<Relationship>>> {
        let file = match archive.by_name(&rels_path(part_path)) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        rels.push(Relationship {
                            id,
                            target: resolve_target(part_path, &target),
                            rel_type,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Some(rels))
    }

    /// Read a worksheet part: rows of raw cells, custom heights and merges
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> XlsxResult<ParsedSheet> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        // Text is not trimmed: cell strings keep their whitespace
        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut parsed = ParsedSheet::default();

        let mut current_row: Option<RawRow> = None;
        let mut current_cell: Option<RawCell> = None;
        let mut in_value = false;
        let mut in_inline_text = false;
        let mut last_row_index = 0u32;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::open_row(&e, last_row_index, &mut parsed);
                        last_row_index = row.index;
                        current_row = Some(row);
                    }
                    b"c" => current_cell = Some(Self::open_cell(&e)),
                    b"v" if current_cell.is_some() => in_value = true,
                    b"t" if current_cell.is_some() => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::open_row(&e, last_row_index, &mut parsed);
                        last_row_index = row.index;
                        parsed.rows.push(row);
                    }
                    b"c" => {
                        if let Some(row) = current_row.as_mut() {
                            row.cells.push(Self::open_cell(&e));
                        }
                    }
                    b"t" => {
                        // <t/> inside an inline string is an empty value
                        if let Some(cell) = current_cell.as_mut() {
                            cell.value.get_or_insert_with(String::new);
                        }
                    }
                    b"mergeCell" => {
                        if let Some(reference) = attr_value(&e, b"ref") {
                            parsed.merges.push(CellRange::parse(&reference)?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    let text = e.unescape()?;
                    if let Some(cell) = current_cell.as_mut() {
                        cell.value
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"v" => in_value = false,
                    b"t" => {
                        in_inline_text = false;
                        if let Some(cell) = current_cell.as_mut() {
                            cell.value.get_or_insert_with(String::new);
                        }
                    }
                    b"c" => {
                        if let (Some(cell), Some(row)) = (current_cell.take(), current_row.as_mut())
                        {
                            row.cells.push(cell);
                        }
                    }
                    b"row" => {
                        if let Some(row) = current_row.take() {
                            parsed.rows.push(row);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(parsed)
    }

    fn open_row(e: &BytesStart<'_>, last_row_index: u32, parsed: &mut ParsedSheet) -> RawRow {
        let index = attr_value(e, b"r")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(last_row_index + 1);
        let custom_height = attr_value(e, b"customHeight")
            .map_or(false, |s| s == "1" || s == "true");
        if custom_height {
            if let Some(ht) = attr_value(e, b"ht").and_then(|s| s.parse::<f64>().ok()) {
                parsed.heights.insert(index, ht);
            }
        }
        RawRow {
            index,
            cells: Vec::new(),
        }
    }

    fn open_cell(e: &BytesStart<'_>) -> RawCell {
        RawCell {
            reference: attr_value(e, b"r"),
            data_type: attr_value(e, b"t").and_then(|t| RawCellType::from_attr(&t)),
            style_index: attr_value(e, b"s").and_then(|s| s.parse::<u32>().ok()),
            value: None,
        }
    }

    /// Column of a stored cell, from its reference or its position in the row
    fn cell_column(cell: &RawCell, position: usize) -> XlsxResult<u32> {
        match cell
            .reference
            .as_deref()
            .and_then(|r| parse_reference(r).column)
        {
            Some(letters) => Ok(column_number(&letters)?),
            None => Ok(position as u32 + 1),
        }
    }

    /// Value a stored cell holds in the document model
    fn cell_value(cell: &RawCell, shared_strings: &[String]) -> CellValue {
        let raw = cell.value.clone().unwrap_or_default();
        match cell.data_type {
            None | Some(RawCellType::Number) => {
                if cell.value.is_some() {
                    CellValue::Number(raw)
                } else {
                    CellValue::text("")
                }
            }
            Some(RawCellType::SharedString) => {
                match raw.trim().parse::<usize>().ok().and_then(|i| shared_strings.get(i)) {
                    Some(s) => CellValue::Text(s.clone()),
                    None => {
                        warn!("shared string index '{}' out of range", raw);
                        CellValue::Text(raw)
                    }
                }
            }
            Some(RawCellType::Boolean) => CellValue::Boolean(raw != "0"),
            Some(_) => CellValue::Text(raw),
        }
    }

    /// Restore the pictures of a sheet from its drawing part
    fn read_worksheet_images<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        sheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        let Some(sheet_rels) = Self::read_relationships(archive, sheet_path)? else {
            return Ok(());
        };

        for drawing in sheet_rels
            .iter()
            .filter(|rel| rel.rel_type.ends_with(REL_DRAWING))
        {
            let anchors = match archive.by_name(&drawing.target) {
                Ok(file) => read_drawing_xml(file)?,
                Err(_) => return Err(XlsxError::MissingPart(drawing.target.clone())),
            };
            let media_rels =
                Self::read_relationships(archive, &drawing.target)?.unwrap_or_default();

            for anchor in anchors {
                let Some(media) = media_rels
                    .iter()
                    .find(|rel| rel.id == anchor.embed && rel.rel_type.ends_with(REL_IMAGE))
                else {
                    warn!("picture {} has no media part", anchor.id);
                    continue;
                };

                let mut data = Vec::new();
                archive
                    .by_name(&media.target)
                    .map_err(|_| XlsxError::MissingPart(media.target.clone()))?
                    .read_to_end(&mut data)?;

                let extension = media.target.rsplit('.').next().unwrap_or_default();
                let probed = ImageProbe::probe(&data).ok();
                let Some(format) = probed
                    .as_ref()
                    .map(|info| info.format)
                    .or_else(|| ImageFormat::from_extension(extension))
                else {
                    warn!("picture {} has unknown media type {}", anchor.id, media.target);
                    continue;
                };

                // Pixel size follows from the stored extent at the image's own resolution
                let resolution = probed.map(|info| info.resolution).unwrap_or_default();
                let to_px = |emu: i64, dpi: f64| {
                    u32::try_from(emu / emu_per_pixel(dpi).max(1)).unwrap_or(0)
                };
                let extent = Extent {
                    width_px: to_px(anchor.cx, resolution.horizontal),
                    height_px: to_px(anchor.cy, resolution.vertical),
                    cx: anchor.cx,
                    cy: anchor.cy,
                };

                let address = CellAddress::new(anchor.col + 1, anchor.row + 1)?;
                sheet.push_image(ImagePlacement {
                    id: anchor.id,
                    column: address.column,
                    row: address.row,
                    extent,
                    format,
                    description: anchor.description,
                    data,
                });
            }
        }

        Ok(())
    }
}
