//! XLSX writer

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use log::debug;

use crate::drawing::{drawing_rels_xml, drawing_xml};
use crate::error::{XlsxError, XlsxResult};
use crate::styles::{escape_xml, write_styles_xml};
use sheetforge_core::{CellValue, Workbook, Worksheet};

/// Package location of one sheet's drawing and media
struct DrawingParts {
    sheet_index: usize,
    drawing_number: usize,
    media: Vec<String>,
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        // Number drawings and media across the whole package
        let mut drawings = Vec::new();
        let mut media_number = 0usize;
        for (i, sheet) in workbook.worksheets().enumerate() {
            if sheet.images().is_empty() {
                continue;
            }
            let media = sheet
                .images()
                .iter()
                .map(|image| {
                    media_number += 1;
                    format!("image{}.{}", media_number, image.format.extension())
                })
                .collect();
            drawings.push(DrawingParts {
                sheet_index: i,
                drawing_number: drawings.len() + 1,
                media,
            });
        }

        // Write [Content_Types].xml
        Self::write_content_types(&mut zip, workbook, &drawings)?;

        // Write _rels/.rels
        Self::write_root_rels(&mut zip)?;

        // Write xl/workbook.xml
        Self::write_workbook_xml(&mut zip, workbook)?;

        // Write xl/_rels/workbook.xml.rels
        Self::write_workbook_rels(&mut zip, workbook)?;

        // Write xl/styles.xml
        Self::write_styles_xml(&mut zip, workbook)?;

        // Write worksheets and their drawings
        for (i, sheet) in workbook.worksheets().enumerate() {
            let parts = drawings.iter().find(|d| d.sheet_index == i);
            Self::write_worksheet(&mut zip, sheet, i, parts.is_some())?;

            if let Some(parts) = parts {
                Self::write_worksheet_rels(&mut zip, i, parts.drawing_number)?;
                Self::write_drawing(&mut zip, sheet, parts)?;
            }
        }

        zip.finish()?;
        debug!(
            "wrote workbook: {} sheets, {} drawings",
            workbook.sheet_count(),
            drawings.len()
        );
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        drawings: &[DrawingParts],
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>"#,
        );

        // One default per media extension in use
        let formats: BTreeSet<_> = workbook
            .worksheets()
            .flat_map(|sheet| sheet.images().iter().map(|image| image.format))
            .map(|format| (format.extension(), format.content_type()))
            .collect();
        for (extension, content_type) in formats {
            content.push_str(&format!(
                r#"
    <Default Extension="{}" ContentType="{}"/>"#,
                extension, content_type
            ));
        }

        content.push_str(
            r#"
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        // Add an override for each worksheet
        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        for parts in drawings {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/drawings/drawing{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
                parts.drawing_number
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles relationship
        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        content.push_str(
            r#"
</Relationships>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_styles_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/styles.xml", options)?;
        let xml = write_styles_xml(workbook.catalog());
        zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        has_drawing: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheetData>"#,
        );

        for row in sheet.rows() {
            let height_attr = row
                .height
                .map(|h| format!(" ht=\"{}\" customHeight=\"1\"", h))
                .unwrap_or_default();
            if row.cells.is_empty() {
                content.push_str(&format!("\n        <row r=\"{}\"{}/>", row.index, height_attr));
                continue;
            }
            content.push_str(&format!("\n        <row r=\"{}\"{}>", row.index, height_attr));

            // Cells must appear in column order
            let mut cells: Vec<_> = row.cells.iter().collect();
            cells.sort_by_key(|c| c.address.column);

            for cell in cells {
                let cell_ref = cell.reference();
                let style_attr = cell
                    .style_index
                    .map(|s| format!(" s=\"{}\"", s))
                    .unwrap_or_default();

                match &cell.value {
                    CellValue::Number(n) => {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{}><v>{}</v></c>",
                            cell_ref,
                            style_attr,
                            escape_xml(n)
                        ));
                    }
                    CellValue::Text(s) => {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                            cell_ref,
                            style_attr,
                            escape_xml(s)
                        ));
                    }
                    CellValue::Boolean(b) => {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                            cell_ref,
                            style_attr,
                            if *b { 1 } else { 0 }
                        ));
                    }
                }
            }
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>");

        // Write merged cells (if any)
        let merged_regions = sheet.merges();
        if !merged_regions.is_empty() {
            content.push_str(&format!(
                "\n    <mergeCells count=\"{}\">",
                merged_regions.len()
            ));
            // Always a two-corner reference, even for a single cell
            for range in merged_regions {
                content.push_str(&format!(
                    "\n        <mergeCell ref=\"{}:{}\"/>",
                    range.from, range.to
                ));
            }
            content.push_str("\n    </mergeCells>");
        }

        if has_drawing {
            content.push_str("\n    <drawing r:id=\"rId1\"/>");
        }

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write the worksheet relationships file pointing at its drawing
    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet_index: usize,
        drawing_number: usize,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(
            format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1),
            options,
        )?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing{}.xml"/>
</Relationships>"#,
            drawing_number
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write a drawing part, its relationships and the media it embeds
    fn write_drawing<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        parts: &DrawingParts,
    ) -> XlsxResult<()> {
        if parts.media.len() != sheet.images().len() {
            return Err(XlsxError::InvalidFormat(format!(
                "sheet '{}' has {} images but {} media parts",
                sheet.name(),
                sheet.images().len(),
                parts.media.len()
            )));
        }

        zip.start_file(
            format!("xl/drawings/drawing{}.xml", parts.drawing_number),
            zip::write::SimpleFileOptions::default(),
        )?;
        zip.write_all(drawing_xml(sheet.images()).as_bytes())?;

        let targets: Vec<String> = parts
            .media
            .iter()
            .map(|name| format!("../media/{}", name))
            .collect();
        zip.start_file(
            format!("xl/drawings/_rels/drawing{}.xml.rels", parts.drawing_number),
            zip::write::SimpleFileOptions::default(),
        )?;
        zip.write_all(drawing_rels_xml(&targets).as_bytes())?;

        for (image, name) in sheet.images().iter().zip(&parts.media) {
            zip.start_file(
                format!("xl/media/{}", name),
                zip::write::SimpleFileOptions::default(),
            )?;
            zip.write_all(&image.data)?;
        }

        Ok(())
    }
}
