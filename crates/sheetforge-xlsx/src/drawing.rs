//! Drawing parts: one `oneCellAnchor` picture per image placement

use std::io::{BufReader, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{attr_value, escape_xml};
use sheetforge_core::ImagePlacement;

const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Relationship id of the n-th picture (0-based) inside a drawing part
pub(crate) fn embed_rel_id(position: usize) -> String {
    format!("rId{}", position + 1)
}

/// Render the drawing part for a sheet's placements
pub(crate) fn drawing_xml(images: &[ImagePlacement]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    for (position, image) in images.iter().enumerate() {
        xml.push_str("\n  ");
        xml.push_str(&anchor_xml(image, &embed_rel_id(position)));
    }
    xml.push_str("\n</xdr:wsDr>");
    xml
}

fn anchor_xml(image: &ImagePlacement, embed: &str) -> String {
    let mut out = String::from("<xdr:oneCellAnchor>");
    out.push_str(&format!(
        "<xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>",
        image.anchor_column(),
        image.anchor_row()
    ));
    out.push_str(&format!(
        r#"<xdr:ext cx="{}" cy="{}"/>"#,
        image.extent.cx, image.extent.cy
    ));
    out.push_str(&pic_xml(image, embed));
    out.push_str("<xdr:clientData/></xdr:oneCellAnchor>");
    out
}

fn pic_xml(image: &ImagePlacement, embed: &str) -> String {
    let id = image.id;
    let descr = escape_xml(&image.description);
    let (cx, cy) = (image.extent.cx, image.extent.cy);
    format!(
        r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{id}" name="Picture {id}" descr="{descr}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{embed}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#
    )
}

/// Relationships of a drawing part, pointing at its media
pub(crate) fn drawing_rels_xml(media_targets: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (position, target) in media_targets.iter().enumerate() {
        xml.push_str(&format!(
            "\n    <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
            embed_rel_id(position),
            REL_IMAGE,
            escape_xml(target)
        ));
    }
    xml.push_str("\n</Relationships>");
    xml
}

/// Path of the relationships part that belongs to `part_path`
pub(crate) fn rels_path(part_path: &str) -> String {
    let (dir, file) = part_path.rsplit_once('/').unwrap_or(("", part_path));
    let dir = if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    };
    format!("{dir}_rels/{file}.rels")
}

/// Resolve a relationship target against the part that declares it
pub(crate) fn resolve_target(part_path: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = part_path.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// A picture anchor as stored in a drawing part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AnchorRecord {
    pub id: u32,
    /// Zero-based anchor column
    pub col: u32,
    /// Zero-based anchor row
    pub row: u32,
    pub cx: i64,
    pub cy: i64,
    pub description: String,
    pub embed: String,
}

/// Read the one-cell picture anchors of a drawing part
///
/// Two-cell and absolute anchors are not produced by the writer and are
/// skipped.
pub(crate) fn read_drawing_xml<R: Read>(reader: R) -> XlsxResult<Vec<AnchorRecord>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut anchors = Vec::new();
    let mut current: Option<AnchorRecord> = None;
    let mut in_from = false;
    let mut field: Option<&'static str> = None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"oneCellAnchor" => current = Some(AnchorRecord::default()),
                b"from" if current.is_some() => in_from = true,
                b"col" if in_from => field = Some("col"),
                b"row" if in_from => field = Some("row"),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let Some(anchor) = current.as_mut() else {
                    buf.clear();
                    continue;
                };
                match e.local_name().as_ref() {
                    // The anchor extent comes before the picture's own xfrm extent
                    b"ext" if anchor.cx == 0 && anchor.cy == 0 => {
                        anchor.cx = attr_value(&e, b"cx")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                        anchor.cy = attr_value(&e, b"cy")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                    }
                    b"cNvPr" => {
                        anchor.id = attr_value(&e, b"id")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                        anchor.description = attr_value(&e, b"descr").unwrap_or_default();
                    }
                    b"blip" => {
                        anchor.embed = attr_value(&e, b"r:embed").unwrap_or_default();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(name), Some(anchor)) = (field, current.as_mut()) {
                    let text = e.unescape()?;
                    let value = text.trim().parse::<u32>().map_err(|_| {
                        XlsxError::Parse(format!("invalid anchor {}: {}", name, text))
                    })?;
                    match name {
                        "col" => anchor.col = value,
                        _ => anchor.row = value,
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"col" | b"row" => field = None,
                b"from" => in_from = false,
                b"oneCellAnchor" => {
                    if let Some(anchor) = current.take() {
                        anchors.push(anchor);
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

    Ok(anchors)
}
