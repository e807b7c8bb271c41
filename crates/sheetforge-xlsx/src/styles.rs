//! styles.xml reading and writing
//!
//! The catalog is written verbatim: every font, fill, border, number format
//! and cell format appears at its catalog index, so cell `s` attributes are the
//! catalog's own style indices. Reading appends the entries of a package to an
//! empty catalog in document order, which restores those indices.

use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheetforge_core::style::{
    Alignment, Border, BorderEdge, BorderLineStyle, CatalogSettings, Color, Fill, Font,
    HorizontalAlignment, NumberFormat, PatternType, StyleCatalog, StyleRecord, VerticalAlignment,
};

/// Render the catalog as a styles.xml part
pub(crate) fn write_styles_xml(catalog: &StyleCatalog) -> String {
    let mut xml = String::new();
    xml.push_str(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    let numfmts = catalog.number_formats();
    if !numfmts.is_empty() {
        xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
        for fmt in numfmts {
            xml.push_str(&format!(
                "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                fmt.id,
                escape_xml(&fmt.code)
            ));
        }
        xml.push_str("\n  </numFmts>");
    }

    xml.push_str(&format!("\n  <fonts count=\"{}\">", catalog.fonts().len()));
    for font in catalog.fonts() {
        xml.push_str("\n    ");
        xml.push_str(&write_font(font));
    }
    xml.push_str("\n  </fonts>");

    xml.push_str(&format!("\n  <fills count=\"{}\">", catalog.fills().len()));
    for fill in catalog.fills() {
        xml.push_str("\n    ");
        xml.push_str(&write_fill(fill));
    }
    xml.push_str("\n  </fills>");

    xml.push_str(&format!(
        "\n  <borders count=\"{}\">",
        catalog.borders().len()
    ));
    for border in catalog.borders() {
        xml.push_str("\n    ");
        xml.push_str(&write_border(border));
    }
    xml.push_str("\n  </borders>");

    // cellStyleXfs (required)
    xml.push_str(
        r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
    );

    xml.push_str(&format!(
        "\n  <cellXfs count=\"{}\">",
        catalog.cell_formats().len()
    ));
    for record in catalog.cell_formats() {
        xml.push_str("\n    ");
        xml.push_str(&write_xf(record));
    }
    xml.push_str("\n  </cellXfs>");

    // cellStyles (required)
    xml.push_str(
        r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>"#,
    );

    xml.push_str("\n</styleSheet>");
    xml
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn write_color(tag: &str, color: &Color) -> String {
    match color {
        Color::Auto => format!("<{tag} auto=\"1\"/>"),
        Color::Indexed(i) => format!("<{tag} indexed=\"{}\"/>", i),
        other => format!(
            "<{tag} rgb=\"{}\"/>",
            other.to_argb_hex().unwrap_or_default()
        ),
    }
}

fn write_font(font: &Font) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    if font.underline {
        s.push_str("<u/>");
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &Fill) -> String {
    match fill {
        Fill::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        Fill::Pattern {
            pattern,
            foreground,
            background,
        } => {
            if foreground.is_none() && background.is_none() {
                return format!(
                    "<fill><patternFill patternType=\"{}\"/></fill>",
                    pattern.as_str()
                );
            }
            format!(
                "<fill><patternFill patternType=\"{}\">{}{}</patternFill></fill>",
                pattern.as_str(),
                foreground
                    .as_ref()
                    .map(|c| write_color("fgColor", c))
                    .unwrap_or_default(),
                background
                    .as_ref()
                    .map(|c| write_color("bgColor", c))
                    .unwrap_or_default(),
            )
        }
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        None => format!("<{tag}/>"),
        Some(e) => format!(
            "<{tag} style=\"{}\">{}</{tag}>",
            e.style.as_str(),
            write_color("color", &e.color)
        ),
    }
}

fn write_border(border: &Border) -> String {
    let mut s = String::from("<border>");
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str("<diagonal/>");
    s.push_str("</border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    let mut s = String::from("<alignment");
    if let Some(h) = al.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", h.as_str()));
    }
    if let Some(v) = al.vertical {
        s.push_str(&format!(" vertical=\"{}\"", v.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s.push_str("/>");
    s
}

fn write_xf(record: &StyleRecord) -> String {
    let mut attrs = String::new();
    if record.apply_number_format {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if record.font_id != 0 {
        attrs.push_str(" applyFont=\"1\"");
    }
    if record.fill_id != 0 {
        attrs.push_str(" applyFill=\"1\"");
    }
    if record.border_id != 0 {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if record.alignment.is_some() {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        record.number_format_id, record.font_id, record.fill_id, record.border_id, attrs
    );

    match &record.alignment {
        Some(al) => {
            s.push('>');
            s.push_str(&write_alignment(al));
            s.push_str("</xf>");
        }
        None => s.push_str("/>"),
    }
    s
}

// === Reading ===

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
    Diagonal,
}

/// Parse styles.xml into a catalog holding exactly the package's entries
pub(crate) fn read_styles_xml<R: Read>(
    reader: R,
    settings: CatalogSettings,
) -> XlsxResult<StyleCatalog> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut parser = StylesParser::new(settings);
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e)?,
            Ok(Event::Empty(e)) => {
                parser.open(&e)?;
                parser.close(e.name().as_ref());
            }
            Ok(Event::End(e)) => parser.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.finish())
}

struct StylesParser {
    catalog: StyleCatalog,
    font: Option<Font>,
    fill: Option<(PatternType, Option<Color>, Option<Color>)>,
    border: Option<Border>,
    side: Option<Side>,
    xf: Option<StyleRecord>,
    in_cell_xfs: bool,
    in_dxfs: bool,
}

impl StylesParser {
    fn new(settings: CatalogSettings) -> Self {
        Self {
            catalog: StyleCatalog::empty(settings),
            font: None,
            fill: None,
            border: None,
            side: None,
            xf: None,
            in_cell_xfs: false,
            in_dxfs: false,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let name = e.name();
        if name.as_ref() == b"dxfs" {
            self.in_dxfs = true;
        }
        // Differential formats are not part of the catalog
        if self.in_dxfs {
            return Ok(());
        }

        match name.as_ref() {
            b"numFmt" => {
                let id = attr_value(e, b"numFmtId").and_then(|s| s.parse::<u32>().ok());
                let code = attr_value(e, b"formatCode");
                match (id, code) {
                    (Some(id), Some(code)) => {
                        self.catalog
                            .register_number_format(NumberFormat::new(id, code));
                    }
                    _ => return Err(XlsxError::Parse("numFmt without id or code".into())),
                }
            }

            b"font" => self.font = Some(Font::default()),
            b"b" => self.with_font(|f| f.bold = true),
            b"i" => self.with_font(|f| f.italic = true),
            b"strike" => self.with_font(|f| f.strikethrough = true),
            b"u" => {
                let single = attr_value(e, b"val").map_or(true, |v| v != "none");
                self.with_font(|f| f.underline = single);
            }
            b"sz" => {
                if let Some(size) = attr_value(e, b"val").and_then(|v| v.parse::<f64>().ok()) {
                    self.with_font(|f| f.size = size);
                }
            }
            b"name" => {
                if let Some(val) = attr_value(e, b"val") {
                    self.with_font(|f| f.name = val);
                }
            }

            b"fill" => self.fill = Some((PatternType::None, None, None)),
            b"patternFill" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.0 = attr_value(e, b"patternType")
                        .map(|v| PatternType::from_name(&v))
                        .unwrap_or(PatternType::None);
                }
            }
            b"fgColor" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.1 = Some(parse_color_attrs(e));
                }
            }
            b"bgColor" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.2 = Some(parse_color_attrs(e));
                }
            }

            b"border" => self.border = Some(Border::default()),
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => {
                if let Some(border) = self.border.as_mut() {
                    let side = match name.as_ref() {
                        b"left" => Side::Left,
                        b"right" => Side::Right,
                        b"top" => Side::Top,
                        b"bottom" => Side::Bottom,
                        _ => Side::Diagonal,
                    };
                    let style = attr_value(e, b"style")
                        .map(|v| BorderLineStyle::from_name(&v))
                        .unwrap_or_default();
                    if let Some(slot) = edge_slot(border, side) {
                        *slot = BorderEdge::new(style, Color::Auto);
                    }
                    self.side = Some(side);
                }
            }
            b"color" => {
                let color = parse_color_attrs(e);
                if let Some(font) = self.font.as_mut() {
                    font.color = color;
                } else if let (Some(border), Some(side)) = (self.border.as_mut(), self.side) {
                    if let Some(Some(edge)) = edge_slot(border, side) {
                        edge.color = color;
                    }
                }
            }

            b"cellXfs" => self.in_cell_xfs = true,
            b"xf" if self.in_cell_xfs => {
                self.xf = Some(StyleRecord {
                    number_format_id: id_attr(e, b"numFmtId"),
                    font_id: id_attr(e, b"fontId"),
                    fill_id: id_attr(e, b"fillId"),
                    border_id: id_attr(e, b"borderId"),
                    alignment: None,
                    apply_number_format: attr_value(e, b"applyNumberFormat")
                        .map_or(false, |v| v == "1" || v == "true"),
                });
            }
            b"alignment" => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.alignment = Some(parse_alignment(e));
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if name == b"dxfs" {
            self.in_dxfs = false;
            return;
        }
        if self.in_dxfs {
            return;
        }

        match name {
            b"font" => {
                if let Some(font) = self.font.take() {
                    self.catalog.insert_font(font);
                }
            }
            b"fill" => {
                if let Some((pattern, fg, bg)) = self.fill.take() {
                    let fill = match pattern {
                        PatternType::None => Fill::None,
                        pattern => Fill::Pattern {
                            pattern,
                            foreground: fg,
                            background: bg,
                        },
                    };
                    self.catalog.insert_fill(fill);
                }
            }
            b"border" => {
                if let Some(border) = self.border.take() {
                    self.catalog.insert_border(border);
                }
                self.side = None;
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => self.side = None,
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    self.catalog.insert_cell_format(xf);
                }
            }
            b"cellXfs" => self.in_cell_xfs = false,
            _ => {}
        }
    }

    fn with_font(&mut self, apply: impl FnOnce(&mut Font)) {
        if let Some(font) = self.font.as_mut() {
            apply(font);
        }
    }

    fn finish(mut self) -> StyleCatalog {
        // Cells always resolve style 0
        if self.catalog.cell_formats().is_empty() {
            self.catalog.insert_cell_format(StyleRecord::default());
        }
        self.catalog
    }
}

fn edge_slot(border: &mut Border, side: Side) -> Option<&mut Option<BorderEdge>> {
    match side {
        Side::Left => Some(&mut border.left),
        Side::Right => Some(&mut border.right),
        Side::Top => Some(&mut border.top),
        Side::Bottom => Some(&mut border.bottom),
        Side::Diagonal => None,
    }
}

pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

fn id_attr(e: &BytesStart<'_>, key: &[u8]) -> u32 {
    attr_value(e, key)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    // Priority: rgb > indexed > auto
    if let Some(rgb) = attr_value(e, b"rgb") {
        match Color::from_hex(&rgb) {
            Some(Color::Argb { a: 0xFF, r, g, b }) => return Color::Rgb { r, g, b },
            Some(color) => return color,
            None => {}
        }
    }
    if let Some(i) = attr_value(e, b"indexed").and_then(|s| s.parse::<u8>().ok()) {
        return Color::Indexed(i);
    }
    Color::Auto
}

fn parse_alignment(e: &BytesStart<'_>) -> Alignment {
    let mut align = Alignment::default();
    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"horizontal" => align.horizontal = HorizontalAlignment::from_name(&val),
            b"vertical" => align.vertical = VerticalAlignment::from_name(&val),
            b"wrapText" => align.wrap_text = val.as_ref() == "1" || val.as_ref() == "true",
            b"indent" => align.indent = val.parse::<u8>().unwrap_or(0),
            b"textRotation" => align.rotation = val.parse::<i16>().unwrap_or(0),
            _ => {}
        }
    }
    align
}
