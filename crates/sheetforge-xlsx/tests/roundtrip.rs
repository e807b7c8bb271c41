//! End-to-end tests for XLSX roundtrip (assemble -> write -> read -> verify)

use std::io::{Cursor, Read};

use pretty_assertions::assert_eq;
use sheetforge_core::{
    Alignment, BorderLineStyle, CatalogSettings, CellAddress, CellRange, CellStyle, CellValue,
    Color, FieldBinding, FieldDescriptor, Fill, Font, HorizontalAlignment, MemoryImageSource,
    SheetAssembler, TableSetting, TargetType, Workbook,
};
use rust_decimal::Decimal;
use sheetforge_xlsx::{XlsxReader, XlsxWriter};

/// PNG signature and IHDR chunk, enough for the header probe
fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(b"IEND");
    bytes.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
    bytes
}

struct Part {
    code: &'static str,
    name: &'static str,
    qty: i32,
    photo: &'static str,
}

fn parts() -> Vec<Part> {
    vec![
        Part {
            code: "B-10",
            name: "Bolt",
            qty: 120,
            photo: "bolt.png",
        },
        Part {
            code: "N-04",
            name: "  Nut & washer ",
            qty: 7,
            photo: "",
        },
    ]
}

fn fields() -> Vec<FieldDescriptor<Part>> {
    vec![
        FieldDescriptor::new("code", |p: &Part| p.code).with_display_name("Code"),
        FieldDescriptor::new("name", |p: &Part| p.name).with_display_name("Name"),
        FieldDescriptor::new("qty", |p: &Part| p.qty).with_display_name("Quantity"),
        FieldDescriptor::new("photo", |p: &Part| p.photo).as_image(Some(40)),
    ]
}

fn assembled() -> Workbook {
    let header = CellStyle::new()
        .with_border(BorderLineStyle::Thin)
        .with_back_color("#ADD8E6")
        .with_alignment(Alignment::new().with_horizontal(HorizontalAlignment::Center))
        .with_font(Font::new().with_bold(true));
    let setting = TableSetting::new().with_header_style(header);

    let mut asm = SheetAssembler::new();
    asm.append_text(
        "Stock report",
        Some(CellStyle::new().with_merge_count(4).with_height(30.0)),
    )
    .unwrap();
    asm.append_line();
    asm.append_table(&parts(), &fields(), &setting).unwrap();

    let mut workbook = Workbook::new();
    let images = MemoryImageSource::new().with("bolt.png", png(80, 60));
    asm.finalize(&mut workbook, "Stock", &images).unwrap();
    workbook
}

fn roundtrip(workbook: &Workbook) -> (Vec<u8>, Workbook) {
    let mut buf = Vec::new();
    XlsxWriter::write(workbook, Cursor::new(&mut buf)).unwrap();
    let loaded = XlsxReader::read(Cursor::new(&buf)).unwrap();
    (buf, loaded)
}

fn value_at(workbook: &Workbook, reference: &str) -> Option<CellValue> {
    workbook
        .worksheet(0)
        .unwrap()
        .cell_at(reference)
        .unwrap()
        .map(|c| c.value.clone())
}

#[test]
fn test_roundtrip_values() {
    let (_, loaded) = roundtrip(&assembled());

    assert_eq!(value_at(&loaded, "A1"), Some(CellValue::text("Stock report")));
    assert_eq!(value_at(&loaded, "A3"), Some(CellValue::text("Code")));
    assert_eq!(value_at(&loaded, "C3"), Some(CellValue::text("Quantity")));
    assert_eq!(value_at(&loaded, "B4"), Some(CellValue::text("Bolt")));
    assert_eq!(value_at(&loaded, "C4"), Some(CellValue::number("120")));
    // Whitespace and XML entities survive
    assert_eq!(
        value_at(&loaded, "B5"),
        Some(CellValue::text("  Nut & washer "))
    );
    // The image cell is cleared once the picture is placed
    assert_eq!(value_at(&loaded, "D4"), Some(CellValue::text("")));
}

#[test]
fn test_roundtrip_layout() {
    let original = assembled();
    let (_, loaded) = roundtrip(&original);
    let sheet = loaded.worksheet(0).unwrap();

    assert_eq!(sheet.name(), "Stock");
    assert_eq!(sheet.merges(), &[CellRange::parse("A1:D1").unwrap()]);
    assert_eq!(sheet.row(1).unwrap().height, Some(30.0));
    assert_eq!(sheet.row(3).unwrap().height, None);
    assert_eq!(
        sheet.row_count(),
        original.worksheet(0).unwrap().row_count()
    );
}

#[test]
fn test_roundtrip_styles() {
    let original = assembled();
    let (_, loaded) = roundtrip(&original);

    let catalog = loaded.catalog();
    assert_eq!(
        catalog.cell_formats().len(),
        original.catalog().cell_formats().len()
    );
    assert_eq!(catalog.fonts().len(), original.catalog().fonts().len());

    let sheet = loaded.worksheet(0).unwrap();
    let header = sheet.cell(CellAddress::new(2, 3).unwrap()).unwrap();
    let record = catalog.cell_format(header.style_index.unwrap()).unwrap();
    assert_eq!(
        catalog.fill(record.fill_id),
        Some(&Fill::solid_over_auto(Color::LIGHT_BLUE))
    );
    assert!(catalog.font(record.font_id).unwrap().bold);
    assert_eq!(
        record.alignment.as_ref().and_then(|a| a.horizontal),
        Some(HorizontalAlignment::Center)
    );
    assert_ne!(record.border_id, 0);
}

#[test]
fn test_roundtrip_images() {
    let original = assembled();
    let (_, loaded) = roundtrip(&original);

    let before = &original.worksheet(0).unwrap().images()[0];
    let after = &loaded.worksheet(0).unwrap().images()[0];

    assert_eq!(after.id, before.id);
    assert_eq!((after.column, after.row), (4, 4));
    assert_eq!(after.extent, before.extent);
    assert_eq!((after.extent.width_px, after.extent.height_px), (40, 30));
    assert_eq!(after.description, "bolt.png");
    assert_eq!(after.data, before.data);
}

#[test]
fn test_package_parts() {
    let (buf, _) = roundtrip(&assembled());
    let mut archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();

    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/_rels/sheet1.xml.rels",
        "xl/drawings/drawing1.xml",
        "xl/drawings/_rels/drawing1.xml.rels",
        "xl/media/image1.png",
    ] {
        assert!(archive.by_name(part).is_ok(), "missing part {part}");
    }
}

#[test]
fn test_append_sheet_to_loaded_workbook() {
    let (_, mut loaded) = roundtrip(&assembled());

    let mut asm = SheetAssembler::new();
    asm.append_text("Second", None).unwrap();
    asm.finalize(&mut loaded, "Notes", &MemoryImageSource::new())
        .unwrap();

    let (_, reloaded) = roundtrip(&loaded);
    assert_eq!(reloaded.sheet_count(), 2);
    assert_eq!(reloaded.worksheet(1).unwrap().name(), "Notes");
    // The first sheet's picture keeps its media after the rewrite
    assert_eq!(reloaded.worksheet(0).unwrap().images().len(), 1);
}

#[test]
fn test_read_raw_and_import() {
    let mut buf = Vec::new();
    XlsxWriter::write(&assembled(), Cursor::new(&mut buf)).unwrap();

    let document =
        XlsxReader::read_raw(Cursor::new(&buf), Some("stock"), CatalogSettings::default())
            .unwrap();
    assert_eq!(document.sheet.name, "Stock");

    let missing = XlsxReader::read_raw(Cursor::new(&buf), Some("Nope"), CatalogSettings::default());
    assert!(missing.is_err());
}

#[test]
fn test_import_table_from_first_rows() {
    let mut asm = SheetAssembler::new();
    asm.append_table(
        &parts(),
        &fields()[..3],
        &TableSetting::new(),
    )
    .unwrap();
    let mut workbook = Workbook::new();
    asm.finalize(&mut workbook, "Parts", &MemoryImageSource::new())
        .unwrap();

    let mut buf = Vec::new();
    XlsxWriter::write(&workbook, Cursor::new(&mut buf)).unwrap();
    let document = XlsxReader::read_raw(Cursor::new(&buf), None, CatalogSettings::default())
        .unwrap();

    let bindings = vec![
        FieldBinding::new("code", TargetType::Text).with_description("Code"),
        FieldBinding::new("qty", TargetType::Int).with_description("quantity"),
    ];
    let records = document.import(&bindings).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("code"), Some("B-10"));
    assert_eq!(records[1].text("code"), Some("N-04"));
    assert_eq!(
        records[0].get("qty").map(|v| v.to_string()),
        Some("120".to_string())
    );
}

#[test]
fn test_comma_separator_keeps_stored_numbers_valid() {
    let settings = CatalogSettings {
        decimal_separator: ',',
        ..CatalogSettings::default()
    };

    let mut asm = SheetAssembler::new();
    asm.append_text("Amount", None).unwrap();
    asm.append_text(Decimal::new(314, 2), None).unwrap();
    let mut workbook = Workbook::with_settings(settings.clone());
    asm.finalize(&mut workbook, "Totals", &MemoryImageSource::new())
        .unwrap();

    let mut buf = Vec::new();
    XlsxWriter::write(&workbook, Cursor::new(&mut buf)).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(buf.clone())).unwrap();
    let mut sheet_xml = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut sheet_xml)
        .unwrap();
    assert!(sheet_xml.contains(r#"<c r="A2" s="2"><v>3.14</v></c>"#));
    assert!(!sheet_xml.contains("3,14"));

    // The separator only applies when values are read back
    let document = XlsxReader::read_raw(Cursor::new(&buf), None, settings).unwrap();
    let bindings = vec![FieldBinding::new("amount", TargetType::Decimal).with_description("Amount")];
    let records = document.import(&bindings).unwrap();
    assert_eq!(
        records[0].get("amount").map(|v| v.to_string()),
        Some("3.14".to_string())
    );
}
