//! Streaming sheet assembly
//!
//! [`SheetAssembler`] writes rows in a single pass while queueing everything
//! that can only be resolved against the finished sheet: style regions,
//! merged ranges and image placements. [`SheetAssembler::finalize`] applies
//! the queues in order and hands the sheet to a [`Workbook`].

use log::{debug, warn};

use crate::cell::{CellAddress, CellRange, CellValue};
use crate::codec::{classify, FieldValue};
use crate::error::Result;
use crate::image::{ImageProbe, ImageSource};
use crate::region::{RegionStyler, StyleMutation};
use crate::row::Row;
use crate::style::{Alignment, BorderLineStyle, Font};
use crate::workbook::Workbook;
use crate::worksheet::Worksheet;

/// Styling requested for a block of cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    /// Border on all four sides; `None` leaves borders untouched
    pub border: BorderLineStyle,
    /// Row height in points
    pub height: Option<f64>,
    /// Number of columns each value spans when merged
    pub merge_count: Option<u32>,
    /// Solid background color as hex (`#` optional)
    pub back_color_rgb: Option<String>,
    pub alignment: Option<Alignment>,
    pub font: Option<Font>,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_border(mut self, border: BorderLineStyle) -> Self {
        self.border = border;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_merge_count(mut self, count: u32) -> Self {
        self.merge_count = Some(count);
        self
    }

    pub fn with_back_color<S: Into<String>>(mut self, rgb: S) -> Self {
        self.back_color_rgb = Some(rgb.into());
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = Some(font);
        self
    }

    /// Columns covered by one value (at least 1)
    fn span(&self) -> u32 {
        self.merge_count.unwrap_or(0).max(1)
    }

    /// Mutations this style applies, in application order
    fn mutations(&self) -> Result<Vec<StyleMutation>> {
        let mut mutations = Vec::new();
        if self.border != BorderLineStyle::None {
            mutations.push(StyleMutation::Border(self.border));
        }
        if let Some(rgb) = &self.back_color_rgb {
            mutations.push(StyleMutation::fill_rgb(rgb)?);
        }
        if let Some(alignment) = &self.alignment {
            mutations.push(StyleMutation::Alignment(alignment.clone()));
        }
        if let Some(font) = &self.font {
            mutations.push(StyleMutation::Font(font.clone()));
        }
        Ok(mutations)
    }
}

/// Layout options for [`SheetAssembler::append_table`]
#[derive(Debug, Clone, PartialEq)]
pub struct TableSetting {
    pub header_style: CellStyle,
    pub data_style: CellStyle,
    pub hide_header: bool,
    /// Field names to export, in output order; `None` exports all fields
    pub exported_columns: Option<Vec<String>>,
}

impl Default for TableSetting {
    fn default() -> Self {
        Self {
            header_style: CellStyle::new().with_border(BorderLineStyle::Thin),
            data_style: CellStyle::new(),
            hide_header: false,
            exported_columns: None,
        }
    }
}

impl TableSetting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_style(mut self, style: CellStyle) -> Self {
        self.header_style = style;
        self
    }

    pub fn with_data_style(mut self, style: CellStyle) -> Self {
        self.data_style = style;
        self
    }

    pub fn hide_header(mut self, hide: bool) -> Self {
        self.hide_header = hide;
        self
    }

    pub fn with_exported_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exported_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Marks a field whose value is an image path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageField {
    /// Fixed placed width; height follows the aspect ratio
    pub width_px: Option<u32>,
}

/// One exported column: a name, a header caption and how to read the value
pub struct FieldDescriptor<T> {
    pub name: String,
    pub display_name: Option<String>,
    accessor: Box<dyn Fn(&T) -> FieldValue>,
    pub image: Option<ImageField>,
}

impl<T> FieldDescriptor<T> {
    pub fn new<S, F, V>(name: S, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&T) -> V + 'static,
        V: Into<FieldValue>,
    {
        Self {
            name: name.into(),
            display_name: None,
            accessor: Box::new(move |item| accessor(item).into()),
            image: None,
        }
    }

    /// Header caption shown instead of the name
    pub fn with_display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Treat the value as an image path, embedded at finalize time
    pub fn as_image(mut self, width_px: Option<u32>) -> Self {
        self.image = Some(ImageField { width_px });
        self
    }

    /// Header caption: the display name, else the name
    pub fn caption(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Read the field from an item
    pub fn value(&self, item: &T) -> FieldValue {
        (self.accessor)(item)
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("image", &self.image)
            .finish_non_exhaustive()
    }
}

/// Apply `exported_columns`: keep only listed fields, in listed order
pub(crate) fn select_fields<'d, T>(
    fields: &'d [FieldDescriptor<T>],
    exported: Option<&[String]>,
) -> Vec<&'d FieldDescriptor<T>> {
    match exported {
        None => fields.iter().collect(),
        Some(names) => names
            .iter()
            .filter_map(|name| fields.iter().find(|f| &f.name == name))
            .collect(),
    }
}

/// Assembly progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Nothing appended yet
    Empty,
    /// At least one append has happened
    Building,
}

/// A style queued for a rectangle of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub range: CellRange,
    pub style: CellStyle,
}

/// An image path queued for embedding at a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub address: CellAddress,
    pub source: String,
    pub width_px: Option<u32>,
}

/// What [`SheetAssembler::finalize`] did
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinalizeReport {
    /// Index of the new sheet in the workbook
    pub sheet_index: usize,
    pub regions_applied: usize,
    pub merges: usize,
    pub images_placed: usize,
    /// Images whose source was missing; their cells hold the error text
    pub images_missing: usize,
}

/// Single-pass worksheet builder with deferred styling, merges and images
///
/// The row cursor starts at 1. Finalizing consumes the assembler.
#[derive(Debug)]
pub struct SheetAssembler {
    cursor: u32,
    state: AssemblerState,
    rows: Vec<Row>,
    regions: Vec<Region>,
    merges: Vec<CellRange>,
    images: Vec<PendingImage>,
}

impl Default for SheetAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetAssembler {
    pub fn new() -> Self {
        Self {
            cursor: 1,
            state: AssemblerState::Empty,
            rows: Vec::new(),
            regions: Vec::new(),
            merges: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Row the next append writes to
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn pending_regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn pending_merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn pending_images(&self) -> &[PendingImage] {
        &self.images
    }

    /// Leave the current row empty
    pub fn append_line(&mut self) -> &mut Self {
        self.state = AssemblerState::Building;
        self.cursor += 1;
        self
    }

    /// Write a single value into column A of the current row
    pub fn append_text<V: Into<FieldValue>>(
        &mut self,
        value: V,
        style: Option<CellStyle>,
    ) -> Result<&mut Self> {
        if let Some(style) = &style {
            style.mutations()?;
        }
        self.state = AssemblerState::Building;
        let index = self.cursor;
        self.cursor += 1;

        let classified = classify(&value.into());
        let mut row = Row::new(index).with_height(style.as_ref().and_then(|s| s.height));
        row.push(1, classified.value, classified.style_index);
        self.rows.push(row);

        if let Some(style) = style {
            if let Some(merge_count) = style.merge_count.filter(|&n| n > 0) {
                self.merges
                    .push(CellRange::on_row(index, 1, merge_count)?);
            }
            self.regions.push(Region {
                range: CellRange::single(CellAddress::new(1, index)?),
                style,
            });
        }

        Ok(self)
    }

    /// Write a header row (unless hidden) and one row per item
    pub fn append_table<T>(
        &mut self,
        items: &[T],
        fields: &[FieldDescriptor<T>],
        setting: &TableSetting,
    ) -> Result<&mut Self> {
        setting.header_style.mutations()?;
        setting.data_style.mutations()?;
        self.state = AssemblerState::Building;
        let fields = select_fields(fields, setting.exported_columns.as_deref());

        if !setting.hide_header {
            let index = self.cursor;
            self.cursor += 1;

            let span = setting.header_style.span();
            let captions: Vec<CellValue> =
                fields.iter().map(|f| CellValue::text(f.caption())).collect();
            let row = self.spread_row(index, captions, vec![None; fields.len()], &setting.header_style)?;
            self.rows.push(row);

            if !fields.is_empty() {
                let width = fields.len() as u32 * span;
                self.regions.push(Region {
                    range: CellRange::on_row(index, 1, width)?,
                    style: setting.header_style.clone(),
                });
            }
        }

        let first_data_row = self.cursor;
        let span = setting.data_style.span();
        for item in items {
            let index = self.cursor;
            self.cursor += 1;

            let mut values = Vec::with_capacity(fields.len());
            let mut styles = Vec::with_capacity(fields.len());
            for (position, field) in fields.iter().enumerate() {
                let value = field.value(item);
                if let Some(image) = field.image {
                    let source = value.to_string();
                    if !source.is_empty() {
                        self.images.push(PendingImage {
                            address: CellAddress::new(position as u32 * span + 1, index)?,
                            source,
                            width_px: image.width_px,
                        });
                    }
                }
                let classified = classify(&value);
                values.push(classified.value);
                styles.push(classified.style_index);
            }

            let row = self.spread_row(index, values, styles, &setting.data_style)?;
            self.rows.push(row);
        }

        if !items.is_empty() && !fields.is_empty() {
            let last_row = first_data_row + items.len() as u32 - 1;
            let width = fields.len() as u32 * span;
            self.regions.push(Region {
                range: CellRange::new(
                    CellAddress::new(1, first_data_row)?,
                    CellAddress::new(width, last_row)?,
                ),
                style: setting.data_style.clone(),
            });
        }

        Ok(self)
    }

    /// Build a row, spreading each value over `merge_count` columns
    ///
    /// Every value is followed by empty text cells filling its group. When the
    /// style sets a merge count, each group is queued as a merged range.
    fn spread_row(
        &mut self,
        index: u32,
        values: Vec<CellValue>,
        styles: Vec<Option<u32>>,
        style: &CellStyle,
    ) -> Result<Row> {
        let span = style.span();
        let merged = style.merge_count.map_or(false, |n| n > 0);
        let mut row = Row::new(index).with_height(style.height);

        let mut column = 1;
        for (value, style_index) in values.into_iter().zip(styles) {
            row.push(column, value, style_index);
            for offset in 1..span {
                row.push(column + offset, CellValue::text(""), None);
            }
            if merged {
                self.merges
                    .push(CellRange::on_row(index, column, column + span - 1)?);
            }
            column += span;
        }

        Ok(row)
    }

    /// Resolve all queued work and add the sheet to `workbook`
    ///
    /// Regions are applied in the order they were queued (border, fill,
    /// alignment, then font within each region), merges are recorded, and
    /// queued images are loaded from `images`. A missing image source puts the
    /// error text into the cell and moves on; any other failure aborts.
    pub fn finalize(
        self,
        workbook: &mut Workbook,
        sheet_name: &str,
        images: &dyn ImageSource,
    ) -> Result<FinalizeReport> {
        workbook.validate_sheet_name(sheet_name)?;

        // Everything that can fail is resolved before the catalog grows
        let planned = self
            .regions
            .iter()
            .map(|region| Ok((region.range, region.style.mutations()?)))
            .collect::<Result<Vec<_>>>()?;
        let mut loaded = Vec::with_capacity(self.images.len());
        for pending in self.images {
            let outcome = match images.load(&pending.source) {
                Ok(data) => {
                    ImageProbe::probe(&data)?;
                    Ok(data)
                }
                Err(e) if e.is_missing_image_source() => Err(e),
                Err(e) => return Err(e),
            };
            loaded.push((pending, outcome));
        }

        let mut sheet = Worksheet::new(sheet_name);
        for row in self.rows {
            sheet.insert_row(row);
        }

        let mut report = FinalizeReport::default();

        let mut styler = RegionStyler::new(workbook.catalog_mut(), &mut sheet);
        for (range, mutations) in &planned {
            for mutation in mutations {
                styler.apply(*range, mutation);
            }
            report.regions_applied += 1;
        }
        debug!(
            "applied {} regions to sheet '{}'",
            report.regions_applied, sheet_name
        );

        for range in self.merges {
            sheet.add_merge(range);
        }
        report.merges = sheet.merges().len();

        for (pending, outcome) in loaded {
            let text = match outcome {
                Ok(data) => {
                    sheet.place_image(
                        pending.address,
                        data,
                        pending.source.as_str(),
                        pending.width_px,
                    )?;
                    report.images_placed += 1;
                    String::new()
                }
                Err(e) => {
                    warn!("image at {}: {}", pending.address, e);
                    report.images_missing += 1;
                    e.to_string()
                }
            };
            if let Some(cell) = sheet.cell_mut(pending.address) {
                cell.value = CellValue::text(text);
            }
        }
        debug!(
            "sheet '{}': {} merges, {} images placed, {} missing",
            sheet_name, report.merges, report.images_placed, report.images_missing
        );

        report.sheet_index = workbook.add_worksheet(sheet)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fixtures::png;
    use crate::image::MemoryImageSource;
    use crate::style::{Color, Fill, HorizontalAlignment};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    struct Product {
        name: &'static str,
        qty: i32,
        price: Decimal,
        photo: &'static str,
    }

    fn products() -> Vec<Product> {
        vec![
            Product {
                name: "Bolt",
                qty: 10,
                price: Decimal::new(125, 2),
                photo: "bolt.png",
            },
            Product {
                name: "Nut",
                qty: 25,
                price: Decimal::new(5, 1),
                photo: "",
            },
        ]
    }

    fn fields() -> Vec<FieldDescriptor<Product>> {
        vec![
            FieldDescriptor::new("Name", |p: &Product| p.name).with_display_name("Product"),
            FieldDescriptor::new("Qty", |p: &Product| p.qty),
            FieldDescriptor::new("Price", |p: &Product| p.price),
            FieldDescriptor::new("Photo", |p: &Product| p.photo).as_image(Some(40)),
        ]
    }

    fn texts(row: &Row) -> Vec<&str> {
        row.cells.iter().map(|c| c.value.as_str()).collect()
    }

    #[test]
    fn test_cursor_and_state() {
        let mut asm = SheetAssembler::new();
        assert_eq!(asm.state(), AssemblerState::Empty);
        assert_eq!(asm.cursor(), 1);

        asm.append_line();
        asm.append_text("Title", None).unwrap();
        assert_eq!(asm.state(), AssemblerState::Building);
        assert_eq!(asm.cursor(), 3);
        assert_eq!(asm.rows()[0].index, 2);
        assert!(asm.pending_regions().is_empty());
    }

    #[test]
    fn test_append_text_with_style() {
        let mut asm = SheetAssembler::new();
        let style = CellStyle::new().with_merge_count(4).with_height(30.0);
        asm.append_text("Report", Some(style.clone())).unwrap();

        let row = &asm.rows()[0];
        assert_eq!(row.height, Some(30.0));
        assert_eq!(texts(row), vec!["Report"]);
        assert_eq!(asm.pending_merges()[0].to_string(), "A1:D1");
        assert_eq!(asm.pending_regions()[0].range.to_string(), "A1");
        assert_eq!(asm.pending_regions()[0].style, style);
    }

    #[test]
    fn test_header_merge_groups() {
        struct Pair;
        let fields = vec![
            FieldDescriptor::new("A", |_: &Pair| 1),
            FieldDescriptor::new("B", |_: &Pair| 2),
        ];
        let setting =
            TableSetting::new().with_header_style(CellStyle::new().with_merge_count(3));

        let mut asm = SheetAssembler::new();
        asm.append_table::<Pair>(&[], &fields, &setting).unwrap();

        assert_eq!(texts(&asm.rows()[0]), vec!["A", "", "", "B", "", ""]);
        let merges: Vec<String> = asm.pending_merges().iter().map(|m| m.to_string()).collect();
        assert_eq!(merges, vec!["A1:C1", "D1:F1"]);
        assert_eq!(asm.pending_regions().len(), 1);
        assert_eq!(asm.pending_regions()[0].range.to_string(), "A1:F1");
    }

    #[test]
    fn test_merge_count_of_one_registers_ranges() {
        struct Pair;
        let fields = vec![
            FieldDescriptor::new("A", |_: &Pair| 1),
            FieldDescriptor::new("B", |_: &Pair| 2),
        ];
        let single = CellStyle::new().with_merge_count(1);
        let setting = TableSetting::new().with_header_style(single.clone());

        let mut asm = SheetAssembler::new();
        asm.append_text("T", Some(single)).unwrap();
        asm.append_table(&[Pair], &fields, &setting).unwrap();

        // No padding cells for a one-column group
        assert_eq!(texts(&asm.rows()[1]), vec!["A", "B"]);
        let merges: Vec<String> = asm
            .pending_merges()
            .iter()
            .map(|m| format!("{}:{}", m.from, m.to))
            .collect();
        assert_eq!(merges, vec!["A1:A1", "A2:A2", "B2:B2"]);
    }

    #[test]
    fn test_no_merge_count_registers_nothing() {
        let mut asm = SheetAssembler::new();
        asm.append_text("T", Some(CellStyle::new().with_height(12.0)))
            .unwrap();
        asm.append_table(&products(), &fields(), &TableSetting::default())
            .unwrap();
        assert!(asm.pending_merges().is_empty());
    }

    #[test]
    fn test_append_table_rows_and_regions() {
        let mut asm = SheetAssembler::new();
        asm.append_text("Inventory", None).unwrap();
        asm.append_table(&products(), &fields(), &TableSetting::default())
            .unwrap();

        let rows = asm.rows();
        assert_eq!(texts(&rows[1]), vec!["Product", "Qty", "Price", "Photo"]);
        assert_eq!(texts(&rows[2]), vec!["Bolt", "10", "1.25", "bolt.png"]);
        assert_eq!(rows[2].cells[1].value, CellValue::number("10"));
        assert_eq!(rows[2].cells[2].style_index, Some(2));
        assert_eq!(rows[3].index, 4);

        let regions: Vec<String> = asm
            .pending_regions()
            .iter()
            .map(|r| r.range.to_string())
            .collect();
        assert_eq!(regions, vec!["A2:D2", "A3:D4"]);

        // Empty image paths are not queued
        assert_eq!(
            asm.pending_images(),
            &[PendingImage {
                address: CellAddress::new(4, 3).unwrap(),
                source: "bolt.png".into(),
                width_px: Some(40),
            }]
        );
    }

    #[test]
    fn test_hidden_header_and_data_merge() {
        let setting = TableSetting::new()
            .hide_header(true)
            .with_data_style(CellStyle::new().with_merge_count(2))
            .with_exported_columns(["Photo", "Name"]);

        let mut asm = SheetAssembler::new();
        asm.append_line();
        asm.append_table(&products(), &fields(), &setting).unwrap();

        let rows = asm.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["bolt.png", "", "Bolt", ""]);
        assert_eq!(rows[1].index, 3);

        let merges: Vec<String> = asm.pending_merges().iter().map(|m| m.to_string()).collect();
        assert_eq!(merges, vec!["A2:B2", "C2:D2", "A3:B3", "C3:D3"]);
        assert_eq!(asm.pending_regions()[0].range.to_string(), "A2:D3");
        // Image column follows the merged layout
        assert_eq!(asm.pending_images()[0].address.to_string(), "A2");
    }

    #[test]
    fn test_empty_table_queues_no_body_region() {
        let mut asm = SheetAssembler::new();
        asm.append_table::<Product>(&[], &fields(), &TableSetting::default())
            .unwrap();
        assert_eq!(asm.rows().len(), 1);
        assert_eq!(asm.pending_regions().len(), 1);
        assert_eq!(asm.cursor(), 2);
    }

    #[test]
    fn test_finalize_applies_styles_and_images() {
        let header = CellStyle::new()
            .with_border(BorderLineStyle::Thin)
            .with_back_color("#ADD8E6")
            .with_alignment(Alignment::new().with_horizontal(HorizontalAlignment::Center))
            .with_font(Font::new().with_bold(true));
        let setting = TableSetting::new().with_header_style(header);

        let mut asm = SheetAssembler::new();
        asm.append_table(&products(), &fields(), &setting).unwrap();

        let mut workbook = Workbook::new();
        let source = MemoryImageSource::new().with("bolt.png", png(80, 60, None));
        let report = asm.finalize(&mut workbook, "Stock", &source).unwrap();

        assert_eq!(report.sheet_index, 0);
        assert_eq!(report.regions_applied, 2);
        assert_eq!(report.images_placed, 1);
        assert_eq!(report.images_missing, 0);

        let sheet = workbook.worksheet(0).unwrap();
        let photo = sheet.cell(CellAddress::new(4, 2).unwrap()).unwrap();
        assert_eq!(photo.value, CellValue::text(""));

        let image = &sheet.images()[0];
        assert_eq!((image.extent.width_px, image.extent.height_px), (40, 30));
        assert_eq!((image.anchor_column(), image.anchor_row()), (3, 1));

        let a1 = sheet.cell(CellAddress::new(1, 1).unwrap()).unwrap();
        let record = workbook.catalog().cell_format(a1.style_index.unwrap()).unwrap();
        assert_eq!(
            workbook.catalog().fill(record.fill_id),
            Some(&Fill::solid_over_auto(Color::LIGHT_BLUE))
        );
        assert!(workbook.catalog().font(record.font_id).unwrap().bold);
        assert!(record.alignment.is_some());
        assert_ne!(record.border_id, 0);
    }

    #[test]
    fn test_finalize_missing_image_writes_message() {
        struct Row2 {
            a: &'static str,
            b: &'static str,
        }
        let fields = vec![
            FieldDescriptor::new("A", |r: &Row2| r.a).as_image(None),
            FieldDescriptor::new("B", |r: &Row2| r.b).as_image(None),
        ];
        let items = [Row2 {
            a: "gone.png",
            b: "here.png",
        }];

        let mut asm = SheetAssembler::new();
        asm.append_table(&items, &fields, &TableSetting::default())
            .unwrap();

        let mut workbook = Workbook::new();
        let source = MemoryImageSource::new().with("here.png", png(2, 2, None));
        let report = asm.finalize(&mut workbook, "Pics", &source).unwrap();

        assert_eq!(report.images_missing, 1);
        assert_eq!(report.images_placed, 1);
        let sheet = workbook.worksheet(0).unwrap();
        let a2 = sheet.cell(CellAddress::new(1, 2).unwrap()).unwrap();
        assert_eq!(a2.value.as_str(), "Could not find file 'gone.png'.");
        assert_eq!(sheet.images()[0].column, 2);
    }

    #[test]
    fn test_finalize_rejects_unsupported_image() {
        struct One;
        let fields = vec![FieldDescriptor::new("P", |_: &One| "x.bin").as_image(None)];
        let mut asm = SheetAssembler::new();
        asm.append_table(&[One], &fields, &TableSetting::default())
            .unwrap();

        let mut workbook = Workbook::new();
        let source = MemoryImageSource::new().with("x.bin", b"garbage".to_vec());
        assert!(asm.finalize(&mut workbook, "S", &source).is_err());
        assert_eq!(workbook.sheet_count(), 0);
    }

    #[test]
    fn test_failed_finalize_leaves_catalog_untouched() {
        struct One;
        let fields = vec![FieldDescriptor::new("P", |_: &One| "x.bin").as_image(None)];
        let setting = TableSetting::default()
            .with_header_style(CellStyle::new().with_border(BorderLineStyle::Thick));
        let mut asm = SheetAssembler::new();
        asm.append_table(&[One], &fields, &setting).unwrap();

        let mut workbook = Workbook::new();
        let formats = workbook.catalog().cell_formats().len();
        let borders = workbook.catalog().borders().len();
        let source = MemoryImageSource::new().with("x.bin", b"garbage".to_vec());
        assert!(asm.finalize(&mut workbook, "S", &source).is_err());

        assert_eq!(workbook.catalog().cell_formats().len(), formats);
        assert_eq!(workbook.catalog().borders().len(), borders);
    }

    #[test]
    fn test_bad_fill_on_later_region_leaves_catalog_untouched() {
        let mut asm = SheetAssembler::new();
        asm.append_text(
            "ok",
            Some(CellStyle::new().with_border(BorderLineStyle::Thin)),
        )
        .unwrap();
        asm.regions.push(Region {
            range: CellRange::single(CellAddress::new(1, 1).unwrap()),
            style: CellStyle::new().with_back_color("not-a-color"),
        });

        let mut workbook = Workbook::new();
        let formats = workbook.catalog().cell_formats().len();
        let borders = workbook.catalog().borders().len();
        let fills = workbook.catalog().fills().len();
        assert!(asm
            .finalize(&mut workbook, "S", &MemoryImageSource::new())
            .is_err());

        assert_eq!(workbook.catalog().cell_formats().len(), formats);
        assert_eq!(workbook.catalog().borders().len(), borders);
        assert_eq!(workbook.catalog().fills().len(), fills);
        assert_eq!(workbook.sheet_count(), 0);
    }

    #[test]
    fn test_bad_fill_rejected_when_queued() {
        let mut asm = SheetAssembler::new();
        let style = CellStyle::new().with_back_color("zz");
        assert!(asm.append_text("x", Some(style.clone())).is_err());
        assert_eq!(asm.cursor(), 1);
        assert!(asm.rows().is_empty());

        struct One;
        let fields = vec![FieldDescriptor::new("A", |_: &One| "a")];
        let setting = TableSetting::default().with_data_style(style);
        assert!(asm.append_table(&[One], &fields, &setting).is_err());
        assert!(asm.rows().is_empty());
    }

    #[test]
    fn test_finalize_rejects_duplicate_sheet() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet(Worksheet::new("Data")).unwrap();
        let asm = SheetAssembler::new();
        assert!(asm
            .finalize(&mut workbook, "data", &MemoryImageSource::new())
            .is_err());
    }
}
