//! Report layout
//!
//! The builder walks a fixed sequence of sections, moving a cursor down the
//! page and starting a new page whenever the next block would not fit:
//!
//! 1. Header: title and the building address of the first selected unit
//! 2. Statistics: one row per unit kind plus a TOTAL row
//! 3. Map: the location snapshot, only when one was captured
//! 4. Itemized table: one row per unit, never on the first page, header row
//!    repeated on every page it spans
//! 5. Footer: timestamp, attribution and "page X of Y" on every page but the first

use crate::config::ReportConfig;
use crate::document::{Align, DrawOp, PageNumber, Rect, ReportDocument, TextStyle};
use crate::error::ReportError;
use crate::map::{resolve_map, MapCapture, MapSnapshot};
use crate::metrics::fit_text;
use crate::render::{render, DocumentInfo};
use cadastre_core::sort::parse_leading_int;
use cadastre_core::{aggregate, Aggregate, SelectionState, SortKey, UnitRecord, UnitStore};
use chrono::{DateTime, Local};

const MM: f64 = 72.0 / 25.4;

/// Layout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Statistics,
    Map,
    ItemizedTable,
    Footer,
}

impl Section {
    fn next(self, has_map: bool) -> Option<Section> {
        match self {
            Section::Header => Some(Section::Statistics),
            Section::Statistics if has_map => Some(Section::Map),
            Section::Statistics | Section::Map => Some(Section::ItemizedTable),
            Section::ItemizedTable => Some(Section::Footer),
            Section::Footer => None,
        }
    }
}

struct Column {
    title: &'static str,
    width_mm: f64,
    align: Align,
}

impl Column {
    const fn new(title: &'static str, width_mm: f64, align: Align) -> Self {
        Self {
            title,
            width_mm,
            align,
        }
    }

    fn width(&self) -> f64 {
        self.width_mm * MM
    }
}

const STATS_COLUMNS: [Column; 4] = [
    Column::new("Tipo de inmueble", 45.0, Align::Left),
    Column::new("Cantidad", 25.0, Align::Center),
    Column::new("Superficie total", 35.0, Align::Right),
    Column::new("% del total", 25.0, Align::Center),
];

const ITEM_COLUMNS: [Column; 10] = [
    Column::new("#", 10.0, Align::Center),
    Column::new("Tipo", 20.0, Align::Left),
    Column::new("Nº", 12.0, Align::Center),
    Column::new("Lt", 8.0, Align::Center),
    Column::new("Planta", 15.0, Align::Center),
    Column::new("Puerta", 15.0, Align::Center),
    Column::new("Esc", 12.0, Align::Center),
    Column::new("Bloque", 15.0, Align::Center),
    Column::new("Superficie", 25.0, Align::Right),
    Column::new("Ref. Catastral", 38.0, Align::Left),
];

#[derive(Debug, Clone, Copy)]
enum RowKind {
    Header,
    Body { striped: bool },
    Total,
}

/// A finished report.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: PageNumber,
}

/// Assembles one report. Consumed by [`ReportBuilder::build`].
pub struct ReportBuilder<'a> {
    store: &'a UnitStore,
    selection: &'a SelectionState,
    config: ReportConfig,
    sort_key: SortKey,
    map: Option<MapSnapshot>,
    capture: Option<&'a dyn MapCapture>,
    generated_at: DateTime<Local>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(store: &'a UnitStore, selection: &'a SelectionState) -> Self {
        Self {
            store,
            selection,
            config: ReportConfig::default(),
            sort_key: SortKey::canonical(),
            map: None,
            capture: None,
            generated_at: Local::now(),
        }
    }

    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Row order of the itemized table; should match the list the user saw.
    pub fn sort_key(mut self, key: SortKey) -> Self {
        self.sort_key = key;
        self
    }

    pub fn map(mut self, snapshot: Option<MapSnapshot>) -> Self {
        self.map = snapshot;
        self
    }

    /// Capture the map while composing, after the selection is known to
    /// resolve to at least one record. A failed capture leaves the report
    /// without a map. An explicit [`ReportBuilder::map`] snapshot wins.
    pub fn map_capture(mut self, capture: &'a dyn MapCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    /// Lay the report out without rendering it.
    pub fn layout(self) -> Result<ReportDocument, ReportError> {
        self.compose()
    }

    pub fn build(self) -> Result<GeneratedReport, ReportError> {
        let document = self.compose()?;
        let info = DocumentInfo {
            title: self.config.title.clone(),
            created_at: self.generated_at,
        };
        let bytes = render(&document, &self.config.page, &info)?;
        let filename = self.filename();

        tracing::info!(
            filename = %filename,
            units = self.selected().len(),
            pages = document.page_count(),
            bytes = bytes.len(),
            "Generated report"
        );

        Ok(GeneratedReport {
            filename,
            bytes,
            page_count: document.page_count(),
        })
    }

    /// Selected records in original-index order; stale indices are skipped.
    fn selected(&self) -> Vec<&'a UnitRecord> {
        let store = self.store;
        self.selection
            .indices()
            .iter()
            .filter_map(|&i| store.get(i))
            .collect()
    }

    fn filename(&self) -> String {
        format!(
            "{}_{}_seleccionados_{}.pdf",
            self.config.filename_prefix,
            self.selected().len(),
            self.generated_at.format("%Y-%m-%dT%H-%M")
        )
    }

    fn compose(&self) -> Result<ReportDocument, ReportError> {
        let selected = self.selected();
        let Some(first) = selected.first().copied() else {
            return Err(ReportError::NothingSelected);
        };
        let captured = match (&self.map, self.capture) {
            (None, Some(capture)) => resolve_map(Some(capture)),
            _ => None,
        };
        let map = self.map.as_ref().or(captured.as_ref());
        let stats = aggregate(self.store.records(), self.selection.indices());

        let mut doc = ReportDocument::new(self.config.page.margin_top);
        let mut section = Some(Section::Header);
        while let Some(current) = section {
            tracing::debug!(section = ?current, page = doc.current_page(), "Laying out section");
            match current {
                Section::Header => self.draw_header(&mut doc, first),
                Section::Statistics => self.draw_statistics(&mut doc, &stats),
                Section::Map => {
                    if let Some(map) = map {
                        self.draw_map(&mut doc, map);
                    }
                }
                Section::ItemizedTable => self.draw_itemized_table(&mut doc, &selected),
                Section::Footer => self.draw_footers(&mut doc),
            }
            section = current.next(map.is_some());
        }
        Ok(doc)
    }

    // ============================================================
    // Layout primitives
    // ============================================================

    fn line_height(&self, font_size: f64) -> f64 {
        font_size * self.config.typography.line_spacing
    }

    /// Break the page if a block of `height` does not fit below the cursor.
    fn ensure_space(&self, doc: &mut ReportDocument, height: f64) {
        if doc.cursor() + height > self.config.page.content_bottom() {
            self.break_page(doc);
        }
    }

    fn break_page(&self, doc: &mut ReportDocument) {
        let page = doc.new_page(self.config.page.margin_top);
        tracing::debug!(page, "Page break");
    }

    /// Text with its top at the cursor. Does not move the cursor.
    fn put_text(&self, doc: &mut ReportDocument, x: f64, text: &str, style: TextStyle) {
        doc.add(DrawOp::Text {
            page: doc.current_page(),
            x,
            y: doc.cursor() + style.font_size,
            text: text.to_string(),
            style,
        });
    }

    fn heading(&self, doc: &mut ReportDocument, text: &str) {
        let size = self.config.typography.section_size;
        let style = TextStyle::new(size, &self.config.palette.heading).bold();
        self.put_text(doc, self.config.page.margin_left, text, style);
        doc.advance(self.line_height(size));
    }

    fn table_width(columns: &[Column]) -> f64 {
        columns.iter().map(Column::width).sum()
    }

    fn draw_row(
        &self,
        doc: &mut ReportDocument,
        columns: &[Column],
        cells: &[String],
        height: f64,
        kind: RowKind,
    ) {
        let typo = &self.config.typography;
        let palette = &self.config.palette;
        let (font_size, bold, color, fill) = match kind {
            RowKind::Header => (
                typo.table_header_size,
                true,
                &palette.table_header_text,
                Some(&palette.table_header_fill),
            ),
            RowKind::Body { striped } => (
                typo.table_size,
                false,
                &palette.text,
                striped.then_some(&palette.stripe),
            ),
            RowKind::Total => (typo.table_size, true, &palette.text, None),
        };

        let top = doc.cursor();
        let left = self.config.page.margin_left;
        let page = doc.current_page();
        if let Some(fill) = fill {
            doc.add(DrawOp::FillRect {
                page,
                rect: Rect {
                    x: left,
                    y: top,
                    width: Self::table_width(columns),
                    height,
                },
                color: fill.clone(),
            });
        }

        let baseline = top + (height + font_size * 0.7) / 2.0;
        let pad = typo.cell_padding;
        let mut x = left;
        for (column, cell) in columns.iter().zip(cells) {
            let width = column.width();
            let mut style = TextStyle::new(font_size, color).aligned(column.align);
            if bold {
                style = style.bold();
            }
            let anchor = match column.align {
                Align::Left => x + pad,
                Align::Center => x + width / 2.0,
                Align::Right => x + width - pad,
            };
            let text = fit_text(cell, width - 2.0 * pad, font_size, bold);
            if !text.is_empty() {
                doc.add(DrawOp::Text {
                    page,
                    x: anchor,
                    y: baseline,
                    text,
                    style,
                });
            }
            x += width;
        }
        doc.advance(height);
    }

    fn header_row(&self, doc: &mut ReportDocument, columns: &[Column], height: f64) {
        let titles: Vec<String> = columns.iter().map(|c| c.title.to_string()).collect();
        self.draw_row(doc, columns, &titles, height, RowKind::Header);
    }

    // ============================================================
    // Sections
    // ============================================================

    fn header_fields(&self, record: &UnitRecord) -> Vec<(&'static str, String)> {
        let placeholder = &self.config.placeholder;
        let or_placeholder = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| placeholder.clone())
        };
        let address = &record.address;
        let street = record.street_line();

        vec![
            ("Dirección:", or_placeholder(Some(street.as_str()))),
            ("Municipio:", or_placeholder(address.municipality.as_deref())),
            ("Provincia:", or_placeholder(address.province.as_deref())),
            ("Código postal:", or_placeholder(address.postal_code.as_deref())),
            (
                "Año de construcción:",
                or_placeholder(address.construction_year.as_deref()),
            ),
        ]
    }

    fn draw_header(&self, doc: &mut ReportDocument, first: &UnitRecord) {
        let typo = &self.config.typography;
        let page = &self.config.page;
        let palette = &self.config.palette;
        let fields = self.header_fields(first);
        let rule_gap = 14.0;

        let height = self.line_height(typo.title_size)
            + rule_gap
            + self.line_height(typo.heading_size)
            + fields.len() as f64 * self.line_height(typo.body_size)
            + typo.section_gap;
        self.ensure_space(doc, height);

        let title = TextStyle::new(typo.title_size, &palette.heading)
            .bold()
            .aligned(Align::Center);
        self.put_text(doc, page.width / 2.0, &self.config.title, title);
        doc.advance(self.line_height(typo.title_size));

        let rule_y = doc.cursor() + rule_gap / 2.0;
        doc.add(DrawOp::Line {
            page: doc.current_page(),
            from: (page.margin_left, rule_y),
            to: (page.width - page.margin_right, rule_y),
            color: palette.rule.clone(),
            width: 0.5,
        });
        doc.advance(rule_gap);

        let heading = TextStyle::new(typo.heading_size, &palette.heading).bold();
        self.put_text(doc, page.margin_left, "INFORMACIÓN DEL EDIFICIO", heading);
        doc.advance(self.line_height(typo.heading_size));

        let label_style = TextStyle::new(typo.body_size, &palette.text).bold();
        let value_style = TextStyle::new(typo.body_size, &palette.text);
        let label_width = fields
            .iter()
            .map(|(label, _)| label_style.width_of(label))
            .fold(0.0, f64::max);
        for (label, value) in &fields {
            self.put_text(doc, page.margin_left, label, label_style.clone());
            self.put_text(
                doc,
                page.margin_left + label_width + 8.0,
                value,
                value_style.clone(),
            );
            doc.advance(self.line_height(typo.body_size));
        }
        doc.advance(typo.section_gap);
    }

    fn draw_statistics(&self, doc: &mut ReportDocument, stats: &Aggregate) {
        let typo = &self.config.typography;
        let mut rows: Vec<Vec<String>> = stats
            .by_kind
            .iter()
            .map(|(kind, totals)| {
                vec![
                    kind.label().to_string(),
                    totals.count.to_string(),
                    format_area(totals.area),
                    format_percent(stats.percent_of_total(totals.area)),
                ]
            })
            .collect();
        rows.push(vec![
            "TOTAL".to_string(),
            stats.count.to_string(),
            format_area(stats.total_area),
            format_percent(stats.percent_of_total(stats.total_area)),
        ]);

        let row_height = typo.stats_row_height;
        let height = self.line_height(typo.section_size)
            + (rows.len() + 1) as f64 * row_height
            + typo.section_gap;
        self.ensure_space(doc, height);

        self.heading(doc, "RESUMEN ESTADÍSTICO");
        self.header_row(doc, &STATS_COLUMNS, row_height);
        let last = rows.len() - 1;
        for (i, row) in rows.iter().enumerate() {
            let kind = if i == last {
                RowKind::Total
            } else {
                RowKind::Body {
                    striped: i % 2 == 1,
                }
            };
            self.draw_row(doc, &STATS_COLUMNS, row, row_height, kind);
        }
        doc.advance(typo.section_gap);
    }

    fn draw_map(&self, doc: &mut ReportDocument, map: &MapSnapshot) {
        let page = &self.config.page;
        let typo = &self.config.typography;
        let heading_height = self.line_height(typo.section_size);

        let ratio = map.aspect_ratio();
        let mut width = page.printable_width();
        let mut height = width * ratio;
        let max_height = page.printable_height() - heading_height;
        if height > max_height {
            height = max_height;
            width = height / ratio;
        }

        self.ensure_space(doc, heading_height + height);
        self.heading(doc, "UBICACIÓN");
        doc.add(DrawOp::Image {
            page: doc.current_page(),
            rect: Rect {
                x: page.margin_left + (page.printable_width() - width) / 2.0,
                y: doc.cursor(),
                width,
                height,
            },
        });
        doc.set_image(map.clone());
        doc.advance(height + typo.section_gap);
    }

    fn item_cells(&self, number: usize, record: &UnitRecord) -> Vec<String> {
        let placeholder = &self.config.placeholder;
        let or_placeholder = |value: &str| {
            if value.trim().is_empty() {
                placeholder.clone()
            } else {
                value.trim().to_string()
            }
        };
        let street_number = if record.street_number.trim().is_empty() {
            "S/N".to_string()
        } else {
            parse_leading_int(&record.street_number).to_string()
        };

        vec![
            number.to_string(),
            record.kind.label().to_string(),
            street_number,
            record.street_letter.trim().to_string(),
            or_placeholder(record.floor_label(&self.config.ground_floor_label)),
            or_placeholder(&record.door),
            or_placeholder(&record.stair),
            or_placeholder(&record.block),
            format_area(record.built_area),
            or_placeholder(&record.cadastral_ref),
        ]
    }

    fn draw_itemized_table(&self, doc: &mut ReportDocument, selected: &[&UnitRecord]) {
        let typo = &self.config.typography;
        let row_height = typo.table_row_height;
        let heading_height = self.line_height(typo.section_size);

        let mut rows = selected.to_vec();
        rows.sort_by(|a, b| self.sort_key.compare(a, b));

        if doc.current_page() == 1 {
            self.break_page(doc);
        } else {
            self.ensure_space(doc, heading_height + 2.0 * row_height);
        }

        self.heading(doc, "DETALLE DE INMUEBLES SELECCIONADOS");
        self.header_row(doc, &ITEM_COLUMNS, row_height);
        for (i, record) in rows.iter().enumerate() {
            if doc.cursor() + row_height > self.config.page.content_bottom() {
                self.break_page(doc);
                self.header_row(doc, &ITEM_COLUMNS, row_height);
            }
            let cells = self.item_cells(i + 1, record);
            let kind = RowKind::Body {
                striped: i % 2 == 1,
            };
            self.draw_row(doc, &ITEM_COLUMNS, &cells, row_height, kind);
        }
    }

    fn draw_footers(&self, doc: &mut ReportDocument) {
        let page = &self.config.page;
        let typo = &self.config.typography;
        let palette = &self.config.palette;
        let total = doc.page_count();
        let stamp = format!("Generado el {}", self.generated_at.format("%d/%m/%Y %H:%M"));
        let rule_y = page.height - page.footer_rule_offset;
        let text_y = page.height - page.footer_text_offset;
        let style = TextStyle::new(typo.footer_size, &palette.footer_text);

        for number in 2..=total {
            doc.add(DrawOp::Line {
                page: number,
                from: (page.margin_left, rule_y),
                to: (page.width - page.margin_right, rule_y),
                color: palette.rule.clone(),
                width: 0.5,
            });
            let texts = [
                (page.margin_left, stamp.clone(), Align::Left),
                (page.width / 2.0, self.config.attribution.clone(), Align::Center),
                (
                    page.width - page.margin_right,
                    format!("Página {} de {}", number, total),
                    Align::Right,
                ),
            ];
            for (x, text, align) in texts {
                doc.add(DrawOp::Text {
                    page: number,
                    x,
                    y: text_y,
                    text,
                    style: style.clone().aligned(align),
                });
            }
        }
    }
}

/// "1.234 m²", or "85,50 m²" when there is a fractional part.
pub fn format_area(area: f64) -> String {
    let cents_total = (area.max(0.0) * 100.0).round() as u64;
    let whole = cents_total / 100;
    let cents = cents_total % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if cents == 0 {
        format!("{} m²", grouped)
    } else {
        format!("{},{:02} m²", grouped, cents)
    }
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}
