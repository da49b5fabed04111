//! Render a laid-out report to PDF bytes

use crate::config::PageConfig;
use crate::coords::{box_origin, layout_to_pdf_y};
use crate::document::{Align, DrawOp, PageNumber, ReportDocument, TextStyle};
use crate::error::ReportError;
use crate::metrics::encode_win_ansi;
use chrono::{DateTime, Local};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Resource name of the map image XObject.
const IMAGE_RESOURCE: &str = "Im1";

/// Document information dictionary contents.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub created_at: DateTime<Local>,
}

/// Parse hex color string (e.g., "#FF0000" or "FF0000") to RGB floats (0-1 range)
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 {
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .unwrap_or(0) as f32
                / 255.0
        };
        (channel(0..2), channel(2..4), channel(4..6))
    } else {
        (0.0, 0.0, 0.0)
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn rgb_operands(color: &str) -> Vec<Object> {
    let (r, g, b) = parse_hex_color(color);
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}

/// Render every page of `document` into a standalone PDF.
pub fn render(
    document: &ReportDocument,
    page: &PageConfig,
    info: &DocumentInfo,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let resources_id = add_resources(&mut doc, document)?;

    let mut kids = Vec::new();
    for number in 1..=document.page_count() {
        let content = page_content(document, number, page);
        let encoded = content
            .encode()
            .map_err(|e| ReportError::Render(format!("Page {}: {}", number, e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Page")),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(page.width),
                    real(page.height),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", name("Catalog")),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let stamp = info.created_at.format("D:%Y%m%d%H%M%S").to_string();
    let info_id = doc.add_object(Dictionary::from_iter(vec![
        (
            "Title",
            Object::String(encode_win_ansi(&info.title), StringFormat::Literal),
        ),
        (
            "Producer",
            Object::String(b"cadastre-report".to_vec(), StringFormat::Literal),
        ),
        (
            "CreationDate",
            Object::String(stamp.into_bytes(), StringFormat::Literal),
        ),
    ]));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ReportError::Render(e.to_string()))?;

    tracing::debug!(
        pages = document.page_count(),
        bytes = output.len(),
        "Rendered PDF"
    );
    Ok(output)
}

/// Shared fonts and, when present, the map image.
fn add_resources(doc: &mut Document, document: &ReportDocument) -> Result<ObjectId, ReportError> {
    let font = |base: &str| {
        Dictionary::from_iter(vec![
            ("Type", name("Font")),
            ("Subtype", name("Type1")),
            ("BaseFont", name(base)),
            ("Encoding", name("WinAnsiEncoding")),
        ])
    };
    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));

    let mut resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![
            ("F1", Object::Reference(regular_id)),
            ("F2", Object::Reference(bold_id)),
        ])),
    )]);

    if let Some(image) = document.image() {
        let data = image.compressed()?;
        let dict = Dictionary::from_iter(vec![
            ("Type", name("XObject")),
            ("Subtype", name("Image")),
            ("Width", Object::Integer(i64::from(image.width()))),
            ("Height", Object::Integer(i64::from(image.height()))),
            ("ColorSpace", name("DeviceRGB")),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", name("FlateDecode")),
        ]);
        // already deflated; keep lopdf from compressing it again
        let image_id = doc.add_object(Stream::new(dict, data).with_compression(false));
        resources.set(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                IMAGE_RESOURCE,
                Object::Reference(image_id),
            )])),
        );
    }

    Ok(doc.add_object(resources))
}

fn page_content(document: &ReportDocument, number: PageNumber, page: &PageConfig) -> Content {
    let mut operations = Vec::new();
    for op in document.operations_for_page(number) {
        match op {
            DrawOp::Text {
                x, y, text, style, ..
            } => push_text(&mut operations, *x, *y, text, style, page.height),
            DrawOp::Line {
                from,
                to,
                color,
                width,
                ..
            } => {
                let mut stroke = vec![Operation::new("q", vec![])];
                stroke.push(Operation::new("RG", rgb_operands(color)));
                stroke.push(Operation::new("w", vec![real(*width)]));
                stroke.push(Operation::new(
                    "m",
                    vec![real(from.0), real(layout_to_pdf_y(from.1, page.height))],
                ));
                stroke.push(Operation::new(
                    "l",
                    vec![real(to.0), real(layout_to_pdf_y(to.1, page.height))],
                ));
                stroke.push(Operation::new("S", vec![]));
                stroke.push(Operation::new("Q", vec![]));
                operations.extend(stroke);
            }
            DrawOp::FillRect { rect, color, .. } => {
                let (x, y) = box_origin(rect.x, rect.y, rect.height, page.height);
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("rg", rgb_operands(color)));
                operations.push(Operation::new(
                    "re",
                    vec![real(x), real(y), real(rect.width), real(rect.height)],
                ));
                operations.push(Operation::new("f", vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
            DrawOp::Image { rect, .. } => {
                if document.image().is_none() {
                    tracing::warn!(page = number, "Image placement without an image, skipped");
                    continue;
                }
                let (x, y) = box_origin(rect.x, rect.y, rect.height, page.height);
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        real(rect.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        real(rect.height),
                        real(x),
                        real(y),
                    ],
                ));
                operations.push(Operation::new("Do", vec![name(IMAGE_RESOURCE)]));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }
    Content { operations }
}

fn push_text(
    operations: &mut Vec<Operation>,
    x: f64,
    baseline: f64,
    text: &str,
    style: &TextStyle,
    page_height: f64,
) {
    let start = match style.align {
        Align::Left => x,
        Align::Center => x - style.width_of(text) / 2.0,
        Align::Right => x - style.width_of(text),
    };
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![name(style.font_resource()), real(style.font_size)],
    ));
    operations.push(Operation::new("rg", rgb_operands(&style.color)));
    operations.push(Operation::new(
        "Td",
        vec![real(start), real(layout_to_pdf_y(baseline, page_height))],
    ));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
    ));
    operations.push(Operation::new("ET", vec![]));
}
