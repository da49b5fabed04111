//! End-to-end report generation, checked by parsing the PDF back

use cadastre_core::{RawUnit, SelectionState, UnitStore};
use cadastre_report::{
    generate_report, MapCapture, MapSnapshot, PngBytes, ReportBuilder, ReportError,
};
use chrono::{Local, TimeZone};
use lopdf::content::Content;
use lopdf::{Document, Object};
use pretty_assertions::assert_eq;
use std::cell::Cell;

fn building(units: usize) -> UnitStore {
    let raw = (0..units)
        .map(|i| RawUnit {
            ref_catastral: Some(format!("REF-{:03}", i)),
            clave_grupo_bice_o_uso: Some(if i % 10 == 0 { "C" } else { "V" }.to_string()),
            planta: Some(if i < 4 {
                "BJ".to_string()
            } else {
                (i / 4).to_string()
            }),
            puerta: Some(["A", "B", "C", "D"][i % 4].to_string()),
            sup_inmueble_construido: Some(50.0 + (i % 5) as f64 * 10.0),
            num_policia_1: Some("7".to_string()),
            tipo_via: Some("AV".to_string()),
            nombre_via: Some("DE LA CONSTITUCION".to_string()),
            nombre_municipio: Some("SEVILLA".to_string()),
            nombre_provincia: Some("SEVILLA".to_string()),
            cp: Some("41001".to_string()),
            ..Default::default()
        })
        .collect();
    UnitStore::from_raw(raw)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![120; (width * height * 3) as usize])
            .unwrap();
    }
    bytes
}

/// Shown strings per page, decoded from WinAnsi.
fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
    let pdf = Document::load_mem(bytes).unwrap();
    pdf.get_pages()
        .values()
        .map(|&page_id| {
            let content = Content::decode(&pdf.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first())
                .filter_map(|operand| operand.as_str().ok())
                .map(|raw| raw.iter().map(|&b| char::from(b)).collect::<String>())
                .collect::<Vec<String>>()
        })
        .collect()
}

fn has_image_xobject(bytes: &[u8]) -> bool {
    let pdf = Document::load_mem(bytes).unwrap();
    pdf.objects.values().any(|object| match object {
        Object::Stream(stream) => matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(subtype)) if subtype == b"Image"
        ),
        _ => false,
    })
}

struct CountingCapture {
    calls: Cell<usize>,
}

impl MapCapture for CountingCapture {
    fn capture(&self) -> Result<MapSnapshot, ReportError> {
        self.calls.set(self.calls.get() + 1);
        MapSnapshot::from_png(&png(4, 3))
    }
}

struct BrokenCapture;

impl MapCapture for BrokenCapture {
    fn capture(&self) -> Result<MapSnapshot, ReportError> {
        Err(ReportError::MapImage("renderer not ready".to_string()))
    }
}

#[test]
fn test_large_selection_paginates_with_repeated_headers_and_footers() {
    let store = building(120);
    let selection = SelectionState::all(&store);
    let report = ReportBuilder::new(&store, &selection)
        .generated_at(Local.with_ymd_and_hms(2026, 10, 18, 17, 5, 0).unwrap())
        .build()
        .unwrap();

    assert_eq!(
        report.filename,
        "Informe_Inmuebles_120_seleccionados_2026-10-18T17-05.pdf"
    );
    assert!(report.bytes.starts_with(b"%PDF-"));

    let pages = page_texts(&report.bytes);
    assert_eq!(pages.len() as u32, report.page_count);
    assert!(pages.len() >= 3, "120 rows should span several pages");

    let total = pages.len();
    let first = &pages[0];
    assert!(first.iter().any(|t| t == "INFORME DE INMUEBLES SELECCIONADOS"));
    assert!(first.iter().any(|t| t == "AV DE LA CONSTITUCION 7"));
    assert!(first.iter().any(|t| t == "TOTAL"));
    assert!(!first.iter().any(|t| t.starts_with("Página")));
    assert!(!first.iter().any(|t| t == "Ref. Catastral"));

    for (i, texts) in pages.iter().enumerate().skip(1) {
        let number = i + 1;
        let header_rows = texts.iter().filter(|t| *t == "Ref. Catastral").count();
        assert_eq!(header_rows, 1, "page {} should repeat the table header", number);

        let footer = format!("Página {} de {}", number, total);
        assert!(
            texts.contains(&footer),
            "page {} is missing its footer",
            number
        );
        assert!(texts.iter().any(|t| t == "Generado el 18/10/2026 17:05"));
        assert!(texts
            .iter()
            .any(|t| t == "Sistema de Gestión Catastral - JLA Asociados"));
    }

    let refs: Vec<String> = pages
        .iter()
        .flatten()
        .filter(|t| t.starts_with("REF-"))
        .cloned()
        .collect();
    let expected: Vec<String> = (0..120).map(|i| format!("REF-{:03}", i)).collect();
    assert_eq!(refs, expected);
}

#[test]
fn test_statistics_reflect_only_the_selection() {
    let store = building(10);
    let selection: SelectionState = [0, 2, 4].into_iter().collect();
    let report = ReportBuilder::new(&store, &selection).build().unwrap();

    let pages = page_texts(&report.bytes);
    let first = &pages[0];
    // 50 + 70 + 90
    assert!(first.iter().any(|t| t == "210 m²"));
    assert!(first.iter().any(|t| t == "3"));
    assert!(first.iter().any(|t| t == "100.0%"));

    let rows: Vec<&String> = pages[1].iter().filter(|t| t.starts_with("REF-")).collect();
    assert_eq!(rows, vec!["REF-000", "REF-002", "REF-004"]);
}

#[test]
fn test_empty_selection_produces_no_bytes_and_skips_capture() {
    let store = building(5);
    let capture = CountingCapture {
        calls: Cell::new(0),
    };
    let result = generate_report(&store, &SelectionState::new(), Some(&capture));
    assert!(matches!(result, Err(ReportError::NothingSelected)));
    assert_eq!(capture.calls.get(), 0);
}

#[test]
fn test_map_snapshot_is_embedded() {
    let store = building(5);
    let selection = SelectionState::all(&store);
    let capture = PngBytes(png(8, 6));
    let report = generate_report(&store, &selection, Some(&capture)).unwrap();

    assert!(has_image_xobject(&report.bytes));
    let pages = page_texts(&report.bytes);
    assert!(pages[0].iter().any(|t| t == "UBICACIÓN"));
}

#[test]
fn test_failed_map_capture_still_produces_report() {
    let store = building(5);
    let selection = SelectionState::all(&store);
    let report = generate_report(&store, &selection, Some(&BrokenCapture)).unwrap();

    assert!(!has_image_xobject(&report.bytes));
    let pages = page_texts(&report.bytes);
    assert!(!pages.iter().flatten().any(|t| t == "UBICACIÓN"));
    assert_eq!(report.page_count, 2);
}

#[test]
fn test_generate_report_captures_map_once() {
    let store = building(5);
    let selection = SelectionState::all(&store);
    let capture = CountingCapture {
        calls: Cell::new(0),
    };
    generate_report(&store, &selection, Some(&capture)).unwrap();
    assert_eq!(capture.calls.get(), 1);
}
