//! PDF reports over a unit selection
//!
//! [`ReportBuilder`] lays the report out as page-local draw operations and
//! renders them with lopdf using the standard Helvetica faces, so the output
//! needs no embedded fonts. An optional map snapshot is placed after the
//! statistics section.

pub mod builder;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod map;
pub mod metrics;
pub mod render;

pub use builder::{format_area, format_percent, GeneratedReport, ReportBuilder, Section};
pub use config::{PageConfig, Palette, ReportConfig, Typography, CONFIG_ENV_VAR};
pub use document::{Align, DrawOp, PageNumber, Rect, ReportDocument, TextStyle};
pub use error::ReportError;
pub use map::{resolve_map, MapCapture, MapSnapshot, PngBytes, PngFile};

/// Generate a report with default settings. The map is only captured once
/// the selection is known to be non-empty.
pub fn generate_report<'a>(
    store: &'a cadastre_core::UnitStore,
    selection: &'a cadastre_core::SelectionState,
    map: Option<&'a dyn MapCapture>,
) -> Result<GeneratedReport, ReportError> {
    let mut builder = ReportBuilder::new(store, selection);
    if let Some(capture) = map {
        builder = builder.map_capture(capture);
    }
    builder.build()
}
