//! Coordinate transformation between layout and PDF space
//!
//! Layout works top-down from the top-left corner of the page, the way a
//! cursor moves through a report. PDF user space has its origin at the
//! bottom-left with y growing upwards.

/// Convert a layout y (distance from the top edge) to PDF y.
pub fn layout_to_pdf_y(layout_y: f64, page_height: f64) -> f64 {
    page_height - layout_y
}

/// PDF origin (bottom-left corner) of a box placed at layout position
/// `(x, top)` with the given height.
pub fn box_origin(x: f64, top: f64, height: f64, page_height: f64) -> (f64, f64) {
    (x, page_height - (top + height))
}
