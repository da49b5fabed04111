//! Draw operations for a report under construction
//!
//! The builder lays a report out as a flat list of page-local draw
//! operations in top-down layout coordinates. Rendering to PDF happens once
//! the whole document is known, which is what lets footers print
//! "page X of Y".

use crate::map::MapSnapshot;
use crate::metrics::text_width;

pub type PageNumber = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    /// Top edge, measured from the top of the page.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    pub is_bold: bool,
    pub align: Align,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            color: "#000000".to_string(),
            is_bold: false,
            align: Align::Left,
        }
    }
}

impl TextStyle {
    pub fn new(font_size: f64, color: &str) -> Self {
        Self {
            font_size,
            color: color.to_string(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Resource name of the standard font for this style.
    pub fn font_resource(&self) -> &'static str {
        if self.is_bold {
            "F2"
        } else {
            "F1"
        }
    }

    pub fn width_of(&self, text: &str) -> f64 {
        text_width(text, self.font_size, self.is_bold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text whose baseline sits at `y`; `x` is the anchor for `style.align`.
    Text {
        page: PageNumber,
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    Line {
        page: PageNumber,
        from: (f64, f64),
        to: (f64, f64),
        color: String,
        width: f64,
    },
    FillRect {
        page: PageNumber,
        rect: Rect,
        color: String,
    },
    /// The document's map snapshot, stretched to `rect`.
    Image { page: PageNumber, rect: Rect },
}

impl DrawOp {
    pub fn page(&self) -> PageNumber {
        match self {
            DrawOp::Text { page, .. } => *page,
            DrawOp::Line { page, .. } => *page,
            DrawOp::FillRect { page, .. } => *page,
            DrawOp::Image { page, .. } => *page,
        }
    }
}

/// A report being laid out: draw operations plus the running cursor.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    operations: Vec<DrawOp>,
    page_count: PageNumber,
    cursor_y: f64,
    image: Option<MapSnapshot>,
}

impl ReportDocument {
    /// A document with one empty page and the cursor at `top`.
    pub fn new(top: f64) -> Self {
        Self {
            operations: Vec::new(),
            page_count: 1,
            cursor_y: top,
            image: None,
        }
    }

    pub fn add(&mut self, op: DrawOp) {
        self.operations.push(op);
    }

    /// Draw on the page the cursor is on.
    pub fn current_page(&self) -> PageNumber {
        self.page_count
    }

    pub fn page_count(&self) -> PageNumber {
        self.page_count
    }

    pub fn cursor(&self) -> f64 {
        self.cursor_y
    }

    pub fn advance(&mut self, dy: f64) {
        self.cursor_y += dy;
    }

    /// Start a new page with the cursor back at `top`.
    pub fn new_page(&mut self, top: f64) -> PageNumber {
        self.page_count += 1;
        self.cursor_y = top;
        self.page_count
    }

    pub fn set_image(&mut self, image: MapSnapshot) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&MapSnapshot> {
        self.image.as_ref()
    }

    pub fn operations(&self) -> &[DrawOp] {
        &self.operations
    }

    pub fn operations_for_page(&self, page: PageNumber) -> Vec<&DrawOp> {
        self.operations
            .iter()
            .filter(|op| op.page() == page)
            .collect()
    }

    /// Text runs on a page, in drawing order.
    pub fn texts_on_page(&self, page: PageNumber) -> Vec<&str> {
        self.operations_for_page(page)
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(page: PageNumber, s: &str) -> DrawOp {
        DrawOp::Text {
            page,
            x: 0.0,
            y: 0.0,
            text: s.to_string(),
            style: TextStyle::default(),
        }
    }

    #[test]
    fn test_new_document_has_one_page() {
        let doc = ReportDocument::new(56.0);
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.cursor(), 56.0);
    }

    #[test]
    fn test_new_page_resets_cursor() {
        let mut doc = ReportDocument::new(50.0);
        doc.advance(300.0);
        assert_eq!(doc.cursor(), 350.0);
        assert_eq!(doc.new_page(50.0), 2);
        assert_eq!(doc.current_page(), 2);
        assert_eq!(doc.cursor(), 50.0);
    }

    #[test]
    fn test_operations_for_page() {
        let mut doc = ReportDocument::new(0.0);
        doc.add(text(1, "a"));
        doc.add(DrawOp::FillRect {
            page: 1,
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            color: "#FFFFFF".to_string(),
        });
        doc.add(text(2, "b"));

        assert_eq!(doc.operations_for_page(1).len(), 2);
        assert_eq!(doc.texts_on_page(1), vec!["a"]);
        assert_eq!(doc.texts_on_page(2), vec!["b"]);
        assert!(doc.texts_on_page(3).is_empty());
    }

    #[test]
    fn test_text_style_font_resource() {
        assert_eq!(TextStyle::default().font_resource(), "F1");
        assert_eq!(TextStyle::new(9.0, "#FFFFFF").bold().font_resource(), "F2");
    }
}
