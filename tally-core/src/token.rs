//! Positioned text fragments as handed over by the ingestion layer.
//!
//! Coordinates use a top-left origin: `top` grows downwards the page,
//! `x0`/`x1` are the left/right edges.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal center, used for column classification.
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Horizontal slice `[from, to)` of this box expressed as character
    /// fractions of a text of `len` chars. Assumes evenly spaced glyphs.
    pub fn char_slice(&self, from: usize, to: usize, len: usize) -> BBox {
        if len == 0 {
            return *self;
        }
        let w = self.width() / len as f64;
        BBox {
            x0: self.x0 + w * from as f64,
            top: self.top,
            x1: self.x0 + w * to.min(len) as f64,
            bottom: self.bottom,
        }
    }
}

/// One recognized text fragment.
///
/// Geometry is fixed once ingested; only `text` may be rewritten by the
/// normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    pub text: String,
    /// Zero-based page index.
    pub page: usize,
    #[serde(flatten)]
    pub bbox: BBox,
    /// OCR confidence in `0.0..=1.0`, absent for embedded text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, page: usize, x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            page,
            bbox: BBox::new(x0, top, x1, bottom),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn center_x(&self) -> f64 {
        self.bbox.center_x()
    }

    pub fn top(&self) -> f64 {
        self.bbox.top
    }

    /// Copy of this token carrying `text` over the sub-box of chars `[from, to)`.
    pub fn slice(&self, text: impl Into<String>, from: usize, to: usize) -> PositionedToken {
        let len = self.text.chars().count();
        PositionedToken {
            text: text.into(),
            page: self.page,
            bbox: self.bbox.char_slice(from, to, len),
            confidence: self.confidence,
        }
    }
}
