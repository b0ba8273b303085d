//! 検出結果の型
//!
//! 全フロントエンド共通:
//! - BoundingBox: プレビュー座標でのオーバーレイ矩形
//! - Detection: デコード済みシンボル1件（生成後は不変）

use serde::{Deserialize, Serialize};
use url::Url;

use crate::symbol::SymbolType;

/// Axis-aligned rectangle in preview coordinates (right/bottom exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Smallest rectangle enclosing all corner points of a (possibly skewed) quad.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bbox = Self::new(x0, y0, x0, y0);
        for (x, y) in iter {
            bbox.left = bbox.left.min(x);
            bbox.top = bbox.top.min(y);
            bbox.right = bbox.right.max(x);
            bbox.bottom = bbox.bottom.max(y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.left, self.top, self.right, self.bottom)
    }
}

/// One decoded barcode/QR symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Decoded payload; absent when the decoder produced no text.
    #[serde(default)]
    pub raw_value: Option<String>,

    #[serde(default)]
    pub symbol_type: SymbolType,

    /// Used only for overlay drawing.
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl Detection {
    pub fn new(
        raw_value: Option<String>,
        symbol_type: SymbolType,
        bounding_box: Option<BoundingBox>,
    ) -> Self {
        Self {
            raw_value,
            symbol_type,
            bounding_box,
        }
    }

    /// Detection whose type is inferred from the payload text.
    pub fn from_payload(payload: impl Into<String>, bounding_box: Option<BoundingBox>) -> Self {
        let payload = payload.into();
        let symbol_type = SymbolType::classify(&payload);
        Self::new(Some(payload), symbol_type, bounding_box)
    }

    /// Payload present and not blank after trimming.
    pub fn has_payload(&self) -> bool {
        self.raw_value
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Equality used to suppress redundant updates: payload and bounding region.
    pub fn same_as(&self, other: &Detection) -> bool {
        self.raw_value == other.raw_value && self.bounding_box == other.bounding_box
    }

    /// Openable link, offered only for URL detections.
    pub fn link(&self) -> Option<Url> {
        if self.symbol_type != SymbolType::Url {
            return None;
        }
        self.raw_value
            .as_deref()
            .and_then(|v| Url::parse(v.trim()).ok())
    }
}

/// `same_as` lifted over optional detections; absent only equals absent.
pub fn same_detection(a: Option<&Detection>, b: Option<&Detection>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}
