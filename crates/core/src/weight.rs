//! Content-type selection weights.

use serde::{Deserialize, Serialize};

use crate::ContentType;

/// Lowest weight an adaptation step may produce.
pub const MIN_WEIGHT: u32 = 5;

/// Highest weight an adaptation step may produce.
pub const MAX_WEIGHT: u32 = 30;

/// Sum the weight set is renormalized to.
pub const WEIGHT_TOTAL: u32 = 100;

/// Selection weight for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeWeight {
    /// Content type
    pub content_type: ContentType,
    /// Relative weight
    pub weight: u32,
}

impl ContentTypeWeight {
    /// Create a weight entry.
    pub fn new(content_type: ContentType, weight: u32) -> Self {
        Self { content_type, weight }
    }
}
