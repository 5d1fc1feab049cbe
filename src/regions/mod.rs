//! Region configuration and pixel mapping.
//!
//! A region set places each of the seven receipt fields on the page, keyed by
//! the field's Chinese label. Coordinates are either normalized fractions of
//! the page (scaled by the target dimension directly) or pixel values against
//! a reference canvas declared by `_refWidth`/`_refHeight` (rescaled by the
//! ratio of target to reference size).

mod crop;
mod extractor;

pub use extractor::{RegionExtraction, RegionExtractor};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::ExtractError;
use crate::domain::{EvidenceMap, FieldKey};
use crate::processors::geometry::BoundingBox;

/// One field's placement, as two corners in configuration space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Deserialize)]
struct RawRegionSet {
    #[serde(rename = "_refWidth")]
    ref_width: Option<f32>,
    #[serde(rename = "_refHeight")]
    ref_height: Option<f32>,
    #[serde(flatten)]
    regions: BTreeMap<String, Region>,
}

/// A complete placement for all seven fields.
#[derive(Debug, Clone)]
pub struct RegionSet {
    ref_width: Option<f32>,
    ref_height: Option<f32>,
    regions: BTreeMap<FieldKey, Region>,
}

impl RegionSet {
    /// Parses and checks a configuration document. Every field label must be
    /// present; unknown keys beyond the reference dimensions are rejected by
    /// the region shape they fail to deserialize into.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ExtractError> {
        let raw: RawRegionSet = serde_json::from_value(value)
            .map_err(|e| ExtractError::region_config(format!("malformed region config: {e}")))?;
        let mut regions = BTreeMap::new();
        for key in FieldKey::ALL {
            let region = raw.regions.get(key.label()).copied().ok_or_else(|| {
                ExtractError::region_config(format!("missing region for {}", key.label()))
            })?;
            regions.insert(key, region);
        }
        Ok(RegionSet {
            ref_width: raw.ref_width.filter(|w| *w > 0.0),
            ref_height: raw.ref_height.filter(|h| *h > 0.0),
            regions,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ExtractError> {
        let value = serde_json::from_str(text)
            .map_err(|e| ExtractError::region_config(format!("malformed region config: {e}")))?;
        Self::from_value(value)
    }

    /// Loader variant that degrades to "no configuration": a malformed or
    /// incomplete document is logged and dropped rather than failing the
    /// caller.
    pub fn load(text: &str) -> Option<Self> {
        match Self::from_json(text) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(target: "regions", error = %e, "ignoring unusable region config");
                None
            }
        }
    }

    /// Reference canvas, only honored when both dimensions are positive.
    fn reference(&self) -> Option<(f32, f32)> {
        Some((self.ref_width?, self.ref_height?))
    }

    /// Maps one field's region to pixel coordinates of a `width` by `height`
    /// page.
    pub fn pixel_box(&self, key: FieldKey, width: u32, height: u32) -> BoundingBox {
        let region = self.regions[&key];
        let (w, h) = (width as f32, height as f32);
        match self.reference() {
            Some((rw, rh)) => BoundingBox::new(
                region.x0 * (w / rw),
                region.y0 * (h / rh),
                region.x1 * (w / rw),
                region.y1 * (h / rh),
            ),
            None => BoundingBox::new(region.x0 * w, region.y0 * h, region.x1 * w, region.y1 * h),
        }
    }

    /// Pixel boxes for every field, for overlay rendering. Empty when either
    /// target dimension is zero.
    pub fn pixel_boxes(&self, width: u32, height: u32) -> EvidenceMap {
        if width == 0 || height == 0 {
            return EvidenceMap::new();
        }
        FieldKey::ALL
            .into_iter()
            .map(|key| (key, self.pixel_box(key, width, height)))
            .collect()
    }
}
