use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which face of the box runs parallel to the shelf edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelfDirection {
    Left,
    Front,
}

impl Default for ShelfDirection {
    fn default() -> Self {
        ShelfDirection::Left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxKind {
    BigBox,
    SmallBox,
    EidosTrapezoid,
    DvdCaseSlipcover,
    OldSmallBox,
    BoxInBox,
    BigBoxWithGatefold,
    SmallBoxWithGatefold,
    BigBoxWithVerticalGatefold,
    BigBoxWithBackGatefold,
    NewSmallBox,
    NewBigBox,
    SmallBoxForDvd,
    BigLongBox,
    BigBoxWithVerticalGatefoldButHorizontal,
    SmallBoxWithGatefoldWithRightFlap,
    DvdCaseSlipcoverWithGatefold,
    NewBoxInBox,
    VinylLikeWithGatefold,
    VinylLikeWithDoubleGatefold,
    BigBoxWithFrontAndBackGatefold,
}

impl Default for BoxKind {
    fn default() -> Self {
        BoxKind::BigBox
    }
}

impl BoxKind {
    /// Kinds that carry a hinged gatefold panel at all.
    pub fn is_gatefold(self) -> bool {
        matches!(
            self,
            BoxKind::BigBoxWithGatefold
                | BoxKind::BigBoxWithVerticalGatefold
                | BoxKind::SmallBoxWithGatefold
                | BoxKind::EidosTrapezoid
                | BoxKind::BigBoxWithBackGatefold
                | BoxKind::BigBoxWithVerticalGatefoldButHorizontal
                | BoxKind::SmallBoxWithGatefoldWithRightFlap
                | BoxKind::DvdCaseSlipcoverWithGatefold
                | BoxKind::VinylLikeWithGatefold
                | BoxKind::VinylLikeWithDoubleGatefold
                | BoxKind::BigBoxWithFrontAndBackGatefold
        )
    }

    /// Hinge at the top edge, opening upward about the horizontal axis.
    pub fn is_vertical_gatefold(self) -> bool {
        matches!(
            self,
            BoxKind::BigBoxWithVerticalGatefold
                | BoxKind::EidosTrapezoid
                | BoxKind::BigBoxWithVerticalGatefoldButHorizontal
        )
    }

    /// Hinge on the left edge of the back face rather than the front.
    pub fn is_back_gatefold(self) -> bool {
        matches!(self, BoxKind::BigBoxWithBackGatefold)
    }
}

/// A developer or publisher reference attached to a box.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FacetRef {
    pub slug: String,
    pub name: String,
}

/// A facet list entry (developer/publisher) with its catalog count.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Facet {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub variant_count: u32,
}

/// One catalog item. Placement fields are recomputed wholesale by every
/// packing pass over a cloned snapshot; nothing else mutates them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoxRecord {
    pub id: i64,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
    #[serde(rename = "d")]
    pub depth: f32,
    #[serde(default)]
    pub dir: ShelfDirection,
    #[serde(default)]
    pub kind: BoxKind,
    #[serde(default)]
    pub worth_front_view: bool,
    #[serde(default)]
    pub gatefold_transparent: bool,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub developers: Vec<FacetRef>,
    #[serde(default)]
    pub publishers: Vec<FacetRef>,

    #[serde(skip)]
    pub shelf_footprint: f32,
    #[serde(skip)]
    pub shelf_x: f32,
    #[serde(skip)]
    pub shelf_z: f32,
    #[serde(skip)]
    pub row: usize,
}

impl BoxRecord {
    pub fn is_gatefold(&self) -> bool {
        self.kind.is_gatefold()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub boxes: Vec<BoxRecord>,
    pub developers: Vec<Facet>,
    pub publishers: Vec<Facet>,
}

impl Catalog {
    /// Parses a catalog box list, skipping individual malformed records. One
    /// bad box must never prevent the rest of the shelf from rendering.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_slice(bytes).context("catalog is not a JSON array")?;
        let mut boxes = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<BoxRecord>(value) {
                Ok(record) => boxes.push(record),
                Err(err) => eprintln!("[catalog] skipping malformed box record: {err}"),
            }
        }
        Ok(Self { boxes, developers: Vec::new(), publishers: Vec::new() })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json_bytes(&bytes)
    }

    /// Parses a developer/publisher facet list as served next to the catalog.
    pub fn facets_from_json_bytes(bytes: &[u8]) -> Result<Vec<Facet>> {
        serde_json::from_slice(bytes).context("facet list is not a JSON array")
    }

    pub fn set_facets(&mut self, developers: Vec<Facet>, publishers: Vec<Facet>) {
        self.developers = developers;
        self.publishers = publishers;
    }

    pub fn by_id(&self, id: i64) -> Option<&BoxRecord> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&BoxRecord> {
        self.boxes.iter().find(|b| b.slug == slug)
    }

    /// Boxes whose developer list contains the given slug, in catalog order.
    pub fn filter_by_developer(&self, slug: &str) -> Vec<BoxRecord> {
        self.boxes.iter().filter(|b| b.developers.iter().any(|d| d.slug == slug)).cloned().collect()
    }

    /// Boxes whose publisher list contains the given slug, in catalog order.
    pub fn filter_by_publisher(&self, slug: &str) -> Vec<BoxRecord> {
        self.boxes.iter().filter(|b| b.publishers.iter().any(|p| p.slug == slug)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"[
            {"id": 1, "slug": "alpha", "title": "Alpha", "w": 4.0, "h": 6.0, "d": 1.5,
             "dir": "left", "kind": "big_box", "worth_front_view": true,
             "developers": [{"slug": "lucas", "name": "Lucas"}]},
            {"id": 2, "slug": "beta", "w": 3.0, "h": 5.0, "d": 1.0,
             "dir": "front", "kind": "big_box_with_gatefold"},
            {"id": 3, "slug": "broken", "w": "not-a-number"}
        ]"#
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let catalog = Catalog::from_json_bytes(sample_json().as_bytes()).unwrap();
        assert_eq!(catalog.boxes.len(), 2);
        assert_eq!(catalog.boxes[0].slug, "alpha");
        assert_eq!(catalog.boxes[1].kind, BoxKind::BigBoxWithGatefold);
    }

    #[test]
    fn developer_filter_matches_slug() {
        let catalog = Catalog::from_json_bytes(sample_json().as_bytes()).unwrap();
        let filtered = catalog.filter_by_developer("lucas");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
        assert!(catalog.filter_by_developer("sierra").is_empty());
    }

    #[test]
    fn facet_list_parses_with_counts() {
        let json = r#"[{"id": 1, "slug": "lucas", "name": "Lucas", "variant_count": 12},
                       {"id": 2, "slug": "sierra", "name": "Sierra"}]"#;
        let facets = Catalog::facets_from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].variant_count, 12);
        assert_eq!(facets[1].variant_count, 0);
    }

    #[test]
    fn gatefold_classification() {
        assert!(BoxKind::BigBoxWithGatefold.is_gatefold());
        assert!(BoxKind::EidosTrapezoid.is_vertical_gatefold());
        assert!(BoxKind::BigBoxWithBackGatefold.is_back_gatefold());
        assert!(!BoxKind::BigBox.is_gatefold());
        assert!(!BoxKind::BigBoxWithGatefold.is_vertical_gatefold());
    }
}
