use crate::catalog::BoxKind;
use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Model detail level for a box. Tiers only ever move forward; a shelved box
/// keeps whatever it has loaded even after scrolling out of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    Placeholder,
    Low,
    High,
}

#[derive(Debug, Clone, Copy)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Hinged panel extracted from a loaded model: the geometry offset that puts
/// the hinge edge at the rotation origin, and where the re-pivoted panel
/// anchors on the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatefoldPanel {
    pub pivot_offset: Vec3,
    pub anchor: Vec3,
}

/// Re-pivots a gatefold panel so its hinge edge becomes the rotation origin.
/// Vertical-hinge kinds fold about the top edge; the back-hinged kind folds
/// about the left edge of the back face; everything else folds about the
/// left edge of the front face.
pub fn gatefold_panel(bounds: &MeshBounds, kind: BoxKind, box_dims: Vec3) -> Option<GatefoldPanel> {
    if !kind.is_gatefold() {
        return None;
    }
    let z_center = (bounds.min.z + bounds.max.z) / 2.0;
    if kind.is_vertical_gatefold() {
        Some(GatefoldPanel {
            pivot_offset: Vec3::new(0.0, -bounds.max.y, -z_center),
            anchor: Vec3::new(0.0, box_dims.y / 2.0, box_dims.z / 2.0),
        })
    } else if kind.is_back_gatefold() {
        Some(GatefoldPanel {
            pivot_offset: Vec3::new(-bounds.min.x, 0.0, -z_center),
            anchor: Vec3::new(-box_dims.x / 2.0, 0.0, -box_dims.z / 2.0),
        })
    } else {
        Some(GatefoldPanel {
            pivot_offset: Vec3::new(-bounds.min.x, 0.0, -z_center),
            anchor: Vec3::new(-box_dims.x / 2.0, 0.0, box_dims.z / 2.0),
        })
    }
}

/// A loaded box model: overall bounds plus the gatefold panel when the node
/// is present and the box kind folds.
#[derive(Debug, Clone)]
pub struct BoxModel {
    pub source: PathBuf,
    pub bounds: MeshBounds,
    pub gatefold: Option<GatefoldPanel>,
}

#[derive(Debug)]
enum LoadState {
    Queued(QualityTier),
    Loaded(QualityTier, BoxModel),
    Failed,
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub path: String,
    pub tier: QualityTier,
    pub model: BoxModel,
}

/// One-time-initialized compressed-texture transcoder shared by every model
/// load. Construction is the expensive part; afterwards it is a read-only
/// decode helper.
pub struct TextureTranscoder {
    supported_extensions: Vec<&'static str>,
}

impl TextureTranscoder {
    fn new() -> Self {
        Self { supported_extensions: vec!["png", "jpg", "jpeg", "ktx2"] }
    }

    pub fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.supported_extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub fn decode(&self, path: &Path) -> Result<image::RgbaImage> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read texture {}", path.display()))?;
        let decoded = image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode texture {}", path.display()))?;
        Ok(decoded.to_rgba8())
    }
}

/// Registry of box models keyed by catalog model path. Requests are
/// idempotent and monotonic: asking for `High` upgrades a `Low` entry, a
/// later `Low` request never downgrades. Actual parsing happens when the
/// host drains the queue from its tick, so layout never blocks on a load.
#[derive(Default)]
pub struct ModelRegistry {
    entries: HashMap<String, LoadState>,
    kinds: HashMap<String, (BoxKind, Vec3)>,
    queue: Vec<String>,
    transcoder: Option<Arc<TextureTranscoder>>,
    transcoder_builds: usize,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared transcoder handle; the first caller constructs it, every
    /// later caller gets the same instance.
    pub fn transcoder(&mut self) -> Arc<TextureTranscoder> {
        if self.transcoder.is_none() {
            self.transcoder = Some(Arc::new(TextureTranscoder::new()));
            self.transcoder_builds += 1;
        }
        Arc::clone(self.transcoder.as_ref().expect("transcoder just constructed"))
    }

    pub fn transcoder_builds(&self) -> usize {
        self.transcoder_builds
    }

    pub fn request(&mut self, path: &str, tier: QualityTier, kind: BoxKind, box_dims: Vec3) {
        if tier == QualityTier::Placeholder {
            return;
        }
        self.kinds.insert(path.to_string(), (kind, box_dims));
        match self.entries.get_mut(path) {
            None => {
                self.entries.insert(path.to_string(), LoadState::Queued(tier));
                self.queue.push(path.to_string());
            }
            Some(LoadState::Queued(current)) => {
                if tier > *current {
                    *current = tier;
                }
            }
            Some(LoadState::Loaded(current, _)) => {
                if tier > *current {
                    self.entries.insert(path.to_string(), LoadState::Queued(tier));
                    self.queue.push(path.to_string());
                }
            }
            // A failed load stays on its placeholder; no automatic retry.
            Some(LoadState::Failed) => {}
        }
    }

    pub fn tier(&self, path: &str) -> QualityTier {
        match self.entries.get(path) {
            Some(LoadState::Loaded(tier, _)) => *tier,
            _ => QualityTier::Placeholder,
        }
    }

    pub fn model(&self, path: &str) -> Option<&BoxModel> {
        match self.entries.get(path) {
            Some(LoadState::Loaded(_, model)) => Some(model),
            _ => None,
        }
    }

    /// Resolves the on-disk path for a tier: the low tier loads the reduced
    /// `-low` variant sitting next to the full model.
    pub fn tier_path(path: &str, tier: QualityTier) -> String {
        match tier {
            QualityTier::Low => path.replace(".glb", "-low.glb"),
            _ => path.to_string(),
        }
    }

    /// Performs queued loads. Failures pin the entry to `Failed` and log;
    /// the box keeps its placeholder and the rest of the shelf is unaffected.
    pub fn drain_queue(&mut self) -> Vec<LoadCompletion> {
        let queue = std::mem::take(&mut self.queue);
        let mut completions = Vec::new();
        for path in queue {
            let tier = match self.entries.get(&path) {
                Some(LoadState::Queued(tier)) => *tier,
                _ => continue,
            };
            let (kind, dims) = self
                .kinds
                .get(&path)
                .copied()
                .unwrap_or((BoxKind::BigBox, Vec3::ONE));
            match load_model(&Self::tier_path(&path, tier), kind, dims) {
                Ok(model) => {
                    self.entries.insert(path.clone(), LoadState::Loaded(tier, model.clone()));
                    completions.push(LoadCompletion { path, tier, model });
                }
                Err(err) => {
                    eprintln!("[assets] model load failed for {path}: {err:?}");
                    self.entries.insert(path, LoadState::Failed);
                }
            }
        }
        completions
    }
}

/// Parses a glTF model, computing overall bounds and extracting the node
/// named `Gatefold` when present.
fn load_model(path: &str, kind: BoxKind, box_dims: Vec3) -> Result<BoxModel> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("failed to import model {path}"))?;

    let mut overall: Option<MeshBounds> = None;
    let mut gatefold_bounds: Option<MeshBounds> = None;

    for node in document.nodes() {
        let Some(mesh) = node.mesh() else { continue };
        let mut bounds: Option<MeshBounds> = None;
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(positions) = reader.read_positions() else { continue };
            for position in positions {
                let p = Vec3::from_array(position);
                bounds = Some(match bounds {
                    None => MeshBounds { min: p, max: p },
                    Some(b) => MeshBounds { min: b.min.min(p), max: b.max.max(p) },
                });
            }
        }
        let Some(bounds) = bounds else { continue };
        overall = Some(match overall {
            None => bounds,
            Some(b) => MeshBounds { min: b.min.min(bounds.min), max: b.max.max(bounds.max) },
        });
        if node.name() == Some("Gatefold") {
            gatefold_bounds = Some(bounds);
        }
    }

    let bounds = overall.ok_or_else(|| anyhow!("model {path} contains no positions"))?;
    let gatefold = gatefold_bounds.and_then(|b| gatefold_panel(&b, kind, box_dims));
    Ok(BoxModel { source: PathBuf::from(path), bounds, gatefold })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_bounds() -> MeshBounds {
        MeshBounds { min: Vec3::new(-2.0, -3.0, -0.2), max: Vec3::new(2.0, 3.0, 0.2) }
    }

    #[test]
    fn vertical_gatefold_pivots_at_top_edge() {
        let dims = Vec3::new(4.0, 6.0, 1.0);
        let panel =
            gatefold_panel(&panel_bounds(), BoxKind::BigBoxWithVerticalGatefold, dims).unwrap();
        assert_eq!(panel.pivot_offset, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(panel.anchor, Vec3::new(0.0, 3.0, 0.5));
    }

    #[test]
    fn back_gatefold_anchors_on_back_face() {
        let dims = Vec3::new(4.0, 6.0, 1.0);
        let panel =
            gatefold_panel(&panel_bounds(), BoxKind::BigBoxWithBackGatefold, dims).unwrap();
        assert_eq!(panel.pivot_offset, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(panel.anchor, Vec3::new(-2.0, 0.0, -0.5));
    }

    #[test]
    fn standard_gatefold_anchors_on_front_left_edge() {
        let dims = Vec3::new(4.0, 6.0, 1.0);
        let panel = gatefold_panel(&panel_bounds(), BoxKind::BigBoxWithGatefold, dims).unwrap();
        assert_eq!(panel.anchor, Vec3::new(-2.0, 0.0, 0.5));
    }

    #[test]
    fn non_gatefold_kind_has_no_panel() {
        let dims = Vec3::new(4.0, 6.0, 1.0);
        assert!(gatefold_panel(&panel_bounds(), BoxKind::BigBox, dims).is_none());
    }

    #[test]
    fn low_tier_rewrites_model_path() {
        assert_eq!(
            ModelRegistry::tier_path("models/outcast.glb", QualityTier::Low),
            "models/outcast-low.glb"
        );
        assert_eq!(
            ModelRegistry::tier_path("models/outcast.glb", QualityTier::High),
            "models/outcast.glb"
        );
    }

    #[test]
    fn requests_are_monotonic() {
        let mut registry = ModelRegistry::new();
        let dims = Vec3::ONE;
        registry.request("a.glb", QualityTier::High, BoxKind::BigBox, dims);
        registry.request("a.glb", QualityTier::Low, BoxKind::BigBox, dims);
        match registry.entries.get("a.glb") {
            Some(LoadState::Queued(tier)) => assert_eq!(*tier, QualityTier::High),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn failed_load_pins_placeholder_without_retry() {
        let mut registry = ModelRegistry::new();
        registry.request("missing.glb", QualityTier::Low, BoxKind::BigBox, Vec3::ONE);
        let completions = registry.drain_queue();
        assert!(completions.is_empty());
        assert_eq!(registry.tier("missing.glb"), QualityTier::Placeholder);
        // A later request against the failed entry stays inert.
        registry.request("missing.glb", QualityTier::High, BoxKind::BigBox, Vec3::ONE);
        assert!(registry.drain_queue().is_empty());
    }

    #[test]
    fn transcoder_is_constructed_once() {
        let mut registry = ModelRegistry::new();
        let a = registry.transcoder();
        let b = registry.transcoder();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.transcoder_builds(), 1);
        assert!(a.supports(Path::new("textures/cover.ktx2")));
        assert!(!a.supports(Path::new("textures/cover.tga")));
    }
}
