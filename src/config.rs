use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_shelf_length")]
    pub shelf_length: f32,
    #[serde(default = "LayoutConfig::default_padding_x")]
    pub padding_x: f32,
    #[serde(default = "LayoutConfig::default_padding_z")]
    pub padding_z: f32,
    #[serde(default = "LayoutConfig::default_row_gap")]
    pub row_gap: f32,
    #[serde(default = "LayoutConfig::default_front_flip_chance")]
    pub front_flip_chance: f64,
    #[serde(default = "LayoutConfig::default_fallback_length")]
    pub fallback_length: f32,
}

impl LayoutConfig {
    const fn default_shelf_length() -> f32 {
        100.0
    }

    const fn default_padding_x() -> f32 {
        2.0
    }

    const fn default_padding_z() -> f32 {
        0.5
    }

    const fn default_row_gap() -> f32 {
        1.5
    }

    const fn default_front_flip_chance() -> f64 {
        0.10
    }

    const fn default_fallback_length() -> f32 {
        10.0
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            shelf_length: Self::default_shelf_length(),
            padding_x: Self::default_padding_x(),
            padding_z: Self::default_padding_z(),
            row_gap: Self::default_row_gap(),
            front_flip_chance: Self::default_front_flip_chance(),
            fallback_length: Self::default_fallback_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "CameraConfig::default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "CameraConfig::default_start_z")]
    pub start_z: f32,
    #[serde(default = "CameraConfig::default_target_z")]
    pub target_z: f32,
    #[serde(default = "CameraConfig::default_travel_duration")]
    pub travel_duration: f32,
}

impl CameraConfig {
    const fn default_min_distance() -> f32 {
        20.0
    }

    const fn default_max_distance() -> f32 {
        50.0
    }

    const fn default_start_z() -> f32 {
        30.0
    }

    const fn default_target_z() -> f32 {
        -4.0
    }

    const fn default_travel_duration() -> f32 {
        1.2
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_distance: Self::default_min_distance(),
            max_distance: Self::default_max_distance(),
            start_z: Self::default_start_z(),
            target_z: Self::default_target_z(),
            travel_duration: Self::default_travel_duration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "InteractionConfig::default_hover_raise")]
    pub hover_raise: f32,
    #[serde(default = "InteractionConfig::default_active_z_offset")]
    pub active_z_offset: f32,
    #[serde(default = "InteractionConfig::default_presentation_yaw")]
    pub presentation_yaw: f32,
    #[serde(default = "InteractionConfig::default_min_wheel_distance")]
    pub min_wheel_distance: f32,
    #[serde(default = "InteractionConfig::default_pan_sensitivity")]
    pub pan_sensitivity: f32,
    #[serde(default = "InteractionConfig::default_tap_threshold_px")]
    pub tap_threshold_px: f32,
    #[serde(default = "InteractionConfig::default_double_click_window")]
    pub double_click_window: f32,
    #[serde(default = "InteractionConfig::default_drag_settle")]
    pub drag_settle: f32,
}

impl InteractionConfig {
    const fn default_hover_raise() -> f32 {
        2.0
    }

    const fn default_active_z_offset() -> f32 {
        10.0
    }

    const fn default_presentation_yaw() -> f32 {
        0.4
    }

    const fn default_min_wheel_distance() -> f32 {
        6.0
    }

    const fn default_pan_sensitivity() -> f32 {
        0.02
    }

    const fn default_tap_threshold_px() -> f32 {
        2.0
    }

    const fn default_double_click_window() -> f32 {
        0.35
    }

    const fn default_drag_settle() -> f32 {
        0.15
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_raise: Self::default_hover_raise(),
            active_z_offset: Self::default_active_z_offset(),
            presentation_yaw: Self::default_presentation_yaw(),
            min_wheel_distance: Self::default_min_wheel_distance(),
            pan_sensitivity: Self::default_pan_sensitivity(),
            tap_threshold_px: Self::default_tap_threshold_px(),
            double_click_window: Self::default_double_click_window(),
            drag_settle: Self::default_drag_settle(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityConfig {
    #[serde(default = "VisibilityConfig::default_check_interval")]
    pub check_interval: f32,
    #[serde(default = "VisibilityConfig::default_margin")]
    pub margin: f32,
    #[serde(default = "VisibilityConfig::default_stagger_window")]
    pub stagger_window: f32,
    #[serde(default = "VisibilityConfig::default_entry_bounce_window")]
    pub entry_bounce_window: f32,
}

impl VisibilityConfig {
    const fn default_check_interval() -> f32 {
        0.2
    }

    const fn default_margin() -> f32 {
        1.5
    }

    const fn default_stagger_window() -> f32 {
        0.2
    }

    const fn default_entry_bounce_window() -> f32 {
        0.4
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            check_interval: Self::default_check_interval(),
            margin: Self::default_margin(),
            stagger_window: Self::default_stagger_window(),
            entry_bounce_window: Self::default_entry_bounce_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ShelfConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub visibility: VisibilityConfig,
}

impl ShelfConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    /// Touch devices get a shorter shelf and hold the active box a little
    /// further back. Device detection itself belongs to the host.
    pub fn for_touch(mut self) -> Self {
        self.layout.shelf_length = 40.0;
        self.interaction.active_z_offset = 12.0;
        self
    }
}
