use crate::catalog::{BoxRecord, ShelfDirection};
use crate::jitter::jitter;
use rand::Rng;

/// How far every box sits back from the shelf board's front edge before the
/// per-box jitter is applied.
const FRONT_EDGE_SETBACK: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct PackOptions {
    pub padding_x: f32,
    pub padding_z: f32,
    pub row_gap: f32,
    /// Probability of flipping an eligible box front-facing for variety.
    /// Zero makes the pack fully deterministic; the depth jitter stays on
    /// either way since it is seeded by box identity, not by this draw.
    pub front_flip_chance: f64,
    pub fallback_length: f32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            padding_x: 2.0,
            padding_z: 0.5,
            row_gap: 1.5,
            front_flip_chance: 0.10,
            fallback_length: 10.0,
        }
    }
}

impl From<&crate::config::LayoutConfig> for PackOptions {
    fn from(cfg: &crate::config::LayoutConfig) -> Self {
        Self {
            padding_x: cfg.padding_x,
            padding_z: cfg.padding_z,
            row_gap: cfg.row_gap,
            front_flip_chance: cfg.front_flip_chance,
            fallback_length: cfg.fallback_length,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShelfRow {
    pub boxes: Vec<BoxRecord>,
    pub max_height: f32,
    pub width: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub rows: Vec<ShelfRow>,
    /// Effective shelf length actually used; may be shrunk from the nominal
    /// request when the filtered catalog is small.
    pub shelf_length: f32,
}

impl Layout {
    pub fn box_count(&self) -> usize {
        self.rows.iter().map(|row| row.boxes.len()).sum()
    }
}

/// Greedy first-fit shelf packer. Boxes keep catalog order; the only
/// reordering-adjacent behavior is the randomized front-facing flip. The
/// whole pass is synchronous and never errors: degenerate input degrades to
/// fallback dimensions instead.
pub fn pack(
    boxes: &[BoxRecord],
    nominal_length: f32,
    options: &PackOptions,
    rng: &mut impl Rng,
) -> Layout {
    // Packing mutates per-box placement fields, so it works on its own
    // snapshot and the caller's catalog stays pristine.
    let mut cleaned: Vec<BoxRecord> = boxes.to_vec();
    if cleaned.is_empty() {
        let shelf_length =
            if nominal_length.is_finite() { nominal_length } else { options.fallback_length };
        return Layout { rows: Vec::new(), shelf_length };
    }

    let mut shelf_length = nominal_length;
    let mut total_width = 0.0;
    for b in &mut cleaned {
        b.shelf_footprint = if b.dir == ShelfDirection::Front { b.width } else { b.depth };
        total_width += b.shelf_footprint;
    }
    if total_width < nominal_length - options.padding_x {
        if let Some(last) = cleaned.last() {
            shelf_length = total_width + last.shelf_footprint + options.padding_x / 2.0;
        }
    }

    let single = cleaned.len() == 1;
    let mut rows: Vec<ShelfRow> = Vec::new();
    let mut row_boxes: Vec<BoxRecord> = Vec::new();
    let mut row_max_height = 0.0_f32;
    let mut active_width = 0.0_f32;
    let mut shelf_x = options.padding_x;
    // Footprint, center x, and direction of the previously placed box.
    let mut last: Option<(f32, f32, ShelfDirection)> = None;

    for i in 0..cleaned.len() {
        let flip_roll = match last {
            Some((_, _, dir)) => {
                dir != ShelfDirection::Front && rng.gen_bool(options.front_flip_chance)
            }
            None => false,
        };
        if flip_roll
            && cleaned[i].worth_front_view
            && active_width + cleaned[i].width < shelf_length - 2.0
        {
            cleaned[i].dir = ShelfDirection::Front;
        }

        let z_variance = jitter(&format!("{}_z", cleaned[i].slug));
        let g = &mut cleaned[i];

        // Center-to-center advance: half the previous footprint plus half of
        // this one, which self-corrects when a flip changes the footprint.
        if g.dir == ShelfDirection::Left {
            g.shelf_z = (options.padding_z - z_variance) - g.width / 2.0 - FRONT_EDGE_SETBACK;
            g.shelf_footprint = g.depth;
            if let Some((last_fp, last_x, _)) = last {
                shelf_x = last_x + last_fp / 2.0 + g.depth / 2.0;
            }
        } else {
            g.shelf_z = (options.padding_z - z_variance) - g.depth / 2.0 - FRONT_EDGE_SETBACK;
            g.shelf_footprint = g.width;
            if let Some((last_fp, last_x, _)) = last {
                shelf_x = last_x + last_fp / 2.0 + g.width / 2.0;
            } else {
                shelf_x += g.width / 2.0;
            }
        }

        active_width += g.shelf_footprint;
        g.shelf_x = shelf_x;

        if active_width < shelf_length - options.padding_x || single {
            if single {
                g.dir = ShelfDirection::Front;
                shelf_length = options.padding_x + g.width + options.padding_x;
                g.shelf_x = g.width / 2.0 + g.width / 4.0;
            }
            g.row = rows.len();
            row_boxes.push(g.clone());
            if g.height > row_max_height {
                row_max_height = g.height;
            }
        } else {
            rows.push(ShelfRow {
                boxes: std::mem::take(&mut row_boxes),
                max_height: row_max_height,
                width: shelf_length,
                y: 0.0,
            });
            g.shelf_x = options.padding_x;
            if g.dir == ShelfDirection::Front {
                g.shelf_x += g.shelf_footprint / 2.0 - options.padding_x / 2.0;
            }
            g.row = rows.len();
            row_boxes = vec![g.clone()];
            active_width = g.shelf_footprint;
            row_max_height = g.height;
            shelf_x = g.shelf_x;
        }
        last = Some((g.shelf_footprint, g.shelf_x, g.dir));
    }

    rows.push(ShelfRow {
        boxes: row_boxes,
        max_height: row_max_height,
        width: shelf_length,
        y: 0.0,
    });

    // Rows stack downward from Y=0, each offset by the taller row above it.
    let mut cumulative_y = 0.0;
    for row in &mut rows {
        row.y = cumulative_y;
        cumulative_y -= row.max_height + options.row_gap;
    }

    if !shelf_length.is_finite() {
        shelf_length = options.fallback_length;
    }
    for row in &mut rows {
        if !row.width.is_finite() {
            row.width = shelf_length;
        }
    }

    Layout { rows, shelf_length }
}
