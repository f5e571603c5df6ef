//! Row / column / grid arrangement of a selection.
//!
//! Pure functions: they read the selected nodes' geometry (in selection
//! order) and return new positions. Sizes are never changed. The store
//! writes the result back as one batch with one history capture.

use crate::id::NodeId;
use crate::model::Geometry;

/// Arrangement requested by `align_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Row,
    Column,
    Grid,
}

impl Alignment {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "row" => Some(Alignment::Row),
            "column" | "col" => Some(Alignment::Column),
            "grid" => Some(Alignment::Grid),
            _ => None,
        }
    }
}

/// New top-left corner for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

/// Compute placements for `items` (selection order). Returns an empty list
/// for fewer than two items.
pub fn arrange(items: &[(NodeId, Geometry)], alignment: Alignment, gap: f64) -> Vec<Placement> {
    if items.len() < 2 {
        return Vec::new();
    }
    match alignment {
        Alignment::Row => arrange_row(items, gap),
        Alignment::Column => arrange_column(items, gap),
        Alignment::Grid => arrange_grid(items, gap),
    }
}

/// Sort by x, lay out left to right from the leftmost x, all on the mean y.
/// Equal x keeps selection order (stable sort).
pub fn arrange_row(items: &[(NodeId, Geometry)], gap: f64) -> Vec<Placement> {
    let mut sorted: Vec<&(NodeId, Geometry)> = items.iter().collect();
    sorted.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

    let avg_y = items.iter().map(|(_, g)| g.y).sum::<f64>() / items.len() as f64;
    let mut cursor = sorted[0].1.x;
    sorted
        .into_iter()
        .map(|(id, g)| {
            let placed = Placement {
                id: *id,
                x: cursor,
                y: avg_y,
            };
            cursor += g.width + gap;
            placed
        })
        .collect()
}

/// Sort by y, lay out top to bottom from the topmost y, all on the mean x.
pub fn arrange_column(items: &[(NodeId, Geometry)], gap: f64) -> Vec<Placement> {
    let mut sorted: Vec<&(NodeId, Geometry)> = items.iter().collect();
    sorted.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));

    let avg_x = items.iter().map(|(_, g)| g.x).sum::<f64>() / items.len() as f64;
    let mut cursor = sorted[0].1.y;
    sorted
        .into_iter()
        .map(|(id, g)| {
            let placed = Placement {
                id: *id,
                x: avg_x,
                y: cursor,
            };
            cursor += g.height + gap;
            placed
        })
        .collect()
}

/// Uniform cells sized to the largest item, `ceil(sqrt(n))` columns,
/// anchored at the first selected node, filled in selection order and
/// centered per cell.
pub fn arrange_grid(items: &[(NodeId, Geometry)], gap: f64) -> Vec<Placement> {
    let n = items.len();
    let num_cols = (n as f64).sqrt().ceil() as usize;
    let cell_w = items.iter().map(|(_, g)| g.width).fold(f64::MIN, f64::max);
    let cell_h = items.iter().map(|(_, g)| g.height).fold(f64::MIN, f64::max);
    let (start_x, start_y) = (items[0].1.x, items[0].1.y);

    items
        .iter()
        .enumerate()
        .map(|(i, (id, g))| {
            let col = (i % num_cols) as f64;
            let row = (i / num_cols) as f64;
            Placement {
                id: *id,
                x: start_x + col * (cell_w + gap) + (cell_w - g.width) / 2.0,
                y: start_y + row * (cell_h + gap) + (cell_h - g.height) / 2.0,
            }
        })
        .collect()
}
