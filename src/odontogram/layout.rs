// src/odontogram/layout.rs
//! Deterministic placement of the 32 tooth cells and their surface regions.
//!
//! Each tooth is a square cell. Inside a thin rim the cell is split into a
//! center square (occlusal/incisal) and four trapezoids. Mesial always faces
//! the midline; vestibular/labial faces the lips, i.e. up for the upper arch
//! and down for the lower arch.

use serde::Serialize;

use super::catalogue::{CATALOGUE, ROW_LEN, Surface, ToothEntry, ToothId};
use super::chart::Target;
use super::geometry::{Point, Polygon, Rect, Region};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutParams {
    pub cell_size: f64,
    pub gap: f64,
    pub midline_gap: f64,
    pub row_gap: f64,
    pub margin: f64,
    pub label_height: f64,
    /// Band between outline and surfaces that selects the whole tooth.
    pub rim: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::with_cell_size(40.0)
    }
}

impl LayoutParams {
    pub fn with_cell_size(cell_size: f64) -> Self {
        let cell_size = cell_size.max(8.0);
        Self {
            cell_size,
            gap: cell_size * 0.15,
            midline_gap: cell_size * 0.4,
            row_gap: cell_size * 0.6,
            margin: cell_size * 0.3,
            label_height: cell_size * 0.4,
            rim: cell_size * 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceShape {
    pub id: String,
    pub target: Target,
    pub surface: Surface,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToothLayout {
    pub id: String,
    pub tooth: ToothEntry,
    pub target: Target,
    pub outline: Rect,
    pub label_box: Rect,
    pub label_anchor: Point,
    pub surfaces: Vec<SurfaceShape>,
}

impl ToothLayout {
    pub fn surface(&self, surface: Surface) -> Option<&SurfaceShape> {
        self.surfaces.iter().find(|s| s.surface == surface)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub params: LayoutParams,
    pub width: f64,
    pub height: f64,
    pub midline_x: f64,
    pub teeth: Vec<ToothLayout>,
}

/// Lays out the static catalogue. Pure: same params, same geometry.
pub fn generate(params: &LayoutParams) -> ChartLayout {
    let p = params;
    let pitch = p.cell_size + p.gap;
    let row_height = p.cell_size + p.label_height + p.row_gap;

    let teeth = CATALOGUE
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let row = i / ROW_LEN;
            let col = i % ROW_LEN;
            let midline_shift = if col >= ROW_LEN / 2 { p.midline_gap } else { 0.0 };
            let x = p.margin + col as f64 * pitch + midline_shift;
            let y = p.margin + row as f64 * row_height;
            tooth_layout(entry, Rect::new(x, y, p.cell_size, p.cell_size), p)
        })
        .collect();

    let half = (ROW_LEN / 2) as f64;
    let left_edge = p.margin + (half - 1.0) * pitch + p.cell_size;
    let right_edge = p.margin + half * pitch + p.midline_gap;

    ChartLayout {
        params: *p,
        width: 2.0 * p.margin + ROW_LEN as f64 * p.cell_size + (ROW_LEN as f64 - 1.0) * p.gap + p.midline_gap,
        height: 2.0 * p.margin + 2.0 * (p.cell_size + p.label_height) + p.row_gap,
        midline_x: (left_edge + right_edge) / 2.0,
        teeth,
    }
}

fn tooth_layout(entry: &ToothEntry, outline: Rect, p: &LayoutParams) -> ToothLayout {
    let inner = outline.inset(p.rim);
    let center = inner.inset(inner.width / 4.0);

    let tl = Point::new(inner.x, inner.y);
    let tr = Point::new(inner.right(), inner.y);
    let br = Point::new(inner.right(), inner.bottom());
    let bl = Point::new(inner.x, inner.bottom());
    let ctl = Point::new(center.x, center.y);
    let ctr = Point::new(center.right(), center.y);
    let cbr = Point::new(center.right(), center.bottom());
    let cbl = Point::new(center.x, center.bottom());

    let top = Polygon::new(vec![tl, tr, ctr, ctl]);
    let bottom = Polygon::new(vec![bl, cbl, cbr, br]);
    let left = Polygon::new(vec![tl, ctl, cbl, bl]);
    let right = Polygon::new(vec![tr, br, cbr, ctr]);

    let upper = entry.quadrant.is_upper();
    let (mesial, distal) = if entry.quadrant.midline_on_right() {
        (right, left)
    } else {
        (left, right)
    };
    let (outer, inner_side) = if upper { (top, bottom) } else { (bottom, top) };

    let surfaces = entry
        .tooth_type
        .surfaces()
        .iter()
        .map(|&surface| {
            let region = match surface {
                s if s.is_center() => Region::Rect(center),
                Surface::Mesial => Region::Polygon(mesial.clone()),
                Surface::Distal => Region::Polygon(distal.clone()),
                s if s.is_outer() => Region::Polygon(outer.clone()),
                _ => Region::Polygon(inner_side.clone()),
            };
            let target = Target {
                tooth: entry.id,
                surface: Some(surface),
            };
            SurfaceShape {
                id: target.to_string(),
                target,
                surface,
                region,
            }
        })
        .collect();

    let target = Target::tooth(entry.id);
    ToothLayout {
        id: target.to_string(),
        tooth: *entry,
        target,
        outline,
        label_box: Rect::new(outline.x, outline.bottom(), outline.width, p.label_height),
        label_anchor: Point::new(outline.center().x, outline.bottom() + p.label_height * 0.8),
        surfaces,
    }
}

impl ChartLayout {
    pub fn tooth(&self, id: ToothId) -> Option<&ToothLayout> {
        self.teeth.iter().find(|t| t.tooth.id == id)
    }

    pub fn region(&self, target: &Target) -> Option<&Region> {
        let tooth = self.tooth(target.tooth)?;
        match target.surface {
            Some(s) => tooth.surface(s).map(|shape| &shape.region),
            None => None,
        }
    }

    /// Where a palette for `target` should open when no click point is known.
    pub fn anchor_for(&self, target: &Target) -> Option<Point> {
        if let Some(region) = self.region(target) {
            return Some(region.center());
        }
        self.tooth(target.tooth).map(|t| t.outline.center())
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Maps a point to the shape under it. Surfaces of teeth for which
    /// `surfaces_visible` is false are skipped and the whole tooth is hit.
    pub fn hit_test(&self, p: Point, surfaces_visible: impl Fn(ToothId) -> bool) -> Option<Target> {
        let tooth = self
            .teeth
            .iter()
            .find(|t| t.outline.contains(p) || t.label_box.contains(p))?;

        if surfaces_visible(tooth.tooth.id) {
            if let Some(shape) = tooth.surfaces.iter().find(|s| s.region.contains(p)) {
                return Some(shape.target);
            }
        }
        Some(tooth.target)
    }
}
