// src/odontogram/palette.rs

use serde::Serialize;

use super::chart::{Marking, Material, MobilityGrade, Target};
use super::geometry::{Point, Rect};
use super::style::StyleKey;

/// Screen footprint used to keep the palette inside the chart.
pub const PALETTE_WIDTH: f64 = 180.0;
pub const PALETTE_HEIGHT: f64 = 220.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub label: &'static str,
    pub marking: Marking,
    pub swatch: StyleKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteSection {
    pub title: &'static str,
    pub entries: Vec<PaletteEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    pub target: Target,
    pub position: Point,
    pub sections: Vec<PaletteSection>,
}

const WHOLE_TOOTH_GENERAL: [Marking; 6] = [
    Marking::Absent,
    Marking::Implant,
    Marking::Crown,
    Marking::Prosthesis,
    Marking::EndodonticsTreated,
    Marking::Fractured,
];

const WHOLE_TOOTH_MOBILITY: [Marking; 3] = [
    Marking::Mobility { grade: MobilityGrade::Grade1 },
    Marking::Mobility { grade: MobilityGrade::Grade2 },
    Marking::Mobility { grade: MobilityGrade::Grade3 },
];

const SURFACE_CONDITIONS: [Marking; 2] = [Marking::Caries, Marking::Sealant];

const SURFACE_RESTORATIONS: [Marking; 3] = [
    Marking::Restoration { material: Material::Resin },
    Marking::Restoration { material: Material::Amalgam },
    Marking::Restoration { material: Material::Ceramic },
];

fn section(title: &'static str, markings: &[Marking]) -> PaletteSection {
    PaletteSection {
        title,
        entries: markings
            .iter()
            .map(|m| {
                let swatch = StyleKey::for_marking(m);
                PaletteEntry {
                    label: swatch.label(),
                    marking: *m,
                    swatch,
                }
            })
            .collect(),
    }
}

/// Whole teeth get general conditions and mobility, surfaces get surface
/// conditions. Both can be reset to sound.
pub fn sections_for(target: &Target) -> Vec<PaletteSection> {
    let mut sections = if target.is_whole_tooth() {
        vec![
            section("General", &WHOLE_TOOTH_GENERAL),
            section("Mobility", &WHOLE_TOOTH_MOBILITY),
        ]
    } else {
        vec![
            section("Surface", &SURFACE_CONDITIONS),
            section("Restoration", &SURFACE_RESTORATIONS),
        ]
    };
    sections.push(section("Reset", &[Marking::Clear]));
    sections
}

pub fn offers(target: &Target, marking: &Marking) -> bool {
    match marking {
        Marking::Clear => true,
        Marking::Mobility { .. } => target.is_whole_tooth(),
        m if m.general_condition().is_some() => target.is_whole_tooth(),
        _ => !target.is_whole_tooth(),
    }
}

/// Opens below-right of the anchor. Flips to the other side of the anchor
/// on an axis only when the flipped palette fits there; otherwise it stays
/// at the anchor and may overflow the chart.
pub fn place(anchor: Point, bounds: &Rect) -> Point {
    let mut x = anchor.x;
    let mut y = anchor.y;
    if x + PALETTE_WIDTH > bounds.right() && anchor.x - PALETTE_WIDTH >= bounds.x {
        x = anchor.x - PALETTE_WIDTH;
    }
    if y + PALETTE_HEIGHT > bounds.bottom() && anchor.y - PALETTE_HEIGHT >= bounds.y {
        y = anchor.y - PALETTE_HEIGHT;
    }
    Point::new(x.max(bounds.x), y.max(bounds.y))
}

impl Palette {
    pub fn open(target: Target, anchor: Point, bounds: &Rect) -> Self {
        Palette {
            target,
            position: place(anchor, bounds),
            sections: sections_for(&target),
        }
    }
}
