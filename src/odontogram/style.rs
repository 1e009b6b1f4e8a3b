// src/odontogram/style.rs
//! The condition → style table. Rendering and the legend both read it.

use serde::Serialize;

use super::chart::{
    GeneralCondition, Marking, Material, MobilityGrade, SurfaceCondition, SurfaceRecord, ToothRecord,
};

pub const NEUTRAL_FILL: &str = "#ffffff";
pub const NEUTRAL_STROKE: &str = "#4b5563";
pub const NEUTRAL_STROKE_WIDTH: f64 = 1.0;
pub const EMPTY_SURFACE_FILL: &str = "transparent";
pub const SELECTION_STROKE: &str = "#2563eb";
pub const SELECTION_STROKE_WIDTH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overlay {
    /// Diagonal cross over the whole cell.
    Cross,
    FilledCircle,
    RingedCircle,
    /// Two short parallel diagonal strokes.
    DoubleSlash,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionStyle {
    pub fill: Option<&'static str>,
    /// Stroke and overlay color.
    pub ink: &'static str,
    pub stroke_width: Option<f64>,
    pub overlay: Option<Overlay>,
}

const fn fill(fill: &'static str, ink: &'static str) -> ConditionStyle {
    ConditionStyle {
        fill: Some(fill),
        ink,
        stroke_width: None,
        overlay: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKey {
    Sound,
    Absent,
    Implant,
    Crown,
    Prosthesis,
    EndodonticsTreated,
    Fractured,
    Caries,
    RestorationResin,
    RestorationAmalgam,
    RestorationCeramic,
    Sealant,
    Mobility1,
    Mobility2,
    Mobility3,
}

impl StyleKey {
    pub const ALL: [StyleKey; 15] = [
        StyleKey::Sound,
        StyleKey::Absent,
        StyleKey::Implant,
        StyleKey::Crown,
        StyleKey::Prosthesis,
        StyleKey::EndodonticsTreated,
        StyleKey::Fractured,
        StyleKey::Caries,
        StyleKey::RestorationResin,
        StyleKey::RestorationAmalgam,
        StyleKey::RestorationCeramic,
        StyleKey::Sealant,
        StyleKey::Mobility1,
        StyleKey::Mobility2,
        StyleKey::Mobility3,
    ];

    pub fn style(self) -> ConditionStyle {
        match self {
            StyleKey::Sound => fill(NEUTRAL_FILL, NEUTRAL_STROKE),
            StyleKey::Absent => ConditionStyle {
                overlay: Some(Overlay::Cross),
                ..fill("#e5e7eb", "#374151")
            },
            StyleKey::Implant => ConditionStyle {
                overlay: Some(Overlay::FilledCircle),
                ..fill("#c7d2fe", "#4338ca")
            },
            StyleKey::Crown => fill("#fde68a", "#b45309"),
            StyleKey::Prosthesis => fill("#99f6e4", "#0f766e"),
            StyleKey::EndodonticsTreated => ConditionStyle {
                fill: None,
                ink: "#be185d",
                stroke_width: None,
                overlay: Some(Overlay::RingedCircle),
            },
            StyleKey::Fractured => ConditionStyle {
                fill: None,
                ink: "#7c2d12",
                stroke_width: None,
                overlay: Some(Overlay::DoubleSlash),
            },
            StyleKey::Caries => fill("#ef4444", "#991b1b"),
            StyleKey::RestorationResin => fill("#93c5fd", "#1d4ed8"),
            StyleKey::RestorationAmalgam => fill("#9ca3af", "#374151"),
            StyleKey::RestorationCeramic => fill("#e0f2fe", "#0369a1"),
            StyleKey::Sealant => fill("#86efac", "#15803d"),
            StyleKey::Mobility1 => mobility("#f59e0b", 2.0),
            StyleKey::Mobility2 => mobility("#f97316", 3.0),
            StyleKey::Mobility3 => mobility("#dc2626", 4.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StyleKey::Sound => "Sound",
            StyleKey::Absent => "Absent",
            StyleKey::Implant => "Implant",
            StyleKey::Crown => "Crown",
            StyleKey::Prosthesis => "Prosthesis",
            StyleKey::EndodonticsTreated => "Endodontics",
            StyleKey::Fractured => "Fractured",
            StyleKey::Caries => "Caries",
            StyleKey::RestorationResin => "Resin",
            StyleKey::RestorationAmalgam => "Amalgam",
            StyleKey::RestorationCeramic => "Ceramic",
            StyleKey::Sealant => "Sealant",
            StyleKey::Mobility1 => "Mobility grade 1",
            StyleKey::Mobility2 => "Mobility grade 2",
            StyleKey::Mobility3 => "Mobility grade 3",
        }
    }

    pub fn for_general(condition: GeneralCondition) -> StyleKey {
        match condition {
            GeneralCondition::Absent => StyleKey::Absent,
            GeneralCondition::Implant => StyleKey::Implant,
            GeneralCondition::Crown => StyleKey::Crown,
            GeneralCondition::Prosthesis => StyleKey::Prosthesis,
            GeneralCondition::EndodonticsTreated => StyleKey::EndodonticsTreated,
            GeneralCondition::Fractured => StyleKey::Fractured,
        }
    }

    pub fn for_surface(record: &SurfaceRecord) -> Option<StyleKey> {
        Some(match record.condition? {
            SurfaceCondition::Caries => StyleKey::Caries,
            SurfaceCondition::Sealant => StyleKey::Sealant,
            SurfaceCondition::Restoration => match record.material {
                Some(Material::Amalgam) => StyleKey::RestorationAmalgam,
                Some(Material::Ceramic) => StyleKey::RestorationCeramic,
                // an unspecified material renders as resin
                Some(Material::Resin) | None => StyleKey::RestorationResin,
            },
        })
    }

    pub fn for_mobility(grade: MobilityGrade) -> StyleKey {
        match grade {
            MobilityGrade::Grade1 => StyleKey::Mobility1,
            MobilityGrade::Grade2 => StyleKey::Mobility2,
            MobilityGrade::Grade3 => StyleKey::Mobility3,
        }
    }

    /// Swatch shown next to a palette entry.
    pub fn for_marking(marking: &Marking) -> StyleKey {
        if let Some(condition) = marking.general_condition() {
            return StyleKey::for_general(condition);
        }
        if let Some(record) = marking.surface_record() {
            return StyleKey::for_surface(&record).unwrap_or(StyleKey::Sound);
        }
        match *marking {
            Marking::Mobility { grade } => StyleKey::for_mobility(grade),
            _ => StyleKey::Sound,
        }
    }
}

const fn mobility(ink: &'static str, width: f64) -> ConditionStyle {
    ConditionStyle {
        fill: None,
        ink,
        stroke_width: Some(width),
        overlay: None,
    }
}

/// Final paint for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementStyle {
    pub visible: bool,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub overlay: Option<(Overlay, &'static str)>,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            visible: true,
            fill: NEUTRAL_FILL,
            stroke: NEUTRAL_STROKE,
            stroke_width: NEUTRAL_STROKE_WIDTH,
            overlay: None,
        }
    }
}

impl ElementStyle {
    fn select(&mut self, selected: bool, read_only: bool) {
        if selected && !read_only {
            self.stroke = SELECTION_STROKE;
            self.stroke_width = SELECTION_STROKE_WIDTH;
        }
    }
}

/// Whole-tooth outline: condition fill, mobility stroke, overlay marker,
/// then selection.
pub fn resolve_tooth(record: Option<&ToothRecord>, selected: bool, read_only: bool) -> ElementStyle {
    let mut style = ElementStyle::default();

    if let Some(record) = record {
        if let Some(condition) = record.general_condition {
            let cs = StyleKey::for_general(condition).style();
            if let Some(fill) = cs.fill {
                style.fill = fill;
            }
            style.overlay = cs.overlay.map(|o| (o, cs.ink));
        }
        if let Some(grade) = record.mobility {
            let cs = StyleKey::for_mobility(grade).style();
            style.stroke = cs.ink;
            style.stroke_width = cs.stroke_width.unwrap_or(NEUTRAL_STROKE_WIDTH);
        }
    }

    style.select(selected, read_only);
    style
}

/// One surface of a tooth. Surfaces of absent teeth are hidden.
pub fn resolve_surface(
    tooth: Option<&ToothRecord>,
    surface: Option<&SurfaceRecord>,
    selected: bool,
    read_only: bool,
) -> ElementStyle {
    let mut style = ElementStyle {
        fill: EMPTY_SURFACE_FILL,
        ..ElementStyle::default()
    };

    if tooth.is_some_and(ToothRecord::is_absent) {
        style.visible = false;
        return style;
    }

    if let Some(key) = surface.and_then(StyleKey::for_surface) {
        let cs = key.style();
        style.fill = cs.fill.unwrap_or(EMPTY_SURFACE_FILL);
    }

    style.select(selected, read_only);
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> ToothRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn default_tooth_is_neutral() {
        assert_eq!(resolve_tooth(None, false, false), ElementStyle::default());
    }

    #[test]
    fn absent_tooth_hides_surfaces_and_crosses_out() {
        let r = record(serde_json::json!({"generalCondition": "absent"}));
        let tooth = resolve_tooth(Some(&r), false, false);
        assert_eq!(tooth.fill, StyleKey::Absent.style().fill.unwrap());
        assert_eq!(tooth.overlay.map(|o| o.0), Some(Overlay::Cross));

        let surface = resolve_surface(Some(&r), None, true, false);
        assert!(!surface.visible);
    }

    #[test]
    fn crown_fills_tooth_but_keeps_surfaces_visible() {
        let r = record(serde_json::json!({"generalCondition": "crown"}));
        assert_eq!(resolve_tooth(Some(&r), false, false).fill, "#fde68a");
        let surface = resolve_surface(Some(&r), None, false, false);
        assert!(surface.visible);
        assert_eq!(surface.fill, EMPTY_SURFACE_FILL);
    }

    #[test]
    fn restoration_fill_depends_on_material() {
        let resin = SurfaceRecord {
            condition: Some(SurfaceCondition::Restoration),
            material: Some(Material::Resin),
        };
        let amalgam = SurfaceRecord {
            material: Some(Material::Amalgam),
            ..resin
        };
        let a = resolve_surface(None, Some(&resin), false, false);
        let b = resolve_surface(None, Some(&amalgam), false, false);
        assert_ne!(a.fill, b.fill);
        assert_eq!(b.fill, StyleKey::RestorationAmalgam.style().fill.unwrap());
    }

    #[test]
    fn mobility_grades_escalate_stroke() {
        let widths: Vec<f64> = ["grade1", "grade2", "grade3"]
            .iter()
            .map(|g| {
                let r = record(serde_json::json!({ "mobility": g }));
                resolve_tooth(Some(&r), false, false).stroke_width
            })
            .collect();
        assert!(widths[0] > NEUTRAL_STROKE_WIDTH);
        assert!(widths[0] < widths[1] && widths[1] < widths[2]);
    }

    #[test]
    fn overlays_stay_on_top_of_fill() {
        let r = record(serde_json::json!({"generalCondition": "endodontics-treated", "mobility": "grade2"}));
        let s = resolve_tooth(Some(&r), false, false);
        assert_eq!(s.fill, NEUTRAL_FILL);
        assert_eq!(s.overlay.map(|o| o.0), Some(Overlay::RingedCircle));
        assert_eq!(s.stroke, StyleKey::Mobility2.style().ink);
    }

    #[test]
    fn selection_applies_last_and_not_when_read_only() {
        let r = record(serde_json::json!({"mobility": "grade3"}));
        let selected = resolve_tooth(Some(&r), true, false);
        assert_eq!(selected.stroke, SELECTION_STROKE);
        assert_eq!(selected.stroke_width, SELECTION_STROKE_WIDTH);

        let read_only = resolve_tooth(Some(&r), true, true);
        assert_eq!(read_only.stroke, StyleKey::Mobility3.style().ink);
    }

    #[test]
    fn palette_swatches_follow_the_table() {
        assert_eq!(
            StyleKey::for_marking(&Marking::Restoration { material: Material::Ceramic }),
            StyleKey::RestorationCeramic
        );
        assert_eq!(
            StyleKey::for_marking(&Marking::Mobility { grade: MobilityGrade::Grade1 }),
            StyleKey::Mobility1
        );
        assert_eq!(StyleKey::for_marking(&Marking::Clear), StyleKey::Sound);
    }
}
