// src/odontogram/chart.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalogue::{Surface, ToothId, ToothType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("unknown tooth id: {0}")]
    UnknownTooth(String),
    #[error("unknown surface: {0}")]
    UnknownSurface(String),
    #[error("surface {surface} is not valid for tooth {tooth} ({tooth_type})")]
    IllegalSurface {
        tooth: ToothId,
        tooth_type: ToothType,
        surface: Surface,
    },
    #[error("{0} can only be applied to a whole tooth")]
    WholeToothOnly(&'static str),
    #[error("{0} can only be applied to a surface")]
    SurfaceOnly(&'static str),
    #[error("{marking} is not offered for target {target}")]
    NotInPalette { marking: &'static str, target: Target },
    #[error("nothing is selected")]
    NotSelecting,
}

impl ChartError {
    /// Stable code for the API error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ChartError::UnknownTooth(_) => "UNKNOWN_TOOTH",
            ChartError::UnknownSurface(_) => "UNKNOWN_SURFACE",
            ChartError::IllegalSurface { .. } => "ILLEGAL_SURFACE",
            ChartError::WholeToothOnly(_) => "WHOLE_TOOTH_ONLY",
            ChartError::SurfaceOnly(_) => "SURFACE_ONLY",
            ChartError::NotInPalette { .. } => "NOT_IN_PALETTE",
            ChartError::NotSelecting => "NOT_SELECTING",
        }
    }
}

/* -------------------------
   Conditions
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneralCondition {
    Absent,
    Implant,
    Crown,
    Prosthesis,
    EndodonticsTreated,
    Fractured,
}

impl GeneralCondition {
    /// Whole-tooth states that carry no surface or mobility detail.
    pub fn is_whole_tooth(self) -> bool {
        matches!(
            self,
            GeneralCondition::Absent
                | GeneralCondition::Implant
                | GeneralCondition::Crown
                | GeneralCondition::Prosthesis
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceCondition {
    Caries,
    Restoration,
    Sealant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    Resin,
    Amalgam,
    Ceramic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MobilityGrade {
    Grade1,
    Grade2,
    Grade3,
}

/* -------------------------
   Records
--------------------------*/

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<SurfaceCondition>,
    /// Only meaningful for restorations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToothRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_condition: Option<GeneralCondition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub surfaces: BTreeMap<Surface, SurfaceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobility: Option<MobilityGrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ToothRecord {
    pub fn is_empty(&self) -> bool {
        self.general_condition.is_none()
            && self.surfaces.is_empty()
            && self.mobility.is_none()
            && self.notes.is_none()
    }

    pub fn is_absent(&self) -> bool {
        self.general_condition == Some(GeneralCondition::Absent)
    }

    fn clear_whole_tooth_condition(&mut self) {
        if self.general_condition.is_some_and(GeneralCondition::is_whole_tooth) {
            self.general_condition = None;
        }
    }
}

/* -------------------------
   Targets & markings
--------------------------*/

/// A whole tooth, or one surface of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub tooth: ToothId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<Surface>,
}

impl Target {
    pub fn tooth(tooth: ToothId) -> Self {
        Target {
            tooth,
            surface: None,
        }
    }

    pub fn surface(tooth: ToothId, surface: Surface) -> Result<Self, ChartError> {
        let target = Target {
            tooth,
            surface: Some(surface),
        };
        target.validate()?;
        Ok(target)
    }

    pub fn is_whole_tooth(&self) -> bool {
        self.surface.is_none()
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        match self.surface {
            Some(surface) if !self.tooth.has_surface(surface) => Err(ChartError::IllegalSurface {
                tooth: self.tooth,
                tooth_type: self.tooth.tooth_type(),
                surface,
            }),
            _ => Ok(()),
        }
    }
}

/// Stable element id: "16" or "16:occlusal".
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.surface {
            Some(surface) => write!(f, "{}:{}", self.tooth, surface),
            None => write!(f, "{}", self.tooth),
        }
    }
}

impl FromStr for Target {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((tooth, surface)) => Target::surface(tooth.parse()?, surface.parse()?),
            None => Ok(Target::tooth(s.parse()?)),
        }
    }
}

/// One classification action. Payload-carrying kinds hold their details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Marking {
    Clear,
    Absent,
    Implant,
    Crown,
    Prosthesis,
    EndodonticsTreated,
    Fractured,
    Caries,
    Restoration { material: Material },
    Sealant,
    Mobility { grade: MobilityGrade },
}

impl Marking {
    pub fn kind(&self) -> &'static str {
        match self {
            Marking::Clear => "clear",
            Marking::Absent => "absent",
            Marking::Implant => "implant",
            Marking::Crown => "crown",
            Marking::Prosthesis => "prosthesis",
            Marking::EndodonticsTreated => "endodontics-treated",
            Marking::Fractured => "fractured",
            Marking::Caries => "caries",
            Marking::Restoration { .. } => "restoration",
            Marking::Sealant => "sealant",
            Marking::Mobility { .. } => "mobility",
        }
    }

    pub fn general_condition(&self) -> Option<GeneralCondition> {
        match self {
            Marking::Absent => Some(GeneralCondition::Absent),
            Marking::Implant => Some(GeneralCondition::Implant),
            Marking::Crown => Some(GeneralCondition::Crown),
            Marking::Prosthesis => Some(GeneralCondition::Prosthesis),
            Marking::EndodonticsTreated => Some(GeneralCondition::EndodonticsTreated),
            Marking::Fractured => Some(GeneralCondition::Fractured),
            _ => None,
        }
    }

    pub fn surface_record(&self) -> Option<SurfaceRecord> {
        let (condition, material) = match *self {
            Marking::Caries => (SurfaceCondition::Caries, None),
            Marking::Restoration { material } => (SurfaceCondition::Restoration, Some(material)),
            Marking::Sealant => (SurfaceCondition::Sealant, None),
            _ => return None,
        };
        Some(SurfaceRecord {
            condition: Some(condition),
            material,
        })
    }
}

/* -------------------------
   Chart
--------------------------*/

/// Sparse chart: teeth without a record are sound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chart {
    teeth: BTreeMap<ToothId, ToothRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChartSummary {
    pub marked_teeth: usize,
    pub missing_teeth: usize,
    pub mobile_teeth: usize,
    pub carious_surfaces: usize,
    pub restored_surfaces: usize,
    pub sealed_surfaces: usize,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a host-supplied initial chart. Missing means unmarked.
    pub fn load(initial: Option<Chart>) -> Result<Chart, ChartError> {
        let chart = initial.unwrap_or_default();
        chart.validate()?;
        Ok(normalize(chart))
    }

    /// Every stored surface must be legal for its tooth type.
    pub fn validate(&self) -> Result<(), ChartError> {
        for (&tooth, record) in &self.teeth {
            for &surface in record.surfaces.keys() {
                Target {
                    tooth,
                    surface: Some(surface),
                }
                .validate()?;
            }
        }
        Ok(())
    }

    pub fn get(&self, tooth: ToothId) -> Option<&ToothRecord> {
        self.teeth.get(&tooth)
    }

    pub fn surface(&self, tooth: ToothId, surface: Surface) -> Option<&SurfaceRecord> {
        self.get(tooth).and_then(|r| r.surfaces.get(&surface))
    }

    pub fn teeth(&self) -> impl Iterator<Item = (ToothId, &ToothRecord)> {
        self.teeth.iter().map(|(&id, r)| (id, r))
    }

    pub fn len(&self) -> usize {
        self.teeth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }

    /// Absent teeth have no addressable surfaces.
    pub fn surfaces_visible(&self, tooth: ToothId) -> bool {
        !self.get(tooth).is_some_and(ToothRecord::is_absent)
    }

    /// Applies one marking. Contract violations are rejected before any
    /// change is made; the chart is normalized afterwards.
    pub fn apply_marking(&mut self, target: &Target, marking: &Marking) -> Result<(), ChartError> {
        target.validate()?;

        match *marking {
            Marking::Clear => match target.surface {
                None => {
                    self.teeth.remove(&target.tooth);
                }
                Some(surface) => {
                    if let Some(record) = self.teeth.get_mut(&target.tooth) {
                        record.surfaces.remove(&surface);
                    }
                }
            },
            Marking::Mobility { grade } => {
                if target.surface.is_some() {
                    return Err(ChartError::WholeToothOnly(marking.kind()));
                }
                let record = self.teeth.entry(target.tooth).or_default();
                record.clear_whole_tooth_condition();
                record.mobility = Some(grade);
            }
            _ => {
                if let Some(condition) = marking.general_condition() {
                    if target.surface.is_some() {
                        return Err(ChartError::WholeToothOnly(marking.kind()));
                    }
                    let record = self.teeth.entry(target.tooth).or_default();
                    record.general_condition = Some(condition);
                    if condition.is_whole_tooth() {
                        record.surfaces.clear();
                        record.mobility = None;
                    }
                } else if let Some(surface_record) = marking.surface_record() {
                    let Some(surface) = target.surface else {
                        return Err(ChartError::SurfaceOnly(marking.kind()));
                    };
                    let record = self.teeth.entry(target.tooth).or_default();
                    record.clear_whole_tooth_condition();
                    record.surfaces.insert(surface, surface_record);
                }
            }
        }

        *self = normalize(std::mem::take(self));
        Ok(())
    }

    /// Sets or clears (blank text) the free-text notes of a tooth.
    pub fn set_notes(&mut self, tooth: ToothId, notes: Option<&str>) {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        match notes {
            Some(text) => {
                self.teeth.entry(tooth).or_default().notes = Some(text.to_string());
            }
            None => {
                if let Some(record) = self.teeth.get_mut(&tooth) {
                    record.notes = None;
                }
            }
        }
        *self = normalize(std::mem::take(self));
    }

    pub fn summary(&self) -> ChartSummary {
        let mut s = ChartSummary {
            marked_teeth: self.teeth.len(),
            ..ChartSummary::default()
        };
        for record in self.teeth.values() {
            if record.is_absent() {
                s.missing_teeth += 1;
            }
            if record.mobility.is_some() {
                s.mobile_teeth += 1;
            }
            for surface in record.surfaces.values() {
                match surface.condition {
                    Some(SurfaceCondition::Caries) => s.carious_surfaces += 1,
                    Some(SurfaceCondition::Restoration) => s.restored_surfaces += 1,
                    Some(SurfaceCondition::Sealant) => s.sealed_surfaces += 1,
                    None => {}
                }
            }
        }
        s
    }
}

/// Restores every structural invariant: drops empty surfaces and records,
/// stale materials, blank notes and detail under whole-tooth conditions.
pub fn normalize(chart: Chart) -> Chart {
    let teeth = chart
        .teeth
        .into_iter()
        .filter_map(|(id, record)| {
            let record = normalize_record(record);
            (!record.is_empty()).then_some((id, record))
        })
        .collect();
    Chart { teeth }
}

fn normalize_record(mut record: ToothRecord) -> ToothRecord {
    if record.general_condition.is_some_and(GeneralCondition::is_whole_tooth) {
        record.surfaces.clear();
        record.mobility = None;
    }
    record.surfaces.retain(|_, s| {
        if s.condition != Some(SurfaceCondition::Restoration) {
            s.material = None;
        }
        s.condition.is_some()
    });
    record.notes = record
        .notes
        .take()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    record
}


#[cfg(test)]
mod properties {
    use super::*;
    use crate::odontogram::catalogue::CATALOGUE;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn tooth_strategy() -> impl Strategy<Value = ToothId> {
        (0..CATALOGUE.len()).prop_map(|i| CATALOGUE[i].id)
    }

    /// A whole tooth, or one of the five surfaces its type has.
    fn target_strategy() -> impl Strategy<Value = Target> {
        (tooth_strategy(), proptest::option::of(0usize..5)).prop_map(|(tooth, face)| Target {
            tooth,
            surface: face.map(|k| tooth.surfaces()[k]),
        })
    }

    fn material_strategy() -> impl Strategy<Value = Material> {
        prop_oneof![
            Just(Material::Resin),
            Just(Material::Amalgam),
            Just(Material::Ceramic),
        ]
    }

    fn grade_strategy() -> impl Strategy<Value = MobilityGrade> {
        prop_oneof![
            Just(MobilityGrade::Grade1),
            Just(MobilityGrade::Grade2),
            Just(MobilityGrade::Grade3),
        ]
    }

    fn whole_tooth_condition_strategy() -> impl Strategy<Value = Marking> {
        prop_oneof![
            Just(Marking::Absent),
            Just(Marking::Implant),
            Just(Marking::Crown),
            Just(Marking::Prosthesis),
        ]
    }

    fn tooth_marking_strategy() -> impl Strategy<Value = Marking> {
        prop_oneof![
            Just(Marking::Clear),
            whole_tooth_condition_strategy(),
            Just(Marking::EndodonticsTreated),
            Just(Marking::Fractured),
            grade_strategy().prop_map(|grade| Marking::Mobility { grade }),
        ]
    }

    fn surface_marking_strategy() -> impl Strategy<Value = Marking> {
        prop_oneof![
            Just(Marking::Clear),
            Just(Marking::Caries),
            Just(Marking::Sealant),
            material_strategy().prop_map(|material| Marking::Restoration { material }),
        ]
    }

    /// A marking that is legal for its target.
    fn action_strategy() -> impl Strategy<Value = (Target, Marking)> {
        target_strategy().prop_flat_map(|target| {
            let marking = if target.is_whole_tooth() {
                tooth_marking_strategy().boxed()
            } else {
                surface_marking_strategy().boxed()
            };
            (Just(target), marking)
        })
    }

    fn chart_strategy() -> impl Strategy<Value = Chart> {
        vec(action_strategy(), 0..40).prop_map(|actions| {
            let mut chart = Chart::new();
            for (target, marking) in actions {
                chart
                    .apply_marking(&target, &marking)
                    .unwrap_or_else(|e| panic!("{target} {marking:?}: {e}"));
            }
            chart
        })
    }

    fn assert_clean(chart: &Chart) -> Result<(), TestCaseError> {
        for (id, record) in chart.teeth() {
            prop_assert!(!record.is_empty(), "empty record for {id}");
            if record.general_condition.is_some_and(GeneralCondition::is_whole_tooth) {
                prop_assert!(record.surfaces.is_empty(), "surfaces kept on {id}");
                prop_assert!(record.mobility.is_none(), "mobility kept on {id}");
            }
            for surface in record.surfaces.values() {
                prop_assert!(surface.condition.is_some());
                if surface.condition != Some(SurfaceCondition::Restoration) {
                    prop_assert!(surface.material.is_none());
                }
            }
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn sequences_never_leave_empty_records(actions in vec(action_strategy(), 0..80)) {
            let mut chart = Chart::new();
            for (target, marking) in actions {
                prop_assert!(chart.apply_marking(&target, &marking).is_ok());
                assert_clean(&chart)?;
            }
        }

        #[test]
        fn whole_tooth_conditions_clear_detail(
            chart in chart_strategy(),
            tooth in tooth_strategy(),
            marking in whole_tooth_condition_strategy(),
        ) {
            let mut chart = chart;
            let notes_before = chart.get(tooth).and_then(|r| r.notes.clone());
            chart.apply_marking(&Target::tooth(tooth), &marking).unwrap();

            let record = chart.get(tooth).unwrap();
            prop_assert_eq!(record.general_condition, marking.general_condition());
            prop_assert!(record.surfaces.is_empty());
            prop_assert!(record.mobility.is_none());
            prop_assert_eq!(record.notes.clone(), notes_before);
        }

        #[test]
        fn surface_marking_implies_presence(
            chart in chart_strategy(),
            tooth in tooth_strategy(),
            condition in whole_tooth_condition_strategy(),
            face in 0usize..5,
            marking in surface_marking_strategy(),
        ) {
            prop_assume!(marking != Marking::Clear);
            let mut chart = chart;
            chart.apply_marking(&Target::tooth(tooth), &condition).unwrap();

            let target = Target::surface(tooth, tooth.surfaces()[face]).unwrap();
            chart.apply_marking(&target, &marking).unwrap();

            let record = chart.get(tooth).unwrap();
            prop_assert!(record.general_condition.is_none());
            prop_assert_eq!(
                chart.surface(tooth, tooth.surfaces()[face]).copied(),
                marking.surface_record()
            );
        }

        #[test]
        fn applying_twice_equals_once(chart in chart_strategy(), action in action_strategy()) {
            let (target, marking) = action;
            let mut once = chart;
            once.apply_marking(&target, &marking).unwrap();
            let mut twice = once.clone();
            twice.apply_marking(&target, &marking).unwrap();
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn charts_survive_a_json_round_trip(chart in chart_strategy()) {
            let text = serde_json::to_string(&chart).unwrap();
            let back = Chart::load(Some(serde_json::from_str(&text).unwrap())).unwrap();
            prop_assert_eq!(&back, &chart);
            prop_assert_eq!(normalize(chart.clone()), chart);
        }
    }
}
