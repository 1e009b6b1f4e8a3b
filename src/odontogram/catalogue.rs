// src/odontogram/catalogue.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::chart::ChartError;

/*
FDI two-digit numbering:
  first digit  = quadrant (1 upper right, 2 upper left, 3 lower left, 4 lower right)
  second digit = position from the midline (1 central incisor .. 8 third molar)
*/

/// A permanent tooth code. Only the 32 FDI codes can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToothId(u8);

impl ToothId {
    pub fn new(code: u8) -> Result<Self, ChartError> {
        let quadrant = code / 10;
        let position = code % 10;
        if (1..=4).contains(&quadrant) && (1..=8).contains(&position) {
            Ok(ToothId(code))
        } else {
            Err(ChartError::UnknownTooth(code.to_string()))
        }
    }

    pub fn quadrant(self) -> Quadrant {
        match self.0 / 10 {
            1 => Quadrant::UpperRight,
            2 => Quadrant::UpperLeft,
            3 => Quadrant::LowerLeft,
            _ => Quadrant::LowerRight,
        }
    }

    /// 1 = central incisor, 8 = third molar
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    pub fn tooth_type(self) -> ToothType {
        match self.position() {
            1 => ToothType::CentralIncisor,
            2 => ToothType::LateralIncisor,
            3 => ToothType::Canine,
            4 | 5 => ToothType::Premolar,
            _ => ToothType::Molar,
        }
    }

    pub fn surfaces(self) -> &'static [Surface; 5] {
        self.tooth_type().surfaces()
    }

    pub fn has_surface(self, surface: Surface) -> bool {
        self.surfaces().contains(&surface)
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToothId {
    type Err = ChartError;

    /// Exactly two ASCII digits; no padding or sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ChartError::UnknownTooth(s.to_string()));
        }
        let code: u8 = s
            .parse()
            .map_err(|_| ChartError::UnknownTooth(s.to_string()))?;
        ToothId::new(code)
    }
}

impl TryFrom<String> for ToothId {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToothId> for String {
    fn from(id: ToothId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    pub fn is_upper(self) -> bool {
        matches!(self, Quadrant::UpperRight | Quadrant::UpperLeft)
    }

    /// Quadrants on the patient's right are drawn on the viewer's left,
    /// so their midline is on the right edge of each cell.
    pub fn midline_on_right(self) -> bool {
        matches!(self, Quadrant::UpperRight | Quadrant::LowerRight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToothType {
    Molar,
    Premolar,
    Canine,
    LateralIncisor,
    CentralIncisor,
}

const POSTERIOR_SURFACES: [Surface; 5] = [
    Surface::Occlusal,
    Surface::Mesial,
    Surface::Distal,
    Surface::Vestibular,
    Surface::Lingual,
];

const CANINE_SURFACES: [Surface; 5] = [
    Surface::Incisal,
    Surface::Mesial,
    Surface::Distal,
    Surface::Vestibular,
    Surface::Lingual,
];

const INCISOR_SURFACES: [Surface; 5] = [
    Surface::Incisal,
    Surface::Mesial,
    Surface::Distal,
    Surface::Labial,
    Surface::Palatal,
];

impl ToothType {
    /// Legal surfaces, center surface first.
    pub fn surfaces(self) -> &'static [Surface; 5] {
        match self {
            ToothType::Molar | ToothType::Premolar => &POSTERIOR_SURFACES,
            ToothType::Canine => &CANINE_SURFACES,
            ToothType::LateralIncisor | ToothType::CentralIncisor => &INCISOR_SURFACES,
        }
    }
}

impl fmt::Display for ToothType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToothType::Molar => "molar",
            ToothType::Premolar => "premolar",
            ToothType::Canine => "canine",
            ToothType::LateralIncisor => "lateral-incisor",
            ToothType::CentralIncisor => "central-incisor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Surface {
    Occlusal,
    Incisal,
    Mesial,
    Distal,
    Vestibular,
    Labial,
    Lingual,
    Palatal,
}

impl Surface {
    pub fn name(self) -> &'static str {
        match self {
            Surface::Occlusal => "occlusal",
            Surface::Incisal => "incisal",
            Surface::Mesial => "mesial",
            Surface::Distal => "distal",
            Surface::Vestibular => "vestibular",
            Surface::Labial => "labial",
            Surface::Lingual => "lingual",
            Surface::Palatal => "palatal",
        }
    }

    /// Occlusal/incisal, drawn as the inner square of a cell.
    pub fn is_center(self) -> bool {
        matches!(self, Surface::Occlusal | Surface::Incisal)
    }

    /// Cheek/lip side.
    pub fn is_outer(self) -> bool {
        matches!(self, Surface::Vestibular | Surface::Labial)
    }

    /// Tongue/palate side.
    pub fn is_inner(self) -> bool {
        matches!(self, Surface::Lingual | Surface::Palatal)
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Surface {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "occlusal" => Ok(Surface::Occlusal),
            "incisal" => Ok(Surface::Incisal),
            "mesial" => Ok(Surface::Mesial),
            "distal" => Ok(Surface::Distal),
            "vestibular" => Ok(Surface::Vestibular),
            "labial" => Ok(Surface::Labial),
            "lingual" => Ok(Surface::Lingual),
            "palatal" => Ok(Surface::Palatal),
            other => Err(ChartError::UnknownSurface(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToothEntry {
    pub id: ToothId,
    pub quadrant: Quadrant,
    pub tooth_type: ToothType,
}

const fn entry(code: u8, quadrant: Quadrant, tooth_type: ToothType) -> ToothEntry {
    ToothEntry {
        id: ToothId(code),
        quadrant,
        tooth_type,
    }
}

use Quadrant::{LowerLeft, LowerRight, UpperLeft, UpperRight};
use ToothType::{Canine, CentralIncisor, LateralIncisor, Molar, Premolar};

/// All permanent teeth in chart reading order:
/// upper row 18..11 | 21..28, lower row 48..41 | 31..38.
pub const CATALOGUE: [ToothEntry; 32] = [
    entry(18, UpperRight, Molar),
    entry(17, UpperRight, Molar),
    entry(16, UpperRight, Molar),
    entry(15, UpperRight, Premolar),
    entry(14, UpperRight, Premolar),
    entry(13, UpperRight, Canine),
    entry(12, UpperRight, LateralIncisor),
    entry(11, UpperRight, CentralIncisor),
    entry(21, UpperLeft, CentralIncisor),
    entry(22, UpperLeft, LateralIncisor),
    entry(23, UpperLeft, Canine),
    entry(24, UpperLeft, Premolar),
    entry(25, UpperLeft, Premolar),
    entry(26, UpperLeft, Molar),
    entry(27, UpperLeft, Molar),
    entry(28, UpperLeft, Molar),
    entry(48, LowerRight, Molar),
    entry(47, LowerRight, Molar),
    entry(46, LowerRight, Molar),
    entry(45, LowerRight, Premolar),
    entry(44, LowerRight, Premolar),
    entry(43, LowerRight, Canine),
    entry(42, LowerRight, LateralIncisor),
    entry(41, LowerRight, CentralIncisor),
    entry(31, LowerLeft, CentralIncisor),
    entry(32, LowerLeft, LateralIncisor),
    entry(33, LowerLeft, Canine),
    entry(34, LowerLeft, Premolar),
    entry(35, LowerLeft, Premolar),
    entry(36, LowerLeft, Molar),
    entry(37, LowerLeft, Molar),
    entry(38, LowerLeft, Molar),
];

/// Teeth per chart row.
pub const ROW_LEN: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalogue_has_32_unique_teeth() {
        let ids: HashSet<ToothId> = CATALOGUE.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 32);
    }

    #[test]
    fn catalogue_matches_derived_fields() {
        for t in CATALOGUE.iter() {
            assert_eq!(t.id.quadrant(), t.quadrant, "quadrant of {}", t.id);
            assert_eq!(t.id.tooth_type(), t.tooth_type, "type of {}", t.id);
        }
    }

    #[test]
    fn parse_tooth_codes() {
        assert_eq!("16".parse::<ToothId>().unwrap().to_string(), "16");
        assert!("19".parse::<ToothId>().is_err());
        assert!("50".parse::<ToothId>().is_err());
        assert!("10".parse::<ToothId>().is_err());
        assert!("016".parse::<ToothId>().is_err());
        assert!("".parse::<ToothId>().is_err());
        assert!(" 16".parse::<ToothId>().is_err());
        assert!("16 ".parse::<ToothId>().is_err());
        assert!("+1".parse::<ToothId>().is_err());
    }

    #[test]
    fn padded_json_keys_are_rejected() {
        let ok: Result<ToothId, _> = serde_json::from_value(serde_json::json!("16"));
        assert!(ok.is_ok());
        let padded: Result<ToothId, _> = serde_json::from_value(serde_json::json!(" 16"));
        assert!(padded.is_err());

        // two spellings of one tooth must not collapse into one entry
        let chart: Result<crate::odontogram::Chart, _> =
            serde_json::from_str(r#"{" 16": {"mobility": "grade1"}, "16": {"mobility": "grade2"}}"#);
        assert!(chart.is_err());
    }

    #[test]
    fn surface_sets_by_type() {
        let molar: ToothId = "36".parse().unwrap();
        assert!(molar.has_surface(Surface::Occlusal));
        assert!(!molar.has_surface(Surface::Incisal));

        let canine: ToothId = "13".parse().unwrap();
        assert!(canine.has_surface(Surface::Incisal));
        assert!(canine.has_surface(Surface::Vestibular));
        assert!(!canine.has_surface(Surface::Labial));

        let incisor: ToothId = "41".parse().unwrap();
        assert!(incisor.has_surface(Surface::Labial));
        assert!(incisor.has_surface(Surface::Palatal));
        assert!(!incisor.has_surface(Surface::Lingual));
    }

    #[test]
    fn tooth_id_serializes_as_string() {
        let id: ToothId = "27".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"27\"");
        let back: ToothId = serde_json::from_str("\"27\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ToothId>("\"99\"").is_err());
    }
}
