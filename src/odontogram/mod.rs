//! Tooth-chart editor core: sparse chart model, layout, styling, rendering
//! and the selection state machine. No I/O happens here.

pub mod catalogue;
pub mod chart;
pub mod controller;
pub mod geometry;
pub mod layout;
pub mod legend;
pub mod palette;
pub mod render;
pub mod style;

pub use catalogue::{CATALOGUE, Quadrant, Surface, ToothEntry, ToothId, ToothType};
pub use chart::{
    Chart, ChartError, ChartSummary, GeneralCondition, Marking, Material, MobilityGrade,
    SurfaceCondition, SurfaceRecord, Target, ToothRecord, normalize,
};
pub use controller::{ChangeListener, EditorState, InteractionController};
pub use geometry::Point;
pub use layout::{ChartLayout, LayoutParams};
pub use palette::Palette;
