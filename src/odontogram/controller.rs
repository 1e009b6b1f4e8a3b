// src/odontogram/controller.rs
//! Selection state machine for one open editor.
//!
//! `Idle` → `Selecting` when a shape is picked (never in read-only mode).
//! `Selecting` → `Idle` on a palette choice, `close()`, or a pick outside
//! both chart and palette. The host forwards outside interactions as
//! `close()`; the controller owns no input listeners.

use std::sync::Arc;

use serde::Serialize;

use super::catalogue::ToothId;
use super::chart::{Chart, ChartError, Marking, Target};
use super::geometry::Point;
use super::layout::ChartLayout;
use super::palette::{self, Palette};
use super::render;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum EditorState {
    Idle,
    Selecting { target: Target, anchor: Point },
}

/// Receives the full chart after every applied change.
pub trait ChangeListener: Send {
    fn chart_changed(&mut self, chart: &Chart);
}

impl<F> ChangeListener for F
where
    F: FnMut(&Chart) + Send,
{
    fn chart_changed(&mut self, chart: &Chart) {
        self(chart)
    }
}

pub struct InteractionController {
    chart: Chart,
    layout: Arc<ChartLayout>,
    state: EditorState,
    read_only: bool,
    listener: Option<Box<dyn ChangeListener>>,
}

impl InteractionController {
    pub fn new(chart: Chart, layout: Arc<ChartLayout>, read_only: bool) -> Self {
        Self {
            chart,
            layout,
            state: EditorState::Idle,
            read_only,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn selection(&self) -> Option<Target> {
        match self.state {
            EditorState::Selecting { target, .. } => Some(target),
            EditorState::Idle => None,
        }
    }

    /// Opens the palette for `target` at `position`. Returns whether the
    /// editor is now selecting; read-only editors and hidden surfaces
    /// ignore the request.
    pub fn open(&mut self, target: Target, position: Point) -> Result<bool, ChartError> {
        target.validate()?;
        if self.read_only {
            return Ok(false);
        }
        if target.surface.is_some() && !self.chart.surfaces_visible(target.tooth) {
            return Ok(false);
        }
        self.state = EditorState::Selecting {
            target,
            anchor: position,
        };
        Ok(true)
    }

    /// Opens at the target's own shape.
    pub fn select(&mut self, target: Target) -> Result<bool, ChartError> {
        let anchor = self
            .layout
            .anchor_for(&target)
            .unwrap_or(Point::new(0.0, 0.0));
        self.open(target, anchor)
    }

    /// A pointer pick in chart coordinates. Empty space counts as outside.
    pub fn click(&mut self, p: Point) -> bool {
        if self.read_only {
            return false;
        }
        let chart = &self.chart;
        let hit = self.layout.hit_test(p, |tooth| chart.surfaces_visible(tooth));
        match hit {
            // hit_test only yields legal targets
            Some(target) => self.open(target, p).unwrap_or(false),
            None => {
                self.close();
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.state = EditorState::Idle;
    }

    pub fn palette(&self) -> Option<Palette> {
        match self.state {
            EditorState::Selecting { target, anchor } => {
                Some(Palette::open(target, anchor, &self.layout.bounds()))
            }
            EditorState::Idle => None,
        }
    }

    /// Applies a palette choice to the selected target, notifies the
    /// listener once and closes the palette.
    pub fn choose(&mut self, marking: Marking) -> Result<&Chart, ChartError> {
        let EditorState::Selecting { target, .. } = self.state else {
            return Err(ChartError::NotSelecting);
        };
        if !palette::offers(&target, &marking) {
            return Err(ChartError::NotInPalette {
                marking: marking.kind(),
                target,
            });
        }

        self.chart.apply_marking(&target, &marking)?;
        self.state = EditorState::Idle;
        self.notify();
        Ok(&self.chart)
    }

    /// Returns false (and changes nothing) in read-only mode.
    pub fn set_notes(&mut self, tooth: ToothId, notes: Option<&str>) -> bool {
        if self.read_only {
            return false;
        }
        self.chart.set_notes(tooth, notes);
        self.notify();
        true
    }

    pub fn render_svg(&self) -> String {
        render::render_chart(
            &self.layout,
            &self.chart,
            self.selection().as_ref(),
            self.read_only,
        )
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.chart_changed(&self.chart);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odontogram::catalogue::Surface;
    use crate::odontogram::chart::{Material, MobilityGrade};
    use crate::odontogram::layout::{LayoutParams, generate};
    use std::sync::Mutex;

    fn layout() -> Arc<ChartLayout> {
        Arc::new(generate(&LayoutParams::default()))
    }

    fn id(code: &str) -> ToothId {
        code.parse().unwrap()
    }

    fn recording(read_only: bool) -> (InteractionController, Arc<Mutex<Vec<Chart>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctl = InteractionController::new(Chart::new(), layout(), read_only)
            .with_listener(move |c: &Chart| sink.lock().unwrap().push(c.clone()));
        (ctl, seen)
    }

    #[test]
    fn click_choose_closes_and_notifies_once() {
        let (mut ctl, seen) = recording(false);
        let center = ctl.layout().tooth(id("16")).unwrap().outline.center();

        assert!(ctl.click(center));
        assert_eq!(
            ctl.selection(),
            Some(Target::surface(id("16"), Surface::Occlusal).unwrap())
        );
        assert!(ctl.palette().is_some());

        ctl.choose(Marking::Caries).unwrap();
        assert_eq!(ctl.state(), EditorState::Idle);
        assert!(ctl.palette().is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], *ctl.chart());
        assert!(ctl.chart().surface(id("16"), Surface::Occlusal).is_some());
    }

    #[test]
    fn read_only_ignores_everything() {
        let (mut ctl, seen) = recording(true);
        let center = ctl.layout().tooth(id("16")).unwrap().outline.center();

        assert!(!ctl.click(center));
        assert!(!ctl.select(Target::tooth(id("16"))).unwrap());
        assert_eq!(ctl.state(), EditorState::Idle);
        assert_eq!(ctl.choose(Marking::Crown).unwrap_err(), ChartError::NotSelecting);
        assert!(!ctl.set_notes(id("16"), Some("x")));
        assert!(ctl.chart().is_empty());
        assert!(seen.lock().unwrap().is_empty());
        assert!(ctl.render_svg().contains("read only"));
    }

    #[test]
    fn close_and_outside_click_return_to_idle() {
        let (mut ctl, seen) = recording(false);
        ctl.select(Target::tooth(id("21"))).unwrap();
        ctl.close();
        assert_eq!(ctl.state(), EditorState::Idle);

        ctl.select(Target::tooth(id("21"))).unwrap();
        assert!(!ctl.click(Point::new(0.5, 0.5)));
        assert_eq!(ctl.state(), EditorState::Idle);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn palette_depends_on_target_kind() {
        let (mut ctl, _) = recording(false);
        ctl.select(Target::tooth(id("21"))).unwrap();
        let err = ctl.choose(Marking::Sealant).unwrap_err();
        assert!(matches!(err, ChartError::NotInPalette { .. }));
        // a rejected choice keeps the palette open
        assert!(ctl.selection().is_some());

        ctl.choose(Marking::Mobility { grade: MobilityGrade::Grade2 }).unwrap();
        ctl.select(Target::surface(id("21"), Surface::Labial).unwrap())
            .unwrap();
        let err = ctl.choose(Marking::Implant).unwrap_err();
        assert!(matches!(err, ChartError::NotInPalette { .. }));
        ctl.choose(Marking::Restoration { material: Material::Ceramic })
            .unwrap();

        let record = ctl.chart().get(id("21")).unwrap();
        assert_eq!(record.mobility, Some(MobilityGrade::Grade2));
        assert_eq!(record.surfaces.len(), 1);
    }

    #[test]
    fn absent_tooth_surfaces_are_not_selectable() {
        let (mut ctl, _) = recording(false);
        ctl.select(Target::tooth(id("11"))).unwrap();
        ctl.choose(Marking::Absent).unwrap();

        let center = ctl.layout().tooth(id("11")).unwrap().outline.center();
        assert!(ctl.click(center));
        assert_eq!(ctl.selection(), Some(Target::tooth(id("11"))));

        ctl.close();
        assert!(!ctl.select(Target::surface(id("11"), Surface::Incisal).unwrap()).unwrap());
    }

    #[test]
    fn illegal_targets_fail_fast() {
        let (mut ctl, _) = recording(false);
        let bad = Target {
            tooth: id("11"),
            surface: Some(Surface::Occlusal),
        };
        assert!(matches!(
            ctl.open(bad, Point::new(0.0, 0.0)),
            Err(ChartError::IllegalSurface { .. })
        ));
    }

    #[test]
    fn palette_opens_at_click_point() {
        let (mut ctl, _) = recording(false);
        let t = ctl.layout().tooth(id("14")).unwrap();
        let p = Point::new(t.outline.x + 1.0, t.outline.y + 1.0);
        ctl.click(p);
        assert_eq!(
            ctl.state(),
            EditorState::Selecting {
                target: Target::tooth(id("14")),
                anchor: p
            }
        );
    }
}
