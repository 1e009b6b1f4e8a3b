// src/odontogram/render.rs
//! SVG output. Geometry becomes path data only here.

use super::chart::{Chart, Target};
use super::geometry::{Point, Rect, Region};
use super::layout::ChartLayout;
use super::style::{self, ElementStyle, Overlay};

const LABEL_COLOR: &str = "#111827";
const MIDLINE_COLOR: &str = "#d1d5db";
const READ_ONLY_COLOR: &str = "#6b7280";

/// Renders the full chart. `selection` is ignored when `read_only`.
pub fn render_chart(
    layout: &ChartLayout,
    chart: &Chart,
    selection: Option<&Target>,
    read_only: bool,
) -> String {
    let mut svg = String::new();
    let class = if read_only { "odontogram read-only" } else { "odontogram" };
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="{}" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        class,
        n(layout.width),
        n(layout.height),
        n(layout.width),
        n(layout.height),
    ));

    svg.push_str(&format!(
        r#"<line class="midline" x1="{x}" y1="0" x2="{x}" y2="{}" stroke="{}" stroke-dasharray="4 3"/>"#,
        n(layout.height),
        MIDLINE_COLOR,
        x = n(layout.midline_x),
    ));

    let selected = if read_only { None } else { selection };

    for tooth in &layout.teeth {
        let id = tooth.tooth.id;
        let record = chart.get(id);
        let tooth_style = style::resolve_tooth(record, selected == Some(&tooth.target), read_only);

        svg.push_str(&format!(
            r#"<g class="tooth" data-tooth="{}" data-type="{}">"#,
            id, tooth.tooth.tooth_type
        ));
        if let Some(notes) = record.and_then(|r| r.notes.as_deref()) {
            svg.push_str(&format!("<title>{}</title>", escape_xml(notes)));
        }
        push_region(&mut svg, &tooth.id, &Region::Rect(tooth.outline), &tooth_style);

        for shape in &tooth.surfaces {
            let surface_style = style::resolve_surface(
                record,
                chart.surface(id, shape.surface),
                selected == Some(&shape.target),
                read_only,
            );
            if surface_style.visible {
                push_region(&mut svg, &shape.id, &shape.region, &surface_style);
            }
        }

        if let Some((overlay, ink)) = tooth_style.overlay {
            push_overlay(&mut svg, overlay, ink, &tooth.outline);
        }

        svg.push_str(&format!(
            r#"<text class="label" x="{}" y="{}" font-size="{}" text-anchor="middle" fill="{}">{}</text>"#,
            n(tooth.label_anchor.x),
            n(tooth.label_anchor.y),
            n(layout.params.label_height * 0.7),
            LABEL_COLOR,
            id
        ));
        svg.push_str("</g>");
    }

    if read_only {
        svg.push_str(&format!(
            r#"<text class="read-only-badge" x="{}" y="{}" font-size="{}" text-anchor="end" fill="{}">read only</text>"#,
            n(layout.width - layout.params.margin),
            n(layout.params.margin * 0.8),
            n(layout.params.label_height * 0.6),
            READ_ONLY_COLOR
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub(crate) fn path_data(region: &Region) -> String {
    match region {
        Region::Rect(r) => format!(
            "M {} {} L {} {} L {} {} L {} {} Z",
            n(r.x),
            n(r.y),
            n(r.right()),
            n(r.y),
            n(r.right()),
            n(r.bottom()),
            n(r.x),
            n(r.bottom())
        ),
        Region::Polygon(poly) => {
            let mut d = String::new();
            for (i, p) in poly.points.iter().enumerate() {
                let cmd = if i == 0 { "M" } else { "L" };
                d.push_str(&format!("{} {} {} ", cmd, n(p.x), n(p.y)));
            }
            d.push('Z');
            d
        }
    }
}

pub(crate) fn push_region(svg: &mut String, id: &str, region: &Region, style: &ElementStyle) {
    svg.push_str(&format!(
        r#"<path id="{}" data-target="{}" d="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
        escape_xml(id),
        escape_xml(id),
        path_data(region),
        style.fill,
        style.stroke,
        n(style.stroke_width)
    ));
}

/// Markers centered on the cell, drawn above fills.
pub(crate) fn push_overlay(svg: &mut String, overlay: Overlay, ink: &str, cell: &Rect) {
    let c = cell.center();
    let s = cell.width.min(cell.height);
    match overlay {
        Overlay::Cross => {
            let a = cell.inset(s * 0.1);
            push_line(svg, Point::new(a.x, a.y), Point::new(a.right(), a.bottom()), ink, s * 0.06);
            push_line(svg, Point::new(a.right(), a.y), Point::new(a.x, a.bottom()), ink, s * 0.06);
        }
        Overlay::FilledCircle => {
            svg.push_str(&format!(
                r#"<circle class="overlay" cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                n(c.x),
                n(c.y),
                n(s * 0.18),
                ink
            ));
        }
        Overlay::RingedCircle => {
            svg.push_str(&format!(
                r#"<circle class="overlay" cx="{}" cy="{}" r="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                n(c.x),
                n(c.y),
                n(s * 0.22),
                ink,
                n(s * 0.05)
            ));
            svg.push_str(&format!(
                r#"<circle class="overlay" cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                n(c.x),
                n(c.y),
                n(s * 0.06),
                ink
            ));
        }
        Overlay::DoubleSlash => {
            let h = s * 0.15;
            for dx in [-s * 0.08, s * 0.08] {
                push_line(
                    svg,
                    Point::new(c.x + dx - h, c.y + h),
                    Point::new(c.x + dx + h, c.y - h),
                    ink,
                    s * 0.05,
                );
            }
        }
    }
}

fn push_line(svg: &mut String, from: Point, to: Point, ink: &str, width: f64) {
    svg.push_str(&format!(
        r#"<line class="overlay" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
        n(from.x),
        n(from.y),
        n(to.x),
        n(to.y),
        ink,
        n(width)
    ));
}

/// Two decimals at most.
pub(crate) fn n(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { "0".to_string() } else { format!("{r}") }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
