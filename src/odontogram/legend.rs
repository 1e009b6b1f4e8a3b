// src/odontogram/legend.rs

use serde::Serialize;

use super::geometry::{Rect, Region};
use super::render::{escape_xml, n, push_overlay, push_region};
use super::style::{ConditionStyle, ElementStyle, NEUTRAL_FILL, NEUTRAL_STROKE, NEUTRAL_STROKE_WIDTH, StyleKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub key: StyleKey,
    pub label: &'static str,
    pub style: ConditionStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendGroup {
    pub title: &'static str,
    pub entries: Vec<LegendEntry>,
}

const GROUPS: [(&str, &[StyleKey]); 3] = [
    (
        "General states",
        &[
            StyleKey::Absent,
            StyleKey::Implant,
            StyleKey::Crown,
            StyleKey::Prosthesis,
            StyleKey::EndodonticsTreated,
            StyleKey::Fractured,
        ],
    ),
    (
        "Restorations",
        &[
            StyleKey::RestorationResin,
            StyleKey::RestorationAmalgam,
            StyleKey::RestorationCeramic,
        ],
    ),
    (
        "Other",
        &[
            StyleKey::Caries,
            StyleKey::Sealant,
            StyleKey::Mobility1,
            StyleKey::Mobility2,
            StyleKey::Mobility3,
        ],
    ),
];

pub fn legend() -> Vec<LegendGroup> {
    GROUPS
        .iter()
        .map(|&(title, keys)| LegendGroup {
            title,
            entries: keys
                .iter()
                .map(|&key| LegendEntry {
                    key,
                    label: key.label(),
                    style: key.style(),
                })
                .collect(),
        })
        .collect()
}

const SWATCH: f64 = 16.0;
const ROW: f64 = 22.0;
const COLUMN: f64 = 170.0;

/// One column per group.
pub fn render_legend_svg() -> String {
    let groups = legend();
    let rows = groups.iter().map(|g| g.entries.len()).max().unwrap_or(0);
    let width = COLUMN * groups.len() as f64;
    let height = ROW * (rows as f64 + 1.0) + 8.0;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="odontogram-legend" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        n(width),
        n(height),
        n(width),
        n(height)
    ));

    for (col, group) in groups.iter().enumerate() {
        let x = col as f64 * COLUMN + 4.0;
        svg.push_str(&format!(
            r#"<text class="legend-title" x="{}" y="{}" font-size="13" font-weight="bold">{}</text>"#,
            n(x),
            n(ROW * 0.7),
            escape_xml(group.title)
        ));
        for (row, entry) in group.entries.iter().enumerate() {
            let y = ROW * (row as f64 + 1.0) + 4.0;
            let cell = Rect::new(x, y, SWATCH, SWATCH);
            let cs = entry.style;
            let paint = ElementStyle {
                visible: true,
                fill: cs.fill.unwrap_or(NEUTRAL_FILL),
                stroke: if cs.stroke_width.is_some() { cs.ink } else { NEUTRAL_STROKE },
                stroke_width: cs.stroke_width.unwrap_or(NEUTRAL_STROKE_WIDTH),
                overlay: None,
            };
            let key = format!("legend-{}", entry.label.to_lowercase().replace(' ', "-"));
            push_region(&mut svg, &key, &Region::Rect(cell), &paint);
            if let Some(overlay) = cs.overlay {
                push_overlay(&mut svg, overlay, cs.ink, &cell);
            }
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
                n(x + SWATCH + 6.0),
                n(y + SWATCH * 0.8),
                escape_xml(entry.label)
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}
