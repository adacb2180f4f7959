use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Text};
use rusty_strata::aggregate::{BAR_WIDTH, hit_test};
use rusty_strata::selection::Emphasis;
use rusty_strata::state::{Interaction, ViewSnapshot};

use crate::app::{ChartTab, RustyStrataApp};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the selected chart in the central panel.
pub fn central(ui: &mut Ui, app: &mut RustyStrataApp, snapshot: Option<&ViewSnapshot>) {
    let Some(snap) = snapshot else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open…)");
        });
        return;
    };

    match app.tab {
        ChartTab::Stacked => stacked_chart(ui, app, snap),
        ChartTab::Density => density_chart(ui, snap),
        ChartTab::Parallel => parallel_chart(ui, app, snap),
    }
}

// ---------------------------------------------------------------------------
// Stacked counts
// ---------------------------------------------------------------------------

fn stacked_chart(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    let nav = &snap.navigation;

    // One chart per secondary category so the legend lists each once.
    let mut by_secondary: BTreeMap<usize, (String, Vec<Bar>)> = BTreeMap::new();
    for seg in &nav.segments {
        let order = nav
            .secondary_domain
            .iter()
            .position(|s| *s == seg.secondary)
            .unwrap_or(usize::MAX);
        let color = app
            .secondary_colors
            .as_ref()
            .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(&seg.secondary));
        let bar = Bar::new(seg.slot as f64, seg.count())
            .base_offset(seg.lower)
            .width(BAR_WIDTH)
            .fill(color)
            .name(format!("{} / {}", seg.primary, seg.secondary));
        by_secondary
            .entry(order)
            .or_insert_with(|| (seg.secondary.clone(), Vec::new()))
            .1
            .push(bar);
    }

    let labels: Vec<String> = nav.groups.iter().map(|g| g.key.clone()).collect();

    let response = Plot::new("stacked_plot")
        .legend(Legend::default())
        .x_axis_label("Category")
        .y_axis_label("Count")
        .x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for (_, (secondary, bars)) in by_secondary {
                let color = app
                    .secondary_colors
                    .as_ref()
                    .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(&secondary));
                plot_ui.bar_chart(BarChart::new(bars).name(secondary).color(color));
            }
            plot_ui.pointer_coordinate()
        });

    if response.response.clicked() {
        if let Some(p) = response.inner {
            if let Some(seg) = hit_test(&nav.segments, p.x, p.y) {
                app.pending.push(Interaction::SegmentSelected {
                    primary: seg.primary.clone(),
                    secondary: Some(seg.secondary.clone()),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Density animation
// ---------------------------------------------------------------------------

fn density_chart(ui: &mut Ui, snap: &ViewSnapshot) {
    let frame = match &snap.animation {
        Ok(frame) => frame,
        Err(e) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(e.to_string());
            });
            return;
        }
    };

    let (x_lo, x_hi) = frame.x_extent;
    Plot::new("density_plot")
        .legend(Legend::default())
        .x_axis_label(snap.density_dimension.clone())
        .y_axis_label("Density (peak = 1)")
        .include_x(x_lo)
        .include_x(x_hi)
        .include_y(0.0)
        .include_y(1.05)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            if frame.curve.is_empty() {
                plot_ui.text(Text::new(
                    PlotPoint::new((x_lo + x_hi) / 2.0, 0.5),
                    format!("Not enough data for group {}", frame.ordinal),
                ));
                return;
            }
            let points: PlotPoints = frame.curve.points().iter().map(|&(x, y)| [x, y]).collect();
            plot_ui.line(
                Line::new(points)
                    .name(format!("group {}", frame.ordinal))
                    .color(Color32::from_rgb(105, 179, 162))
                    .fill(0.0)
                    .width(2.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Parallel coordinates
// ---------------------------------------------------------------------------

/// Pointer distance (in normalized axis units) that still picks a line.
const PICK_TOLERANCE: f64 = 0.04;

fn parallel_chart(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    let sel = &snap.selection;
    let normalize = |axis: usize, v: f64| {
        let (lo, hi) = sel.axes[axis].extent;
        if hi > lo { (v - lo) / (hi - lo) } else { 0.5 }
    };
    let polyline = |record: &rusty_strata::data::model::Record| -> Vec<[f64; 2]> {
        sel.axes
            .iter()
            .enumerate()
            .filter_map(|(i, axis)| Some([i as f64, normalize(i, record.value(&axis.dimension)?)]))
            .collect()
    };

    let names: Vec<String> = sel.axes.iter().map(|a| a.dimension.clone()).collect();

    let response = Plot::new("parallel_plot")
        .x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            names.get(slot as usize).cloned().unwrap_or_default()
        })
        .show_y(false)
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            // Dimmed lines first so emphasized ones draw on top.
            for pass in [Emphasis::Dimmed, Emphasis::Emphasized] {
                for (record, emphasis) in sel.records.iter().filter(|(_, e)| *e == pass) {
                    let base = app
                        .primary_colors
                        .as_ref()
                        .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(&record.primary));
                    let (color, width): (Color32, f32) = match emphasis {
                        Emphasis::Emphasized if sel.focus.is_some() => (base, 3.0),
                        Emphasis::Emphasized => (base.gamma_multiply(0.7), 1.2),
                        _ => (base.gamma_multiply(0.12), 1.0),
                    };
                    let points: PlotPoints = polyline(record).into_iter().collect();
                    plot_ui.line(Line::new(points).color(color).width(width));
                }
            }
            plot_ui.pointer_coordinate()
        });

    if response.response.clicked() {
        let Some(p) = response.inner else {
            return;
        };
        let axis = p.x.round();
        let picked = (axis >= 0.0 && (axis as usize) < sel.axes.len())
            .then(|| {
                sel.records
                    .iter()
                    .filter_map(|(record, _)| {
                        let v = record.value(&sel.axes[axis as usize].dimension)?;
                        let d = (normalize(axis as usize, v) - p.y).abs();
                        (d <= PICK_TOLERANCE).then_some((d, record.name.clone()))
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
            })
            .flatten();
        app.pending.push(match picked {
            Some((_, name)) => Interaction::RecordFocused(name),
            None => Interaction::FocusCleared,
        });
    }
}
