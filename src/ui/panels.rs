use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_strata::animation::Playback;
use rusty_strata::media::{MediaRef, MediaState};
use rusty_strata::navigation::NavigationLevel;
use rusty_strata::state::{Interaction, ViewSnapshot};

use crate::app::{ChartTab, RustyStrataApp};

// ---------------------------------------------------------------------------
// Left side panel – filters, navigation, animation, focus
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, app: &mut RustyStrataApp, snapshot: Option<&ViewSnapshot>) {
    ui.heading("Controls");
    ui.separator();

    let Some(snap) = snapshot else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            category_filters(ui, app, snap);
            ui.separator();
            navigation_controls(ui, app, snap);
            ui.separator();
            animation_controls(ui, app, snap);
            ui.separator();
            focus_card(ui, app, snap);
        });
}

fn category_filters(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    let categories = &snap.selection.categories;
    let n_active = categories.iter().filter(|(_, on)| *on).count();
    let header_text = format!("Categories  ({n_active}/{})", categories.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("categories")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    let all = categories.iter().map(|(c, _)| c.clone()).collect();
                    app.pending.push(Interaction::ActiveCategoriesReplaced(all));
                }
                if ui.small_button("None").clicked() {
                    app.pending
                        .push(Interaction::ActiveCategoriesReplaced(Default::default()));
                }
            });

            for (key, active) in categories {
                let mut text = RichText::new(key);
                if let Some(cm) = &app.primary_colors {
                    text = text.color(cm.color_for(key));
                }
                let mut checked = *active;
                if ui.checkbox(&mut checked, text).changed() {
                    app.pending.push(Interaction::CategoryToggled {
                        key: key.clone(),
                        active: checked,
                    });
                }
            }
        });
}

fn navigation_controls(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    let nav = &snap.navigation;
    ui.strong("Drill-down");
    ui.label(nav.level.breadcrumbs().join(" › "));
    ui.horizontal(|ui: &mut Ui| {
        let at_overview = nav.level == NavigationLevel::Overview;
        if ui.add_enabled(!at_overview, egui::Button::new("Back")).clicked() {
            app.pending.push(Interaction::Back);
        }
        if ui.add_enabled(!at_overview, egui::Button::new("Show all")).clicked() {
            app.pending.push(Interaction::Reset);
        }
    });

    if !nav.detail.is_empty() {
        ui.label(format!("{} records", nav.detail.len()));
        for record in &nav.detail {
            let focused = snap.selection.focus.as_deref() == Some(record.name.as_str());
            if ui.selectable_label(focused, &record.name).clicked() {
                app.pending.push(Interaction::RecordFocused(record.name.clone()));
            }
        }
    }
}

fn animation_controls(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    ui.strong("Density animation");

    let current = snap.density_dimension.clone();
    egui::ComboBox::from_id_salt("density_dimension")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for dim in &snap.dimensions {
                if ui.selectable_label(current == *dim, dim).clicked() {
                    app.pending.push(Interaction::DimensionChanged(dim.clone()));
                }
            }
        });

    let frame = match &snap.animation {
        Ok(frame) => frame,
        Err(e) => {
            ui.label(RichText::new(e.to_string()).italics());
            return;
        }
    };

    ui.horizontal(|ui: &mut Ui| {
        let label = match frame.playback {
            Playback::Playing => "⏸ Pause",
            Playback::Paused => "▶ Play",
            Playback::Finished => "⟲ Replay",
        };
        if ui.button(label).clicked() {
            app.pending.push(match frame.playback {
                Playback::Playing => Interaction::Pause,
                _ => Interaction::Play,
            });
        }
    });

    let mut index = frame.index;
    let slider = egui::Slider::new(&mut index, 0..=frame.len.saturating_sub(1)).text("step");
    if ui.add(slider).changed() {
        app.pending.push(Interaction::ScrubTo(index as isize));
    }
    ui.label(format!(
        "Group {} – {} observations",
        frame.ordinal, frame.observations
    ));
    if frame.excluded > 0 {
        ui.label(
            RichText::new(format!("{} records lack a group or value", frame.excluded))
                .small()
                .color(Color32::GRAY),
        );
    }
}

fn focus_card(ui: &mut Ui, app: &mut RustyStrataApp, snap: &ViewSnapshot) {
    ui.strong("Focus");
    let Some(name) = snap.selection.focus.as_deref() else {
        ui.label("Click a line or a listed record.");
        return;
    };
    let Some((record, _)) = snap.selection.records.iter().find(|(r, _)| r.name == name) else {
        return;
    };

    ui.label(RichText::new(&record.name).heading());
    ui.label(format!("{} / {}", record.primary, record.secondary));
    if let Some(ordinal) = record.ordinal {
        ui.label(format!("group {ordinal}"));
    }
    for dim in &snap.dimensions {
        if let Some(v) = record.value(dim) {
            ui.label(format!("{dim}: {v}"));
        }
    }

    match &snap.media {
        MediaState::Pending { .. } => {
            ui.spinner();
        }
        MediaState::Ready {
            identity,
            media: MediaRef::Image(uri),
        } if identity == name => {
            ui.add(
                egui::Image::new(uri.clone())
                    .max_width(ui.available_width() * 0.8)
                    .max_height(160.0)
                    .corner_radius(4.0),
            );
        }
        MediaState::Ready { .. } => {
            ui.label(RichText::new("no image").italics().color(Color32::GRAY));
        }
        MediaState::Idle => {}
    }

    if ui.button("Clear focus").clicked() {
        app.pending.push(Interaction::FocusCleared);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, app: &mut RustyStrataApp, snapshot: Option<&ViewSnapshot>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(app);
                ui.close_menu();
            }
        });

        ui.separator();

        for (tab, label) in [
            (ChartTab::Stacked, "Stacked counts"),
            (ChartTab::Density, "Density"),
            (ChartTab::Parallel, "Parallel coordinates"),
        ] {
            if ui.selectable_label(app.tab == tab, label).clicked() {
                app.tab = tab;
            }
        }

        ui.separator();

        if let Some(snap) = snapshot {
            ui.label(format!(
                "{} records loaded, {} in filtered view, {} excluded",
                snap.record_count,
                snap.selection.records.len(),
                snap.selection.excluded
            ));
        }

        if let Some(msg) = &app.state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(app: &mut RustyStrataApp) {
    let file = rfd::FileDialog::new()
        .set_title("Open record table")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match rusty_strata::data::loader::load_file(&path, &app.state.config.schema) {
            Ok(dataset) => {
                app.state.set_dataset(dataset, std::time::Instant::now());
                app.rebuild_colors();
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                app.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
