use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorScheme;
use crate::data::filter::{format_bound, parse_bound};
use crate::export::ExportFormat;
use crate::scene::{Layer, BIN_RANGE, LINE_WIDTH_RANGE, MARKER_SIZE_RANGE};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – display options and value filter
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Display");
            ui.separator();
            display_controls(ui, state);

            ui.add_space(8.0);
            ui.heading("Value filter");
            ui.separator();
            filter_controls(ui, state);
        });
}

fn display_controls(ui: &mut Ui, state: &mut AppState) {
    // Edit a copy; the scene is rebuilt once if anything changed.
    let mut options = state.options.clone();

    ui.strong("Color scheme");
    egui::ComboBox::from_id_salt("color_scheme")
        .selected_text(options.color_scheme.name())
        .show_ui(ui, |ui: &mut Ui| {
            for scheme in ColorScheme::ALL {
                ui.selectable_value(&mut options.color_scheme, scheme, scheme.name());
            }
        });

    ui.add(egui::Slider::new(&mut options.num_bins, BIN_RANGE).text("Bins"));
    ui.checkbox(&mut options.use_log, "Log scale")
        .on_hover_text("Positive columns spanning more than 100x are always binned logarithmically");
    ui.add(egui::Slider::new(&mut options.line_width, LINE_WIDTH_RANGE).text("Line width"));
    ui.add(egui::Slider::new(&mut options.marker_size, MARKER_SIZE_RANGE).text("Node size"));

    ui.checkbox(&mut options.show_nodes, "Show nodes");
    ui.checkbox(&mut options.show_values, "Show values");
    ui.checkbox(&mut options.show_z_planes, "Show z-levels");

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Proximity");
        ui.add(
            egui::DragValue::new(&mut options.proximity_threshold)
                .speed(0.001)
                .range(0.0..=f64::MAX),
        );
    });

    state.update_options(options);

    let highlight = match state.options.highlight {
        Some(i) => format!("Highlight: bin {}", i + 1),
        None => "Highlight: none".to_string(),
    };
    if ui.button(highlight).clicked() {
        state.cycle_highlight();
    }
}

fn filter_controls(ui: &mut Ui, state: &mut AppState) {
    let Some(filter) = state.filter else {
        ui.label("No data loaded.");
        return;
    };
    let (lo, hi) = filter.bounds();

    let mut min = filter.min();
    let mut max = filter.max();
    if ui.add(bound_slider(&mut min, lo..=hi, "Min")).changed() {
        state.set_filter_min(min);
    }
    if ui.add(bound_slider(&mut max, lo..=hi, "Max")).changed() {
        state.set_filter_max(max);
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Min");
        let response = ui.add(egui::TextEdit::singleline(&mut state.min_text).desired_width(80.0));
        // Untouched text would round the bound to the displayed digits.
        if response.lost_focus() && state.filter.is_some_and(|f| state.min_text != format_bound(f.min())) {
            state.apply_min_text();
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Max");
        let response = ui.add(egui::TextEdit::singleline(&mut state.max_text).desired_width(80.0));
        // Untouched text would round the bound to the displayed digits.
        if response.lost_focus() && state.filter.is_some_and(|f| state.max_text != format_bound(f.max())) {
            state.apply_max_text();
        }
    });

    if ui.button("Reset filter").clicked() {
        state.reset_filter();
    }
}

fn bound_slider<'a>(value: &'a mut f64, range: RangeInclusive<f64>, label: &str) -> egui::Slider<'a> {
    egui::Slider::new(value, range)
        .text(label)
        .custom_formatter(|v, _| format_bound(v))
        .custom_parser(|s| parse_bound(s).ok())
}

// ---------------------------------------------------------------------------
// Right side panel – legend and statistics
// ---------------------------------------------------------------------------

pub fn info_panel(ui: &mut Ui, state: &AppState) {
    let Some(scene) = &state.scene else {
        ui.label("No data loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for layer in scene.layers() {
                ui.heading(&layer.legend_title);
                ui.label(format!("{} bins, {}", layer.distribution.scale, layer.scheme));
                ui.separator();
                legend_table(ui, layer);
                ui.add_space(8.0);
            }

            ui.heading("Statistics");
            ui.separator();
            for line in scene.stats_lines.iter().filter(|l| !l.is_empty()) {
                ui.label(line);
            }
        });
}

fn legend_table(ui: &mut Ui, layer: &Layer) {
    ui.push_id(("legend_table", layer.kind), |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(18.0))
            .column(Column::remainder())
            .body(|mut body| {
                for entry in &layer.legend {
                    body.row(18.0, |mut row| {
                        row.col(|ui: &mut Ui| {
                            let (rect, _) =
                                ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                            ui.painter().rect_filled(rect, 2.0, entry.color);
                        });
                        row.col(|ui: &mut Ui| {
                            let text = RichText::new(&entry.label);
                            ui.label(if entry.highlighted { text.strong() } else { text });
                        });
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.scene.is_some(), egui::Button::new("Save image…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(state.table.is_some(), egui::Button::new("Open overlay…"))
                .on_hover_text("Draw a table of the other kind in the same view")
                .clicked()
            {
                open_overlay_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.partner.is_some(), egui::Button::new("Remove overlay"))
                .clicked()
            {
                state.clear_partner();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Create example data").clicked() {
                state.create_example_data();
                ui.close_menu();
            }
        });

        if ui.button("Reset view").clicked() {
            state.camera = Default::default();
        }

        ui.separator();

        if let Some(scene) = &state.scene {
            ui.label(format!(
                "{} of {} shown",
                scene.visible_count, scene.total_count
            ));
        }

        if let Some(status) = &state.status {
            ui.separator();
            let color = if status.is_error() {
                Color32::RED
            } else {
                ui.visuals().weak_text_color()
            };
            ui.label(RichText::new(status.text()).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn table_dialog(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
}

pub fn open_file_dialog(state: &mut AppState) {
    if let Some(path) = table_dialog("Open component table").pick_file() {
        state.load_path(&path);
    }
}

pub fn open_overlay_dialog(state: &mut AppState) {
    let Some(kind) = state.table.as_ref().map(|t| t.kind.other()) else {
        return;
    };
    if let Some(path) = table_dialog(&format!("Open {kind} table to overlay")).pick_file() {
        state.load_partner_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let stem = state
        .table
        .as_ref()
        .and_then(|t| t.source.as_ref())
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "components".to_string());

    let file = rfd::FileDialog::new()
        .set_title("Save image")
        .set_file_name(format!("{stem}.png"))
        .add_filter("Images", &ExportFormat::EXTENSIONS)
        .add_filter("PNG", &["png"])
        .add_filter("JPEG", &["jpg", "jpeg"])
        .add_filter("SVG", &["svg"])
        .add_filter("PDF", &["pdf"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
