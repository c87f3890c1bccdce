use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Line, LineStyle, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::data::model::Point3;
use crate::scene::{Camera, Scene, SegmentStyle};
use crate::state::AppState;

/// Radians of rotation per dragged point.
const ORBIT_SPEED: f32 = 0.01;

// ---------------------------------------------------------------------------
// 3D component view (central panel)
// ---------------------------------------------------------------------------

/// Render the projected scene in the central panel. Dragging orbits the
/// camera; scrolling zooms.
pub fn scene_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(scene) = &state.scene else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view components  (File → Open…)");
        });
        return;
    };
    let camera = state.camera;

    let response = Plot::new("scene_plot")
        .legend(egui_plot::Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let project = |p: Point3| camera.project(p, &scene.bounds);

            for &z in &scene.z_planes {
                let corners: PlotPoints = scene
                    .bounds
                    .plane_corners(z)
                    .into_iter()
                    .map(project)
                    .collect();
                plot_ui.polygon(
                    Polygon::new(corners)
                        .fill_color(Color32::from_gray(128).gamma_multiply(0.08))
                        .stroke(Stroke::new(0.5, Color32::from_gray(150))),
                );
            }

            for layer in scene.layers() {
                let (line_style, marker) = match layer.style {
                    SegmentStyle::Solid => (LineStyle::Solid, MarkerShape::Circle),
                    SegmentStyle::Dashed => (LineStyle::dashed_loose(), MarkerShape::Square),
                };
                for seg in &layer.segments {
                    let color = seg.color.gamma_multiply(seg.alpha());
                    let name = layer.legend.get(seg.bin).map_or("", |e| e.label.as_str());
                    let points = PlotPoints::from(vec![project(seg.start), project(seg.end)]);
                    plot_ui.line(
                        Line::new(points)
                            .name(name)
                            .color(color)
                            .width(scene.line_width)
                            .style(line_style),
                    );

                    if scene.show_nodes {
                        plot_ui.points(
                            Points::new(vec![project(seg.start), project(seg.end)])
                                .name(name)
                                .color(color)
                                .shape(marker)
                                .radius(scene.marker_size / 2.0),
                        );
                    }
                }
            }

            for label in &scene.value_labels {
                let [x, y] = project(label.position);
                plot_ui.text(Text::new(PlotPoint::new(x, y), RichText::new(&label.text).small()));
            }
        })
        .response;

    if response.dragged() {
        let delta = response.drag_delta();
        state.camera.orbit(delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
    }
    if response.double_clicked() {
        state.camera = Camera::default();
    }
}

/// Heading shown above the plot.
pub fn scene_title(ui: &mut Ui, scene: &Scene) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(&scene.title);
    });
}
