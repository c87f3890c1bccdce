//! Headless export of a [`Scene`] with [`plotters`].
//!
//! The scene is projected through the same [`Camera`] the viewer uses, so an
//! exported chart matches what is on screen. PNG and JPEG go through the
//! bitmap backend, SVG through the SVG backend, and PDF is the SVG drawing
//! converted with [`svg2pdf`].

use std::fmt;
use std::path::{Path, PathBuf};

use eframe::egui::Color32;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::element::DashedPathElement;
use thiserror::Error;

use crate::data::model::Point3;
use crate::scene::{Camera, Layer, Scene, SceneSegment, SegmentStyle};

/// Errors that can occur while exporting a chart.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("unsupported export format '{0}' (use png, jpg, svg or pdf)")]
    UnsupportedFormat(String),

    #[error("export path {0} has no file extension")]
    MissingExtension(PathBuf),

    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("failed to write output: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("failed to set up chart: {0}")]
    ChartConfig(String),

    #[error("failed to draw chart: {0}")]
    Drawing(String),

    #[error("failed to convert chart to PDF: {0}")]
    Pdf(String),
}

type Result<T> = core::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Pdf,
}

impl ExportFormat {
    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ExportError::MissingExtension(path.to_path_buf()))?;
        match ext.as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(ext)),
        }
    }

    /// Extensions offered in save dialogs.
    pub const EXTENSIONS: [&'static str; 5] = ["png", "jpg", "jpeg", "svg", "pdf"];
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => write!(f, "PNG"),
            ExportFormat::Jpeg => write!(f, "JPEG"),
            ExportFormat::Svg => write!(f, "SVG"),
            ExportFormat::Pdf => write!(f, "PDF"),
        }
    }
}

/// Draw `scene` as seen from `camera` into `path`.
///
/// The format follows the file extension; anything else is rejected before
/// any file is created.
pub fn export_scene(scene: &Scene, camera: &Camera, path: &Path, size: (u32, u32)) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    let (width, height) = size;
    if width < 200 || height < 200 {
        return Err(ExportError::InvalidSize { width, height });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Png | ExportFormat::Jpeg => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_scene(&root, scene, camera)?;
            root.present().map_err(|e| ExportError::Drawing(e.to_string()))?;
        }
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_scene(&root, scene, camera)?;
            root.present().map_err(|e| ExportError::Drawing(e.to_string()))?;
        }
        ExportFormat::Pdf => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_scene(&root, scene, camera)?;
                root.present().map_err(|e| ExportError::Drawing(e.to_string()))?;
            }
            std::fs::write(path, svg_to_pdf(&svg)?)?;
        }
    }

    log::info!(
        "Exported {} segments as {format} to {}",
        scene.visible_count,
        path.display()
    );
    Ok(())
}

/// Convert an SVG document into a single-page PDF of the same size.
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = svg2pdf::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &options).map_err(|e| ExportError::Pdf(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ExportError::Pdf(e.to_string()))
}

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

/// Projected x/y ranges of the scene bounds, padded a little.
fn view_ranges(scene: &Scene, camera: &Camera) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let b = &scene.bounds;
    let corners = [b.min.z, b.max.z]
        .into_iter()
        .flat_map(|z| b.plane_corners(z))
        .map(|p| camera.project(p, b));

    let (mut x0, mut x1, mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for [x, y] in corners {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }
    let pad = 0.05 * (x1 - x0).max(y1 - y0).max(1e-6);
    (x0 - pad..x1 + pad, y0 - pad..y1 + pad)
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene, camera: &Camera) -> Result<()> {
    let drawing = |e: DrawingAreaErrorKind<DB::ErrorType>| ExportError::Drawing(e.to_string());

    root.fill(&WHITE).map_err(drawing)?;
    let (width, _) = root.dim_in_pixel();
    let (plot_area, side_area) = root.split_horizontally(width * 3 / 4);

    let (x_range, y_range) = view_ranges(scene, camera);
    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&scene.title, ("sans-serif", 24))
        .margin(20)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| ExportError::ChartConfig(e.to_string()))?;

    let bounds = scene.bounds;
    let project = |p: Point3| {
        let [x, y] = camera.project(p, &bounds);
        (x, y)
    };

    // Bounding box edges stand in for the 3D axes.
    let bottom = bounds.plane_corners(bounds.min.z);
    let top = bounds.plane_corners(bounds.max.z);
    let frame_style = RGBColor(180, 180, 180).stroke_width(1);
    let frame = (0..4).flat_map(|i| {
        let j = (i + 1) % 4;
        [
            vec![project(bottom[i]), project(bottom[j])],
            vec![project(top[i]), project(top[j])],
            vec![project(bottom[i]), project(top[i])],
        ]
    });
    chart
        .draw_series(frame.map(|path| PathElement::new(path, frame_style)))
        .map_err(drawing)?;

    chart
        .draw_series(scene.z_planes.iter().map(|&z| {
            let corners = bounds.plane_corners(z).map(project).to_vec();
            Polygon::new(corners, RGBColor(120, 120, 120).mix(0.08).filled())
        }))
        .map_err(drawing)?;

    let stroke = scene.line_width.round().max(1.0) as u32;
    let radius = (scene.marker_size / 2.0).round().max(1.0) as i32;
    for layer in scene.layers() {
        let style_of = |s: &SceneSegment| rgb(s.color).mix(s.alpha() as f64);
        let path = |s: &SceneSegment| vec![project(s.start), project(s.end)];

        match layer.style {
            SegmentStyle::Solid => chart.draw_series(
                layer
                    .segments
                    .iter()
                    .map(|s| PathElement::new(path(s), style_of(s).stroke_width(stroke))),
            ),
            SegmentStyle::Dashed => chart.draw_series(layer.segments.iter().map(|s| {
                DashedPathElement::new(path(s), 6 * stroke, 4 * stroke, style_of(s).stroke_width(stroke))
            })),
        }
        .map_err(drawing)?;

        if !scene.show_nodes {
            continue;
        }
        let nodes = layer.segments.iter().flat_map(|s| [(s, s.start), (s, s.end)]);
        match layer.style {
            SegmentStyle::Solid => chart.draw_series(
                nodes.map(|(s, p)| Circle::new(project(p), radius, style_of(s).filled())),
            ),
            SegmentStyle::Dashed => chart.draw_series(nodes.map(|(s, p)| {
                EmptyElement::at(project(p))
                    + Rectangle::new([(-radius, -radius), (radius, radius)], style_of(s).filled())
            })),
        }
        .map_err(drawing)?;
    }

    chart
        .draw_series(
            scene
                .value_labels
                .iter()
                .map(|l| Text::new(l.text.clone(), project(l.position), ("sans-serif", 12))),
        )
        .map_err(drawing)?;

    draw_side_panel(&side_area, scene)
}

/// Legends and stats text on the right-hand side.
fn draw_side_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, scene: &Scene) -> Result<()> {
    let drawing = |e: DrawingAreaErrorKind<DB::ErrorType>| ExportError::Drawing(e.to_string());
    let line_height = 22;
    let mut y = 40;

    for layer in scene.layers() {
        y = draw_legend(area, layer, y, line_height).map_err(drawing)?;
        y += line_height;
    }

    for line in &scene.stats_lines {
        area.draw(&Text::new(line.clone(), (10, y), ("sans-serif", 13)))
            .map_err(drawing)?;
        y += line_height;
    }
    Ok(())
}

/// Draw one layer's legend starting at `y`; returns the next free row.
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    layer: &Layer,
    mut y: i32,
    line_height: i32,
) -> core::result::Result<i32, DrawingAreaErrorKind<DB::ErrorType>> {
    area.draw(&Text::new(layer.legend_title.clone(), (10, y), ("sans-serif", 16)))?;
    y += line_height + 6;

    let any_highlighted = layer.legend.iter().any(|e| e.highlighted);
    for entry in &layer.legend {
        let alpha = if any_highlighted && !entry.highlighted { 0.3 } else { 1.0 };
        area.draw(&Rectangle::new(
            [(10, y), (26, y + 14)],
            rgb(entry.color).mix(alpha).filled(),
        ))?;
        area.draw(&Text::new(entry.label.clone(), (34, y), ("sans-serif", 13)))?;
        y += line_height;
    }
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::ValueFilter;
    use crate::data::loader::parse_csv_str;
    use crate::data::model::ComponentKind;
    use crate::data::sample::{synthetic_table, SAMPLE_CAPACITOR_CSV};
    use crate::scene::{render, render_overlaid, DisplayOptions};
    use rstest::rstest;

    fn sample_scene(options: &DisplayOptions) -> Scene {
        let table = parse_csv_str(SAMPLE_CAPACITOR_CSV).unwrap();
        let filter = ValueFilter::for_table(&table).unwrap();
        render(&table, &filter, options).unwrap()
    }

    #[rstest]
    #[case("chart.png", ExportFormat::Png)]
    #[case("chart.JPG", ExportFormat::Jpeg)]
    #[case("out/chart.jpeg", ExportFormat::Jpeg)]
    #[case("chart.svg", ExportFormat::Svg)]
    #[case("report/chart.PDF", ExportFormat::Pdf)]
    fn formats_follow_extension(#[case] path: &str, #[case] expected: ExportFormat) {
        assert_eq!(ExportFormat::from_path(Path::new(path)).unwrap(), expected);
    }

    #[test]
    fn unknown_format_is_rejected_before_writing() {
        let scene = sample_scene(&DisplayOptions::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.tiff");

        let err = export_scene(&scene, &Camera::default(), &path, (800, 600)).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ref ext) if ext == "tiff"));
        assert!(!path.exists());
    }

    #[test]
    fn svg_converts_to_pdf() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="200">
            <rect width="300" height="200" fill="#ffffff"/>
            <polyline points="20,20 280,180" stroke="#440154" stroke-width="2" fill="none"/>
            <polyline points="20,180 280,20" stroke="#0d0887" stroke-width="2" stroke-dasharray="6,4" fill="none"/>
        </svg>"##;
        let pdf = svg_to_pdf(svg).unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        assert!(matches!(svg_to_pdf("not an svg"), Err(ExportError::Pdf(_))));
    }

    #[test]
    fn missing_extension_and_tiny_size_are_rejected() {
        let scene = sample_scene(&DisplayOptions::default());
        let dir = tempfile::tempdir().unwrap();

        let err = export_scene(&scene, &Camera::default(), &dir.path().join("chart"), (800, 600));
        assert!(matches!(err, Err(ExportError::MissingExtension(_))));

        let err = export_scene(&scene, &Camera::default(), &dir.path().join("chart.png"), (10, 600));
        assert!(matches!(err, Err(ExportError::InvalidSize { width: 10, .. })));
    }

    #[test]
    fn view_ranges_cover_every_segment() {
        let scene = sample_scene(&DisplayOptions::default());
        let camera = Camera::default();
        let (xs, ys) = view_ranges(&scene, &camera);
        for s in &scene.primary.segments {
            for p in [s.start, s.end] {
                let [x, y] = camera.project(p, &scene.bounds);
                assert!(xs.contains(&x) && ys.contains(&y));
            }
        }
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn exports_every_format_with_overlay() {
        let options = DisplayOptions {
            show_values: true,
            show_z_planes: true,
            highlight: Some(1),
            ..DisplayOptions::default()
        };
        let caps = parse_csv_str(SAMPLE_CAPACITOR_CSV).unwrap();
        let resistors = synthetic_table(ComponentKind::Resistor, 20, 3);
        let filter = ValueFilter::for_table(&caps).unwrap();
        let scene = render_overlaid(&caps, Some(&resistors), &filter, &options).unwrap();
        let dir = tempfile::tempdir().unwrap();

        for name in ["chart.png", "nested/chart.svg", "chart.pdf"] {
            let path = dir.path().join(name);
            export_scene(&scene, &Camera::default(), &path, (1200, 900)).unwrap();
            assert!(path.metadata().unwrap().len() > 0);
        }
    }
}
