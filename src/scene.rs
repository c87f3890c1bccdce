//! Toolkit-independent description of the 3D view.
//!
//! [`render`] turns a loaded table, the value filter and the display options
//! into a [`Scene`]. It has no side effects, so the UI re-runs it after every
//! option change and the exporter draws the very same scene off-screen.

use std::ops::RangeInclusive;

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    analyze, closest_pairs, find_close_pairs, Distribution, DistributionError, ProximityRecord,
    ValueSummary, DEFAULT_PROXIMITY_THRESHOLD,
};
use crate::color::{BinColorMap, ColorScheme};
use crate::data::filter::{visible_indices, ValueFilter};
use crate::data::model::{Component, ComponentKind, ComponentTable, Point3};

pub const BIN_RANGE: RangeInclusive<usize> = 2..=20;
pub const LINE_WIDTH_RANGE: RangeInclusive<f32> = 0.5..=5.0;
pub const MARKER_SIZE_RANGE: RangeInclusive<f32> = 1.0..=10.0;

/// Opacity of segments outside the highlighted bin.
pub const FADED_ALPHA: f32 = 0.2;

/// Fraction of each axis range added around the data.
const BOUNDS_PADDING: f64 = 0.05;
const MIN_AXIS_RANGE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Display options
// ---------------------------------------------------------------------------

/// Everything the user can tweak about the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub color_scheme: ColorScheme,
    pub num_bins: usize,
    /// Request logarithmic bins; wide positive columns get them regardless.
    pub use_log: bool,
    pub line_width: f32,
    pub marker_size: f32,
    pub show_nodes: bool,
    pub show_values: bool,
    pub show_z_planes: bool,
    /// Bin whose segments stay opaque while the rest fade.
    #[serde(skip)]
    pub highlight: Option<usize>,
    pub proximity_threshold: f64,
    /// How many of the closest pairs the stats text lists.
    pub closest_pairs: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Viridis,
            num_bins: 5,
            use_log: false,
            line_width: 2.0,
            marker_size: 5.0,
            show_nodes: true,
            show_values: false,
            show_z_planes: false,
            highlight: None,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            closest_pairs: 3,
        }
    }
}

impl DisplayOptions {
    /// Copy with every numeric option pulled into its allowed range.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let threshold = if self.proximity_threshold.is_finite() && self.proximity_threshold >= 0.0 {
            self.proximity_threshold
        } else {
            defaults.proximity_threshold
        };
        Self {
            num_bins: self.num_bins.clamp(*BIN_RANGE.start(), *BIN_RANGE.end()),
            line_width: clamp_or(self.line_width, &LINE_WIDTH_RANGE, defaults.line_width),
            marker_size: clamp_or(self.marker_size, &MARKER_SIZE_RANGE, defaults.marker_size),
            proximity_threshold: threshold,
            ..self.clone()
        }
    }

    /// Advance the highlighted bin: none → 0 → 1 → … → last → none.
    pub fn cycle_highlight(&mut self, num_bins: usize) {
        self.highlight = match self.highlight {
            None if num_bins > 0 => Some(0),
            Some(i) if i + 1 < num_bins => Some(i + 1),
            _ => None,
        };
    }
}

fn clamp_or(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSegment {
    pub name: String,
    pub start: Point3,
    pub end: Point3,
    pub value: f64,
    pub bin: usize,
    /// Opaque bin colour; see `faded` for the highlight state.
    pub color: Color32,
    pub faded: bool,
}

impl SceneSegment {
    pub fn alpha(&self) -> f32 {
        if self.faded {
            FADED_ALPHA
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color32,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub position: Point3,
    pub text: String,
}

/// Line and node style of a table's segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStyle {
    /// Solid lines, round nodes.
    Solid,
    /// Dashed lines, square nodes.
    Dashed,
}

impl SegmentStyle {
    pub fn for_kind(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Capacitor => SegmentStyle::Solid,
            ComponentKind::Resistor => SegmentStyle::Dashed,
        }
    }
}

/// One table's segments, binned and coloured on their own.
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: ComponentKind,
    pub style: SegmentStyle,
    pub scheme: ColorScheme,
    /// e.g. "Capacitance Ranges (fF)".
    pub legend_title: String,
    pub unit: String,
    pub segments: Vec<SceneSegment>,
    pub legend: Vec<LegendEntry>,
    pub distribution: Distribution,
}

impl Layer {
    /// Bin every value of `table` and colour the `visible` components.
    fn build(
        table: &ComponentTable,
        visible: &[&Component],
        scheme: ColorScheme,
        options: &DisplayOptions,
        highlight: Option<usize>,
    ) -> Result<Self, DistributionError> {
        let distribution = analyze(&table.values(), options.num_bins, options.use_log)?;
        let color_map = BinColorMap::new(scheme, &distribution);
        let highlight = highlight.filter(|&i| i < distribution.num_bins());

        let segments = visible
            .iter()
            .map(|c| {
                let bin = distribution.bin_index(c.value);
                SceneSegment {
                    name: c.name.clone(),
                    start: c.start,
                    end: c.end,
                    value: c.value,
                    bin,
                    color: color_map.bin_color(bin),
                    faded: highlight.is_some_and(|h| h != bin),
                }
            })
            .collect();

        let legend = color_map
            .legend_entries()
            .into_iter()
            .enumerate()
            .map(|(i, (label, color))| LegendEntry {
                label,
                color,
                highlighted: highlight == Some(i),
            })
            .collect();

        Ok(Layer {
            kind: table.kind,
            style: SegmentStyle::for_kind(table.kind),
            scheme,
            legend_title: format!("{} Ranges ({})", table.kind.quantity(), table.unit),
            unit: table.unit.clone(),
            segments,
            legend,
            distribution,
        })
    }
}

/// Axis-aligned box around the data, padded for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    /// Bounds of every endpoint in `table`, each axis padded by 5% of its
    /// range (at least 1e-6).
    pub fn around(table: &ComponentTable) -> Self {
        Self::around_all(&[table])
    }

    /// Padded bounds of every endpoint across `tables`.
    pub fn around_all(tables: &[&ComponentTable]) -> Self {
        let mut lo = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut hi = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let points = tables
            .iter()
            .flat_map(|t| &t.components)
            .flat_map(|c| [c.start, c.end]);
        for p in points {
            lo = Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
            hi = Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
        }
        if tables.iter().all(|t| t.is_empty()) {
            lo = Point3::default();
            hi = Point3::default();
        }

        let pad = |lo: f64, hi: f64| {
            let range = (hi - lo).max(MIN_AXIS_RANGE);
            (lo - BOUNDS_PADDING * range, hi + BOUNDS_PADDING * range)
        };
        let (x0, x1) = pad(lo.x, hi.x);
        let (y0, y1) = pad(lo.y, hi.y);
        let (z0, z1) = pad(lo.z, hi.z);
        Bounds3 {
            min: Point3::new(x0, y0, z0),
            max: Point3::new(x1, y1, z1),
        }
    }

    pub fn center(&self) -> Point3 {
        self.min.midpoint(&self.max)
    }

    /// Length of the longest side.
    pub fn max_span(&self) -> f64 {
        (self.max.x - self.min.x)
            .max(self.max.y - self.min.y)
            .max(self.max.z - self.min.z)
    }

    /// Corners of the horizontal rectangle at height `z`, in drawing order.
    pub fn plane_corners(&self, z: f64) -> [Point3; 4] {
        [
            Point3::new(self.min.x, self.min.y, z),
            Point3::new(self.max.x, self.min.y, z),
            Point3::new(self.max.x, self.max.y, z),
            Point3::new(self.min.x, self.max.y, z),
        ]
    }
}

/// Everything the 3D view and the exporter draw.
#[derive(Debug, Clone)]
pub struct Scene {
    pub title: String,
    /// The loaded table: filtered, highlightable.
    pub primary: Layer,
    /// A table of the other kind drawn alongside, always in full.
    pub overlay: Option<Layer>,
    pub value_labels: Vec<ValueLabel>,
    /// Distinct endpoint heights, ascending; empty unless planes are shown.
    pub z_planes: Vec<f64>,
    pub bounds: Bounds3,
    pub summary: Option<ValueSummary>,
    pub closest_pairs: Vec<ProximityRecord>,
    pub stats_lines: Vec<String>,
    pub line_width: f32,
    pub marker_size: f32,
    pub show_nodes: bool,
    pub visible_count: usize,
    pub total_count: usize,
}

impl Scene {
    /// The primary layer, then the overlay if any.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        std::iter::once(&self.primary).chain(self.overlay.as_ref())
    }
}

/// Build the scene for `table` under `filter` and `options`.
pub fn render(
    table: &ComponentTable,
    filter: &ValueFilter,
    options: &DisplayOptions,
) -> Result<Scene, DistributionError> {
    render_overlaid(table, None, filter, options)
}

/// Build the scene for `table`, with `partner` drawn alongside when given.
///
/// Bins are computed over each whole value column so colours stay put while
/// the filter hides segments. The filter, highlight and proximity search
/// apply to `table` only; `partner` is binned with the contrasting colour
/// scheme and shares the bounds. Fails only when a table cannot be binned.
pub fn render_overlaid(
    table: &ComponentTable,
    partner: Option<&ComponentTable>,
    filter: &ValueFilter,
    options: &DisplayOptions,
) -> Result<Scene, DistributionError> {
    let options = options.sanitized();
    let visible: Vec<&Component> = visible_indices(table, filter)
        .into_iter()
        .map(|i| &table.components[i])
        .collect();

    let primary = Layer::build(table, &visible, options.color_scheme, &options, options.highlight)?;
    let overlay = partner
        .map(|p| {
            let all: Vec<&Component> = p.components.iter().collect();
            Layer::build(p, &all, options.color_scheme.contrasting(), &options, None)
        })
        .transpose()?;

    let tables: Vec<&ComponentTable> = std::iter::once(table).chain(partner).collect();

    let value_labels = if options.show_values {
        std::iter::once(&primary)
            .chain(overlay.as_ref())
            .flat_map(|layer| &layer.segments)
            .map(|s| ValueLabel {
                position: s.start.midpoint(&s.end),
                text: format!("{:.3e}", s.value),
            })
            .collect()
    } else {
        Vec::new()
    };

    let z_planes = if options.show_z_planes {
        z_levels(&tables)
    } else {
        Vec::new()
    };

    let records = find_close_pairs(&visible, options.proximity_threshold);
    let nearest = closest_pairs(&records, options.closest_pairs);
    let summary = ValueSummary::from_values(&table.values());

    let mut stats_lines = stats_lines(table, filter, summary.as_ref(), visible.len());
    if let Some(partner) = partner {
        stats_lines.push(String::new());
        stats_lines.extend(overlay_lines(partner));
    }
    if !nearest.is_empty() {
        stats_lines.push(String::new());
        stats_lines.push("Closest Edges:".to_string());
        stats_lines.extend(
            nearest
                .iter()
                .map(|p| format!("{} & {}: {:.2e}", p.name_a, p.name_b, p.min_distance)),
        );
    }

    Ok(Scene {
        title: scene_title(&tables),
        visible_count: visible.len(),
        total_count: table.len(),
        primary,
        overlay,
        value_labels,
        z_planes,
        bounds: Bounds3::around_all(&tables),
        summary,
        closest_pairs: nearest,
        stats_lines,
        line_width: options.line_width,
        marker_size: options.marker_size,
        show_nodes: options.show_nodes,
    })
}

/// "Capacitor Edge Visualization: caps.csv" for one table; with an overlay,
/// "Component Visualization: Capacitors: caps.csv, Resistors: res.csv".
fn scene_title(tables: &[&ComponentTable]) -> String {
    match tables {
        [table] => format!("{} Edge Visualization: {}", table.kind.title(), table.display_name()),
        _ => {
            let mut sorted = tables.to_vec();
            sorted.sort_by_key(|t| t.kind);
            let names: Vec<String> = sorted
                .iter()
                .map(|t| format!("{}s: {}", t.kind.title(), t.display_name()))
                .collect();
            format!("Component Visualization: {}", names.join(", "))
        }
    }
}

/// Distinct endpoint z coordinates across `tables`, ascending.
pub fn z_levels(tables: &[&ComponentTable]) -> Vec<f64> {
    let mut levels: Vec<f64> = tables
        .iter()
        .flat_map(|t| &t.components)
        .flat_map(|c| [c.start.z, c.end.z])
        .collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup();
    levels
}

fn stats_lines(
    table: &ComponentTable,
    filter: &ValueFilter,
    summary: Option<&ValueSummary>,
    visible: usize,
) -> Vec<String> {
    let unit = &table.unit;
    let plural = table.kind.plural();
    let mut lines = vec![format!("Total: {} {plural}", table.len())];
    if !filter.is_full_range() {
        lines.push(format!("Showing: {visible} of {}", table.len()));
        lines.push(format!("Filter: {:.2e} - {:.2e} {unit}", filter.min(), filter.max()));
    }
    if visible == 0 {
        lines.push(format!("No {plural} match the current filter range"));
    }
    if let Some(s) = summary {
        lines.push(format!("Range: {:.2e} - {:.2e} {unit}", s.min, s.max));
        lines.push(format!("Mean: {:.2e} {unit}", s.mean));
    }
    lines
}

fn overlay_lines(partner: &ComponentTable) -> Vec<String> {
    let unit = &partner.unit;
    let mut lines = vec![format!("Overlay: {} {}", partner.len(), partner.kind.plural())];
    if let Some(s) = ValueSummary::from_values(&partner.values()) {
        lines.push(format!("Range: {:.2e} - {:.2e} {unit}", s.min, s.max));
    }
    lines
}

// ---------------------------------------------------------------------------
// Camera: 3D → 2D projection
// ---------------------------------------------------------------------------

/// Orbit camera around the scene centre; z is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Rotation about the vertical axis, radians.
    pub yaw: f32,
    /// Elevation above the horizontal plane, radians.
    pub pitch: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yaw: (-60f32).to_radians(),
            pitch: 30f32.to_radians(),
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2;

    /// Rotate by a drag of `(dx, dy)` radians.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw = (self.yaw + dx).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + dy).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Project `p` into view coordinates. The scene is centred on the
    /// origin and scaled so its longest side spans one unit.
    pub fn project(&self, p: Point3, bounds: &Bounds3) -> [f64; 2] {
        let c = bounds.center();
        let scale = bounds.max_span().max(MIN_AXIS_RANGE);
        let x = (p.x - c.x) / scale;
        let y = (p.y - c.y) / scale;
        let z = (p.z - c.z) / scale;

        let (sin_yaw, cos_yaw) = (self.yaw as f64).sin_cos();
        let (sin_pitch, cos_pitch) = (self.pitch as f64).sin_cos();

        // Rotate around the vertical axis, then tilt towards the viewer.
        let x1 = x * cos_yaw - y * sin_yaw;
        let y1 = x * sin_yaw + y * cos_yaw;
        let screen_y = z * cos_pitch + y1 * sin_pitch;

        let zoom = self.zoom as f64;
        [x1 * zoom, screen_y * zoom]
    }
}
