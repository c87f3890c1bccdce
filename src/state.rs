use std::path::Path;

use anyhow::Context;

use crate::config::ViewerConfig;
use crate::data::filter::{format_bound, parse_bound, ValueFilter};
use crate::data::loader::{load_file, partner_path};
use crate::data::model::ComponentTable;
use crate::data::sample::write_example_data;
use crate::export::export_scene;
use crate::scene::{render_overlaid, Camera, DisplayOptions, Scene};

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Info(s) | Status::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Loaded table (None until the user loads a file).
    pub table: Option<ComponentTable>,

    /// Table of the other kind drawn over `table`.
    pub partner: Option<ComponentTable>,

    /// Value window applied to the loaded table.
    pub filter: Option<ValueFilter>,

    /// Contents of the min / max text fields.
    pub min_text: String,
    pub max_text: String,

    pub options: DisplayOptions,
    pub camera: Camera,

    /// Scene for the current table, filter and options (cached).
    pub scene: Option<Scene>,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            options: config.display.sanitized(),
            config,
            table: None,
            partner: None,
            filter: None,
            min_text: String::new(),
            max_text: String::new(),
            camera: Camera::default(),
            scene: None,
            status: None,
        }
    }

    /// Load `path`, keeping the current table when it fails.
    ///
    /// A matching table of the other kind next to it (see
    /// [`partner_path`]) is overlaid automatically.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path).with_context(|| format!("Failed to load {}", path.display())) {
            Ok(table) => {
                let message = format!(
                    "Loaded {} {} from {}",
                    table.len(),
                    table.kind.plural(),
                    table.display_name()
                );
                self.partner = None;
                self.set_table(table);
                self.set_info(message);

                if let Some(partner) = partner_path(path).filter(|p| p.is_file()) {
                    self.load_partner_path(&partner);
                }
            }
            Err(e) => self.set_error(e),
        }
    }

    /// Overlay the table at `path`, which must be of the other kind than
    /// the loaded one. A failure keeps the current overlay.
    pub fn load_partner_path(&mut self, path: &Path) {
        let Some(kind) = self.table.as_ref().map(|t| t.kind) else {
            self.set_error(anyhow::anyhow!("Load a table before adding an overlay"));
            return;
        };
        let loaded = load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))
            .and_then(|partner| {
                anyhow::ensure!(
                    partner.kind == kind.other(),
                    "{} holds {}; the overlay must hold {}",
                    partner.display_name(),
                    partner.kind.plural(),
                    kind.other().plural()
                );
                Ok(partner)
            });
        match loaded {
            Ok(partner) => {
                let message = format!(
                    "Overlaid {} {} from {}",
                    partner.len(),
                    partner.kind.plural(),
                    partner.display_name()
                );
                self.partner = Some(partner);
                self.refresh_scene();
                self.set_info(message);
            }
            Err(e) => self.set_error(e),
        }
    }

    pub fn clear_partner(&mut self) {
        if self.partner.take().is_some() {
            self.refresh_scene();
            self.set_info("Overlay removed".to_string());
        }
    }

    /// Load the configured default data file if it exists.
    pub fn load_default_data(&mut self) {
        let path = self.config.default_data_file.clone();
        if path.is_file() {
            self.load_path(&path);
        } else {
            log::info!("No data file at {}; waiting for the user", path.display());
        }
    }

    /// Ingest a newly loaded table, reset the filter and highlight.
    pub fn set_table(&mut self, table: ComponentTable) {
        self.filter = ValueFilter::for_table(&table);
        self.options.highlight = None;
        self.table = Some(table);
        self.sync_filter_text();
        self.refresh_scene();
    }

    /// Rebuild the cached scene from table, filter and options.
    pub fn refresh_scene(&mut self) {
        let (Some(table), Some(filter)) = (&self.table, &self.filter) else {
            self.scene = None;
            return;
        };
        match render_overlaid(table, self.partner.as_ref(), filter, &self.options) {
            Ok(scene) => self.scene = Some(scene),
            Err(e) => {
                self.scene = None;
                self.set_error(anyhow::Error::new(e).context("Failed to build the view"));
            }
        }
    }

    /// Replace the display options, rebuilding the scene if they changed.
    pub fn update_options(&mut self, options: DisplayOptions) {
        let options = options.sanitized();
        if options != self.options {
            self.options = options;
            self.refresh_scene();
        }
    }

    // ---- Filter ----

    pub fn set_filter_min(&mut self, value: f64) {
        if let Some(filter) = &mut self.filter {
            filter.set_min(value);
            self.sync_filter_text();
            self.refresh_scene();
        }
    }

    pub fn set_filter_max(&mut self, value: f64) {
        if let Some(filter) = &mut self.filter {
            filter.set_max(value);
            self.sync_filter_text();
            self.refresh_scene();
        }
    }

    /// Apply the min text field; invalid text restores the previous bound.
    pub fn apply_min_text(&mut self) {
        match parse_bound(&self.min_text) {
            Ok(value) => self.set_filter_min(value),
            Err(e) => {
                self.sync_filter_text();
                self.set_error(anyhow::Error::new(e).context("Invalid minimum"));
            }
        }
    }

    /// Apply the max text field; invalid text restores the previous bound.
    pub fn apply_max_text(&mut self) {
        match parse_bound(&self.max_text) {
            Ok(value) => self.set_filter_max(value),
            Err(e) => {
                self.sync_filter_text();
                self.set_error(anyhow::Error::new(e).context("Invalid maximum"));
            }
        }
    }

    pub fn reset_filter(&mut self) {
        if let Some(filter) = &mut self.filter {
            filter.reset();
            self.sync_filter_text();
            self.refresh_scene();
        }
    }

    fn sync_filter_text(&mut self) {
        match &self.filter {
            Some(filter) => {
                self.min_text = format_bound(filter.min());
                self.max_text = format_bound(filter.max());
            }
            None => {
                self.min_text.clear();
                self.max_text.clear();
            }
        }
    }

    // ---- Highlight ----

    /// Step the highlighted bin: none → first → … → last → none.
    pub fn cycle_highlight(&mut self) {
        let num_bins = self
            .scene
            .as_ref()
            .map_or(self.options.num_bins, |s| s.primary.distribution.num_bins());
        self.options.cycle_highlight(num_bins);
        self.refresh_scene();
    }

    // ---- Files ----

    /// Export the current scene to `path`.
    pub fn export_to(&mut self, path: &Path) {
        let Some(scene) = &self.scene else {
            self.set_error(anyhow::anyhow!("Nothing to export; load a file first"));
            return;
        };
        let size = (self.config.export_width, self.config.export_height);
        match export_scene(scene, &self.camera, path, size)
            .with_context(|| format!("Failed to save {}", path.display()))
        {
            Ok(()) => self.set_info(format!("Saved {}", path.display())),
            Err(e) => self.set_error(e),
        }
    }

    /// Write the built-in example table and load it.
    pub fn create_example_data(&mut self) {
        let dir = self.config.sample_dir.clone();
        match write_example_data(&dir)
            .with_context(|| format!("Failed to write example data to {}", dir.display()))
        {
            Ok(path) => self.load_path(&path),
            Err(e) => self.set_error(e),
        }
    }

    // ---- Status ----

    fn set_info(&mut self, message: String) {
        log::info!("{message}");
        self.status = Some(Status::Info(message));
    }

    fn set_error(&mut self, error: anyhow::Error) {
        log::error!("{error:#}");
        self.status = Some(Status::Error(format!("Error: {error:#}")));
    }
}
