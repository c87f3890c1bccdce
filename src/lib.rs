//! Circuit Viewer: capacitors and resistors drawn as coloured 3D segments.
//!
//! The crate is split into a pure core and an egui front end:
//!
//! - [`data`] loads and filters component tables,
//! - [`analysis`] bins values and finds close endpoints,
//! - [`scene`] combines both into a drawable [`scene::Scene`],
//! - [`export`] and [`report`] turn a scene into images and text,
//! - [`app`], [`state`] and [`ui`] make up the desktop viewer.

pub mod analysis;
pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod export;
pub mod report;
pub mod scene;
pub mod state;
pub mod ui;
