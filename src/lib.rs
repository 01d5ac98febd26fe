//! FrogTools - champion skin extraction and repath toolkit
//!
//! Browses the public champion/skin catalogs, drives an external WAD
//! backend through extraction and repath batches, and manages the
//! application preferences, fonts and themes.

pub mod activity;
pub mod app;
pub mod backend;
pub mod cancel;
pub mod catalog;
pub mod fonts;
pub mod github;
pub mod prefs;
pub mod settings;
pub mod style;
pub mod theme;
pub mod wizard;
