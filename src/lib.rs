//! # cmbuild - an easy to use wrapper around cmake and make
//!
//! `build` reads a small JSON manifest (`build.info`), keeps a generated
//! `CMakeLists.txt` in sync with it, and drives `cmake`, `make` and `ctest`
//! inside the project's build directory.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scaffold a project from a template and build it
//! build --init hello
//!
//! # Rebuild, run the tests
//! build
//! build ctest --output-on-failure
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - On-disk manifest shape (`build.info`)
//! - [`manifest`] - Resolved targets with merged flags and libraries
//! - [`cmake`] / [`gitignore`] - Generated files
//! - [`build`] - Regeneration decisions and tool invocation
//! - [`commands`] - CLI command handlers

/// Build pipeline: regeneration, cmake, make, ctest.
pub mod build;

/// `CMakeLists.txt` generation.
pub mod cmake;

/// CLI command handlers extracted from main.
pub mod commands;

/// Manifest file parsing (`build.info`).
pub mod config;

/// Generated `.gitignore` block.
pub mod gitignore;

/// Library definitions (`libs/*.json`).
pub mod library;

/// Resolved project model.
pub mod manifest;

/// User settings and data directory.
pub mod settings;

/// Source globbing and snapshots.
pub mod sources;

/// Project templates.
pub mod templates;

/// Terminal UI utilities (tables, status lines).
pub mod ui;
