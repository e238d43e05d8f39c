//! Configuration module for the text-to-podcast pipeline.
//!
//! Provides `Settings` (top-level configuration), sub-configs for the
//! synthesis backend, the object store and the workspace, and TOML
//! persistence via `Settings::load_from` / `Settings::save_to`.

pub mod settings;

pub use settings::{Settings, StorageConfig, SynthesisConfig, WorkspaceConfig};
