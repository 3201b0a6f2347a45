//! Configuration loaded from `.apivault.toml`.

pub mod settings;

pub use settings::Settings;
