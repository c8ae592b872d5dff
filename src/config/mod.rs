pub mod adapters;
pub mod settings;

pub use adapters::{FileSettingsSource, InlineSettingsSource, SettingsSource};
pub use settings::{Settings, SettingsOverlay, SinkSettings};
