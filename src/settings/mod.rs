// Settings module
// Handles persisted application preferences

pub mod settings;

pub use settings::AppSettings;
