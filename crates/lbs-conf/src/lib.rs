mod settings;
mod trees;

pub use settings::ConfigError;
pub use settings::Settings;
pub use trees::TreesConfig;
