mod settings;

pub use settings::{
    default_settings_path, load_settings, save_settings, PlatformConfig, UniverseSettings,
    DEFAULT_LOG_FILTER,
};
