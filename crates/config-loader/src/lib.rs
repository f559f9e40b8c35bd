//! Layered settings loading (§11): a required `base` file, a required
//! `APP_ENV`-specific file, then `RECON_`-prefixed environment variables as
//! the highest-priority layer, deserialized once into [`Settings`] and
//! cached behind a [`once_cell::sync::OnceCell`]. Grounded on the teacher's
//! `control::config` module; the version of the `config` crate pulled by the
//! workspace (0.14) uses the builder API rather than the teacher's
//! `Config::default()`/`.merge()` calls, so the builder chain below is the
//! idiomatic equivalent of the same three-layer precedence.

mod app_env;
mod settings;

pub use app_env::{app_env, AppEnv};
pub use settings::{
    ApiSettings, BusSettings, DatabaseSettings, HistorySettings, IndexSettings,
    ListenerDistributorSettings, ListenerErrorSettings, ListenerInputSettings, ListenerOutputSettings,
    ListenerSettings, SchemaSettings, Settings,
};

use once_cell::sync::OnceCell;

pub fn settings() -> &'static Settings {
    static SETTINGS: OnceCell<Settings> = OnceCell::new();

    SETTINGS.get_or_init(|| load_settings().expect("failed to load settings"))
}

fn load_settings() -> Result<Settings, config::ConfigError> {
    let current_dir = std::env::current_dir().expect("current directory to be available");
    let config_dir = current_dir.join("config");

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base")).required(true))
        .add_source(config::File::from(config_dir.join(app_env().as_str())).required(true))
        .add_source(
            config::Environment::with_prefix("RECON")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
