pub mod defaults;
pub mod key_path;

pub use defaults::{default_settings, DEFAULT_API_PORT, SETTINGS_VERSION};
pub use key_path::{get_path, merge_over_defaults, set_path};
