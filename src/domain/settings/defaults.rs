use serde_json::{json, Value};

/// Bumped when the document shape changes incompatibly.
pub const SETTINGS_VERSION: u64 = 1;

pub const DEFAULT_API_PORT: u16 = 13091;

/// Hard-coded defaults every loaded document is merged over.
pub fn default_settings(is_development: bool) -> Value {
    json!({
        "version": SETTINGS_VERSION,
        "api": {
            "enabled": is_development,
            "port": DEFAULT_API_PORT,
        },
        "app": {
            "beta": false,
            "autoupdate": true,
            "autostart": true,
            "getstarted": true,
            "enableDev": false,
            "minimizeTrayOverride": false,
            "enableStatisticsAndErrorTracing": true,
        },
        "player": {
            "skipDisliked": false,
        },
        "discord": {
            "enabled": true,
            "buttons": false,
        },
        "customcss": {
            "enabled": true,
            "scssFile": null,
        },
        "state": {
            "currentUrl": null,
        },
    })
}
