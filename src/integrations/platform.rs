// src/integrations/platform.rs
//
// Login items and the tray. Plain data in, side effects in the shell.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginItemSettings {
    pub open_at_login: bool,
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrayAction {
    ShowWindow,
    TogglePlayback,
    Next,
    Previous,
    /// Flip a boolean setting by key path.
    ToggleSetting(String),
    CheckForUpdates,
    Quit,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrayItem {
    pub label: String,
    pub action: TrayAction,
    pub checked: Option<bool>,
    pub enabled: bool,
}

impl TrayItem {
    pub fn action(label: &str, action: TrayAction) -> Self {
        Self {
            label: label.to_string(),
            action,
            checked: None,
            enabled: true,
        }
    }

    pub fn toggle(label: &str, key: &str, checked: bool) -> Self {
        Self {
            label: label.to_string(),
            action: TrayAction::ToggleSetting(key.to_string()),
            checked: Some(checked),
            enabled: true,
        }
    }

    pub fn separator() -> Self {
        Self {
            label: String::new(),
            action: TrayAction::Separator,
            checked: None,
            enabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrayMenu {
    pub tooltip: String,
    pub items: Vec<TrayItem>,
}

#[cfg_attr(test, mockall::automock)]
pub trait PlatformShell: Send + Sync {
    fn set_login_item(&self, settings: &LoginItemSettings) -> AppResult<()>;
    fn set_tray_menu(&self, menu: &TrayMenu) -> AppResult<()>;
}
