// ems-client/src/theme.rs
// 主题偏好 (light / dark / 跟随系统)

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::storage::{Storage, StorageKey};

/// 主题模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("unknown theme mode: {other}")),
        }
    }
}

#[derive(Debug)]
struct ThemeState {
    mode: ThemeMode,
    system_dark: bool,
}

/// 主题上下文
#[derive(Debug)]
pub struct ThemeContext {
    storage: Storage,
    state: Mutex<ThemeState>,
}

impl ThemeContext {
    /// 从存储加载, 默认跟随系统
    pub fn load(storage: Storage, system_prefers_dark: bool) -> Self {
        let mode = storage.get::<ThemeMode>(StorageKey::Theme).unwrap_or_default();
        Self {
            storage,
            state: Mutex::new(ThemeState {
                mode,
                system_dark: system_prefers_dark,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ThemeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> ThemeMode {
        self.lock().mode
    }

    /// 实际是否为暗色
    pub fn is_dark(&self) -> bool {
        let state = self.lock();
        match state.mode {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => state.system_dark,
        }
    }

    /// 设置并持久化
    pub fn set_mode(&self, mode: ThemeMode) {
        self.lock().mode = mode;
        self.storage.set(StorageKey::Theme, &mode);
        tracing::debug!(mode = mode.as_str(), "Theme changed");
    }

    /// 系统偏好变化 (只在 System 模式下影响结果)
    pub fn set_system_preference(&self, dark: bool) {
        self.lock().system_dark = dark;
    }

    /// 在亮 / 暗之间切换 (登录页的切换按钮)
    pub fn toggle(&self) -> ThemeMode {
        let next = if self.is_dark() {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        };
        self.set_mode(next);
        next
    }
}
