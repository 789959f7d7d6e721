//! Settings Commands - 设定版本相关命令

use crate::domain::settings::SettingsKind;

/// 以编辑器内容为基础创建新版本
#[derive(Debug, Clone)]
pub struct CreateSettingsVersion {
    pub kind: SettingsKind,
    pub editor_content: String,
}

/// 保存编辑器内容到当前版本
#[derive(Debug, Clone)]
pub struct SaveSettingsVersion {
    pub kind: SettingsKind,
    pub editor_content: String,
}
