//! Settings Context - 当前小说上下文

use super::{SettingsKind, SettingsVersion};

/// 当前加载的小说与版本
///
/// 单槽位，加载其他小说或版本时直接覆盖。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsContext {
    novel_id: String,
    character_versions: Vec<SettingsVersion>,
    world_versions: Vec<SettingsVersion>,
    current_character_version: String,
    current_world_version: String,
}

impl SettingsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn novel_id(&self) -> &str {
        &self.novel_id
    }

    pub fn has_novel(&self) -> bool {
        !self.novel_id.is_empty()
    }

    pub fn set_novel(&mut self, novel_id: impl Into<String>) {
        self.novel_id = novel_id.into();
    }

    pub fn versions(&self, kind: SettingsKind) -> &[SettingsVersion] {
        match kind {
            SettingsKind::Character => &self.character_versions,
            SettingsKind::World => &self.world_versions,
        }
    }

    pub fn set_versions(&mut self, kind: SettingsKind, versions: Vec<SettingsVersion>) {
        match kind {
            SettingsKind::Character => self.character_versions = versions,
            SettingsKind::World => self.world_versions = versions,
        }
    }

    /// 当前版本 ID，空串表示未选择
    pub fn current_version(&self, kind: SettingsKind) -> &str {
        match kind {
            SettingsKind::Character => &self.current_character_version,
            SettingsKind::World => &self.current_world_version,
        }
    }

    pub fn set_current_version(&mut self, kind: SettingsKind, version: impl Into<String>) {
        let version = version.into();
        match kind {
            SettingsKind::Character => self.current_character_version = version,
            SettingsKind::World => self.current_world_version = version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_independent() {
        let mut ctx = SettingsContext::new();
        assert!(!ctx.has_novel());

        ctx.set_novel("n1");
        ctx.set_current_version(SettingsKind::Character, "003");
        ctx.set_current_version(SettingsKind::World, "01");

        assert_eq!(ctx.current_version(SettingsKind::Character), "003");
        assert_eq!(ctx.current_version(SettingsKind::World), "01");

        ctx.set_novel("n2");
        assert_eq!(ctx.novel_id(), "n2");
    }
}
