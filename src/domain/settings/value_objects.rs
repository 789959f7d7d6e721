//! Settings Context - Value Objects

use serde::{Deserialize, Serialize};

/// 设定文档族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsKind {
    /// 人物设定，版本号补零到 3 位
    Character,
    /// 世界设定，版本号补零到 2 位
    World,
}

impl SettingsKind {
    pub const ALL: [SettingsKind; 2] = [SettingsKind::Character, SettingsKind::World];

    /// URL 路径段
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsKind::Character => "character",
            SettingsKind::World => "world",
        }
    }

    pub fn pad_width(&self) -> usize {
        match self {
            SettingsKind::Character => 3,
            SettingsKind::World => 2,
        }
    }

    /// 面板显示名
    pub fn label(&self) -> &'static str {
        match self {
            SettingsKind::Character => "人物设定",
            SettingsKind::World => "世界设定",
        }
    }

    /// 按本族宽度补零
    pub fn format_version(&self, version: u32) -> String {
        format!("{:0width$}", version, width = self.pad_width())
    }
}

impl std::fmt::Display for SettingsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SettingsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(SettingsKind::Character),
            "world" => Ok(SettingsKind::World),
            other => Err(format!("unknown settings kind: {}", other)),
        }
    }
}

/// 设定版本（不可变快照）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsVersion {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub filename: String,
}

impl SettingsVersion {
    pub fn padded(&self, kind: SettingsKind) -> String {
        kind.format_version(self.version)
    }

    /// 版本下拉选项文本
    pub fn label(&self, kind: SettingsKind) -> String {
        format!("版本 {} ({})", self.padded(kind), self.filename)
    }
}

/// 取版本号最大的版本
pub fn latest_version(versions: &[SettingsVersion]) -> Option<&SettingsVersion> {
    versions.iter().max_by_key(|v| v.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(n: u32) -> SettingsVersion {
        SettingsVersion {
            version: n,
            filename: format!("v{}.json", n),
        }
    }

    #[test]
    fn test_padding_per_kind() {
        assert_eq!(SettingsKind::Character.format_version(7), "007");
        assert_eq!(SettingsKind::World.format_version(7), "07");
        assert_eq!(SettingsKind::World.format_version(123), "123");
    }

    #[test]
    fn test_latest_version() {
        let versions = vec![version(1), version(3), version(2)];
        assert_eq!(latest_version(&versions).map(|v| v.version), Some(3));
        assert!(latest_version(&[]).is_none());
    }

    #[test]
    fn test_label() {
        assert_eq!(
            version(2).label(SettingsKind::Character),
            "版本 002 (v2.json)"
        );
    }

    #[test]
    fn test_kind_round_trip_str() {
        for kind in SettingsKind::ALL {
            assert_eq!(kind.as_str().parse::<SettingsKind>(), Ok(kind));
        }
        assert_eq!(
            "plot".parse::<SettingsKind>(),
            Err("unknown settings kind: plot".to_string())
        );
    }
}
