//! Template Context - Entities

use serde::{Deserialize, Serialize};

/// 生成模版
///
/// 三个提示词文本（写手角色、写作规则、状态更新规则）加元数据。
/// 标识为 `id`，由调用方指定，约定为三位补零数字。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub word_count_range: WordCountRange,
    #[serde(default)]
    pub files: TemplateFiles,
    #[serde(default)]
    pub contents: TemplateContents,
    /// 后端创建时间，仅展示用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

/// 模版下拉选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOption {
    pub id: String,
    pub label: String,
}

impl TemplateOption {
    pub fn new(id: impl Into<String>, template: &Template) -> Self {
        let id = id.into();
        let label = format!("{} ({})", template.name, id);
        Self { id, label }
    }
}

/// 字数范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCountRange {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
}

/// 三个提示词文件名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFiles {
    #[serde(default)]
    pub writer_role: String,
    #[serde(default)]
    pub writing_rules: String,
    #[serde(default)]
    pub update_state_rules: String,
}

impl TemplateFiles {
    /// 按模版 ID 生成文件名
    pub fn for_id(id: &str) -> Self {
        Self {
            writer_role: format!("{}_writer_role.txt", id),
            writing_rules: format!("{}_writing_rules.txt", id),
            update_state_rules: format!("{}_update_state_rules.txt", id),
        }
    }
}

/// 三个提示词文本内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContents {
    #[serde(default)]
    pub writer_role: String,
    #[serde(default)]
    pub writing_rules: String,
    #[serde(default)]
    pub update_state_rules: String,
}

/// 模版信息面板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: String,
    pub id: String,
    pub category: String,
    pub min_words: u32,
    pub max_words: u32,
    pub created_date: String,
}

impl From<&Template> for TemplateInfo {
    fn from(template: &Template) -> Self {
        let category = if template.category.is_empty() {
            "未分类".to_string()
        } else {
            template.category.clone()
        };

        Self {
            name: template.name.clone(),
            id: template.id.clone(),
            category,
            min_words: template.word_count_range.min,
            max_words: template.word_count_range.max,
            created_date: template
                .created_date
                .clone()
                .unwrap_or_else(|| "未知".to_string()),
        }
    }
}

impl std::fmt::Display for TemplateInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "分类: {}", self.category)?;
        writeln!(f, "字数范围: {} - {}", self.min_words, self.max_words)?;
        write!(f, "创建时间: {}", self.created_date)
    }
}
