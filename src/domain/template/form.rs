//! Template Context - 编辑表单

use super::{Template, TemplateContents, TemplateError, TemplateFiles, WordCountRange};
use crate::domain::form_values::parse_or_default;

/// 未填写时的默认最小字数
pub const DEFAULT_MIN_WORDS: u32 = 2000;
/// 未填写时的默认最大字数
pub const DEFAULT_MAX_WORDS: u32 = 3000;

/// 模版编辑表单
///
/// 所有字段保持输入框的原始文本，`collect` 时才做裁剪与校验。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateForm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub min_words: String,
    pub max_words: String,
    pub writer_role: String,
    pub writing_rules: String,
    pub update_state_rules: String,
}

impl TemplateForm {
    /// 只带 ID 的空白表单
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 由缓存模版和加载到的三个文件内容填充表单
    pub fn from_template(template: &Template, contents: TemplateContents) -> Self {
        let range = template.word_count_range;
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            category: template.category.clone(),
            min_words: blank_if_zero(range.min),
            max_words: blank_if_zero(range.max),
            writer_role: contents.writer_role,
            writing_rules: contents.writing_rules,
            update_state_rules: contents.update_state_rules,
        }
    }

    /// 校验并序列化为待保存的模版
    pub fn collect(&self) -> Result<Template, TemplateError> {
        let id = self.id.trim();
        let name = self.name.trim();

        if id.is_empty() || name.is_empty() {
            return Err(TemplateError::MissingIdOrName);
        }

        Ok(Template {
            id: id.to_string(),
            name: name.to_string(),
            category: self.category.trim().to_string(),
            word_count_range: WordCountRange {
                min: parse_or_default(&self.min_words, DEFAULT_MIN_WORDS),
                max: parse_or_default(&self.max_words, DEFAULT_MAX_WORDS),
            },
            files: TemplateFiles::for_id(id),
            contents: TemplateContents {
                writer_role: self.writer_role.trim().to_string(),
                writing_rules: self.writing_rules.trim().to_string(),
                update_state_rules: self.update_state_rules.trim().to_string(),
            },
            created_date: None,
        })
    }
}

fn blank_if_zero(value: u32) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

/// 渲染只读预览文本
pub fn render_preview(template: &Template) -> String {
    format!(
        "=== 模版预览 ===\n\
         ID: {}\n\
         名称: {}\n\
         分类: {}\n\
         字数范围: {} - {}\n\
         \n\
         === 角色定义 ===\n\
         {}\n\
         \n\
         === 写作规则 ===\n\
         {}\n\
         \n\
         === 状态更新规则 ===\n\
         {}\n",
        template.id,
        template.name,
        template.category,
        template.word_count_range.min,
        template.word_count_range.max,
        template.contents.writer_role,
        template.contents.writing_rules,
        template.contents.update_state_rules,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> TemplateForm {
        TemplateForm {
            id: " 004 ".to_string(),
            name: "仙侠".to_string(),
            category: "  修真 ".to_string(),
            min_words: "2500".to_string(),
            max_words: String::new(),
            writer_role: "你是一名网文作者\n".to_string(),
            writing_rules: "节奏紧凑".to_string(),
            update_state_rules: "记录境界变化".to_string(),
        }
    }

    #[test]
    fn test_collect_trims_and_defaults() {
        let template = filled_form().collect().unwrap();
        assert_eq!(template.id, "004");
        assert_eq!(template.category, "修真");
        assert_eq!(template.word_count_range.min, 2500);
        assert_eq!(template.word_count_range.max, DEFAULT_MAX_WORDS);
        assert_eq!(template.files.writing_rules, "004_writing_rules.txt");
        assert_eq!(template.contents.writer_role, "你是一名网文作者");
    }

    #[test]
    fn test_collect_requires_id_and_name() {
        let mut form = filled_form();
        form.name = "   ".to_string();
        assert_eq!(form.collect(), Err(TemplateError::MissingIdOrName));

        let mut form = filled_form();
        form.id = String::new();
        assert_eq!(form.collect(), Err(TemplateError::MissingIdOrName));
    }

    #[test]
    fn test_preview_sections() {
        let template = filled_form().collect().unwrap();
        let preview = render_preview(&template);
        assert!(preview.starts_with("=== 模版预览 ===\nID: 004\n名称: 仙侠\n"));
        assert!(preview.contains("字数范围: 2500 - 3000"));
        assert!(preview.contains("=== 状态更新规则 ===\n记录境界变化"));
    }

    #[test]
    fn test_from_template_blanks_zero_range() {
        let template = Template {
            id: "001".to_string(),
            name: "测试".to_string(),
            ..Default::default()
        };
        let form = TemplateForm::from_template(&template, TemplateContents::default());
        assert!(form.min_words.is_empty());
        assert!(form.max_words.is_empty());
    }
}
