//! Batch Commands - 批量生成相关命令

use crate::application::error::ApplicationError;

/// 单章生成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub model_name: String,
    /// 状态更新使用的模型，空表示与生成模型相同
    pub update_model_name: Option<String>,
    pub use_state: bool,
    pub use_world_bible: bool,
    pub update_state: bool,
    pub use_previous_chapters: bool,
    /// 参考的前文章节数，缺省或为 0 时按 1 处理
    pub previous_chapters_count: Option<u32>,
}

impl GenerationOptions {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            update_model_name: None,
            use_state: true,
            use_world_bible: true,
            update_state: true,
            use_previous_chapters: true,
            previous_chapters_count: None,
        }
    }

    pub fn previous_chapters_count(&self) -> u32 {
        match self.previous_chapters_count {
            Some(count) if count > 0 => count,
            _ => 1,
        }
    }

    /// 非空的状态更新模型
    pub fn update_model(&self) -> Option<&str> {
        self.update_model_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// 开始批量生成命令
#[derive(Debug, Clone)]
pub struct StartBatchGeneration {
    pub novel_id: String,
    pub template_id: String,
    /// None 表示未填写
    pub chapter_count: Option<u32>,
    pub options: GenerationOptions,
}

/// 校验通过的批量生成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub novel_id: String,
    pub template_id: String,
    pub chapter_count: u32,
}

impl StartBatchGeneration {
    /// 校验必填项，失败时不应发出任何请求
    pub fn validate(&self) -> Result<BatchPlan, ApplicationError> {
        let novel_id = self.novel_id.trim();
        if novel_id.is_empty() {
            return Err(ApplicationError::validation("请输入小说ID"));
        }

        let template_id = self.template_id.trim();
        if template_id.is_empty() {
            return Err(ApplicationError::validation("请选择模版"));
        }

        let chapter_count = match self.chapter_count {
            Some(count) if count >= 1 => count,
            _ => return Err(ApplicationError::validation("请输入有效的章节数量")),
        };

        Ok(BatchPlan {
            novel_id: novel_id.to_string(),
            template_id: template_id.to_string(),
            chapter_count,
        })
    }
}

/// 手动更新状态命令
#[derive(Debug, Clone)]
pub struct ManualUpdateState {
    pub novel_id: String,
    pub model_name: String,
    pub update_model_name: Option<String>,
}

impl ManualUpdateState {
    /// 优先使用状态更新模型，否则回落到生成模型
    pub fn effective_model(&self) -> &str {
        self.update_model_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(novel: &str, template: &str, count: Option<u32>) -> StartBatchGeneration {
        StartBatchGeneration {
            novel_id: novel.to_string(),
            template_id: template.to_string(),
            chapter_count: count,
            options: GenerationOptions::new("deepseek-chat"),
        }
    }

    #[test]
    fn test_validate_ok() {
        let plan = command(" n1 ", "t1", Some(2)).validate().unwrap();
        assert_eq!(plan.novel_id, "n1");
        assert_eq!(plan.chapter_count, 2);
    }

    #[test]
    fn test_validate_messages() {
        let err = command("", "t1", Some(1)).validate().unwrap_err();
        assert_eq!(err.to_string(), "请输入小说ID");

        let err = command("n1", "", Some(1)).validate().unwrap_err();
        assert_eq!(err.to_string(), "请选择模版");

        let err = command("n1", "t1", Some(0)).validate().unwrap_err();
        assert_eq!(err.to_string(), "请输入有效的章节数量");

        let err = command("n1", "t1", None).validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_previous_chapters_default() {
        let mut options = GenerationOptions::new("m");
        assert_eq!(options.previous_chapters_count(), 1);
        options.previous_chapters_count = Some(0);
        assert_eq!(options.previous_chapters_count(), 1);
        options.previous_chapters_count = Some(3);
        assert_eq!(options.previous_chapters_count(), 3);
    }

    #[test]
    fn test_effective_model() {
        let mut command = ManualUpdateState {
            novel_id: "n1".to_string(),
            model_name: "gen-model".to_string(),
            update_model_name: Some("  ".to_string()),
        };
        assert_eq!(command.effective_model(), "gen-model");
        command.update_model_name = Some("state-model".to_string());
        assert_eq!(command.effective_model(), "state-model");
    }
}
