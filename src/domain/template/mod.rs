//! Template Context - 模版限界上下文
//!
//! 职责:
//! - 模版实体与三个提示词文件
//! - 编辑表单校验与预览
//! - 模版缓存与新 ID 计算

mod entities;
mod errors;
mod form;
mod store;

pub use entities::{
    Template, TemplateContents, TemplateFiles, TemplateInfo, TemplateOption, WordCountRange,
};
pub use errors::TemplateError;
pub use form::{render_preview, TemplateForm, DEFAULT_MAX_WORDS, DEFAULT_MIN_WORDS};
pub use store::{next_template_id, TemplateStore, TEMPLATE_ID_WIDTH};
