//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Template Context: 生成模版
//! - Batch Context: 批量章节生成
//! - Settings Context: 人物/世界设定版本

pub mod batch;
pub mod settings;
pub mod template;

// 共享的表单数值解析
mod form_values;

pub use form_values::{parse_leading_int, parse_or_default};
