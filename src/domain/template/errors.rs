//! Template Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("请填写模版ID和名称")]
    MissingIdOrName,
}
