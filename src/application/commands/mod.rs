//! 应用层 - 命令
//!
//! 控制器的输入值，替代从页面控件读取

mod batch_commands;
mod settings_commands;

pub use batch_commands::*;
pub use settings_commands::*;
