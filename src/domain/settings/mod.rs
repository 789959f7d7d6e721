//! Settings Context - 人物/世界设定版本

mod context;
mod value_objects;

pub use context::SettingsContext;
pub use value_objects::{latest_version, SettingsKind, SettingsVersion};
