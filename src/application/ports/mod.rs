//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod novel_api;
mod panel_events;

pub use novel_api::{
    ApiError, ChapterStats, GenerateChapterRequest, GenerateChapterResponse, MemoryStats,
    NewSettingsVersionRequest, NewSettingsVersionResponse, NovelApiPort, NovelInfo,
    ReadOutlineRequest, ReadOutlineResponse, SaveChapterRequest, SaveChapterResponse,
    SaveSettingsRequest, SettingsDocument, SettingsListing, SummaryStats, TemplatesResponse,
    UpdateStateRequest, UpdateStateResponse,
};
pub use panel_events::{Panel, PanelEvent, PanelEventSink};
