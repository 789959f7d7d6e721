//! Batch Context - 章节细纲

/// 占位细纲的目标字数
pub const PLACEHOLDER_TARGET_WORDS: u32 = 2800;

/// 细纲接口不可用时使用的占位细纲
pub fn placeholder_outline(chapter_index: u32) -> String {
    format!(
        "【第{}章】\n\n开场：\n- 继续上一章的剧情发展\n\n发展：\n- 推进主线剧情\n\n高潮：\n- 制造冲突和转折\n\n结尾：\n- 为下一章留下悬念\n\n目标字数：{}字",
        chapter_index, PLACEHOLDER_TARGET_WORDS
    )
}
