//! Template Context - 模版缓存

use std::collections::BTreeMap;

use super::{Template, TemplateOption};
use crate::domain::form_values::parse_leading_int;

/// 新模版 ID 的补零宽度
pub const TEMPLATE_ID_WIDTH: usize = 3;

/// 模版缓存（id -> Template）
///
/// 每次加载整体替换，不做增量合并。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateStore {
    templates: BTreeMap<String, Template>,
}

impl TemplateStore {
    pub fn new(templates: BTreeMap<String, Template>) -> Self {
        Self { templates }
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    /// 下拉选项，ID 取缓存的键
    pub fn options(&self) -> Vec<TemplateOption> {
        self.templates
            .iter()
            .map(|(id, template)| TemplateOption::new(id.clone(), template))
            .collect()
    }

    /// 计算下一个模版 ID
    pub fn next_id(&self) -> String {
        next_template_id(self.ids())
    }
}

/// `max(数字 ID) + 1`，补零到三位；没有数字 ID 时为 `001`
///
/// 加一会溢出的 ID 不参与计算。
pub fn next_template_id<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let next = existing
        .into_iter()
        .filter_map(parse_leading_int)
        .filter_map(|id| id.checked_add(1))
        .max()
        .unwrap_or(1);

    format!("{:0width$}", next, width = TEMPLATE_ID_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_empty() {
        assert_eq!(next_template_id(Vec::<&str>::new()), "001");
    }

    #[test]
    fn test_next_id_ignores_non_numeric() {
        assert_eq!(next_template_id(["draft", "custom"]), "001");
        assert_eq!(next_template_id(["001", "draft", "009"]), "010");
    }

    #[test]
    fn test_next_id_beyond_padding() {
        assert_eq!(next_template_id(["999"]), "1000");
    }

    #[test]
    fn test_next_id_skips_overflowing_id() {
        let max = i64::MAX.to_string();
        assert_eq!(next_template_id([max.as_str()]), "001");
        assert_eq!(next_template_id(["004", max.as_str()]), "005");
    }

    #[test]
    fn test_store_next_id() {
        let mut map = BTreeMap::new();
        for id in ["002", "005", "003"] {
            map.insert(
                id.to_string(),
                Template {
                    id: id.to_string(),
                    ..Default::default()
                },
            );
        }
        let store = TemplateStore::new(map);
        assert_eq!(store.len(), 3);
        assert_eq!(store.next_id(), "006");
    }
}
