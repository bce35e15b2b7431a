//! 引用元素数据模型
//!
//! 管线处理的最小单位是页面上的一个引用元素：
//! 要么带 DOI，要么带书目描述（标题），两者都没有的元素视为无效。

use serde::{Deserialize, Serialize};

/// 不透明的页面元素句柄
///
/// 由 DOM 层（扫描 / 插入）负责解释，管线只原样传递。
/// 当前实现里是扫描时打在元素上的 `data-asta-ref` 属性值。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    /// 对应元素的 CSS 选择器
    pub fn selector(&self) -> String {
        format!("[data-asta-ref=\"{}\"]", self.0)
    }
}

/// 书目引用描述
///
/// `first_author` 保留 `/search/match_reference` 的接口形状，
/// S2 的标题匹配并不使用它。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_author: Option<String>,
}

impl Reference {
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            first_author: None,
        }
    }
}

/// 页面上一个待解析的引用元素
///
/// 每次管线执行时重新构造，不跨次保留。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationEl {
    /// 元素句柄（插入徽章时使用）
    pub cite_el: ElementHandle,
    /// 书目描述（无 DOI 时走标题匹配）
    #[serde(default)]
    pub reference: Option<Reference>,
    /// 外部标识符（DOI / arxiv / corpusid 前缀格式）
    #[serde(default)]
    pub doi: Option<String>,
}

impl CitationEl {
    /// 去重键：优先 DOI，其次引用标题；两者皆空时为 None
    ///
    /// 同一次执行内，每个非空键至多发起一次解析。
    pub fn dedup_key(&self) -> Option<String> {
        if let Some(doi) = self.doi.as_deref() {
            if !doi.trim().is_empty() {
                return Some(doi.trim().to_string());
            }
        }
        if let Some(reference) = &self.reference {
            if !reference.title.trim().is_empty() {
                return Some(reference.title.trim().to_string());
            }
        }
        None
    }
}

/// 远端检索返回的论文匹配结果
///
/// `text_availability` 仅作诊断信息记录；资格判定以
/// `/isShowable` 接口为唯一事实来源（见 ShowableService）。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperMatch {
    #[serde(default)]
    pub corpus_id: Option<u64>,
    #[serde(default)]
    pub text_availability: Option<String>,
}

/// 解析出 corpusId、尚未做资格检查的候选
#[derive(Debug, Clone)]
pub struct BadgeCandidate {
    pub cite_el: ElementHandle,
    pub corpus_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(doi: Option<&str>, title: Option<&str>) -> CitationEl {
        CitationEl {
            cite_el: ElementHandle("0".to_string()),
            reference: title.map(Reference::from_title),
            doi: doi.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_dedup_key_prefers_doi() {
        let item = el(Some("10.1234/abc"), Some("Some Title"));
        assert_eq!(item.dedup_key().unwrap(), "10.1234/abc");
    }

    #[test]
    fn test_dedup_key_falls_back_to_title() {
        let item = el(None, Some("Attention Is All You Need"));
        assert_eq!(item.dedup_key().unwrap(), "Attention Is All You Need");
    }

    #[test]
    fn test_dedup_key_empty_strings_are_none() {
        assert!(el(Some("  "), Some("")).dedup_key().is_none());
        assert!(el(None, None).dedup_key().is_none());
    }

    #[test]
    fn test_paper_match_deserialization() {
        let row: PaperMatch = serde_json::from_value(serde_json::json!({
            "corpusId": 215416146,
            "textAvailability": "fulltext"
        }))
        .unwrap();
        assert_eq!(row.corpus_id, Some(215416146));
        assert_eq!(row.text_availability.as_deref(), Some("fulltext"));
    }

    #[test]
    fn test_paper_match_missing_fields() {
        let row: PaperMatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(row.corpus_id.is_none());
        assert!(row.text_availability.is_none());
    }
}
