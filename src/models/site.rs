//! 站点配置
//!
//! 每个支持的站点定义引用元素的选择器、徽章插入位置，
//! 以及是否需要拦截点击（个别站点的祖先元素会吞掉点击事件）。

use serde::{Deserialize, Serialize};

/// 徽章插入位置（insertAdjacentHTML 的 position 参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl InsertPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::BeforeBegin => "beforebegin",
            InsertPosition::AfterBegin => "afterbegin",
            InsertPosition::BeforeEnd => "beforeend",
            InsertPosition::AfterEnd => "afterend",
        }
    }
}

/// 单个站点的徽章配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeSite {
    /// 站点名（按主机名匹配）
    pub name: String,
    /// 引用元素的 CSS 选择器（扫描用）
    pub cite_selector: String,
    /// 徽章相对引用元素的插入位置
    pub position: InsertPosition,
    /// 是否需要拦截徽章点击（祖先元素会拦截导航）
    #[serde(default)]
    pub intercept_clicks: bool,
}

impl BadgeSite {
    /// 当前路径下是否需要点击拦截
    ///
    /// Google Scholar 只有作者页（/citations）会拦截引用元素上的点击。
    pub fn requires_click_interception(&self, path: &str) -> bool {
        self.intercept_clicks && path.contains("/citations")
    }
}

/// 内置站点表
pub fn builtin_sites() -> Vec<BadgeSite> {
    vec![
        BadgeSite {
            name: "scholar.google".to_string(),
            cite_selector: ".gs_r.gs_or.gs_scl, .gsc_a_tr".to_string(),
            position: InsertPosition::BeforeEnd,
            intercept_clicks: true,
        },
        BadgeSite {
            name: "pubmed.ncbi.nlm.nih.gov".to_string(),
            cite_selector: ".docsum-content".to_string(),
            position: InsertPosition::BeforeEnd,
            intercept_clicks: false,
        },
        BadgeSite {
            name: "arxiv.org".to_string(),
            cite_selector: ".arxiv-result, dl > dd".to_string(),
            position: InsertPosition::BeforeEnd,
            intercept_clicks: false,
        },
        BadgeSite {
            name: "semanticscholar.org".to_string(),
            cite_selector: ".cl-paper-row".to_string(),
            position: InsertPosition::BeforeEnd,
            intercept_clicks: false,
        },
    ]
}

/// 按主机名查找站点配置
pub fn site_for_host(host: &str) -> Option<BadgeSite> {
    builtin_sites()
        .into_iter()
        .find(|site| host.contains(&site.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_lookup_by_host() {
        let site = site_for_host("scholar.google.com").unwrap();
        assert_eq!(site.name, "scholar.google");
        assert!(site_for_host("example.com").is_none());
    }

    #[test]
    fn test_click_interception_only_on_citations_path() {
        let site = site_for_host("scholar.google.com").unwrap();
        assert!(site.requires_click_interception("/citations?user=abc"));
        assert!(!site.requires_click_interception("/scholar?q=attention"));

        // 其他站点任何路径都不拦截
        let pubmed = site_for_host("pubmed.ncbi.nlm.nih.gov").unwrap();
        assert!(!pubmed.requires_click_interception("/citations"));
    }

    #[test]
    fn test_insert_position_str() {
        assert_eq!(InsertPosition::BeforeEnd.as_str(), "beforeend");
        assert_eq!(InsertPosition::AfterEnd.as_str(), "afterend");
    }
}
