//! 徽章插入 - DOM 边界层
//!
//! 负责徽章 HTML 片段的生成、旧徽章的清除和新徽章的插入。
//! 管线只面向 `Annotator` 接口；页面实现经 JsExecutor 操作 DOM。

use crate::error::AppResult;
use crate::infrastructure::JsExecutor;
use crate::models::{BadgeSite, ElementHandle};
use async_trait::async_trait;
use tracing::debug;

/// 徽章标记类，清除旧徽章时按它匹配
pub const BADGE_MARKER_CLASS: &str = "asta-extension-badge";

/// 徽章点击后的目标链接
pub fn build_chat_url(ui_base_url: &str, corpus_id: u64) -> String {
    format!(
        "{}/?corpus_id={}&utm_source=extension&utm_medium=badge",
        ui_base_url, corpus_id
    )
}

/// 生成自包含的徽章 HTML 片段（链接包裹的按钮）
pub fn create_badge_html(ui_base_url: &str, corpus_id: u64) -> String {
    format!(
        r#"
    <div class="{marker}">
      <a href="{url}" target="_blank" style="text-decoration: none; display:block; padding-top:8px;">
        <button style="padding: 4px 8px; color: #3ABA87; border: 1px solid #3ABA87; background-color: #ffffff; border-radius: 4px; cursor: pointer; font-family:manrope, arial, sans-serif;">
          Ask AI about this paper
        </button>
      </a>
    </div>
  "#,
        marker = BADGE_MARKER_CLASS,
        url = build_chat_url(ui_base_url, corpus_id),
    )
}

/// 徽章插入能力
///
/// DOM 层实现；测试里用记录型桩替代。
#[async_trait]
pub trait Annotator: Send + Sync {
    /// 清除所有旧徽章（按标记类匹配），返回清除数量
    async fn remove_all(&self) -> AppResult<usize>;

    /// 在引用元素的指定位置插入徽章
    ///
    /// 元素已不在页面上时返回 false。
    async fn insert_badge(
        &self,
        cite_el: &ElementHandle,
        corpus_id: u64,
        site: &BadgeSite,
    ) -> AppResult<bool>;
}

/// 经浏览器页面操作 DOM 的插入实现
pub struct PageAnnotator {
    executor: JsExecutor,
    ui_base_url: String,
}

impl PageAnnotator {
    pub fn new(executor: JsExecutor, ui_base_url: impl Into<String>) -> Self {
        Self {
            executor,
            ui_base_url: ui_base_url.into(),
        }
    }
}

#[async_trait]
impl Annotator for PageAnnotator {
    async fn remove_all(&self) -> AppResult<usize> {
        let script = format!(
            r#"
            (() => {{
                const elements = document.querySelectorAll(".{marker}");
                for (const element of elements) {{
                    element.parentNode?.removeChild(element);
                }}
                return elements.length;
            }})()
            "#,
            marker = BADGE_MARKER_CLASS,
        );

        let removed = self
            .executor
            .eval(script)
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        if removed > 0 {
            debug!("已清除 {} 个旧徽章", removed);
        }
        Ok(removed)
    }

    async fn insert_badge(
        &self,
        cite_el: &ElementHandle,
        corpus_id: u64,
        site: &BadgeSite,
    ) -> AppResult<bool> {
        let badge_html = create_badge_html(&self.ui_base_url, corpus_id);

        // 个别站点的祖先元素会拦截点击并自行导航，
        // 需要在捕获阶段接管点击、自己打开目标链接
        let intercept_snippet = if site.intercept_clicks {
            format!(
                r#"
                if (window.location.pathname.includes("/citations")) {{
                    const badgeLink = el.querySelector(".{marker} a");
                    if (badgeLink) {{
                        badgeLink.addEventListener("click", (event) => {{
                            event.preventDefault();
                            event.stopPropagation();
                            event.stopImmediatePropagation();
                            window.open(badgeLink.href, "_blank");
                        }});
                    }}
                }}
                "#,
                marker = BADGE_MARKER_CLASS,
            )
        } else {
            String::new()
        };

        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) {{
                    return false;
                }}
                el.insertAdjacentHTML("{position}", {html});
                {intercept}
                return true;
            }})()
            "#,
            selector = serde_json::to_string(&cite_el.selector())?,
            position = site.position.as_str(),
            html = serde_json::to_string(&badge_html)?,
            intercept = intercept_snippet,
        );

        let inserted = self
            .executor
            .eval(script)
            .await?
            .as_bool()
            .unwrap_or(false);
        Ok(inserted)
    }
}
