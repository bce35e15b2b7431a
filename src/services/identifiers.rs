//! 标识符格式化 - 业务能力层
//!
//! 批量接口要求每个 id 带来源前缀（DOI / ARXIV / CorpusId）。
//! 裸 DOI 补 `DOI:` 前缀，已带可识别前缀的原样透传。

use regex::Regex;
use std::sync::OnceLock;

/// 可识别的非 DOI 前缀（大小写不敏感）
pub const S2_ID_PREFIXES: [&str; 2] = ["arxiv", "corpusid"];

/// 是否已带可识别前缀
pub fn has_s2_prefix(id: &str) -> bool {
    let lower = id.to_lowercase();
    S2_ID_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(&format!("{}:", prefix)))
}

/// 格式化为批量接口接受的带前缀 id
pub fn format_paper_id(raw: &str) -> String {
    if has_s2_prefix(raw) {
        raw.to_string()
    } else {
        format!("DOI:{}", raw)
    }
}

/// 从 citation_arxiv_id meta 标签内容解析 ArXiv 标识
///
/// 返回 `ARXIV:2103.12345` 形式
pub fn parse_arxiv_id(meta_content: &str) -> Option<String> {
    let candidate = meta_content
        .to_lowercase()
        .replace("arxiv:", "")
        .trim()
        .to_string();
    if candidate.is_empty() {
        return None;
    }
    Some(format!("ARXIV:{}", candidate))
}

/// 从页面文本解析 Corpus ID
///
/// 剥掉所有非数字字符，返回 `CorpusId:123456` 形式
pub fn parse_corpus_id(text: &str) -> Option<String> {
    static NON_DIGIT: OnceLock<Regex> = OnceLock::new();
    let non_digit = NON_DIGIT.get_or_init(|| Regex::new(r"\D").unwrap());
    let digits_only = non_digit.replace_all(text, "").to_string();
    if digits_only.is_empty() {
        return None;
    }
    Some(format!("CorpusId:{}", digits_only))
}
