pub mod identifiers;
pub mod paper_match;
pub mod showable;

pub use identifiers::{format_paper_id, has_s2_prefix, parse_arxiv_id, parse_corpus_id};
pub use paper_match::PaperMatchService;
pub use showable::ShowableService;
