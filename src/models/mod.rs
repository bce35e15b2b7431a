pub mod citation;
pub mod site;

pub use citation::{BadgeCandidate, CitationEl, ElementHandle, PaperMatch, Reference};
pub use site::{builtin_sites, site_for_host, BadgeSite, InsertPosition};
