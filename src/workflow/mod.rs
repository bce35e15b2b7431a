pub mod badge_flow;

pub use badge_flow::{BadgeFlow, ResolveOutcome};
