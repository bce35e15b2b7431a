pub mod chunks;
pub mod logging;

pub use chunks::slice_into_chunks;
pub use logging::truncate_text;
