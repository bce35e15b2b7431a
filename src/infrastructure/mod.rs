pub mod http_transport;
pub mod js_executor;
pub mod page_transport;
pub mod retry;
pub mod transport;

pub use http_transport::HttpTransport;
pub use js_executor::JsExecutor;
pub use page_transport::PageTransport;
pub use retry::{fetch_with_retry, RetryPolicy};
pub use transport::{FetchReply, FetchRequest, Method, Transport};
