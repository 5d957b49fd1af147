pub mod feed_service;
pub mod thread_service;

pub use feed_service::FeedService;
pub use thread_service::{assemble_forest, ThreadService};
