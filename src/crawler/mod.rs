pub mod controller;
pub mod links;

// Re-export common types
pub use controller::{
    CancellationToken, CrawlEvent, CrawlFailure, CrawlHandle, CrawlOrchestrator, CrawlState, Progress,
};
pub use links::LinkCollector;
