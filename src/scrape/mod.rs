mod classifier;
mod extractor;
mod fetcher;

pub use classifier::classify;
pub use extractor::extract;
pub use fetcher::{DocumentSource, PageFetcher};
