mod post;

pub use post::{now, Metrics, Platform, TrackedPost, TIMESTAMP_FORMAT};
