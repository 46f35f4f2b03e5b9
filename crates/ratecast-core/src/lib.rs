//! Core contracts for ratecast.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Feed identifiers, the upstream feed contract, and adapters
//! - Response envelope and structured errors
//! - The series store that normalizes feed history into validated series

pub mod adapters;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod feed;
pub mod store;
pub mod throttling;

pub use adapters::{FixtureFeed, NbpFeed};
pub use domain::{CurrencyCode, RatePoint, RateSeries, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{CoreError, ValidationError};
pub use feed::{
    FeedError, FeedErrorKind, FeedFuture, FeedHealth, FeedId, HistoryRequest, LatestRequest,
    RateFeed, RateRecord,
};
pub use store::{build_series, StoreConfig, StoreError};
pub use throttling::{BackoffPolicy, FeedThrottle};
