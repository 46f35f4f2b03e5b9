use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, UtcDateTime, ValidationError};

/// Canonical upstream feed identifiers used in metadata and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedId {
    Nbp,
    Fixture,
}

impl FeedId {
    pub const ALL: [Self; 2] = [Self::Nbp, Self::Fixture];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nbp => "nbp",
            Self::Fixture => "fixture",
        }
    }
}

impl Display for FeedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nbp" => Ok(Self::Nbp),
            "fixture" => Ok(Self::Fixture),
            other => Err(ValidationError::InvalidFeed {
                value: other.to_owned(),
            }),
        }
    }
}

/// Feed-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Decode,
    Internal,
}

/// Structured feed error surfaced through envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedError {
    kind: FeedErrorKind,
    message: String,
    retryable: bool,
}

impl FeedError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::Decode,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FeedErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FeedErrorKind::Unavailable => "feed.unavailable",
            FeedErrorKind::RateLimited => "feed.rate_limited",
            FeedErrorKind::InvalidRequest => "feed.invalid_request",
            FeedErrorKind::Decode => "feed.decode",
            FeedErrorKind::Internal => "feed.internal",
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FeedError {}

/// Raw feed observation before series validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub currency: CurrencyCode,
    pub ts: UtcDateTime,
    pub rate: f64,
}

/// Request payload for historical rate fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub currencies: Vec<CurrencyCode>,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl HistoryRequest {
    pub fn new(
        currencies: Vec<CurrencyCode>,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<Self, FeedError> {
        if currencies.is_empty() {
            return Err(FeedError::invalid_request(
                "history request must include at least one currency",
            ));
        }
        if start > end {
            return Err(FeedError::invalid_request(
                "history request start must not be after end",
            ));
        }
        Ok(Self {
            currencies,
            start,
            end,
        })
    }
}

/// Request payload for latest-rate fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRequest {
    pub currencies: Vec<CurrencyCode>,
}

impl LatestRequest {
    pub fn new(currencies: Vec<CurrencyCode>) -> Result<Self, FeedError> {
        if currencies.is_empty() {
            return Err(FeedError::invalid_request(
                "latest request must include at least one currency",
            ));
        }
        Ok(Self { currencies })
    }
}

/// Feed health used by the `feeds` command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Boxed future returned by [`RateFeed`] methods.
pub type FeedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FeedError>> + Send + 'a>>;

/// Upstream rate feed contract.
///
/// Methods return boxed futures so adapters stay object-safe behind
/// `Arc<dyn RateFeed>`.
pub trait RateFeed: Send + Sync {
    fn id(&self) -> FeedId;

    /// Fetch all observations in the closed date range of the request.
    fn history<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, Vec<RateRecord>>;

    /// Fetch the most recent observation per requested currency.
    fn latest<'a>(&'a self, req: &'a LatestRequest) -> FeedFuture<'a, Vec<RateRecord>>;

    fn health(&self) -> FeedHealth;
}
