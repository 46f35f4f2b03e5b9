mod currency;
mod series;
mod timestamp;

pub use currency::CurrencyCode;
pub use series::{RatePoint, RateSeries};
pub use timestamp::UtcDateTime;
