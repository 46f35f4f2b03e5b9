mod fixture;
mod nbp;

pub use fixture::FixtureFeed;
pub use nbp::NbpFeed;
