pub mod bucketing;
pub mod destinations;
pub mod error;
pub mod identity;
pub mod itinerary;
pub mod permissions;
pub mod ports;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
