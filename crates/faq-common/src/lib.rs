pub mod audit;
pub mod error;
pub mod geolocation;
pub mod http;
