pub mod client;
pub mod extract;
pub mod models;

pub use client::{CalendarClient, Fetcher};
pub use extract::extract;
pub use models::*;
