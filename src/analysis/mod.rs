pub mod aggregate;
pub mod cache;
pub mod calendar;
pub mod error;
pub mod facade;
pub mod radius;
pub mod spatial;
