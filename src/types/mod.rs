pub mod query;
pub mod records;
pub mod source;
pub mod station;
pub mod weekday;
