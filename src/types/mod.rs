pub mod averaged;
pub mod config;
pub mod location;
pub mod metric;
pub mod station;
pub mod year_table;
