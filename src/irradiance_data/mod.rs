pub mod averager;
pub mod cache;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod query;
