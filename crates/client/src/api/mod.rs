//! Endpoint methods on [`EsClient`](crate::EsClient), grouped by API area

pub mod bulk;
pub mod cluster;
pub mod document;
pub mod indices;
pub mod scripts;
pub mod search;
