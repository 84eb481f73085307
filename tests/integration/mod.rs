//! Integration tests for content tree routing

mod cli;
mod dispatch;
mod router;
mod sled_storage;
mod support;
