//! Integration tests for the crawler
//!
//! These tests start a fake node network on a local TCP port and drive the
//! real coordinator against it, end to end.

mod crawl_tests;
mod fake_node;
