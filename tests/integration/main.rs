//! Integration tests

mod config_test;
mod feed_test;
mod session_test;
