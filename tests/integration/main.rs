//! Integration tests for Thread-Harvest
//!
//! These tests use wiremock to stand up mock forum servers and exercise the
//! fetcher and full harvest runs over real HTTP.

mod fetch_tests;
mod harvest_tests;
