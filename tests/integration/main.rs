//! Integration tests
//!
//! These tests use wiremock to stand in for the platform API and media CDN.

mod api_tests;
mod media_tests;
mod pipeline_tests;
