//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small conference site and run the
//! full pipeline end-to-end into a temporary output directory.

mod harvest_tests;
