//! End-to-end tests for native-updater.
//!
//! Scenarios run the real store and reconciler against a temporary install
//! directory. The release feed is either scripted in memory (`harness`) or
//! served over HTTP by a local axum stub (`http_tests`).

#![allow(clippy::unwrap_used, clippy::expect_used)]


mod http_tests;
mod updater_tests;
