//! End-to-End Integration Tests
//!
//! These tests drive the Duo MFA step through both phases with a fake
//! host context and a fake Duo Web primitive.

mod configuration;
mod duo_flows;
mod pages;
