//! Unit tests for the fragmentation and reassembly subsystem.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod fragmenter_tests;
mod header_tests;
mod support;
