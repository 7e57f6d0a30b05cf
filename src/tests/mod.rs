//! Cross-component scenario tests
//!
//! These run the whole pipeline against a scripted in-memory backend; no
//! external services required.

pub mod support;

mod evaluator_tests;
mod pipeline_tests;
