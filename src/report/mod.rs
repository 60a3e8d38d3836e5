//! Report generation module.
//!
//! Turns a built dashboard into chart specs and renders them as
//! Markdown or JSON.

pub mod chart;
pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};
