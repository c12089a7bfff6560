//! Road accident detection web demo.
//!
//! Hexagonal layout: `domain` holds the pure types and rules, `application` the use
//! cases and the ports they depend on, `adapters` the ONNX model, the uploads
//! directory and the axum front end.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
