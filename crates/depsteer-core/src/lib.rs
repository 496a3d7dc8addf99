//! Core data types for depsteer.
//!
//! This crate defines the types the rule engine works with: module
//! coordinates, Maven-style version ordering and selectors, the declarative
//! resolution rules and their rule-set documents, dependency scopes with their
//! resolution strategies, and the `Steer.toml` project manifest.
//!
//! This crate is intentionally free of graph resolution; it only describes
//! what is being resolved and which rules steer it.

pub mod align;
pub mod config;
pub mod manifest;
pub mod module;
pub mod rules;
pub mod ruleset;
pub mod scope;
pub mod selector;
pub mod version;
