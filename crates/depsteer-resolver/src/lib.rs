//! Dependency rule engine: the graph resolution adapter contract, an
//! in-memory catalog resolver, single-pass rule application, and the
//! fixed-point version alignment engine that keeps module families on one
//! version.

pub mod adapter;
pub mod alignment;
pub mod apply;
pub mod catalog;
pub mod election;
pub mod engine;
pub mod graph;
pub mod insight;
