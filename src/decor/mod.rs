//! Decoration model: edges, providers and the pure composition steps.
//!
//! Nothing in here performs I/O. The engine feeds display and
//! configuration state in and turns the results into surface commands.

pub mod config;
pub mod diff;
pub mod edge;
pub mod factory;
pub mod mode;
pub mod provider;
pub mod requirement;
pub mod rounded;
pub mod visibility;
