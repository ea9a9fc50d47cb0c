// FaultLens - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: platform, app, or the filesystem, except `discovery`
// which reads directory metadata through walkdir.

pub mod diagnosis;
pub mod discovery;
pub mod export;
pub mod filter;
pub mod knowledge;
pub mod model;
pub mod parser;
pub mod rules;
pub mod skillpack;
