// FaultLens - app/mod.rs
//
// Application layer: input loading, batch orchestration, self-validation.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod batch;
pub mod validation;
