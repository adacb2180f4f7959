//! egui rendering of the core's view snapshots. Widgets read a
//! [`rusty_strata::state::ViewSnapshot`] and push
//! [`rusty_strata::state::Interaction`]s; they never touch core state.

pub mod panels;
pub mod plot;
