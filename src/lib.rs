//! rusty-strata – computation core for an interactive category explorer.
//!
//! Three state holders sit between a read-only [`data::model::Dataset`] and
//! whatever draws it:
//!
//! - [`navigation::NavigationMachine`] – drill-down over stacked category counts
//! - [`animation::AnimationController`] – density curve per ordinal, stepped on a timer
//! - [`selection::SelectionCoordinator`] – category cross-filter and record focus
//!
//! [`state::AppState`] bundles them behind a message interface: the renderer
//! sends [`state::Interaction`]s and reads back a [`state::ViewSnapshot`].

pub mod aggregate;
pub mod animation;
pub mod config;
pub mod data;
pub mod density;
pub mod error;
pub mod media;
pub mod navigation;
pub mod selection;
pub mod state;
