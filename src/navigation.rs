//! Drill-down navigation over the stacked category view.
//!
//! ```text
//!   Overview ──select(p)──▶ PrimaryFiltered(p) ──select(p, s)──▶ DetailList(p, s)
//!      ▲                         │     ▲                               │
//!      └──────── reset / back ───┘     └──────────── back ─────────────┘
//!      ▲                                                               │
//!      └─────────────────────────── reset ─────────────────────────────┘
//! ```
//!
//! Every state change rebuilds the whole [`NavigationView`] from the shared
//! dataset. A selector that no longer resolves sends the machine back to the
//! nearest safe level with a warning instead of failing.

use std::sync::Arc;

use crate::aggregate::{CategoryGroup, StackSegment, aggregate_all, aggregate_only, stack};
use crate::data::model::{Dataset, Record};
use crate::error::NavigationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationLevel {
    Overview,
    PrimaryFiltered { primary: String },
    DetailList { primary: String, secondary: String },
}

impl NavigationLevel {
    /// Breadcrumb labels, outermost first.
    pub fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = vec!["All".to_string()];
        match self {
            NavigationLevel::Overview => {}
            NavigationLevel::PrimaryFiltered { primary } => crumbs.push(primary.clone()),
            NavigationLevel::DetailList { primary, secondary } => {
                crumbs.push(primary.clone());
                crumbs.push(secondary.clone());
            }
        }
        crumbs
    }
}

/// What a transition request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved,
    Unchanged,
    /// The requested level could not be resolved; a safer level was used.
    Redirected,
}

/// Immutable snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationView {
    pub level: NavigationLevel,
    /// Displayed groups: all of them at `Overview`, one otherwise.
    pub groups: Vec<CategoryGroup>,
    pub segments: Vec<StackSegment>,
    /// Full secondary domain, for a legend that stays stable across levels.
    pub secondary_domain: Vec<String>,
    /// Records listed at `DetailList`; empty at other levels.
    pub detail: Vec<Record>,
}

pub struct NavigationMachine {
    dataset: Arc<Dataset>,
    level: NavigationLevel,
    view: NavigationView,
}

impl NavigationMachine {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let groups = aggregate_all(&dataset);
        let view = NavigationView {
            level: NavigationLevel::Overview,
            segments: stack(&groups),
            groups,
            secondary_domain: dataset.secondary_domain.clone(),
            detail: Vec::new(),
        };
        NavigationMachine {
            dataset,
            level: NavigationLevel::Overview,
            view,
        }
    }

    pub fn level(&self) -> &NavigationLevel {
        &self.level
    }

    pub fn view(&self) -> &NavigationView {
        &self.view
    }

    /// A stacked segment was clicked.
    ///
    /// From `Overview` only the primary key matters. From `PrimaryFiltered(p)`
    /// the segment must belong to `p` and carry a secondary key. `DetailList`
    /// has no forward transition.
    pub fn select_segment(
        &mut self,
        primary: &str,
        secondary: Option<&str>,
    ) -> Result<Transition, NavigationError> {
        let next = match &self.level {
            NavigationLevel::Overview => NavigationLevel::PrimaryFiltered {
                primary: primary.to_string(),
            },
            NavigationLevel::PrimaryFiltered { primary: current } => {
                if current != primary {
                    return Err(NavigationError::OutOfScope {
                        current: current.clone(),
                        requested: primary.to_string(),
                    });
                }
                let secondary = secondary.ok_or(NavigationError::MissingSecondary)?;
                NavigationLevel::DetailList {
                    primary: primary.to_string(),
                    secondary: secondary.to_string(),
                }
            }
            NavigationLevel::DetailList { .. } => return Err(NavigationError::TerminalLevel),
        };
        Ok(self.enter(next))
    }

    /// Drop the innermost selector: `DetailList(p, s)` → `PrimaryFiltered(p)`,
    /// `PrimaryFiltered` → `Overview`.
    pub fn back(&mut self) -> Transition {
        let next = match &self.level {
            NavigationLevel::Overview => return Transition::Unchanged,
            NavigationLevel::PrimaryFiltered { .. } => NavigationLevel::Overview,
            NavigationLevel::DetailList { primary, .. } => NavigationLevel::PrimaryFiltered {
                primary: primary.clone(),
            },
        };
        self.enter(next)
    }

    /// "Show all": back to `Overview` from anywhere.
    pub fn reset(&mut self) -> Transition {
        if self.level == NavigationLevel::Overview {
            return Transition::Unchanged;
        }
        self.enter(NavigationLevel::Overview)
    }

    /// Swap in a new dataset and revalidate the current selectors against it.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) -> Transition {
        self.dataset = dataset;
        let level = self.level.clone();
        match self.enter(level) {
            Transition::Moved => Transition::Unchanged,
            other => other,
        }
    }

    fn enter(&mut self, level: NavigationLevel) -> Transition {
        self.level = level;
        if self.recompute() {
            Transition::Moved
        } else {
            Transition::Redirected
        }
    }

    /// Rebuild the view for `self.level`. Returns `false` when the level had
    /// to be replaced by a safer one.
    fn recompute(&mut self) -> bool {
        let dataset = Arc::clone(&self.dataset);
        match self.level.clone() {
            NavigationLevel::Overview => {
                let groups = aggregate_all(&dataset);
                self.publish(&dataset, groups, Vec::new());
                true
            }
            NavigationLevel::PrimaryFiltered { primary } => match aggregate_only(&dataset, &primary) {
                Ok(groups) => {
                    self.publish(&dataset, groups, Vec::new());
                    true
                }
                Err(e) => {
                    log::warn!("{e}; returning to overview");
                    self.level = NavigationLevel::Overview;
                    self.recompute();
                    false
                }
            },
            NavigationLevel::DetailList { primary, secondary } => {
                let groups = match aggregate_only(&dataset, &primary) {
                    Ok(groups) => groups,
                    Err(e) => {
                        log::warn!("{e}; returning to overview");
                        self.level = NavigationLevel::Overview;
                        self.recompute();
                        return false;
                    }
                };
                let members = groups[0].members_with(&dataset, &secondary);
                if members.is_empty() {
                    log::warn!("'{primary}' has no '{secondary}' records; returning to '{primary}'");
                    self.level = NavigationLevel::PrimaryFiltered { primary };
                    self.recompute();
                    return false;
                }
                let detail = members.iter().map(|&i| dataset.records[i].clone()).collect();
                self.publish(&dataset, groups, detail);
                true
            }
        }
    }

    fn publish(&mut self, dataset: &Dataset, groups: Vec<CategoryGroup>, detail: Vec<Record>) {
        self.view = NavigationView {
            level: self.level.clone(),
            segments: stack(&groups),
            groups,
            secondary_domain: dataset.secondary_domain.clone(),
            detail,
        };
    }
}
