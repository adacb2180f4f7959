//! Cross-filter and focus over the multi-dimensional record view.
//!
//! The working set is every record with all numeric dimensions present whose
//! primary category is active. The focused record, if any, is always a
//! member of the working set: shrinking the active set drops a focus that
//! falls outside it in the same update.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::filter::{Requirement, ValidSubset, active_indices, partition_valid};
use crate::data::model::{Dataset, Record};
use crate::error::SelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// The focus, or any working-set record while nothing is focused.
    Emphasized,
    /// In the working set but another record has focus.
    Dimmed,
    /// Outside the active categories.
    Suppressed,
}

/// One axis of the multi-dimensional view.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub dimension: String,
    pub extent: (f64, f64),
}

/// Immutable snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    /// Every primary category, in dataset order, with its active flag.
    pub categories: Vec<(String, bool)>,
    pub axes: Vec<Axis>,
    /// Working-set records with their emphasis, in dataset order.
    pub records: Vec<(Record, Emphasis)>,
    pub focus: Option<String>,
    /// Records left out for missing numeric dimensions.
    pub excluded: usize,
}

pub struct SelectionCoordinator {
    dataset: Arc<Dataset>,
    valid: ValidSubset,
    active: BTreeSet<String>,
    focus: Option<String>,
    working: Vec<usize>,
    view: SelectionView,
}

impl SelectionCoordinator {
    /// Starts with every category active and nothing focused.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let active = dataset.primary_domain.iter().cloned().collect();
        let mut coordinator = SelectionCoordinator {
            valid: ValidSubset::default(),
            active,
            focus: None,
            working: Vec::new(),
            view: SelectionView {
                categories: Vec::new(),
                axes: Vec::new(),
                records: Vec::new(),
                focus: None,
                excluded: 0,
            },
            dataset,
        };
        coordinator.revalidate();
        coordinator
    }

    pub fn view(&self) -> &SelectionView {
        &self.view
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    /// Replace the active set. A focus outside the new set is cleared.
    pub fn set_active_categories(&mut self, keys: BTreeSet<String>) {
        self.active = keys;
        self.recompute();
    }

    /// Checkbox toggle for one category.
    pub fn toggle_category(&mut self, key: &str, active: bool) {
        let mut keys = self.active.clone();
        if active {
            keys.insert(key.to_string());
        } else {
            keys.remove(key);
        }
        self.set_active_categories(keys);
    }

    /// Focus a record. Only records in the working set can take focus;
    /// otherwise the focus is left as it was.
    pub fn focus_record(&mut self, identity: &str) -> Result<(), SelectionError> {
        let in_view = self
            .dataset
            .position(identity)
            .is_some_and(|i| self.working.contains(&i));
        if !in_view {
            return Err(SelectionError::NotInCurrentView(identity.to_string()));
        }
        self.focus = Some(identity.to_string());
        self.recompute();
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        if self.focus.take().is_some() {
            self.recompute();
        }
    }

    /// Emphasis for any record identity, including ones outside the view.
    pub fn emphasis(&self, identity: &str) -> Emphasis {
        let in_view = self
            .dataset
            .position(identity)
            .is_some_and(|i| self.working.contains(&i));
        if !in_view {
            return Emphasis::Suppressed;
        }
        match &self.focus {
            None => Emphasis::Emphasized,
            Some(f) if f == identity => Emphasis::Emphasized,
            Some(_) => Emphasis::Dimmed,
        }
    }

    /// Swap in a new dataset. Active keys that no longer exist are dropped,
    /// categories the previous dataset did not have start active, and a
    /// focus that is no longer in view is cleared.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let previous: BTreeSet<String> = self.dataset.primary_domain.iter().cloned().collect();
        self.dataset = dataset;
        let known: BTreeSet<&String> = self.dataset.primary_domain.iter().collect();
        self.active.retain(|k| known.contains(k));
        for key in &self.dataset.primary_domain {
            if !previous.contains(key) {
                self.active.insert(key.clone());
            }
        }
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.valid = partition_valid(&self.dataset, &Requirement::all_dimensions(&self.dataset));
        self.recompute();
    }

    fn recompute(&mut self) {
        self.working = active_indices(&self.dataset, &self.valid.indices, &self.active);

        let focus_in_view = self
            .focus
            .as_deref()
            .and_then(|f| self.dataset.position(f))
            .is_some_and(|i| self.working.contains(&i));
        if self.focus.is_some() && !focus_in_view {
            log::debug!("Focus {:?} left the view; cleared", self.focus);
            self.focus = None;
        }

        let dataset = &self.dataset;
        let records = self
            .working
            .iter()
            .map(|&i| {
                let rec = &dataset.records[i];
                let emphasis = match &self.focus {
                    Some(f) if *f != rec.name => Emphasis::Dimmed,
                    _ => Emphasis::Emphasized,
                };
                (rec.clone(), emphasis)
            })
            .collect();

        self.view = SelectionView {
            categories: dataset
                .primary_domain
                .iter()
                .map(|c| (c.clone(), self.active.contains(c)))
                .collect(),
            axes: dataset
                .dimensions
                .iter()
                .filter_map(|d| {
                    Some(Axis {
                        dimension: d.clone(),
                        extent: dataset.extent(d)?,
                    })
                })
                .collect(),
            records,
            focus: self.focus.clone(),
            excluded: self.valid.excluded,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Arc<Dataset> {
        let rec = |name: &str, primary: &str, hp: f64| {
            Record::new(name, primary, "None").with_value("hp", hp).with_value("speed", hp / 2.0)
        };
        let records = vec![
            rec("a1", "A", 10.0),
            rec("a2", "A", 20.0),
            rec("b1", "B", 30.0),
            rec("c1", "C", 40.0),
            Record::new("c2", "C", "None").with_value("hp", 50.0),
        ];
        Arc::new(Dataset::from_records(records, vec!["hp".into(), "speed".into()], "None").unwrap())
    }

    fn keys(ks: &[&str]) -> BTreeSet<String> {
        ks.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn starts_with_all_categories_and_no_focus() {
        let sel = SelectionCoordinator::new(dataset());
        assert_eq!(sel.view().records.len(), 4);
        assert_eq!(sel.view().excluded, 1);
        assert!(sel.view().records.iter().all(|(_, e)| *e == Emphasis::Emphasized));
        assert_eq!(sel.view().axes.len(), 2);
    }

    #[test]
    fn removing_focused_category_clears_focus() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.focus_record("b1").unwrap();
        sel.set_active_categories(keys(&["A", "C"]));
        assert_eq!(sel.focus(), None);
        assert_eq!(sel.view().focus, None);
    }

    #[test]
    fn focus_survives_unrelated_filter_change() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.focus_record("a1").unwrap();
        sel.toggle_category("B", false);
        assert_eq!(sel.focus(), Some("a1"));
    }

    #[test]
    fn focus_outside_view_is_a_no_op() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.focus_record("a1").unwrap();
        sel.set_active_categories(keys(&["A"]));

        assert_eq!(
            sel.focus_record("b1"),
            Err(SelectionError::NotInCurrentView("b1".into()))
        );
        assert_eq!(sel.focus(), Some("a1"));
        // Invalid for the multi-dimensional view.
        assert!(sel.focus_record("c2").is_err());
        assert!(sel.focus_record("nobody").is_err());
        assert_eq!(sel.focus(), Some("a1"));
    }

    #[test]
    fn emphasis_rules() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.set_active_categories(keys(&["A", "B"]));
        assert_eq!(sel.emphasis("a1"), Emphasis::Emphasized);
        assert_eq!(sel.emphasis("c1"), Emphasis::Suppressed);

        sel.focus_record("a2").unwrap();
        assert_eq!(sel.emphasis("a2"), Emphasis::Emphasized);
        assert_eq!(sel.emphasis("a1"), Emphasis::Dimmed);
        assert_eq!(sel.emphasis("c1"), Emphasis::Suppressed);

        let dimmed = sel.view().records.iter().filter(|(_, e)| *e == Emphasis::Dimmed).count();
        assert_eq!(dimmed, 2);
    }

    #[test]
    fn clear_focus_is_idempotent() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.clear_focus();
        sel.focus_record("a1").unwrap();
        sel.clear_focus();
        sel.clear_focus();
        assert_eq!(sel.focus(), None);
    }

    #[test]
    fn empty_active_set_shows_nothing() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.set_active_categories(BTreeSet::new());
        assert!(sel.view().records.is_empty());
        assert!(sel.view().categories.iter().all(|(_, on)| !on));
    }

    #[test]
    fn dataset_swap_drops_vanished_focus_and_keys() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.focus_record("b1").unwrap();
        let smaller = Arc::new(
            Dataset::from_records(
                vec![Record::new("a1", "A", "None").with_value("hp", 1.0).with_value("speed", 1.0)],
                vec!["hp".into(), "speed".into()],
                "None",
            )
            .unwrap(),
        );
        sel.set_dataset(smaller);
        assert_eq!(sel.focus(), None);
        assert_eq!(sel.active(), &keys(&["A"]));
    }

    #[test]
    fn new_categories_start_active_after_dataset_swap() {
        let mut sel = SelectionCoordinator::new(dataset());
        sel.toggle_category("B", false);

        let rec = |name: &str, primary: &str| {
            Record::new(name, primary, "None").with_value("hp", 1.0).with_value("speed", 1.0)
        };
        let next = Arc::new(
            Dataset::from_records(
                vec![rec("a9", "A"), rec("b9", "B"), rec("d1", "D"), rec("e1", "E")],
                vec!["hp".into(), "speed".into()],
                "None",
            )
            .unwrap(),
        );
        sel.set_dataset(next);
        // B stays off as the user left it; D and E are new.
        assert_eq!(sel.active(), &keys(&["A", "D", "E"]));
        assert_eq!(sel.view().records.len(), 3);
    }

    #[test]
    fn disjoint_dataset_swap_activates_everything() {
        let mut sel = SelectionCoordinator::new(dataset());
        let next = Arc::new(
            Dataset::from_records(
                vec![
                    Record::new("x", "X", "None").with_value("hp", 1.0).with_value("speed", 1.0),
                    Record::new("y", "Y", "None").with_value("hp", 2.0).with_value("speed", 2.0),
                ],
                vec!["hp".into(), "speed".into()],
                "None",
            )
            .unwrap(),
        );
        sel.set_dataset(next);
        assert_eq!(sel.active(), &keys(&["X", "Y"]));
        assert!(sel.view().categories.iter().all(|(_, on)| *on));
        assert_eq!(sel.view().records.len(), 2);
    }
}
