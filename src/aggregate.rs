//! Category aggregation and stacking layout.
//!
//! Groups are rebuilt from scratch on every dataset or filter change and
//! handed out as owned values; nothing here keeps state.

use std::collections::BTreeMap;

use crate::data::filter::{Requirement, partition_valid};
use crate::data::model::Dataset;
use crate::error::AggregateError;

/// Width of one stacked bar in plot units; bars sit on integer slots.
pub const BAR_WIDTH: f64 = 0.8;

/// Records sharing one primary category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub key: String,
    /// Record indices, in dataset order.
    pub members: Vec<usize>,
    /// Count per secondary category, in secondary-domain order (zeros kept).
    pub counts: Vec<(String, usize)>,
    pub total: usize,
}

impl CategoryGroup {
    pub fn count(&self, secondary: &str) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| s == secondary)
            .map_or(0, |(_, c)| *c)
    }

    /// Members whose secondary category is `secondary`, in dataset order.
    pub fn members_with(&self, dataset: &Dataset, secondary: &str) -> Vec<usize> {
        self.members
            .iter()
            .copied()
            .filter(|&i| dataset.records[i].secondary == secondary)
            .collect()
    }
}

/// Group `candidates` by primary category and count per secondary category.
///
/// `secondary_domain` is the full, dataset-wide domain so that every group
/// carries the same count slots. Output is ordered by descending total; ties
/// keep encounter order.
pub fn aggregate(dataset: &Dataset, candidates: &[usize], secondary_domain: &[String]) -> Vec<CategoryGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

    for &i in candidates {
        let key = dataset.records[i].primary.as_str();
        members
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(i);
    }

    let mut groups: Vec<CategoryGroup> = order
        .into_iter()
        .map(|key| {
            let idx = members.remove(key).unwrap_or_default();
            let counts = secondary_domain
                .iter()
                .map(|s| {
                    let n = idx.iter().filter(|&&i| dataset.records[i].secondary == *s).count();
                    (s.clone(), n)
                })
                .collect();
            CategoryGroup {
                key: key.to_string(),
                total: idx.len(),
                members: idx,
                counts,
            }
        })
        .collect();

    // `sort_by` is stable, so equal totals keep encounter order.
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups
}

/// Aggregate every record that passes the category requirement.
pub fn aggregate_all(dataset: &Dataset) -> Vec<CategoryGroup> {
    let valid = partition_valid(dataset, &Requirement::categories());
    aggregate(dataset, &valid.indices, &dataset.secondary_domain)
}

/// Look up one group by primary key.
pub fn find_group<'a>(groups: &'a [CategoryGroup], key: &str) -> Result<&'a CategoryGroup, AggregateError> {
    groups
        .iter()
        .find(|g| g.key == key)
        .ok_or_else(|| AggregateError::NotFound(key.to_string()))
}

/// Aggregate restricted to one primary key: a single-element list that still
/// uses the full secondary domain.
pub fn aggregate_only(dataset: &Dataset, primary: &str) -> Result<Vec<CategoryGroup>, AggregateError> {
    let groups = aggregate_all(dataset);
    let group = find_group(&groups, primary)?.clone();
    Ok(vec![group])
}

// ---------------------------------------------------------------------------
// Stacking layout
// ---------------------------------------------------------------------------

/// One cumulative segment of a stacked bar.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSegment {
    pub primary: String,
    pub secondary: String,
    /// Bar position (index of the group in the ordered group list).
    pub slot: usize,
    pub lower: f64,
    pub upper: f64,
}

impl StackSegment {
    pub fn count(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Stack each group's counts in secondary-domain order. Empty segments are
/// left out.
pub fn stack(groups: &[CategoryGroup]) -> Vec<StackSegment> {
    let mut segments = Vec::new();
    for (slot, group) in groups.iter().enumerate() {
        let mut lower = 0.0;
        for (secondary, count) in &group.counts {
            if *count == 0 {
                continue;
            }
            let upper = lower + *count as f64;
            segments.push(StackSegment {
                primary: group.key.clone(),
                secondary: secondary.clone(),
                slot,
                lower,
                upper,
            });
            lower = upper;
        }
    }
    segments
}

/// Segment under a plot coordinate, if any.
pub fn hit_test(segments: &[StackSegment], x: f64, y: f64) -> Option<&StackSegment> {
    segments.iter().find(|s| {
        (x - s.slot as f64).abs() <= BAR_WIDTH / 2.0 && y >= s.lower && y < s.upper
    })
}

// ---------------------------------------------------------------------------
// Ordinal grouping (animation steps)
// ---------------------------------------------------------------------------

/// Valid values of one dimension for one ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalSample {
    pub ordinal: i64,
    pub values: Vec<f64>,
}

/// Animation steps for one dimension, plus how many records could not take
/// part for lack of an ordinal or a valid value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdinalSteps {
    pub steps: Vec<OrdinalSample>,
    pub excluded: usize,
}

/// Group a dimension's valid values by ordinal, ascending. Ordinals without
/// a single valid observation do not appear.
pub fn ordinal_samples(dataset: &Dataset, dimension: &str) -> OrdinalSteps {
    let valid = partition_valid(dataset, &Requirement::ordinal_dimension(dimension));
    let mut by_ordinal: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for i in valid.indices {
        let rec = &dataset.records[i];
        if let (Some(ordinal), Some(v)) = (rec.ordinal, rec.value(dimension)) {
            by_ordinal.entry(ordinal).or_default().push(v);
        }
    }
    OrdinalSteps {
        steps: by_ordinal
            .into_iter()
            .map(|(ordinal, values)| OrdinalSample { ordinal, values })
            .collect(),
        excluded: valid.excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for (i, sec) in ["None", "Flying", "None", "Ice", "Flying"].iter().enumerate() {
            records.push(Record::new(&format!("a{i}"), "A", sec).with_ordinal(1).with_value("hp", 10.0 * i as f64));
        }
        records.push(Record::new("b0", "B", "None").with_ordinal(2).with_value("hp", 5.0));
        records.push(Record::new("c0", "C", "Ice").with_ordinal(3));
        records.push(Record::new("b1", "B", "Ice").with_ordinal(2).with_value("hp", 7.0));
        Dataset::from_records(records, vec!["hp".into()], "None").unwrap()
    }

    #[test]
    fn groups_are_ordered_by_total() {
        let ds = dataset();
        let groups = aggregate_all(&ds);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(groups[0].count("Flying"), 2);
        assert_eq!(groups[0].count("None"), 2);
        assert_eq!(groups[1].total, 2);
    }

    #[test]
    fn totals_sum_to_valid_record_count() {
        let ds = dataset();
        let groups = aggregate_all(&ds);
        let sum: usize = groups.iter().map(|g| g.total).sum();
        assert_eq!(sum, ds.len());
    }

    #[test]
    fn ties_keep_encounter_order_and_reaggregation_is_stable() {
        let records = vec![
            Record::new("x", "Z", "None"),
            Record::new("y", "M", "None"),
            Record::new("z", "A", "None"),
        ];
        let ds = Dataset::from_records(records, vec![], "None").unwrap();
        let first = aggregate_all(&ds);
        let keys: Vec<&str> = first.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Z", "M", "A"]);
        assert_eq!(aggregate_all(&ds), first);
    }

    #[test]
    fn every_group_uses_the_full_secondary_domain() {
        let ds = dataset();
        let groups = aggregate_all(&ds);
        for g in &groups {
            let slots: Vec<&str> = g.counts.iter().map(|(s, _)| s.as_str()).collect();
            assert_eq!(slots, vec!["None", "Flying", "Ice"]);
        }
    }

    #[test]
    fn restricted_aggregate_is_single_group_or_not_found() {
        let ds = dataset();
        let only = aggregate_only(&ds, "B").unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].counts.len(), ds.secondary_domain.len());
        assert_eq!(
            aggregate_only(&ds, "Q"),
            Err(AggregateError::NotFound("Q".to_string()))
        );
    }

    #[test]
    fn stacking_is_cumulative_and_skips_empty_segments() {
        let ds = dataset();
        let segments = stack(&aggregate_all(&ds));
        let a: Vec<(&str, f64, f64)> = segments
            .iter()
            .filter(|s| s.primary == "A")
            .map(|s| (s.secondary.as_str(), s.lower, s.upper))
            .collect();
        assert_eq!(a, vec![("None", 0.0, 2.0), ("Flying", 2.0, 4.0), ("Ice", 4.0, 5.0)]);
        assert!(segments.iter().filter(|s| s.primary == "C").all(|s| s.secondary == "Ice"));
    }

    #[test]
    fn hit_test_finds_segment_under_pointer() {
        let ds = dataset();
        let segments = stack(&aggregate_all(&ds));
        let hit = hit_test(&segments, 0.1, 2.5).unwrap();
        assert_eq!((hit.primary.as_str(), hit.secondary.as_str()), ("A", "Flying"));
        assert!(hit_test(&segments, 0.5, 1.0).is_none());
        assert!(hit_test(&segments, 2.0, 1.5).is_none());
    }

    #[test]
    fn ordinal_samples_drop_ordinals_without_values() {
        let ds = dataset();
        let samples = ordinal_samples(&ds, "hp");
        let ordinals: Vec<i64> = samples.steps.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(samples.steps[1].values, vec![5.0, 7.0]);
        // c0 has no hp value.
        assert_eq!(samples.excluded, 1);
    }
}
