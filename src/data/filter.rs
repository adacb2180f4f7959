use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Per-analysis validity
// ---------------------------------------------------------------------------

/// What an analysis needs from a record for it to take part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirement {
    /// Record must carry a valid ordinal.
    pub ordinal: bool,
    /// Record must carry a finite value for every listed dimension.
    pub dimensions: Vec<String>,
}

impl Requirement {
    /// Categories only; every loaded record qualifies.
    pub fn categories() -> Self {
        Self::default()
    }

    /// One numeric dimension grouped by ordinal (density views).
    pub fn ordinal_dimension(dimension: &str) -> Self {
        Requirement {
            ordinal: true,
            dimensions: vec![dimension.to_string()],
        }
    }

    /// Every numeric dimension of the dataset (multi-dimensional view).
    pub fn all_dimensions(dataset: &Dataset) -> Self {
        Requirement {
            ordinal: false,
            dimensions: dataset.dimensions.clone(),
        }
    }

    pub fn accepts(&self, record: &Record) -> bool {
        (!self.ordinal || record.ordinal.is_some())
            && self.dimensions.iter().all(|d| record.value(d).is_some())
    }
}

/// Indices of records passing a [`Requirement`], in dataset order, plus the
/// number of records left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidSubset {
    pub indices: Vec<usize>,
    pub excluded: usize,
}

/// Split the dataset into valid record indices and an exclusion count.
/// Invalid records are never mutated, only left out.
pub fn partition_valid(dataset: &Dataset, requirement: &Requirement) -> ValidSubset {
    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| requirement.accepts(rec))
        .map(|(i, _)| i)
        .collect();
    let excluded = dataset.len() - indices.len();
    if excluded > 0 {
        log::debug!("{excluded} records excluded for {requirement:?}");
    }
    ValidSubset { indices, excluded }
}

// ---------------------------------------------------------------------------
// Active-category filter
// ---------------------------------------------------------------------------

/// Return the subset of `candidates` whose primary category is active.
///
/// An empty active set means nothing is selected, so nothing passes.
pub fn active_indices(dataset: &Dataset, candidates: &[usize], active: &BTreeSet<String>) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| active.contains(&dataset.records[i].primary))
        .collect()
}
