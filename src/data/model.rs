use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from a file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, before it is assigned to a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a finite `f64`. Numeric strings are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Interpret the cell as an integer-like ordinal ("3", 3, 3.0).
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// Text form used for identity and category columns. `Null` and blank
    /// strings have no text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            CellValue::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique identity.
    pub name: String,
    /// Primary category (stacked bar key, cross-filter key).
    pub primary: String,
    /// Secondary category; the dataset's "none" sentinel when absent.
    pub secondary: String,
    /// Ordinal group (generation, epoch...). `None` when missing or not integer-like.
    pub ordinal: Option<i64>,
    /// Numeric dimensions. Missing dimensions are simply absent.
    pub values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(name: &str, primary: &str, secondary: &str) -> Self {
        Record {
            name: name.to_string(),
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            ordinal: None,
            values: BTreeMap::new(),
        }
    }

    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    pub fn with_value(mut self, dimension: &str, value: f64) -> Self {
        self.values.insert(dimension.to_string(), value);
        self
    }

    /// Finite value of a numeric dimension. NaN/inf count as missing.
    pub fn value(&self, dimension: &str) -> Option<f64> {
        self.values
            .get(dimension)
            .copied()
            .filter(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed domains. Read-only once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records, in file order.
    pub records: Vec<Record>,
    /// Ordered list of numeric dimension names.
    pub dimensions: Vec<String>,
    /// Sentinel used for "no secondary category".
    pub none_sentinel: String,
    /// Primary categories in encounter order.
    pub primary_domain: Vec<String>,
    /// Every secondary category across the dataset, sentinel first, rest sorted.
    pub secondary_domain: Vec<String>,
    /// Distinct valid ordinals, ascending.
    pub ordinal_domain: Vec<i64>,
    /// Global (min, max) of each numeric dimension over finite values.
    extents: BTreeMap<String, (f64, f64)>,
    by_name: HashMap<String, usize>,
}

impl Dataset {
    /// Build domains and indices from the loaded records.
    pub fn from_records(
        records: Vec<Record>,
        dimensions: Vec<String>,
        none_sentinel: &str,
    ) -> Result<Self, DatasetError> {
        let mut by_name = HashMap::with_capacity(records.len());
        let mut primary_domain: Vec<String> = Vec::new();
        let mut seen_primary: BTreeSet<&str> = BTreeSet::new();
        let mut secondaries: BTreeSet<&str> = BTreeSet::new();
        let mut ordinals: BTreeSet<i64> = BTreeSet::new();
        let mut extents: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for (i, rec) in records.iter().enumerate() {
            if by_name.insert(rec.name.clone(), i).is_some() {
                return Err(DatasetError::DuplicateIdentity(rec.name.clone()));
            }
            if seen_primary.insert(rec.primary.as_str()) {
                primary_domain.push(rec.primary.clone());
            }
            if rec.secondary != none_sentinel {
                secondaries.insert(rec.secondary.as_str());
            }
            if let Some(o) = rec.ordinal {
                ordinals.insert(o);
            }
            for dim in &dimensions {
                if let Some(v) = rec.value(dim) {
                    let e = extents.entry(dim.clone()).or_insert((v, v));
                    e.0 = e.0.min(v);
                    e.1 = e.1.max(v);
                }
            }
        }

        let mut secondary_domain = vec![none_sentinel.to_string()];
        secondary_domain.extend(secondaries.into_iter().map(str::to_string));

        Ok(Dataset {
            primary_domain,
            secondary_domain,
            ordinal_domain: ordinals.into_iter().collect(),
            extents,
            by_name,
            records,
            dimensions,
            none_sentinel: none_sentinel.to_string(),
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the record with the given identity.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.position(name).map(|i| &self.records[i])
    }

    /// Global extent of a dimension, `None` when it has no finite value.
    pub fn extent(&self, dimension: &str) -> Option<(f64, f64)> {
        self.extents.get(dimension).copied()
    }
}
