use std::cmp::Ordering;
use std::fmt::Display;

use serde::{
    Serialize,
    Serializer,
};

/// One selected DNB variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnbRecord {
    /// Variable label.
    pub dnb:         String,
    /// Cluster id. Ids are only meaningful for equality.
    pub cluster:     usize,
    /// Number of candidates in the cluster.
    pub clustersize: usize,
    /// Deviation in the experimental group.
    pub dev_expr:    f64,
    /// Deviation in the control group.
    pub dev_ctrl:    f64,
    /// Mean pairwise correlation within the cluster, `None` for singletons.
    pub cor_mean:    Option<f64>,
}

/// Result table of one two-step run, sorted by descending cluster size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DnbResult {
    records:        Vec<DnbRecord>,
    output_metrics: bool,
}

impl DnbResult {
    crate::getter_fn!(records, Vec<DnbRecord>);

    pub fn empty(output_metrics: bool) -> Self {
        Self {
            records: Vec::new(),
            output_metrics,
        }
    }

    /// Builds the table, ordering rows by descending cluster size. The sort is
    /// stable, so rows of equal size keep their incoming order.
    pub fn new(
        mut records: Vec<DnbRecord>,
        output_metrics: bool,
    ) -> Self {
        records.sort_by(|a, b| b.clustersize.cmp(&a.clustersize));
        Self {
            records,
            output_metrics,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether exports carry the metric columns or only `dnb`.
    pub fn output_metrics(&self) -> bool {
        self.output_metrics
    }

    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.dnb.as_str()).collect()
    }

    /// Distinct cluster ids, in table order.
    pub fn clusters(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.cluster) {
                seen.push(record.cluster);
            }
        }
        seen
    }

    pub fn iter(&self) -> impl Iterator<Item = &DnbRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<DnbRecord> {
        self.records
    }
}

/// Key of one dataset in a multi-run aggregation, typically a time point.
///
/// Integer keys order numerically, text keys lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeKey {
    Int(i64),
    Str(String),
}

impl TimeKey {
    /// Integers (optionally signed) become [`TimeKey::Int`], anything else is
    /// kept as text.
    pub fn parse(s: &str) -> Self {
        s.parse::<i64>()
            .map(TimeKey::Int)
            .unwrap_or_else(|_| TimeKey::Str(s.to_string()))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, TimeKey::Int(_))
    }
}

impl Display for TimeKey {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            TimeKey::Int(v) => write!(f, "{v}"),
            TimeKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl PartialOrd for TimeKey {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        match (self, other) {
            (TimeKey::Int(a), TimeKey::Int(b)) => a.cmp(b),
            (TimeKey::Str(a), TimeKey::Str(b)) => a.cmp(b),
            (TimeKey::Int(_), TimeKey::Str(_)) => Ordering::Less,
            (TimeKey::Str(_), TimeKey::Int(_)) => Ordering::Greater,
        }
    }
}

impl From<&str> for TimeKey {
    fn from(value: &str) -> Self {
        TimeKey::parse(value)
    }
}

impl From<i64> for TimeKey {
    fn from(value: i64) -> Self {
        TimeKey::Int(value)
    }
}

impl Serialize for TimeKey {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer, {
        match self {
            TimeKey::Int(v) => serializer.serialize_i64(*v),
            TimeKey::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// Rows of several runs, each tagged with its dataset key, grouped by run
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedResult {
    rows:           Vec<(TimeKey, DnbRecord)>,
    output_metrics: bool,
}

impl AggregatedResult {
    crate::getter_fn!(rows, Vec<(TimeKey, DnbRecord)>);

    pub fn new(output_metrics: bool) -> Self {
        Self {
            rows: Vec::new(),
            output_metrics,
        }
    }

    pub fn push_run(
        &mut self,
        key: TimeKey,
        result: DnbResult,
    ) {
        self.rows.extend(
            result
                .into_records()
                .into_iter()
                .map(|record| (key.clone(), record)),
        );
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn output_metrics(&self) -> bool {
        self.output_metrics
    }

    /// Records of one run, in table order.
    pub fn run(
        &self,
        key: &TimeKey,
    ) -> Vec<&DnbRecord> {
        self.rows
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, r)| r)
            .collect()
    }
}
