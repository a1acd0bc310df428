use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::Value;

/// Running count/sum/min/max over a stream of numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NumericSummary {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumericSummary {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(match self.min {
            Some(current) => current.min(value),
            None => value,
        });
        self.max = Some(match self.max {
            Some(current) => current.max(value),
            None => value,
        });
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

impl FromIterator<f64> for NumericSummary {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = NumericSummary::default();
        for value in iter {
            summary.add(value);
        }
        summary
    }
}

/// Per-key summaries, ordered by key. Null keys are skipped.
#[derive(Debug, Clone, Default)]
pub struct GroupedSummary {
    groups: BTreeMap<Value, NumericSummary>,
}

impl GroupedSummary {
    pub fn add(&mut self, key: Option<&Value>, value: f64) {
        if let Some(key) = key {
            self.groups.entry(key.clone()).or_default().add(value);
        }
    }

    pub fn into_groups(self) -> Vec<(Value, NumericSummary)> {
        self.groups.into_iter().collect()
    }
}
