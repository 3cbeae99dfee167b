use crate::{
    error::HepceError,
    hashing::{HashMap, HashMapExt},
};
use serde::Deserialize;
use std::{fmt::Debug, hash::Hash};

/// Tolerance for probability partitions that must sum to one.
pub const PARTITION_TOLERANCE: f64 = 1e-6;

/// A row-level check run when parameters are validated.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub(crate) fn check_probability(name: &str, p: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(format!("{name} probability {p} is outside [0, 1]"))
    }
}

pub(crate) fn check_utility(u: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&u) {
        Ok(())
    } else {
        Err(format!("utility {u} is outside [0, 1]"))
    }
}

pub(crate) fn check_cost(c: f64) -> Result<(), String> {
    if c.is_finite() && c >= 0.0 {
        Ok(())
    } else {
        Err(format!("cost {c} must be a non-negative number"))
    }
}

/// Every entry must be a probability and the entries must sum to one.
pub(crate) fn check_partition(probabilities: &[f64]) -> Result<(), String> {
    for p in probabilities {
        check_probability("partition", *p)?;
    }
    let sum: f64 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PARTITION_TOLERANCE {
        return Err(format!("probabilities sum to {sum}, not 1"));
    }
    Ok(())
}

/// One row of a table as it appears in a parameter file: the key fields followed by the value
/// fields, all at the same level.
#[derive(Deserialize)]
struct TableRow<K, V> {
    #[serde(flatten)]
    key: K,
    #[serde(flatten)]
    value: V,
}

/// A read-only map from a covariate key to the parameters for that covariate combination.
///
/// A key that is absent is a configuration error, reported by [`LookupTable::require`] with the
/// table's name and the key that was asked for.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "Vec<TableRow<K, V>>")]
#[serde(bound(deserialize = "K: Deserialize<'de> + Eq + Hash + Debug, V: Deserialize<'de>"))]
pub struct LookupTable<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for LookupTable<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, V> Default for LookupTable<K, V> {
    fn default() -> Self {
        LookupTable {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Debug, V> LookupTable<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row, refusing a key that is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), HepceError> {
        if self.entries.contains_key(&key) {
            return Err(HepceError::DuplicateEntry {
                key: format!("{key:?}"),
            });
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Adds or replaces a row.
    pub fn set(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn require(&self, table: &'static str, key: &K) -> Result<&V, HepceError> {
        self.entries
            .get(key)
            .ok_or_else(|| HepceError::missing_entry(table, key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut()
    }
}

impl<K: Eq + Hash + Debug, V: Validate> LookupTable<K, V> {
    /// Validates every row, naming the table and key of the first bad one.
    pub fn validate(&self, table: &'static str) -> Result<(), HepceError> {
        for (key, value) in &self.entries {
            value
                .validate()
                .map_err(|reason| HepceError::invalid_parameter(format!("{table} {key:?}"), reason))?;
        }
        Ok(())
    }
}

impl<K: Eq + Hash + Debug, V> TryFrom<Vec<TableRow<K, V>>> for LookupTable<K, V> {
    type Error = HepceError;

    fn try_from(rows: Vec<TableRow<K, V>>) -> Result<Self, Self::Error> {
        let mut table = LookupTable::new();
        for row in rows {
            table.insert(row.key, row.value)?;
        }
        Ok(table)
    }
}

/// Later rows replace earlier rows with the same key.
impl<K: Eq + Hash, V> FromIterator<(K, V)> for LookupTable<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LookupTable {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::keys::DemographicKey;
    use crate::parameters::values::{BehaviorTransition, Probability};
    use crate::state::{Behavior, Sex};

    #[test]
    fn deserializes_flat_rows() {
        let json = r#"[
            {"age_years": 20, "sex": "male", "behavior": "injection", "probability": 0.05},
            {"age_years": 20, "sex": "female", "behavior": "never", "probability": 0.0}
        ]"#;
        let table: LookupTable<DemographicKey, Probability> = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);

        let key = DemographicKey {
            age_years: 20,
            sex: Sex::Male,
            behavior: Behavior::Injection,
        };
        assert_eq!(table.require("hcv.incidence", &key).unwrap().probability, 0.05);
    }

    #[test]
    fn tables_compare_by_rows() {
        let key = DemographicKey {
            age_years: 20,
            sex: Sex::Male,
            behavior: Behavior::Injection,
        };
        let mut first = LookupTable::new();
        first.set(key, Probability { probability: 0.05 });
        let mut second = first.clone();
        assert_eq!(first, second);

        second.set(key, Probability { probability: 0.06 });
        assert_ne!(first, second);
        assert_ne!(first, LookupTable::new());
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let json = r#"[
            {"age_years": 20, "sex": "male", "behavior": "injection", "probability": 0.05},
            {"age_years": 20, "sex": "male", "behavior": "injection", "probability": 0.06}
        ]"#;
        let result: Result<LookupTable<DemographicKey, Probability>, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_key_names_table_and_key() {
        let table: LookupTable<DemographicKey, Probability> = LookupTable::new();
        let key = DemographicKey {
            age_years: 33,
            sex: Sex::Female,
            behavior: Behavior::Never,
        };
        let err = table.require("background.mortality", &key).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("background.mortality"));
        assert!(message.contains("33"));
    }

    #[test]
    fn partitions_must_sum_to_one() {
        let mut table = LookupTable::new();
        table.set(
            Behavior::Injection,
            BehaviorTransition {
                never: 0.0,
                former_noninjection: 0.0,
                former_injection: 0.1,
                noninjection: 0.0,
                injection: 0.9,
            },
        );
        assert!(table.validate("behavior.transitions").is_ok());

        table.set(
            Behavior::Never,
            BehaviorTransition {
                never: 0.5,
                former_noninjection: 0.0,
                former_injection: 0.0,
                noninjection: 0.0,
                injection: 0.4,
            },
        );
        let err = table.validate("behavior.transitions").unwrap_err();
        assert!(matches!(err, HepceError::InvalidParameter { .. }));
    }

    #[test]
    fn partition_tolerance() {
        assert!(check_partition(&[0.3, 0.3, 0.4 + 5e-7]).is_ok());
        assert!(check_partition(&[0.3, 0.3, 0.41]).is_err());
        assert!(check_partition(&[1.2, -0.2]).is_err());
    }
}
