//! Key Classification Module
//!
//! Splits a batch of keys into present and missing subsets from one bulk
//! existence reply.

use crate::error::{CacheError, Result};

// == Existence Set ==
/// Present and missing keys of one bulk existence check.
///
/// Every input position lands in exactly one of the two lists, in input order.
/// Duplicate input keys are kept once per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistenceSet {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl ExistenceSet {
    /// Pairs each key with its existence flag.
    ///
    /// Fails if the backend answered with a different number of flags than
    /// keys were asked for, since the pairing would then be meaningless.
    pub fn partition(keys: Vec<String>, flags: Vec<bool>) -> Result<Self> {
        if keys.len() != flags.len() {
            return Err(CacheError::backend(format!(
                "existence reply has {} entries for {} keys",
                flags.len(),
                keys.len()
            )));
        }

        let mut set = Self {
            present: Vec::with_capacity(keys.len()),
            missing: Vec::new(),
        };
        for (key, exists) in keys.into_iter().zip(flags) {
            if exists {
                set.present.push(key);
            } else {
                set.missing.push(key);
            }
        }
        Ok(set)
    }

    /// Total number of classified keys.
    pub fn len(&self) -> usize {
        self.present.len() + self.missing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_partition() {
        let set = ExistenceSet::partition(keys(&["a", "b", "c"]), vec![true, false, true]).unwrap();

        assert_eq!(set.present, keys(&["a", "c"]));
        assert_eq!(set.missing, keys(&["b"]));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_partition_empty() {
        let set = ExistenceSet::partition(Vec::new(), Vec::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_partition_keeps_duplicates_per_position() {
        let set = ExistenceSet::partition(keys(&["a", "a", "b"]), vec![true, true, false]).unwrap();

        assert_eq!(set.present, keys(&["a", "a"]));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_partition_length_mismatch() {
        let err = ExistenceSet::partition(keys(&["a", "b"]), vec![true]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }
}
