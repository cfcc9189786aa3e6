use alloc::vec::Vec;

/// A distinct key paired with the number of times it occurs in a multiset.
///
/// Produced only as query output by the top-K frequency query; never stored
/// inside a tree. Result slots are `Option<KeyFrequency>` so that an absent
/// slot can never be confused with a genuine key `0` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFrequency {
    /// The key value
    pub key: i32,
    /// Number of occurrences of the key
    pub frequency: u32,
}

/// Dense scratch table tallying distinct keys and their frequencies.
///
/// Both tree engines feed this table through a per-key callback during a
/// plain in-order walk, which keeps the selection logic tree-agnostic.
/// Because keys arrive in ascending order, equal keys are adjacent and the
/// table ends up ordered by key, giving the top-K selection a deterministic
/// tie-break: among equal frequencies the smallest key wins.
///
/// Lookup is a linear scan over the entries tallied so far. That is the
/// accepted quadratic worst case of this design; the stable tie behavior of
/// [`FrequencyTable::into_top_k`] depends on the resulting entry order, so
/// the scan is not to be replaced with a hash lookup.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    /// Distinct `(key, frequency)` entries in order of first occurrence
    entries: Vec<KeyFrequency>,
    /// Caller-supplied bound on the number of distinct keys
    capacity: usize,
}

impl FrequencyTable {
    /// Creates an empty table bounded to `capacity` distinct keys.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Upper bound on the number of distinct keys that will
    ///   be recorded; must be at least the number of distinct keys present
    ///   in the traversed tree
    ///
    /// # Returns
    ///
    /// * `Self` - The empty frequency table
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Records one occurrence of `key`.
    ///
    /// Scans the entries tallied so far for a matching key and increments
    /// its frequency, or appends a fresh entry with frequency 1.
    ///
    /// # Panics
    ///
    /// Panics when a new distinct key would exceed the capacity the table
    /// was created with. Overrunning the bound would silently corrupt the
    /// result, so the check fails fast instead.
    ///
    /// # Arguments
    ///
    /// * `key` - The key whose occurrence to tally
    pub fn record(&mut self, key: i32) {
        for entry in self.entries.iter_mut() {
            if entry.key == key {
                entry.frequency += 1;
                return;
            }
        }

        assert!(
            self.entries.len() < self.capacity,
            "frequency table capacity exceeded: more than {} distinct keys",
            self.capacity
        );
        self.entries.push(KeyFrequency { key, frequency: 1 });
    }

    /// Returns the number of distinct keys tallied so far.
    ///
    /// # Returns
    ///
    /// * `usize` - The number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no key has been recorded yet.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the table and extracts the `k` most frequent keys.
    ///
    /// Performs `k` repeated max-scans: each pass selects the first entry
    /// holding the current maximum frequency (first occurrence wins ties,
    /// i.e. the smallest key, since entries are in ascending key order),
    /// copies it into the result and zeroes its frequency so it cannot be
    /// selected again. When fewer than `k` distinct keys exist, the
    /// trailing slots are `None`.
    ///
    /// # Arguments
    ///
    /// * `k` - Number of result slots to produce
    ///
    /// # Returns
    ///
    /// * `Vec<Option<KeyFrequency>>` - Exactly `k` slots, most frequent
    ///   first
    pub fn into_top_k(mut self, k: usize) -> Vec<Option<KeyFrequency>> {
        let mut result = Vec::with_capacity(k);

        for _ in 0..k {
            let mut max_freq = 0;
            let mut max_idx = None;

            for (idx, entry) in self.entries.iter().enumerate() {
                if entry.frequency > max_freq {
                    max_freq = entry.frequency;
                    max_idx = Some(idx);
                }
            }

            match max_idx {
                Some(idx) => {
                    result.push(Some(self.entries[idx]));
                    self.entries[idx].frequency = 0;
                }
                None => result.push(None),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_all(table: &mut FrequencyTable, keys: &[i32]) {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        for key in sorted {
            table.record(key);
        }
    }

    #[test]
    fn test_empty_table() {
        let table = FrequencyTable::with_capacity(4);
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());
        assert_eq!(table.into_top_k(3), vec![None, None, None]);
    }

    #[test]
    fn test_zero_k() {
        let mut table = FrequencyTable::with_capacity(4);
        table.record(1);
        assert_eq!(table.into_top_k(0), vec![]);
    }

    #[test]
    fn test_tally_and_select() {
        let mut table = FrequencyTable::with_capacity(4);
        record_all(&mut table, &[5, 3, 8, 3, 1]);
        assert_eq!(table.len(), 4);

        let top = table.into_top_k(2);
        assert_eq!(
            top[0],
            Some(KeyFrequency {
                key: 3,
                frequency: 2
            })
        );
        // Remaining keys all have frequency 1; the smallest wins the tie.
        assert_eq!(
            top[1],
            Some(KeyFrequency {
                key: 1,
                frequency: 1
            })
        );
    }

    #[test]
    fn test_ties_resolve_to_smallest_key() {
        let mut table = FrequencyTable::with_capacity(3);
        record_all(&mut table, &[7, 2, 9, 2, 7, 9]);

        let top = table.into_top_k(3);
        assert_eq!(
            top,
            vec![
                Some(KeyFrequency {
                    key: 2,
                    frequency: 2
                }),
                Some(KeyFrequency {
                    key: 7,
                    frequency: 2
                }),
                Some(KeyFrequency {
                    key: 9,
                    frequency: 2
                }),
            ]
        );
    }

    #[test]
    fn test_more_slots_than_distinct_keys() {
        let mut table = FrequencyTable::with_capacity(2);
        record_all(&mut table, &[4, 4, 6]);

        let top = table.into_top_k(4);
        assert_eq!(
            top[0],
            Some(KeyFrequency {
                key: 4,
                frequency: 2
            })
        );
        assert_eq!(
            top[1],
            Some(KeyFrequency {
                key: 6,
                frequency: 1
            })
        );
        assert_eq!(top[2], None);
        assert_eq!(top[3], None);
    }

    #[test]
    fn test_key_zero_is_distinguishable_from_absent() {
        let mut table = FrequencyTable::with_capacity(1);
        table.record(0);

        let top = table.into_top_k(2);
        assert_eq!(
            top[0],
            Some(KeyFrequency {
                key: 0,
                frequency: 1
            })
        );
        assert_eq!(top[1], None);
    }

    #[test]
    #[should_panic(expected = "frequency table capacity exceeded")]
    fn test_capacity_exceeded_fails_fast() {
        let mut table = FrequencyTable::with_capacity(2);
        table.record(1);
        table.record(2);
        table.record(3);
    }

    #[test]
    fn test_duplicates_do_not_consume_capacity() {
        let mut table = FrequencyTable::with_capacity(1);
        for _ in 0..100 {
            table.record(42);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.into_top_k(1),
            vec![Some(KeyFrequency {
                key: 42,
                frequency: 100
            })]
        );
    }
}
