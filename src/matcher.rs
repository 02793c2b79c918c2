// ABOUTME: Key-based set matcher used when merging submitted collections into persisted ones
// ABOUTME: Partitions two collections into delete, update-pair and create buckets by natural key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Key-based set matching.
//!
//! When an aggregate is updated as a whole, the client sends a replacement set
//! of nested items without reliable surrogate ids. The persisted and submitted
//! collections are therefore matched by a caller-supplied natural key, and the
//! result tells the reconciler which persisted items to drop, which pairs to
//! merge in place, and which submitted items are new.

use std::collections::HashMap;
use std::hash::Hash;

/// The three partitions produced by [`match_by_key`]
#[derive(Debug)]
pub struct KeyMatch<P, S> {
    /// Persisted items whose key has no counterpart in the submitted set
    pub to_delete: Vec<P>,
    /// Pairs of (persisted, submitted) items sharing a key
    pub to_update: Vec<(P, S)>,
    /// Submitted items whose key has no counterpart in the persisted set
    pub to_create: Vec<S>,
}

/// Match two collections by key equality.
///
/// Pure and order-independent: both inputs are treated as sets over the key,
/// and nothing outside the returned partitions is touched. Matching never
/// considers identity, only the extracted keys.
///
/// Duplicate keys are not rejected here (callers are expected to validate
/// natural-key uniqueness first). If one side does carry a duplicate key, the
/// shared key still pairs at least once: each persisted item claims the first
/// unclaimed submitted item with an equal key, and leftovers fall into the
/// delete/create partitions.
pub fn match_by_key<P, S, K, PK, SK>(
    persisted: Vec<P>,
    persisted_key: PK,
    submitted: Vec<S>,
    submitted_key: SK,
) -> KeyMatch<P, S>
where
    K: Eq + Hash,
    PK: Fn(&P) -> K,
    SK: Fn(&S) -> K,
{
    let mut unclaimed: Vec<Option<S>> = submitted.into_iter().map(Some).collect();

    let mut by_key: HashMap<K, usize> = HashMap::with_capacity(unclaimed.len());
    for (index, slot) in unclaimed.iter().enumerate() {
        if let Some(item) = slot {
            by_key.entry(submitted_key(item)).or_insert(index);
        }
    }

    let mut to_delete = Vec::new();
    let mut to_update = Vec::new();
    for item in persisted {
        let claimed = by_key
            .get(&persisted_key(&item))
            .and_then(|&index| unclaimed[index].take());
        match claimed {
            Some(submitted_item) => to_update.push((item, submitted_item)),
            None => to_delete.push(item),
        }
    }

    let to_create = unclaimed.into_iter().flatten().collect();

    KeyMatch {
        to_delete,
        to_update,
        to_create,
    }
}
