/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Ark Sovereign Compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

//! Persistent append-only list.
//!
//! Immutable once built, with structural sharing via Arc: `conj` returns a
//! new list that shares every existing node with the original, so cloning a
//! list (or keeping an old version around as a snapshot) is O(1).

use std::fmt;
use std::sync::Arc;

struct Node<T> {
    value: T,
    prev: Option<Arc<Node<T>>>,
}

/// A persistent list that grows at the end.
///
/// Nodes point backwards from the most recent element, so appending never
/// touches existing nodes.
pub struct PList<T> {
    last: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> PList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { last: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return a NEW list with the element appended.
    pub fn conj(&self, value: T) -> Self {
        Self {
            last: Some(Arc::new(Node {
                value,
                prev: self.last.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Iterate from the most recent element back to the first.
    pub fn iter_rev(&self) -> PListRevIter<'_, T> {
        PListRevIter {
            node: self.last.as_deref(),
        }
    }
}

impl<T: Clone> PList<T> {
    /// Convert to a Vec in insertion order (snapshot).
    pub fn to_vec(&self) -> Vec<T> {
        let mut items: Vec<T> = self.iter_rev().cloned().collect();
        items.reverse();
        items
    }
}

/// Iterator for PList, newest first.
pub struct PListRevIter<'a, T> {
    node: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for PListRevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.prev.as_deref();
        Some(&node.value)
    }
}

impl<T> Clone for PList<T> {
    fn clone(&self) -> Self {
        Self {
            last: self.last.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for PList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Unlink uniquely owned nodes one by one so long lists don't recurse on drop.
impl<T> Drop for PList<T> {
    fn drop(&mut self) {
        let mut next = self.last.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T: PartialEq> PartialEq for PList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        match (&self.last, &other.last) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            _ => self.iter_rev().zip(other.iter_rev()).all(|(a, b)| a == b),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<&T> = self.iter_rev().collect();
        items.reverse();
        f.debug_list().entries(items).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list<T>(items: impl IntoIterator<Item = T>) -> PList<T> {
        items.into_iter().fold(PList::new(), |l, value| l.conj(value))
    }

    #[test]
    fn test_plist_empty() {
        let l: PList<u64> = PList::new();
        assert_eq!(l.len(), 0);
        assert!(l.is_empty());
        assert!(l.to_vec().is_empty());
    }

    #[test]
    fn test_plist_conj_immutability() {
        let l1 = PList::new();
        let l2 = l1.conj(1);
        let l3 = l2.conj(2);

        // Older versions unchanged
        assert_eq!(l1.len(), 0);
        assert_eq!(l2.to_vec(), vec![1]);
        assert_eq!(l3.to_vec(), vec![1, 2]);
        assert_eq!(l3.iter_rev().next(), Some(&2));
    }

    #[test]
    fn test_plist_branching_versions() {
        let base: PList<&str> = list(["a", "b"]);
        let left = base.conj("left");
        let right = base.conj("right");

        assert_eq!(left.to_vec(), vec!["a", "b", "left"]);
        assert_eq!(right.to_vec(), vec!["a", "b", "right"]);
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_plist_equality() {
        let l1: PList<u64> = list([1, 2]);
        let l2: PList<u64> = list([1, 2]);
        let l3: PList<u64> = list([1, 3]);

        assert_eq!(l1, l2);
        assert_ne!(l1, l3);
        assert_eq!(l1, l1.clone());
        assert_eq!(format!("{:?}", l1), "[1, 2]");
    }

    #[test]
    fn test_plist_long_list_drops() {
        let mut l = PList::new();
        for i in 0..200_000u64 {
            l = l.conj(i);
        }
        assert_eq!(l.len(), 200_000);
        drop(l);
    }
}
