//! Capacity-bounded collections shared by every section
//!
//! Sections keep their entries in a [`BoundedVec`]: an ordered list whose
//! length never exceeds a compile-time capacity. The free functions here are
//! the building blocks the sections use for CRUD (lazy allocation, lookup by
//! key, compacting delete, id allocation).

use std::collections::TryReserveError;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered list holding at most `N` entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedVec<T, const N: usize> {
    items: Vec<T>,
}

impl<T, const N: usize> Default for BoundedVec<T, N> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T, const N: usize> BoundedVec<T, N> {
    pub const CAPACITY: usize = N;

    /// Create empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the full backing storage up front, reporting allocation failure
    pub fn try_reserve_full(&mut self) -> Result<(), TryReserveError> {
        if self.items.capacity() < N {
            self.items.try_reserve_exact(N - self.items.len())?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= N
    }

    /// Append an entry; hands it back when the list is already full
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Compacting delete, see [`remove_compacting`]
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        remove_compacting(&mut self.items, index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Overwrite the entry at `index`, returning the previous one
    pub fn replace(&mut self, index: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, item))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Index of the first entry whose key equals `target`
    pub fn position_by_key<K: PartialEq>(&self, target: &K, key: impl Fn(&T) -> K) -> Option<usize> {
        find_by_key(Some(self.as_slice()), target, key)
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a BoundedVec<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T, const N: usize> TryFrom<Vec<T>> for BoundedVec<T, N> {
    type Error = Vec<T>;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        if items.len() > N {
            return Err(items);
        }
        Ok(Self { items })
    }
}

impl<T: Serialize, const N: usize> Serialize for BoundedVec<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for BoundedVec<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoundedVisitor<T, const N: usize>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>, const N: usize> Visitor<'de> for BoundedVisitor<T, N> {
            type Value = BoundedVec<T, N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a sequence of at most {} entries", N)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(N));
                while let Some(item) = seq.next_element()? {
                    if items.len() >= N {
                        return Err(serde::de::Error::invalid_length(items.len() + 1, &self));
                    }
                    items.push(item);
                }
                Ok(BoundedVec { items })
            }
        }

        deserializer.deserialize_seq(BoundedVisitor::<T, N>(PhantomData))
    }
}

/// Allocate and default-initialize `slot` if it is still empty.
///
/// Returns `None` (leaving the slot empty) when the initializer reports an
/// allocation failure.
pub fn ensure_allocated<T, E>(
    slot: &mut Option<T>,
    init: impl FnOnce() -> Result<T, E>,
) -> Option<&mut T> {
    if slot.is_none() {
        match init() {
            Ok(value) => *slot = Some(value),
            Err(_) => return None,
        }
    }
    slot.as_mut()
}

/// Linear scan for the first entry whose extracted key equals `target`.
///
/// An absent backing list is simply "not found".
pub fn find_by_key<T, K: PartialEq>(
    items: Option<&[T]>,
    target: &K,
    key: impl Fn(&T) -> K,
) -> Option<usize> {
    items?.iter().position(|item| key(item) == *target)
}

/// Remove `index`, shifting later entries left so stored order is preserved.
///
/// Out-of-range indices (including any index into an empty list) are
/// rejected without touching the list.
pub fn remove_compacting<T>(items: &mut Vec<T>, index: usize) -> Option<T> {
    if items.is_empty() || index >= items.len() {
        return None;
    }
    Some(items.remove(index))
}

/// Numeric id grid used when the system assigns identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPolicy {
    pub start: u16,
    pub step: u16,
}

impl IdPolicy {
    /// Next id after the largest existing one.
    ///
    /// Falls back to the lowest unused id on the grid when the increment
    /// would overflow; `None` when the grid is exhausted.
    pub fn next_id(&self, existing: impl Iterator<Item = u16> + Clone) -> Option<u16> {
        let max = existing.clone().max();
        let candidate = match max {
            None => Some(self.start),
            Some(max) if max < self.start => Some(self.start),
            Some(max) => max.checked_add(self.step),
        };
        if let Some(id) = candidate {
            return Some(id);
        }

        let mut id = self.start;
        loop {
            if !existing.clone().any(|used| used == id) {
                return Some(id);
            }
            id = id.checked_add(self.step)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_capacity() {
        let mut list: BoundedVec<u32, 2> = BoundedVec::new();
        assert!(list.push(1).is_ok());
        assert!(list.push(2).is_ok());
        assert_eq!(list.push(3), Err(3));
        assert_eq!(list.len(), 2);
        assert!(list.is_full());
    }

    #[test]
    fn test_remove_compacting_preserves_order() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        assert_eq!(remove_compacting(&mut items, 1), Some('b'));
        assert_eq!(items, vec!['a', 'c', 'd']);
    }

    #[test]
    fn test_remove_compacting_rejects_bad_index() {
        let mut items = vec![1, 2, 3];
        assert_eq!(remove_compacting(&mut items, 3), None);
        assert_eq!(items, vec![1, 2, 3]);

        let mut empty: Vec<u8> = Vec::new();
        assert_eq!(remove_compacting(&mut empty, 0), None);
    }

    #[test]
    fn test_find_by_key() {
        let items = [(10u16, "a"), (20, "b"), (20, "c")];
        assert_eq!(find_by_key(Some(&items[..]), &20, |e| e.0), Some(1));
        assert_eq!(find_by_key(Some(&items[..]), &30, |e| e.0), None);
        assert_eq!(find_by_key::<(u16, &str), u16>(None, &10, |e| e.0), None);
    }

    #[test]
    fn test_ensure_allocated() {
        let mut slot: Option<Vec<u8>> = None;
        let failed = ensure_allocated(&mut slot, || Err::<Vec<u8>, ()>(()));
        assert!(failed.is_none());
        assert!(slot.is_none());

        let value = ensure_allocated(&mut slot, || Ok::<_, ()>(vec![7]));
        assert_eq!(value.map(|v| v[0]), Some(7));

        // second call keeps the existing value
        let value = ensure_allocated(&mut slot, || Ok::<_, ()>(vec![9]));
        assert_eq!(value.map(|v| v[0]), Some(7));
    }

    #[test]
    fn test_id_policy_steps_from_max() {
        let policy = IdPolicy { start: 10, step: 10 };
        assert_eq!(policy.next_id([].into_iter()), Some(10));
        assert_eq!(policy.next_id([10, 30, 20].into_iter()), Some(40));
    }

    #[test]
    fn test_id_policy_reuses_gap_on_overflow() {
        let policy = IdPolicy { start: 1, step: 1 };
        assert_eq!(policy.next_id([1, u16::MAX].into_iter()), Some(2));
    }

    #[test]
    fn test_deserialize_rejects_overflow() {
        let ok: Result<BoundedVec<u8, 2>, _> = serde_json::from_str("[1,2]");
        assert!(ok.is_ok());
        let too_many: Result<BoundedVec<u8, 2>, _> = serde_json::from_str("[1,2,3]");
        assert!(too_many.is_err());
    }
}
