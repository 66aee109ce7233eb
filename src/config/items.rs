//! CRUD shared by the schedule and user profile collections
//!
//! Both collections hold items with a system-assigned id, a user-assigned
//! number and an ordered segment list. Every operation here checks its
//! preconditions before touching the list, so a rejected call leaves the
//! collection exactly as it was.

use std::collections::HashSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::common::Segment;
use crate::collection::{BoundedVec, IdPolicy};
use crate::consts::MAX_SEGMENTS;
use crate::error::{ConfigError, Result};

pub type Segments = BoundedVec<Segment, MAX_SEGMENTS>;

/// Segment ids are renumbered 1, 2, 3 ... in stored order
pub const SEGMENT_IDS: IdPolicy = IdPolicy { start: 1, step: 1 };
/// A zero segment number is filled with max + 10
pub const SEGMENT_NUMBERS: IdPolicy = IdPolicy { start: 10, step: 10 };

/// An item of a keyed collection (schedule or user profile)
pub trait ModeItem: Clone + Serialize + DeserializeOwned {
    const COLLECTION: &'static str;
    const ID_FIELD: &'static str;
    const NUMBER_FIELD: &'static str;
    /// Key that may wrap a single item in JSON requests
    const WRAPPER: &'static str;
    const IDS: IdPolicy;

    fn id(&self) -> u16;
    fn set_id(&mut self, id: u16);
    fn number(&self) -> u16;
    fn segments(&self) -> &Segments;
    fn segments_mut(&mut self) -> &mut Segments;
}

/// Fill zero segment numbers, reject duplicates, then reissue segment ids
pub fn normalize_segments(segments: &mut Segments) -> Result<()> {
    for index in 0..segments.len() {
        if segments.get(index).is_some_and(|seg| seg.seg_no == 0) {
            let used = segments.iter().map(|seg| seg.seg_no).filter(|no| *no != 0);
            let no = SEGMENT_NUMBERS.next_id(used).ok_or(ConfigError::Capacity {
                collection: "segments",
                capacity: MAX_SEGMENTS,
            })?;
            if let Some(seg) = segments.get_mut(index) {
                seg.seg_no = no;
            }
        }
    }

    let mut seen = HashSet::new();
    for seg in segments.iter() {
        if !seen.insert(seg.seg_no) {
            return Err(ConfigError::DuplicateKey {
                collection: "segments",
                field: "segNo",
                value: seg.seg_no.to_string(),
            });
        }
    }

    let mut id = SEGMENT_IDS.start;
    for seg in segments.iter_mut() {
        seg.seg_id = id;
        id += SEGMENT_IDS.step;
    }
    Ok(())
}

fn check_number<T: ModeItem>(items: &[T], number: u16, skip_id: Option<u16>) -> Result<()> {
    if number == 0 {
        return Err(ConfigError::invalid(T::NUMBER_FIELD, "must be non-zero"));
    }
    let taken = items
        .iter()
        .filter(|item| Some(item.id()) != skip_id)
        .any(|item| item.number() == number);
    if taken {
        return Err(ConfigError::DuplicateKey {
            collection: T::COLLECTION,
            field: T::NUMBER_FIELD,
            value: number.to_string(),
        });
    }
    Ok(())
}

/// Append `item` under a freshly allocated id, returning that id
pub fn add_item<T: ModeItem, const N: usize>(list: &mut BoundedVec<T, N>, mut item: T) -> Result<u16> {
    if list.is_full() {
        return Err(ConfigError::Capacity {
            collection: T::COLLECTION,
            capacity: N,
        });
    }
    check_number(list.as_slice(), item.number(), None)?;
    normalize_segments(item.segments_mut())?;

    let id = T::IDS
        .next_id(list.iter().map(T::id))
        .ok_or(ConfigError::Capacity {
            collection: T::COLLECTION,
            capacity: N,
        })?;
    item.set_id(id);
    list.push(item).map_err(|_| ConfigError::Capacity {
        collection: T::COLLECTION,
        capacity: N,
    })?;
    Ok(id)
}

/// Replace the item with `id` (full replacement, id kept, segment ids reissued)
pub fn update_item<T: ModeItem, const N: usize>(
    list: &mut BoundedVec<T, N>,
    id: u16,
    mut item: T,
) -> Result<()> {
    let index = list
        .position_by_key(&id, T::id)
        .ok_or_else(|| not_found::<T>(id))?;
    check_number(list.as_slice(), item.number(), Some(id))?;
    normalize_segments(item.segments_mut())?;

    item.set_id(id);
    list.replace(index, item);
    Ok(())
}

pub fn remove_item<T: ModeItem, const N: usize>(list: &mut BoundedVec<T, N>, id: u16) -> Result<T> {
    let index = list
        .position_by_key(&id, T::id)
        .ok_or_else(|| not_found::<T>(id))?;
    list.remove_at(index).ok_or_else(|| not_found::<T>(id))
}

fn not_found<T: ModeItem>(id: u16) -> ConfigError {
    ConfigError::NotFound {
        collection: T::COLLECTION,
        key: format!("{}={}", T::ID_FIELD, id),
    }
}

/// Decode one item from a request body, bare or wrapped under `T::WRAPPER`
pub fn item_from_json<T: ModeItem>(doc: &Value) -> Result<T> {
    let body = doc
        .get(T::WRAPPER)
        .filter(|inner| inner.is_object())
        .unwrap_or(doc);
    if !body.is_object() {
        return Err(ConfigError::invalid(T::COLLECTION, "request body is not an object"));
    }
    T::deserialize(body).map_err(|e| ConfigError::invalid(T::COLLECTION, e.to_string()))
}

/// Integrity check for collections read from disk or about to be written
pub fn validate_items<T: ModeItem>(items: &[T]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut numbers = HashSet::new();
    for item in items {
        if item.id() == 0 {
            return Err(ConfigError::invalid(T::ID_FIELD, "must be non-zero"));
        }
        if !ids.insert(item.id()) {
            return Err(ConfigError::DuplicateKey {
                collection: T::COLLECTION,
                field: T::ID_FIELD,
                value: item.id().to_string(),
            });
        }
        if item.number() == 0 {
            return Err(ConfigError::invalid(T::NUMBER_FIELD, "must be non-zero"));
        }
        if !numbers.insert(item.number()) {
            return Err(ConfigError::DuplicateKey {
                collection: T::COLLECTION,
                field: T::NUMBER_FIELD,
                value: item.number().to_string(),
            });
        }

        let mut seg_nos = HashSet::new();
        for seg in item.segments() {
            if seg.seg_no == 0 || !seg_nos.insert(seg.seg_no) {
                return Err(ConfigError::invalid(
                    "segNo",
                    format!("{} {} has a zero or repeated segment number", T::ID_FIELD, item.id()),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(nos: &[u16]) -> Segments {
        let mut list = Segments::new();
        for no in nos {
            let seg = Segment {
                seg_no: *no,
                seg_id: 99,
                ..Default::default()
            };
            list.push(seg).unwrap();
        }
        list
    }

    #[test]
    fn test_zero_segment_numbers_are_filled() {
        let mut list = segments(&[0, 30, 0]);
        normalize_segments(&mut list).unwrap();
        let nos: Vec<u16> = list.iter().map(|s| s.seg_no).collect();
        assert_eq!(nos, vec![40, 30, 50]);
    }

    #[test]
    fn test_first_filled_segment_number_is_ten() {
        let mut list = segments(&[0]);
        normalize_segments(&mut list).unwrap();
        assert_eq!(list.get(0).map(|s| s.seg_no), Some(10));
    }

    #[test]
    fn test_segment_ids_are_reissued_in_order() {
        let mut list = segments(&[20, 10, 30]);
        normalize_segments(&mut list).unwrap();
        let ids: Vec<u16> = list.iter().map(|s| s.seg_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_segment_numbers_rejected() {
        let mut list = segments(&[10, 10]);
        assert!(matches!(
            normalize_segments(&mut list),
            Err(ConfigError::DuplicateKey { field: "segNo", .. })
        ));
    }
}
