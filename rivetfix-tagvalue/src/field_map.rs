/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Ordered field container.
//!
//! A tag holds either a plain field or a list of repeating-group instances,
//! never both: setting a plain field over a group list replaces the list and
//! vice versa. The NumInGroup value of a group list is derived from the
//! instance count when the map is serialized.
//!
//! Setters keep each tag once. A parsed container may hold a plain tag more
//! than once when the input repeated it, as a repeating group read without
//! a schema does. Getters see the first occurrence and every occurrence is
//! serialized in arrival order.
//!
//! Fields serialize in the container's field order when one is set, then in
//! insertion order.

use crate::encoder::Encoder;
use crate::field::Field;
use crate::group::Group;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rivetfix_core::error::FieldError;
use rivetfix_core::field as conv;
use rivetfix_core::types::TimestampPrecision;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Field(Field),
    Groups {
        count_tag: u32,
        declared: Option<usize>,
        instances: Vec<Group>,
    },
}

impl Slot {
    const fn tag(&self) -> u32 {
        match self {
            Self::Field(field) => field.tag(),
            Self::Groups { count_tag, .. } => *count_tag,
        }
    }

    fn write_to(&self, encoder: &mut Encoder) {
        match self {
            Self::Field(field) => encoder.put_raw(field.tag(), field.value()),
            Self::Groups {
                count_tag,
                instances,
                ..
            } => {
                encoder.put_uint(*count_tag, instances.len() as u64);
                for group in instances {
                    group.write_to(encoder);
                }
            }
        }
    }
}

/// A borrowed view of one tag of a [`FieldMap`].
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    /// A plain field.
    Field(&'a Field),
    /// A repeating group.
    Groups {
        /// NumInGroup tag.
        count_tag: u32,
        /// NumInGroup value read off the wire, if the group was parsed.
        declared: Option<usize>,
        /// Group instances.
        instances: &'a [Group],
    },
}

impl Entry<'_> {
    /// Returns the tag of this entry.
    #[must_use]
    pub const fn tag(&self) -> u32 {
        match self {
            Self::Field(field) => field.tag(),
            Self::Groups { count_tag, .. } => *count_tag,
        }
    }
}

/// Serialization layout for one section of a message.
pub(crate) struct Ordering<'a> {
    /// Tags written first, in this order.
    pub lead: &'a [u32],
    /// Tags written last, in this order.
    pub tail: &'a [u32],
    /// Tags never written.
    pub skip: &'a [u32],
}

impl Ordering<'_> {
    fn places(&self, tag: u32) -> bool {
        self.lead.contains(&tag) || self.tail.contains(&tag) || self.skip.contains(&tag)
    }
}

/// Ordered tag → value container with nested repeating groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    slots: SmallVec<[Slot; 8]>,
    field_order: Option<Arc<[u32]>>,
}

impl FieldMap {
    /// Creates an empty container serialized in insertion order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container serialized in `order` first.
    #[must_use]
    pub fn with_field_order(order: Arc<[u32]>) -> Self {
        Self {
            slots: SmallVec::new(),
            field_order: Some(order),
        }
    }

    /// Returns the preferred serialization order, if any.
    #[must_use]
    pub fn field_order(&self) -> Option<&Arc<[u32]>> {
        self.field_order.as_ref()
    }

    /// Number of entries held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when no tag is held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Removes every field and group.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn position(&self, tag: u32) -> Option<usize> {
        self.slots.iter().position(|slot| slot.tag() == tag)
    }

    fn slot(&self, tag: u32) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.tag() == tag)
    }

    fn slots_for(&self, tag: u32) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(move |slot| slot.tag() == tag)
    }

    /// Drops every entry for `tag` except the one at `keep`.
    fn drop_repeats(&mut self, tag: u32, keep: usize) {
        let mut index = 0;
        self.slots.retain(|slot| {
            let retained = index == keep || slot.tag() != tag;
            index += 1;
            retained
        });
    }

    /// Returns true if `tag` holds a field or a group list.
    #[inline]
    #[must_use]
    pub fn is_set(&self, tag: u32) -> bool {
        self.position(tag).is_some()
    }

    /// Removes whatever `tag` holds, every occurrence included.
    ///
    /// # Returns
    /// True if something was removed.
    pub fn remove(&mut self, tag: u32) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.tag() != tag);
        self.slots.len() != before
    }

    /// Stores a field, replacing whatever the tag held.
    pub fn set(&mut self, field: Field) {
        let tag = field.tag();
        match self.position(tag) {
            Some(index) => {
                self.slots[index] = Slot::Field(field);
                self.drop_repeats(tag, index);
            }
            None => self.slots.push(Slot::Field(field)),
        }
    }

    /// Appends a field after whatever the tag already holds.
    pub(crate) fn append(&mut self, field: Field) {
        self.slots.push(Slot::Field(field));
    }

    /// Stores a raw value.
    pub fn set_field(&mut self, tag: u32, value: impl Into<Bytes>) {
        self.set(Field::new(tag, value));
    }

    /// Stores a string value.
    pub fn set_str(&mut self, tag: u32, value: &str) {
        self.set_field(tag, Bytes::copy_from_slice(value.as_bytes()));
    }

    /// Stores a signed integer.
    pub fn set_int(&mut self, tag: u32, value: i64) {
        let mut buf = itoa::Buffer::new();
        self.set_str(tag, buf.format(value));
    }

    /// Stores an unsigned integer.
    pub fn set_u64(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.set_str(tag, buf.format(value));
    }

    /// Stores a single character.
    pub fn set_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        self.set_str(tag, value.encode_utf8(&mut buf));
    }

    /// Stores a FIX boolean.
    pub fn set_bool(&mut self, tag: u32, value: bool) {
        self.set_field(tag, conv::format_bool(value));
    }

    /// Stores a decimal, keeping its scale.
    pub fn set_decimal(&mut self, tag: u32, value: &Decimal) {
        self.set_str(tag, &value.to_string());
    }

    /// Stores a UTC timestamp at the given precision.
    pub fn set_utc_timestamp(
        &mut self,
        tag: u32,
        value: &DateTime<Utc>,
        precision: TimestampPrecision,
    ) {
        self.set_str(tag, &conv::format_utc_timestamp(value, precision));
    }

    /// Stores a UTC date.
    pub fn set_utc_date_only(&mut self, tag: u32, value: &NaiveDate) {
        self.set_str(tag, &conv::format_utc_date_only(value));
    }

    /// Stores a UTC time of day at the given precision.
    pub fn set_utc_time_only(
        &mut self,
        tag: u32,
        value: &NaiveTime,
        precision: TimestampPrecision,
    ) {
        self.set_str(tag, &conv::format_utc_time_only(value, precision));
    }

    /// Returns the plain field stored under `tag`.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&Field> {
        match self.slot(tag)? {
            Slot::Field(field) => Some(field),
            Slot::Groups { .. } => None,
        }
    }

    /// Returns the raw value of the plain field stored under `tag`.
    #[must_use]
    pub fn value(&self, tag: u32) -> Option<&[u8]> {
        self.get(tag).map(Field::value)
    }

    /// Returns every plain field stored under `tag`, in arrival order.
    pub fn get_all(&self, tag: u32) -> impl Iterator<Item = &Field> {
        self.slots_for(tag).filter_map(|slot| match slot {
            Slot::Field(field) => Some(field),
            Slot::Groups { .. } => None,
        })
    }

    fn require(&self, tag: u32) -> Result<&Field, FieldError> {
        self.get(tag).ok_or(FieldError::NotFound { tag })
    }

    /// Reads a string field.
    ///
    /// # Errors
    /// [`FieldError::NotFound`] when absent, [`FieldError::Conversion`] when
    /// the value does not convert. The same holds for every typed getter.
    pub fn get_str(&self, tag: u32) -> Result<&str, FieldError> {
        self.require(tag)?.as_str()
    }

    /// Reads a character field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_char(&self, tag: u32) -> Result<char, FieldError> {
        self.require(tag)?.as_char()
    }

    /// Reads a signed integer field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_int(&self, tag: u32) -> Result<i64, FieldError> {
        self.require(tag)?.as_int()
    }

    /// Reads an unsigned integer field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_u64(&self, tag: u32) -> Result<u64, FieldError> {
        self.require(tag)?.as_u64()
    }

    /// Reads a decimal field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_decimal(&self, tag: u32) -> Result<Decimal, FieldError> {
        self.require(tag)?.as_decimal()
    }

    /// Reads a boolean field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_bool(&self, tag: u32) -> Result<bool, FieldError> {
        self.require(tag)?.as_bool()
    }

    /// Reads a UTC timestamp field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_utc_timestamp(&self, tag: u32) -> Result<DateTime<Utc>, FieldError> {
        self.require(tag)?.as_utc_timestamp()
    }

    /// Reads a UTC date field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_utc_date_only(&self, tag: u32) -> Result<NaiveDate, FieldError> {
        self.require(tag)?.as_utc_date_only()
    }

    /// Reads a UTC time-of-day field.
    ///
    /// # Errors
    /// See [`FieldMap::get_str`].
    pub fn get_utc_time_only(&self, tag: u32) -> Result<NaiveTime, FieldError> {
        self.require(tag)?.as_utc_time_only()
    }

    /// Iterates plain fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Field(field) => Some(field),
            Slot::Groups { .. } => None,
        })
    }

    /// Iterates every entry, fields and groups, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.slots.iter().map(|slot| match slot {
            Slot::Field(field) => Entry::Field(field),
            Slot::Groups {
                count_tag,
                declared,
                instances,
            } => Entry::Groups {
                count_tag: *count_tag,
                declared: *declared,
                instances,
            },
        })
    }

    /// Appends a group instance under its count tag.
    ///
    /// A plain field previously stored under the count tag is replaced.
    pub fn add_group(&mut self, group: Group) {
        let count_tag = group.count_tag();
        let Some(index) = self.position(count_tag) else {
            self.slots.push(Slot::Groups {
                count_tag,
                declared: None,
                instances: vec![group],
            });
            return;
        };
        if let Slot::Groups { instances, .. } = &mut self.slots[index] {
            instances.push(group);
            return;
        }
        self.slots[index] = Slot::Groups {
            count_tag,
            declared: None,
            instances: vec![group],
        };
    }

    pub(crate) fn set_groups(&mut self, count_tag: u32, declared: usize, instances: Vec<Group>) {
        let slot = Slot::Groups {
            count_tag,
            declared: Some(declared),
            instances,
        };
        match self.position(count_tag) {
            Some(index) => self.slots[index] = slot,
            None => self.slots.push(slot),
        }
    }

    /// Returns every instance of the group counted by `count_tag`.
    #[must_use]
    pub fn groups(&self, count_tag: u32) -> &[Group] {
        match self.slot(count_tag) {
            Some(Slot::Groups { instances, .. }) => instances,
            _ => &[],
        }
    }

    /// Returns instance `index` (0-based) of a group.
    #[must_use]
    pub fn group(&self, count_tag: u32, index: usize) -> Option<&Group> {
        self.groups(count_tag).get(index)
    }

    /// Returns instance `index` (0-based) of a group mutably.
    pub fn group_mut(&mut self, count_tag: u32, index: usize) -> Option<&mut Group> {
        let position = self.position(count_tag)?;
        match &mut self.slots[position] {
            Slot::Groups { instances, .. } => instances.get_mut(index),
            Slot::Field(_) => None,
        }
    }

    /// Number of instances held for a group.
    #[must_use]
    pub fn group_count(&self, count_tag: u32) -> usize {
        self.groups(count_tag).len()
    }

    /// Replaces instance `index` (0-based) of the group `group` belongs to.
    ///
    /// # Returns
    /// False if no such instance exists.
    pub fn replace_group(&mut self, index: usize, group: Group) -> bool {
        match self.group_mut(group.count_tag(), index) {
            Some(slot) => {
                *slot = group;
                true
            }
            None => false,
        }
    }

    /// Removes instance `index` (0-based) of a group.
    ///
    /// The count tag is dropped once the last instance is removed.
    pub fn remove_group(&mut self, count_tag: u32, index: usize) -> Option<Group> {
        let position = self.position(count_tag)?;
        let Slot::Groups { instances, .. } = &mut self.slots[position] else {
            return None;
        };
        if index >= instances.len() {
            return None;
        }
        let removed = instances.remove(index);
        if instances.is_empty() {
            self.slots.remove(position);
        }
        Some(removed)
    }

    pub(crate) fn write_to(&self, encoder: &mut Encoder, ordering: &Ordering<'_>) {
        for &tag in ordering.lead {
            self.write_tag(encoder, tag);
        }
        let order = self.field_order.as_deref().unwrap_or(&[]);
        for &tag in order {
            if !ordering.places(tag) {
                self.write_tag(encoder, tag);
            }
        }
        for slot in &self.slots {
            let tag = slot.tag();
            if !ordering.places(tag) && !order.contains(&tag) {
                slot.write_to(encoder);
            }
        }
        for &tag in ordering.tail {
            self.write_tag(encoder, tag);
        }
    }

    fn write_tag(&self, encoder: &mut Encoder, tag: u32) {
        for slot in self.slots_for(tag) {
            slot.write_to(encoder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_setters_round_trip() {
        let mut map = FieldMap::new();
        map.set_int(38, -5);
        map.set_u64(34, 12);
        map.set_char(54, '1');
        map.set_bool(43, true);
        map.set_decimal(44, &Decimal::from_str("101.250").unwrap());
        assert_eq!(map.get_int(38).unwrap(), -5);
        assert_eq!(map.get_u64(34).unwrap(), 12);
        assert_eq!(map.get_char(54).unwrap(), '1');
        assert!(map.get_bool(43).unwrap());
        assert_eq!(map.get_decimal(44).unwrap().to_string(), "101.250");
    }

    #[test]
    fn test_missing_and_malformed_are_distinct() {
        let mut map = FieldMap::new();
        map.set_str(38, "ten");
        assert!(matches!(map.get_int(38), Err(FieldError::Conversion { tag: 38, .. })));
        assert_eq!(map.get_int(39), Err(FieldError::NotFound { tag: 39 }));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = FieldMap::new();
        map.set_str(1, "a");
        map.set_str(2, "b");
        map.set_str(1, "c");
        let tags: Vec<u32> = map.fields().map(Field::tag).collect();
        assert_eq!(tags, vec![1, 2]);
        assert_eq!(map.get_str(1).unwrap(), "c");
    }

    #[test]
    fn test_appended_repeats_keep_arrival_order() {
        let mut map = FieldMap::new();
        map.set_str(448, "BRK");
        map.set_str(452, "1");
        map.append(Field::new(448, "CLR"));
        map.append(Field::new(452, "4"));
        assert_eq!(map.get_str(448).unwrap(), "BRK");
        let ids: Vec<&[u8]> = map.get_all(448).map(Field::value).collect();
        assert_eq!(ids, vec![&b"BRK"[..], &b"CLR"[..]]);

        let mut encoder = Encoder::new("FIX.4.4");
        map.write_to(
            &mut encoder,
            &Ordering {
                lead: &[],
                tail: &[],
                skip: &[],
            },
        );
        let bytes = encoder.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("\x01448=BRK\x01452=1\x01448=CLR\x01452=4\x01"));

        map.set_str(448, "ONE");
        assert_eq!(map.get_all(448).count(), 1);
        assert!(map.remove(452));
        assert!(!map.is_set(452));
    }

    #[test]
    fn test_groups_are_zero_based() {
        let mut map = FieldMap::new();
        for id in ["A", "B"] {
            let mut party = Group::new(453, 448);
            party.set_str(448, id);
            map.add_group(party);
        }
        assert_eq!(map.group_count(453), 2);
        assert_eq!(map.group(453, 1).unwrap().get_str(448).unwrap(), "B");
        assert!(map.group(453, 2).is_none());
        assert!(map.is_set(453));
        assert!(map.get(453).is_none());
    }

    #[test]
    fn test_count_field_and_group_list_are_exclusive() {
        let mut map = FieldMap::new();
        map.set_u64(453, 3);
        map.add_group(Group::new(453, 448));
        assert_eq!(map.len(), 1);
        assert!(map.get(453).is_none());
        map.set_u64(453, 0);
        assert_eq!(map.group_count(453), 0);
    }

    #[test]
    fn test_replace_and_remove_group() {
        let mut map = FieldMap::new();
        let mut first = Group::new(268, 269);
        first.set_char(269, '0');
        map.add_group(first);
        let mut replacement = Group::new(268, 269);
        replacement.set_char(269, '1');
        assert!(map.replace_group(0, replacement));
        assert!(!map.replace_group(3, Group::new(268, 269)));
        assert_eq!(map.group(268, 0).unwrap().get_char(269).unwrap(), '1');
        assert!(map.remove_group(268, 0).is_some());
        assert!(!map.is_set(268));
    }

    #[test]
    fn test_field_order_precedes_insertion_order() {
        let mut map = FieldMap::with_field_order(Arc::from([3u32, 1]));
        map.set_str(1, "x");
        map.set_str(2, "y");
        map.set_str(3, "z");
        let mut encoder = Encoder::new("FIX.4.4");
        map.write_to(
            &mut encoder,
            &Ordering {
                lead: &[],
                tail: &[],
                skip: &[],
            },
        );
        let bytes = encoder.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("\x013=z\x011=x\x012=y\x01"));
    }
}
