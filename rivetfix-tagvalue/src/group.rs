/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Repeating groups.
//!
//! A [`Group`] is one instance of a repeating group: a field container whose
//! first field is the group's delimiter. A [`GroupSchema`] tells the decoder
//! which tags belong to a group so that instance boundaries can be found.

use crate::encoder::Encoder;
use crate::field_map::{FieldMap, Ordering};
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// One instance of a repeating group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    count_tag: u32,
    delimiter: u32,
    fields: FieldMap,
}

impl Group {
    /// Creates an empty instance.
    ///
    /// # Arguments
    /// * `count_tag` - The NumInGroup tag owning this group
    /// * `delimiter` - The tag that must open every instance
    #[must_use]
    pub fn new(count_tag: u32, delimiter: u32) -> Self {
        Self {
            count_tag,
            delimiter,
            fields: FieldMap::new(),
        }
    }

    /// Creates an empty instance whose fields serialize in `order`.
    #[must_use]
    pub fn with_order(count_tag: u32, delimiter: u32, order: Arc<[u32]>) -> Self {
        Self {
            count_tag,
            delimiter,
            fields: FieldMap::with_field_order(order),
        }
    }

    /// Creates an instance laid out by `schema`.
    #[must_use]
    pub fn from_schema(schema: &GroupSchema) -> Self {
        Self::with_order(schema.count_tag, schema.delimiter, schema.field_order.clone())
    }

    /// Returns the NumInGroup tag.
    #[inline]
    #[must_use]
    pub const fn count_tag(&self) -> u32 {
        self.count_tag
    }

    /// Returns the delimiter tag.
    #[inline]
    #[must_use]
    pub const fn delimiter(&self) -> u32 {
        self.delimiter
    }

    /// Returns the instance fields.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Returns the instance fields mutably.
    #[inline]
    pub fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    pub(crate) fn write_to(&self, encoder: &mut Encoder) {
        let lead = [self.delimiter];
        self.fields.write_to(
            encoder,
            &Ordering {
                lead: &lead,
                tail: &[],
                skip: &[],
            },
        );
    }
}

impl Deref for Group {
    type Target = FieldMap;

    fn deref(&self) -> &FieldMap {
        &self.fields
    }
}

impl DerefMut for Group {
    fn deref_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }
}

/// Parse layout of a repeating group.
///
/// The member order starts with the delimiter and lists every member field
/// and nested group count tag in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSchema {
    count_tag: u32,
    delimiter: u32,
    field_order: Arc<[u32]>,
    members: HashSet<u32>,
    groups: HashMap<u32, GroupSchema>,
}

impl GroupSchema {
    /// Creates a schema whose only member is the delimiter.
    #[must_use]
    pub fn new(count_tag: u32, delimiter: u32) -> Self {
        Self {
            count_tag,
            delimiter,
            field_order: Arc::from([delimiter]),
            members: HashSet::from([delimiter]),
            groups: HashMap::new(),
        }
    }

    /// Adds a member field.
    #[must_use]
    pub fn with_field(mut self, tag: u32) -> Self {
        self.push_member(tag);
        self
    }

    /// Adds a nested group.
    #[must_use]
    pub fn with_group(mut self, group: GroupSchema) -> Self {
        self.push_member(group.count_tag);
        self.groups.insert(group.count_tag, group);
        self
    }

    fn push_member(&mut self, tag: u32) {
        if self.members.insert(tag) {
            let mut order = self.field_order.to_vec();
            order.push(tag);
            self.field_order = order.into();
        }
    }

    /// Returns the NumInGroup tag.
    #[inline]
    #[must_use]
    pub const fn count_tag(&self) -> u32 {
        self.count_tag
    }

    /// Returns the delimiter tag.
    #[inline]
    #[must_use]
    pub const fn delimiter(&self) -> u32 {
        self.delimiter
    }

    /// Returns the declared member order.
    #[inline]
    #[must_use]
    pub fn field_order(&self) -> &Arc<[u32]> {
        &self.field_order
    }

    /// Returns the position of `tag` in the declared order.
    #[must_use]
    pub fn position(&self, tag: u32) -> Option<usize> {
        self.field_order.iter().position(|&t| t == tag)
    }

    /// Returns true if `tag` is a member field or nested count tag.
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.members.contains(&tag)
    }

    /// Returns the nested group counted by `count_tag`.
    #[inline]
    #[must_use]
    pub fn group(&self, count_tag: u32) -> Option<&GroupSchema> {
        self.groups.get(&count_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> GroupSchema {
        GroupSchema::new(453, 448)
            .with_field(447)
            .with_field(452)
            .with_group(GroupSchema::new(802, 523).with_field(803))
    }

    #[test]
    fn test_schema_order_starts_with_delimiter() {
        let schema = parties();
        assert_eq!(&schema.field_order()[..], &[448, 447, 452, 802]);
        assert_eq!(schema.position(452), Some(2));
        assert!(schema.contains(802));
        assert!(!schema.contains(803));
        assert_eq!(schema.group(802).map(GroupSchema::delimiter), Some(523));
    }

    #[test]
    fn test_duplicate_member_is_ignored() {
        let schema = GroupSchema::new(268, 269).with_field(270).with_field(270);
        assert_eq!(schema.field_order().len(), 2);
    }

    #[test]
    fn test_group_derefs_to_fields() {
        let mut group = Group::from_schema(&parties());
        group.set_str(448, "BROKER");
        assert_eq!(group.get_str(448).unwrap(), "BROKER");
        assert_eq!(group.count_tag(), 453);
    }
}
