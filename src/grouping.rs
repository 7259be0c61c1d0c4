use crate::types::{AddressRecord, CoordKey, LocationGroup};
use std::collections::HashMap;
use tracing::debug;

/// Groups records by their 6-decimal coordinate key.
///
/// Groups come out in order of first appearance of their key, and members
/// keep their input order, so the same input always yields the same groups.
pub fn group_by_location(records: impl IntoIterator<Item = AddressRecord>) -> Vec<LocationGroup> {
    let mut index: HashMap<CoordKey, usize> = HashMap::new();
    let mut groups: Vec<LocationGroup> = Vec::new();

    for record in records {
        let key = CoordKey::from_point(record.location);
        match index.get(&key) {
            Some(&i) => groups[i].push(record),
            None => {
                index.insert(key, groups.len());
                groups.push(LocationGroup::new(record));
            }
        }
    }

    debug!("Built {} location groups", groups.len());
    groups
}
