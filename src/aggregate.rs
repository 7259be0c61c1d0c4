use crate::bucket::{completion_percentage, ColorBucket};
use crate::config::ThresholdConfig;
use crate::types::{LocationGroup, NoteEntry};

/// Derived figures for one location group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub count: usize,
    pub done_count: usize,
    pub percentage: f64,
    pub all_done: bool,
    pub has_note: bool,
    /// Address and note of every member with a note, in member order.
    pub notes: Vec<NoteEntry>,
}

impl GroupStats {
    pub fn from_group(group: &LocationGroup) -> Self {
        let members = group.members();
        let count = members.len();
        let done_count = members.iter().filter(|r| r.done).count();
        let notes: Vec<NoteEntry> = members
            .iter()
            .filter_map(|r| {
                r.note.as_ref().map(|note| NoteEntry {
                    address: r.address.clone(),
                    note: note.clone(),
                })
            })
            .collect();

        let percentage = completion_percentage(done_count, count);
        debug_assert!((0.0..=100.0).contains(&percentage));

        Self {
            count,
            done_count,
            percentage,
            all_done: done_count == count,
            has_note: !notes.is_empty(),
            notes,
        }
    }

    pub fn bucket(&self, thresholds: &ThresholdConfig) -> ColorBucket {
        ColorBucket::from_percentage(self.percentage, thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_by_location;
    use crate::types::AddressRecord;
    use geo::Point;

    fn record(address: &str, done: bool, note: Option<&str>) -> AddressRecord {
        AddressRecord {
            address: address.to_string(),
            location: Point::new(5.1, 52.1),
            done,
            note: note.map(str::to_string),
        }
    }

    fn stats(records: Vec<AddressRecord>) -> GroupStats {
        let groups = group_by_location(records);
        assert_eq!(groups.len(), 1);
        GroupStats::from_group(&groups[0])
    }

    #[test]
    fn counts_and_percentage() {
        let s = stats(vec![
            record("1", true, None),
            record("2", false, None),
            record("3", true, None),
            record("4", false, None),
        ]);
        assert_eq!(s.count, 4);
        assert_eq!(s.done_count, 2);
        assert_eq!(s.percentage, 50.0);
        assert!(!s.all_done);
        assert!(!s.has_note);
        assert!(s.notes.is_empty());
        assert_eq!(s.bucket(&ThresholdConfig::default()), ColorBucket::Mid);
    }

    #[test]
    fn single_done_member_is_complete() {
        let s = stats(vec![record("1", true, None)]);
        assert!(s.all_done);
        assert_eq!(s.percentage, 100.0);
        assert_eq!(s.bucket(&ThresholdConfig::default()), ColorBucket::Complete);
    }

    #[test]
    fn notes_keep_member_order() {
        let s = stats(vec![
            record("1", false, Some("second floor")),
            record("2", false, None),
            record("3", true, Some("dog")),
        ]);
        assert!(s.has_note);
        assert_eq!(
            s.notes,
            vec![
                NoteEntry {
                    address: "1".to_string(),
                    note: "second floor".to_string()
                },
                NoteEntry {
                    address: "3".to_string(),
                    note: "dog".to_string()
                },
            ]
        );
    }

    #[test]
    fn percentage_stays_in_range() {
        for total in 1..=12 {
            for done in 0..=total {
                let records = (0..total).map(|i| record(&i.to_string(), i < done, None)).collect();
                let s = stats(records);
                assert!((0.0..=100.0).contains(&s.percentage));
                assert_eq!(s.has_note, !s.notes.is_empty());
                assert_eq!(s.all_done, done == total);
            }
        }
    }
}
