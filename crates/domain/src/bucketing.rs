use serde::{Deserialize, Serialize};

use crate::destinations::Destination;

/// Fixed number of destination slots per day in the presentation view.
pub const DAY_CAPACITY: usize = 5;

/// One slot in a day group. Empty slots serialize as `{}` so the view always
/// has the full `days x 5` shape on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DaySlot {
    Filled(Destination),
    Empty {},
}

impl DaySlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, DaySlot::Empty {})
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayBuckets {
    pub groups: Vec<Vec<DaySlot>>,
    /// Number of destinations beyond `days * DAY_CAPACITY` that did not fit
    /// into any group. The shape contract keeps them out of the view; callers
    /// decide how to surface the count.
    pub overflow: usize,
}

/// Partitions an ordered destination list into exactly `days` groups of
/// exactly [`DAY_CAPACITY`] slots, filled greedily in input order. Input
/// beyond the total capacity is truncated and reported via `overflow`.
pub fn bucket_by_day(destinations: &[Destination], days: u32) -> DayBuckets {
    let capacity = days as usize * DAY_CAPACITY;
    let mut source = destinations.iter();
    let mut groups = Vec::with_capacity(days as usize);
    for _ in 0..days {
        let mut group = Vec::with_capacity(DAY_CAPACITY);
        for _ in 0..DAY_CAPACITY {
            match source.next() {
                Some(destination) => group.push(DaySlot::Filled(destination.clone())),
                None => group.push(DaySlot::Empty {}),
            }
        }
        groups.push(group);
    }
    DayBuckets {
        groups,
        overflow: destinations.len().saturating_sub(capacity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(id: &str) -> Destination {
        Destination {
            external_id: id.to_string(),
            name: format!("{id}-name"),
            significance: None,
            city: None,
            state: None,
            kind: None,
            date: None,
            has_nearby_airport: false,
            start_time: None,
            end_time: None,
            cost_per_day: 0.0,
            banner_url: None,
        }
    }

    fn destinations(count: usize) -> Vec<Destination> {
        (1..=count).map(|n| destination(&format!("d{n}"))).collect()
    }

    fn real_ids(buckets: &DayBuckets) -> Vec<String> {
        buckets
            .groups
            .iter()
            .flatten()
            .filter_map(|slot| match slot {
                DaySlot::Filled(dest) => Some(dest.external_id.clone()),
                DaySlot::Empty {} => None,
            })
            .collect()
    }

    #[test]
    fn produces_exact_shape_for_any_length() {
        for (n, days) in [(0usize, 1u32), (3, 2), (7, 2), (10, 2), (23, 4)] {
            let input = destinations(n);
            let buckets = bucket_by_day(&input, days);
            assert_eq!(buckets.groups.len(), days as usize);
            for group in &buckets.groups {
                assert_eq!(group.len(), DAY_CAPACITY);
            }
            let expected_real = n.min(days as usize * DAY_CAPACITY);
            assert_eq!(real_ids(&buckets).len(), expected_real);
        }
    }

    #[test]
    fn fills_greedily_in_input_order() {
        let input = destinations(7);
        let buckets = bucket_by_day(&input, 2);
        assert_eq!(
            real_ids(&buckets),
            vec!["d1", "d2", "d3", "d4", "d5", "d6", "d7"]
        );
        assert!(buckets.groups[0].iter().all(|slot| !slot.is_empty()));
        assert!(buckets.groups[1][2].is_empty());
        assert!(buckets.groups[1][3].is_empty());
        assert!(buckets.groups[1][4].is_empty());
        assert_eq!(buckets.overflow, 0);
    }

    #[test]
    fn empty_input_yields_all_placeholders() {
        let buckets = bucket_by_day(&[], 3);
        assert_eq!(buckets.groups.len(), 3);
        assert!(
            buckets
                .groups
                .iter()
                .flatten()
                .all(|slot| slot.is_empty())
        );
        assert_eq!(buckets.overflow, 0);
    }

    #[test]
    fn excess_input_is_truncated_and_counted() {
        let input = destinations(13);
        let buckets = bucket_by_day(&input, 2);
        assert_eq!(buckets.groups.len(), 2);
        assert_eq!(real_ids(&buckets).len(), 10);
        assert_eq!(real_ids(&buckets).last().map(String::as_str), Some("d10"));
        assert_eq!(buckets.overflow, 3);
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let input = destinations(8);
        assert_eq!(bucket_by_day(&input, 3), bucket_by_day(&input, 3));
    }

    #[test]
    fn empty_slot_serializes_as_empty_object() {
        let buckets = bucket_by_day(&destinations(1), 1);
        let value = serde_json::to_value(&buckets.groups).unwrap();
        assert_eq!(value[0][1], serde_json::json!({}));
        assert_eq!(value[0][0]["external_id"], "d1");
    }
}
