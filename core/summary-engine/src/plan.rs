//! FILENAME: core/summary-engine/src/plan.rs
//! Query Plan - which grouping/aggregation slices the table needs.
//!
//! For N group columns the table needs the full-detail slice plus one rollup
//! slice per enabled prefix of the group list, down to the grand total.
//! Keys are emitted deepest first; that order fixes both provider invocation
//! order and the order in which results are stitched together.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

macro_rules! name_set {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        #[serde(from = "Vec<String>")]
        pub struct $name(SmallVec<[String; 4]>);

        impl From<Vec<String>> for $name {
            fn from(names: Vec<String>) -> Self {
                $name::new(names)
            }
        }

        impl $name {
            /// Builds the set, keeping the first occurrence of each name.
            pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
                let mut set = SmallVec::new();
                for name in names {
                    let name = name.into();
                    if !set.contains(&name) {
                        set.push(name);
                    }
                }
                $name(set)
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn contains(&self, name: &str) -> bool {
                self.0.iter().any(|n| n == name)
            }

            /// Names in insertion order.
            pub fn names(&self) -> &[String] {
                &self.0
            }

            pub fn iter(&self) -> std::slice::Iter<'_, String> {
                self.0.iter()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.len() == other.len() && self.iter().all(|n| other.contains(n))
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                let mut sorted: SmallVec<[&String; 4]> = self.0.iter().collect();
                sorted.sort();
                sorted.len().hash(state);
                for name in sorted {
                    name.hash(state);
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{{{}}}", self.0.join(", "))
            }
        }
    };
}

name_set!(
    /// Row-hierarchy columns of a slice, outermost first. Compared as a set.
    Groups
);

name_set!(
    /// Value columns of a slice. Compared as a set.
    Aggregations
);

/// Identifies one slice of the pivot: a grouping depth plus its measures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationKey {
    pub groups: Groups,
    pub aggregations: Aggregations,
}

impl AggregationKey {
    pub fn new(groups: Groups, aggregations: Aggregations) -> Self {
        AggregationKey { groups, aggregations }
    }

    /// Number of cells every result row for this key must carry.
    pub fn row_width(&self) -> usize {
        self.groups.len() + self.aggregations.len()
    }
}

impl std::fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.groups, self.aggregations)
    }
}

/// The slices a summary table needs, deepest grouping first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// One entry per included level; each level lists the group sets needed
    /// at that depth.
    pub groupings: Vec<Vec<Groups>>,
    pub aggregations: Aggregations,
}

impl QueryPlan {
    /// Aggregation keys in emission order.
    pub fn keys(&self) -> Vec<AggregationKey> {
        self.groupings
            .iter()
            .flatten()
            .map(|groups| AggregationKey::new(groups.clone(), self.aggregations.clone()))
            .collect()
    }

    /// The full-detail group set (the deepest level).
    pub fn detail_groups(&self) -> Option<&Groups> {
        self.groupings.first().and_then(|level| level.first())
    }

    /// Number of group columns at full detail.
    pub fn detail_level(&self) -> usize {
        self.detail_groups().map(Groups::len).unwrap_or(0)
    }
}

/// Builds the plan for `groups` (configured order) and `aggregations`.
///
/// The rollup for prefix `groups[..i]` is included when the flag of its
/// innermost column `groups[i - 1]` is set; missing flags count as set. The
/// full-detail level is always included and the empty prefix only when
/// `show_grand_total` is set. With no group columns the single detail level
/// is the grand total.
pub fn build_plan(
    groups: &[String],
    show_totals: &[bool],
    aggregations: &[String],
    show_grand_total: bool,
) -> QueryPlan {
    let groups = Groups::new(groups.iter().cloned());
    let aggregations = Aggregations::new(aggregations.iter().cloned());
    let n = groups.len();

    let mut groupings = vec![vec![groups.clone()]];

    for depth in (1..n).rev() {
        let enabled = show_totals.get(depth - 1).copied().unwrap_or(true);
        if enabled {
            groupings.push(vec![Groups::new(groups.names()[..depth].iter().cloned())]);
        }
    }

    if n > 0 && show_grand_total {
        groupings.push(vec![Groups::default()]);
    }

    log_debug!(
        "PLAN",
        "groups={} aggregations={} levels={}",
        groups,
        aggregations,
        groupings.len()
    );

    QueryPlan {
        groupings,
        aggregations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_compare_as_sets() {
        let a = Groups::new(["Region", "Product"]);
        let b = Groups::new(["Product", "Region"]);
        assert_eq!(a, b);
        assert_ne!(a, Groups::new(["Region"]));

        let mut set = FxHashSet::default();
        set.insert(AggregationKey::new(a, Aggregations::new(["Sales", "Cost"])));
        set.insert(AggregationKey::new(b, Aggregations::new(["Cost", "Sales"])));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_groups_keep_insertion_order_without_duplicates() {
        let groups = Groups::new(["Region", "Product", "Region"]);
        assert_eq!(groups.names(), &["Region".to_string(), "Product".to_string()]);
    }

    #[test]
    fn test_deserialized_groups_drop_duplicates() {
        let groups: Groups = serde_json::from_str(r#"["a", "a"]"#).unwrap();
        let other = Groups::new(["a", "b"]);

        assert_eq!(groups.names(), &["a".to_string()]);
        assert_ne!(groups, other);
        assert_ne!(other, groups);
    }

    #[test]
    fn test_example_plan_region_product() {
        let plan = build_plan(
            &names(&["Region", "Product"]),
            &[true, false],
            &names(&["Sales"]),
            false,
        );

        assert_eq!(
            plan.keys(),
            vec![
                AggregationKey::new(Groups::new(["Region", "Product"]), Aggregations::new(["Sales"])),
                AggregationKey::new(Groups::new(["Region"]), Aggregations::new(["Sales"])),
            ]
        );
    }

    #[test]
    fn test_all_levels_enabled_covers_every_prefix() {
        for n in 0..6 {
            let groups: Vec<String> = (0..n).map(|i| format!("g{}", i)).collect();
            let plan = build_plan(&groups, &vec![true; n], &names(&["v"]), true);
            let keys = plan.keys();

            assert_eq!(keys.len(), n + 1);
            for (position, key) in keys.iter().enumerate() {
                let depth = n - position;
                assert_eq!(key.groups, Groups::new(groups[..depth].iter().cloned()));
            }
        }
    }

    #[test]
    fn test_union_of_groups_equals_configured_groups() {
        let groups = names(&["a", "b", "c", "d"]);
        let plan = build_plan(&groups, &[false, true, false, true], &[], true);

        let union: FxHashSet<String> = plan
            .keys()
            .iter()
            .flat_map(|k| k.groups.names().to_vec())
            .collect();
        assert_eq!(union, groups.into_iter().collect::<FxHashSet<_>>());
    }

    #[test]
    fn test_disabled_flags_skip_levels() {
        let groups = names(&["a", "b", "c"]);
        let plan = build_plan(&groups, &[false, true, true], &names(&["v"]), true);
        let depths: Vec<usize> = plan.keys().iter().map(|k| k.groups.len()).collect();
        assert_eq!(depths, vec![3, 2, 0]);
    }

    #[test]
    fn test_zero_value_columns_keeps_detail_key() {
        let plan = build_plan(&names(&["a"]), &[true], &[], false);
        let keys = plan.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].groups, Groups::new(["a"]));
        assert!(keys[0].aggregations.is_empty());
    }

    #[test]
    fn test_zero_group_columns_is_grand_total_only() {
        for show_grand_total in [true, false] {
            let plan = build_plan(&[], &[], &names(&["v"]), show_grand_total);
            let keys = plan.keys();
            assert_eq!(keys.len(), 1);
            assert!(keys[0].groups.is_empty());
            assert_eq!(plan.detail_level(), 0);
        }
    }

    #[test]
    fn test_key_display() {
        let key = AggregationKey::new(Groups::new(["Region"]), Aggregations::new(["Sales"]));
        assert_eq!(key.to_string(), "({Region}, {Sales})");
    }
}
