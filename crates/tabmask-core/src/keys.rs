//! Merge key discovery from two table schemas

use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column names present in both schemas
pub fn intersect<A, B>(left: &[A], right: &[B]) -> BTreeSet<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let right: BTreeSet<&str> = right.iter().map(|c| c.as_ref()).collect();
    left.iter()
        .map(|c| c.as_ref())
        .filter(|c| right.contains(c))
        .map(str::to_string)
        .collect()
}

/// Common columns ordered by their position in `left`
pub fn common_keys<A, B>(left: &[A], right: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let shared = intersect(left, right);
    left.iter()
        .map(|c| c.as_ref())
        .filter(|c| shared.contains(*c))
        .map(str::to_string)
        .collect()
}

/// One flag per column of `schema`: is it in the intersection
pub fn highlight<S: AsRef<str>>(schema: &[S], shared: &BTreeSet<String>) -> Vec<bool> {
    schema.iter().map(|c| shared.contains(c.as_ref())).collect()
}

/// Key candidates for merging two loaded tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySelection {
    /// Candidate keys in left column order
    pub keys: Vec<String>,
    /// Per left column, whether it is a candidate key
    pub left_highlight: Vec<bool>,
    /// Per right column, whether it is a candidate key
    pub right_highlight: Vec<bool>,
}

impl KeySelection {
    /// Analyze the schemas of two tables
    pub fn analyze(left: &Table, right: &Table) -> Self {
        let left_names = left.column_names();
        let right_names = right.column_names();
        let shared = intersect(&left_names, &right_names);

        Self {
            keys: common_keys(&left_names, &right_names),
            left_highlight: highlight(&left_names, &shared),
            right_highlight: highlight(&right_names, &shared),
        }
    }

    /// True when no column can serve as a merge key
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key preselected for the operator (the first candidate)
    pub fn default_key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_is_commutative() {
        let a = ["id", "name", "age"];
        let b = ["city", "id", "age"];
        assert_eq!(intersect(&a, &b), intersect(&b, &a));
        assert_eq!(
            intersect(&a, &b).into_iter().collect::<Vec<_>>(),
            vec!["age".to_string(), "id".to_string()]
        );
    }

    #[test]
    fn test_intersect_is_case_sensitive() {
        assert!(intersect(&["ID"], &["id"]).is_empty());
    }

    #[test]
    fn test_common_keys_follow_left_order() {
        let a = ["name", "id", "age"];
        let b = ["age", "id"];
        assert_eq!(common_keys(&a, &b), vec!["id", "age"]);
        assert_eq!(common_keys(&b, &a), vec!["age", "id"]);
    }

    #[test]
    fn test_highlight_preserves_order() {
        let a = ["id", "name", "age"];
        let shared = intersect(&a, &["age", "id"]);
        assert_eq!(highlight(&a, &shared), vec![true, false, true]);
    }

    #[test]
    fn test_analyze_tables() {
        let left = Table::new(["id", "name", "age"]);
        let right = Table::new(["id", "city"]);
        let selection = KeySelection::analyze(&left, &right);

        assert_eq!(selection.keys, vec!["id"]);
        assert_eq!(selection.left_highlight, vec![true, false, false]);
        assert_eq!(selection.right_highlight, vec![true, false]);
        assert_eq!(selection.default_key(), Some("id"));
    }

    #[test]
    fn test_analyze_disjoint() {
        let selection = KeySelection::analyze(&Table::new(["a"]), &Table::new(["b"]));
        assert!(selection.is_empty());
        assert_eq!(selection.default_key(), None);
        assert_eq!(selection.left_highlight, vec![false]);
    }
}
