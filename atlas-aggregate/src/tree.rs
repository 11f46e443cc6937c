//! The aggregation tree and its render-order traversal.

use std::collections::BTreeMap;
use std::fmt;

use atlas_core::types::AttributeValue;

/// One node of the aggregation tree.
///
/// Tree depth equals the number of key extractors: interior levels are
/// branches, the last level holds the records.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregationNode<R> {
    /// Grouping key to sub-tree, iterated in key order
    Branch(BTreeMap<AttributeValue, AggregationNode<R>>),
    /// Records in the order they were seen
    Leaf(Vec<R>),
}

impl<R> AggregationNode<R> {
    /// Creates an empty node heading a tree `depth` levels deep.
    pub(crate) fn empty(depth: usize) -> Self {
        if depth == 0 {
            AggregationNode::Leaf(Vec::new())
        } else {
            AggregationNode::Branch(BTreeMap::new())
        }
    }

    /// Files `record` under `keys`, creating branches on demand.
    ///
    /// Returns false if the target leaf is already at `max_per_branch`.
    pub(crate) fn insert(
        &mut self,
        keys: &[AttributeValue],
        record: R,
        max_per_branch: Option<usize>,
    ) -> bool {
        match (self, keys.split_first()) {
            (AggregationNode::Leaf(records), None) => {
                if max_per_branch.is_some_and(|max| records.len() >= max) {
                    return false;
                }
                records.push(record);
                true
            }
            (AggregationNode::Branch(children), Some((key, rest))) => {
                if let Some(child) = children.get_mut(key) {
                    return child.insert(rest, record, max_per_branch);
                }
                let mut child = Self::empty(rest.len());
                if !child.insert(rest, record, max_per_branch) {
                    return false;
                }
                children.insert(key.clone(), child);
                true
            }
            // Key count always matches depth; both come from the same extractor list
            _ => false,
        }
    }

    /// Returns the number of records under this node.
    pub fn len(&self) -> usize {
        match self {
            AggregationNode::Branch(children) => children.values().map(Self::len).sum(),
            AggregationNode::Leaf(records) => records.len(),
        }
    }

    /// Returns true if no records are held under this node.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sub-groups of a branch.
    pub fn children(&self) -> Option<&BTreeMap<AttributeValue, AggregationNode<R>>> {
        match self {
            AggregationNode::Branch(children) => Some(children),
            AggregationNode::Leaf(_) => None,
        }
    }

    /// Returns the records of a leaf.
    pub fn records(&self) -> Option<&[R]> {
        match self {
            AggregationNode::Branch(_) => None,
            AggregationNode::Leaf(records) => Some(records),
        }
    }
}

/// One group header on the way to a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathSegment<'a> {
    /// Extractor label, e.g. `Country`
    pub label: &'a str,
    /// Grouping key at this level
    pub key: &'a AttributeValue,
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.key)
    }
}

/// A leaf together with the group headers leading to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf<'a, R> {
    /// Headers from the top level down; empty when nothing is grouped
    pub path: Vec<PathSegment<'a>>,
    /// Records of the leaf, in source order
    pub records: &'a [R],
}

/// Depth-first, key-ordered iterator over every leaf of a tree.
pub struct Leaves<'a, R> {
    labels: &'a [String],
    stack: Vec<(Vec<PathSegment<'a>>, &'a AggregationNode<R>)>,
}

impl<'a, R> Leaves<'a, R> {
    pub(crate) fn new(root: &'a AggregationNode<R>, labels: &'a [String]) -> Self {
        Self {
            labels,
            stack: vec![(Vec::new(), root)],
        }
    }
}

impl<'a, R> Iterator for Leaves<'a, R> {
    type Item = Leaf<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            match node {
                AggregationNode::Leaf(records) => return Some(Leaf { path, records }),
                AggregationNode::Branch(children) => {
                    let label = self.labels.get(path.len()).map_or("", String::as_str);
                    // Reversed so the smallest key is popped first
                    for (key, child) in children.iter().rev() {
                        let mut child_path = path.clone();
                        child_path.push(PathSegment { label, key });
                        self.stack.push((child_path, child));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> AttributeValue {
        AttributeValue::Text(s.into())
    }

    #[test]
    fn test_insert_creates_branches() {
        let mut root = AggregationNode::empty(2);
        assert!(root.insert(&[text("DE"), AttributeValue::Int(3333)], 1, None));
        assert!(root.insert(&[text("DE"), AttributeValue::Int(3332)], 2, None));
        assert!(root.insert(&[text("GR"), AttributeValue::Int(3333)], 3, None));

        let children = root.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[&text("DE")].children().unwrap().len(), 2);
        assert_eq!(root.len(), 3);
    }

    #[test]
    fn test_leaf_cap() {
        let mut root = AggregationNode::empty(1);
        assert!(root.insert(&[text("GR")], 1, Some(1)));
        assert!(!root.insert(&[text("GR")], 5, Some(1)));
        assert!(root.insert(&[text("DE")], 2, Some(1)));
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn test_zero_cap_creates_no_branches() {
        let mut root = AggregationNode::empty(2);
        assert!(!root.insert(&[text("GR"), AttributeValue::Int(1)], 1, Some(0)));
        assert!(root.children().unwrap().is_empty());
    }

    #[test]
    fn test_leaves_are_key_ordered() {
        let mut root = AggregationNode::empty(1);
        for (country, id) in [("NL", 4), ("DE", 2), ("GR", 1), ("DE", 3)] {
            root.insert(&[text(country)], id, None);
        }
        let labels = vec!["Country".to_string()];

        let leaves: Vec<_> = Leaves::new(&root, &labels)
            .map(|leaf| (leaf.path[0].to_string(), leaf.records.to_vec()))
            .collect();
        assert_eq!(
            leaves,
            vec![
                ("Country: DE".to_string(), vec![2, 3]),
                ("Country: GR".to_string(), vec![1]),
                ("Country: NL".to_string(), vec![4]),
            ]
        );
    }

    #[test]
    fn test_flat_tree_has_one_unlabelled_leaf() {
        let mut root = AggregationNode::empty(0);
        root.insert(&[], "a", None);
        root.insert(&[], "b", None);

        let leaves: Vec<_> = Leaves::new(&root, &[]).collect();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].path.is_empty());
        assert_eq!(leaves[0].records, ["a", "b"]);
    }
}
