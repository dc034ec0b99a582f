//! Structural queries and the mutation protocol of Forest

use arbor::domain::{Forest, NodeId, TreeError};
use arbor::util::testing;
use rstest::{fixture, rstest};

// root
// ├── a
// │   ├── a1
// │   └── a2
// └── b
struct Sample {
    forest: Forest<&'static str>,
    root: NodeId,
    a: NodeId,
    b: NodeId,
    a1: NodeId,
    a2: NodeId,
}

#[fixture]
fn sample() -> Sample {
    testing::init_test_setup();
    let mut forest = Forest::new();
    let root = forest.new_node("root");
    let a = forest.append_value(root, "a").unwrap();
    let b = forest.append_value(root, "b").unwrap();
    let a1 = forest.append_value(a, "a1").unwrap();
    let a2 = forest.append_value(a, "a2").unwrap();
    Sample {
        forest,
        root,
        a,
        b,
        a1,
        a2,
    }
}

fn children(forest: &Forest<&'static str>, id: NodeId) -> Vec<NodeId> {
    forest.get(id).unwrap().children().to_vec()
}

fn previous(forest: &Forest<&'static str>, id: NodeId) -> Option<NodeId> {
    forest.get(id).unwrap().previous_sibling()
}

fn labels(forest: &Forest<&'static str>, id: NodeId) -> Vec<&'static str> {
    forest
        .node(id)
        .unwrap()
        .children()
        .map(|n| *n.value())
        .collect()
}

fn following(forest: &Forest<&'static str>, id: NodeId) -> Option<NodeId> {
    forest.get(id).unwrap().following_sibling()
}

/// Checks root/parent equivalence, sibling symmetry and parent membership for every node.
fn assert_consistent<T>(forest: &Forest<T>) {
    for node in forest.iter() {
        let data = node.data();
        assert_eq!(data.parent().is_none(), node.is_root());
        if let Some(next) = data.following_sibling() {
            assert_eq!(forest.get(next).unwrap().previous_sibling(), Some(node.id()));
        }
        if let Some(prev) = data.previous_sibling() {
            assert_eq!(forest.get(prev).unwrap().following_sibling(), Some(node.id()));
        }
        if let Some(parent) = data.parent() {
            let siblings = forest.get(parent).unwrap().children();
            let positions: Vec<usize> = (0..siblings.len())
                .filter(|&i| siblings[i] == node.id())
                .collect();
            assert_eq!(positions.len(), 1, "node must appear exactly once in parent");
            let i = positions[0];
            let expected_prev = i.checked_sub(1).map(|p| siblings[p]);
            assert_eq!(data.previous_sibling(), expected_prev);
            assert_eq!(data.following_sibling(), siblings.get(i + 1).copied());
        }
    }
}

// ============================================================
// Structural Queries
// ============================================================

#[rstest]
fn given_sample_tree_when_querying_structure_then_reports_derived_properties(sample: Sample) {
    let forest = &sample.forest;
    let root = forest.node(sample.root).unwrap();
    let a = forest.node(sample.a).unwrap();
    let a2 = forest.node(sample.a2).unwrap();

    assert!(root.is_root());
    assert!(!a.is_root());
    assert_eq!(root.depth(), 0);
    assert_eq!(a.depth(), 1);
    assert_eq!(a2.depth(), 2);
    assert_eq!(a2.root().id(), sample.root);

    assert_eq!(root.child_count(), 2);
    assert!(root.has_child());
    assert!(a2.is_leaf());
    assert!(!a2.has_child());

    assert_eq!(root.first_child().map(|n| n.id()), Some(sample.a));
    assert_eq!(root.last_child().map(|n| n.id()), Some(sample.b));
    assert!(a2.first_child().is_none());

    assert!(a.is_first_sibling());
    assert!(!a.is_last_sibling());
    assert!(forest.node(sample.b).unwrap().is_last_sibling());
    assert_eq!(a2.parent().map(|n| n.id()), Some(sample.a));
    assert_consistent(forest);
}

#[rstest]
fn given_sample_tree_when_searching_by_value_then_finds_deep_descendants(sample: Sample) {
    let root = sample.forest.node(sample.root).unwrap();
    assert!(root.contains_value(&"a2"));
    assert!(root.contains_value(&"root"));
    assert!(!root.contains_value(&"zz"));

    let b = sample.forest.node(sample.b).unwrap();
    assert!(!b.contains_value(&"a1"), "search is limited to the subtree");
}

#[rstest]
fn given_sample_tree_when_searching_by_node_then_uses_identity(mut sample: Sample) {
    let twin = sample.forest.new_node("a1");
    let root = sample.forest.node(sample.root).unwrap();
    assert!(root.contains(sample.a1));
    assert!(root.contains(sample.root));
    assert!(!root.contains(twin), "equal value but different node");
    assert!(root.contains_value(&"a1"));
}

#[test]
fn given_optional_values_when_searching_for_absent_value_then_returns_false() {
    let mut forest: Forest<Option<u32>> = Forest::new();
    let root = forest.new_node(Some(1));
    forest.append_value(root, None).unwrap();
    let node = forest.node(root).unwrap();
    assert!(node.contains_value(&None));
    assert!(!node.contains_value(&Some(2)));

    let lone = forest.new_node(None);
    assert!(!forest.node(lone).unwrap().contains_value(&Some(1)));
}

// ============================================================
// Attach
// ============================================================

#[rstest]
fn given_two_children_when_attaching_at_one_then_inserts_between(mut sample: Sample) {
    let x = sample.forest.new_node("x");
    sample.forest.attach(sample.root, 1, x).unwrap();

    assert_eq!(children(&sample.forest, sample.root), vec![sample.a, x, sample.b]);
    assert_eq!(previous(&sample.forest, x), Some(sample.a));
    assert_eq!(following(&sample.forest, x), Some(sample.b));
    assert_eq!(sample.forest.get(x).unwrap().parent(), Some(sample.root));
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_node_in_other_tree_when_attaching_then_moves_it(mut sample: Sample) {
    let other = sample.forest.new_node("other");
    sample.forest.append_child(other, sample.a1).unwrap();

    assert_eq!(children(&sample.forest, sample.a), vec![sample.a2]);
    assert_eq!(children(&sample.forest, other), vec![sample.a1]);
    assert!(sample.forest.node(sample.a2).unwrap().is_first_sibling());
    assert_eq!(sample.forest.node(sample.a1).unwrap().root().id(), other);
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_prepend_when_attaching_then_becomes_first_child(mut sample: Sample) {
    let x = sample.forest.prepend_value(sample.root, "x").unwrap();
    assert_eq!(children(&sample.forest, sample.root), vec![x, sample.a, sample.b]);

    sample.forest.prepend_child(sample.root, sample.b).unwrap();
    assert_eq!(children(&sample.forest, sample.root), vec![sample.b, x, sample.a]);
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_existing_child_when_appending_again_then_moves_to_end(mut sample: Sample) {
    sample.forest.append_child(sample.root, sample.a).unwrap();
    assert_eq!(children(&sample.forest, sample.root), vec![sample.b, sample.a]);
    assert_consistent(&sample.forest);
}

#[rstest]
#[case::forward(0, 1, ["b", "a", "c"])]
#[case::to_last(0, 2, ["b", "c", "a"])]
#[case::backward(2, 0, ["c", "a", "b"])]
#[case::in_place(1, 1, ["a", "b", "c"])]
fn given_child_of_same_parent_when_attaching_then_lands_at_index(
    mut sample: Sample,
    #[case] from: usize,
    #[case] index: usize,
    #[case] expected: [&str; 3],
) {
    sample.forest.append_value(sample.root, "c").unwrap();
    let child = children(&sample.forest, sample.root)[from];

    sample.forest.attach(sample.root, index, child).unwrap();

    assert_eq!(children(&sample.forest, sample.root)[index], child);
    assert_eq!(labels(&sample.forest, sample.root), expected);
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_child_of_same_parent_when_attaching_past_shortened_end_then_fails(mut sample: Sample) {
    let err = sample.forest.attach(sample.root, 2, sample.a).unwrap_err();
    assert_eq!(err, TreeError::IndexOutOfRange { index: 2, len: 1 });
    assert_eq!(children(&sample.forest, sample.root), vec![sample.a, sample.b]);
}

#[rstest]
fn given_value_when_attaching_at_index_then_returns_new_handle(mut sample: Sample) {
    let x = sample.forest.attach_value(sample.a, 1, "x").unwrap();
    assert_eq!(children(&sample.forest, sample.a), vec![sample.a1, x, sample.a2]);
    assert_eq!(sample.forest.value(x), Some(&"x"));
}

#[rstest]
#[case(3)]
#[case(10)]
fn given_index_past_end_when_attaching_then_fails_without_change(
    mut sample: Sample,
    #[case] index: usize,
) {
    let x = sample.forest.new_node("x");
    let err = sample.forest.attach(sample.root, index, x).unwrap_err();
    assert_eq!(err, TreeError::IndexOutOfRange { index, len: 2 });
    assert_eq!(children(&sample.forest, sample.root), vec![sample.a, sample.b]);
    assert!(sample.forest.node(x).unwrap().is_root());
}

#[rstest]
fn given_ancestor_when_attaching_below_descendant_then_rejects_cycle(mut sample: Sample) {
    let err = sample.forest.append_child(sample.a1, sample.root).unwrap_err();
    assert_eq!(err, TreeError::CycleDetected(sample.root));

    let err = sample.forest.append_child(sample.a, sample.a).unwrap_err();
    assert_eq!(err, TreeError::CycleDetected(sample.a));
    assert_consistent(&sample.forest);
    assert_eq!(children(&sample.forest, sample.root), vec![sample.a, sample.b]);
}

#[rstest]
fn given_removed_node_when_attaching_then_reports_missing_node(mut sample: Sample) {
    let x = sample.forest.new_node("x");
    sample.forest.remove_subtree(x).unwrap();

    let err = sample.forest.append_child(sample.root, x).unwrap_err();
    assert_eq!(err, TreeError::MissingNode(x));
    let err = sample.forest.append_child(x, sample.a).unwrap_err();
    assert_eq!(err, TreeError::MissingNode(x));
    assert!(sample.forest.node(x).is_err());
}

// ============================================================
// Sibling attach
// ============================================================

#[rstest]
fn given_child_when_attaching_following_sibling_then_inserts_via_parent(mut sample: Sample) {
    let x = sample.forest.new_node("x");
    sample.forest.attach_following_sibling(sample.a1, x).unwrap();
    assert_eq!(children(&sample.forest, sample.a), vec![sample.a1, x, sample.a2]);

    let y = sample.forest.new_node("y");
    sample.forest.attach_previous_sibling(sample.a1, y).unwrap();
    assert_eq!(
        children(&sample.forest, sample.a),
        vec![y, sample.a1, x, sample.a2]
    );
    assert_consistent(&sample.forest);
}

// root: [a, b, c, d]
#[rstest]
#[case::following_from_before("c", "a", true, ["b", "c", "a", "d"])]
#[case::following_from_after("b", "d", true, ["a", "b", "d", "c"])]
#[case::following_already_next("a", "b", true, ["a", "b", "c", "d"])]
#[case::following_last("d", "a", true, ["b", "c", "d", "a"])]
#[case::previous_from_before("c", "a", false, ["b", "a", "c", "d"])]
#[case::previous_from_after("b", "d", false, ["a", "d", "b", "c"])]
#[case::previous_already_previous("b", "a", false, ["a", "b", "c", "d"])]
#[case::previous_first("a", "d", false, ["d", "a", "b", "c"])]
fn given_sibling_in_same_parent_when_attaching_as_sibling_then_moves_next_to_anchor(
    mut sample: Sample,
    #[case] anchor: &'static str,
    #[case] moving: &'static str,
    #[case] after: bool,
    #[case] expected: [&str; 4],
) {
    sample.forest.append_value(sample.root, "c").unwrap();
    sample.forest.append_value(sample.root, "d").unwrap();
    let anchor = sample.forest.find(&anchor).unwrap().id();
    let moving = sample.forest.find(&moving).unwrap().id();

    if after {
        sample.forest.attach_following_sibling(anchor, moving).unwrap();
        assert_eq!(following(&sample.forest, anchor), Some(moving));
    } else {
        sample.forest.attach_previous_sibling(anchor, moving).unwrap();
        assert_eq!(previous(&sample.forest, anchor), Some(moving));
    }

    assert_eq!(labels(&sample.forest, sample.root), expected);
    assert_consistent(&sample.forest);
}

#[rstest]
#[case::following(true)]
#[case::previous(false)]
fn given_root_when_attaching_own_child_as_sibling_then_child_joins_root_chain(
    mut sample: Sample,
    #[case] after: bool,
) {
    if after {
        sample.forest.attach_following_sibling(sample.root, sample.a).unwrap();
        assert_eq!(following(&sample.forest, sample.root), Some(sample.a));
        assert_eq!(previous(&sample.forest, sample.a), Some(sample.root));
    } else {
        sample.forest.attach_previous_sibling(sample.root, sample.a).unwrap();
        assert_eq!(previous(&sample.forest, sample.root), Some(sample.a));
        assert_eq!(following(&sample.forest, sample.a), Some(sample.root));
    }

    assert_eq!(children(&sample.forest, sample.root), vec![sample.b]);
    let a = sample.forest.node(sample.a).unwrap();
    assert!(a.is_root());
    assert_eq!(children(&sample.forest, sample.a), vec![sample.a1, sample.a2]);
    assert!(sample.forest.node(sample.b).unwrap().is_first_sibling());
    assert_consistent(&sample.forest);
}

#[test]
fn given_root_chain_neighbour_when_attaching_again_then_chain_is_unchanged() {
    let mut forest = Forest::new();
    let left = forest.new_node("left");
    let right = forest.new_node("right");
    forest.attach_following_sibling(left, right).unwrap();

    forest.attach_following_sibling(left, right).unwrap();
    forest.attach_previous_sibling(right, left).unwrap();

    assert_eq!(following(&forest, left), Some(right));
    assert_eq!(previous(&forest, right), Some(left));
    assert!(forest.node(left).unwrap().is_first_sibling());
    assert!(forest.node(right).unwrap().is_last_sibling());
    assert_consistent(&forest);
}

#[test]
fn given_roots_when_attaching_siblings_then_builds_root_level_chain() {
    let mut forest = Forest::new();
    let first = forest.new_node("first");
    let third = forest.new_node("third");
    let second = forest.new_node("second");
    let zeroth = forest.new_node("zeroth");

    forest.attach_following_sibling(first, third).unwrap();
    forest.attach_following_sibling(first, second).unwrap();
    forest.attach_previous_sibling(first, zeroth).unwrap();

    let chain: Vec<&str> = std::iter::once(forest.node(zeroth).unwrap())
        .chain(forest.node(zeroth).unwrap().following_siblings())
        .map(|n| *n.value())
        .collect();
    assert_eq!(chain, vec!["zeroth", "first", "second", "third"]);

    for id in [zeroth, first, second, third] {
        assert!(forest.node(id).unwrap().is_root());
    }
    assert_consistent(&forest);
}

#[test]
fn given_root_chain_member_when_attached_as_child_then_leaves_chain() {
    let mut forest = Forest::new();
    let left = forest.new_node("left");
    let middle = forest.new_node("middle");
    let right = forest.new_node("right");
    forest.attach_following_sibling(left, middle).unwrap();
    forest.attach_following_sibling(middle, right).unwrap();

    let parent = forest.new_node("parent");
    forest.append_child(parent, middle).unwrap();

    assert_eq!(forest.get(left).unwrap().following_sibling(), Some(right));
    assert_eq!(forest.get(right).unwrap().previous_sibling(), Some(left));
    assert!(forest.node(middle).unwrap().is_first_sibling());
    assert!(forest.node(middle).unwrap().is_last_sibling());
    assert_consistent(&forest);
}

#[rstest]
fn given_same_node_when_attaching_as_own_sibling_then_rejects(mut sample: Sample) {
    let err = sample
        .forest
        .attach_following_sibling(sample.b, sample.b)
        .unwrap_err();
    assert_eq!(err, TreeError::CycleDetected(sample.b));
}

// ============================================================
// Detach and removal
// ============================================================

#[rstest]
fn given_child_with_subtree_when_detaching_then_subtree_moves_intact(mut sample: Sample) {
    sample.forest.detach(sample.a).unwrap();

    assert_eq!(children(&sample.forest, sample.root), vec![sample.b]);
    let a = sample.forest.node(sample.a).unwrap();
    assert!(a.is_root());
    assert!(a.is_first_sibling() && a.is_last_sibling());
    assert_eq!(children(&sample.forest, sample.a), vec![sample.a1, sample.a2]);
    assert!(sample.forest.node(sample.b).unwrap().is_first_sibling());
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_root_when_detaching_twice_then_state_is_unchanged(mut sample: Sample) {
    sample.forest.detach(sample.a).unwrap();
    sample.forest.detach(sample.a).unwrap();
    sample.forest.detach(sample.root).unwrap();

    assert_eq!(children(&sample.forest, sample.root), vec![sample.b]);
    assert_eq!(children(&sample.forest, sample.a), vec![sample.a1, sample.a2]);
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_direct_child_when_removing_then_returns_true(mut sample: Sample) {
    assert!(sample.forest.remove_child(sample.root, sample.b).unwrap());
    assert!(!sample.forest.remove_child(sample.root, sample.b).unwrap());
    assert!(
        !sample.forest.remove_child(sample.root, sample.a1).unwrap(),
        "grandchildren are not direct children"
    );
    assert_eq!(children(&sample.forest, sample.root), vec![sample.a]);
}

#[rstest]
fn given_index_when_removing_child_at_then_detaches_that_child(mut sample: Sample) {
    let removed = sample.forest.remove_child_at(sample.a, 1).unwrap();
    assert_eq!(removed, sample.a2);
    assert!(sample.forest.node(sample.a2).unwrap().is_root());

    let err = sample.forest.remove_child_at(sample.a, 1).unwrap_err();
    assert_eq!(err, TreeError::IndexOutOfRange { index: 1, len: 1 });
}

#[rstest]
fn given_parent_when_removing_all_children_then_leaves_it_empty(mut sample: Sample) {
    let removed = sample.forest.remove_all_children(sample.root).unwrap();
    assert_eq!(removed, vec![sample.a, sample.b]);
    assert!(sample.forest.node(sample.root).unwrap().is_leaf());
    for id in removed {
        assert!(sample.forest.node(id).unwrap().is_root());
    }
    assert_eq!(sample.forest.len(), 5, "detached nodes stay in the forest");
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_subtree_when_removing_then_frees_all_its_nodes(mut sample: Sample) {
    let value = sample.forest.remove_subtree(sample.a).unwrap();
    assert_eq!(value, "a");
    assert_eq!(sample.forest.len(), 2);
    assert!(!sample.forest.is_live(sample.a1));
    assert!(!sample.forest.is_live(sample.a2));
    assert_eq!(children(&sample.forest, sample.root), vec![sample.b]);
    assert_consistent(&sample.forest);
}

#[rstest]
fn given_forest_when_listing_roots_then_returns_only_parentless_nodes(mut sample: Sample) {
    sample.forest.detach(sample.a2).unwrap();
    let mut roots: Vec<&str> = sample.forest.roots().map(|n| *n.value()).collect();
    roots.sort();
    assert_eq!(roots, vec!["a2", "root"]);
    assert_eq!(sample.forest.find(&"b").map(|n| n.id()), Some(sample.b));
}
