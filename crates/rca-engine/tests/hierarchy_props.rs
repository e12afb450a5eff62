use proptest::prelude::*;
use proptest::sample::Index;
use rca_core::{RootCause, RootCauseId, RootCauseScope, RootCauseStore};
use rca_test_utils::{forest_ids, project, setup_engine, Harness};
use std::collections::HashSet;

/// Per node: (attach to an earlier node, which one, disabled, scope pick)
type Shape = Vec<(bool, Index, bool, u8)>;

fn forest_shape() -> impl Strategy<Value = Shape> {
    proptest::collection::vec(
        (any::<bool>(), any::<Index>(), any::<bool>(), 0..3u8),
        1..24,
    )
}

/// Parent position and scope of every node
///
/// A node below a CUSTOM parent takes the parent's scope, so every generated
/// forest is one the engine accepts.
fn layout(shape: &Shape) -> Vec<(Option<usize>, RootCauseScope)> {
    let mut nodes: Vec<(Option<usize>, RootCauseScope)> = Vec::with_capacity(shape.len());
    for (i, (attach, idx, _, pick)) in shape.iter().enumerate() {
        let parent = (*attach && i > 0).then(|| idx.index(i));
        let drawn = match pick {
            0 => RootCauseScope::Global,
            1 => RootCauseScope::custom("p1"),
            _ => RootCauseScope::custom("p2"),
        };
        let scope = match parent {
            Some(p) if matches!(nodes[p].1, RootCauseScope::Custom(_)) => nodes[p].1.clone(),
            _ => drawn,
        };
        nodes.push((parent, scope));
    }
    nodes
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Store the forest directly, returning ids by position
async fn seed(h: &Harness, shape: &Shape) -> Vec<RootCauseId> {
    let nodes = layout(shape);
    let ids: Vec<RootCauseId> = shape.iter().map(|_| RootCauseId::new()).collect();
    for (i, ((parent, scope), (_, _, disabled, _))) in nodes.into_iter().zip(shape).enumerate() {
        h.store
            .save(RootCause {
                id: ids[i],
                name: format!("n{i}"),
                scope,
                parent_id: parent.map(|p| ids[p]),
                disabled: *disabled,
            })
            .await
            .unwrap();
    }
    ids
}

/// Positions in the subtree of `target`, itself included
fn subtree(nodes: &[(Option<usize>, RootCauseScope)], target: usize) -> HashSet<usize> {
    let mut members = HashSet::from([target]);
    // Parents always precede children, one pass suffices
    for (i, (parent, _)) in nodes.iter().enumerate() {
        if let Some(p) = parent {
            if members.contains(p) {
                members.insert(i);
            }
        }
    }
    members
}

/// Positions the tree of project p1 shows
///
/// Roots: GLOBAL ones and p1's CUSTOM ones. Below a GLOBAL node every child
/// shows; below a CUSTOM node only p1's children, which here means the
/// parent itself belongs to p1.
fn shown_to_p1(shape: &Shape, filter_disabled: bool) -> Vec<bool> {
    let p1 = RootCauseScope::custom("p1");
    let nodes = layout(shape);
    let mut shown = vec![false; nodes.len()];
    for (i, (parent, scope)) in nodes.iter().enumerate() {
        let hidden_flag = filter_disabled && shape[i].2;
        let reachable = match parent {
            None => *scope == RootCauseScope::Global || *scope == p1,
            Some(p) => {
                shown[*p] && (nodes[*p].1 == RootCauseScope::Global || nodes[*p].1 == p1)
            }
        };
        shown[i] = reachable && !hidden_flag;
    }
    shown
}

fn ids_where(ids: &[RootCauseId], flags: &[bool]) -> HashSet<RootCauseId> {
    ids.iter()
        .zip(flags)
        .filter(|(_, keep)| **keep)
        .map(|(id, _)| *id)
        .collect()
}

proptest! {
    #[test]
    fn prop_cascade_removes_exactly_the_subtree(shape in forest_shape(), pick in any::<Index>()) {
        let rt = runtime();
        let h = setup_engine(true);
        let ids = rt.block_on(seed(&h, &shape));
        let target = pick.index(ids.len());
        let doomed = subtree(&layout(&shape), target);

        rt.block_on(h.engine.delete_by_id(ids[target])).unwrap();

        for (i, id) in ids.iter().enumerate() {
            let exists = rt.block_on(h.store.exists(*id)).unwrap();
            prop_assert_eq!(exists, !doomed.contains(&i), "node n{}", i);
        }
    }

    #[test]
    fn prop_cascade_leaves_no_dangling_parent(shape in forest_shape(), pick in any::<Index>()) {
        let rt = runtime();
        let h = setup_engine(true);
        let ids = rt.block_on(seed(&h, &shape));

        rt.block_on(h.engine.delete_by_id(ids[pick.index(ids.len())])).unwrap();

        let remaining = rt.block_on(h.store.find_all()).unwrap();
        let present: HashSet<RootCauseId> = remaining.iter().map(|rc| rc.id).collect();
        for record in &remaining {
            if let Some(parent_id) = record.parent_id {
                prop_assert!(present.contains(&parent_id), "{} lost its parent", record.name);
            }
        }
    }

    #[test]
    fn prop_project_tree_holds_exactly_the_visible_nodes(shape in forest_shape()) {
        let rt = runtime();
        let h = setup_engine(true);
        let ids = rt.block_on(seed(&h, &shape));

        for filter_disabled in [true, false] {
            let forest = rt.block_on(h.engine.get_tree(&project("p1"), filter_disabled)).unwrap();
            let listed = forest_ids(&forest);
            let shown: HashSet<RootCauseId> = listed.iter().copied().collect();

            prop_assert_eq!(listed.len(), shown.len());
            prop_assert_eq!(shown, ids_where(&ids, &shown_to_p1(&shape, filter_disabled)));
        }
    }
}
