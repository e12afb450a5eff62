use pretty_assertions::assert_eq;
use rca_core::{RootCausePatch, RootCauseStore};
use rca_engine::EngineError;
use rca_test_utils::{custom, expect_node, global, project, setup_engine, shape};

#[tokio::test]
async fn create_then_get_returns_equal_record() {
    let h = setup_engine(true);

    for candidate in [global("Infrastructure"), custom("Flaky locator", "p1")] {
        let created = h.create(candidate.clone()).await;
        assert_eq!(created.name, candidate.name);
        assert_eq!(created.scope, candidate.scope);
        assert_eq!(h.engine.get(created.id).await.unwrap(), created);
    }
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let h = setup_engine(false);
    let id = rca_core::RootCauseId::new();

    assert!(matches!(h.engine.get(id).await, Err(EngineError::NotFound(missing)) if missing == id));
}

#[tokio::test]
async fn custom_names_are_unique_within_a_project_only() {
    let h = setup_engine(false);
    h.create(custom("Timeout", "p1")).await;

    let duplicate = h.engine.create(custom("Timeout", "p1")).await;
    assert!(matches!(duplicate, Err(EngineError::AlreadyExists { .. })));

    h.create(custom("Timeout", "p2")).await;
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn global_names_are_unique_regardless_of_project() {
    let h = setup_engine(true);
    h.create(global("Timeout")).await;

    let duplicate = h.engine.create(global("Timeout")).await;
    assert!(matches!(
        duplicate,
        Err(EngineError::AlreadyExists { project_id: None, .. })
    ));
}

#[tokio::test]
async fn global_and_custom_may_share_a_name() {
    let h = setup_engine(true);
    h.create(global("Timeout")).await;
    h.create(custom("Timeout", "p1")).await;

    assert_eq!(h.engine.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn only_admins_write_global_nodes() {
    let h = setup_engine(false);

    let rejected = h.engine.create(global("Infrastructure")).await;
    assert!(matches!(rejected, Err(EngineError::IllegalAccess)));

    let node = h.as_admin().create(global("Infrastructure")).await;

    h.as_user();
    let rename = h
        .engine
        .update(node.id, RootCausePatch::new().with_name("Infra"))
        .await;
    assert!(matches!(rename, Err(EngineError::IllegalAccess)));
    assert!(matches!(h.engine.disable(node.id).await, Err(EngineError::IllegalAccess)));
    assert!(matches!(h.engine.delete_by_id(node.id).await, Err(EngineError::IllegalAccess)));

    let renamed = h
        .as_admin()
        .engine
        .update(node.id, RootCausePatch::new().with_name("Infra"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Infra");
}

#[tokio::test]
async fn update_revalidates_the_merged_record() {
    let h = setup_engine(false);
    h.create(custom("Timeout", "p1")).await;
    let other = h.create(custom("Crash", "p1")).await;

    let clash = h
        .engine
        .update(other.id, RootCausePatch::new().with_name("Timeout"))
        .await;
    assert!(matches!(clash, Err(EngineError::AlreadyExists { .. })));

    // Renaming to its own name is not a collision
    let same = h
        .engine
        .update(other.id, RootCausePatch::new().with_name("Crash").with_disabled(true))
        .await
        .unwrap();
    assert!(same.disabled);
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let h = setup_engine(true);
    let id = rca_core::RootCauseId::new();

    let result = h.engine.update(id, RootCausePatch::new().with_name("x")).await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let h = setup_engine(true);

    assert!(matches!(
        h.engine.create(custom("   ", "p1")).await,
        Err(EngineError::InvalidName(_))
    ));
    let node = h.create(custom("ok", "p1")).await;
    assert!(matches!(
        h.engine.update(node.id, RootCausePatch::new().with_name("")).await,
        Err(EngineError::InvalidName(_))
    ));
}

#[tokio::test]
async fn delete_removes_subtree_and_detaches_runs() {
    let h = setup_engine(true);
    let a = h.create(global("A")).await;
    let b = h.create_under(&a, global("B")).await;
    let c = h.create_under(&b, global("C")).await;
    let keep = h.create(global("Keep")).await;

    let runs = [h.link_run(&a), h.link_run(&b), h.link_run(&c), h.link_run(&c)];
    let untouched = h.link_run(&keep);

    h.engine.delete_by_id(a.id).await.unwrap();

    for node in [&a, &b, &c] {
        assert!(!h.store.exists(node.id).await.unwrap());
    }
    for run in runs {
        assert_eq!(h.runs.root_cause_of(run), Some(None));
    }
    assert_eq!(h.runs.root_cause_of(untouched), Some(Some(keep.id)));
    assert_eq!(h.engine.get_all().await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn delete_removes_disabled_descendants_too() {
    let h = setup_engine(false);
    let root = h.create(custom("R", "p1")).await;
    let child = h.create_under(&root, custom("r1", "p1")).await;
    h.engine.disable(child.id).await.unwrap();

    h.engine.delete_by_id(root.id).await.unwrap();
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn custom_parent_rejects_child_of_another_project() {
    let h = setup_engine(false);
    let parent = h.create(custom("P", "p1")).await;

    let foreign = h
        .engine
        .create(custom("X", "p2").with_parent(parent.id))
        .await;
    assert!(matches!(
        foreign,
        Err(EngineError::IllegalParent { parent: p, child_project: Some(ref project), .. })
            if p == parent.id && project.as_str() == "p2"
    ));

    h.engine.delete_by_id(parent.id).await.unwrap();
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn custom_parent_rejects_global_child() {
    let h = setup_engine(true);
    let parent = h.create(custom("P", "p1")).await;

    let global_child = h.engine.create(global("G").with_parent(parent.id)).await;
    assert!(matches!(
        global_child,
        Err(EngineError::IllegalParent { child_project: None, .. })
    ));

    h.as_user().engine.delete_by_id(parent.id).await.unwrap();
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn reparenting_under_incompatible_custom_parent_is_rejected() {
    let h = setup_engine(true);
    let p1 = h.create(custom("P", "p1")).await;
    let foreign = h.create(custom("X", "p2")).await;
    let g = h.create(global("G")).await;

    for moved in [foreign.id, g.id] {
        let result = h
            .engine
            .update(moved, RootCausePatch::new().with_parent(Some(p1.id)))
            .await;
        assert!(matches!(result, Err(EngineError::IllegalParent { parent, .. }) if parent == p1.id));
        assert!(h.engine.get(moved).await.unwrap().is_root());
    }

    // Any scope may still move below a GLOBAL parent
    let under_global = h
        .engine
        .update(foreign.id, RootCausePatch::new().with_parent(Some(g.id)))
        .await
        .unwrap();
    assert_eq!(under_global.parent_id, Some(g.id));

    h.engine.delete_by_id(g.id).await.unwrap();
    let remaining: Vec<_> = h.engine.get_all().await.unwrap();
    assert_eq!(remaining, vec![p1]);
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let h = setup_engine(true);
    let result = h.engine.delete_by_id(rca_core::RootCauseId::new()).await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn disabled_root_hides_whole_subtree_only_when_filtering() {
    let h = setup_engine(true);
    let root = h.create(global("R")).await;
    let child = h.create_under(&root, global("r1")).await;
    h.create_under(&child, global("r11")).await;
    h.engine.disable(root.id).await.unwrap();

    let p1 = project("p1");
    assert!(h.engine.get_tree(&p1, true).await.unwrap().is_empty());

    let full = h.engine.get_tree(&p1, false).await.unwrap();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].len(), 3);
    // The flag is not cascaded
    assert!(!h.engine.get(child.id).await.unwrap().disabled);
}

#[tokio::test]
async fn project_tree_with_disabled_global_child() {
    let h = setup_engine(true);
    let g = h.create(global("G")).await;
    h.create_under(&g, global("g1")).await;
    let g2 = h.create_under(&g, global("g2")).await;
    h.engine.disable(g2.id).await.unwrap();

    let p1 = project("p1");
    assert_eq!(
        shape(&h.engine.get_tree(&p1, true).await.unwrap()),
        vec![expect_node("G", &["g1"])]
    );
    assert_eq!(
        shape(&h.engine.get_tree(&p1, false).await.unwrap()),
        vec![expect_node("G", &["g1", "g2"])]
    );
}

#[tokio::test]
async fn enable_restores_a_disabled_subtree() {
    let h = setup_engine(false);
    let root = h.create(custom("R", "p1")).await;
    h.create_under(&root, custom("r1", "p1")).await;
    let p1 = project("p1");

    h.engine.disable(root.id).await.unwrap();
    assert!(h.engine.get_tree(&p1, true).await.unwrap().is_empty());

    let enabled = h.engine.enable(root.id).await.unwrap();
    assert!(!enabled.disabled);
    assert_eq!(
        shape(&h.engine.get_tree(&p1, true).await.unwrap()),
        vec![expect_node("R", &["r1"])]
    );
}

#[tokio::test]
async fn project_sees_globals_and_its_own_customs() {
    let h = setup_engine(true);
    let g = h.create(global("G")).await;
    h.create(custom("mine", "p1")).await;
    h.create(custom("theirs", "p2")).await;
    h.create_under(&g, custom("p2 child", "p2")).await;

    let names: Vec<String> = h
        .engine
        .get_all_by_project(&project("p1"))
        .await
        .unwrap()
        .into_iter()
        .map(|rc| rc.name)
        .collect();
    assert_eq!(names, vec!["G".to_string(), "mine".to_string()]);

    // GLOBAL children span projects in the tree
    assert_eq!(
        shape(&h.engine.get_tree(&project("p1"), false).await.unwrap()),
        vec![expect_node("G", &["p2 child"]), expect_node("mine", &[])]
    );
}

#[tokio::test]
async fn get_by_ids_skips_unknown_ids() {
    let h = setup_engine(false);
    let a = h.create(custom("a", "p1")).await;
    let b = h.create(custom("b", "p1")).await;

    let found = h
        .engine
        .get_by_ids(&[b.id, rca_core::RootCauseId::new(), a.id])
        .await
        .unwrap();
    assert_eq!(found, vec![b, a]);
}

#[tokio::test]
async fn store_outage_surfaces_as_retryable() {
    let h = setup_engine(false);
    h.store.set_unavailable(true);

    let err = h.engine.get_all().await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert!(err.is_retryable());

    h.store.clear_failures();
    assert!(h.engine.get_all().await.unwrap().is_empty());
}
