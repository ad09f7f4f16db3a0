//! # Search Tier Tests (T0-T4)
//!
//! If ANY tier fails, the matcher is INVALID.
//!
//! ## Tiers
//! - T0: Trivial Patterns
//! - T1: Store Symmetry
//! - T2: Single-Hop Expansion
//! - T3: Multi-Hop and Structural Checks
//! - T4: Cross-Vertex References and Persistence

use noema_core::{
    Data, EdgeType, ExactTemplate, GraphStore, Matcher, NodeHandle, NoemaError, SearchEngine,
    Subgraph,
};
use serde_json::json;

fn object(value: serde_json::Value) -> Data {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Data::new(),
    }
}

fn transitive() -> Data {
    object(json!({"transitive": true}))
}

/// Store with `thought_description` (directed) and `type_of` (transitive).
fn setup() -> (GraphStore, EdgeType, EdgeType) {
    let mut store = GraphStore::in_memory();
    let described = store
        .create_link_type("thought_description", false, Data::new())
        .expect("thought_description");
    let type_of = store
        .create_link_type("type_of", false, transitive())
        .expect("type_of");
    (store, described, type_of)
}

// =============================================================================
// TIER T0: TRIVIAL PATTERNS
// =============================================================================

mod t0_trivial_patterns {
    use super::*;

    /// T0.1: A concrete subgraph is returned as-is.
    #[test]
    fn concrete_subgraph_returns_itself() {
        let (mut store, described, _) = setup();
        let a = store.create(None).expect("create");
        let b = store.create(None).expect("create");

        // Not even connected in the graph: concrete patterns are not checked.
        let mut sg = Subgraph::new();
        let va = sg.add_vertex(Matcher::Id(a));
        let vb = sg.add_vertex(Matcher::Id(b));
        sg.add_edge(va, &described, vb).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results, vec![sg]);
        assert!(results[0].is_concrete());
    }

    /// T0.2: The empty subgraph is concrete.
    #[test]
    fn empty_subgraph_is_concrete() {
        let (mut store, _, _) = setup();
        let sg = Subgraph::new();

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results, vec![Subgraph::new()]);
    }

    /// T0.3: Filler-only patterns have no anchor and yield nothing.
    #[test]
    fn filler_only_yields_nothing() {
        let (mut store, described, _) = setup();
        let a = store.create(None).expect("create");
        let b = store.create(None).expect("create");
        store.link(&a, &described, &b).expect("link");

        let mut sg = Subgraph::new();
        let x = sg.add_vertex(Matcher::Filler);
        let y = sg.add_vertex(Matcher::Filler);
        sg.add_edge(x, &described, y).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert!(results.is_empty());
        assert!(!sg.is_concrete());
    }

    /// T0.4: A lone filler vertex cannot be bound.
    #[test]
    fn single_filler_yields_nothing() {
        let (mut store, _, _) = setup();
        let mut sg = Subgraph::new();
        sg.add_vertex(Matcher::Filler);

        assert!(SearchEngine::search(&mut store, &sg).expect("search").is_empty());
    }
}

// =============================================================================
// TIER T1: STORE SYMMETRY
// =============================================================================

mod t1_store_symmetry {
    use super::*;

    /// T1.1: Linking records the reverse under the opposite type.
    #[test]
    fn link_records_opposite() {
        let (mut store, described, _) = setup();
        let a = store.create(None).expect("create");
        let b = store.create(None).expect("create");
        let opposite = store
            .registry()
            .opposite(&described)
            .expect("opposite")
            .clone();

        store.link(&a, &described, &b).expect("link");
        assert!(store.linked(&b, &opposite).expect("linked").contains(&a));

        store.unlink(&a, &described, &b).expect("unlink");
        assert!(!store.linked(&a, &described).expect("linked").contains(&b));
        assert!(!store.linked(&b, &opposite).expect("linked").contains(&a));
    }

    /// T1.2: Wrong-shape arguments fail before any side effect.
    #[test]
    fn invalid_arguments_have_no_side_effects() {
        let (mut store, described, _) = setup();
        let a = store.create(None).expect("create");

        let result = store.link(&a, &described, "../escape");
        assert!(matches!(result, Err(NoemaError::InvalidArgument(_))));
        assert!(store.links(&a).expect("links").is_empty());
    }
}

// =============================================================================
// TIER T2: SINGLE-HOP EXPANSION
// =============================================================================

mod t2_single_hop {
    use super::*;

    /// T2.1: mark -> apple -> price{value: 10}.
    #[test]
    fn thought_description_chain() {
        let (mut store, described, _) = setup();
        let mark = store
            .create(Some(object(json!({"name": "mark"}))))
            .expect("create");
        let apple = store
            .create(Some(object(json!({"name": "apple"}))))
            .expect("create");
        let price = store
            .create(Some(object(json!({"value": 10, "unit": "usd"}))))
            .expect("create");
        let banana = store
            .create(Some(object(json!({"name": "banana"}))))
            .expect("create");
        let cost = store
            .create(Some(object(json!({"value": 5}))))
            .expect("create");

        store.link(&mark, &described, &apple).expect("link");
        store.link(&apple, &described, &price).expect("link");
        store.link(&mark, &described, &banana).expect("link");
        store.link(&banana, &described, &cost).expect("link");

        let mut sg = Subgraph::new();
        let m = sg.add_vertex(Matcher::Id(mark.clone()));
        let middle = sg.add_vertex(Matcher::Filler);
        let leaf = sg.add_vertex(Matcher::Similar(object(json!({"value": 10}))));
        sg.add_edge(m, &described, middle).expect("edge");
        sg.add_edge(middle, &described, leaf).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_concrete());
        assert_eq!(results[0].idea(m), Some(&mark));
        assert_eq!(results[0].idea(middle), Some(&apple));
        assert_eq!(results[0].idea(leaf), Some(&price));
    }

    /// T2.2: Two neighbors produce two independent branches.
    #[test]
    fn branches_are_independent() {
        let (mut store, described, _) = setup();
        let hub = store.create(None).expect("create");
        let left = store.create(None).expect("create");
        let right = store.create(None).expect("create");
        store.link(&hub, &described, &left).expect("link");
        store.link(&hub, &described, &right).expect("link");

        let mut sg = Subgraph::new();
        let h = sg.add_vertex(Matcher::Id(hub));
        let shared = sg.add_vertex(Matcher::Filler);
        sg.add_edge(h, &described, shared).expect("edge");
        let original = sg.clone();

        let mut results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 2);
        assert_ne!(results[0].idea(shared), results[1].idea(shared));
        assert_eq!(results[0].idea(shared), Some(&left));
        assert_eq!(results[1].idea(shared), Some(&right));

        // The caller's pattern is untouched, and results do not alias it
        // or each other.
        assert_eq!(sg, original);
        results[0].clear_ideas();
        assert_eq!(results[1].idea(shared), Some(&right));
        assert_eq!(sg.idea(shared), None);
    }

    /// T2.3: Matchers filter candidates.
    #[test]
    fn exact_matcher_filters_neighbors() {
        let (mut store, described, _) = setup();
        let hub = store.create(None).expect("create");
        let loose = store
            .create(Some(object(json!({"name": "apple", "ripe": true}))))
            .expect("create");
        let strict = store
            .create(Some(object(json!({"name": "apple"}))))
            .expect("create");
        store.link(&hub, &described, &loose).expect("link");
        store.link(&hub, &described, &strict).expect("link");

        let mut sg = Subgraph::new();
        let h = sg.add_vertex(Matcher::Id(hub));
        let v = sg.add_vertex(Matcher::Exact(ExactTemplate::Literal(object(
            json!({"name": "apple"}),
        ))));
        sg.add_edge(h, &described, v).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(v), Some(&strict));
    }

    /// T2.4: No matching neighbor yields no result, not an error.
    #[test]
    fn no_candidates_is_empty_result() {
        let (mut store, described, _) = setup();
        let lonely = store.create(None).expect("create");

        let mut sg = Subgraph::new();
        let l = sg.add_vertex(Matcher::Id(lonely));
        let v = sg.add_vertex(Matcher::Filler);
        sg.add_edge(l, &described, v).expect("edge");

        assert!(SearchEngine::search(&mut store, &sg).expect("search").is_empty());
    }
}

// =============================================================================
// TIER T3: MULTI-HOP AND STRUCTURAL CHECKS
// =============================================================================

mod t3_multi_hop {
    use super::*;

    /// T3.1: Transitive types match through the whole hierarchy.
    #[test]
    fn transitive_closure_reaches_indirect_children() {
        let (mut store, _, type_of) = setup();
        let square = store.create(None).expect("create");
        let rectangle = store.create(None).expect("create");
        let quad = store.create(None).expect("create");
        let shape = store.create(None).expect("create");
        let circle = store.create(None).expect("create");

        store.link(&square, &type_of, &rectangle).expect("link");
        store.link(&rectangle, &type_of, &quad).expect("link");
        store.link(&quad, &type_of, &shape).expect("link");
        store.link(&circle, &type_of, &shape).expect("link");

        let mut sg = Subgraph::new();
        let child = sg.add_vertex(Matcher::Filler);
        let root = sg.add_vertex(Matcher::Id(shape));
        sg.add_edge(child, &type_of, root).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        let found: Vec<_> = results
            .iter()
            .filter_map(|r| r.idea(child).cloned())
            .collect();
        assert!(found.contains(&quad));
        assert!(found.contains(&square));
        assert!(found.contains(&rectangle));
        assert!(found.contains(&circle));
        assert_eq!(found.len(), 4);
    }

    /// T3.2: A pinned edge that does not exist kills the branch.
    #[test]
    fn reversed_pinned_edge_prunes() {
        let mut store = GraphStore::in_memory();
        let d = store
            .create_link_type("d", false, Data::new())
            .expect("d");
        let fruit = store
            .create(Some(object(json!({"name": "fruit"}))))
            .expect("create");
        let apple = store
            .create(Some(object(json!({"name": "apple"}))))
            .expect("create");
        let banana = store
            .create(Some(object(json!({"name": "banana"}))))
            .expect("create");
        store.link(&fruit, &d, &apple).expect("link");
        store.link(&fruit, &d, &banana).expect("link");

        let mut sg = Subgraph::new();
        let f = sg.add_vertex(Matcher::Id(fruit));
        let a = sg.add_vertex(Matcher::Similar(object(json!({"name": "apple"}))));
        sg.add_edge(f, &d, a).expect("edge");

        // Resolves fine on its own.
        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(a), Some(&apple));

        // apple -d-> fruit does not exist.
        sg.add_edge(a, &d, f).expect("edge");
        assert!(SearchEngine::search(&mut store, &sg).expect("search").is_empty());
    }

    /// T3.3: Pinned edges are checked even when bound before search.
    #[test]
    fn preset_ideas_are_checked_against_edges() {
        let (mut store, described, _) = setup();
        let a = store.create(None).expect("create");
        let b = store.create(None).expect("create");
        let c = store.create(None).expect("create");
        store.link(&a, &described, &b).expect("link");

        let mut sg = Subgraph::new();
        let va = sg.add_vertex(Matcher::Id(a));
        let vb = sg.add_vertex(Matcher::Filler);
        let vc = sg.add_vertex(Matcher::Filler);
        sg.add_edge(va, &described, vb).expect("edge");
        sg.add_edge(vb, &described, vc).expect("edge");
        sg.set_idea(vc, c).expect("set");

        assert!(SearchEngine::search(&mut store, &sg).expect("search").is_empty());
    }

    /// T3.4: Deep hierarchies are followed to the end.
    #[test]
    fn transitive_closure_reaches_past_a_hundred_hops() {
        let (mut store, _, type_of) = setup();
        let chain: Vec<NodeHandle> = (0..105)
            .map(|_| store.create(None).expect("create"))
            .collect();
        for pair in chain.windows(2) {
            store.link(&pair[0], &type_of, &pair[1]).expect("link");
        }

        let mut sg = Subgraph::new();
        let child = sg.add_vertex(Matcher::Filler);
        let root = sg.add_vertex(Matcher::Id(chain[104].clone()));
        sg.add_edge(child, &type_of, root).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 104);
        assert!(
            results
                .iter()
                .any(|r| r.idea(child) == Some(&chain[0]))
        );
    }

    /// T3.5: Self-loops and cycles on transitive types are real edges.
    #[test]
    fn transitive_self_loop_matches() {
        let (mut store, _, type_of) = setup();
        let a = store.create(None).expect("create");
        store.link(&a, &type_of, &a).expect("link");

        let mut sg = Subgraph::new();
        let va = sg.add_vertex(Matcher::Id(a.clone()));
        let vb = sg.add_vertex(Matcher::Filler);
        sg.add_edge(va, &type_of, vb).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(vb), Some(&a));

        // Once `vb` is bound to `a`, the back edge is checked with both ends
        // pinned to the same node; the loop exists, so the branch survives.
        sg.add_edge(vb, &type_of, va).expect("edge");
        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(vb), Some(&a));
    }

    /// T3.6: A two-node cycle reaches back to its start.
    #[test]
    fn transitive_two_cycle_binds_both_nodes() {
        let (mut store, _, type_of) = setup();
        let a = store.create(None).expect("create");
        let b = store.create(None).expect("create");
        store.link(&a, &type_of, &b).expect("link");
        store.link(&b, &type_of, &a).expect("link");

        let mut sg = Subgraph::new();
        let va = sg.add_vertex(Matcher::Id(a.clone()));
        let vb = sg.add_vertex(Matcher::Filler);
        sg.add_edge(va, &type_of, vb).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        let found: Vec<_> = results.iter().filter_map(|r| r.idea(vb).cloned()).collect();
        assert_eq!(found, vec![b, a]);
    }
}

// =============================================================================
// TIER T4: CROSS-VERTEX REFERENCES AND PERSISTENCE
// =============================================================================

mod t4_references_and_persistence {
    use super::*;
    use noema_core::{FileBoundary, RedbBoundary, StorageBackend};
    use tempfile::tempdir;

    /// T4.1: `exact` with a reference tracks the referenced node's data.
    #[test]
    fn match_ref_follows_referenced_data() {
        let (mut store, described, _) = setup();
        let hub = store.create(None).expect("create");
        let pear = store
            .create(Some(object(json!({"name": "pear"}))))
            .expect("create");
        let apple = store
            .create(Some(object(json!({"name": "apple"}))))
            .expect("create");
        store.link(&hub, &described, &pear).expect("link");
        store.link(&hub, &described, &apple).expect("link");

        let anchor = store
            .create(Some(object(json!({"name": "pear"}))))
            .expect("create");

        let mut sg = Subgraph::new();
        let d = sg.add_vertex(Matcher::Filler);
        let h = sg.add_vertex(Matcher::Id(hub));
        let f = sg.add_vertex(Matcher::Exact(ExactTemplate::Ref(d)));
        sg.add_edge(h, &described, f).expect("edge");
        sg.set_idea(d, anchor.clone()).expect("set");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(f), Some(&pear));

        // New facts arrive; re-running the same pattern re-matches.
        store
            .update(&anchor, object(json!({"name": "apple"})))
            .expect("update");
        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(f), Some(&apple));
    }

    /// T4.2: Results are the same whether nodes are cached or reloaded.
    #[test]
    fn search_survives_reopen_over_file_boundary() {
        let temp = tempdir().expect("temp dir");
        let (hub, leaf) = {
            let backend = StorageBackend::File(FileBoundary::new(temp.path()));
            let mut store = GraphStore::open(backend).expect("open");
            let link = store
                .create_link_type("d", false, Data::new())
                .expect("d");
            let hub = store.context("root").expect("context");
            let leaf = store
                .create(Some(object(json!({"kind": "leaf"}))))
                .expect("create");
            store.link(&hub, &link, &leaf).expect("link");
            store.flush().expect("flush");
            (hub, leaf)
        };

        let backend = StorageBackend::File(FileBoundary::new(temp.path()));
        let mut store = GraphStore::open(backend).expect("reopen");
        let link = store
            .create_link_type("d", false, Data::new())
            .expect("d");
        assert_eq!(store.context("root").expect("context"), hub);

        let mut sg = Subgraph::new();
        let h = sg.add_vertex(Matcher::Id(hub.clone()));
        let l = sg.add_vertex(Matcher::Similar(object(json!({"kind": "leaf"}))));
        sg.add_edge(h, &link, l).expect("edge");

        let cold = SearchEngine::search(&mut store, &sg).expect("search");
        let warm = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(cold, warm);
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].idea(l), Some(&leaf));
    }

    /// T4.3: The redb boundary supports the same workflow.
    #[test]
    fn search_over_redb_boundary() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("graph.redb");
        let leaf = {
            let backend = StorageBackend::Redb(RedbBoundary::open(&path).expect("open db"));
            let mut store = GraphStore::open(backend).expect("open");
            let link = store
                .create_link_type("d", false, Data::new())
                .expect("d");
            let hub = store.create(None).expect("create");
            let leaf = store.create(None).expect("create");
            store.link(&hub, &link, &leaf).expect("link");
            store.close(&hub).expect("close");
            store.close(&leaf).expect("close");
            leaf
        };

        let backend = StorageBackend::Redb(RedbBoundary::open(&path).expect("reopen db"));
        let mut store = GraphStore::open(backend).expect("reopen");
        let link = store
            .create_link_type("d", false, Data::new())
            .expect("d");

        let mut sg = Subgraph::new();
        let h = sg.add_vertex(Matcher::Id(NodeHandle::new("1")));
        let l = sg.add_vertex(Matcher::Filler);
        sg.add_edge(h, &link, l).expect("edge");

        let results = SearchEngine::search(&mut store, &sg).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].idea(l), Some(&leaf));
        assert_eq!(store.create(None).expect("create").as_str(), "3");
    }
}
