//! Parallel materialization yields one wrapper per node

use std::sync::Arc;
use std::thread;

use knife_core::{Package, Session, TypeNode};
use knife_test_fixtures::many_packages;

const PACKAGES: usize = 48;
const THREADS: usize = 8;

#[test]
fn test_parallel_lookups_share_instances() {
    let graph = Arc::new(many_packages(PACKAGES));
    let session = Session::new(graph.clone());
    let ids: Vec<_> = graph.package_ids().collect();

    let results: Vec<Vec<(Arc<Package>, Arc<TypeNode>)>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let session = &session;
                let graph = &graph;
                let mut order = ids.clone();
                // each thread walks the packages in a different order
                order.rotate_left(t * PACKAGES / THREADS);
                if t % 2 == 1 {
                    order.reverse();
                }
                s.spawn(move || {
                    order
                        .into_iter()
                        .map(|id| {
                            let pkg = session.package(id);
                            let scope = graph.package(id).scope;
                            let t = graph
                                .lookup(scope, "T")
                                .or_else(|| graph.lookup(scope, "Base"))
                                .map(|obj| graph.object(obj).ty)
                                .unwrap();
                            (pkg, session.type_node(t))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for id in &ids {
        let reference = session.package(*id);
        assert!(reference.get().is_some());
        for per_thread in &results {
            let (pkg, node) = per_thread
                .iter()
                .find(|(pkg, _)| pkg.id() == *id)
                .unwrap();
            assert!(Arc::ptr_eq(pkg, &reference));
            assert!(Arc::ptr_eq(node, &session.type_node(node.id())));
            assert!(node.is_populated());
        }
    }
}

#[test]
fn test_shared_import_materialized_once() {
    let graph = Arc::new(many_packages(16));
    let session = Arc::new(Session::new(graph.clone()));
    let shared = graph.package_by_path("example.com/shared").unwrap();

    let handles: Vec<_> = graph
        .package_ids()
        .map(|id| {
            let session = session.clone();
            thread::spawn(move || {
                let pkg = session.package(id);
                let _ = pkg.get();
                session.package(shared)
            })
        })
        .collect();

    let first = session.package(shared);
    for handle in handles {
        assert!(Arc::ptr_eq(&handle.join().unwrap(), &first));
    }
    assert_eq!(first.get().unwrap().types.names(), ["Base"]);
}
