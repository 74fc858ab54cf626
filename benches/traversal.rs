//! Performance benchmarks for graph traversal and incremental bounds.
//!
//! Run with: `cargo bench --bench traversal`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | DFS over 5k atoms | <2ms | Ladder graph, every rung closes a ring |
//! | Ring perception | <20ms at 1k atoms | Includes ring-system grouping |
//! | Interior drag update | O(1) bounds | No rescan when the extremum is untouched |
//! | Move resolution | <1ms | 100 stacked structures |

use std::collections::{BTreeMap, BTreeSet};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::DVec2;

use pose_scene_kernel::{
    traverse, Atom, AtomId, Edge, EdgeId, Endpoint, IntermolecularEdge, IntermolecularId, IntermolecularKind,
    MoveGranularity, NoopVisitor, PositionKey, Scene, SceneFragment, Structure, StructureId, StructureKind,
    TraversalOptions,
};

/// Ladder with `rungs` rungs: two rails of atoms joined at every step.
fn ladder(id: u32, first_atom: u32, rungs: u32) -> Structure {
    let mut st = Structure::new(StructureId::new(id), "LAD", StructureKind::Other);
    for i in 0..rungs {
        let x = i as f64 * 15.0;
        st.add_atom(Atom::new(AtomId::new(first_atom + 2 * i), "C", DVec2::new(x, 0.0))).unwrap();
        st.add_atom(Atom::new(AtomId::new(first_atom + 2 * i + 1), "C", DVec2::new(x, 15.0))).unwrap();
    }
    let mut next_edge = first_atom;
    let mut bond = |st: &mut Structure, a: u32, b: u32| {
        st.add_edge(Edge::single(EdgeId::new(next_edge), AtomId::new(a), AtomId::new(b))).unwrap();
        next_edge += 1;
    };
    for i in 0..rungs {
        let (top, bottom) = (first_atom + 2 * i, first_atom + 2 * i + 1);
        bond(&mut st, top, bottom);
        if i + 1 < rungs {
            bond(&mut st, top, top + 2);
            bond(&mut st, bottom, bottom + 2);
        }
    }
    st
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("dfs");

    for rungs in [50u32, 500, 2500] {
        let graph = ladder(1, 1, rungs);
        group.throughput(Throughput::Elements(graph.atom_count() as u64));
        group.bench_with_input(BenchmarkId::new("ladder_atoms", rungs * 2), &graph, |b, graph| {
            let options = TraversalOptions::covering(graph);
            b.iter(|| {
                let report = traverse(black_box(graph), &mut NoopVisitor, &options);
                assert_eq!(report.components, 1);
                report
            })
        });
    }

    group.finish();
}

fn bench_perceive_rings(c: &mut Criterion) {
    let mut group = c.benchmark_group("perceive_rings");

    for rungs in [10u32, 100, 500] {
        let graph = ladder(1, 1, rungs);
        group.bench_with_input(BenchmarkId::new("rungs", rungs), &graph, |b, graph| {
            b.iter(|| {
                let mut st = graph.clone();
                st.perceive_rings();
                st
            })
        });
    }

    group.finish();
}

/// Interior moves adjust bounds incrementally; moving the extremal atom
/// inward forces a rescan.
fn bench_set_positions(c: &mut Criterion) {
    let mut scene = Scene::new();
    scene
        .insert_fragment(&SceneFragment {
            structures: vec![ladder(1, 1, 1000)],
            ..SceneFragment::default()
        })
        .unwrap();

    let mut group = c.benchmark_group("set_positions");

    let interior = AtomId::new(1001);
    let home = scene.atom(interior).unwrap().coordinates;
    group.bench_function("interior_atom", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let to = if flip { home + DVec2::new(1.0, 1.0) } else { home };
            let positions = BTreeMap::from([(PositionKey::Atom(interior), to)]);
            scene.set_positions(black_box(&positions)).unwrap()
        })
    });

    let extremal = AtomId::new(1999);
    let home = scene.atom(extremal).unwrap().coordinates;
    group.bench_function("extremal_atom", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let to = if flip { home - DVec2::new(100.0, 0.0) } else { home };
            let positions = BTreeMap::from([(PositionKey::Atom(extremal), to)]);
            scene.set_positions(black_box(&positions)).unwrap()
        })
    });

    group.finish();
}

/// Move resolution over many ring structures chained by pi-stacking.
fn bench_affected_by_move(c: &mut Criterion) {
    let count = 100u32;
    let mut structures = Vec::new();
    let mut intermolecular = Vec::new();
    for i in 0..count {
        let mut st = ladder(i + 1, i * 100 + 1, 4);
        st.perceive_rings();
        structures.push(st);
    }
    for i in 0..count - 1 {
        let from = structures[i as usize].rings().next().unwrap().id;
        let to = structures[i as usize + 1].rings().next().unwrap().id;
        intermolecular.push(IntermolecularEdge::new(
            IntermolecularId::new(i),
            IntermolecularKind::PiStacking,
            (StructureId::new(i + 1), Endpoint::Ring(from)),
            (StructureId::new(i + 2), Endpoint::Ring(to)),
        ));
    }

    let mut scene = Scene::new();
    scene
        .insert_fragment(&SceneFragment {
            structures,
            intermolecular,
            ..SceneFragment::default()
        })
        .unwrap();

    let moving: BTreeSet<AtomId> = (0..count).step_by(2).map(|i| AtomId::new(i * 100 + 1)).collect();

    let mut group = c.benchmark_group("affected_by_move");
    for granularity in [MoveGranularity::Atoms, MoveGranularity::Structure] {
        group.bench_with_input(
            BenchmarkId::new("granularity", format!("{:?}", granularity)),
            &granularity,
            |b, granularity| {
                b.iter(|| {
                    let resolver = pose_scene_kernel::AffectedResolver::new(&scene);
                    resolver.affected_by_move(black_box(&moving), *granularity)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_traverse,
    bench_perceive_rings,
    bench_set_positions,
    bench_affected_by_move,
);

criterion_main!(benches);
