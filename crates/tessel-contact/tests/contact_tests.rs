//! Integration tests for tessel-contact.

use std::collections::BTreeSet;

use approx::assert_relative_eq;
use proptest::prelude::*;
use tessel_contact::{
    CandidatePair, CollisionConfig, CollisionDetector, ContactResponse, ExactPair,
    NullContactResponse, XpbdCollisionResponse,
};
use tessel_gpu::{CpuFallback, GpuBackend, ParallelCpu};
use tessel_math::{Aabb, Vec3};
use tessel_mesh::generators::{
    coincident_cluster, folded_sheet, random_triangle_soup, unit_triangle,
};
use tessel_mesh::TriangleMesh;
use tessel_solver::SimulationState;
use tessel_telemetry::{EventBus, EventKind, VecSink};
use tessel_types::constants::{INVALID_NODE, MAX_TRAVERSAL_STACK};
use tessel_types::TesselError;

// ─── Helpers ──────────────────────────────────────────────────

fn cpu() -> Box<dyn GpuBackend> {
    Box::new(CpuFallback::new())
}

fn parallel() -> Box<dyn GpuBackend> {
    Box::new(ParallelCpu::with_threads(4))
}

fn state_for(mesh: &TriangleMesh) -> SimulationState {
    SimulationState::from_mesh(mesh, 1.0, &vec![false; mesh.vertex_count()]).unwrap()
}

fn detect_with(
    mesh: &TriangleMesh,
    config: CollisionConfig,
    backend: Box<dyn GpuBackend>,
) -> CollisionDetector {
    let mut detector = CollisionDetector::new(mesh, config, backend).unwrap();
    detector.detect(&state_for(mesh)).unwrap();
    detector
}

fn two_triangles(offset_x: f32, offset_z: f32) -> TriangleMesh {
    let mut mesh = unit_triangle(0.0, 0.0);
    mesh.append(&unit_triangle(offset_x, offset_z));
    mesh
}

/// Every unordered pair whose inflated tight boxes overlap.
fn brute_force_pairs(mesh: &TriangleMesh, margin: f32) -> BTreeSet<CandidatePair> {
    let boxes: Vec<Aabb> = (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = mesh.triangle(t).map(|v| mesh.position(v as usize));
            Aabb::from_triangle(a, b, c).inflate(margin)
        })
        .collect();
    let mut pairs = BTreeSet::new();
    for i in 0..boxes.len() {
        for j in i + 1..boxes.len() {
            if boxes[i].overlaps(&boxes[j]) {
                pairs.insert(CandidatePair::new(i as u32, j as u32));
            }
        }
    }
    pairs
}

fn pair_set(pairs: &[CandidatePair]) -> BTreeSet<CandidatePair> {
    pairs.iter().map(|p| p.normalized()).collect()
}

// ─── Bounds ───────────────────────────────────────────────────

#[test]
fn triangle_aabbs_contain_their_vertices() {
    let mesh = random_triangle_soup(300, 5.0, 0.5, 11);
    let detector = detect_with(&mesh, CollisionConfig::default(), cpu());
    let boxes = detector.triangle_aabbs();

    assert_eq!(boxes.len(), mesh.triangle_count());
    for (t, aabb) in boxes.iter().enumerate() {
        for v in mesh.triangle(t) {
            assert!(aabb.contains_point(mesh.position(v as usize)));
        }
    }
}

#[test]
fn global_bound_is_tight() {
    for count in [1, 2, 3, 255, 256, 257, 1000, 5000] {
        let mesh = random_triangle_soup(count, 5.0, 0.5, count as u64);
        let detector = detect_with(&mesh, CollisionConfig::default(), parallel());

        let mut lower = Vec3::splat(f32::INFINITY);
        let mut upper = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..mesh.vertex_count() {
            lower = lower.min(mesh.position(i));
            upper = upper.max(mesh.position(i));
        }
        let bound = detector.global_bound().unwrap();
        assert_eq!(bound, Aabb::new(lower, upper), "count = {count}");
    }
}

#[test]
fn single_triangle_bound_is_its_box() {
    let mesh = unit_triangle(2.0, -1.0);
    let detector = detect_with(&mesh, CollisionConfig::default(), cpu());
    let bound = detector.global_bound().unwrap();
    assert_eq!(bound.lower, Vec3::new(2.0, 0.0, -1.0));
    assert_eq!(bound.upper, Vec3::new(3.0, 1.0, -1.0));
}

// ─── Sort + Hierarchy ─────────────────────────────────────────

#[test]
fn codes_are_sorted_and_leaves_permute_triangles() {
    let mesh = random_triangle_soup(1000, 10.0, 0.3, 3);
    let detector = detect_with(&mesh, CollisionConfig::default(), parallel());

    let codes = detector.sorted_codes();
    assert!(codes.windows(2).all(|w| w[0] <= w[1]));

    let snapshot = detector.lbvh_snapshot();
    let mut leaves = snapshot.leaf_triangles.clone();
    leaves.sort_unstable();
    assert_eq!(leaves, (0..1000).collect::<Vec<u32>>());
}

#[test]
fn tree_shape_is_a_full_binary_tree() {
    for count in [2, 3, 7, 100, 1000] {
        let mesh = random_triangle_soup(count, 10.0, 0.3, 99);
        let snapshot = detect_with(&mesh, CollisionConfig::default(), cpu()).lbvh_snapshot();

        assert_eq!(snapshot.nodes.len(), 2 * count - 1);
        snapshot.validate_shape().unwrap();
        assert_eq!(snapshot.nodes[count].parent, INVALID_NODE);
        let internal_children = snapshot.nodes[count..]
            .iter()
            .filter(|n| n.left != INVALID_NODE && n.right != INVALID_NODE)
            .count();
        assert_eq!(internal_children, count - 1);
    }
}

#[test]
fn equal_codes_still_build_a_valid_tree() {
    let mesh = coincident_cluster(50, Vec3::new(1.0, 2.0, 3.0));
    let detector = detect_with(&mesh, CollisionConfig::default(), cpu());

    assert!(detector.sorted_codes().iter().all(|&c| c == detector.sorted_codes()[0]));
    let snapshot = detector.lbvh_snapshot();
    snapshot.validate_shape().unwrap();
    // Stable sort keeps equal codes in ascending triangle order.
    assert_eq!(snapshot.leaf_triangles, (0..50).collect::<Vec<u32>>());
    assert!(snapshot.depth() <= MAX_TRAVERSAL_STACK);
}

#[test]
fn internal_boxes_are_unions_of_children() {
    let mesh = random_triangle_soup(777, 4.0, 0.5, 21);
    let config = CollisionConfig::default();
    let margin = config.extended_dist();
    let snapshot = detect_with(&mesh, config, parallel()).lbvh_snapshot();

    snapshot.validate_bounds().unwrap();
    let root = snapshot.aabbs[snapshot.root().unwrap() as usize];
    for (leaf, &t) in snapshot.leaf_triangles.iter().enumerate() {
        let [a, b, c] = mesh.triangle(t as usize).map(|v| mesh.position(v as usize));
        let expected = Aabb::from_triangle(a, b, c).inflate(margin);
        assert_eq!(snapshot.aabbs[leaf], expected);
        assert!(root.contains(&expected));
    }
}

#[test]
fn single_triangle_has_no_internal_nodes_and_no_pairs() {
    let mesh = unit_triangle(0.0, 0.0);
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();
    let report = detector.detect(&state_for(&mesh)).unwrap();

    assert_eq!(report.candidate_pairs, 0);
    assert_eq!(report.exact_pairs, 0);
    let snapshot = detector.lbvh_snapshot();
    assert_eq!(snapshot.nodes.len(), 1);
    assert_eq!(snapshot.root(), Some(0));
    snapshot.validate_shape().unwrap();
}

// ─── Broad Phase ──────────────────────────────────────────────

#[test]
fn broad_phase_matches_brute_force() {
    let mesh = random_triangle_soup(400, 4.0, 0.4, 5);
    let config = CollisionConfig::default();
    let expected = brute_force_pairs(&mesh, config.extended_dist());
    assert!(!expected.is_empty());

    for backend in [cpu(), parallel()] {
        let detector = detect_with(&mesh, config.clone(), backend);
        let pairs = detector.candidate_pairs();
        assert_eq!(pairs.len(), expected.len());
        assert_eq!(pair_set(&pairs), expected);
    }
}

#[test]
fn broad_phase_never_pairs_a_triangle_with_itself_or_twice() {
    let mesh = folded_sheet(12, 12, 1.0, 0.004);
    let detector = detect_with(&mesh, CollisionConfig::default(), parallel());
    let pairs = detector.candidate_pairs();

    assert!(!pairs.is_empty());
    assert!(pairs.iter().all(|p| p.a < p.b));
    assert_eq!(pair_set(&pairs).len(), pairs.len());
}

#[test]
fn candidate_capacity_is_clamped() {
    // 64 coincident triangles: every one of the 2016 pairs overlaps.
    let mesh = coincident_cluster(64, Vec3::ZERO);
    let config = CollisionConfig {
        max_collision_pairs: 100,
        ..Default::default()
    };
    let mut detector = CollisionDetector::new(&mesh, config, parallel()).unwrap();
    let report = detector.detect(&state_for(&mesh)).unwrap();

    assert_eq!(report.candidate_pairs, 100);
    assert_eq!(report.candidates_dropped, 64 * 63 / 2 - 100);
    let pairs = detector.candidate_pairs();
    assert_eq!(pairs.len(), 100);
    assert!(pairs.iter().all(|p| p.a < p.b && p.b < 64));
}

#[test]
fn separated_triangles_produce_no_pairs() {
    let mesh = two_triangles(5.0, 0.0);
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();
    let report = detector.detect(&state_for(&mesh)).unwrap();

    assert_eq!(report.candidate_pairs, 0);
    assert_eq!(report.exact_pairs, 0);
    assert!(detector.candidate_pairs().is_empty());
}

#[test]
fn overlapping_triangles_produce_one_pair() {
    let mesh = two_triangles(0.25, 0.005);

    // Within the contact distance: a corner of each triangle hovers
    // 5mm over the other one.
    let detector = detect_with(&mesh, CollisionConfig::default(), cpu());
    assert_eq!(detector.candidate_pairs(), vec![CandidatePair::new(0, 1)]);
    let exact: BTreeSet<ExactPair> = detector.exact_pairs().into_iter().collect();
    let expected: BTreeSet<ExactPair> =
        [ExactPair::new(3, [0, 1, 2]), ExactPair::new(1, [3, 4, 5])].into();
    assert_eq!(exact, expected);

    // Same broad pair, but nothing is close enough for the narrow phase.
    let config = CollisionConfig {
        collision_minimal_dist: 0.001,
        margin_multiplier: 10.0,
        ..Default::default()
    };
    let detector = detect_with(&mesh, config, cpu());
    assert_eq!(detector.candidate_pairs().len(), 1);
    assert!(detector.exact_pairs().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn broad_phase_is_sound_for_random_soups(count in 2usize..150, seed in any::<u64>()) {
        let mesh = random_triangle_soup(count, 2.0, 0.5, seed);
        let config = CollisionConfig::default();
        let expected = brute_force_pairs(&mesh, config.extended_dist());
        let detector = detect_with(&mesh, config, parallel());

        prop_assert_eq!(pair_set(&detector.candidate_pairs()), expected);
        prop_assert!(detector.lbvh_snapshot().validate_shape().is_ok());
    }
}

// ─── Narrow Phase ─────────────────────────────────────────────

#[test]
fn folded_sheet_contacts_cross_the_fold() {
    let mesh = folded_sheet(6, 6, 1.0, 0.005);
    let half = (mesh.vertex_count() / 2) as u32;
    let detector = detect_with(&mesh, CollisionConfig::default(), parallel());
    let exact = detector.exact_pairs();

    assert!(!exact.is_empty());
    for pair in &exact {
        let vertex_upper = pair.vertex >= half;
        assert!(pair.face.iter().all(|&f| (f >= half) != vertex_upper));
    }
}

#[test]
fn exact_capacity_is_clamped() {
    let mesh = folded_sheet(6, 6, 1.0, 0.005);
    let config = CollisionConfig {
        max_collision_pairs: 8,
        ..Default::default()
    };
    let mut detector = CollisionDetector::new(&mesh, config, cpu()).unwrap();
    let report = detector.detect(&state_for(&mesh)).unwrap();

    assert_eq!(report.candidate_pairs, 8);
    assert!(report.exact_pairs <= 8);
    assert_eq!(detector.exact_pairs().len(), report.exact_pairs as usize);
}

// ─── Determinism & Degenerate Input ──────────────────────────

#[test]
fn repeated_detection_is_deterministic() {
    let mesh = random_triangle_soup(1000, 6.0, 0.4, 1234);
    let state = state_for(&mesh);
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();

    detector.detect(&state).unwrap();
    let codes = detector.sorted_codes();
    let tree = detector.lbvh_snapshot();
    let pairs = detector.candidate_pairs();
    let exact = detector.exact_pairs();

    detector.detect(&state).unwrap();
    assert_eq!(detector.sorted_codes(), codes);
    assert_eq!(detector.lbvh_snapshot(), tree);
    assert_eq!(detector.candidate_pairs(), pairs);
    assert_eq!(detector.exact_pairs(), exact);

    // A concurrent backend builds the same tree; only append order may differ.
    let other = detect_with(&mesh, CollisionConfig::default(), parallel());
    assert_eq!(other.sorted_codes(), codes);
    assert_eq!(other.lbvh_snapshot(), tree);
    assert_eq!(pair_set(&other.candidate_pairs()), pair_set(&pairs));
}

#[test]
fn coincident_triangles_reduce_to_a_point() {
    let point = Vec3::new(-3.0, 0.5, 8.0);
    let mesh = coincident_cluster(20, point);
    let detector = detect_with(&mesh, CollisionConfig::default(), cpu());

    let bound = detector.global_bound().unwrap();
    assert!(bound.is_finite());
    assert_eq!(bound, Aabb::from_point(point));
    assert!(detector.sorted_codes().iter().all(|&c| c == 0));
    assert!(detector.lbvh_snapshot().aabbs.iter().all(|b| b.is_finite()));
    // Degenerate faces never produce contacts.
    assert!(detector.exact_pairs().is_empty());
}

#[test]
fn empty_mesh_is_a_fast_exit() {
    let mesh = TriangleMesh::default();
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();
    let report = detector.detect(&state_for(&mesh)).unwrap();

    assert_eq!(report.submissions, 0);
    assert_eq!(report.global_bound, Aabb::EMPTY);
    assert!(detector.sorted_codes().is_empty());
}

// ─── Session ──────────────────────────────────────────────────

#[test]
fn each_cycle_issues_three_submissions() {
    let mesh = random_triangle_soup(50, 2.0, 0.3, 8);
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();
    let state = state_for(&mesh);

    let first = detector.detect(&state).unwrap();
    let second = detector.detect(&state).unwrap();
    assert_eq!(first.submissions, 3);
    assert_eq!((first.cycle, second.cycle), (1, 2));
    assert_eq!(detector.cycle(), 2);
    assert_eq!(detector.last_report(), Some(&second));
}

#[test]
fn undersized_sort_scratch_is_fatal() {
    let mesh = random_triangle_soup(500, 2.0, 0.3, 1);
    let required = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu())
        .unwrap()
        .sort_requirements()
        .slots;

    let config = CollisionConfig {
        sort_scratch_slots: Some(required - 1),
        ..Default::default()
    };
    let result = CollisionDetector::new(&mesh, config, cpu());
    assert!(matches!(
        result,
        Err(TesselError::SortScratchTooSmall { required: r, available: a }) if r == required && a == required - 1
    ));

    let config = CollisionConfig {
        sort_scratch_slots: Some(required + 64),
        ..Default::default()
    };
    assert!(CollisionDetector::new(&mesh, config, cpu()).is_ok());
}

#[test]
fn invalid_config_is_rejected_at_start() {
    let mesh = unit_triangle(0.0, 0.0);
    let config = CollisionConfig {
        detection_interval: 0,
        ..Default::default()
    };
    assert!(matches!(
        CollisionDetector::new(&mesh, config, cpu()),
        Err(TesselError::InvalidConfig(_))
    ));
}

#[test]
fn wrong_vertex_count_is_rejected() {
    let mesh = two_triangles(3.0, 0.0);
    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu()).unwrap();
    let other = state_for(&unit_triangle(0.0, 0.0));
    assert!(matches!(
        detector.detect(&other),
        Err(TesselError::InvalidMesh(_))
    ));
}

#[test]
fn step_follows_detection_interval() {
    let mesh = two_triangles(0.25, 0.005);
    let config = CollisionConfig {
        detection_interval: 3,
        ..Default::default()
    };
    let mut detector = CollisionDetector::new(&mesh, config, cpu()).unwrap();
    let state = state_for(&mesh);

    let ran: Vec<u32> = (0..8)
        .filter(|&s| detector.step(s, &state).unwrap().is_some())
        .collect();
    assert_eq!(ran, vec![0, 3, 6]);
    assert_eq!(detector.cycle(), 3);
}

#[test]
fn detection_events_follow_the_cycle() {
    let mesh = two_triangles(0.25, 0.005);
    let sink = VecSink::new();
    let events = sink.events();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink));

    let mut detector = CollisionDetector::new(&mesh, CollisionConfig::default(), cpu())
        .unwrap()
        .with_event_bus(bus);
    detector.detect(&state_for(&mesh)).unwrap();

    let kinds: Vec<EventKind> = events.snapshot().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 8);
    assert_eq!(kinds[0], EventKind::DetectionBegin { triangles: 2 });
    assert!(matches!(&kinds[1], EventKind::Barrier { label, ticket: 1 } if label == "bounds"));
    assert!(matches!(kinds[2], EventKind::GlobalBound { .. }));
    assert!(matches!(&kinds[3], EventKind::Barrier { label, ticket: 2 } if label == "hierarchy"));
    assert_eq!(
        kinds[4],
        EventKind::BroadPhase {
            candidate_pairs: 1,
            dropped: 0
        }
    );
    assert!(matches!(&kinds[5], EventKind::Barrier { label, ticket: 3 } if label == "narrow"));
    assert_eq!(
        kinds[6],
        EventKind::NarrowPhase {
            exact_pairs: 2,
            dropped: 0
        }
    );
    assert!(matches!(kinds[7], EventKind::DetectionEnd { .. }));
}

// ─── Contact Response ─────────────────────────────────────────

#[test]
fn xpbd_pushes_vertex_out_to_thickness() {
    let mesh = two_triangles(0.25, 0.004);
    let mut pinned = vec![false; mesh.vertex_count()];
    pinned[..3].fill(true);
    let mut state = SimulationState::from_mesh(&mesh, 1.0, &pinned).unwrap();

    let config = CollisionConfig::default();
    let response = XpbdCollisionResponse::new(config.collision_minimal_dist, 0.0);
    let mut detector = CollisionDetector::new(&mesh, config, cpu()).unwrap();
    detector.detect(&state).unwrap();
    let result = detector.resolve(&response, &mut state, 1.0 / 240.0).unwrap();

    assert!(result.resolved_count >= 1);
    assert_relative_eq!(result.max_penetration, 0.006, epsilon = 1e-5);
    assert!(state.pos_z[3] >= 0.01 - 1e-5);
    for v in 0..3 {
        assert_eq!(state.position(v), mesh.position(v)); // Pinned
    }
}

#[test]
fn xpbd_ignores_satisfied_and_fully_pinned_contacts() {
    let mesh = two_triangles(0.25, 0.02);
    let mut state = SimulationState::from_mesh(&mesh, 1.0, &[true; 6]).unwrap();
    let response = XpbdCollisionResponse::new(0.01, 0.0);

    // Separated by more than the thickness: satisfied.
    let far = [ExactPair::new(3, [0, 1, 2])];
    let result = response.resolve(&far, &mut state, 0.01).unwrap();
    assert_eq!(result.resolved_count, 0);

    // Violated, but nothing can move.
    let response = XpbdCollisionResponse::new(0.05, 0.0);
    let result = response.resolve(&far, &mut state, 0.01).unwrap();
    assert_eq!(result.resolved_count, 0);
    assert_relative_eq!(result.max_penetration, 0.03, epsilon = 1e-6);
    assert_eq!(state.position(3), mesh.position(3));
}

#[test]
fn xpbd_compliance_softens_the_correction() {
    let mesh = two_triangles(0.25, 0.004);
    let mut pinned = vec![false; 6];
    pinned[..3].fill(true);
    let contact = [ExactPair::new(3, [0, 1, 2])];
    let dt = 0.01;

    let mut rigid = SimulationState::from_mesh(&mesh, 1.0, &pinned).unwrap();
    XpbdCollisionResponse::new(0.01, 0.0)
        .resolve(&contact, &mut rigid, dt)
        .unwrap();
    let mut soft = SimulationState::from_mesh(&mesh, 1.0, &pinned).unwrap();
    XpbdCollisionResponse::new(0.01, 1e-4)
        .resolve(&contact, &mut soft, dt)
        .unwrap();

    assert_relative_eq!(rigid.pos_z[3], 0.01, epsilon = 1e-6);
    // α̃ = 1e-4 / 1e-4 = 1, so half of the rigid correction.
    assert_relative_eq!(soft.pos_z[3], 0.007, epsilon = 1e-6);
}

#[test]
fn xpbd_rejects_out_of_range_contacts() {
    let mesh = unit_triangle(0.0, 0.0);
    let mut state = state_for(&mesh);
    let bad = [ExactPair::new(7, [0, 1, 2])];
    assert!(XpbdCollisionResponse::new(0.01, 0.0)
        .resolve(&bad, &mut state, 0.01)
        .is_err());
}

#[test]
fn null_contact_response_returns_default() {
    let mesh = unit_triangle(0.0, 0.0);
    let mut state = state_for(&mesh);
    let cr = NullContactResponse;
    let result = cr.resolve(&[], &mut state, 0.01).unwrap();
    assert_eq!(result.resolved_count, 0);
    assert_eq!(cr.name(), "null_contact_response");
}

// ─── Config & Pair Types ──────────────────────────────────────

#[test]
fn config_toml_round_trip() {
    let config = CollisionConfig {
        collision_minimal_dist: 0.002,
        detection_interval: 4,
        sort_scratch_slots: Some(4096),
        ..Default::default()
    };
    let text = config.to_toml_string().unwrap();
    assert_eq!(CollisionConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn config_validation() {
    assert!(CollisionConfig::default().validate().is_ok());
    for bad in [
        CollisionConfig {
            collision_minimal_dist: -1.0,
            ..Default::default()
        },
        CollisionConfig {
            margin_multiplier: f32::NAN,
            ..Default::default()
        },
        CollisionConfig {
            max_collision_pairs: 0,
            ..Default::default()
        },
    ] {
        assert!(bad.validate().is_err());
    }
    assert!(CollisionConfig::from_toml_str("detection_interval = 0").is_err());
    assert!(CollisionConfig::from_toml_str("margin_multiplier = \"wide\"").is_err());
}

#[test]
fn exact_pair_serialization() {
    let pair = ExactPair::new(10, [20, 30, 40]);
    let json = serde_json::to_string(&pair).unwrap();
    let recovered: ExactPair = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, pair);
    assert_eq!(ExactPair::from_lanes(&pair.to_lanes()), pair);
}
