mod common;

use std::f64::consts::PI;

use common::{close, gap, layout_with, min_separation, partners};
use rnalayout_core::{
    compute_layout, decompose, GeneralLayoutProps, LayoutEngine, Loop, LoopChild, LoopTree,
    OutermostLoopShape, PerBaseLayoutProps, StrictLayout,
};

const STRUCTURES: &[&str] = &[
    "(((...)))",
    "((((....))))..((((((....))))))",
    "((.((....)).))",
    "((..((...))..((...))))",
    "..((..((...))...((...)).))...(((....)))",
    ".((((((.((((....))))((((...))))..(((...)))..))))))..",
    "(((((.((....))..((...))....((((...))))..((.....)).)))))",
    "(())((..))...(((...)))",
];

fn variants() -> Vec<GeneralLayoutProps> {
    vec![
        GeneralLayoutProps::default(),
        GeneralLayoutProps {
            outermost_loop_shape: OutermostLoopShape::Round,
            ..GeneralLayoutProps::default()
        },
        GeneralLayoutProps {
            outermost_loop_shape: OutermostLoopShape::Round,
            termini_gap: 2.0,
            ..GeneralLayoutProps::default()
        },
        GeneralLayoutProps {
            base_pair_spacing: 1.5,
            base_stacking_spacing: 0.8,
            min_loop_radius: 2.0,
            rotation: 0.7,
            ..GeneralLayoutProps::default()
        },
    ]
}

fn for_each_layout(mut check: impl FnMut(&str, &GeneralLayoutProps, &StrictLayout)) {
    for structure in STRUCTURES {
        for general in variants() {
            let l = layout_with(structure, &general, &PerBaseLayoutProps::default());
            check(structure, &general, &l);
        }
    }
}

#[test]
fn test_one_finite_coordinate_per_position() {
    for_each_layout(|structure, _, l| {
        assert_eq!(l.len(), structure.len());
        assert!(l.anomalies.is_empty(), "{structure}: {:?}", l.anomalies);
        for c in &l.coordinates {
            assert!(c.x.is_finite() && c.y.is_finite(), "{structure}");
        }
    });
}

#[test]
fn test_pairs_at_pair_spacing() {
    for_each_layout(|structure, general, l| {
        for (p, q) in partners(structure).pairs() {
            assert!(
                close(gap(l, p, q), general.base_pair_spacing),
                "{structure}: pair {p}-{q}"
            );
        }
    });
}

#[test]
fn test_stem_neighbours_at_stacking_spacing() {
    for_each_layout(|structure, general, l| {
        for stem in &l.stems {
            for k in 1..stem.size {
                let (p, q) = (stem.position5 + k, stem.position3 - k);
                assert!(close(gap(l, p - 1, p), general.base_stacking_spacing));
                assert!(close(gap(l, q, q + 1), general.base_stacking_spacing));
            }
        }
    });
}

#[test]
fn test_round_loops_close() {
    for_each_layout(|structure, general, l| {
        for (id, lp) in l.loops.iter().enumerate() {
            if lp.spans.is_empty() {
                continue;
            }
            assert!(lp.radius >= general.min_loop_radius, "{structure}: loop {id}");
            let pair_angle = 2.0 * (general.base_pair_spacing / (2.0 * lp.radius)).asin();
            let total = lp.spans.iter().sum::<f64>() + pair_angle;
            assert!(close(total, 2.0 * PI), "{structure}: loop {id} covers {total}");
        }
    });
}

#[test]
fn test_loop_bases_on_circle() {
    for_each_layout(|structure, _, l| {
        let tree = decompose(&partners(structure)).unwrap();
        for (lp, meta) in tree.loops.iter().zip(&l.loops) {
            let Some(center) = meta.center else {
                continue;
            };
            if meta.radius == 0.0 {
                continue;
            }
            for child in lp.children() {
                let positions: Vec<usize> = match child {
                    LoopChild::Linker(linker) => linker.positions().collect(),
                    LoopChild::Stem(id) => {
                        let stem = tree.stem(id);
                        vec![stem.position5, stem.position3]
                    }
                };
                for p in positions {
                    let r = l.coordinates[p - 1].distance(center);
                    assert!(close(r, meta.radius), "{structure}: position {p}");
                }
            }
            if let Some(closing) = lp.closing_stem() {
                let (p, q) = tree.stem(closing).innermost_pair();
                assert!(close(l.coordinates[p - 1].distance(center), meta.radius));
                assert!(close(l.coordinates[q - 1].distance(center), meta.radius));
            }
        }
    });
}

/// Positions placed on a loop's perimeter.
fn loop_members(tree: &LoopTree, lp: &Loop) -> Vec<usize> {
    let mut members = Vec::new();
    for child in lp.children() {
        match child {
            LoopChild::Linker(linker) => members.extend(linker.positions()),
            LoopChild::Stem(id) => {
                let stem = tree.stem(id);
                members.extend([stem.position5, stem.position3]);
            }
        }
    }
    if let Some(closing) = lp.closing_stem() {
        let (p, q) = tree.stem(closing).innermost_pair();
        members.extend([p, q]);
    }
    members
}

#[test]
fn test_no_overlap_within_stems_and_loops() {
    for structure in STRUCTURES {
        let pt = partners(structure);
        let tree = decompose(&pt).unwrap();
        for general in variants() {
            let tolerance = 0.5 * general.base_pair_spacing.min(general.base_stacking_spacing);
            for flip_all in [false, true] {
                let mut per_base = PerBaseLayoutProps::new();
                if flip_all {
                    for node in &tree.stems {
                        per_base.toggle_flip_stem(&node.stem);
                    }
                }
                let l = compute_layout(&pt, &general, &per_base).unwrap();
                for node in &tree.stems {
                    let members = node.stem.side5().chain(node.stem.side3());
                    let d = min_separation(&l, members);
                    assert!(d >= tolerance, "{structure}: stem {:?} at {d}", node.stem);
                }
                for (id, lp) in tree.loops.iter().enumerate() {
                    let d = min_separation(&l, loop_members(&tree, lp));
                    assert!(d >= tolerance, "{structure}: loop {id} at {d}, flipped {flip_all}");
                }
            }
        }
    }
}

#[test]
fn test_bounding_box_centred() {
    for structure in STRUCTURES {
        let l = layout_with(
            structure,
            &GeneralLayoutProps::default(),
            &PerBaseLayoutProps::default(),
        );
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for c in &l.coordinates {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }
        assert!(close(min_x + max_x, 0.0), "{structure}");
        assert!(close(min_y + max_y, 0.0), "{structure}");
    }
}

#[test]
fn test_rotation_preserves_distances() {
    for structure in STRUCTURES {
        let a = layout_with(
            structure,
            &GeneralLayoutProps::default(),
            &PerBaseLayoutProps::default(),
        );
        let general = GeneralLayoutProps {
            rotation: 2.1,
            ..GeneralLayoutProps::default()
        };
        let b = layout_with(structure, &general, &PerBaseLayoutProps::default());
        for p in 1..=a.len() {
            for q in (p + 1)..=a.len() {
                assert!(close(gap(&a, p, q), gap(&b, p, q)), "{structure}: {p}-{q}");
            }
        }
    }
}

#[test]
fn test_every_pair_in_one_stem() {
    for structure in STRUCTURES {
        let pt = partners(structure);
        let l = layout_with(
            structure,
            &GeneralLayoutProps::default(),
            &PerBaseLayoutProps::default(),
        );
        for (p, q) in pt.pairs() {
            let owners: Vec<_> = l.stems.iter().filter(|s| s.contains(p)).collect();
            assert_eq!(owners.len(), 1, "{structure}: position {p}");
            assert!(owners[0].contains(q));
        }
        for p in 1..=pt.len() {
            if !pt.is_paired(p) {
                assert!(l.stem_containing(p).is_none());
            }
        }
    }
}

#[test]
fn test_engine_matches_fresh_layout() {
    let mut engine = LayoutEngine::new();
    let general = GeneralLayoutProps::default();
    for structure in STRUCTURES {
        let pt = partners(structure);
        let mut per_base = PerBaseLayoutProps::new();
        for step in 0..3 {
            let cached = engine.compute(&pt, &general, &per_base).unwrap();
            let fresh = compute_layout(&pt, &general, &per_base).unwrap();
            assert_eq!(cached, fresh, "{structure}: step {step}");
            if let Some(stem) = fresh.stems.first() {
                per_base.toggle_flip_stem(&stem.stem());
            }
            per_base.set_stretch(1, 1.0 + step as f64);
        }
    }
}
