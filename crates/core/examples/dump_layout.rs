use rnalayout_core::{compute_layout, GeneralLayoutProps, Partners, PerBaseLayoutProps};

fn main() {
    // ((..((...))..((...))))
    let partners = Partners::new(vec![
        22, 21, 0, 0, 11, 10, 0, 0, 0, 6, 5, 0, 0, 20, 19, 0, 0, 0, 15, 14, 2, 1,
    ]);
    let layout = compute_layout(
        &partners,
        &GeneralLayoutProps::default(),
        &PerBaseLayoutProps::default(),
    )
    .unwrap();

    println!("=== BASES ===");
    for (i, c) in layout.coordinates.iter().enumerate() {
        println!("base[{}]: x={:.4} y={:.4}", i + 1, c.x, c.y);
    }
    println!("\n=== STEMS ===");
    for (i, s) in layout.stems.iter().enumerate() {
        println!(
            "stem[{}]: {}-{} size={} angle={:.4} flipped={}",
            i, s.position5, s.position3, s.size, s.angle, s.flipped
        );
    }
    println!("\n=== LOOPS ===");
    for (i, l) in layout.loops.iter().enumerate() {
        println!(
            "loop[{}]: {:?} closing={:?} children={:?} r={:.4}",
            i, l.kind, l.closing_stem, l.child_stems, l.radius
        );
    }
    println!("\n=== ANOMALIES ===");
    for a in &layout.anomalies {
        println!("{a}");
    }
}
