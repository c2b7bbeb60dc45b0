use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use table_watch::engine::{table_occupancy, TextRenderer};
use table_watch::{Annotator, BBox, ClassStyle, Detection, ObjectClass, RenderStyle};

const LABELS: [&str; 6] = ["person", "book", "table", "chair", "laptop", "dining table"];

fn random_box(rng: &mut StdRng) -> BBox {
    let x1 = rng.gen_range(0..600);
    let y1 = rng.gen_range(0..440);
    let x2 = x1 + rng.gen_range(0..=(639 - x1));
    let y2 = y1 + rng.gen_range(0..=(479 - y1));
    BBox::new(x1, y1, x2, y2)
}

fn random_detections(rng: &mut StdRng, count: usize) -> Vec<Detection> {
    (0..count)
        .map(|_| {
            let label = LABELS[rng.gen_range(0..LABELS.len())];
            Detection::new(label, random_box(rng), rng.gen_range(0.3..1.0))
        })
        .collect()
}

fn annotator() -> Annotator {
    Annotator::new(
        ClassStyle::default(),
        RenderStyle::default(),
        vec![ObjectClass::Chair],
        TextRenderer::without_font(),
    )
}

fn naive_occupied(table: &BBox, seats: &[BBox]) -> bool {
    seats.iter().any(|s| {
        s.x1 > table.x1 && s.y1 > table.y1 && s.x2 < table.x2 && s.y2 < table.y2
    })
}

#[test]
fn occupancy_matches_strict_containment() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let tables: Vec<BBox> = (0..rng.gen_range(0..5)).map(|_| random_box(&mut rng)).collect();
        let seats: Vec<BBox> = (0..rng.gen_range(0..8)).map(|_| random_box(&mut rng)).collect();
        let occupied = table_occupancy(&tables, &seats);
        assert_eq!(occupied.len(), tables.len());
        for (table, flag) in tables.iter().zip(&occupied) {
            assert_eq!(*flag, naive_occupied(table, &seats), "{:?} {:?}", table, seats);
        }
    }
}

#[test]
fn shared_edges_never_count() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let table = random_box(&mut rng);
        let touching = [
            BBox::new(table.x1, table.y1 + 1, table.x2 - 1, table.y2 - 1),
            BBox::new(table.x1 + 1, table.y1, table.x2 - 1, table.y2 - 1),
            BBox::new(table.x1 + 1, table.y1 + 1, table.x2, table.y2 - 1),
            BBox::new(table.x1 + 1, table.y1 + 1, table.x2 - 1, table.y2),
            table,
        ];
        assert_eq!(table_occupancy(&[table], &touching), vec![false]);
    }
}

#[test]
fn report_is_idempotent_and_counts_people() {
    let mut rng = StdRng::seed_from_u64(42);
    let engine = annotator();
    for _ in 0..100 {
        let n = rng.gen_range(0..12);
        let detections = random_detections(&mut rng, n);
        let (first_plan, first) = engine.plan(640, 480, &detections);
        let (second_plan, second) = engine.plan(640, 480, &detections);
        assert_eq!(first, second);
        assert_eq!(first_plan, second_plan);

        let people = detections.iter().filter(|d| d.label() == "person").count();
        assert_eq!(first.person_count, people);

        let tables = detections
            .iter()
            .filter(|d| matches!(d.label(), "table" | "dining table"))
            .count();
        assert_eq!(first.tables.len(), tables);
        for (i, status) in first.tables.iter().enumerate() {
            assert_eq!(status.table_index, i + 1);
        }
    }
}

#[test]
fn table_numbering_follows_detection_order() {
    let engine = annotator();
    let a = Detection::new("table", BBox::new(0, 0, 100, 100), 0.9);
    let b = Detection::new("table", BBox::new(200, 200, 400, 400), 0.9);
    let chair = Detection::new("chair", BBox::new(250, 250, 300, 300), 0.9);

    let (plan, report) = engine.plan(640, 480, &[a.clone(), b.clone(), chair.clone()]);
    assert_eq!(report.occupied_indices(), vec![2]);
    assert!(plan.text_op("Table 1: Empty").is_some());
    assert!(plan.text_op("Table 2: Occupied").is_some());

    let (_, swapped) = engine.plan(640, 480, &[b, a, chair]);
    assert_eq!(swapped.occupied_indices(), vec![1]);
}

#[test]
fn annotating_two_copies_gives_identical_frames_and_reports() {
    let mut rng = StdRng::seed_from_u64(3);
    let engine = annotator();
    let original = table_watch::Frame::filled(640, 480, image::Rgb([30, 30, 30])).unwrap();
    for _ in 0..20 {
        let n = rng.gen_range(1..8);
        let detections = random_detections(&mut rng, n);
        let mut first = original.clone();
        let mut second = original.clone();
        let a = engine.annotate(&mut first, &detections);
        let b = engine.annotate(&mut second, &detections);
        assert_eq!(a, b);
        assert_eq!(first, second);
    }
}
