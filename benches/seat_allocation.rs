use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ticketmonster::models::{
    EntityRef, PerformanceKey, SectionAllocation, SectionKey, VenueKey,
};

fn grid(rows: i32, per_row: i32) -> SectionAllocation {
    SectionAllocation::new(
        EntityRef::new(Some(1), PerformanceKey::default()),
        EntityRef::new(Some(1), SectionKey::new(Some(VenueKey::new("Roy Thomson Hall")), "A")),
        rows,
        per_row,
    )
}

// Заполнение секции группами до отказа
fn fill_section(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_section");
    for (rows, per_row) in [(10, 20), (40, 50)] {
        for contiguous in [true, false] {
            let id = BenchmarkId::new(
                if contiguous { "contiguous" } else { "scattered" },
                format!("{rows}x{per_row}"),
            );
            group.bench_with_input(id, &(rows, per_row), |b, &(rows, per_row)| {
                b.iter(|| {
                    let mut allocation = grid(rows, per_row);
                    while allocation.allocate_seats(black_box(3), contiguous).is_ok() {}
                    black_box(allocation.occupied_count())
                })
            });
        }
    }
    group.finish();
}

fn allocate_into_fragmented_section(c: &mut Criterion) {
    let mut base = grid(40, 50);
    let seats = base.allocate_seats(2000, false).unwrap_or_default();
    for seat in seats.iter().step_by(3) {
        base.deallocate(seat);
    }

    c.bench_function("allocate_into_fragmented_section", |b| {
        b.iter(|| {
            let mut allocation = base.clone();
            black_box(allocation.allocate_seats(black_box(2), true).is_ok())
        })
    });
}

criterion_group!(benches, fill_section, allocate_into_fragmented_section);
criterion_main!(benches);
