//! Benchmarks for clipforge-core timecode and trim operations.
//!
//! Run with: cargo bench -p clipforge-core

use clipforge_core::{format_time, parse_time_string, TrimRange};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_timecode_formatting(c: &mut Criterion) {
    c.bench_function("format_time_short", |bencher| {
        bencher.iter(|| format_time(black_box(65.25)));
    });

    c.bench_function("format_time_hours", |bencher| {
        bencher.iter(|| format_time(black_box(3723.042)));
    });

    c.bench_function("parse_time_string", |bencher| {
        bencher.iter(|| parse_time_string(black_box("1:02:03.042")));
    });
}

fn bench_trim_updates(c: &mut Criterion) {
    // A drag delivers one setter call per pointer-move event.
    c.bench_function("trim_drag_sweep_1000", |bencher| {
        bencher.iter(|| {
            let mut range = TrimRange::with_duration(600.0);
            for i in 0..1000 {
                range.set_start(black_box(i as f64 * 0.7));
                range.set_end(black_box(600.0 - i as f64 * 0.3));
            }
            range
        });
    });
}

criterion_group!(benches, bench_timecode_formatting, bench_trim_updates);
criterion_main!(benches);
