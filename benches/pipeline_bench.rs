use criterion::{black_box, criterion_group, criterion_main, Criterion};

use barcode_validator::consensus::build_consensus;
use barcode_validator::example_gen::generate_traces;
use barcode_validator::quality_sequence::Alignment;
use barcode_validator::trimmer::{trim, TrimPolicy};

pub fn bench_trim(c: &mut Criterion) {
    let seq_lens = [700, 1500];
    let mut benchmark_group = c.benchmark_group("trim-group");

    for &sl in seq_lens.iter() {
        let (_barcode, traces) = generate_traces(sl, 8, 0.01, 0);
        let test_label = format!("trim_{sl}x8");
        benchmark_group.bench_function(&test_label, |b| b.iter(|| {
            black_box({
                traces.iter()
                    .map(|t| trim(t, TrimPolicy::Both, 0.05).unwrap())
                    .collect::<Vec<_>>()
            });
        }));
    }

    benchmark_group.finish();
}

pub fn bench_consensus(c: &mut Criterion) {
    let seq_lens = [700, 1500];
    let num_traces = [4, 30];
    let error_rates = [0.0, 0.02];

    let mut benchmark_group = c.benchmark_group("consensus-group");
    benchmark_group.sample_size(10);

    for &sl in seq_lens.iter() {
        for &nt in num_traces.iter() {
            for &er in error_rates.iter() {
                let (_barcode, traces) = generate_traces(sl, nt, er, 0);
                let alignment = Alignment::new(Some("barcode"), traces).unwrap();
                let test_label = format!("consensus_{sl}x{nt}_{er}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box(build_consensus(&alignment).unwrap());
                }));
            }
        }
    }

    benchmark_group.finish();
}

criterion_group!(benches, bench_trim, bench_consensus);
criterion_main!(benches);
