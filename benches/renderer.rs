use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use outlabels::config::Config;
use outlabels::geometry::{Insets, Point, Size};
use outlabels::ir::ChartSpec;
use outlabels::layout::{
    LabelGeometry, LayoutOptions, chart_area_for, compute_arcs, fix_label_positions,
    resolve_overlaps,
};
use outlabels::parser::parse_chart;
use outlabels::render::render_chart;
use outlabels::FastMetrics;
use std::hint::black_box;

fn dense_spec(sectors: usize) -> ChartSpec {
    ChartSpec {
        id: Some(format!("dense-{sectors}")),
        labels: (0..sectors).map(|idx| format!("Category {idx}")).collect(),
        // A few large sectors leave the rest crowded together.
        values: (0..sectors)
            .map(|idx| if idx % 7 == 0 { 20.0 } else { 1.0 + (idx % 3) as f64 })
            .collect(),
        ..ChartSpec::default()
    }
}

fn dense_pie_source(sectors: usize) -> String {
    let mut out = String::from("pie showData\n    title Dense\n");
    for idx in 0..sectors {
        out.push_str(&format!("    \"Slice {}\" : {}\n", idx, 1 + idx % 5));
    }
    out
}

fn placed_labels(spec: &ChartSpec) -> (Vec<LabelGeometry>, Point) {
    let area = chart_area_for(640.0, 480.0, 90.0);
    let arcs = compute_arcs(&spec.sectors(), &area, 0.5);
    let center = area.center();
    let labels = arcs
        .iter()
        .enumerate()
        .map(|(idx, arc)| {
            LabelGeometry::place(idx, arc, center, 40.0, Size::new(64.0, 14.4), Insets::uniform(4.0))
        })
        .collect();
    (labels, center)
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for sectors in [8, 32, 128] {
        let input = dense_pie_source(sectors);
        group.bench_with_input(BenchmarkId::from_parameter(sectors), &input, |b, data| {
            b.iter(|| {
                let parsed = parse_chart(black_box(data)).expect("parse failed");
                black_box(parsed.spec.values.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let options = LayoutOptions::default();
    for sectors in [8, 32, 128] {
        let (labels, center) = placed_labels(&dense_spec(sectors));
        group.bench_with_input(BenchmarkId::from_parameter(sectors), &labels, |b, data| {
            b.iter(|| {
                let report = resolve_overlaps(black_box(data), center, &options);
                black_box(report.residual_overlaps);
            });
        });
    }
    group.finish();
}

fn bench_fix_limit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fix_label_positions");
    let (labels, center) = placed_labels(&dense_spec(64));
    for limit in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, limit| {
            b.iter(|| {
                let outcome = fix_label_positions(black_box(&labels), center, *limit);
                black_box(outcome.passes);
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for sectors in [8, 32, 128] {
        let spec = dense_spec(sectors);
        group.bench_with_input(BenchmarkId::from_parameter(sectors), &spec, |b, data| {
            b.iter(|| {
                let output = render_chart(black_box(data), &config, FastMetrics).expect("render failed");
                black_box(output.svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_layout, bench_fix_limit, bench_end_to_end
);
criterion_main!(benches);
