//! Benchmarks for mdpress layout, packing and export.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdpress::export::{pack, ExportOptions, Exporter, Surface, SvgRasterizer};
use mdpress::model::{PageGeometry, PaperSize, VisualBlock};
use mdpress::render::{fonts, RenderOptions, Renderer};

/// Creates a synthetic Markdown document with the given number of sections.
fn create_test_markdown(sections: usize) -> String {
    let mut md = String::new();
    for i in 0..sections {
        md.push_str(&format!("## Section {}\n\n", i + 1));
        md.push_str("Benchmark paragraph with enough words to wrap across several lines ");
        md.push_str("when laid out at the default page width of the export pipeline.\n\n");
        md.push_str("- first item\n- second item\n- [x] done item\n\n");
        md.push_str("| key | value |\n|-----|-------|\n| a | 1 |\n| b | 2 |\n\n");
        md.push_str("```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\n");
    }
    md
}

fn bench_layout(c: &mut Criterion) {
    let md = create_test_markdown(20);
    let mut group = c.benchmark_group("layout");

    let parallel = Renderer::new(RenderOptions::new());
    group.bench_function("parallel", |b| b.iter(|| parallel.render(black_box(&md))));

    let sequential = Renderer::new(RenderOptions::new().sequential());
    group.bench_function("sequential", |b| b.iter(|| sequential.render(black_box(&md))));

    group.finish();
}

fn bench_packing(c: &mut Criterion) {
    let geometry = PageGeometry::default();
    let mut group = c.benchmark_group("packing");

    for count in [100usize, 1_000, 10_000] {
        let blocks: Vec<VisualBlock> = (0..count)
            .map(|i| VisualBlock::sized(i, 720.0, ((i * 37) % 1400) as f32))
            .collect();
        group.bench_function(format!("{}_blocks", count), |b| {
            b.iter(|| pack(black_box(blocks.clone()), &geometry))
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let geometry = PageGeometry::new(PaperSize::A4, 800.0, 40.0, 1.0).unwrap();
    let surface = Surface::new(RenderOptions::new().for_geometry(&geometry));
    surface.render_markdown("bench", &create_test_markdown(10));
    let exporter = Exporter::new(ExportOptions::new().with_geometry(geometry))
        .with_rasterizer(SvgRasterizer::with_fonts(fonts::empty_fonts()));

    let mut group = c.benchmark_group("export");
    group.sample_size(10);
    group.bench_function("export_document", |b| {
        b.iter(|| exporter.export_document(&surface, black_box("bench")).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_packing, bench_export);
criterion_main!(benches);
