/*!
 * Benchmarks for masking engine operations.
 *
 * Measures performance of:
 * - Span classification over paper-sized buffers
 * - Mask/unmask round trips
 * - Critic review of masked buffers
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use latrans::latex::classifier;
use latrans::latex::masking::MaskEngine;
use latrans::verification::ReflexionCritic;

/// Generate a paper-like buffer of roughly `paragraphs` paragraphs.
fn generate_paper(paragraphs: usize) -> String {
    let templates = [
        "We study convergence rates of $\\eta_t = \\eta_0 / \\sqrt{t}$ under noise \\cite{robbins1951stochastic}.",
        "Section~\\ref{sec:method} introduces the estimator, see also Equation~\\ref{eq:loss}.",
        "\\begin{equation}\n\\mathcal{L}(\\theta) = \\frac{1}{n}\\sum_i \\ell_i(\\theta)\n\\end{equation}",
        "The bound $$\\mathbb{E}[X] \\le \\epsilon$$ follows from standard arguments \\cite{kingma2014adam}.",
        "Empirically the model generalizes across domains, as shown in \\cite{lecun2015deep}.",
    ];

    let mut out = String::from("\\documentclass{article}\n\\begin{document}\n");
    for i in 0..paragraphs {
        out.push_str(templates[i % templates.len()]);
        out.push_str("\n\n");
    }
    out.push_str("\\end{document}\n");
    out
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");

    for paragraphs in [10usize, 100, 500] {
        let paper = generate_paper(paragraphs);
        group.throughput(Throughput::Bytes(paper.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(paragraphs),
            &paper,
            |b, paper| {
                b.iter(|| classifier::classify(black_box(paper)));
            },
        );
    }
    group.finish();
}

fn bench_mask_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_roundtrip");

    for paragraphs in [10usize, 100, 500] {
        let paper = generate_paper(paragraphs);
        group.throughput(Throughput::Bytes(paper.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(paragraphs),
            &paper,
            |b, paper| {
                b.iter(|| {
                    let masked = MaskEngine::mask(black_box(paper));
                    MaskEngine::unmask(&masked.text, &masked.table).unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_critic_review(c: &mut Criterion) {
    let paper = generate_paper(200);
    let masked = MaskEngine::mask(&paper);
    let translated = masked.text.replace("convergence", "la convergence");

    c.bench_function("critic_review", |b| {
        b.iter(|| {
            ReflexionCritic::review(
                black_box(&masked.table),
                black_box(&masked.text),
                black_box(&translated),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_classification,
    bench_mask_roundtrip,
    bench_critic_review
);
criterion_main!(benches);
