use criterion::{black_box, criterion_group, criterion_main, Criterion};
use splice_core::{reconcile, LineRange};

fn synthetic_document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("    let value_{i} = compute({i}, \"payload\");"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generated block echoing `echo` lines of context on each side of the edit.
fn echoing_block(document: &str, line: usize, echo: usize) -> String {
    let lines: Vec<&str> = document.split('\n').collect();
    let mut out: Vec<String> = lines[line - echo..line]
        .iter()
        .map(|l| l.trim().to_string())
        .collect();
    out.push("let inserted = true;".to_string());
    out.extend(lines[line + 1..line + 1 + echo].iter().map(|l| l.to_string()));
    out.join("\n")
}

fn bench_reconcile(c: &mut Criterion) {
    let document = synthetic_document(2_000);
    let line = 1_000;

    let novel = "let inserted = true;\nlet also = false;";
    c.bench_function("reconcile_no_echo_2k_lines", |b| {
        b.iter(|| black_box(reconcile(&document, black_box(novel), LineRange::single(line))));
    });

    let echoed = echoing_block(&document, line, 8);
    c.bench_function("reconcile_echo_8_each_side", |b| {
        b.iter(|| black_box(reconcile(&document, black_box(&echoed), LineRange::single(line))));
    });
}

criterion_group!(reconcile_core, bench_reconcile);
criterion_main!(reconcile_core);
