use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use execdiff::diff;
use execdiff::snapshot::{self, PackageSource};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Builds a project-like tree: `dirs` directories of `files_per_dir` small files.
fn create_tree(base: &Path, dirs: usize, files_per_dir: usize) -> std::io::Result<()> {
    for d in 0..dirs {
        let dir = base.join(format!("pkg-{d}")).join("src");
        fs::create_dir_all(&dir)?;
        for f in 0..files_per_dir {
            fs::write(dir.join(format!("mod_{f}.rs")), format!("pub fn f{f}() {{}}"))?;
        }
    }
    Ok(())
}

fn bench_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");

    for &(dirs, files) in &[(10, 10), (50, 20), (100, 50)] {
        let temp = TempDir::new().expect("failed to create temp dir");
        create_tree(temp.path(), dirs, files).expect("failed to create fixture");

        group.bench_with_input(
            BenchmarkId::from_parameter(dirs * files),
            temp.path(),
            |b, path| b.iter(|| snapshot::capture(black_box(path), &PackageSource::Disabled)),
        );
    }

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let temp = TempDir::new().expect("failed to create temp dir");
    create_tree(temp.path(), 100, 50).expect("failed to create fixture");

    let before = snapshot::capture(temp.path(), &PackageSource::Disabled).snapshot;
    let mut after = before.clone();

    // touch every tenth file and add a handful of new ones
    for (i, record) in after.files.values_mut().enumerate() {
        if i % 10 == 0 {
            record.mtime += 1.0;
        }
    }
    for i in 0..100 {
        after.files.insert(
            format!("generated/out_{i}.txt"),
            snapshot::FileRecord { mtime: 0.0, size: 1 },
        );
    }

    c.bench_function("diff_5000_files", |b| {
        b.iter(|| diff::diff(black_box(&before), black_box(&after)))
    });
}

criterion_group!(benches, bench_capture, bench_diff);
criterion_main!(benches);
