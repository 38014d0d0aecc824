// benches/walk_benchmark.rs
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Write;
use std::path::{Path, PathBuf};
use tarwalk::{iterate, TarWalker};

const FILES: usize = 64;
const FILE_SIZE: usize = 256 * 1024;

fn build_archive(dir: &Path) -> PathBuf {
    let mut b = tar::Builder::new(Vec::new());
    let data = vec![0x5au8; FILE_SIZE];
    for i in 0..FILES {
        let mut h = tar::Header::new_gnu();
        h.set_entry_type(tar::EntryType::Regular);
        h.set_mode(0o644);
        h.set_size(FILE_SIZE as u64);
        b.append_data(&mut h, format!("bench/{:03}.bin", i), &data[..]).unwrap();
    }
    let raw = b.into_inner().unwrap();

    let path = dir.join("bench.tar.zst");
    let mut out = std::fs::File::create(&path).unwrap();
    out.write_all(&zstd::encode_all(&raw[..], 1).unwrap()).unwrap();
    path
}

fn bench_walk(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = build_archive(dir.path());

    let mut group = c.benchmark_group("walk");
    group.throughput(Throughput::Bytes((FILES * FILE_SIZE) as u64));

    group.bench_function("metadata_only", |b| {
        b.iter(|| black_box(TarWalker::open(&path).unwrap().collect_entries().unwrap()))
    });

    for algos in [vec!["md5"], vec!["md5", "sha1"], vec!["md5", "sha1", "sha256", "blake3"]] {
        group.bench_with_input(BenchmarkId::new("hashed", algos.join("+")), &algos, |b, algos| {
            b.iter(|| black_box(iterate(&path, &algos[..]).unwrap().collect_entries().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walk);
criterion_main!(benches);
