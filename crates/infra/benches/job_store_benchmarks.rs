use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use scribeflow_core::{ChunkStatus, JobId, JobStatus, JobUpdate, UserId};
use scribeflow_infra::jobs::{InMemoryJobStore, InMemoryUserIndex, JobStore, UserIndex};

/// Full record lifecycle for one job: create, chunk updates, finalize, read back.
fn bench_job_record_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_record_lifecycle");

    for chunks in [1usize, 8, 64].iter() {
        group.throughput(Throughput::Elements(*chunks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunks), chunks, |b, &chunks| {
            let store = InMemoryJobStore::new();
            let chunk_refs: Vec<String> = (0..chunks).map(|i| format!("chunk-{i}.wav")).collect();
            let mut next = 0u64;

            b.iter(|| {
                let job_id = JobId::new(next);
                next += 1;
                store.put(job_id, JobUpdate::pending()).unwrap();
                for chunk_ref in &chunk_refs {
                    store
                        .set_chunk_status(job_id, chunk_ref, ChunkStatus::Pending)
                        .unwrap();
                    store
                        .set_chunk_status(job_id, chunk_ref, ChunkStatus::Done)
                        .unwrap();
                }
                store.put(job_id, JobUpdate::done("text", Utc::now())).unwrap();
                black_box(store.get(job_id).unwrap());
            });
        });
    }

    group.finish();
}

/// Index add + terminal move, spread over a handful of users.
fn bench_user_index_transitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_index_transitions");
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_then_move_to_done", |b| {
        let index = InMemoryUserIndex::new();
        let users: Vec<UserId> = (0..16)
            .map(|i| UserId::parse(format!("user-{i}")).unwrap())
            .collect();
        let mut next = 0u64;

        b.iter(|| {
            let user = &users[(next % users.len() as u64) as usize];
            let job_id = JobId::new(next);
            next += 1;
            index.add_to_bucket(user, JobStatus::Pending, job_id).unwrap();
            index
                .move_to_terminal(user, JobStatus::Pending, JobStatus::Done, job_id)
                .unwrap();
        });
    });

    group.bench_function("lookup_done_bucket", |b| {
        let index = InMemoryUserIndex::new();
        let user = UserId::parse("user-0").unwrap();
        for i in 0..1_000 {
            index.add_to_bucket(&user, JobStatus::Done, JobId::new(i)).unwrap();
        }

        b.iter(|| black_box(index.lookup(&user, JobStatus::Done).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_job_record_lifecycle,
    bench_user_index_transitions
);
criterion_main!(benches);
