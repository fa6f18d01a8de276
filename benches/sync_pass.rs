use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use tokio::runtime::Runtime;
use vaultsync::domain::SecretKeyReference;
use vaultsync::{TargetSecret, VaultSecret};

#[allow(clippy::duplicate_mod)]
#[path = "../tests/common/mod.rs"]
mod common;
use common::{login, Harness};

async fn seed(harness: &Harness, count: usize) -> (VaultSecret, TargetSecret) {
    let mut request = common::request("bench");
    for i in 0..count {
        let id = format!("r{}", i);
        harness.put(login(&id, &format!("user-{}", i), &format!("pw-{}", i))).await;
        request = request.with_reference(SecretKeyReference::new(format!("key-{}", i), id));
    }

    let mut target = common::target("bench");
    harness.reconcile(&mut request, &mut target).await;
    (request, target)
}

fn bench_unchanged_pass(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("sync_pass");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    // Every pass after the first only verifies key hashes against the target
    for count in [1, 10, 50].iter() {
        let harness = rt.block_on(Harness::new());
        let (request, target) = rt.block_on(seed(&harness, *count));

        group.bench_with_input(BenchmarkId::new("unchanged", count), count, |b, &_count| {
            b.to_async(&rt).iter(|| async {
                let mut request = request.clone();
                let mut target = target.clone();
                let outcome = harness.reconcile(&mut request, &mut target).await;
                black_box(outcome)
            });
        });
    }

    group.finish();
}

fn bench_policy_resolution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("policy_resolution");
    group.measurement_time(Duration::from_secs(10));

    let harness = rt.block_on(Harness::new());
    let request = common::request("bench");
    rt.block_on(harness.synchronizer.engine().get_client(&request)).unwrap();

    group.bench_function("cached_client", |b| {
        b.to_async(&rt).iter(|| async {
            let client = harness.synchronizer.engine().get_client(black_box(&request)).await;
            black_box(client.unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_unchanged_pass, bench_policy_resolution);
criterion_main!(benches);
