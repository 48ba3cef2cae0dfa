use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use res_cache::{
    AllocatorPair, AllocatorTag, LoadDescriptor, LoadError, ResourceManager, ResourcePayload,
    ResourceType,
};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> Vec<u8> {
    format!("assets/{:016x}.bin", n).into_bytes()
}

fn misc(allocs: &AllocatorPair) -> Result<ResourcePayload, LoadError> {
    Ok(ResourcePayload::from_block(
        ResourceType::Misc,
        allocs.allocate(AllocatorTag::Main, 64),
    ))
}

fn bench_first_load(c: &mut Criterion) {
    c.bench_function("res_cache_first_load_10k", |b| {
        b.iter_batched(
            ResourceManager::new,
            |mut m| {
                let desc = LoadDescriptor::default();
                for x in lcg(1).take(10_000) {
                    m.load(&key(x), ResourceType::Misc, &desc, misc).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_load_hit(c: &mut Criterion) {
    c.bench_function("res_cache_load_hit", |b| {
        let mut m = ResourceManager::new();
        let desc = LoadDescriptor::default();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for k in &keys {
            m.load(k, ResourceType::Misc, &desc, misc).unwrap();
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let out = m.load(k, ResourceType::Misc, &desc, misc).unwrap();
            black_box(out);
        })
    });
}

fn bench_lookup_miss(c: &mut Criterion) {
    c.bench_function("res_cache_lookup_miss", |b| {
        let mut m = ResourceManager::new();
        let desc = LoadDescriptor::default();
        for x in lcg(11).take(10_000) {
            m.load(&key(x), ResourceType::Misc, &desc, misc).unwrap();
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // keys unlikely to be resident
            let k = key(miss.next().unwrap());
            black_box(m.exists(&k, ResourceType::Misc, b""));
        })
    });
}

fn bench_load_unload_churn(c: &mut Criterion) {
    c.bench_function("res_cache_load_unload_churn_1k", |b| {
        b.iter_batched(
            || {
                let mut m = ResourceManager::new();
                let desc = LoadDescriptor::default();
                // Warm resident set so churn hits a populated table.
                for x in lcg(17).take(10_000) {
                    m.load(&key(x), ResourceType::Misc, &desc, misc).unwrap();
                }
                let churn: Vec<_> = lcg(23).take(1_000).map(key).collect();
                (m, churn)
            },
            |(mut m, churn)| {
                let desc = LoadDescriptor::default();
                for k in &churn {
                    m.load(k, ResourceType::Misc, &desc, misc).unwrap();
                }
                for k in &churn {
                    m.unload(k, ResourceType::Misc, &desc);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_snapshot_restore(c: &mut Criterion) {
    c.bench_function("res_cache_snapshot_restore_10k", |b| {
        b.iter_batched(
            || {
                let mut m = ResourceManager::new();
                let desc = LoadDescriptor::default();
                for x in lcg(29).take(10_000) {
                    m.load(&key(x), ResourceType::Misc, &desc, misc).unwrap();
                }
                let snap = m.snapshot();
                for x in lcg(31).take(1_000) {
                    m.load(&key(x), ResourceType::Misc, &desc, misc).unwrap();
                }
                (m, snap)
            },
            |(mut m, snap)| {
                m.restore_snapshot(&snap, None);
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_first_load, bench_load_hit, bench_lookup_miss, bench_load_unload_churn,
        bench_snapshot_restore
}
criterion_main!(benches);
