use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownMap;
use pubkey_table::ChainedTable;
use pubkey_table::HashState;
use pubkey_table::KEY_LEN;
use pubkey_table::Key;
use pubkey_table::KeyedTable;
use pubkey_table::ProbeTable;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;

const SIZES: &[usize] = &[(1 << 10), (1 << 12), (1 << 14), (1 << 16), (1 << 18), (1 << 20)];

fn sequential_keys(count: usize) -> Vec<Key> {
    (0..count as u32)
        .map(|i| {
            let mut key = [0u8; KEY_LEN];
            key[..4].copy_from_slice(&i.to_le_bytes());
            key
        })
        .collect()
}

fn random_keys(count: usize) -> Vec<Key> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| {
            let mut key = [0u8; KEY_LEN];
            rng.try_fill_bytes(&mut key).unwrap();
            key
        })
        .collect()
}

// Same bucket-to-key ratios as the default sizes: 8 keys per bucket for
// chaining, a quarter-full ring for probing.
fn chained_for(keys: usize) -> ChainedTable {
    ChainedTable::with_capacity(keys / 8, HashState::from_entropy().unwrap())
}

fn probing_for(keys: usize) -> ProbeTable {
    ProbeTable::with_capacity(keys * 4, HashState::from_entropy().unwrap())
}

fn fill(table: &mut impl KeyedTable, keys: &[Key]) {
    for (i, key) in keys.iter().enumerate() {
        table.find_or_insert(key).unwrap().set_counter(i as u64);
    }
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("chained/{size}"), |b| {
            b.iter_batched(
                || chained_for(size),
                |mut table| {
                    fill(&mut table, &keys);
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("probing/{size}"), |b| {
            b.iter_batched(
                || probing_for(size),
                |mut table| {
                    fill(&mut table, &keys);
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || HashbrownMap::<Key, (u64, u32)>::with_capacity(size),
                |mut map| {
                    for (i, key) in keys.iter().enumerate() {
                        map.entry(*key).or_default().0 = i as u64;
                    }
                    black_box(map)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_hit_sequential");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = sequential_keys(size);
        let mut lookups = keys.clone();
        lookups.shuffle(&mut SmallRng::from_os_rng());

        let mut chained = chained_for(size);
        fill(&mut chained, &keys);
        let mut probing = probing_for(size);
        fill(&mut probing, &keys);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chained/{size}"), |b| {
            b.iter(|| {
                for key in &lookups {
                    black_box(chained.find(key));
                }
            })
        });
        group.bench_function(format!("probing/{size}"), |b| {
            b.iter(|| {
                for key in &lookups {
                    black_box(probing.find(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_miss");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys(size);
        let misses = random_keys(size);

        let mut chained = chained_for(size);
        fill(&mut chained, &keys);
        let mut probing = probing_for(size);
        fill(&mut probing, &keys);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chained/{size}"), |b| {
            b.iter(|| {
                for key in &misses {
                    black_box(chained.find(key));
                }
            })
        });
        group.bench_function(format!("probing/{size}"), |b| {
            b.iter(|| {
                for key in &misses {
                    black_box(probing.find(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_zipf(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_zipf");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES {
        let keys = random_keys(size);
        let zipf = Zipf::new(size as f64, 1.1).unwrap();
        let mut rng = SmallRng::from_os_rng();
        let lookups: Vec<Key> = (0..size)
            .map(|_| keys[rng.sample(&zipf) as usize - 1])
            .collect();

        let mut chained = chained_for(size);
        fill(&mut chained, &keys);
        let mut probing = probing_for(size);
        fill(&mut probing, &keys);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chained/{size}"), |b| {
            b.iter(|| {
                for key in &lookups {
                    black_box(chained.find(key));
                }
            })
        });
        group.bench_function(format!("probing/{size}"), |b| {
            b.iter(|| {
                for key in &lookups {
                    black_box(probing.find(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_digest(c: &mut Criterion) {
    let state = HashState::from_entropy().unwrap();
    let keys = random_keys(1 << 10);

    let mut group = c.benchmark_group("digest");
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("siphash_2_4_32b", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(state.digest(key));
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_digest,
    bench_insert,
    bench_find_hit,
    bench_find_miss,
    bench_find_zipf,
);

criterion_main!(benches);
