use clap::Parser;
use clap::ValueEnum;
use pubkey_table::ChainedTable;
use pubkey_table::Error;
use pubkey_table::KEY_LEN;
use pubkey_table::Key;
use pubkey_table::ProbeTable;
use pubkey_table::initialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    Chained,
    Probing,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'l', long = "layout", value_enum, default_value_t = Layout::Probing)]
    layout: Layout,

    #[arg(short = 'c', long = "capacity", default_value_t = 1 << 16)]
    capacity: usize,

    #[arg(short = 'n', long = "keys", default_value_t = 1 << 14)]
    keys: u32,
}

fn counter_key(i: u32) -> Key {
    let mut key = [0u8; KEY_LEN];
    key[..4].copy_from_slice(&i.to_le_bytes());
    key
}

fn main() {
    let args = Args::parse();
    let state = initialize();

    println!(
        "Filling {:?} table (capacity {}) with {} keys...",
        args.layout, args.capacity, args.keys
    );

    match args.layout {
        Layout::Chained => {
            let mut table = ChainedTable::with_capacity(args.capacity, state);
            println!("Actual capacity: {}", table.capacity());

            for i in 0..args.keys {
                table.find_or_insert(&counter_key(i)).set_counter(u64::from(i ^ 0xffff_ffff));
            }

            let misses = (0..args.keys)
                .filter(|&i| {
                    table.find(&counter_key(i)).map(|e| e.counter()) != Some(u64::from(i ^ 0xffff_ffff))
                })
                .count();
            println!("Inserted {} keys, {} failed lookups", table.len(), misses);

            table.probe_histogram().print();
            table.debug_stats().print();
        }
        Layout::Probing => {
            let mut table = ProbeTable::with_capacity(args.capacity, state);
            println!("Actual capacity: {}", table.capacity());

            let mut num_full = 0;
            for i in 0..args.keys {
                match table.find_or_insert(&counter_key(i)) {
                    Ok(mut entry) => entry.set_counter(u64::from(i ^ 0xffff_ffff)),
                    Err(Error::TableFull { .. }) => num_full += 1,
                    Err(err) => {
                        eprintln!("insert failed: {err}");
                        return;
                    }
                }
            }

            println!("Inserted {} keys into table", table.len());
            println!("Final load factor: {:.2}%", table.load_factor() * 100.0);
            println!(
                "Number of rejected inserts: {} ({:.02}%)",
                num_full,
                num_full as f64 / f64::from(args.keys.max(1)) * 100.0
            );

            table.probe_histogram().print();
            table.debug_stats().print();
        }
    }
}
