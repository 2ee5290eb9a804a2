//! Stand-in price feed
//!
//! Prints one `{"midprice":...,"ts":...}` record per interval on stdout,
//! following a bounded random walk. Point `quoter-paper --feed-program`
//! at this binary to run a session without the real feed client.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about = "Random-walk midprice feed")]
struct Args {
    /// Starting midprice
    #[arg(long, default_value_t = 1.0850)]
    start: f64,

    /// Largest move per record
    #[arg(long, default_value_t = 0.00005)]
    step: f64,

    /// Milliseconds between records
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Digits after the decimal point
    #[arg(long, default_value_t = 5)]
    decimals: usize,

    /// Stop after this many records
    #[arg(long)]
    count: Option<u64>,

    /// RNG seed for a reproducible walk
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.start > 0.0, "--start must be positive");
    anyhow::ensure!(args.step >= 0.0, "--step must not be negative");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let floor = args.start / 2.0;
    let interval = Duration::from_millis(args.interval_ms);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut price = args.start;
    let mut sent = 0u64;

    while args.count.map_or(true, |count| sent < count) {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let line = format!(
            "{{\"midprice\":{:.prec$},\"ts\":{}}}\n",
            price,
            ts,
            prec = args.decimals
        );

        // Reader gone
        if out.write_all(line.as_bytes()).and_then(|_| out.flush()).is_err() {
            break;
        }
        sent += 1;

        price = (price + rng.gen_range(-args.step..=args.step)).max(floor);
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    Ok(())
}
