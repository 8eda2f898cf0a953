//! Evaluate an [`SNNPredictor`] against one or more traces.

use clap::Parser;
use rand::prelude::*;
use std::error::Error;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use ::snn::*;
use ::snn::stats::*;

#[derive(Parser, Debug)]
#[command(about = "Evaluate the SNN branch predictor on binary traces")]
struct Args {
    /// Trace files
    #[arg(required = true)]
    traces: Vec<String>,

    /// JSON predictor configuration (missing fields use defaults)
    #[arg(long)]
    config: Option<String>,

    /// Print a CSV dump of all weights every N conditional branches
    #[arg(long)]
    dump_every: Option<usize>,

    /// Randomize global history with N outcomes before each trace
    #[arg(long, default_value_t = 0)]
    warmup: usize,

    /// Print weights as JSON after each trace
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<SNNConfig, Box<dyn Error>> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(SNNConfig::from_json(&text)?)
        },
        None => Ok(SNNConfig::default()),
    }
}

fn run_trace(args: &Args, cfg: &SNNConfig, records: &[BranchRecord])
    -> Result<(SNNPredictor, BranchStats, usize), Box<dyn Error>>
{
    let mut snn = cfg.clone().build()?;
    snn.set_observer(Box::new(ProbeObserver::new(cfg.probe_index)));
    let tid = snn.thread(0).ok_or("predictor has no threads")?;

    // Randomize the state of global history
    let mut rng = rand::thread_rng();
    for _ in 0..args.warmup {
        let token = snn.uncond_branch(tid, 0);
        snn.update(tid, 0, Outcome::from_bool(rng.gen()), token, true);
    }

    let mut stats = BranchStats::new();
    let mut mpkb_cnts = Vec::new();
    let mut mpkb_window = 0;
    for record in records {
        if record.kind().is_none() {
            continue;
        }
        if record.is_unconditional() {
            let token = snn.uncond_branch(tid, record.pc);
            snn.update(tid, record.pc, Outcome::T, token, false);
            continue;
        }

        // Sample the number of mispredictions every 1000 branches
        if stats.global_brns() % 1000 == 0 && stats.global_brns() != 0 {
            mpkb_cnts.push(mpkb_window);
            mpkb_window = 0;
        }

        let (predicted, token) = snn.lookup(tid, record.pc);
        let outcome = record.outcome();
        stats.update(record, predicted);

        // The branch resolves right away: fix up global history before
        // training with the same record.
        if predicted != outcome {
            mpkb_window += 1;
            snn.repair(tid, outcome, &token);
        }
        snn.update(tid, record.pc, outcome, token, false);

        if let Some(n) = args.dump_every {
            if n != 0 && stats.global_brns() % n == 0 {
                println!("==dump==");
                print!("{}", snn.snapshot_weights());
            }
        }
    }
    mpkb_cnts.push(mpkb_window);

    let avg_mpkb = mpkb_cnts.iter().sum::<usize>() / mpkb_cnts.len();
    Ok((snn, stats, avg_mpkb))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    println!("[*] SNN configuration:");
    println!("      {} entries, {} dense bits, {} segments of {} bits",
        cfg.table_size, cfg.dense_history_len, cfg.sparse_n_segs,
        cfg.sparse_seg_len,
    );
    let storage_bits = cfg.storage_bits();
    println!("      Storage bits: {}b, {:.2}KiB",
        storage_bits, storage_bits as f64 / 1024.0 / 8.0
    );

    for trace in BinaryTraceSet::new_from_slice(&args.traces) {
        let trace = trace?;
        println!("[*] {}, {} records", trace.name(), trace.num_entries());

        let start = Instant::now();
        let (snn, stats, avg_mpkb) = run_trace(&args, &cfg, trace.as_slice())?;
        println!("[*] ... simulated in {:.3?}", start.elapsed());

        println!("      Unique branches: {}", stats.num_unique_branches());
        println!("      Global hit rate: {}/{} ({:.2}% correct) ({} misses)",
            stats.global_hits(), stats.global_brns(),
            stats.hit_rate() * 100.0, stats.global_miss()
        );
        println!("      Average MPKB:    {} miss/kbrn", avg_mpkb);
        let s = snn.stats();
        println!("      Skipped updates: {}", s.skipped);
        println!("      Segments: {} promoted, {} confirmed, {} replaced",
            s.promotions, s.confirmations, s.replacements
        );

        println!("Low hit-rate branches:");
        for (pc, data) in stats.get_low_rate_branches(8) {
            println!("  {:016x} {:8}/{:8} {:.4}",
                pc, data.hits, data.occ, data.hit_rate()
            );
        }
        if args.json {
            println!("{}", serde_json::to_string(&snn.snapshot_weights())?);
        }
        println!();
    }
    Ok(())
}
