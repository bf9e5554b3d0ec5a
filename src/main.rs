use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use rakefold::tree::shapes::{self, OpMix};
use rakefold::{ContractionConfig, Contractor, ExprTree, OpKind, TreeBuilder};

#[derive(Parser, Debug)]
#[command(name = "rakefold", about = "Parallel expression evaluation via tree contraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Contract the example expression (3 + 5) * 2 and print the result.
    Demo {
        /// Worker threads for the contraction.
        #[arg(long, default_value_t = ContractionConfig::default().workers)]
        workers: usize,
    },
    /// Time baseline evaluation against contraction across tree shapes,
    /// printing one CSV row per (shape, size, threads) cell.
    Bench {
        /// Repetitions averaged per cell.
        #[arg(long, default_value_t = 5)]
        reps: usize,
        /// Largest worker count; counts double from 1 up to this.
        #[arg(long, default_value_t = 8)]
        max_threads: usize,
        /// Seed for tree generation.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo { workers } => run_demo(workers),
        Commands::Bench {
            reps,
            max_threads,
            seed,
        } => run_bench(reps, max_threads, seed),
    }
}

fn run_demo(workers: usize) -> Result<()> {
    let mut builder = TreeBuilder::new();
    let three = builder.leaf(3.0);
    let five = builder.leaf(5.0);
    let sum = builder.op(OpKind::Add, three, five)?;
    let two = builder.leaf(2.0);
    let root = builder.op(OpKind::Multiply, sum, two)?;
    let tree = builder.build(root)?;

    let contractor = Contractor::new(ContractionConfig::with_workers(workers));
    let result = contractor.run(tree).context("contraction failed")?;
    println!("Result of (3 + 5) * 2 is: {result}");
    Ok(())
}

type Maker = fn(usize, OpMix, u64) -> Result<ExprTree, rakefold::EvalError>;

fn run_bench(reps: usize, max_threads: usize, seed: u64) -> Result<()> {
    ensure!(reps > 0, "reps must be positive");

    let shapes: [(&str, Maker, &[usize]); 5] = [
        ("perfect", make_perfect, &[6, 9, 12]),
        ("random", make_random, &[7, 10, 12]),
        ("left_chain", make_left_chain, &[32, 256, 2048]),
        ("right_chain", make_right_chain, &[32, 256, 2048]),
        ("caterpillar", make_caterpillar, &[32, 256, 2048]),
    ];

    let mut threads = Vec::new();
    let mut t = 1;
    while t <= max_threads.max(1) {
        threads.push(t);
        t *= 2;
    }

    println!("shape,n_nodes,threads,baseline_ms,contraction_ms");
    for (shape, maker, params) in shapes {
        for &param in params {
            for &workers in &threads {
                bench_cell(shape, maker, param, workers, reps, seed)?;
            }
        }
    }
    Ok(())
}

fn bench_cell(
    shape: &str,
    maker: Maker,
    param: usize,
    workers: usize,
    reps: usize,
    seed: u64,
) -> Result<()> {
    let mut n_nodes = 0;
    let mut baseline_value = 0.0;
    let mut baseline_ms = 0.0;
    for rep in 0..reps {
        let tree = maker(param, OpMix::Mixed, seed + rep as u64)?;
        n_nodes = tree.len();
        let start = Instant::now();
        baseline_value = tree.compute()?;
        baseline_ms += start.elapsed().as_secs_f64() * 1e3;
    }
    baseline_ms /= reps as f64;

    let contractor = Contractor::new(ContractionConfig::with_workers(workers));
    let mut contraction_value = 0.0;
    let mut contraction_ms = 0.0;
    for rep in 0..reps {
        let tree = maker(param, OpMix::Mixed, seed + rep as u64)?;
        let start = Instant::now();
        contraction_value = contractor.run(tree)?;
        contraction_ms += start.elapsed().as_secs_f64() * 1e3;
    }
    contraction_ms /= reps as f64;

    let tolerance = 1e-9 * baseline_value.abs().max(1.0);
    ensure!(
        (baseline_value - contraction_value).abs() <= tolerance,
        "contraction diverged from baseline on {shape}({param}): {contraction_value} vs {baseline_value}"
    );

    println!("{shape},{n_nodes},{workers},{baseline_ms:.3},{contraction_ms:.3}");
    Ok(())
}

fn make_perfect(depth: usize, mix: OpMix, seed: u64) -> Result<ExprTree, rakefold::EvalError> {
    shapes::perfect(depth as u32, mix, seed)
}

fn make_random(depth: usize, mix: OpMix, seed: u64) -> Result<ExprTree, rakefold::EvalError> {
    shapes::random_balanced(depth as u32, mix, seed)
}

fn make_left_chain(leaves: usize, mix: OpMix, seed: u64) -> Result<ExprTree, rakefold::EvalError> {
    shapes::left_chain(leaves, mix, seed)
}

fn make_right_chain(leaves: usize, mix: OpMix, seed: u64) -> Result<ExprTree, rakefold::EvalError> {
    shapes::right_chain(leaves, mix, seed)
}

fn make_caterpillar(spine: usize, mix: OpMix, seed: u64) -> Result<ExprTree, rakefold::EvalError> {
    shapes::caterpillar(spine, mix, seed)
}
