use clap::Parser;

use bdd_bridge::{Backend, Bdd, Manager, ManagerConfig, ReorderMethod};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of queens.
    #[arg(value_name = "INT", default_value = "6")]
    n: u32,

    /// Computed-table size hint.
    #[clap(long, value_name = "INT", default_value = "65536")]
    cache_slots: usize,

    /// Automatic reordering method code (0 = none, 3 = sift, ...).
    #[clap(long, value_name = "CODE", default_value = "0")]
    reorder: u32,

    /// Use the reduced backend.
    #[clap(long)]
    lite: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let config = ManagerConfig::builder()
        .cache_slots(args.cache_slots)
        .auto_reorder(ReorderMethod::from_code(args.reorder)?)
        .backend(if args.lite { Backend::Lite } else { Backend::Heap })
        .build();
    let mgr = Manager::with_config(&config)?;

    let n = args.n;
    println!("Encoding n-queens problem with n = {}", n);
    mgr.ensure_variable_count(n * n)?;
    let var = |i: u32, j: u32| -> color_eyre::Result<Bdd> {
        mgr.ith_variable(i * n + j)?
            .ok_or_else(|| color_eyre::eyre::eyre!("variable ({}, {}) out of range", i, j))
    };

    let mut result = mgr.one()?;

    // One queen per row
    for i in 0..n {
        let row = (0..n).map(|j| var(i, j)).collect::<color_eyre::Result<Vec<_>>>()?;
        result = mgr.and(&result, &mgr.or_many(&row)?)?;
    }

    // No two queens attack each other
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in i1..n {
                for j2 in 0..n {
                    if (i2, j2) <= (i1, j1) {
                        continue;
                    }
                    let di = i2 - i1;
                    let dj = j1.abs_diff(j2);
                    if i1 == i2 || j1 == j2 || di == dj {
                        let both = mgr.and(&var(i1, j1)?, &var(i2, j2)?)?;
                        result = mgr.and(&result, &both.not()?)?;
                    }
                }
            }
        }
    }

    println!("result: {} nodes, {} solutions", result.node_count()?, result.sat_count()?);
    println!(
        "manager: {} live nodes, peak {}, {} reorderings, {} collections",
        mgr.node_count()?,
        mgr.peak_node_count()?,
        mgr.reorderings()?,
        mgr.garbage_collections()?
    );

    if result.is_zero()? {
        println!("No solution");
        return Ok(());
    }
    let solution = mgr.sat_one(&result)?;
    for i in 0..n {
        let mut line = String::new();
        for j in 0..n {
            let q = mgr.and(&solution, &var(i, j)?)?;
            line.push(if q.is_zero()? { '.' } else { 'Q' });
        }
        println!("{}", line);
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
