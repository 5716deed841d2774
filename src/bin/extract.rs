//! Scrape per-run stats.txt files into a summary table and a pivoted CSV
use anyhow::Context;
use clap::{Parser, ValueEnum};
use cli_table::{Cell, Table, print_stdout};
use gem5_experiments::{
    Metric, ResultTable, StatisticsRecord, StatsFile, SweepConfig, ask_for_config_name,
    get_run_dir, get_stats_path, resolve_results_root, select_subset, ticks_per_cycle,
};
use std::{fs::File, path::PathBuf};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Sweep config name under benchmarks/
    #[arg(short, long)]
    config_name: Option<PathBuf>,

    /// CPU models to aggregate, default to every model in the config
    #[arg(long)]
    cpu: Vec<String>,

    /// Memory controllers to aggregate, default to every controller in the config
    #[arg(long)]
    mem: Vec<String>,

    /// Statistic to pivot into the CSV
    #[arg(short, long, default_value = "miss-rate")]
    stat: Metric,

    /// Path to the pivoted CSV
    #[arg(short, long, default_value = "results.csv")]
    output_path: PathBuf,

    /// Result tree root, default to $LAB_PATH/results
    #[arg(short, long)]
    results_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config_name = match &args.config_name {
        Some(config_name) => config_name.clone(),
        None => PathBuf::from(ask_for_config_name()?),
    };
    let config = SweepConfig::load(&config_name)?;
    let results_root = resolve_results_root(args.results_dir.clone())?;
    let ticks_per_cycle = ticks_per_cycle(&config.clock)?;

    let cpus = select_subset(&config.cpus, &args.cpu)?;
    let mem_ctls = select_subset(&config.mem_ctls, &args.mem)?;

    // canonical row order of the pivot
    let mut benchmarks: Vec<String> = config
        .benchmarks
        .iter()
        .map(|benchmark| benchmark.name.clone())
        .collect();
    benchmarks.sort();

    // one record per cell, absent or broken runs scrape to zero
    let mut result_table = ResultTable::new();
    for benchmark in &benchmarks {
        for cpu in &cpus {
            for mem_ctl in &mem_ctls {
                let run_dir = get_run_dir(&results_root, benchmark, cpu, mem_ctl);
                let stats = StatsFile::load(&get_stats_path(&run_dir));
                result_table.push(StatisticsRecord::scrape(
                    benchmark,
                    cpu,
                    mem_ctl,
                    &stats,
                    ticks_per_cycle,
                ));
            }
        }
    }

    let mut table = vec![];
    for record in result_table.records() {
        // a run that produced no cycles has no meaningful IPC/CPI
        let (ipc, cpi) = if record.ipc.is_finite() {
            (format!("{:.3}", record.ipc), format!("{:.3}", record.cpi))
        } else {
            ("-".to_string(), "-".to_string())
        };
        table.push(vec![
            record.benchmark.as_str().cell(),
            record.cpu.as_str().cell(),
            record.mem_ctl.as_str().cell(),
            format!("{:.0}", record.cycles).cell(),
            format!("{:.0}", record.instructions).cell(),
            ipc.cell(),
            cpi.cell(),
            format!("{:.4}", record.miss_rate).cell(),
            format!("{:.1}", record.avg_mem_acc_lat).cell(),
            format!("{:.1}", record.bus_util).cell(),
            format!("{:.0}", record.bw_total).cell(),
        ]);
    }
    let table = table.table().title(vec![
        "Benchmark".cell(),
        "CPU".cell(),
        "Memory".cell(),
        "Cycles".cell(),
        "Instructions".cell(),
        "IPC".cell(),
        "CPI".cell(),
        "L2 Miss Rate".cell(),
        "Avg Mem Lat".cell(),
        "Bus Util (%)".cell(),
        "BW Total".cell(),
    ]);
    print_stdout(table)?;

    let output = File::create(&args.output_path)
        .with_context(|| format!("create {}", args.output_path.display()))?;
    result_table.write_pivot_csv(output, args.stat, &benchmarks, &cpus, &mem_ctls)?;

    let stat_possible_value = args.stat.to_possible_value().unwrap();
    println!(
        "Pivoted {} CSV written to {}",
        stat_possible_value.get_name(),
        args.output_path.display()
    );

    Ok(())
}
