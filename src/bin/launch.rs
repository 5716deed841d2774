//! Launch a gem5 sweep over benchmarks x CPU models x memory controllers
use anyhow::bail;
use chrono::Local;
use clap::Parser;
use cli_table::{Cell, Table, print_stdout};
use gem5_experiments::{
    Gem5, SweepConfig, ask_for_config_name, dispatch, enumerate_runs, get_report_path,
    resolve_results_root, select_subset,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Sweep config name under benchmarks/
    #[arg(short, long)]
    config_name: Option<PathBuf>,

    /// Number of workers running gem5 in parallel
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// CPU models to sweep, default to every model in the config
    #[arg(long)]
    cpu: Vec<String>,

    /// Memory controllers to sweep, default to every controller in the config
    #[arg(long)]
    mem: Vec<String>,

    /// Result tree root, default to $LAB_PATH/results
    #[arg(short, long)]
    results_dir: Option<PathBuf>,

    /// Enumerate and print the runs without launching gem5
    #[arg(long)]
    dry_run: bool,
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
    let cpus = select_subset(&config.cpus, &args.cpu)?;
    let mem_ctls = select_subset(&config.mem_ctls, &args.mem)?;

    let runs = enumerate_runs(
        &config.benchmarks,
        &cpus,
        &mem_ctls,
        &config.suite_root,
        &config.exe_suffix,
    );
    println!(
        "Enumerated {} runs: {} benchmarks x {} CPUs x {} memory controllers",
        runs.len(),
        config.benchmarks.len(),
        cpus.len(),
        mem_ctls.len()
    );

    if args.dry_run {
        let cwd = std::env::current_dir()?;
        for run in &runs {
            let run_dir = run.run_dir(&results_root);
            let run_dir = pathdiff::diff_paths(&run_dir, &cwd).unwrap_or(run_dir);
            println!(
                "{} {} {} => {}",
                run.benchmark,
                run.cpu,
                run.mem_ctl,
                run_dir.display()
            );
        }
        return Ok(());
    }

    // the gem5 build is required before any job is dispatched
    let gem5 = Gem5::locate(config.run_script.clone(), config.clock.clone())?;

    println!(
        "Running {} with {} on {} workers",
        gem5.binary.display(),
        gem5.run_script.display(),
        args.jobs
    );
    let summaries = dispatch(&gem5, &results_root, &runs, args.jobs)?;

    let report_path = get_report_path(
        &results_root,
        &Local::now().format("%Y%m%d-%H%M%S").to_string(),
    );
    std::fs::write(&report_path, serde_json::to_vec_pretty(&summaries)?)?;
    println!("Sweep report written to {}", report_path.display());

    // failures were contained per job; report them only after the pool drained
    let failed: Vec<_> = summaries.iter().filter(|summary| !summary.success).collect();
    if failed.is_empty() {
        println!("All {} runs finished successfully", summaries.len());
        return Ok(());
    }

    let mut table = vec![];
    for summary in &failed {
        table.push(vec![
            summary.benchmark.as_str().cell(),
            summary.cpu.as_str().cell(),
            summary.mem_ctl.as_str().cell(),
            match summary.exit_code {
                Some(code) => code.to_string().cell(),
                None => "-".cell(),
            },
            summary.error.clone().unwrap_or_default().cell(),
        ]);
    }
    let table = table.table().title(vec![
        "Benchmark".cell(),
        "CPU".cell(),
        "Memory".cell(),
        "Exit".cell(),
        "Error".cell(),
    ]);
    print_stdout(table)?;

    bail!("{} of {} runs failed", failed.len(), summaries.len());
}
