use crate::{Benchmark, Gem5, RunConfiguration, RunSummary};
use anyhow::{Context, bail};
use indicatif::ProgressBar;
use log::warn;
use rayon::prelude::*;
use std::path::Path;

pub fn get_tqdm_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(
            "{percent:>3}% |{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {custom_per_sec}]",
        )
        .unwrap()
        .with_key(
            "custom_per_sec",
            Box::new(|s: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.2} it/s", s.per_sec()).unwrap()),
        ).progress_chars("██ ")
}

/// Cartesian product of benchmarks x CPU models x memory controllers,
/// benchmark-major, in configured order
pub fn enumerate_runs(
    benchmarks: &[Benchmark],
    cpus: &[String],
    mem_ctls: &[String],
    suite_root: &Path,
    exe_suffix: &str,
) -> Vec<RunConfiguration> {
    let mut runs = vec![];
    for benchmark in benchmarks {
        for cpu in cpus {
            for mem_ctl in mem_ctls {
                runs.push(RunConfiguration {
                    benchmark: benchmark.name.clone(),
                    cpu: cpu.clone(),
                    mem_ctl: mem_ctl.clone(),
                    binary: benchmark.binary_path(suite_root, exe_suffix),
                    args: benchmark.args.clone(),
                    warmup_insts: benchmark.warmup_insts,
                    run_insts: benchmark.run_insts,
                });
            }
        }
    }
    runs
}

/// Run the whole sweep on a pool of exactly `jobs` workers, each executing
/// one gem5 process at a time to completion. Submission follows the
/// enumeration order, completion order is up to the pool. A failing job
/// only marks its own summary; the pool always drains and the returned
/// summaries come back in submission order.
pub fn dispatch(
    gem5: &Gem5,
    results_root: &Path,
    runs: &[RunConfiguration],
    jobs: usize,
) -> anyhow::Result<Vec<RunSummary>> {
    if jobs == 0 {
        bail!("worker pool size must be at least 1");
    }

    // one directory per run, created before anything is submitted
    for run in runs {
        let run_dir = run.run_dir(results_root);
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("create run directory {}", run_dir.display()))?;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("build worker pool")?;

    let pbar = ProgressBar::new(runs.len() as u64);
    pbar.set_style(get_tqdm_style());

    let summaries: Vec<RunSummary> = pool.install(|| {
        runs.par_iter()
            .map(|run| {
                let summary = gem5.execute(run, results_root);
                match summary.to_json() {
                    Ok(json) => pbar.println(json),
                    Err(err) => warn!("cannot serialize run summary: {}", err),
                }
                if let Err(err) = summary.write() {
                    warn!(
                        "cannot write run summary for {}: {}",
                        summary.run_dir.display(),
                        err
                    );
                }
                pbar.inc(1);
                summary
            })
            .collect()
    });
    pbar.finish();

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use crate::{Benchmark, enumerate_runs};
    use std::collections::HashSet;
    use std::path::Path;

    fn benchmark(name: &str) -> Benchmark {
        Benchmark {
            name: name.to_string(),
            args: String::new(),
            executable: None,
            warmup_insts: 0,
            run_insts: 1000,
        }
    }

    #[test]
    fn test_enumeration() {
        let benchmarks = vec![benchmark("505.mcf_r"), benchmark("541.leela_r")];
        let cpus = vec!["Simple".to_string(), "DefaultO3".to_string(), "Minor4".to_string()];
        let mem_ctls = vec!["DDR3_1600_8x8".to_string(), "HBM_1000_4H_1x64".to_string()];

        let runs = enumerate_runs(
            &benchmarks,
            &cpus,
            &mem_ctls,
            Path::new("/data/spec"),
            "_base.mytest-m64",
        );

        // |benchmarks| x |cpus| x |mem_ctls| runs, each with its own directory
        assert_eq!(runs.len(), 2 * 3 * 2);
        let run_dirs: HashSet<_> = runs
            .iter()
            .map(|run| run.run_dir(Path::new("results")))
            .collect();
        assert_eq!(run_dirs.len(), runs.len());

        // benchmark-major submission order
        assert_eq!(runs[0].benchmark, "505.mcf_r");
        assert_eq!(runs[0].cpu, "Simple");
        assert_eq!(runs[0].mem_ctl, "DDR3_1600_8x8");
        assert_eq!(runs[1].mem_ctl, "HBM_1000_4H_1x64");
        assert_eq!(runs[6].benchmark, "541.leela_r");

        assert_eq!(
            runs[0].binary,
            Path::new("/data/spec/505.mcf_r/exe/mcf_r_base.mytest-m64")
        );
    }
}
