use crate::{get_run_dir, get_stdout_path, get_summary_path};
use anyhow::bail;
use chrono::Local;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One fully specified simulator invocation. Immutable once enumerated;
/// (benchmark, cpu, mem_ctl) also names the run's output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub benchmark: String,
    pub cpu: String,
    pub mem_ctl: String,
    /// Path to the benchmark binary executed inside the simulated system
    pub binary: PathBuf,
    /// Command line of the benchmark binary, passed as a single argument
    pub args: String,
    pub warmup_insts: u64,
    pub run_insts: u64,
}

impl RunConfiguration {
    pub fn run_dir(&self, results_root: &Path) -> PathBuf {
        get_run_dir(results_root, &self.benchmark, &self.cpu, &self.mem_ctl)
    }
}

/// The external simulator surface: which gem5 build to boot, which
/// configuration script to hand it, and the system clock. Everything
/// behind this command line (pipeline models, DRAM timing, region of
/// interest handling) belongs to gem5 and is not modeled here.
#[derive(Debug, Clone)]
pub struct Gem5 {
    pub binary: PathBuf,
    pub run_script: PathBuf,
    pub clock: String,
}

impl Gem5 {
    /// Locate the gem5 build from M5_PATH. Checked before any job is
    /// dispatched, a missing build fails the whole sweep up front.
    pub fn locate(run_script: PathBuf, clock: String) -> anyhow::Result<Gem5> {
        let Some(m5_path) = std::env::var_os("M5_PATH") else {
            bail!("M5_PATH is not set, point it at a gem5 checkout with build/X86/gem5.opt");
        };
        let binary = PathBuf::from(m5_path)
            .try_resolve()?
            .join("build")
            .join("X86")
            .join("gem5.opt");
        if !binary.is_file() {
            bail!("gem5 binary {} does not exist, check M5_PATH", binary.display());
        }
        Ok(Gem5 {
            binary,
            run_script,
            clock,
        })
    }

    /// Full shell command of one run. The benchmark argument string is
    /// quoted as a whole, the run script splits it itself.
    pub fn command_line(&self, run: &RunConfiguration, run_dir: &Path) -> String {
        format!(
            "{} --outdir={} {} {} {} {} '{}' --clock {} -W {} -I {} > {} 2>&1",
            self.binary.display(),
            run_dir.display(),
            self.run_script.display(),
            run.cpu,
            run.mem_ctl,
            run.binary.display(),
            run.args,
            self.clock,
            run.warmup_insts,
            run.run_insts,
            get_stdout_path(run_dir).display(),
        )
    }

    /// Run one configuration synchronously to completion. Failures of the
    /// simulator end up in the summary, never as an error: one broken run
    /// must not take down its siblings.
    pub fn execute(&self, run: &RunConfiguration, results_root: &Path) -> RunSummary {
        let run_dir = run.run_dir(results_root);
        let command = self.command_line(run, &run_dir);
        let started = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let wall = std::time::Instant::now();

        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status();

        let (success, exit_code, error) = match status {
            Ok(status) => (status.success(), status.code(), None),
            Err(err) => (false, None, Some(err.to_string())),
        };

        RunSummary {
            benchmark: run.benchmark.clone(),
            cpu: run.cpu.clone(),
            mem_ctl: run.mem_ctl.clone(),
            run_dir,
            command,
            started,
            wall_seconds: wall.elapsed().as_secs_f64(),
            success,
            exit_code,
            error,
        }
    }
}

/// What one finished job reports back: the configuration echo plus how the
/// simulator process ended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub benchmark: String,
    pub cpu: String,
    pub mem_ctl: String,
    pub run_dir: PathBuf,
    pub command: String,
    pub started: String,
    pub wall_seconds: f64,
    pub success: bool,
    pub exit_code: Option<i32>,
    /// set when the simulator process could not be spawned at all
    pub error: Option<String>,
}

impl RunSummary {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn write(&self) -> anyhow::Result<()> {
        std::fs::write(
            get_summary_path(&self.run_dir),
            serde_json::to_vec_pretty(self)?,
        )?;
        Ok(())
    }
}
