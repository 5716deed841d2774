use crate::get_config_path;
use anyhow::{Context, bail};
use resolve_path::PathResolveExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Deserialize)]
pub struct Benchmark {
    /// Benchmark name, e.g. "505.mcf_r"
    pub name: String,
    /// Command line passed to the benchmark binary, may be empty
    #[serde(default)]
    pub args: String,
    /// Executable name override for benchmarks whose binary is not named
    /// after the part behind the dot, e.g. "cpuxalan_r" for 523.xalancbmk_r
    #[serde(default)]
    pub executable: Option<String>,
    /// Warmup instructions before statistics are collected
    #[serde(default)]
    pub warmup_insts: u64,
    /// Instructions to simulate after warmup
    pub run_insts: u64,
}

impl Benchmark {
    /// SPEC CPU executable naming: "505.mcf_r" becomes "mcf_r" plus the
    /// suite's build suffix, unless the config overrides it
    pub fn executable_name(&self, exe_suffix: &str) -> String {
        let base = match &self.executable {
            Some(executable) => executable.as_str(),
            None => match self.name.split_once('.') {
                Some((_, rest)) => rest,
                None => self.name.as_str(),
            },
        };
        format!("{}{}", base, exe_suffix)
    }

    pub fn binary_path(&self, suite_root: &Path, exe_suffix: &str) -> PathBuf {
        suite_root
            .join(&self.name)
            .join("exe")
            .join(self.executable_name(exe_suffix))
    }
}

#[derive(Clone, Deserialize)]
pub struct SweepConfig {
    /// gem5 configuration script booting one benchmark on the modeled system
    pub run_script: PathBuf,
    /// Root of the benchmark suite, contains one folder per benchmark
    pub suite_root: PathBuf,
    /// Top level clock handed to the run script
    #[serde(default = "default_clock")]
    pub clock: String,
    /// Suffix appended to every benchmark executable name
    #[serde(default = "default_exe_suffix")]
    pub exe_suffix: String,
    /// CPU models under test
    pub cpus: Vec<String>,
    /// Memory controllers under test
    pub mem_ctls: Vec<String>,
    pub benchmarks: Vec<Benchmark>,
}

fn default_clock() -> String {
    "4GHz".to_string()
}

fn default_exe_suffix() -> String {
    "_base.mytest-m64".to_string()
}

impl SweepConfig {
    pub fn load<P: AsRef<Path>>(config_name: P) -> anyhow::Result<SweepConfig> {
        let path = get_config_path(&config_name);
        let mut config: SweepConfig = serde_json::from_slice(
            &std::fs::read(&path)
                .with_context(|| format!("read sweep config {}", path.display()))?,
        )
        .with_context(|| format!("parse sweep config {}", path.display()))?;

        if config.benchmarks.is_empty() {
            bail!("{} lists no benchmarks", path.display());
        }
        if config.cpus.is_empty() || config.mem_ctls.is_empty() {
            bail!("{} must list at least one CPU and one memory controller", path.display());
        }

        config.suite_root = config.suite_root.try_resolve()?.into_owned();
        Ok(config)
    }
}

/// Result tree root, resolved once at process start: --results-dir wins,
/// otherwise $LAB_PATH/results; with neither set, startup fails.
pub fn resolve_results_root(results_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(results_dir) = results_dir {
        return Ok(results_dir.try_resolve()?.into_owned());
    }
    match std::env::var_os("LAB_PATH") {
        Some(lab_path) => Ok(PathBuf::from(lab_path).try_resolve()?.join("results")),
        None => bail!("no result tree: pass --results-dir or set LAB_PATH"),
    }
}

/// Restrict a configured list to the variants selected on the command line.
/// An empty selection means everything; unknown names are rejected up front,
/// before any job is dispatched. Config order is preserved either way.
pub fn select_subset(configured: &[String], selected: &[String]) -> anyhow::Result<Vec<String>> {
    if selected.is_empty() {
        return Ok(configured.to_vec());
    }
    for name in selected {
        if !configured.contains(name) {
            bail!(
                "{} is not part of this sweep config, choose from: {}",
                name,
                configured.join(", ")
            );
        }
    }
    Ok(configured
        .iter()
        .filter(|name| selected.contains(*name))
        .cloned()
        .collect())
}
