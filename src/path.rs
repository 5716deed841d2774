// on-disk layout:
// benchmarks/
// \- {config-name}/
//    \- config.json
// {results-root}/
// |- sweep-{datetime}.json
// \- {benchmark-name}/
//    \- {cpu-model}/
//       \- {memory-controller}/
//          |- stats.txt       (written by gem5)
//          |- stdout.log
//          \- run.json

use anyhow::bail;
use skim::{
    Skim,
    prelude::{SkimItemReader, SkimOptionsBuilder},
};
use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

pub fn get_config_path<P: AsRef<Path>>(config_name: P) -> PathBuf {
    PathBuf::from("benchmarks")
        .join(config_name)
        .join("config.json")
}

/// One directory per run configuration, partitioned by construction so no
/// two jobs can write-collide
pub fn get_run_dir<P: AsRef<Path>>(
    results_root: P,
    benchmark: &str,
    cpu: &str,
    mem_ctl: &str,
) -> PathBuf {
    results_root
        .as_ref()
        .join(benchmark)
        .join(cpu)
        .join(mem_ctl)
}

pub fn get_stats_path(run_dir: &Path) -> PathBuf {
    run_dir.join("stats.txt")
}

pub fn get_summary_path(run_dir: &Path) -> PathBuf {
    run_dir.join("run.json")
}

pub fn get_stdout_path(run_dir: &Path) -> PathBuf {
    run_dir.join("stdout.log")
}

pub fn get_report_path<P: AsRef<Path>>(results_root: P, datetime: &str) -> PathBuf {
    results_root
        .as_ref()
        .join(format!("sweep-{}.json", datetime))
}

fn get_selection(selections: Vec<String>, prompt: &str) -> anyhow::Result<String> {
    let options = SkimOptionsBuilder::default()
        .height(String::from("50%"))
        .prompt(prompt.to_string())
        .build()?;

    let input = selections.join("\n");

    let item_reader = SkimItemReader::default();
    let items = item_reader.of_bufread(Cursor::new(input));

    let output = Skim::run_with(&options, Some(items)).unwrap();
    if output.is_abort {
        bail!("User cancelled the selection")
    }

    assert_eq!(output.selected_items.len(), 1);
    Ok(output.selected_items[0].output().to_string())
}

pub fn ask_for_config_name() -> anyhow::Result<String> {
    let mut paths = vec![];
    for path in std::fs::read_dir(PathBuf::from("benchmarks"))? {
        let path = path?;
        if path.file_type()?.is_dir() {
            paths.push(
                path.path()
                    .file_name()
                    .unwrap()
                    .to_str()
                    .unwrap()
                    .to_string(),
            );
        }
    }
    paths.sort();

    get_selection(paths, "Choose sweep config: ")
}
