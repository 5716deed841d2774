use log::warn;
use std::path::Path;

/// stats.txt files below this size are treated as empty: gem5 leaves a
/// stub behind when a run dies before the first statistics dump
pub const MIN_STATS_BYTES: usize = 10;

/// gem5 simulates at one picosecond per tick; convert the configured top
/// level clock into ticks per cycle, e.g. "4GHz" => 250.0
pub fn ticks_per_cycle(clock: &str) -> anyhow::Result<f64> {
    let clock = clock.trim();
    let (number, scale) = if let Some(number) = clock.strip_suffix("GHz") {
        (number, 1e9)
    } else if let Some(number) = clock.strip_suffix("MHz") {
        (number, 1e6)
    } else {
        anyhow::bail!("cannot parse clock {:?}, expected e.g. 4GHz or 800MHz", clock);
    };
    let hz = number.trim().parse::<f64>().map_err(|_| {
        anyhow::anyhow!("cannot parse clock {:?}, expected e.g. 4GHz or 800MHz", clock)
    })? * scale;
    if hz <= 0.0 {
        anyhow::bail!("clock {:?} is not a positive frequency", clock);
    }
    Ok(1e12 / hz)
}

/// Look up one statistic in raw stats.txt content.
///
/// gem5 writes one `name  value  # description` line per statistic. The
/// lookup is a plain substring search for the first occurrence of `name`;
/// the value is the following token, delimited by whitespace or the `#`
/// starting the description. Anything that is absent or does not parse
/// degrades to 0.0 so a truncated line cannot abort an aggregation pass.
pub fn find_stat(content: &str, name: &str) -> f64 {
    let Some(pos) = content.find(name) else {
        return 0.0;
    };
    let rest = content[pos + name.len()..].trim_start();
    let token = rest
        .split(|c: char| c.is_whitespace() || c == '#')
        .next()
        .unwrap_or("");
    match token.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("statistic {} has non-numeric value {:?}, using 0.0", name, token);
            0.0
        }
    }
}

/// One run's stats.txt, read once. Missing, unreadable or near-empty files
/// degrade every lookup to zero instead of failing the aggregation.
pub struct StatsFile {
    content: String,
}

impl StatsFile {
    pub fn load(path: &Path) -> StatsFile {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    "cannot read {} ({}), all statistics degrade to zero",
                    path.display(),
                    err
                );
                String::new()
            }
        };
        if !content.is_empty() && content.len() < MIN_STATS_BYTES {
            warn!(
                "{} is only {} bytes, treating it as empty",
                path.display(),
                content.len()
            );
        }
        StatsFile { content }
    }

    pub fn stat(&self, name: &str) -> f64 {
        if self.content.len() < MIN_STATS_BYTES {
            return 0.0;
        }
        find_stat(&self.content, name)
    }
}

/// Scalar statistics scraped from one run, plus derived IPC/CPI
#[derive(Debug, Clone)]
pub struct StatisticsRecord {
    pub benchmark: String,
    pub cpu: String,
    pub mem_ctl: String,
    pub cycles: f64,
    pub instructions: f64,
    pub ops: f64,
    pub sim_seconds: f64,
    pub host_op_rate: f64,
    pub avg_mem_acc_lat: f64,
    pub bus_util: f64,
    pub bw_total: f64,
    pub tot_bus_lat: f64,
    pub avg_wr_bw: f64,
    pub miss_rate: f64,
    pub ipc: f64,
    pub cpi: f64,
}

impl StatisticsRecord {
    pub fn scrape(
        benchmark: &str,
        cpu: &str,
        mem_ctl: &str,
        stats: &StatsFile,
        ticks_per_cycle: f64,
    ) -> StatisticsRecord {
        let cycles = stats.stat("sim_ticks") / ticks_per_cycle;
        let instructions = stats.stat("sim_insts");
        // a failed or missing run has zero cycles; IEEE division keeps the
        // record well defined (NaN or infinity) and the printers flag it
        let ipc = instructions / cycles;
        StatisticsRecord {
            benchmark: benchmark.to_string(),
            cpu: cpu.to_string(),
            mem_ctl: mem_ctl.to_string(),
            cycles,
            instructions,
            ops: stats.stat("sim_ops"),
            sim_seconds: stats.stat("sim_ticks") / 1e12,
            host_op_rate: stats.stat("host_op_rate"),
            avg_mem_acc_lat: stats.stat("system.mem_ctrl.dram.avgMemAccLat"),
            bus_util: stats.stat("system.mem_ctrl.dram.busUtil"),
            bw_total: stats.stat("system.mem_ctrl.dram.bw_total::total"),
            tot_bus_lat: stats.stat("system.mem_ctrl.dram.totBusLat"),
            avg_wr_bw: stats.stat("system.mem_ctrl.dram.avgWrBW"),
            miss_rate: stats.stat("system.l2cache.overall_miss_rate::total"),
            ipc,
            cpi: 1.0 / ipc,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{StatisticsRecord, StatsFile, find_stat, ticks_per_cycle};

    const STATS: &str = "\
---------- Begin Simulation Statistics ----------
sim_seconds                                  0.000013                       # Number of seconds simulated
sim_ticks                                       12500                       # Number of ticks simulated
sim_insts                                         100                      # Number of instructions simulated
sim_ops                                           120                      # Number of ops (including micro ops) simulated
system.l2cache.overall_miss_rate::total      0.087616                       # miss rate for overall accesses
";

    #[test]
    fn test_find_stat() {
        assert_eq!(find_stat("sim_ticks   12345   #comment", "sim_ticks"), 12345.0);
        assert_eq!(find_stat("sim_ticks   12345   #comment", "missing_stat"), 0.0);
        assert_eq!(
            find_stat(STATS, "system.l2cache.overall_miss_rate::total"),
            0.087616
        );
        // a truncated line degrades instead of failing
        assert_eq!(find_stat("sim_ticks   #comment", "sim_ticks"), 0.0);
    }

    #[test]
    fn test_short_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");

        // missing file
        let stats = StatsFile::load(&path);
        assert_eq!(stats.stat("sim_ticks"), 0.0);

        // file below the minimum byte threshold
        std::fs::write(&path, "sim_t").unwrap();
        let stats = StatsFile::load(&path);
        assert_eq!(stats.stat("sim_t"), 0.0);

        // a real file round-trips
        std::fs::write(&path, STATS).unwrap();
        let stats = StatsFile::load(&path);
        assert_eq!(stats.stat("sim_ticks"), 12500.0);
    }

    #[test]
    fn test_ticks_per_cycle() {
        assert_eq!(ticks_per_cycle("4GHz").unwrap(), 250.0);
        assert_eq!(ticks_per_cycle("1GHz").unwrap(), 1000.0);
        assert_eq!(ticks_per_cycle("500MHz").unwrap(), 2000.0);
        assert!(ticks_per_cycle("fast").is_err());
        assert!(ticks_per_cycle("0GHz").is_err());
    }

    #[test]
    fn test_derived_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, STATS).unwrap();
        let stats = StatsFile::load(&path);

        // 12500 ticks at 4GHz = 50 cycles, 100 instructions
        let record = StatisticsRecord::scrape(
            "505.mcf_r",
            "DefaultO3",
            "DDR3_1600_8x8",
            &stats,
            ticks_per_cycle("4GHz").unwrap(),
        );
        assert_eq!(record.cycles, 50.0);
        assert_eq!(record.ipc, 2.0);
        assert_eq!(record.cpi, 0.5);
        assert_eq!(record.miss_rate, 0.087616);
    }

    #[test]
    fn test_zero_cycles_do_not_panic() {
        let record = StatisticsRecord::scrape(
            "505.mcf_r",
            "Simple",
            "DDR3_1600_8x8",
            &StatsFile::load(std::path::Path::new("/nonexistent/stats.txt")),
            250.0,
        );
        assert_eq!(record.cycles, 0.0);
        assert!(record.ipc.is_nan());
        assert!(record.cpi.is_nan());
    }
}
