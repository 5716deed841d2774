use crate::StatisticsRecord;
use clap::ValueEnum;
use log::warn;
use std::collections::HashMap;
use std::io::Write;

/// Which scraped statistic to pivot into the CSV
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    Cycles,
    Instructions,
    Ops,
    SimSeconds,
    HostOpRate,
    AvgMemAccLat,
    BusUtil,
    BwTotal,
    TotBusLat,
    AvgWrBw,
    MissRate,
    Ipc,
    Cpi,
}

impl Metric {
    pub fn of(&self, record: &StatisticsRecord) -> f64 {
        match self {
            Metric::Cycles => record.cycles,
            Metric::Instructions => record.instructions,
            Metric::Ops => record.ops,
            Metric::SimSeconds => record.sim_seconds,
            Metric::HostOpRate => record.host_op_rate,
            Metric::AvgMemAccLat => record.avg_mem_acc_lat,
            Metric::BusUtil => record.bus_util,
            Metric::BwTotal => record.bw_total,
            Metric::TotBusLat => record.tot_bus_lat,
            Metric::AvgWrBw => record.avg_wr_bw,
            Metric::MissRate => record.miss_rate,
            Metric::Ipc => record.ipc,
            Metric::Cpi => record.cpi,
        }
    }
}

/// All scraped records of one sweep, keyed by (benchmark, cpu, memory
/// controller). At most one record per key: a duplicate replaces the
/// earlier record.
#[derive(Default)]
pub struct ResultTable {
    records: Vec<StatisticsRecord>,
    index: HashMap<(String, String, String), usize>,
}

impl ResultTable {
    pub fn new() -> ResultTable {
        ResultTable::default()
    }

    pub fn push(&mut self, record: StatisticsRecord) {
        let key = (
            record.benchmark.clone(),
            record.cpu.clone(),
            record.mem_ctl.clone(),
        );
        match self.index.get(&key) {
            Some(&index) => {
                warn!(
                    "duplicate record for {}/{}/{}, replacing the earlier one",
                    key.0, key.1, key.2
                );
                self.records[index] = record;
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, benchmark: &str, cpu: &str, mem_ctl: &str) -> Option<&StatisticsRecord> {
        self.index
            .get(&(
                benchmark.to_string(),
                cpu.to_string(),
                mem_ctl.to_string(),
            ))
            .map(|&index| &self.records[index])
    }

    pub fn records(&self) -> &[StatisticsRecord] {
        &self.records
    }

    /// Emit the wide CSV for one metric: a `benchmark` column followed by
    /// one `{mem_ctl}-{cpu}` column per configured pair (CPU-major order),
    /// one row per benchmark in the given order. Every cell is present;
    /// an absent record emits the extractor's 0.0 fallback.
    pub fn write_pivot_csv<W: Write>(
        &self,
        writer: W,
        metric: Metric,
        benchmarks: &[String],
        cpus: &[String],
        mem_ctls: &[String],
    ) -> anyhow::Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(writer);

        let mut header = vec!["benchmark".to_string()];
        for cpu in cpus {
            for mem_ctl in mem_ctls {
                header.push(format!("{}-{}", mem_ctl, cpu));
            }
        }
        csv_writer.write_record(&header)?;

        for benchmark in benchmarks {
            let mut row = vec![benchmark.clone()];
            for cpu in cpus {
                for mem_ctl in mem_ctls {
                    let value = self
                        .get(benchmark, cpu, mem_ctl)
                        .map(|record| metric.of(record))
                        .unwrap_or(0.0);
                    row.push(value.to_string());
                }
            }
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Metric, ResultTable, StatisticsRecord};

    fn record(benchmark: &str, cpu: &str, mem_ctl: &str, miss_rate: f64) -> StatisticsRecord {
        StatisticsRecord {
            benchmark: benchmark.to_string(),
            cpu: cpu.to_string(),
            mem_ctl: mem_ctl.to_string(),
            cycles: 50.0,
            instructions: 100.0,
            ops: 120.0,
            sim_seconds: 0.0,
            host_op_rate: 0.0,
            avg_mem_acc_lat: 0.0,
            bus_util: 0.0,
            bw_total: 0.0,
            tot_bus_lat: 0.0,
            avg_wr_bw: 0.0,
            miss_rate,
            ipc: 2.0,
            cpi: 0.5,
        }
    }

    #[test]
    fn test_pivot_csv() {
        let mut table = ResultTable::new();
        table.push(record("A", "cpuX", "mem1", 0.25));
        // no record for benchmark B: its cell must fall back to zero

        let benchmarks = vec!["A".to_string(), "B".to_string()];
        let cpus = vec!["cpuX".to_string()];
        let mem_ctls = vec!["mem1".to_string()];

        let mut output = vec![];
        table
            .write_pivot_csv(&mut output, Metric::MissRate, &benchmarks, &cpus, &mem_ctls)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "benchmark,mem1-cpuX");
        assert_eq!(lines[1], "A,0.25");
        assert_eq!(lines[2], "B,0");
    }

    #[test]
    fn test_column_order_is_cpu_major() {
        let table = ResultTable::new();
        let benchmarks = vec!["A".to_string()];
        let cpus = vec!["Simple".to_string(), "DefaultO3".to_string()];
        let mem_ctls = vec!["mem1".to_string(), "mem2".to_string()];

        let mut output = vec![];
        table
            .write_pivot_csv(&mut output, Metric::Ipc, &benchmarks, &cpus, &mem_ctls)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output.lines().next().unwrap(),
            "benchmark,mem1-Simple,mem2-Simple,mem1-DefaultO3,mem2-DefaultO3"
        );
    }

    #[test]
    fn test_duplicate_replaces() {
        let mut table = ResultTable::new();
        table.push(record("A", "cpuX", "mem1", 0.25));
        table.push(record("A", "cpuX", "mem1", 0.5));
        assert_eq!(table.records().len(), 1);
        assert_eq!(table.get("A", "cpuX", "mem1").unwrap().miss_rate, 0.5);
    }
}
