//! Run-wide aggregation of per-section results.

use anyhow::Context;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One reported section. Column order is fixed by the export schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub bucket: u32,
    pub valid_particle_count: usize,
    pub avg_particle: f64,
    pub std_velocity: f64,
    pub avg_velocity: f64,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "xs {:>2}  particles {:>5}  avg_particle {:>7.1}  sd_velocity {:.3}  avg_velocity {:.3}",
            self.bucket,
            self.valid_particle_count,
            self.avg_particle,
            self.std_velocity,
            self.avg_velocity
        )
    }
}

/// Accumulates one row per reported section and derives run statistics.
///
/// Rows keep insertion order (the order sections were processed in); the
/// sorted view is derived on demand and leaves the stored rows untouched.
#[derive(Debug, Default)]
pub struct RunReport {
    rows: Vec<ReportRow>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of the std-velocity column. 0 when the report is empty.
    pub fn mean_std_velocity(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(|r| r.std_velocity).sum::<f64>() / self.rows.len() as f64
    }

    /// Rows sorted by std-velocity, highest first. The sort is stable, so
    /// ties keep their insertion order.
    pub fn sorted_by_std_velocity(&self) -> Vec<ReportRow> {
        let mut sorted = self.rows.clone();
        sorted.sort_by(|a, b| b.std_velocity.total_cmp(&a.std_velocity));
        sorted
    }

    /// Write all rows as CSV in insertion order, no index column.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)
            .with_context(|| format!("failed to create report file {}", path.display()))?;
        writeln!(file, "xs,valid_particle_count,avg_particle,sd_velocity,avg_velocity")?;
        for row in &self.rows {
            writeln!(
                file,
                "{},{},{},{},{}",
                row.bucket,
                row.valid_particle_count,
                row.avg_particle,
                row.std_velocity,
                row.avg_velocity
            )?;
        }
        Ok(())
    }
}
