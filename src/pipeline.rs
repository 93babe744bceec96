//! Two-pass processing pipeline over the log file.
//!
//! Pass 1 walks every section to compute the run-wide per-bucket particle
//! averages; pass 2 builds the report rows and triggers rendering. The
//! second pass cannot start per section because each row carries its
//! bucket's run-wide average, which is only known after the first pass.

use anyhow::Context;
use log::{info, warn};
use std::fs;
use std::path::Path;

use crate::analysis::{
    ReportRow, RunReport, average_particle_count_per_bucket, average_velocity, determine_bucket,
    extract_valid_particles, std_velocity,
};
use crate::config::AnalyzerConfig;
use crate::parser::split_sections;
use crate::render::{SectionRenderer, SectionStats};

/// Rows shown in the console previews after aggregation.
const PREVIEW_ROWS: usize = 5;

/// Process the whole log: parse sections, compute statistics, collect report
/// rows, and render one plot per reported section.
///
/// Sections without valid particles and sections whose bucket cannot be
/// resolved are warned about and left out of the report. Malformed numerals
/// in particle lines abort the run.
pub fn run(
    config: &AnalyzerConfig,
    log_path: &Path,
    renderer: &dyn SectionRenderer,
) -> anyhow::Result<RunReport> {
    let text = fs::read_to_string(log_path)
        .with_context(|| format!("failed to read log file {}", log_path.display()))?;
    let sections = split_sections(text.lines());
    info!("Loaded {} sections from {}", sections.len(), log_path.display());

    let averages = average_particle_count_per_bucket(&sections)?;

    let mut report = RunReport::new();
    for (index, section) in sections.iter().enumerate() {
        let section_number = index + 1;
        let records = extract_valid_particles(section)?;
        if records.is_empty() {
            warn!("Section {}: no valid particles, skipping", section_number);
            continue;
        }

        let avg_velocity = average_velocity(&records);
        let std_velocity = std_velocity(&records);
        let Some(bucket) = determine_bucket(&records, section_number) else {
            warn!(
                "Section {}: cross-section could not be resolved, skipping",
                section_number
            );
            continue;
        };
        let Some(axis_range) = config.axis_range(bucket) else {
            warn!(
                "Section {}: no axis limits configured for cross-section {}, skipping",
                section_number, bucket
            );
            continue;
        };
        let avg_particle = averages.get(&bucket).copied().unwrap_or(0.0);

        info!(
            "Section {}: count of valid particles: {}",
            section_number,
            records.len()
        );
        info!(
            "Section {}: average velocity: {:.3} m/s",
            section_number, avg_velocity
        );

        report.push(ReportRow {
            bucket,
            valid_particle_count: records.len(),
            avg_particle,
            std_velocity,
            avg_velocity,
        });

        let stats = SectionStats {
            valid_particle_count: records.len(),
            avg_particle,
            avg_velocity,
            std_velocity,
            section_number,
        };
        renderer.render_section(&records, &stats, axis_range)?;
    }

    Ok(report)
}

/// Print the console previews and export the CSV report.
pub fn finish_report(report: &RunReport, csv_path: &Path) -> anyhow::Result<()> {
    if report.is_empty() {
        warn!("No section produced a report row");
    }

    for row in report.rows().iter().take(PREVIEW_ROWS) {
        println!("{row}");
    }
    println!("mean sd_velocity: {}", report.mean_std_velocity());
    for row in report.sorted_by_std_velocity().iter().take(PREVIEW_ROWS) {
        println!("{row}");
    }

    report.write_csv(csv_path)?;
    info!("Report written to {}", csv_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParticleRecord;
    use std::cell::RefCell;

    /// Renderer double recording the section numbers it was asked to draw.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<usize>>,
    }

    impl SectionRenderer for RecordingRenderer {
        fn render_section(
            &self,
            _records: &[ParticleRecord],
            stats: &SectionStats,
            _axis_range: (f64, f64),
        ) -> anyhow::Result<()> {
            self.calls.borrow_mut().push(stats.section_number);
            Ok(())
        }
    }

    fn particle_line(y: f64, z: f64, velocity_cm: f64, xs: u32) -> String {
        format!("KEY: 1 VECTOR: X=0 Y={y} Z={z} VELOCITY: {velocity_cm} XS{xs}")
    }

    fn write_temp_log(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}.log", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn sections_without_particles_are_excluded() {
        let log = [
            particle_line(150.0, 80.0, 120.0, 1),
            particle_line(-50.0, 40.0, 60.0, 1),
            "STOP".to_string(),
            "no particles in this snapshot".to_string(),
            "STOP".to_string(),
            particle_line(10.0, 20.0, 30.0, 4),
        ]
        .join("\n");
        let path = write_temp_log("pipeline_three_sections", &log);

        let config = AnalyzerConfig::default();
        let renderer = RecordingRenderer::default();
        let report = run(&config, &path, &renderer).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(report.rows().len(), 2);
        assert_eq!(*renderer.calls.borrow(), vec![1, 3]);

        let first = &report.rows()[0];
        assert_eq!(first.bucket, 11);
        assert_eq!(first.valid_particle_count, 2);
        assert_eq!(first.avg_particle, 2.0);
        assert_eq!(first.avg_velocity, 0.9);
        assert_eq!(first.std_velocity, 0.3);

        let second = &report.rows()[1];
        assert_eq!(second.bucket, 41);
        assert_eq!(second.valid_particle_count, 1);
        assert_eq!(second.avg_particle, 1.0);
        assert_eq!(second.std_velocity, 0.0);
    }

    #[test]
    fn unresolved_cross_section_is_excluded() {
        // raw code 7 belongs to no geometry group
        let log = [particle_line(10.0, 10.0, 50.0, 7), "STOP".to_string()].join("\n");
        let path = write_temp_log("pipeline_unresolved", &log);

        let config = AnalyzerConfig::default();
        let renderer = RecordingRenderer::default();
        let report = run(&config, &path, &renderer).unwrap();
        let _ = fs::remove_file(&path);

        assert!(report.is_empty());
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn malformed_numeral_aborts_the_run() {
        let log = [
            "KEY: 1 VECTOR: X=0 Y=1.2.3 Z=5 VELOCITY: 10 XS1".to_string(),
            "STOP".to_string(),
        ]
        .join("\n");
        let path = write_temp_log("pipeline_malformed", &log);

        let config = AnalyzerConfig::default();
        let renderer = RecordingRenderer::default();
        let result = run(&config, &path, &renderer);
        let _ = fs::remove_file(&path);

        assert!(result.is_err());
    }

    #[test]
    fn csv_matches_report_rows() {
        let log = [
            particle_line(150.0, 80.0, 120.0, 1),
            "STOP".to_string(),
            particle_line(10.0, 20.0, 30.0, 4),
        ]
        .join("\n");
        let path = write_temp_log("pipeline_csv", &log);

        let config = AnalyzerConfig::default();
        let renderer = RecordingRenderer::default();
        let report = run(&config, &path, &renderer).unwrap();
        let _ = fs::remove_file(&path);

        let csv_path = std::env::temp_dir()
            .join(format!("pipeline_values_{}.csv", std::process::id()));
        report.write_csv(&csv_path).unwrap();
        let content = fs::read_to_string(&csv_path).unwrap();
        let _ = fs::remove_file(&csv_path);

        // header plus one row per reported section
        assert_eq!(content.lines().count(), 3);
    }
}
