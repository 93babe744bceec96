//! Per-section particle extraction, velocity statistics, and cross-section
//! classification.
//!
//! Sections are classified into one of eight fixed cross-section buckets by
//! combining the truncated mean of the raw `XS` codes with the section's
//! 1-based position in the run. The index thresholds are calibration
//! constants for one specific flume layout and must not be generalized.

use std::collections::BTreeMap;

use crate::parser::{ParseError, ParticleRecord, parse_particle_line};

/// The eight cross-section identifiers of the measured flume geometry.
pub const BUCKET_IDS: [u32; 8] = [11, 12, 21, 22, 31, 32, 41, 42];

/// Mean valid-particle count per bucket across all contributing sections.
pub type CrossSectionAverages = BTreeMap<u32, f64>;

/// Run the line parser over a whole section, keeping successful parses in
/// line order. Malformed numerals inside matching lines propagate as errors.
pub fn extract_valid_particles(section: &[String]) -> Result<Vec<ParticleRecord>, ParseError> {
    let mut records = Vec::new();
    for line in section {
        if let Some(record) = parse_particle_line(line)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Arithmetic mean of the velocity field, rounded to 3 decimals. 0 when empty.
pub fn average_velocity(records: &[ParticleRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records.iter().map(|r| r.velocity).sum();
    round_dp(sum / records.len() as f64, 3)
}

/// Population standard deviation of the velocity field, rounded to 3
/// decimals. 0 when empty.
pub fn std_velocity(records: &[ParticleRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let count = records.len() as f64;
    let mean = records.iter().map(|r| r.velocity).sum::<f64>() / count;
    let variance = records
        .iter()
        .map(|r| (r.velocity - mean).powi(2))
        .sum::<f64>()
        / count;
    round_dp(variance.sqrt(), 3)
}

/// Assign a section to a cross-section bucket.
///
/// The truncated integer mean of the raw `XS` codes selects the geometry
/// group; the 1-based section number selects the upstream or downstream
/// variant. Index thresholds are per-group calibration values.
///
/// Returns `None` for raw means outside the four known groups.
pub fn determine_bucket(records: &[ParticleRecord], section_number: usize) -> Option<u32> {
    if records.is_empty() {
        return None;
    }
    let total: u64 = records.iter().map(|r| u64::from(r.cross_section_raw)).sum();
    match total / records.len() as u64 {
        1 => Some(if section_number < 20 { 11 } else { 12 }),
        4 => Some(if section_number < 40 { 41 } else { 42 }),
        2 => Some(if section_number < 50 { 21 } else { 22 }),
        3 => Some(if section_number < 60 { 31 } else { 32 }),
        _ => None,
    }
}

/// Mean valid-particle count per bucket over the whole run.
///
/// Sections without valid particles contribute to neither the numerator nor
/// the denominator of their bucket; sections with an unresolved bucket are
/// ignored as well. Every one of the eight buckets is present in the result,
/// 0 when nothing contributed to it. Averages are rounded to 1 decimal.
pub fn average_particle_count_per_bucket(
    sections: &[Vec<String>],
) -> Result<CrossSectionAverages, ParseError> {
    let mut totals: BTreeMap<u32, usize> = BTreeMap::new();
    let mut contributing: BTreeMap<u32, usize> = BTreeMap::new();

    for (index, section) in sections.iter().enumerate() {
        let section_number = index + 1;
        let records = extract_valid_particles(section)?;
        if records.is_empty() {
            continue;
        }
        if let Some(bucket) = determine_bucket(&records, section_number) {
            *totals.entry(bucket).or_insert(0) += records.len();
            *contributing.entry(bucket).or_insert(0) += 1;
        }
    }

    let mut averages = CrossSectionAverages::new();
    for &bucket in &BUCKET_IDS {
        let average = match (totals.get(&bucket), contributing.get(&bucket)) {
            (Some(&total), Some(&count)) if count > 0 => round_dp(total as f64 / count as f64, 1),
            _ => 0.0,
        };
        averages.insert(bucket, average);
    }
    Ok(averages)
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
