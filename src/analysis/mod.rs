//! Statistics and aggregation over parsed sections.
//!
//! `attributes` computes per-section velocity statistics and cross-section
//! classification; `report` accumulates the per-section rows of a whole run
//! and serializes them.

pub mod attributes;
pub mod report;

pub use attributes::{
    BUCKET_IDS, CrossSectionAverages, average_particle_count_per_bucket, average_velocity,
    determine_bucket, extract_valid_particles, std_velocity,
};
pub use report::{ReportRow, RunReport};
