//! Log parsing: particle line extraction and section splitting.
//!
//! `line` turns a single raw log line into a [`ParticleRecord`] (or filters
//! it); `section` cuts the full log into delimiter-bounded snapshots that the
//! analysis layer consumes.

pub mod line;
pub mod section;

pub use line::{ParseError, ParticleRecord, parse_particle_line};
pub use section::{SECTION_DELIMITER, split_sections};
