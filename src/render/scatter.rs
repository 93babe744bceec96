//! Velocity-colored scatter plots of particle positions, one PNG per section.

use anyhow::anyhow;
use plotters::prelude::*;
use std::path::PathBuf;

use super::{SectionRenderer, SectionStats};
use crate::config::AnalyzerConfig;
use crate::parser::ParticleRecord;

/// Plot canvas in pixels.
const PLOT_SIZE: (u32, u32) = (1920, 1080);

/// Fixed elevation range of the flume in meters.
const ELEVATION_MAX: f64 = 0.8;

/// Rainbow colormap stops as (position, (r, g, b)) with channels in 0..=1.
const COLORMAP_STOPS: [(f64, (f64, f64, f64)); 7] = [
    (0.0, (0.0, 0.0, 0.5)),
    (0.125, (0.0, 0.0, 1.0)),
    (0.375, (0.0, 1.0, 1.0)),
    (0.5, (0.0, 1.0, 0.0)),
    (0.625, (1.0, 1.0, 0.0)),
    (0.875, (1.0, 0.0, 0.0)),
    (1.0, (0.5, 0.0, 0.0)),
];

/// Renders sections as scatter plots named `section_plot_<n>.png`.
pub struct ScatterRenderer {
    output_dir: PathBuf,
    velocity_scale_max: f64,
    marker_size: i32,
    velocity_floor: Option<f64>,
}

impl ScatterRenderer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            velocity_scale_max: config.velocity_scale_max,
            marker_size: ((0.2 * config.marker_radius).round() as i32).max(1),
            velocity_floor: config
                .filter_slow_particles
                .then_some(config.velocity_floor),
        }
    }
}

impl SectionRenderer for ScatterRenderer {
    fn render_section(
        &self,
        records: &[ParticleRecord],
        stats: &SectionStats,
        axis_range: (f64, f64),
    ) -> anyhow::Result<()> {
        let drawn = apply_velocity_floor(records, self.velocity_floor);

        let path = self
            .output_dir
            .join(format!("section_plot_{}.png", stats.section_number));
        let root = BitMapBackend::new(&path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("failed to fill plot background: {e}"))?;

        let caption = format!(
            "Section {}: particles {}, avg particles {}, avg velocity {:.3} m/s, sd velocity {:.3}",
            stats.section_number,
            stats.valid_particle_count,
            stats.avg_particle,
            stats.avg_velocity,
            stats.std_velocity
        );

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 36))
            .margin(24)
            .x_label_area_size(70)
            .y_label_area_size(90)
            .build_cartesian_2d(axis_range.0..axis_range.1, 0.0..ELEVATION_MAX)
            .map_err(|e| anyhow!("failed to build section chart: {e}"))?;

        chart
            .configure_mesh()
            .x_desc("Y Values (m)")
            .y_desc("Z Values (m)")
            .axis_desc_style(("sans-serif", 24))
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(|e| anyhow!("failed to draw chart mesh: {e}"))?;

        chart
            .draw_series(drawn.iter().map(|record| {
                Circle::new(
                    (record.lateral_position, record.elevation),
                    self.marker_size,
                    velocity_color(record.velocity, self.velocity_scale_max).filled(),
                )
            }))
            .map_err(|e| anyhow!("failed to draw particle series: {e}"))?;

        root.present()
            .map_err(|e| anyhow!("failed to write {}: {e}", path.display()))?;
        Ok(())
    }
}

/// Keep only particles at or above the floor; `None` keeps everything.
fn apply_velocity_floor(
    records: &[ParticleRecord],
    floor: Option<f64>,
) -> Vec<&ParticleRecord> {
    match floor {
        Some(floor) => records.iter().filter(|r| r.velocity >= floor).collect(),
        None => records.iter().collect(),
    }
}

/// Map a velocity onto the rainbow colormap, clamped to `0..=scale_max`.
fn velocity_color(velocity: f64, scale_max: f64) -> RGBColor {
    let t = if scale_max > 0.0 {
        (velocity / scale_max).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut lower = COLORMAP_STOPS[0];
    for &stop in &COLORMAP_STOPS[1..] {
        if t <= stop.0 {
            let (t0, c0) = lower;
            let (t1, c1) = stop;
            let span = t1 - t0;
            let fraction = if span > 0.0 { (t - t0) / span } else { 0.0 };
            return lerp_color(c0, c1, fraction);
        }
        lower = stop;
    }
    let (_, last) = COLORMAP_STOPS[COLORMAP_STOPS.len() - 1];
    lerp_color(last, last, 0.0)
}

fn lerp_color(a: (f64, f64, f64), b: (f64, f64, f64), fraction: f64) -> RGBColor {
    let channel = |x: f64, y: f64| ((x + (y - x) * fraction) * 255.0).round() as u8;
    RGBColor(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}
