//! Parse individual log lines and extract particle records.
//!
//! A particle line is emitted by the simulation's tracking hook and carries
//! four tokens on a single line:
//!
//! ```text
//! KEY: 17 VECTOR: X=12.5 Y=150.0 Z=80.0 VELOCITY: 120.0 XS1
//! ```
//!
//! All four tokens must be present for a line to qualify; anything else is
//! ordinary log noise and is filtered without error. Positions and velocity
//! are logged in centimeters and converted to meters here.

use std::fmt;

/// Kinematic attributes of one tracked particle, in SI units.
///
/// `lateral_position` is the vector's Y component (across the channel width)
/// and `elevation` its Z component; the X component is not used by the
/// analysis. Velocity is rounded to three decimals at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    pub lateral_position: f64,
    pub elevation: f64,
    pub velocity: f64,
    pub cross_section_raw: u32,
}

/// Error type for particle line parsing failures.
///
/// A missing token is not an error (the line simply does not describe a
/// particle); this type covers lines that DO carry all four tokens but hold
/// a numeral the tracker should never have produced. Such lines abort the
/// run instead of being dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MalformedNumeral { field: &'static str, value: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedNumeral { field, value } => {
                write!(f, "malformed {} value '{}' in particle line", field, value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one log line into a particle record.
///
/// # Returns
///
/// * `Ok(Some(record))` - the line carries all four tokens and parses cleanly
/// * `Ok(None)` - at least one token is absent; not a particle line
/// * `Err(ParseError)` - a token is present but its numeral does not parse
pub fn parse_particle_line(line: &str) -> Result<Option<ParticleRecord>, ParseError> {
    let Some(vector) = find_vector_token(line) else {
        return Ok(None);
    };
    let Some(velocity_text) = find_velocity_token(line) else {
        return Ok(None);
    };
    let Some(xs_digits) = find_xs_token(line) else {
        return Ok(None);
    };
    if !has_key_token(line) {
        return Ok(None);
    }

    // All four tokens are present; numeric failures are hard errors from here.
    let lateral_position = parse_numeral(vector.y, "Y")? / 100.0;
    let elevation = parse_numeral(vector.z, "Z")? / 100.0;
    let velocity = round3(parse_numeral(velocity_text, "VELOCITY")? / 100.0);
    let cross_section_raw =
        xs_digits
            .parse::<u32>()
            .map_err(|_| ParseError::MalformedNumeral {
                field: "XS",
                value: xs_digits.to_string(),
            })?;

    Ok(Some(ParticleRecord {
        lateral_position,
        elevation,
        velocity,
        cross_section_raw,
    }))
}

/// Y and Z numerals of a vector token, unparsed.
struct VectorFields<'a> {
    y: &'a str,
    z: &'a str,
}

fn is_numeral_char(c: char) -> bool {
    c == '-' || c == '.' || c.is_ascii_digit()
}

/// Leading run of numeral characters in `s`. May be empty.
fn numeral_run(s: &str) -> &str {
    let end = s.find(|c: char| !is_numeral_char(c)).unwrap_or(s.len());
    &s[..end]
}

/// `KEY: <digits>` anywhere in the line.
fn has_key_token(line: &str) -> bool {
    line.match_indices("KEY: ")
        .any(|(pos, token)| line[pos + token.len()..].starts_with(|c: char| c.is_ascii_digit()))
}

/// `VECTOR: X=<num> Y=<num> Z=<num>` with single-space separation.
///
/// The X component only has to be present for the token to count; it is
/// never parsed into the record.
fn find_vector_token(line: &str) -> Option<VectorFields<'_>> {
    for (pos, token) in line.match_indices("VECTOR: ") {
        if let Some(fields) = match_vector_fields(&line[pos + token.len()..]) {
            return Some(fields);
        }
    }
    None
}

fn match_vector_fields(rest: &str) -> Option<VectorFields<'_>> {
    let rest = rest.strip_prefix("X=")?;
    let x = numeral_run(rest);
    if x.is_empty() {
        return None;
    }
    let rest = rest[x.len()..].strip_prefix(" Y=")?;
    let y = numeral_run(rest);
    if y.is_empty() {
        return None;
    }
    let rest = rest[y.len()..].strip_prefix(" Z=")?;
    let z = numeral_run(rest);
    if z.is_empty() {
        return None;
    }
    Some(VectorFields { y, z })
}

/// `VELOCITY: <num>`; returns the unparsed numeral.
fn find_velocity_token(line: &str) -> Option<&str> {
    for (pos, token) in line.match_indices("VELOCITY: ") {
        let run = numeral_run(&line[pos + token.len()..]);
        if !run.is_empty() {
            return Some(run);
        }
    }
    None
}

/// `XS<digits>`; returns the digit run.
fn find_xs_token(line: &str) -> Option<&str> {
    for (pos, token) in line.match_indices("XS") {
        let rest = &line[pos + token.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end > 0 {
            return Some(&rest[..end]);
        }
    }
    None
}

fn parse_numeral(text: &str, field: &'static str) -> Result<f64, ParseError> {
    text.parse::<f64>().map_err(|_| ParseError::MalformedNumeral {
        field,
        value: text.to_string(),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "LogSim: tracking hit KEY: 7 VECTOR: X=12.5 Y=150 Z=80 VELOCITY: 120 XS1";

    #[test]
    fn parses_full_line_with_unit_conversion() {
        let record = parse_particle_line(SAMPLE).unwrap().unwrap();
        assert_eq!(record.lateral_position, 1.5);
        assert_eq!(record.elevation, 0.8);
        assert_eq!(record.velocity, 1.2);
        assert_eq!(record.cross_section_raw, 1);
    }

    #[test]
    fn rejects_line_missing_any_token() {
        let variants = [
            // no key token
            "VECTOR: X=1 Y=2 Z=3 VELOCITY: 10 XS1",
            // incomplete vector
            "KEY: 7 VECTOR: X=1 Y=2 VELOCITY: 10 XS1",
            // no vector at all
            "KEY: 7 VELOCITY: 10 XS1",
            // no velocity
            "KEY: 7 VECTOR: X=1 Y=2 Z=3 XS1",
            // no cross-section
            "KEY: 7 VECTOR: X=1 Y=2 Z=3 VELOCITY: 10",
        ];
        for line in variants {
            assert_eq!(parse_particle_line(line).unwrap(), None, "line: {line}");
        }
    }

    #[test]
    fn ordinary_log_noise_is_filtered() {
        assert_eq!(parse_particle_line("frame 812 finished in 16 ms").unwrap(), None);
        assert_eq!(parse_particle_line("").unwrap(), None);
    }

    #[test]
    fn negative_components_parse() {
        let line = "KEY: 3 VECTOR: X=-10 Y=-250 Z=40 VELOCITY: 55 XS2";
        let record = parse_particle_line(line).unwrap().unwrap();
        assert_eq!(record.lateral_position, -2.5);
        assert_eq!(record.elevation, 0.4);
        assert_eq!(record.cross_section_raw, 2);
    }

    #[test]
    fn velocity_rounded_to_three_decimals() {
        let line = "KEY: 1 VECTOR: X=0 Y=10 Z=10 VELOCITY: 123.4567 XS1";
        let record = parse_particle_line(line).unwrap().unwrap();
        assert_eq!(record.velocity, 1.235);
    }

    #[test]
    fn malformed_vector_component_is_fatal() {
        let line = "KEY: 7 VECTOR: X=1 Y=1.2.3 Z=80 VELOCITY: 120 XS1";
        let err = parse_particle_line(line).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedNumeral {
                field: "Y",
                value: "1.2.3".to_string()
            }
        );
    }

    #[test]
    fn malformed_velocity_is_fatal() {
        let line = "KEY: 7 VECTOR: X=1 Y=150 Z=80 VELOCITY: -- XS1";
        assert!(parse_particle_line(line).is_err());
    }
}
