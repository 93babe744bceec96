//! Split a raw log into delimiter-bounded sections.

/// Token marking the end of a simulation snapshot in the log.
pub const SECTION_DELIMITER: &str = "STOP";

/// Split log lines into sections on the `STOP` delimiter.
///
/// A line containing the delimiter closes the current section (the delimiter
/// line itself belongs to neither side) and opens the next one, so back to
/// back delimiters produce empty sections. A trailing section without a
/// closing delimiter is still emitted; a log that ends right after a
/// delimiter leaves no trailing section behind.
///
/// Downstream consumers number sections 1-based in the order returned here.
pub fn split_sections<I, S>(lines: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sections = Vec::new();
    let mut current = Vec::new();

    for line in lines {
        let line = line.as_ref().trim_end();
        if line.contains(SECTION_DELIMITER) {
            sections.push(std::mem::take(&mut current));
        } else {
            current.push(line.to_string());
        }
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}
