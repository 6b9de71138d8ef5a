//! Parsing of segmentation label files: one polygon per line, a class id
//! followed by normalized coordinate pairs, e.g.
//! `1 0.12 0.30 0.15 0.31 ...`.

/// One parsed segmentation line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSegmentation {
    /// Zero-based line index in the file.
    pub index: usize,
    /// Class id (see `class_name`).
    pub label: i64,
    /// Normalized points, space separated.
    pub points: String,
    /// Number of coordinate pairs.
    pub points_count: usize,
}

/// Parses a single line into a class label and its points string.
/// Lines with fewer than a label plus one coordinate pair are rejected.
pub fn parse_line(line: &str) -> Option<(i64, String)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    let label: i64 = parts[0].parse().ok()?;
    Some((label, parts[1..].join(" ")))
}

/// Parses an entire segmentation file, skipping malformed lines.
pub fn parse_file(content: &str) -> Vec<ParsedSegmentation> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let (label, points) = parse_line(line)?;
            let points_count = points.split_whitespace().count() / 2;
            Some(ParsedSegmentation {
                index,
                label,
                points,
                points_count,
            })
        })
        .collect()
}

/// Checks that a points string holds at least two points, an even number
/// of coordinates, all parseable and finite.
pub fn validate_points(points: &str) -> bool {
    let parts: Vec<&str> = points.split_whitespace().collect();
    if parts.len() < 4 || parts.len() % 2 != 0 {
        return false;
    }
    parts
        .iter()
        .all(|p| p.parse::<f64>().map_or(false, f64::is_finite))
}
