//! Coordinate and bbox arithmetic over the textual formats used in the
//! papers document: bboxes as `"x1,y1,x2,y2"`, polygons as space-separated
//! coordinate pairs, normalized to the unit square.

/// Converts image coordinates into the 0..1 range.
pub fn normalize(x: f64, y: f64, image_width: f64, image_height: f64) -> (f64, f64) {
    if image_width <= 0.0 || image_height <= 0.0 {
        return (0.0, 0.0);
    }
    (x / image_width, y / image_height)
}

/// Converts normalized coordinates back into image coordinates.
pub fn denormalize(norm_x: f64, norm_y: f64, image_width: f64, image_height: f64) -> (f64, f64) {
    (norm_x * image_width, norm_y * image_height)
}

/// Denormalizes a whole "x y x y ..." points string, rounding to whole
/// pixels the way the labelling front-end expects.
pub fn denormalize_points(points: &str, image_width: f64, image_height: f64) -> String {
    let coords: Vec<f64> = points
        .split_whitespace()
        .filter_map(|p| p.parse().ok())
        .collect();

    let mut out = Vec::with_capacity(coords.len());
    for pair in coords.chunks_exact(2) {
        let (x, y) = denormalize(pair[0], pair[1], image_width, image_height);
        out.push(format!("{}", x.round()));
        out.push(format!("{}", y.round()));
    }
    out.join(" ")
}

/// Axis-aligned bbox of a denormalized points string, as `"x1,y1,x2,y2"`.
/// Returns an empty string when the input has no valid coordinate pair.
pub fn bbox_of_points(points: &str) -> String {
    let coords: Vec<f64> = points
        .split_whitespace()
        .filter_map(|p| p.parse().ok())
        .collect();
    if coords.len() < 2 {
        return String::new();
    }

    let xs = coords.iter().step_by(2);
    let ys = coords.iter().skip(1).step_by(2);
    let (mut x1, mut y1) = (f64::INFINITY, f64::INFINITY);
    let (mut x2, mut y2) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &x in xs {
        x1 = x1.min(x);
        x2 = x2.max(x);
    }
    for &y in ys {
        y1 = y1.min(y);
        y2 = y2.max(y);
    }
    if !x1.is_finite() || !y1.is_finite() {
        return String::new();
    }
    format!("{},{},{},{}", x1, y1, x2, y2)
}

fn parse_bbox(bbox: &str) -> Option<[f64; 4]> {
    let parts: Vec<f64> = bbox
        .split(',')
        .map(str::trim)
        .filter_map(|p| p.parse().ok())
        .collect();
    if parts.len() != 4 {
        return None;
    }
    Some([parts[0], parts[1], parts[2], parts[3]])
}

/// Intersection area of `inner` and `outer` divided by the area of
/// `inner`. 0.0 on malformed or degenerate boxes.
pub fn overlap_ratio(inner: &str, outer: &str) -> f64 {
    let (Some([ix1, iy1, ix2, iy2]), Some([ox1, oy1, ox2, oy2])) =
        (parse_bbox(inner), parse_bbox(outer))
    else {
        return 0.0;
    };

    let x_left = ix1.max(ox1);
    let y_top = iy1.max(oy1);
    let x_right = ix2.min(ox2);
    let y_bottom = iy2.min(oy2);
    if x_right < x_left || y_bottom < y_top {
        return 0.0;
    }

    let intersection = (x_right - x_left) * (y_bottom - y_top);
    let inner_area = (ix2 - ix1) * (iy2 - iy1);
    if inner_area > 0.0 {
        intersection / inner_area
    } else {
        0.0
    }
}

/// Fraction of a normalized points string that falls inside `bbox` once
/// denormalized to image coordinates.
pub fn points_within_bbox(points: &str, bbox: &str, image_width: f64, image_height: f64) -> f64 {
    let Some([x1, y1, x2, y2]) = parse_bbox(bbox) else {
        return 0.0;
    };
    let coords: Vec<f64> = points
        .split_whitespace()
        .filter_map(|p| p.parse().ok())
        .collect();
    let total = coords.len() / 2;
    if total == 0 {
        return 0.0;
    }

    let mut inside = 0usize;
    for pair in coords.chunks_exact(2) {
        let (x, y) = denormalize(pair[0], pair[1], image_width, image_height);
        if x1 <= x && x <= x2 && y1 <= y && y <= y2 {
            inside += 1;
        }
    }
    inside as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_roundtrip() {
        let (nx, ny) = normalize(512.0, 384.0, 1024.0, 768.0);
        assert_eq!((nx, ny), (0.5, 0.5));
        assert_eq!(denormalize(nx, ny, 1024.0, 768.0), (512.0, 384.0));
    }

    #[test]
    fn normalize_guards_zero_dimensions() {
        assert_eq!(normalize(10.0, 10.0, 0.0, 768.0), (0.0, 0.0));
    }

    #[test]
    fn denormalize_points_rounds_to_pixels() {
        let out = denormalize_points("0.25 0.5 0.75 0.5", 1000.0, 500.0);
        assert_eq!(out, "250 250 750 250");
    }

    #[test]
    fn bbox_from_points_is_min_max() {
        assert_eq!(bbox_of_points("10 20 50 5 30 40"), "10,5,50,40");
        assert_eq!(bbox_of_points(""), "");
        assert_eq!(bbox_of_points("garbage"), "");
    }

    #[test]
    fn overlap_full_containment_is_one() {
        assert!((overlap_ratio("10,10,20,20", "0,0,100,100") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_disjoint_is_zero() {
        assert_eq!(overlap_ratio("0,0,10,10", "20,20,30,30"), 0.0);
    }

    #[test]
    fn overlap_partial() {
        // Inner 10x10 box, half covered.
        let ratio = overlap_ratio("0,0,10,10", "5,0,30,10");
        assert!((ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn overlap_malformed_is_zero() {
        assert_eq!(overlap_ratio("not,a,box", "0,0,1,1"), 0.0);
        assert_eq!(overlap_ratio("0,0,1", "0,0,1,1"), 0.0);
    }

    #[test]
    fn points_within_bbox_fraction() {
        // Two points, one inside one outside after denormalization.
        let fraction = points_within_bbox("0.1 0.1 0.9 0.9", "0,0,200,200", 1000.0, 1000.0);
        assert!((fraction - 0.5).abs() < 1e-9);
    }
}
