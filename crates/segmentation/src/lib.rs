pub mod geometry;
pub mod parser;

pub use geometry::*;
pub use parser::*;

use atlas_models::{DiatomsData, LabelRecord, SegmentationRecord};
use tracing::{info, warn};

/// Minimum intersection-over-inner-area for a polygon to claim a bbox.
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Human readable name for a segmentation class id.
pub fn class_name(label: i64) -> &'static str {
    match label {
        0 => "Incomplete Diatom",
        1 => "Complete Diatom",
        2 => "Fragmented Diatom",
        3 => "Blurred Diatom",
        4 => "Diatom SideView",
        _ => "Unknown",
    }
}

/// Aligns the polygons of a segmentation file with the labelled bounding
/// boxes of `image`, stamping species and bbox data onto each matched
/// record. Unmatched records keep empty geometry and a zero overlap ratio.
pub fn apply_to_image(image: &mut DiatomsData, segmentation_text: &str) {
    let image_width: f64 = image.image_width.parse().unwrap_or(1024.0);
    let image_height: f64 = image.image_height.parse().unwrap_or(768.0);

    let parsed = parse_file(segmentation_text);
    let mut records = Vec::with_capacity(parsed.len());

    for line in parsed {
        let mut record = SegmentationRecord {
            index: line.index as i64,
            label: line.label,
            segmentation_points: line.points.clone(),
            points_count: line.points_count,
            ..Default::default()
        };

        record.denormalized_segmentation_points =
            denormalize_points(&line.points, image_width, image_height);
        record.denorm_points_bbox = bbox_of_points(&record.denormalized_segmentation_points);
        record.overlap_ratio = 0.0;

        if let Some((matched, ratio)) =
            match_to_labels(&record.denorm_points_bbox, &image.info, MATCH_THRESHOLD)
        {
            record.bbox = matched.bbox.clone();
            record.yolo_bbox = matched.yolo_bbox.clone();
            record.species = matched.species.clone();
            record.overlap_ratio = ratio;
            info!(
                index = record.index,
                species = %record.species,
                overlap = format!("{:.2}", ratio),
                "Matched segmentation polygon to labelled bbox"
            );
        }

        records.push(record);
    }

    if records.is_empty() {
        warn!("Segmentation file contained no parseable lines");
    }
    image.segmentation_indices_array = records;
}

/// Finds the label whose bbox best encloses `inner_bbox`, requiring at
/// least `threshold` intersection-over-inner-area.
pub fn match_to_labels<'a>(
    inner_bbox: &str,
    labels: &'a [LabelRecord],
    threshold: f64,
) -> Option<(&'a LabelRecord, f64)> {
    let mut best: Option<(&LabelRecord, f64)> = None;
    for label in labels {
        if label.bbox.is_empty() {
            continue;
        }
        let ratio = overlap_ratio(inner_bbox, &label.bbox);
        if ratio >= threshold && best.map_or(true, |(_, b)| ratio > b) {
            best = Some((label, ratio));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(species: &str, bbox: &str) -> LabelRecord {
        LabelRecord {
            label: vec![format!("1 {species}")],
            index: 1,
            species: species.to_string(),
            bbox: bbox.to_string(),
            yolo_bbox: "0.5 0.5 0.2 0.2".to_string(),
            segmentation: String::new(),
            embeddings: String::new(),
        }
    }

    #[test]
    fn class_names_cover_known_ids() {
        assert_eq!(class_name(1), "Complete Diatom");
        assert_eq!(class_name(4), "Diatom SideView");
        assert_eq!(class_name(99), "Unknown");
    }

    #[test]
    fn apply_matches_polygon_inside_bbox() {
        let mut image = DiatomsData {
            image_url: "u".to_string(),
            image_width: "1000".to_string(),
            image_height: "1000".to_string(),
            info: vec![label("Diploneis_bombus", "100,100,400,400")],
            segmentation_indices_array: vec![],
        };

        // Polygon fully inside the bbox (normalized coords).
        apply_to_image(&mut image, "1 0.15 0.15 0.35 0.15 0.35 0.35 0.15 0.35\n");

        let records = &image.segmentation_indices_array;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].species, "Diploneis_bombus");
        assert_eq!(records[0].bbox, "100,100,400,400");
        assert!(records[0].overlap_ratio >= 1.0 - 1e-9);
        assert_eq!(records[0].points_count, 4);
    }

    #[test]
    fn apply_leaves_unmatched_polygon_empty() {
        let mut image = DiatomsData {
            image_url: "u".to_string(),
            image_width: "1000".to_string(),
            image_height: "1000".to_string(),
            info: vec![label("Diploneis_bombus", "800,800,900,900")],
            segmentation_indices_array: vec![],
        };

        apply_to_image(&mut image, "0 0.1 0.1 0.2 0.1 0.2 0.2 0.1 0.2\n");

        let record = &image.segmentation_indices_array[0];
        assert!(record.species.is_empty());
        assert!(record.bbox.is_empty());
        assert_eq!(record.overlap_ratio, 0.0);
    }

    #[test]
    fn best_overlap_wins_among_candidates() {
        let labels = vec![
            label("partial", "0,0,85,150"),
            label("full", "0,0,300,300"),
        ];
        let (matched, ratio) = match_to_labels("50,50,120,120", &labels, 0.5).unwrap();
        assert_eq!(matched.species, "full");
        assert!(ratio >= 1.0 - 1e-9);
    }
}
