pub mod client;
pub mod prompts;

pub use client::*;
pub use prompts::*;

/// Labels are stored with underscores ("14 Lyrella_spectabilis") but the
/// prompts read better with spaces.
pub fn reformat_labels_to_spaces(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| l.replace('_', " ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_reformatted_with_spaces() {
        let labels = vec![
            "14 Lyrella_spectabilis".to_string(),
            "15 Navicula_hennedyi_fo_granulata".to_string(),
        ];
        assert_eq!(
            reformat_labels_to_spaces(&labels),
            vec![
                "14 Lyrella spectabilis".to_string(),
                "15 Navicula hennedyi fo granulata".to_string(),
            ]
        );
    }
}
