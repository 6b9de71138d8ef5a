pub mod extract;
pub mod fetch;

pub use extract::*;
pub use fetch::*;

use sha2::{Digest, Sha256};

/// SHA-256 of raw file content, hex encoded. Used as the stable identity
/// of an ingested paper and as the prefix of extracted image filenames.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extracts the filename from a PDF URL, falling back to `unnamed.pdf`
/// when the last path segment is not a .pdf file.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    if name.to_ascii_lowercase().ends_with(".pdf") && name.len() > 4 {
        name.to_string()
    } else {
        "unnamed.pdf".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // sha256("abc")
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn filename_extraction() {
        assert_eq!(
            filename_from_url("https://x/papers/atlas_plate_3.pdf"),
            "atlas_plate_3.pdf"
        );
        assert_eq!(
            filename_from_url("https://x/papers/plate.PDF?alt=media"),
            "plate.PDF"
        );
        assert_eq!(filename_from_url("https://x/papers/page.html"), "unnamed.pdf");
        assert_eq!(filename_from_url("https://x/"), "unnamed.pdf");
    }
}
