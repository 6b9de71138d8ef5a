use atlas_models::AtlasError;
use bytes::Bytes;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// A PDF downloaded to memory with a temp-file copy for tooling that
/// wants a path. The file is removed when the guard drops.
pub struct FetchedPdf {
    pub bytes: Bytes,
    pub temp_file: NamedTempFile,
}

/// Downloads a PDF, rewriting the browser-facing storage host to the
/// direct-download one, and enforcing the configured size cap.
#[instrument(skip(client))]
pub async fn fetch_pdf(
    client: &reqwest::Client,
    pdf_url: &str,
    max_size_bytes: u64,
) -> Result<FetchedPdf, AtlasError> {
    let url = pdf_url.replace("storage.cloud.google.com", "storage.googleapis.com");

    let response = client.get(&url).send().await?.error_for_status()?;

    if let Some(length) = response.content_length() {
        if length > max_size_bytes {
            return Err(AtlasError::PdfTooLarge {
                size: length,
                max_size: max_size_bytes,
            });
        }
    }

    let bytes = response.bytes().await?;
    if bytes.len() as u64 > max_size_bytes {
        return Err(AtlasError::PdfTooLarge {
            size: bytes.len() as u64,
            max_size: max_size_bytes,
        });
    }
    debug!(url = %url, size = bytes.len(), "Downloaded PDF");

    let mut temp_file = NamedTempFile::new().map_err(|e| AtlasError::PdfError {
        reason: format!("failed to create temp file: {e}"),
    })?;
    temp_file
        .write_all(&bytes)
        .map_err(|e| AtlasError::PdfError {
            reason: format!("failed to write temp file: {e}"),
        })?;

    Ok(FetchedPdf { bytes, temp_file })
}

#[cfg(test)]
mod tests {
    #[test]
    fn host_rewrite() {
        let url = "https://storage.cloud.google.com/b/o.pdf"
            .replace("storage.cloud.google.com", "storage.googleapis.com");
        assert_eq!(url, "https://storage.googleapis.com/b/o.pdf");
    }
}
