use atlas_models::AtlasError;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, instrument, warn};

/// Text content of a paper: everything, plus the first two pages
/// separately (citations live up front).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfText {
    pub full_text: String,
    pub first_two_pages: String,
}

/// One embedded image pulled out of a page.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Zero-based page index the image was found on.
    pub page_index: u32,
    pub data: Vec<u8>,
    /// File extension suggested by the stream filter.
    pub suggested_ext: &'static str,
}

/// Per-page image census, kept alongside the uploaded image URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub page_index: u32,
    pub num_images: usize,
}

fn pdf_err(e: lopdf::Error) -> AtlasError {
    AtlasError::PdfError {
        reason: e.to_string(),
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        _ => Ok(object),
    }
}

/// Extracts the full text and the first-two-pages text of a PDF.
#[instrument(skip(content))]
pub fn extract_text(content: &[u8]) -> Result<PdfText, AtlasError> {
    let doc = Document::load_mem(content).map_err(pdf_err)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Ok(PdfText::default());
    }

    let full_text = doc.extract_text(&page_numbers).map_err(pdf_err)?;
    let head: Vec<u32> = page_numbers.iter().copied().take(2).collect();
    let first_two_pages = doc.extract_text(&head).map_err(pdf_err)?;

    Ok(PdfText {
        full_text,
        first_two_pages,
    })
}

fn filter_extension(stream_dict: &Dictionary) -> &'static str {
    let filter = match stream_dict.get(b"Filter") {
        Ok(object) => object,
        Err(_) => return "bin",
    };
    let name = match filter {
        Object::Name(name) => name.as_slice(),
        Object::Array(filters) => filters
            .last()
            .and_then(|f| f.as_name().ok())
            .unwrap_or(b""),
        _ => b"",
    };
    match name {
        b"DCTDecode" => "jpeg",
        b"JPXDecode" => "jp2",
        _ => "bin",
    }
}

fn is_image_stream(doc: &Document, object: &Object) -> bool {
    let Ok(stream) = object.as_stream() else {
        return false;
    };
    stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|s| resolve(doc, s).ok())
        .and_then(|s| s.as_name().ok())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

/// Walks every page's XObject resources and returns the embedded images
/// with a per-page census. Undecodable entries are skipped with a warning
/// rather than failing the whole paper.
#[instrument(skip(content))]
pub fn extract_images(content: &[u8]) -> Result<(Vec<ExtractedImage>, Vec<PageSummary>), AtlasError> {
    let doc = Document::load_mem(content).map_err(pdf_err)?;
    let mut images = Vec::new();
    let mut pages = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        let page_index = page_no.saturating_sub(1);
        let mut num_images = 0usize;

        let xobjects = doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Resources").ok())
            .and_then(|res| resolve(&doc, res).ok())
            .and_then(|res| res.as_dict().ok())
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xo| resolve(&doc, xo).ok())
            .and_then(|xo| xo.as_dict().ok());

        if let Some(xobjects) = xobjects {
            for (name, entry) in xobjects.iter() {
                let object = match resolve(&doc, entry) {
                    Ok(object) => object,
                    Err(e) => {
                        warn!(
                            page = page_index,
                            xobject = %String::from_utf8_lossy(name),
                            "Skipping unresolvable XObject: {e}"
                        );
                        continue;
                    }
                };
                if !is_image_stream(&doc, object) {
                    continue;
                }
                let Ok(stream) = object.as_stream() else {
                    continue;
                };
                num_images += 1;
                images.push(ExtractedImage {
                    page_index,
                    data: stream.content.clone(),
                    suggested_ext: filter_extension(&stream.dict),
                });
            }
        }

        pages.push(PageSummary {
            page_index,
            num_images,
        });
    }

    debug!(
        total_images = images.len(),
        total_pages = pages.len(),
        "Extracted embedded images"
    );
    Ok((images, pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal single-page PDF with one text object, assembled with lopdf
    // so the extraction path is exercised end to end.
    fn sample_pdf() -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 36.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Diploneis bombus")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let pdf = sample_pdf();
        let text = extract_text(&pdf).unwrap();
        assert!(text.full_text.contains("Diploneis bombus"));
        assert!(text.first_two_pages.contains("Diploneis bombus"));
    }

    #[test]
    fn pageless_image_walk_is_empty_not_error() {
        let pdf = sample_pdf();
        let (images, pages) = extract_images(&pdf).unwrap();
        assert!(images.is_empty());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].num_images, 0);
    }

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        let result = extract_text(b"not a pdf at all");
        assert!(matches!(
            result,
            Err(atlas_models::AtlasError::PdfError { .. })
        ));
    }
}
