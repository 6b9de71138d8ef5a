//! End-to-end ingest test: a locally served PDF goes through download,
//! archiving, text extraction, assistant extraction and catalog upsert,
//! all against in-memory fakes.

use std::sync::Arc;

use atlas_assistant::{Assistant, CitationMethod};
use atlas_catalog::{Catalog, Ingestor, UploadTracker};
use atlas_models::Config;
use atlas_store::PapersStore;
use atlas_testsupport::{seed_papers, storage_config, CannedTransport, InMemoryStore};

// Single-page PDF with one line of text, enough for the text extraction
// and hashing stages.
fn sample_pdf() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

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
            Operation::new("Tj", vec![Object::string_literal("Plate 3: Diploneis bombus")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

// Serves the sample PDF on a loopback port and returns its URL.
async fn serve_pdf(pdf: Vec<u8>) -> String {
    use axum::routing::get;

    let app = axum::Router::new().route(
        "/plate3.pdf",
        get(move || {
            let pdf = pdf.clone();
            async move { ([("content-type", "application/pdf")], pdf) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/plate3.pdf")
}

fn stage1_reply() -> String {
    serde_json::json!({
        "figure_caption": "Plate 3",
        "diatom_species_array": [
            {
                "species_index": 39,
                "species_name": "Amphora obtusa var oceanica",
                "formatted_species_name": "Amphora_obtusa_var_oceanica",
                "genus": "Amphora"
            },
            {
                "species_index": 65,
                "species_name": "Diploneis bombus",
                "formatted_species_name": "Diploneis_bombus",
                "genus": "Diploneis"
            }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn ingest_builds_a_labelled_catalog_entry() {
    let store = Arc::new(InMemoryStore::new());
    let storage = storage_config();
    seed_papers(&store, &storage, &[]).await;

    let config = Config {
        storage: storage.clone(),
        ..Config::default()
    };
    let papers_store = Arc::new(PapersStore::new(store.clone(), storage.clone()));
    let catalog = Arc::new(Catalog::new(papers_store.clone()));
    catalog.load().await.unwrap();

    let assistant = Arc::new(Assistant::new(Box::new(CannedTransport::single(
        &stage1_reply(),
    ))));
    let tracker = Arc::new(
        UploadTracker::new(sqlx::SqlitePool::connect(":memory:").await.unwrap())
            .await
            .unwrap(),
    );
    let ingestor = Ingestor::new(
        reqwest::Client::new(),
        papers_store.clone(),
        catalog.clone(),
        assistant,
        tracker.clone(),
        config.limits.clone(),
        CitationMethod::Default,
    );

    let pdf = sample_pdf();
    let url = serve_pdf(pdf).await;

    let report = ingestor.ingest(&url).await.unwrap();
    assert_eq!(report.original_filename, "plate3.pdf");
    assert_eq!(report.species_found, 2);
    assert_eq!(report.file_256_hash.len(), 64);
    assert!(!report.replaced);

    // The paper landed in the catalog with one label per species.
    let papers = catalog.snapshot().await;
    assert_eq!(papers.len(), 1);
    let paper = &papers[0];
    assert!(paper.processed);
    assert!(paper.pdf_text_content.contains("Diploneis bombus"));
    assert_eq!(paper.diatoms_data.info.len(), 2);
    assert_eq!(
        paper.diatoms_data.info[0].label[0],
        "39 Amphora_obtusa_var_oceanica"
    );
    assert_eq!(paper.citation.as_ref().unwrap().year, "2012");

    // The archived PDF is listed for the session.
    let uploaded = papers_store.list_uploaded_pdfs().await.unwrap();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].name, "plate3.pdf");

    // The tracker recorded and completed the upload.
    let rows = tracker.recent(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].processed);
    assert_eq!(rows[0].sha256, report.file_256_hash);

    // Re-ingesting the same URL replaces the entry instead of duplicating.
    let assistant = Arc::new(Assistant::new(Box::new(CannedTransport::single(
        &stage1_reply(),
    ))));
    let ingestor = Ingestor::new(
        reqwest::Client::new(),
        papers_store,
        catalog.clone(),
        assistant,
        tracker,
        config.limits,
        CitationMethod::Default,
    );
    let report = ingestor.ingest(&url).await.unwrap();
    assert!(report.replaced);
    assert_eq!(catalog.snapshot().await.len(), 1);
}

#[tokio::test]
async fn oversized_pdf_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let storage = storage_config();
    seed_papers(&store, &storage, &[]).await;

    let papers_store = Arc::new(PapersStore::new(store, storage));
    let catalog = Arc::new(Catalog::new(papers_store.clone()));
    catalog.load().await.unwrap();

    let assistant = Arc::new(Assistant::new(Box::new(CannedTransport::new(vec![]))));
    let tracker = Arc::new(
        UploadTracker::new(sqlx::SqlitePool::connect(":memory:").await.unwrap())
            .await
            .unwrap(),
    );
    let ingestor = Ingestor::new(
        reqwest::Client::new(),
        papers_store,
        catalog,
        assistant,
        tracker,
        atlas_models::LimitsConfig { max_pdf_size_mb: 0 },
        CitationMethod::Default,
    );

    let url = serve_pdf(sample_pdf()).await;
    let result = ingestor.ingest(&url).await;
    assert!(matches!(
        result,
        Err(atlas_models::AtlasError::PdfTooLarge { .. })
    ));
}
