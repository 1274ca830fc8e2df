use crate::client::{BibRecord, MetadataSource, Resolver};
use crate::extract::IdentifierExtractor;
use crate::reader::DocumentReader;
use crate::rename::filename;
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One proposed rename from a directory scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanItem {
    pub original_path: PathBuf,
    pub original_name: String,
    pub proposed_name: String,
    pub source: MetadataSource,
    pub confidence: f64,
    pub metadata: BibRecord,
}

/// Result of scanning one directory
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub directory: PathBuf,
    pub files: Vec<ScanItem>,
}

/// Resolve one document to a metadata record: read it, extract identifiers,
/// and run the waterfall. A corrupt or unreadable file resolves like any
/// other document, just with fewer identifiers to go on.
pub async fn resolve_document(
    reader: &dyn DocumentReader,
    extractor: &IdentifierExtractor,
    resolver: &Resolver,
    path: &Path,
) -> BibRecord {
    let document = reader.read(path);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let info = extractor.extract(&document.metadata, &document.text, &file_name);

    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    resolver.resolve(&info, &stem).await
}

/// Scan a directory for PDF files and propose a new name for each.
///
/// Documents resolve independently, so up to `max_concurrent` of them run
/// their waterfalls at once; the report is always in sorted path order.
pub async fn scan_directory(
    reader: &dyn DocumentReader,
    extractor: &IdentifierExtractor,
    resolver: &Resolver,
    directory: &Path,
    template: &str,
    max_concurrent: usize,
) -> Result<ScanReport> {
    if !directory.is_dir() {
        return Err(Error::InvalidInput {
            field: "directory".to_string(),
            reason: format!("Not a directory: {}", directory.display()),
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    info!("Scanning {} PDFs in {}", paths.len(), directory.display());

    let files: Vec<ScanItem> = stream::iter(paths)
        .map(|path| async move {
            let metadata = resolve_document(reader, extractor, resolver, &path).await;
            let proposed_name = filename::render(&metadata, template);
            ScanItem {
                original_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                original_path: path,
                proposed_name,
                source: metadata.source,
                confidence: metadata.confidence,
                metadata,
            }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    Ok(ScanReport {
        directory: directory.to_path_buf(),
        files,
    })
}
