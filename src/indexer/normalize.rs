//! Source discovery and document-to-text normalization.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::console::{Output, status};
use crate::converter::{ConvertError, DocumentFormat, DocumentParser};
use crate::error::RagError;

/// An eligible file found in the documents directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Plain text extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub name: String,
    pub text: String,
}

/// Resolve `path` to an absolute, existing directory.
pub fn resolve_docs_dir(path: &Path) -> Result<PathBuf, RagError> {
    if path.as_os_str().is_empty() {
        return Err(RagError::MissingDocs);
    }

    let invalid = |source: io::Error| RagError::InvalidDocsPath {
        path: path.to_path_buf(),
        source,
    };

    let resolved = fs::canonicalize(path).map_err(invalid)?;
    if !resolved.is_dir() {
        return Err(invalid(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    Ok(resolved)
}

/// List the eligible files directly inside `dir`, in directory listing order.
///
/// Subdirectories are not descended into. Finding nothing is an error.
pub fn discover_sources(dir: &Path) -> Result<Vec<SourceFile>, RagError> {
    let mut sources = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        match DocumentFormat::from_path(&path) {
            Some(format) => sources.push(SourceFile { path, format }),
            None => debug!("Skipping unsupported file: {}", path.display()),
        }
    }

    if sources.is_empty() {
        return Err(RagError::NoDocumentsFound);
    }
    Ok(sources)
}

/// Convert every source, skipping (and reporting) the ones that fail.
///
/// Returns the converted documents in source order; an empty result is an
/// error since there is nothing to retrieve from.
pub fn normalize_documents(
    sources: &[SourceFile],
    parser: &dyn DocumentParser,
    output: &dyn Output,
    token: &CancellationToken,
) -> Result<Vec<NormalizedDocument>, RagError> {
    let _working = status(output, "Preparing documents into compatible format...");
    let total = sources.len();
    let mut documents = Vec::with_capacity(total);

    for source in sources {
        if token.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        let name = source.file_name();
        match parser.convert(&source.path, source.format) {
            Ok(text) => {
                // Counts prepared documents only; skipped files leave gaps.
                output.print(&format!(
                    "[{}/{total}] Document {name} prepared.",
                    documents.len() + 1
                ));
                documents.push(NormalizedDocument { name, text });
            }
            Err(ConvertError::Conversion(cause)) => output.error(&format!(
                "cannot convert document, skipping: {} : {cause}",
                source.path.display()
            )),
            Err(ConvertError::InvalidContent(cause)) => output.error(&format!(
                "invalid document contents, skipping: {} : {cause}",
                source.path.display()
            )),
        }
    }

    info!("Converted {}/{total} documents", documents.len());

    if documents.is_empty() {
        return Err(RagError::NoDocumentsConverted);
    }
    Ok(documents)
}

/// Resolve, discover and convert in one go.
pub fn normalize_directory(
    dir: &Path,
    parser: &dyn DocumentParser,
    output: &dyn Output,
    token: &CancellationToken,
) -> Result<Vec<NormalizedDocument>, RagError> {
    let sources = {
        let _working = status(output, "Retrieving documents...");
        discover_sources(dir)?
    };
    output.print(&format!(
        "{} documents retrieved for processing.",
        sources.len()
    ));

    normalize_documents(&sources, parser, output, token)
}
