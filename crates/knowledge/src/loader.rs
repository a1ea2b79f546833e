//! Document discovery and text extraction.
//!
//! Plain text and markdown are read directly. PDFs go through the
//! `pdftotext` binary from poppler; its form-feed page breaks become pages.

use crate::types::Document;
use ragdoc_core::{AppError, AppResult};
use std::fs;
use std::path::{Component, Path};
use std::process::Command;
use walkdir::WalkDir;

const PAGE_BREAK: char = '\u{c}';

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentKind {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Load every supported document under `root`, in file-name order.
///
/// Source ids are `<root name>/<path below root>` with `/` separators, so
/// the same corpus gets the same ids however `root` is spelled.
/// Unsupported files are skipped. A document that fails to extract aborts
/// the load so a partial corpus is never indexed silently.
pub fn load_dir(root: &Path) -> AppResult<Vec<Document>> {
    if !root.is_dir() {
        return Err(AppError::Input(format!(
            "Documents directory not found: {:?}",
            root
        )));
    }

    let root = fs::canonicalize(root)?;
    let prefix = root
        .file_name()
        .map(|name| name.to_string_lossy().to_string());

    let mut documents = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|e| AppError::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        match DocumentKind::from_path(path) {
            Some(kind) => {
                let source_id = source_id(prefix.as_deref(), &root, path)?;
                documents.push(load_document(path, source_id, kind)?);
            }
            None => tracing::debug!("Skipping unsupported file: {:?}", path),
        }
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), root);
    Ok(documents)
}

fn source_id(prefix: Option<&str>, root: &Path, path: &Path) -> AppResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| AppError::Input(format!("{:?} is outside {:?}", path, root)))?;

    let mut parts: Vec<String> = prefix.map(str::to_string).into_iter().collect();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().to_string());
        }
    }
    Ok(parts.join("/"))
}

fn load_document(path: &Path, source_id: String, kind: DocumentKind) -> AppResult<Document> {
    let pages = match kind {
        DocumentKind::Pdf => extract_pdf_pages(path)?,
        DocumentKind::Markdown => vec![clean_markdown(&read_text(path)?)],
        DocumentKind::PlainText => vec![read_text(path)?],
    };

    tracing::debug!("Loaded {} ({} pages)", source_id, pages.len());
    Ok(Document::new(source_id, pages))
}

fn read_text(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {:?}: {}", path, e),
        ))
    })
}

fn extract_pdf_pages(path: &Path) -> AppResult<Vec<String>> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| {
            AppError::Input(format!(
                "Failed to run pdftotext for {:?}: {} (is poppler installed?)",
                path, e
            ))
        })?;

    if !output.status.success() {
        return Err(AppError::Input(format!(
            "pdftotext failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// Split extracted text on form feeds. The break after the last page does
/// not start a new page.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Drop markdown markup that carries no content.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        result.push_str(trimmed);
        result.push('\n');
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_kind_detection() {
        assert_eq!(DocumentKind::from_path(Path::new("a/KUHP.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("b.md")), Some(DocumentKind::Markdown));
        assert_eq!(DocumentKind::from_path(Path::new("c.txt")), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_path(Path::new("d.docx")), None);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages("satu\u{c}dua\u{c}"), vec!["satu", "dua"]);
        assert_eq!(split_pages("satu"), vec!["satu"]);
        assert_eq!(split_pages("satu\u{c}\u{c}tiga"), vec!["satu", "", "tiga"]);
        assert_eq!(split_pages(""), vec![""]);
    }

    #[test]
    fn test_clean_markdown() {
        let cleaned = clean_markdown("# Judul\n\nIsi paragraf.\n\n---\n```\nkode\n```\n");
        assert_eq!(cleaned, "Judul\n\nIsi paragraf.\n\nkode");
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "Kedua").unwrap();
        fs::write(dir.path().join("a.md"), "# Pertama").unwrap();
        fs::write(dir.path().join("sub/c.txt"), "Ketiga").unwrap();
        fs::write(dir.path().join("ignored.bin"), [0u8, 1, 2]).unwrap();

        let docs = load_dir(dir.path()).unwrap();
        let root = dir.path().file_name().unwrap().to_string_lossy().to_string();
        let ids: Vec<_> = docs.iter().map(|d| d.source_id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                format!("{}/a.md", root),
                format!("{}/b.txt", root),
                format!("{}/sub/c.txt", root),
            ]
        );
        assert_eq!(docs[0].pages, vec!["Pertama".to_string()]);
    }

    #[test]
    fn test_source_ids_ignore_root_spelling() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data/bab1")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("data/bab1/kuhp.txt"), "Pasal 1").unwrap();

        let direct = load_dir(&dir.path().join("data")).unwrap();
        let detour = load_dir(&dir.path().join("other/../data/.")).unwrap();

        assert_eq!(direct[0].source_id, "data/bab1/kuhp.txt");
        assert_eq!(direct[0].source_id, detour[0].source_id);
    }

    #[test]
    fn test_missing_dir_is_input_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_dir(&dir.path().join("nope")),
            Err(AppError::Input(_))
        ));
    }
}
