//! Per-format text extraction.
use std::fs;
use std::path::Path;

use calamine::{Reader, Xlsx, open_workbook};
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::ConvertError;

/// Elements whose text is never part of the readable page.
const SKIPPED_HTML_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn read_bytes(path: &Path) -> Result<Vec<u8>, ConvertError> {
    fs::read(path).map_err(|e| ConvertError::Conversion(format!("failed to read file: {e}")))
}

// ── PDF ──────────────────────────────────────────────────────────────

pub(super) fn pdf_to_text(path: &Path) -> Result<String, ConvertError> {
    let document = lopdf::Document::load(path)
        .map_err(|e| ConvertError::Conversion(format!("failed to parse PDF: {e}")))?;

    if document.is_encrypted() {
        return Err(ConvertError::InvalidContent(
            "PDF is encrypted".to_string(),
        ));
    }

    let pages = document.get_pages();
    debug!("{}: {} pages", path.display(), pages.len());

    let mut out = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
            Err(e) => warn!("{}: skipping page {page_number}: {e}", path.display()),
        }
    }

    Ok(out)
}

// ── DOCX ─────────────────────────────────────────────────────────────

pub(super) fn docx_to_text(path: &Path) -> Result<String, ConvertError> {
    let bytes = read_bytes(path)?;
    let docx = docx_rs::read_docx(&bytes)
        .map_err(|e| ConvertError::Conversion(format!("failed to parse DOCX: {e}")))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => push_paragraph(paragraph, &mut lines),
            DocumentChild::Table(table) => push_table(table, &mut lines),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn push_paragraph(paragraph: &Paragraph, lines: &mut Vec<String>) {
    let mut text = String::new();
    for child in &paragraph.children {
        let ParagraphChild::Run(run) = child else {
            continue;
        };
        for run_child in &run.children {
            match run_child {
                RunChild::Text(t) => text.push_str(&t.text),
                RunChild::Tab(_) => text.push('\t'),
                RunChild::Break(_) => text.push('\n'),
                _ => {}
            }
        }
    }

    let text = text.trim();
    if !text.is_empty() {
        lines.push(text.to_string());
    }
}

/// Tables are flattened row by row, one line per non-empty cell paragraph.
#[allow(irrefutable_let_patterns)]
fn push_table(table: &Table, lines: &mut Vec<String>) {
    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => push_paragraph(paragraph, lines),
                    TableCellContent::Table(nested) => push_table(nested, lines),
                    _ => {}
                }
            }
        }
    }
}

// ── HTML ─────────────────────────────────────────────────────────────

pub(super) fn html_to_text(path: &Path) -> Result<String, ConvertError> {
    let bytes = read_bytes(path)?;
    let source = String::from_utf8(bytes)
        .map_err(|e| ConvertError::InvalidContent(format!("HTML is not valid UTF-8: {e}")))?;

    let document = Html::parse_document(&source);
    let body = Selector::parse("body")
        .map_err(|e| ConvertError::Conversion(format!("invalid selector: {e:?}")))?;
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut pieces = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| {
                p.value()
                    .as_element()
                    .map(|el| SKIPPED_HTML_ELEMENTS.contains(&el.name()))
            })
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            pieces.push(text);
        }
    }

    Ok(pieces.join("\n"))
}

// ── XLSX ─────────────────────────────────────────────────────────────

pub(super) fn xlsx_to_text(path: &Path) -> Result<String, ConvertError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| ConvertError::Conversion(format!("failed to open XLSX: {e}")))?;

    let mut lines = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ConvertError::Conversion(format!("failed to read sheet {name}: {e}")))?;

        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.to_string())
                .filter(|cell| !cell.trim().is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }
    }

    Ok(lines.join("\n"))
}
