use std::panic;

use scraper::{Html, Node};

use super::{ContentExtractor, ExtractError, ExtractResult, PlainTextExtractor};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Picks a decoder from the leading bytes: PDF, HTML, then plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SniffingExtractor;

impl ContentExtractor for SniffingExtractor {
    fn extract_plain_text(&self, bytes: &[u8]) -> ExtractResult<String> {
        if bytes.starts_with(PDF_MAGIC) {
            return pdf_text(bytes);
        }

        let text = PlainTextExtractor.extract_plain_text(bytes)?;
        if looks_like_html(&text) {
            Ok(html_text(&text))
        } else {
            Ok(text)
        }
    }
}

fn pdf_text(bytes: &[u8]) -> ExtractResult<String> {
    // The PDF parser panics on some malformed documents
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("malformed document".to_string())),
    }
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text
        .trim_start()
        .chars()
        .take(32)
        .flat_map(char::to_lowercase)
        .collect();
    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|prefix| head.starts_with(prefix))
}

/// Visible text of an HTML document with whitespace runs collapsed.
fn html_text(source: &str) -> String {
    let document = Html::parse_document(source);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
