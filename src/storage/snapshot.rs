use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::{Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, Score, Searcher, TantivyDocument as Document, Term};

use super::error::{StorageError, StorageResult};
use super::schema::{DOC_TYPE_DIRECTORY, DOC_TYPE_DOCUMENT, StoreSchema};
use crate::types::{DirectoryRecord, DocumentRecord, Language};

/// Point-in-time read view of the store.
pub struct StoreSnapshot {
    index: Index,
    searcher: Searcher,
    schema: StoreSchema,
}

impl StoreSnapshot {
    pub(super) fn new(index: Index, searcher: Searcher, schema: StoreSchema) -> Self {
        Self {
            index,
            searcher,
            schema,
        }
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// All registered roots, sorted by path.
    pub fn directories(&self) -> StorageResult<Vec<DirectoryRecord>> {
        let mut records = Vec::new();
        for address in self.kind_addresses(DOC_TYPE_DIRECTORY)? {
            let doc: Document = self.searcher.doc(address)?;
            let root = text_value(&doc, self.schema.root, "root")?;
            let registered_at = doc
                .get_first(self.schema.registered_at)
                .and_then(|v| v.as_u64())
                .unwrap_or_default();
            records.push(DirectoryRecord::new(root, registered_at));
        }
        records.sort_by(|a, b| a.root_path.cmp(&b.root_path));
        Ok(records)
    }

    /// Whether `root` is a registered root key.
    pub fn contains_directory(&self, root: &Path) -> StorageResult<bool> {
        let term = Term::from_field_text(self.schema.root, root.to_string_lossy().as_ref());
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        Ok(self.searcher.search(&query, &Count)? > 0)
    }

    /// Keys of all indexed documents, sorted.
    pub fn document_paths(&self) -> StorageResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for address in self.kind_addresses(DOC_TYPE_DOCUMENT)? {
            let doc: Document = self.searcher.doc(address)?;
            paths.push(PathBuf::from(text_value(&doc, self.schema.path, "path")?));
        }
        paths.sort();
        Ok(paths)
    }

    /// Stored record for the document keyed by `path`.
    pub fn document(&self, path: &Path) -> StorageResult<Option<DocumentRecord>> {
        let term = Term::from_field_text(self.schema.path, path.to_string_lossy().as_ref());
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let top = self.searcher.search(&query, &TopDocs::with_limit(1))?;

        let Some((_, address)) = top.into_iter().next() else {
            return Ok(None);
        };
        let doc: Document = self.searcher.doc(address)?;
        Ok(Some(self.to_record(&doc)?))
    }

    pub fn document_count(&self) -> StorageResult<usize> {
        let term = Term::from_field_text(self.schema.doc_type, DOC_TYPE_DOCUMENT);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        Ok(self.searcher.search(&query, &Count)?)
    }

    /// Run `query`, returning the total match count and up to `limit` hits
    /// in descending score order. Pass `usize::MAX` for every hit.
    pub fn execute(&self, query: &dyn Query, limit: usize) -> StorageResult<SearchResults<'_>> {
        let total = self.searcher.search(query, &Count)?;

        // TopDocs rejects a zero limit and preallocates for the limit
        let limit = limit.min(total);
        let top = if limit == 0 {
            Vec::new()
        } else {
            self.searcher.search(query, &TopDocs::with_limit(limit))?
        };

        Ok(SearchResults {
            total,
            hits: Hits {
                snapshot: self,
                inner: top.into_iter(),
            },
        })
    }

    /// Best-scoring fragment of `hit`'s content with matched terms wrapped
    /// in `start`/`end`.
    ///
    /// Falls back to the leading `max_chars` characters when no term of
    /// `query` occurs in the stored text.
    pub fn highlight(
        &self,
        query: &dyn Query,
        hit: &Hit,
        max_chars: usize,
        start: &str,
        end: &str,
    ) -> StorageResult<String> {
        let field = self.schema.text_field(hit.language);
        let mut generator = SnippetGenerator::create(&self.searcher, query, field)?;
        generator.set_max_num_chars(max_chars);

        let snippet = generator.snippet_from_doc(&hit.doc);
        if snippet.fragment().is_empty() {
            let content = hit
                .doc
                .get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            return Ok(content.chars().take(max_chars).collect());
        }

        Ok(mark_fragment(
            snippet.fragment(),
            snippet.highlighted(),
            start,
            end,
        ))
    }

    /// Indexed terms within `distance` edits of `term`, across all segments.
    pub fn expand_fuzzy(&self, term: &Term, distance: u8) -> StorageResult<Vec<Term>> {
        super::fuzzy::expand(&self.searcher, term, distance)
    }

    /// Terms `text` produces under the analyzer of `language`'s field.
    pub fn analyze(&self, language: Language, text: &str) -> StorageResult<Vec<String>> {
        let field = self.schema.text_field(language);
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);

        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        Ok(terms)
    }

    fn kind_addresses(&self, kind: &str) -> StorageResult<HashSet<DocAddress>> {
        let term = Term::from_field_text(self.schema.doc_type, kind);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        Ok(self.searcher.search(&query, &DocSetCollector)?)
    }

    fn to_record(&self, doc: &Document) -> StorageResult<DocumentRecord> {
        let path = text_value(doc, self.schema.path, "path")?;
        let language = Language::classify(text_value(doc, self.schema.language, "language")?);
        let content = doc
            .get_first(self.schema.text_field(language))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Ok(DocumentRecord::new(path, language, content))
    }
}

/// Outcome of [`StoreSnapshot::execute`].
pub struct SearchResults<'s> {
    /// Number of matching documents, regardless of the limit.
    pub total: usize,
    pub hits: Hits<'s>,
}

/// Lazily loads stored documents for the top hits.
pub struct Hits<'s> {
    snapshot: &'s StoreSnapshot,
    inner: std::vec::IntoIter<(Score, DocAddress)>,
}

impl Iterator for Hits<'_> {
    type Item = StorageResult<Hit>;

    fn next(&mut self) -> Option<Self::Item> {
        let (score, address) = self.inner.next()?;
        Some(self.load(score, address))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Hits<'_> {
    fn load(&self, score: Score, address: DocAddress) -> StorageResult<Hit> {
        let schema = &self.snapshot.schema;
        let doc: Document = self.snapshot.searcher.doc(address)?;
        let path = PathBuf::from(text_value(&doc, schema.path, "path")?);
        let language = Language::classify(text_value(&doc, schema.language, "language")?);

        Ok(Hit {
            path,
            language,
            score,
            doc,
        })
    }
}

/// One ranked document.
#[derive(Debug)]
pub struct Hit {
    pub path: PathBuf,
    pub language: Language,
    pub score: Score,
    doc: Document,
}

fn text_value<'d>(doc: &'d Document, field: Field, name: &str) -> StorageResult<&'d str> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| StorageError::InvalidFieldValue {
            field: name.to_string(),
            reason: "missing stored text".to_string(),
        })
}

fn mark_fragment(fragment: &str, ranges: &[Range<usize>], start: &str, end: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + ranges.len() * (start.len() + end.len()));
    let mut offset = 0;

    for range in ranges {
        if range.start < offset || range.end > fragment.len() {
            continue;
        }
        out.push_str(&fragment[offset..range.start]);
        out.push_str(start);
        out.push_str(&fragment[range.clone()]);
        out.push_str(end);
        offset = range.end;
    }
    out.push_str(&fragment[offset..]);
    out
}
