//! Compiling session input into index queries.

use tantivy::Term;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use thiserror::Error;

use super::directive::Directive;
use crate::storage::{StorageError, StoreSnapshot};
use crate::types::Language;

/// Edit distance accepted by fuzzy matching.
pub const FUZZY_DISTANCE: u8 = 2;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no searchable term in the query")]
    NoTerms,

    #[error("term mode takes a single term, got {count}")]
    TooManyTerms { count: usize },

    #[error(transparent)]
    Store(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// One exact analyzed token.
    #[default]
    Term,
    /// Contiguous ordered tokens.
    Phrase,
    /// Every token within edit distance two.
    Fuzzy,
}

/// Per-session query state, changed only by directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub language: Language,
    pub mode: MatchMode,
    /// `None` means unbounded.
    pub result_limit: Option<usize>,
    pub highlight_details: bool,
    pub color_enabled: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            mode: MatchMode::Term,
            result_limit: None,
            highlight_details: false,
            color_enabled: false,
        }
    }
}

impl QueryConfig {
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Lang(language) => self.language = language,
            Directive::Mode(mode) => self.mode = mode,
            Directive::Limit(limit) => self.result_limit = limit,
            Directive::Color(on) => self.color_enabled = on,
            Directive::Details(on) => self.highlight_details = on,
        }
    }

    /// Limit to hand to the store.
    pub fn hit_limit(&self) -> usize {
        self.result_limit.unwrap_or(usize::MAX)
    }
}

/// Build a query for `input` against the active language field.
///
/// The input goes through the same analyzer as the indexed text, so `Apples`
/// finds documents containing `apple`.
pub fn compile(
    snapshot: &StoreSnapshot,
    config: &QueryConfig,
    input: &str,
) -> Result<Box<dyn Query>, QueryError> {
    let field = snapshot.schema().text_field(config.language);
    let terms: Vec<Term> = snapshot
        .analyze(config.language, input)?
        .iter()
        .map(|token| Term::from_field_text(field, token))
        .collect();

    if terms.is_empty() {
        return Err(QueryError::NoTerms);
    }

    let query: Box<dyn Query> = match config.mode {
        MatchMode::Term => {
            let count = terms.len();
            let [term] = <[Term; 1]>::try_from(terms).map_err(|_| QueryError::TooManyTerms { count })?;
            Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
        }
        MatchMode::Phrase => {
            if terms.len() == 1 {
                let term = terms.into_iter().next().ok_or(QueryError::NoTerms)?;
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
            } else {
                Box::new(PhraseQuery::new(terms))
            }
        }
        MatchMode::Fuzzy => {
            let mut clauses: Vec<(Occur, Box<dyn Query>)> = terms
                .into_iter()
                .map(|term| {
                    let fuzzy: Box<dyn Query> =
                        Box::new(FuzzyTermQuery::new(term, FUZZY_DISTANCE, true));
                    (Occur::Must, fuzzy)
                })
                .collect();
            if clauses.len() == 1 {
                clauses.remove(0).1
            } else {
                Box::new(BooleanQuery::new(clauses))
            }
        }
    };

    Ok(query)
}

/// Query whose terms mark up snippets for `input`.
///
/// Fuzzy clauses name no terms of their own, so each fuzzy token is replaced
/// by the indexed terms it reaches. Other modes mark what [`compile`] matches.
pub fn compile_highlight(
    snapshot: &StoreSnapshot,
    config: &QueryConfig,
    input: &str,
) -> Result<Box<dyn Query>, QueryError> {
    if config.mode != MatchMode::Fuzzy {
        return compile(snapshot, config, input);
    }

    let field = snapshot.schema().text_field(config.language);
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for token in snapshot.analyze(config.language, input)? {
        let reached = snapshot.expand_fuzzy(&Term::from_field_text(field, &token), FUZZY_DISTANCE)?;
        for term in reached {
            let clause: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
            clauses.push((Occur::Should, clause));
        }
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{IndexStore, StoreMutations};
    use crate::types::DocumentRecord;
    use tempfile::TempDir;

    fn store_with(docs: &[(&str, Language, &str)]) -> (TempDir, IndexStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::open(temp_dir.path()).unwrap();
        let mut writer = store.writer().unwrap();
        for (path, language, content) in docs {
            writer
                .upsert_document(&DocumentRecord::new(*path, *language, *content))
                .unwrap();
        }
        writer.commit().unwrap();
        drop(writer);
        (temp_dir, store)
    }

    fn total(store: &IndexStore, config: &QueryConfig, input: &str) -> usize {
        let snapshot = store.snapshot().unwrap();
        let query = compile(&snapshot, config, input).unwrap();
        snapshot.execute(query.as_ref(), usize::MAX).unwrap().total
    }

    #[test]
    fn test_apply_directives() {
        let mut config = QueryConfig::default();
        config.apply(Directive::Lang(Language::Polish));
        config.apply(Directive::Mode(MatchMode::Fuzzy));
        config.apply(Directive::Limit(Some(3)));
        config.apply(Directive::Details(true));
        config.apply(Directive::Color(true));

        assert_eq!(config.language, Language::Polish);
        assert_eq!(config.mode, MatchMode::Fuzzy);
        assert_eq!(config.hit_limit(), 3);
        assert!(config.highlight_details && config.color_enabled);

        config.apply(Directive::Limit(None));
        assert_eq!(config.hit_limit(), usize::MAX);
    }

    #[test]
    fn test_term_mode_rejects_multiple_tokens() {
        let (_dir, store) = store_with(&[]);
        let snapshot = store.snapshot().unwrap();

        let err = compile(&snapshot, &QueryConfig::default(), "two words").unwrap_err();
        assert!(matches!(err, QueryError::TooManyTerms { count: 2 }));

        let err = compile(&snapshot, &QueryConfig::default(), "  ...  ").unwrap_err();
        assert!(matches!(err, QueryError::NoTerms));
    }

    #[test]
    fn test_term_mode_is_stemmed() {
        let (_dir, store) = store_with(&[("/d/a.txt", Language::English, "I like apples")]);
        assert_eq!(total(&store, &QueryConfig::default(), "Apple"), 1);
        assert_eq!(total(&store, &QueryConfig::default(), "pear"), 0);
    }

    #[test]
    fn test_phrase_requires_order() {
        let (_dir, store) = store_with(&[
            ("/d/a.txt", Language::English, "the quick brown fox jumps"),
            ("/d/b.txt", Language::English, "a brown quick fox sleeps"),
        ]);
        let config = QueryConfig {
            mode: MatchMode::Phrase,
            ..QueryConfig::default()
        };

        assert_eq!(total(&store, &config, "quick brown fox"), 1);
        assert_eq!(total(&store, &config, "fox"), 2);
    }

    #[test]
    fn test_fuzzy_tolerates_typos() {
        let (_dir, store) = store_with(&[("/d/a.txt", Language::English, "banana bread")]);
        let config = QueryConfig {
            mode: MatchMode::Fuzzy,
            ..QueryConfig::default()
        };

        assert_eq!(total(&store, &config, "bananna"), 1);
        assert_eq!(total(&store, &config, "banana bred"), 1);
        assert_eq!(total(&store, &config, "cherry"), 0);
    }

    #[test]
    fn test_fuzzy_highlight_names_reached_terms() {
        let (_dir, store) = store_with(&[("/d/a.txt", Language::English, "banana bread")]);
        let snapshot = store.snapshot().unwrap();
        let config = QueryConfig {
            mode: MatchMode::Fuzzy,
            ..QueryConfig::default()
        };

        let query = compile_highlight(&snapshot, &config, "bananna").unwrap();
        let mut terms = Vec::new();
        query.query_terms(&mut |term, _| terms.extend(term.value().as_str().map(str::to_string)));

        assert_eq!(terms, vec!["banana"]);
    }

    #[test]
    fn test_language_selects_field() {
        let (_dir, store) = store_with(&[("/d/pl.txt", Language::Polish, "Zażółć gęślą jaźń")]);

        assert_eq!(total(&store, &QueryConfig::default(), "jaźń"), 0);

        let polish = QueryConfig {
            language: Language::Polish,
            ..QueryConfig::default()
        };
        assert_eq!(total(&store, &polish, "Jaźń"), 1);
    }
}
