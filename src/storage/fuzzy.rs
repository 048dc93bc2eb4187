//! Expanding a fuzzy term into the indexed terms it reaches.

use std::collections::BTreeSet;

use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder, SINK_STATE};
use tantivy::{Searcher, Term};
use tantivy_fst::Automaton;

use super::error::{StorageError, StorageResult};

/// Levenshtein DFA driven over a term dictionary.
struct LevenshteinDfa(DFA);

impl Automaton for LevenshteinDfa {
    type State = u32;

    fn start(&self) -> u32 {
        self.0.initial_state()
    }

    fn is_match(&self, state: &u32) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &u32) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.0.transition(*state, byte)
    }
}

/// Distinct indexed terms of `term`'s field within `distance` edits of it,
/// transpositions counting as one edit. Sorted.
pub(super) fn expand(searcher: &Searcher, term: &Term, distance: u8) -> StorageResult<Vec<Term>> {
    let field = term.field();
    let value = term.value();
    let text = value.as_str().ok_or_else(|| StorageError::InvalidFieldValue {
        field: format!("{field:?}"),
        reason: "fuzzy expansion needs a text term".to_string(),
    })?;

    let builder = LevenshteinAutomatonBuilder::new(distance, true);
    let mut found = BTreeSet::new();
    for segment in searcher.segment_readers() {
        let inverted = segment.inverted_index(field)?;
        let mut stream = inverted
            .terms()
            .search(LevenshteinDfa(builder.build_dfa(text)))
            .into_stream()?;
        while stream.advance() {
            if let Ok(key) = std::str::from_utf8(stream.key()) {
                found.insert(key.to_string());
            }
        }
    }

    Ok(found
        .iter()
        .map(|key| Term::from_field_text(field, key))
        .collect())
}
