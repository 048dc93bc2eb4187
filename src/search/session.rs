//! Interactive query loop.

use std::io::{self, BufRead, Write};

use super::directive::Directive;
use super::query::{QueryConfig, compile, compile_highlight};
use crate::storage::{StorageResult, StoreSnapshot};

const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Exit,
}

/// Reads directives and queries line by line against one snapshot.
///
/// The session ends on end of input or an empty line.
pub struct QuerySession<'s> {
    snapshot: &'s StoreSnapshot,
    config: QueryConfig,
    prompt: String,
    snippet_chars: usize,
}

impl<'s> QuerySession<'s> {
    pub fn new(snapshot: &'s StoreSnapshot) -> Self {
        Self {
            snapshot,
            config: QueryConfig::default(),
            prompt: "> ".to_string(),
            snippet_chars: 150,
        }
    }

    /// Text written before each read. Empty disables the prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if !self.prompt.is_empty() {
                write!(output, "{}", self.prompt)?;
                output.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            if self.handle_line(&line?, output)? == LineOutcome::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Process one raw input line.
    ///
    /// Query failures are reported on `output`; only I/O errors on `output`
    /// itself are returned.
    pub fn handle_line<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<LineOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Exit);
        }

        if Directive::is_directive(line) {
            match Directive::parse(line) {
                Some(directive) => self.config.apply(directive),
                None => crate::debug_event!("search", "ignored directive", "{line}"),
            }
            return Ok(LineOutcome::Continue);
        }

        let query = match compile(self.snapshot, &self.config, line) {
            Ok(query) => query,
            Err(e) => {
                writeln!(output, "Cannot parse the query: {e}")?;
                return Ok(LineOutcome::Continue);
            }
        };

        let marker = if self.config.highlight_details {
            match compile_highlight(self.snapshot, &self.config, line) {
                Ok(marker) => Some(marker),
                Err(e) => {
                    writeln!(output, "Cannot parse the query: {e}")?;
                    return Ok(LineOutcome::Continue);
                }
            }
        } else {
            None
        };

        if let Err(e) = self.render(query.as_ref(), marker.as_deref(), output) {
            writeln!(output, "Cannot search the query: {e}")?;
        }
        Ok(LineOutcome::Continue)
    }

    fn render<W: Write>(
        &self,
        query: &dyn tantivy::query::Query,
        marker: Option<&dyn tantivy::query::Query>,
        output: &mut W,
    ) -> StorageResult<()> {
        let results = self.snapshot.execute(query, self.config.hit_limit())?;
        writeln!(output, "File count: {}", results.total)?;

        let (start, end) = if self.config.color_enabled {
            (RED, RESET)
        } else {
            (BOLD, RESET)
        };

        for hit in results.hits {
            let hit = hit?;
            if self.config.color_enabled {
                writeln!(output, "{BOLD}{}{RESET}", hit.path.display())?;
            } else {
                writeln!(output, "{}", hit.path.display())?;
            }

            if let Some(marker) = marker {
                let snippet =
                    self.snapshot
                        .highlight(marker, &hit, self.snippet_chars, start, end)?;
                writeln!(output, "{snippet}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{IndexStore, StoreMutations};
    use crate::types::{DocumentRecord, Language};
    use tempfile::TempDir;

    fn run_session(store: &IndexStore, script: &str) -> String {
        let snapshot = store.snapshot().unwrap();
        let mut session = QuerySession::new(&snapshot).prompt("");
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn fruit_store() -> (TempDir, IndexStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::open(temp_dir.path()).unwrap();
        let mut writer = store.writer().unwrap();
        writer
            .upsert_document(&DocumentRecord::new(
                "/docs/a.txt",
                Language::English,
                "an apple a day",
            ))
            .unwrap();
        writer
            .upsert_document(&DocumentRecord::new(
                "/docs/b.txt",
                Language::English,
                "apple pie and apple juice",
            ))
            .unwrap();
        writer.commit().unwrap();
        drop(writer);
        (temp_dir, store)
    }

    #[test]
    fn test_term_query_output() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "apple\n");

        assert!(out.starts_with("File count: 2\n"));
        assert!(out.contains("/docs/a.txt\n"));
        assert!(out.contains("/docs/b.txt\n"));
        assert!(!out.contains(BOLD));
    }

    #[test]
    fn test_limit_caps_listed_hits_not_count() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "%limit 1\napple\n");

        assert!(out.starts_with("File count: 2\n"));
        assert_eq!(out.matches("/docs/").count(), 1);
    }

    #[test]
    fn test_details_use_bold_markers_without_color() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "%details on\n%limit 1\napple\n");

        assert!(out.contains(&format!("{BOLD}apple{RESET}")));
    }

    #[test]
    fn test_color_switches_markers_to_red() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "%details on\n%color on\napple\n");

        assert!(out.contains(&format!("{RED}apple{RESET}")));
        assert!(out.contains(&format!("{BOLD}/docs/")));
    }

    #[test]
    fn test_fuzzy_details_mark_the_matched_word() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::open(temp_dir.path()).unwrap();
        let mut writer = store.writer().unwrap();
        writer
            .upsert_document(&DocumentRecord::new(
                "/docs/bread.txt",
                Language::English,
                "fresh banana bread",
            ))
            .unwrap();
        writer.commit().unwrap();
        drop(writer);

        let out = run_session(&store, "%fuzzy\n%details on\nbananna\n");

        assert!(out.starts_with("File count: 1\n"));
        assert!(out.contains(&format!("{BOLD}banana{RESET}")));
        assert!(!out.contains(&format!("{BOLD}fresh")));
    }

    #[test]
    fn test_empty_line_ends_session() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "\napple\n");
        assert!(out.is_empty());
    }

    #[test]
    fn test_parse_error_keeps_session_alive() {
        let (_dir, store) = fruit_store();
        let out = run_session(&store, "two words\napple\n");

        assert!(out.starts_with("Cannot parse the query"));
        assert!(out.contains("File count: 2"));
    }

    #[test]
    fn test_malformed_directive_is_ignored() {
        let (_dir, store) = fruit_store();
        let snapshot = store.snapshot().unwrap();
        let mut session = QuerySession::new(&snapshot);
        let mut out = Vec::new();

        let outcome = session.handle_line("%limit abc", &mut out).unwrap();
        assert_eq!(outcome, LineOutcome::Continue);
        assert_eq!(session.config(), &QueryConfig::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_prompt_written_before_each_read() {
        let (_dir, store) = fruit_store();
        let snapshot = store.snapshot().unwrap();
        let mut session = QuerySession::new(&snapshot);
        let mut out = Vec::new();
        session.run("%term\n".as_bytes(), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "> > ");
    }
}
