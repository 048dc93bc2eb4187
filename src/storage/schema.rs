//! Tantivy schema shared by directory and document records.
//!
//! Both record kinds live in one index. The `doc_type` field tells them
//! apart; directory records carry their key in `root`, documents in `path`.

use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions,
};

use super::error::{StorageError, StorageResult};
use crate::types::Language;

/// `doc_type` value for registered roots.
pub const DOC_TYPE_DIRECTORY: &str = "directory";
/// `doc_type` value for indexed files.
pub const DOC_TYPE_DOCUMENT: &str = "document";

/// Schema fields for the store.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    /// Record kind discriminator.
    pub doc_type: Field,

    /// Document key: normalized absolute file path.
    pub path: Field,

    /// File name of the document.
    pub name: Field,

    /// Detected language tag of the document.
    pub language: Field,

    /// Content of English (and unclassified) documents.
    pub english_text: Field,

    /// Content of Polish documents.
    pub polish_text: Field,

    /// Directory key: normalized absolute root path.
    pub root: Field,

    /// Registration timestamp (UTC seconds).
    pub registered_at: Field,
}

impl StoreSchema {
    /// Build the schema for a fresh store.
    pub fn build() -> Schema {
        let mut builder = SchemaBuilder::default();

        builder.add_text_field("doc_type", STRING | STORED);

        // Keys are exact-match strings
        builder.add_text_field("path", STRING | STORED);
        builder.add_text_field("name", STRING | STORED);
        builder.add_text_field("language", STRING | STORED);

        // Positions are needed for phrase queries and snippets
        for language in Language::ALL {
            builder.add_text_field(language.field_name(), text_options(language));
        }

        builder.add_text_field("root", STRING | STORED);
        builder.add_u64_field("registered_at", STORED);

        builder.build()
    }

    /// Resolve field handles from an existing schema.
    pub fn from_schema(schema: &Schema) -> StorageResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| StorageError::SchemaMismatch(name.to_string()))
        };

        Ok(Self {
            doc_type: field("doc_type")?,
            path: field("path")?,
            name: field("name")?,
            language: field("language")?,
            english_text: field(Language::English.field_name())?,
            polish_text: field(Language::Polish.field_name())?,
            root: field("root")?,
            registered_at: field("registered_at")?,
        })
    }

    /// Text field holding content in `language`.
    pub fn text_field(&self, language: Language) -> Field {
        match language {
            Language::English => self.english_text,
            Language::Polish => self.polish_text,
        }
    }
}

fn text_options(language: Language) -> TextOptions {
    TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(language.tokenizer_name())
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored()
}
