//! Tantivy-based search index module.
//!
//! Provides full-text search over inspection records of every family, with
//! field boosting. Hits carry the family and creator so callers can apply
//! their visibility scope before hydrating records.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::db::OwnerScope;
use crate::errors::AppError;
use crate::models::{InspectionRecord, ReportFamily};

/// Field boost values.
const BOOST_REPORT_NO: f32 = 10.0;
const BOOST_CLIENT: f32 = 8.0;
const BOOST_LOCATION: f32 = 5.0;
const BOOST_INSPECTOR: f32 = 4.0;
const BOOST_DETAILS: f32 = 2.5;
const BOOST_FORM_TYPE: f32 = 2.0;

/// Largest page a single search may return.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Deepest result a search may page to.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// Search result with record key and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub family: ReportFamily,
    pub record_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    record_id: Field,
    family: Field,
    created_by: Field,
    report_no: Field,
    client_name: Field,
    location: Field,
    inspector_name: Field,
    form_type: Field,
    details: Field,
}

/// Tantivy search index for records.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let record_id = schema_builder.add_text_field("record_id", STRING | STORED);
        let family = schema_builder.add_text_field("family", STRING | STORED);
        let created_by = schema_builder.add_text_field("created_by", STRING);
        let report_no = schema_builder.add_text_field("report_no", TEXT);
        let client_name = schema_builder.add_text_field("client_name", TEXT);
        let location = schema_builder.add_text_field("location", TEXT);
        let inspector_name = schema_builder.add_text_field("inspector_name", TEXT);
        let form_type = schema_builder.add_text_field("form_type", TEXT);
        let details = schema_builder.add_text_field("details", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            record_id,
            family,
            created_by,
            report_no,
            client_name,
            location,
            inspector_name,
            form_type,
            details,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from records.
    pub async fn rebuild(&self, records: &[InspectionRecord]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for record in records {
            writer.add_document(self.create_document(record))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} records", records.len());
        Ok(())
    }

    /// Index a single record, replacing any previous version.
    pub async fn index_record(&self, record: &InspectionRecord) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.record_id, &record.id));
        writer.add_document(self.create_document(record))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a record from the index.
    pub async fn remove_record(&self, record_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.record_id, record_id));
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for records matching the query, restricted to `scope` and
    /// optionally to one family.
    pub fn search(
        &self,
        query_str: &str,
        scope: &OwnerScope,
        family: Option<ReportFamily>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if offset > MAX_SEARCH_OFFSET {
            return Err(AppError::BadRequest(format!(
                "offset must not exceed {}",
                MAX_SEARCH_OFFSET
            )));
        }
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);

        let searcher = self.reader.searcher();

        let text_fields = [
            (self.fields.report_no, BOOST_REPORT_NO),
            (self.fields.client_name, BOOST_CLIENT),
            (self.fields.location, BOOST_LOCATION),
            (self.fields.inspector_name, BOOST_INSPECTOR),
            (self.fields.details, BOOST_DETAILS),
            (self.fields.form_type, BOOST_FORM_TYPE),
        ];

        // Validate the query once against all fields so syntax errors surface
        let query_parser = QueryParser::for_index(
            &self.index,
            text_fields.iter().map(|(field, _)| *field).collect(),
        );
        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::BadRequest(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in text_fields {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let text_query: Box<dyn Query> = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, text_query)];
        if let Some(creator) = scope.creator() {
            clauses.push((Occur::Must, self.exact(self.fields.created_by, creator)));
        }
        if let Some(family) = family {
            clauses.push((Occur::Must, self.exact(self.fields.family, family.as_str())));
        }
        let combined_query = BooleanQuery::new(clauses);

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let record_id = doc.get_first(self.fields.record_id)?.as_str()?.to_string();
                let family = ReportFamily::parse(doc.get_first(self.fields.family)?.as_str()?)?;
                Some(SearchResult {
                    family,
                    record_id,
                    score,
                })
            })
            .collect();

        Ok(results)
    }

    fn exact(&self, field: Field, value: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(field, value),
            IndexRecordOption::Basic,
        ))
    }

    /// Create a Tantivy document from a record.
    fn create_document(&self, record: &InspectionRecord) -> TantivyDocument {
        let mut detail_text = Vec::new();
        for value in record.details.values() {
            collect_text(value, &mut detail_text);
        }

        doc!(
            self.fields.record_id => record.id.clone(),
            self.fields.family => record.family.as_str().to_string(),
            self.fields.created_by => record.created_by.clone(),
            self.fields.report_no => record.report_no.clone(),
            self.fields.client_name => record.client_name.clone(),
            self.fields.location => record.location.clone().unwrap_or_default(),
            self.fields.inspector_name => record.inspector_name.clone().unwrap_or_default(),
            self.fields.form_type => record.form_type.as_str().to_string(),
            self.fields.details => detail_text.join(" ")
        )
    }
}

/// Gather the string leaves of a details value.
fn collect_text(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        serde_json::Value::Object(map) => map.values().for_each(|item| collect_text(item, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormType, RecordStatus};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_record(id: &str, created_by: &str, client_name: &str) -> InspectionRecord {
        InspectionRecord {
            id: id.to_string(),
            family: ReportFamily::Ultrasonic,
            report_no: format!("UT-2025-000{}", id),
            verification_token: None,
            created_by: created_by.to_string(),
            form_type: FormType::Ultrasonic,
            status: RecordStatus::Draft,
            client_name: client_name.to_string(),
            location: Some("Refinery north unit".to_string()),
            inspection_date: None,
            inspector_name: None,
            result: None,
            service_id: None,
            details: json!({ "componentId": "P-7", "indications": ["lamination near weld toe"] })
                .as_object()
                .cloned()
                .unwrap(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_finds_client_and_details_text() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        index
            .rebuild(&[
                create_test_record("1", "alice", "Acme Refining"),
                create_test_record("2", "bob", "Globex Shipping"),
            ])
            .await
            .unwrap();

        let results = index
            .search("globex", &OwnerScope::Everyone, None, 10, 0)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "2");
        assert_eq!(results[0].family, ReportFamily::Ultrasonic);

        let results = index
            .search("lamination", &OwnerScope::Everyone, None, 10, 0)
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_respects_scope_and_family() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        index
            .rebuild(&[
                create_test_record("1", "alice", "Acme Refining"),
                create_test_record("2", "bob", "Acme Shipping"),
            ])
            .await
            .unwrap();

        let scope = OwnerScope::Creator("alice".to_string());
        let results = index.search("acme", &scope, None, 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "1");

        let results = index
            .search("acme", &OwnerScope::Everyone, Some(ReportFamily::Pwht), 10, 0)
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_remove_record() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .index_record(&create_test_record("1", "alice", "Acme Refining"))
            .await
            .unwrap();
        index.remove_record("1").await.unwrap();

        let results = index
            .search("acme", &OwnerScope::Everyone, None, 10, 0)
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_form_type() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .index_record(&create_test_record("1", "alice", "Acme Refining"))
            .await
            .unwrap();

        let results = index
            .search("ultrasonic", &OwnerScope::Everyone, None, 10, 0)
            .unwrap();
        assert_eq!(results.len(), 1);

        let results = index
            .search("penetrant", &OwnerScope::Everyone, None, 10, 0)
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_offset_past_window() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .index_record(&create_test_record("1", "alice", "Acme Refining"))
            .await
            .unwrap();

        let err = index
            .search("acme", &OwnerScope::Everyone, None, 20, usize::MAX)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let results = index
            .search("acme", &OwnerScope::Everyone, None, 20, MAX_SEARCH_OFFSET)
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", &OwnerScope::Everyone, None, 10, 0).unwrap();
        assert!(results.is_empty());
    }
}
