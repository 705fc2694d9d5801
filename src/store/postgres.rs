//! Backend PostgreSQL
//!
//! Una tabla `documents` con el cuerpo en JSONB. Las transacciones del almacén
//! se ejecutan dentro de una transacción SQL; la unicidad se verifica bajo un
//! advisory lock por restricción.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use super::{
    published_id, Document, DocumentQuery, DocumentStore, Filter, Mutation, SortOrder, StoreError,
    StoreResult, Transaction,
};
use crate::metrics;
use crate::models::ids::DRAFTS_PREFIX;

const SELECT_COLUMNS: &str = "id, doc_type, revision, body, created_at, updated_at";

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    doc_type: String,
    revision: String,
    body: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            doc_type: row.doc_type,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
            fields: row.body.0,
        }
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crea la tabla e índices si no existen
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                doc_type TEXT NOT NULL,
                revision TEXT NOT NULL,
                body JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_type ON documents (doc_type, created_at)")
            .execute(&self.pool)
            .await?;

        info!("✅ Esquema de documentos verificado");
        Ok(())
    }

    async fn check_unique(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        transaction: &Transaction,
    ) -> StoreResult<()> {
        for constraint in &transaction.unique {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(format!("{}:{}", constraint.doc_type, constraint.field))
                .execute(&mut **tx)
                .await?;

            let clash: Option<(String,)> = sqlx::query_as(
                r#"
                SELECT id FROM documents
                WHERE doc_type = $1
                  AND body -> $2 = $3
                  AND id NOT LIKE 'drafts.%'
                  AND ($4::text IS NULL OR id <> $4)
                LIMIT 1
                "#,
            )
            .bind(&constraint.doc_type)
            .bind(&constraint.field)
            .bind(Json(&constraint.value))
            .bind(constraint.except_id.as_deref())
            .fetch_optional(&mut **tx)
            .await?;

            if let Some((id,)) = clash {
                debug!("🔒 Restricción de unicidad violada por {}", id);
                return Err(constraint.violation());
            }
        }
        Ok(())
    }

    async fn apply(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        mutation: Mutation,
    ) -> StoreResult<Option<Document>> {
        match mutation {
            Mutation::Create(doc) => {
                let row: Option<DocumentRow> = sqlx::query_as(&format!(
                    r#"
                    INSERT INTO documents (id, doc_type, revision, body, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO NOTHING
                    RETURNING {}
                    "#,
                    SELECT_COLUMNS
                ))
                .bind(&doc.id)
                .bind(&doc.doc_type)
                .bind(&doc.revision)
                .bind(Json(&doc.fields))
                .bind(doc.created_at)
                .bind(doc.updated_at)
                .fetch_optional(&mut **tx)
                .await?;

                row.map(|r| Some(r.into()))
                    .ok_or(StoreError::AlreadyExists(doc.id))
            }
            Mutation::CreateOrReplace(doc) => {
                let row: DocumentRow = sqlx::query_as(&format!(
                    r#"
                    INSERT INTO documents (id, doc_type, revision, body, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO UPDATE SET
                        doc_type = EXCLUDED.doc_type,
                        revision = EXCLUDED.revision,
                        body = EXCLUDED.body,
                        updated_at = EXCLUDED.updated_at
                    RETURNING {}
                    "#,
                    SELECT_COLUMNS
                ))
                .bind(&doc.id)
                .bind(&doc.doc_type)
                .bind(&doc.revision)
                .bind(Json(&doc.fields))
                .bind(doc.created_at)
                .bind(doc.updated_at)
                .fetch_one(&mut **tx)
                .await?;
                Ok(Some(row.into()))
            }
            Mutation::Patch(patch) => {
                let current: DocumentRow = sqlx::query_as(&format!(
                    "SELECT {} FROM documents WHERE id = $1 FOR UPDATE",
                    SELECT_COLUMNS
                ))
                .bind(&patch.id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;

                let patched = patch.apply(&current.into())?;
                sqlx::query(
                    "UPDATE documents SET revision = $2, body = $3, updated_at = $4 WHERE id = $1",
                )
                .bind(&patched.id)
                .bind(&patched.revision)
                .bind(Json(&patched.fields))
                .bind(patched.updated_at)
                .execute(&mut **tx)
                .await?;
                Ok(Some(patched))
            }
            Mutation::Delete { id } => {
                let published = published_id(&id).to_string();
                sqlx::query("DELETE FROM documents WHERE id = $1 OR id = $2")
                    .bind(&published)
                    .bind(format!("{}{}", DRAFTS_PREFIX, published))
                    .execute(&mut **tx)
                    .await?;
                Ok(None)
            }
            Mutation::DeleteExact { id } => {
                sqlx::query("DELETE FROM documents WHERE id = $1")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
                Ok(None)
            }
        }
    }

    async fn commit_inner(&self, transaction: Transaction) -> StoreResult<Vec<Document>> {
        let mut tx = self.pool.begin().await?;
        Self::check_unique(&mut tx, &transaction).await?;

        let mut results = Vec::new();
        for mutation in transaction.mutations {
            if let Some(doc) = Self::apply(&mut tx, mutation).await? {
                results.push(doc);
            }
        }

        tx.commit().await?;
        Ok(results)
    }
}

/// `WHERE` de una consulta: tipo, borradores y filtros por ruta JSON
fn push_conditions(builder: &mut QueryBuilder<'static, Postgres>, query: &DocumentQuery) {
    builder.push(" WHERE doc_type = ").push_bind(query.doc_type.clone());
    if !query.include_drafts {
        builder.push(" AND id NOT LIKE 'drafts.%'");
    }
    for filter in &query.filters {
        match filter {
            Filter::Eq(path, value) => {
                let segments: Vec<String> = path.split('.').map(str::to_string).collect();
                builder
                    .push(" AND body #> ")
                    .push_bind(segments)
                    .push("::text[] = ")
                    .push_bind(Json(value.clone()))
                    .push("::jsonb");
            }
        }
    }
}

fn select_builder(query: &DocumentQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM documents", SELECT_COLUMNS));
    push_conditions(&mut builder, query);
    builder.push(match query.order {
        SortOrder::OldestFirst => " ORDER BY created_at ASC, id ASC",
        SortOrder::NewestFirst => " ORDER BY created_at DESC, id DESC",
    });
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    builder
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<DocumentRow> =
            sqlx::query_as(&format!("SELECT {} FROM documents WHERE id = $1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let mut builder = select_builder(query);
        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn count(&self, query: &DocumentQuery) -> StoreResult<usize> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_conditions(&mut builder, query);
        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        let count = usize::try_from(count).unwrap_or_default();
        Ok(query.limit.map_or(count, |limit| count.min(limit)))
    }

    async fn commit(&self, transaction: Transaction) -> StoreResult<Vec<Document>> {
        let outcome = self.commit_inner(transaction).await;
        metrics::record_store_commit(outcome.is_ok());
        outcome
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_converts_into_document() {
        let mut body = Map::new();
        body.insert("model".to_string(), json!("Clio"));
        let now = Utc::now();
        let row = DocumentRow {
            id: "vehicle-7".to_string(),
            doc_type: "vehicle".to_string(),
            revision: "abc".to_string(),
            body: Json(body),
            created_at: now,
            updated_at: now,
        };

        let doc: Document = row.into();
        assert_eq!(doc.id, "vehicle-7");
        assert_eq!(doc.fields["model"], "Clio");
        assert_eq!(doc.created_at, now);
    }

    #[test]
    fn test_filters_and_limit_are_pushed_to_sql() {
        let query = DocumentQuery::of_type("vehicle")
            .eq("status", "assigned")
            .eq("assignedTo._ref", "user-42")
            .newest_first()
            .limit(1);
        let builder = select_builder(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE doc_type = $1"));
        assert!(sql.contains("id NOT LIKE 'drafts.%'"));
        assert!(sql.contains("body #> $2::text[] = $3::jsonb"));
        assert!(sql.contains("body #> $4::text[] = $5::jsonb"));
        assert!(sql.contains("ORDER BY created_at DESC, id DESC LIMIT $6"));
    }

    #[test]
    fn test_drafts_are_not_excluded_on_request() {
        let builder = select_builder(&DocumentQuery::of_type("vehicle").with_drafts());
        assert!(!builder.sql().contains("drafts."));
        assert!(!builder.sql().contains("LIMIT"));
    }
}
