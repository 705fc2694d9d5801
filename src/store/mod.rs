//! Almacén de documentos
//!
//! Documentos JSON tipados identificados por `<tipo>-<número>`. Toda escritura
//! pasa por [`DocumentStore::commit`], que aplica una [`Transaction`] completa o
//! nada: es la unidad de trabajo de los repositorios.

pub mod fields;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ids::DRAFTS_PREFIX;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document '{0}' not found")]
    NotFound(String),

    #[error("document '{0}' already exists")]
    AlreadyExists(String),

    #[error("value '{value}' of field '{field}' is already used")]
    UniqueViolation { field: String, value: String },

    #[error("revision mismatch on '{0}'")]
    RevisionMismatch(String),

    #[error("corrupt document '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = std::sync::Arc<dyn DocumentStore>;

/// Documento del almacén. Los metadatos van en campos `_`-prefijados como en
/// el formato de exportación; el resto de campos se aplana en `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_rev")]
    pub revision: String,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            doc_type: doc_type.into(),
            revision: new_revision(),
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Busca un valor por ruta con puntos (`assignedTo._ref`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn is_draft(&self) -> bool {
        is_draft_id(&self.id)
    }

    pub fn published_id(&self) -> &str {
        published_id(&self.id)
    }
}

pub fn is_draft_id(id: &str) -> bool {
    id.starts_with(DRAFTS_PREFIX)
}

pub fn published_id(id: &str) -> &str {
    id.strip_prefix(DRAFTS_PREFIX).unwrap_or(id)
}

pub fn new_revision() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Condición sobre un campo (ruta con puntos)
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
}

impl Filter {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(path, expected) => doc.get(path) == Some(expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// Consulta sobre un tipo de documento
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub doc_type: String,
    pub filters: Vec<Filter>,
    pub include_drafts: bool,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn of_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            filters: Vec::new(),
            include_drafts: false,
            order: SortOrder::OldestFirst,
            limit: None,
        }
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(path.into(), value.into()));
        self
    }

    pub fn with_drafts(mut self) -> Self {
        self.include_drafts = true;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::NewestFirst;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.doc_type == self.doc_type
            && (self.include_drafts || !doc.is_draft())
            && self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filtra, ordena y limita un conjunto de candidatos (backend en memoria).
    /// PostgreSQL traduce la misma consulta a SQL.
    pub fn finalize(&self, candidates: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut docs: Vec<Document> = candidates.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if self.order == SortOrder::NewestFirst {
            docs.reverse();
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

/// Modificación parcial de un documento existente
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub id: String,
    pub set: Map<String, Value>,
    pub unset: Vec<String>,
    pub if_revision: Option<String>,
}

impl Patch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    /// Falla con `RevisionMismatch` si el documento cambió desde esa revisión
    pub fn if_revision(mut self, revision: impl Into<String>) -> Self {
        self.if_revision = Some(revision.into());
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.unset.push(key.into());
        self
    }

    /// Aplica el parche sobre una copia del documento
    pub fn apply(&self, doc: &Document) -> StoreResult<Document> {
        if let Some(expected) = &self.if_revision {
            if expected != &doc.revision {
                return Err(StoreError::RevisionMismatch(doc.id.clone()));
            }
        }
        let mut patched = doc.clone();
        for (key, value) in &self.set {
            patched.fields.insert(key.clone(), value.clone());
        }
        for key in &self.unset {
            patched.fields.remove(key);
        }
        patched.revision = new_revision();
        patched.updated_at = Utc::now();
        Ok(patched)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Falla si el ID ya existe
    Create(Document),
    /// Reemplaza el contenido conservando `_createdAt`
    CreateOrReplace(Document),
    /// Falla si el ID no existe
    Patch(Patch),
    /// Borra el documento publicado y su borrador; no falla si no existen
    Delete { id: String },
    /// Borra exactamente ese ID (p. ej. sólo el borrador)
    DeleteExact { id: String },
}

/// Unicidad de un campo dentro de un tipo, verificada dentro de la transacción
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueConstraint {
    pub doc_type: String,
    pub field: String,
    pub value: Value,
    pub except_id: Option<String>,
}

impl UniqueConstraint {
    pub fn new(doc_type: impl Into<String>, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            doc_type: doc_type.into(),
            field: field.into(),
            value: value.into(),
            except_id: None,
        }
    }

    pub fn except(mut self, id: impl Into<String>) -> Self {
        self.except_id = Some(id.into());
        self
    }

    pub fn is_violated_by(&self, doc: &Document) -> bool {
        doc.doc_type == self.doc_type
            && !doc.is_draft()
            && self.except_id.as_deref() != Some(doc.id.as_str())
            && doc.fields.get(&self.field) == Some(&self.value)
    }

    pub fn violation(&self) -> StoreError {
        let value = match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        StoreError::UniqueViolation {
            field: self.field.clone(),
            value,
        }
    }
}

/// Unidad de trabajo: se aplica entera o no se aplica
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    pub mutations: Vec<Mutation>,
    pub unique: Vec<UniqueConstraint>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, doc: Document) -> Self {
        self.mutations.push(Mutation::Create(doc));
        self
    }

    pub fn create_or_replace(mut self, doc: Document) -> Self {
        self.mutations.push(Mutation::CreateOrReplace(doc));
        self
    }

    pub fn patch(mut self, patch: Patch) -> Self {
        self.mutations.push(Mutation::Patch(patch));
        self
    }

    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.mutations.push(Mutation::Delete { id: id.into() });
        self
    }

    pub fn delete_exact(mut self, id: impl Into<String>) -> Self {
        self.mutations.push(Mutation::DeleteExact { id: id.into() });
        self
    }

    pub fn require_unique(mut self, constraint: UniqueConstraint) -> Self {
        self.unique.push(constraint);
        self
    }
}

/// Backend de almacenamiento
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>>;

    async fn list(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>>;

    /// Aplica la transacción de forma atómica y devuelve los documentos
    /// resultantes de cada mutación que no sea un borrado, en orden.
    async fn commit(&self, transaction: Transaction) -> StoreResult<Vec<Document>>;

    async fn ping(&self) -> StoreResult<()>;

    async fn count(&self, query: &DocumentQuery) -> StoreResult<usize> {
        Ok(self.list(query).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vehicle(id: &str, plate: &str) -> Document {
        let mut fields = Map::new();
        fields.insert("licensePlate".into(), json!(plate));
        fields.insert("assignedTo".into(), json!({ "_type": "reference", "_ref": "user-42" }));
        Document::new(id, "vehicle", fields)
    }

    #[test]
    fn test_document_get_follows_dotted_paths() {
        let doc = vehicle("vehicle-1", "AB-123-CD");
        assert_eq!(doc.get("assignedTo._ref"), Some(&json!("user-42")));
        assert_eq!(doc.get("assignedTo.missing"), None);
        assert_eq!(doc.get("licensePlate"), Some(&json!("AB-123-CD")));
    }

    #[test]
    fn test_document_serializes_with_store_metadata() {
        let doc = vehicle("vehicle-1", "AB-123-CD");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "vehicle-1");
        assert_eq!(value["_type"], "vehicle");
        assert_eq!(value["licensePlate"], "AB-123-CD");
    }

    #[test]
    fn test_query_excludes_drafts_by_default() {
        let query = DocumentQuery::of_type("vehicle");
        assert!(query.matches(&vehicle("vehicle-1", "A")));
        assert!(!query.matches(&vehicle("drafts.vehicle-1", "A")));
        assert!(query.with_drafts().matches(&vehicle("drafts.vehicle-1", "A")));
    }

    #[test]
    fn test_patch_checks_revision() {
        let doc = vehicle("vehicle-1", "AB-123-CD");
        let mut patch = Patch::new("vehicle-1").set("status", "assigned");
        patch.if_revision = Some("stale".to_string());
        assert!(matches!(patch.apply(&doc), Err(StoreError::RevisionMismatch(_))));

        patch.if_revision = Some(doc.revision.clone());
        let patched = patch.apply(&doc).unwrap();
        assert_eq!(patched.fields["status"], "assigned");
        assert_ne!(patched.revision, doc.revision);
    }

    #[test]
    fn test_unique_constraint_ignores_self_and_drafts() {
        let constraint = UniqueConstraint::new("vehicle", "licensePlate", "AB-123-CD").except("vehicle-1");
        assert!(!constraint.is_violated_by(&vehicle("vehicle-1", "AB-123-CD")));
        assert!(!constraint.is_violated_by(&vehicle("drafts.vehicle-2", "AB-123-CD")));
        assert!(constraint.is_violated_by(&vehicle("vehicle-2", "AB-123-CD")));
    }
}
