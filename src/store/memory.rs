//! Backend en memoria
//!
//! Usado en desarrollo (`STORAGE_BACKEND=memory`) y en los tests. Cada
//! transacción se aplica sobre una copia bajo un único lock de escritura y
//! sólo se publica si todas las mutaciones tienen éxito.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    published_id, Document, DocumentQuery, DocumentStore, Mutation, StoreError, StoreResult,
    Transaction,
};
use crate::metrics;
use crate::models::ids::DRAFTS_PREFIX;

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número total de documentos, borradores incluidos
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Inserta documentos sin pasar por transacciones (fixtures, importaciones)
    pub async fn seed(&self, docs: impl IntoIterator<Item = Document>) {
        let mut documents = self.documents.write().await;
        for doc in docs {
            documents.insert(doc.id.clone(), doc);
        }
    }
}

fn apply(documents: &mut BTreeMap<String, Document>, transaction: Transaction) -> StoreResult<Vec<Document>> {
    for constraint in &transaction.unique {
        if documents.values().any(|doc| constraint.is_violated_by(doc)) {
            return Err(constraint.violation());
        }
    }

    let mut results = Vec::new();
    for mutation in transaction.mutations {
        match mutation {
            Mutation::Create(doc) => {
                if documents.contains_key(&doc.id) {
                    return Err(StoreError::AlreadyExists(doc.id));
                }
                documents.insert(doc.id.clone(), doc.clone());
                results.push(doc);
            }
            Mutation::CreateOrReplace(mut doc) => {
                if let Some(existing) = documents.get(&doc.id) {
                    doc.created_at = existing.created_at;
                }
                documents.insert(doc.id.clone(), doc.clone());
                results.push(doc);
            }
            Mutation::Patch(patch) => {
                let current = documents
                    .get(&patch.id)
                    .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;
                let patched = patch.apply(current)?;
                documents.insert(patched.id.clone(), patched.clone());
                results.push(patched);
            }
            Mutation::Delete { id } => {
                let published = published_id(&id).to_string();
                documents.remove(&published);
                documents.remove(&format!("{}{}", DRAFTS_PREFIX, published));
            }
            Mutation::DeleteExact { id } => {
                documents.remove(&id);
            }
        }
    }
    Ok(results)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(query.finalize(documents.values().cloned()))
    }

    async fn commit(&self, transaction: Transaction) -> StoreResult<Vec<Document>> {
        let mut documents = self.documents.write().await;
        let mut staged = documents.clone();
        match apply(&mut staged, transaction) {
            Ok(results) => {
                *documents = staged;
                metrics::record_store_commit(true);
                Ok(results)
            }
            Err(e) => {
                metrics::record_store_commit(false);
                Err(e)
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
