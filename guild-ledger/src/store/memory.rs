use std::collections::HashMap;

use async_trait::async_trait;
use guild_common::error::{LedgerError, Result};
use tokio::sync::RwLock;

use super::{MatrixStore, SaleRepository, Versioned};
use crate::{
    matrix::DebtMatrix,
    sale::{HistoryItem, Sale},
};

/// Matrix document held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMatrixStore {
    inner: RwLock<Versioned<DebtMatrix>>,
}

impl InMemoryMatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(matrix: DebtMatrix) -> Self {
        Self {
            inner: RwLock::new(Versioned { version: 0, value: matrix }),
        }
    }
}

#[async_trait]
impl MatrixStore for InMemoryMatrixStore {
    async fn load(&self) -> Result<Versioned<DebtMatrix>> {
        Ok(self.inner.read().await.clone())
    }

    async fn compare_and_swap(&self, expected_version: u64, matrix: DebtMatrix) -> Result<u64> {
        let mut doc = self.inner.write().await;
        if doc.version != expected_version {
            tracing::warn!("⚠️ Matrix write rejected: expected v{}, found v{}", expected_version, doc.version);
            return Err(LedgerError::Conflict { expected: expected_version, found: doc.version });
        }
        doc.version += 1;
        doc.value = matrix;
        Ok(doc.version)
    }

    async fn replace(&self, matrix: DebtMatrix) -> Result<u64> {
        let mut doc = self.inner.write().await;
        doc.version += 1;
        doc.value = matrix;
        Ok(doc.version)
    }
}

/// Active and history collections held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySaleRepository {
    active: RwLock<HashMap<String, Sale>>,
    history: RwLock<HashMap<String, HistoryItem>>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn insert_active(&self, sale: Sale) -> Result<()> {
        let mut active = self.active.write().await;
        if active.contains_key(&sale.id) {
            return Err(LedgerError::Persistence(format!("sale {} already exists", sale.id)));
        }
        active.insert(sale.id.clone(), sale);
        Ok(())
    }

    async fn get_active(&self, id: &str) -> Result<Sale> {
        self.active
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("sale {}", id)))
    }

    async fn update_active(&self, sale: Sale) -> Result<()> {
        let mut active = self.active.write().await;
        match active.get_mut(&sale.id) {
            Some(slot) => {
                *slot = sale;
                Ok(())
            }
            None => Err(LedgerError::NotFound(format!("sale {}", sale.id))),
        }
    }

    async fn remove_active(&self, id: &str) -> Result<Sale> {
        self.active
            .write()
            .await
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound(format!("sale {}", id)))
    }

    async fn list_active(&self) -> Result<Vec<Sale>> {
        let mut list: Vec<Sale> = self.active.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn insert_history(&self, item: HistoryItem) -> Result<()> {
        self.history.write().await.insert(item.id().to_string(), item);
        Ok(())
    }

    async fn remove_history(&self, id: &str) -> Result<HistoryItem> {
        self.history
            .write()
            .await
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound(format!("history item {}", id)))
    }

    async fn list_history(&self) -> Result<Vec<HistoryItem>> {
        let mut list: Vec<HistoryItem> = self.history.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.settled_at.cmp(&a.settled_at));
        Ok(list)
    }
}
