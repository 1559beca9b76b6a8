//! Persistence ports.
//!
//! The engine works on full in-memory snapshots; these traits are the seam to
//! whatever document store the shell uses. Connection handling, live
//! subscriptions and retries belong to the adapter or the shell.

use async_trait::async_trait;
use guild_common::error::Result;

use crate::{
    matrix::DebtMatrix,
    sale::{HistoryItem, Sale},
};

pub mod memory;

pub use memory::{InMemoryMatrixStore, InMemorySaleRepository};

/// A snapshot tagged with the document version it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

#[async_trait]
pub trait MatrixStore: Send + Sync {
    async fn load(&self) -> Result<Versioned<DebtMatrix>>;

    /// Writes `matrix` only if the document is still at `expected_version`.
    /// Returns the new version. On mismatch nothing is written.
    async fn compare_and_swap(&self, expected_version: u64, matrix: DebtMatrix) -> Result<u64>;

    /// Unconditional full replace. Last writer wins.
    async fn replace(&self, matrix: DebtMatrix) -> Result<u64>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn insert_active(&self, sale: Sale) -> Result<()>;
    async fn get_active(&self, id: &str) -> Result<Sale>;
    async fn update_active(&self, sale: Sale) -> Result<()>;
    async fn remove_active(&self, id: &str) -> Result<Sale>;
    /// Newest first by creation time.
    async fn list_active(&self) -> Result<Vec<Sale>>;

    async fn insert_history(&self, item: HistoryItem) -> Result<()>;
    async fn remove_history(&self, id: &str) -> Result<HistoryItem>;
    /// Newest first by settlement time.
    async fn list_history(&self) -> Result<Vec<HistoryItem>>;
}

/// One read-modify-write cycle against the matrix document.
///
/// `mutate` sees the full current snapshot and returns the replacement plus
/// any value the caller wants back. If the write is rejected the stored
/// matrix is left as it was and the error is returned.
pub async fn transact<S, F, T>(store: &S, mutate: F) -> Result<(DebtMatrix, T)>
where
    S: MatrixStore + ?Sized,
    F: FnOnce(&DebtMatrix) -> Result<(DebtMatrix, T)>,
{
    let current = store.load().await?;
    let (next, out) = mutate(&current.value)?;
    let version = store.compare_and_swap(current.version, next.clone()).await?;
    tracing::debug!("💾 Matrix committed at version {} ({} cells)", version, next.len());
    Ok((next, out))
}
