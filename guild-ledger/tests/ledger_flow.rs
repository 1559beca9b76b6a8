use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use guild_common::{
    config::{LedgerConfig, SettlementMode},
    Identity, LedgerError, MemberId, Result,
};
use guild_ledger::{
    finance::ExchangeType,
    history::HistoryFilter,
    matrix::DebtMatrix,
    sale::NewSale,
    store::{InMemoryMatrixStore, InMemorySaleRepository, MatrixStore, Versioned},
    suggestion::Advice,
    LedgerService,
};

fn id(s: &str) -> MemberId {
    MemberId::from(s)
}

fn guild() -> Vec<MemberId> {
    ["Wolf", "vina", "Avalon", "Ricky"].iter().map(|n| id(n)).collect()
}

fn service_with(mode: SettlementMode) -> (LedgerService, Arc<InMemoryMatrixStore>) {
    let config = LedgerConfig { settlement_mode: mode, ..LedgerConfig::default() };
    let matrix = Arc::new(InMemoryMatrixStore::new());
    let sales = Arc::new(InMemorySaleRepository::new());
    let service = LedgerService::new(config, matrix.clone(), sales).expect("valid config");
    (service, matrix)
}

fn service_on(matrix: Arc<dyn MatrixStore>) -> LedgerService {
    let sales = Arc::new(InMemorySaleRepository::new());
    LedgerService::new(LedgerConfig::default(), matrix, sales).expect("valid config")
}

/// Commits like the in-memory store, then stalls so overlapping calls interleave.
#[derive(Default)]
struct SlowStore {
    inner: InMemoryMatrixStore,
}

#[async_trait]
impl MatrixStore for SlowStore {
    async fn load(&self) -> Result<Versioned<DebtMatrix>> {
        self.inner.load().await
    }

    async fn compare_and_swap(&self, expected_version: u64, matrix: DebtMatrix) -> Result<u64> {
        let version = self.inner.compare_and_swap(expected_version, matrix).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(version)
    }

    async fn replace(&self, matrix: DebtMatrix) -> Result<u64> {
        self.inner.replace(matrix).await
    }
}

/// Another writer always lands between `load` and `compare_and_swap`.
#[derive(Default)]
struct ContendedStore {
    inner: InMemoryMatrixStore,
}

#[async_trait]
impl MatrixStore for ContendedStore {
    async fn load(&self) -> Result<Versioned<DebtMatrix>> {
        self.inner.load().await
    }

    async fn compare_and_swap(&self, expected_version: u64, matrix: DebtMatrix) -> Result<u64> {
        let current = self.inner.load().await?;
        self.inner.replace(current.value).await?;
        self.inner.compare_and_swap(expected_version, matrix).await
    }

    async fn replace(&self, matrix: DebtMatrix) -> Result<u64> {
        self.inner.replace(matrix).await
    }
}

fn blade(seller: &str, participants: &[&str]) -> NewSale {
    NewSale {
        item_name: "Ancient Blade".to_string(),
        seller: id(seller),
        price: 100_000.0,
        cost: 0.0,
        exchange_type: ExchangeType::World,
        participants: participants.iter().map(|p| id(p)).collect(),
    }
}

#[tokio::test]
async fn test_settle_posts_split_and_moves_to_history() {
    let (service, _) = service_with(SettlementMode::Netting);
    let vina = Identity::member("vina");

    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();
    let receipt = service.settle_sale(&vina, &sale.id).await.unwrap();

    assert_eq!(receipt.breakdown.per_person_split, 35_000.0);
    assert_eq!(receipt.breakdown.seller_remainder, 8_000.0);
    assert!(receipt.before.is_empty());
    assert_eq!(receipt.after.len(), 1);
    assert!(receipt.notice.contains("35,000"));

    let matrix = service.matrix().await.unwrap();
    assert_eq!(matrix.get(&id("vina"), &id("Ricky")), 35_000.0);

    assert!(service.active_sales().await.unwrap().is_empty());
    let history = service.history(&HistoryFilter::default()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].final_split, 35_000.0);
    assert_eq!(history[0].settled_by, id("vina"));

    let earnings = service.member_earnings(&HistoryFilter::for_member(id("Ricky"))).await.unwrap();
    assert_eq!(earnings, 35_000.0);
}

#[tokio::test]
async fn test_settling_an_already_settled_sale_fails() {
    let (service, _) = service_with(SettlementMode::Accumulate);
    let vina = Identity::member("vina");
    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();

    service.settle_sale(&vina, &sale.id).await.unwrap();
    let again = service.settle_sale(&vina, &sale.id).await;
    assert!(matches!(again, Err(LedgerError::NotFound(_))));
    assert_eq!(service.matrix().await.unwrap().get(&id("vina"), &id("Ricky")), 35_000.0);
}

#[tokio::test]
async fn test_guest_and_outsiders_are_rejected_before_mutation() {
    let (service, store) = service_with(SettlementMode::Netting);
    let vina = Identity::member("vina");
    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();

    assert!(matches!(
        service.create_sale(&Identity::Guest, blade("vina", &[]), &guild()).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(matches!(
        service.settle_sale(&Identity::member("Avalon"), &sale.id).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(matches!(
        service.adjust_cell(&Identity::Guest, &id("vina"), &id("Ricky"), 10.0).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(matches!(
        service.adjust_cell(&Identity::member("Avalon"), &id("vina"), &id("Ricky"), 10.0).await,
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(matches!(
        service.auto_balance(&Identity::Guest, &guild()).await,
        Err(LedgerError::Unauthorized(_))
    ));

    let snap = store.load().await.unwrap();
    assert_eq!(snap.version, 0);
    assert!(snap.value.is_empty());
    assert_eq!(service.active_sales().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_adjust_cell_audits_only_real_changes() {
    let (service, _) = service_with(SettlementMode::Netting);
    let wolf = Identity::member("Wolf");

    let first = service.adjust_cell(&wolf, &id("vina"), &id("Ricky"), 50_000.0).await.unwrap();
    assert_eq!(first.adjustment.old_amount, 0.0);
    assert!(first.notice.unwrap().contains("50,000"));

    let same = service.adjust_cell(&Identity::member("Ricky"), &id("vina"), &id("Ricky"), 50_000.0).await.unwrap();
    assert!(same.notice.is_none());

    let entries = service.audit_entries().await;
    assert_eq!(entries.iter().filter(|e| e.action == "adjust_cell").count(), 1);
    assert_eq!(entries[0].user, "Wolf");
}

#[tokio::test]
async fn test_auto_balance_replaces_matrix() {
    let (service, _) = service_with(SettlementMode::Netting);
    let wolf = Identity::member("Wolf");
    service.adjust_cell(&wolf, &id("vina"), &id("Ricky"), 100.0).await.unwrap();
    service.adjust_cell(&wolf, &id("Ricky"), &id("vina"), 30.0).await.unwrap();

    let receipt = service.auto_balance(&Identity::member("Avalon"), &guild()).await.unwrap();
    assert_eq!(receipt.simplification.before.len(), 2);
    assert_eq!(receipt.simplification.after.len(), 1);
    assert!(receipt.report.contains("vina ➔ Ricky : $70"));

    let matrix = service.matrix().await.unwrap();
    assert_eq!(matrix.len(), 1);
    assert_eq!(matrix.get(&id("vina"), &id("Ricky")), 70.0);
}

#[tokio::test]
async fn test_seller_suggestions_include_pending_sales() {
    let (service, _) = service_with(SettlementMode::Netting);
    let wolf = Identity::member("Wolf");
    service.adjust_cell(&wolf, &id("Avalon"), &id("Wolf"), 200_000.0).await.unwrap();
    service
        .create_sale(&Identity::member("vina"), blade("vina", &["vina", "Ricky"]), &guild())
        .await
        .unwrap();

    let ranked = service.seller_suggestions(&guild()).await.unwrap();
    assert_eq!(ranked[0].member, id("Wolf"));
    assert_eq!(ranked[0].advice, Advice::SellNow);
    assert_eq!(ranked[1].member, id("Ricky"));
    assert_eq!(ranked[1].score, 35_000.0);
    assert_eq!(ranked.last().unwrap().member, id("Avalon"));

    // Read-only.
    assert_eq!(service.matrix().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reprice_feeds_listing_fees_into_settlement() {
    let (service, _) = service_with(SettlementMode::Netting);
    let vina = Identity::member("vina");
    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();

    let relisted = service.reprice_sale(&vina, &sale.id, 150_000.0).await.unwrap();
    assert_eq!(relisted.listing_history, vec![100_000.0, 150_000.0]);

    let receipt = service.settle_sale(&vina, &sale.id).await.unwrap();
    // tax 30_000, fees 2_000 + 3_000, raw 115_000, net 110_000
    assert_eq!(receipt.breakdown.total_listing_fee, 5_000.0);
    assert_eq!(receipt.breakdown.net_income, 110_000.0);
    assert_eq!(receipt.breakdown.per_person_split, 55_000.0);
}

#[tokio::test]
async fn test_delete_sale_and_history() {
    let (service, _) = service_with(SettlementMode::Netting);
    let vina = Identity::member("vina");
    let a = service.create_sale(&vina, blade("vina", &[]), &guild()).await.unwrap();
    let b = service.create_sale(&vina, blade("vina", &[]), &guild()).await.unwrap();
    assert_eq!(a.participants.len(), 4);

    assert!(service.delete_sale(&Identity::Guest, &a.id).await.is_err());
    service.delete_sale(&vina, &a.id).await.unwrap();

    service.settle_sale(&vina, &b.id).await.unwrap();
    service.delete_history(&vina, &b.id).await.unwrap();
    assert!(service.history(&HistoryFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overlapping_settlements_post_once() {
    let service = service_on(Arc::new(SlowStore::default()));
    let vina = Identity::member("vina");
    let ricky = Identity::member("Ricky");
    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();

    let (a, b) = tokio::join!(service.settle_sale(&vina, &sale.id), service.settle_sale(&ricky, &sale.id));
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let failed = if a.is_ok() { b } else { a };
    assert!(matches!(failed, Err(LedgerError::NotFound(_))));

    assert_eq!(service.matrix().await.unwrap().get(&id("vina"), &id("Ricky")), 35_000.0);
    assert_eq!(service.history(&HistoryFilter::default()).await.unwrap().len(), 1);
    let entries = service.audit_entries().await;
    assert_eq!(entries.iter().filter(|e| e.action == "settle_sale").count(), 1);
}

#[tokio::test]
async fn test_rejected_matrix_write_leaves_sale_matrix_and_audit_alone() {
    let service = service_on(Arc::new(ContendedStore::default()));
    let vina = Identity::member("vina");
    let sale = service.create_sale(&vina, blade("vina", &["vina", "Ricky"]), &guild()).await.unwrap();

    let settled = service.settle_sale(&vina, &sale.id).await;
    assert!(matches!(settled, Err(LedgerError::Conflict { .. })));
    let active = service.active_sales().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, sale.id);
    assert!(service.history(&HistoryFilter::default()).await.unwrap().is_empty());

    let adjusted = service.adjust_cell(&Identity::member("Wolf"), &id("vina"), &id("Ricky"), 50_000.0).await;
    assert!(matches!(adjusted, Err(LedgerError::Conflict { .. })));

    assert!(service.matrix().await.unwrap().is_empty());
    let entries = service.audit_entries().await;
    assert!(entries.iter().all(|e| e.action == "create_sale"));
}

#[tokio::test]
async fn test_adjust_cell_rejects_self_debt() {
    let (service, store) = service_with(SettlementMode::Netting);
    let res = service.adjust_cell(&Identity::member("Wolf"), &id("Wolf"), &id("Wolf"), 10.0).await;
    assert!(matches!(res, Err(LedgerError::InvalidInput(_))));
    assert_eq!(store.load().await.unwrap().version, 0);
    assert!(service.audit_entries().await.is_empty());
}
