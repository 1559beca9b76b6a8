//! Transactional façade the application shell talks to.
//!
//! Every mutating call checks the caller first, then runs as one atomic unit
//! against the stores, then records an audit entry and hands back the text
//! the shell should broadcast.

use std::sync::Arc;

use guild_common::{
    audit::{AuditEntry, AuditLog},
    config::LedgerConfig,
    error::Result,
    Amount, Identity, MemberId,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    finance::{FinanceBreakdown, FinanceCalculator},
    history::{member_earnings, HistoryFilter},
    matrix::{DebtLine, DebtMatrix},
    notify,
    policy::EditPolicy,
    sale::{HistoryItem, NewSale, Sale},
    settlement::{record_manual_adjustment, record_settlement, Adjustment},
    simplify::{simplify_debts, Simplification},
    store::{transact, MatrixStore, SaleRepository},
    suggestion::{seller_suggestions, PendingSplit, SellerSuggestion},
};

/// What the shell gets back from a settlement.
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub history: HistoryItem,
    pub breakdown: FinanceBreakdown,
    pub before: Vec<DebtLine>,
    pub after: Vec<DebtLine>,
    pub notice: String,
}

#[derive(Debug, Clone)]
pub struct AdjustmentReceipt {
    pub adjustment: Adjustment,
    /// `None` when the value did not change.
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BalanceReceipt {
    pub simplification: Simplification,
    pub report: String,
}

pub struct LedgerService {
    config: LedgerConfig,
    calculator: FinanceCalculator,
    policy: EditPolicy,
    matrix: Arc<dyn MatrixStore>,
    sales: Arc<dyn SaleRepository>,
    audit: Mutex<AuditLog>,
}

impl LedgerService {
    pub fn new(
        config: LedgerConfig,
        matrix: Arc<dyn MatrixStore>,
        sales: Arc<dyn SaleRepository>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator: FinanceCalculator::new(config.finance.clone()),
            policy: EditPolicy::new(config.super_admin.clone()),
            config,
            matrix,
            sales,
            audit: Mutex::new(AuditLog::new()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn calculator(&self) -> &FinanceCalculator {
        &self.calculator
    }

    pub fn policy(&self) -> &EditPolicy {
        &self.policy
    }

    async fn audit(&self, who: &Identity, action: &str, details: String) {
        self.audit.lock().await.record(AuditEntry::new(who.display_name(), action, details));
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().await.entries.clone()
    }

    // --- Sales ---

    pub async fn create_sale(&self, who: &Identity, new: NewSale, members: &[MemberId]) -> Result<Sale> {
        let me = self.policy.require_member(who, "list items")?;
        let sale = Sale::create(new, members, me.clone())?;
        self.sales.insert_active(sale.clone()).await?;

        info!("🆕 {} listed {} at {}", me, sale.item_name, sale.price);
        self.audit(who, "create_sale", format!("{} @ {}", sale.item_name, sale.price)).await;
        Ok(sale)
    }

    pub async fn reprice_sale(&self, who: &Identity, sale_id: &str, price: Amount) -> Result<Sale> {
        self.policy.require_member(who, "edit items")?;
        let mut sale = self.sales.get_active(sale_id).await?;
        if sale.reprice(price) {
            self.sales.update_active(sale.clone()).await?;
            info!("🏷️ {} relisted at {} (listing #{})", sale.item_name, sale.price, sale.listing_history.len());
        }
        Ok(sale)
    }

    pub async fn update_cost(&self, who: &Identity, sale_id: &str, cost: Amount) -> Result<Sale> {
        self.policy.require_member(who, "edit items")?;
        let mut sale = self.sales.get_active(sale_id).await?;
        sale.set_cost(cost);
        self.sales.update_active(sale.clone()).await?;
        Ok(sale)
    }

    pub async fn remove_listing(&self, who: &Identity, sale_id: &str, index: usize) -> Result<Sale> {
        self.policy.require_member(who, "edit items")?;
        let mut sale = self.sales.get_active(sale_id).await?;
        if sale.remove_listing(index) {
            self.sales.update_active(sale.clone()).await?;
        }
        Ok(sale)
    }

    pub async fn delete_sale(&self, who: &Identity, sale_id: &str) -> Result<Sale> {
        self.policy.require_member(who, "delete items")?;
        let sale = self.sales.remove_active(sale_id).await?;
        info!("🗑️ {} deleted {}", who, sale.item_name);
        self.audit(who, "delete_sale", sale.item_name.clone()).await;
        Ok(sale)
    }

    pub async fn delete_history(&self, who: &Identity, item_id: &str) -> Result<HistoryItem> {
        self.policy.require_member(who, "delete history")?;
        let item = self.sales.remove_history(item_id).await?;
        info!("🗑️ {} deleted history item {}", who, item.sale.item_name);
        self.audit(who, "delete_history", item.sale.item_name.clone()).await;
        Ok(item)
    }

    pub async fn active_sales(&self) -> Result<Vec<Sale>> {
        self.sales.list_active().await
    }

    // --- Ledger ---

    pub async fn matrix(&self) -> Result<DebtMatrix> {
        Ok(self.matrix.load().await?.value)
    }

    /// Posts a sale's split to the matrix and moves it to history.
    ///
    /// The sale is claimed out of the active set before the matrix is touched,
    /// so of two overlapping settlements only one posts. If the matrix write
    /// fails the sale is put back and nothing is recorded.
    pub async fn settle_sale(&self, who: &Identity, sale_id: &str) -> Result<SettlementReceipt> {
        let listed = self.sales.get_active(sale_id).await?;
        self.policy.check_settlement(who, &listed.seller, &listed.participants)?;
        let settled_by = self.policy.require_member(who, "settle sales")?.clone();

        let sale = self.sales.remove_active(sale_id).await?;
        let breakdown = sale.finance(&self.calculator);
        let split = breakdown.per_person_split;
        let mode = self.config.settlement_mode;

        let posted = transact(self.matrix.as_ref(), |current| {
            let next = record_settlement(current, &sale.seller, &sale.participants, split, mode);
            Ok((next, current.lines()))
        })
        .await;
        let (after, before) = match posted {
            Ok(v) => v,
            Err(e) => {
                warn!("❌ Settlement of {} failed: {}", sale.item_name, e);
                if let Err(restore) = self.sales.insert_active(sale).await {
                    warn!("❌ Could not restore sale {}: {}", sale_id, restore);
                }
                return Err(e);
            }
        };

        let notice = notify::settlement_notice(&sale, split);
        let history = sale.settle(settled_by, split);
        self.sales.insert_history(history.clone()).await?;

        info!("💰 {} settled {} | {}/person | mode {:?}", history.settled_by, history.sale.item_name, split, mode);
        self.audit(
            who,
            "settle_sale",
            format!("{} by {}: {}/person", history.sale.item_name, history.sale.seller, split),
        )
        .await;

        Ok(SettlementReceipt {
            history,
            breakdown,
            before,
            after: after.lines(),
            notice,
        })
    }

    /// Overwrites one cell. Only the payer, the receiver or the super admin may.
    pub async fn adjust_cell(
        &self,
        who: &Identity,
        payer: &MemberId,
        receiver: &MemberId,
        new_amount: Amount,
    ) -> Result<AdjustmentReceipt> {
        self.policy.check_cell_edit(who, payer, receiver)?;

        let (_, adjustment) = transact(self.matrix.as_ref(), |current| {
            record_manual_adjustment(current, payer, receiver, new_amount)
        })
        .await?;

        let notice = if adjustment.changed() {
            self.audit(
                who,
                "adjust_cell",
                format!("{} -> {} : {} -> {}", payer, receiver, adjustment.old_amount, adjustment.new_amount),
            )
            .await;
            Some(notify::adjustment_notice(&adjustment))
        } else {
            None
        };

        Ok(AdjustmentReceipt { adjustment, notice })
    }

    /// Replaces the whole matrix with its simplified form.
    ///
    /// A concurrent cell edit landing between the read and the replace is lost
    /// (last writer wins).
    pub async fn auto_balance(&self, who: &Identity, members: &[MemberId]) -> Result<BalanceReceipt> {
        self.policy.require_member(who, "auto-balance")?;

        let current = self.matrix.load().await?;
        let simplification = simplify_debts(&current.value, members, self.config.balance_epsilon);
        self.matrix.replace(simplification.matrix.clone()).await?;

        info!(
            "⚖️ {} auto-balanced: {} debts -> {} transfers",
            who,
            simplification.before.len(),
            simplification.after.len()
        );
        self.audit(who, "auto_balance", "debts simplified".to_string()).await;

        let report = notify::balance_report(who.display_name(), &simplification);
        Ok(BalanceReceipt { simplification, report })
    }

    /// Advisory ranking; reads the matrix and the active sales, writes nothing.
    pub async fn seller_suggestions(&self, members: &[MemberId]) -> Result<Vec<SellerSuggestion>> {
        let matrix = self.matrix.load().await?.value;
        let pending: Vec<PendingSplit> = self
            .sales
            .list_active()
            .await?
            .iter()
            .map(|s| PendingSplit::from_sale(s, &self.calculator))
            .collect();
        Ok(seller_suggestions(&matrix, members, &pending))
    }

    // --- History ---

    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryItem>> {
        let all = self.sales.list_history().await?;
        Ok(all.into_iter().filter(|i| filter.matches(i)).collect())
    }

    /// Earnings of the filter's member over the filtered history; 0 without a member.
    pub async fn member_earnings(&self, filter: &HistoryFilter) -> Result<Amount> {
        let Some(member) = filter.member.as_ref() else {
            return Ok(0.0);
        };
        let items = self.history(filter).await?;
        Ok(member_earnings(&items, member, &self.calculator))
    }
}
