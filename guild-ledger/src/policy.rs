//! Who may change what.

use guild_common::{
    error::{LedgerError, Result},
    Identity, MemberId,
};

/// Edit rights over the ledger.
///
/// Guests never mutate. A matrix cell may be edited by its payer, its
/// receiver, or the super admin.
#[derive(Debug, Clone)]
pub struct EditPolicy {
    super_admin: MemberId,
}

impl EditPolicy {
    pub fn new(super_admin: MemberId) -> Self {
        Self { super_admin }
    }

    pub fn super_admin(&self) -> &MemberId {
        &self.super_admin
    }

    pub fn is_super_admin(&self, who: &Identity) -> bool {
        who.member_id() == Some(&self.super_admin)
    }

    /// Any signed-in member.
    pub fn require_member<'a>(&self, who: &'a Identity, action: &str) -> Result<&'a MemberId> {
        who.member_id().ok_or_else(|| {
            tracing::warn!("🚫 Guest attempted {}", action);
            LedgerError::Unauthorized(format!("guests cannot {}", action))
        })
    }

    pub fn can_edit_cell(&self, who: &Identity, payer: &MemberId, receiver: &MemberId) -> bool {
        match who.member_id() {
            None => false,
            Some(me) => me == payer || me == receiver || *me == self.super_admin,
        }
    }

    pub fn check_cell_edit(&self, who: &Identity, payer: &MemberId, receiver: &MemberId) -> Result<()> {
        if self.can_edit_cell(who, payer, receiver) {
            Ok(())
        } else {
            tracing::warn!("🚫 {} may not edit {} -> {}", who, payer, receiver);
            Err(LedgerError::Unauthorized(format!(
                "{} may not edit the debt of {} to {}",
                who, payer, receiver
            )))
        }
    }

    /// Settling posts debt from the seller to every participant, so the caller
    /// must be one of those parties or the super admin.
    pub fn check_settlement(&self, who: &Identity, seller: &MemberId, participants: &[MemberId]) -> Result<()> {
        let me = self.require_member(who, "settle sales")?;
        if me == seller || *me == self.super_admin || participants.contains(me) {
            Ok(())
        } else {
            tracing::warn!("🚫 {} is not part of the sale by {}", me, seller);
            Err(LedgerError::Unauthorized(format!(
                "{} is neither the seller nor a participant",
                me
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> EditPolicy {
        EditPolicy::new(MemberId::from("Wolf"))
    }

    #[test]
    fn test_cell_edit_rights() {
        let p = policy();
        let a = MemberId::from("A");
        let b = MemberId::from("B");

        assert!(p.can_edit_cell(&Identity::member("A"), &a, &b));
        assert!(p.can_edit_cell(&Identity::member("B"), &a, &b));
        assert!(p.can_edit_cell(&Identity::member("Wolf"), &a, &b));
        assert!(!p.can_edit_cell(&Identity::member("C"), &a, &b));
        assert!(!p.can_edit_cell(&Identity::Guest, &a, &b));

        assert!(matches!(
            p.check_cell_edit(&Identity::member("C"), &a, &b),
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_guest_never_mutates() {
        let p = policy();
        assert!(p.require_member(&Identity::Guest, "auto-balance").is_err());
        assert!(p
            .check_settlement(&Identity::Guest, &MemberId::from("A"), &[MemberId::from("A")])
            .is_err());
    }

    #[test]
    fn test_settlement_rights() {
        let p = policy();
        let seller = MemberId::from("A");
        let parts = vec![MemberId::from("A"), MemberId::from("B")];

        assert!(p.check_settlement(&Identity::member("A"), &seller, &parts).is_ok());
        assert!(p.check_settlement(&Identity::member("B"), &seller, &parts).is_ok());
        assert!(p.check_settlement(&Identity::member("Wolf"), &seller, &parts).is_ok());
        assert!(p.check_settlement(&Identity::member("Z"), &seller, &parts).is_err());
    }
}
