//! The pairwise debt matrix: `debt[payer][receiver]`, always non-negative.

use std::collections::{BTreeMap, BTreeSet};

use guild_common::{utils::amount::coerce_amount, Amount, MemberId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use guild_common::identity::KEY_SEPARATOR;

/// One non-zero cell, in the order reported to notices and audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtLine {
    pub payer: MemberId,
    pub receiver: MemberId,
    pub amount: Amount,
}

/// Full snapshot of who owes whom.
///
/// Zero cells are never stored, so iteration only yields real debts and the
/// key order (payer, then receiver) gives a stable reporting order. Both
/// directions of a pair may be populated at once before simplification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtMatrix {
    cells: BTreeMap<(MemberId, MemberId), Amount>,
}

impl DebtMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, payer: &MemberId, receiver: &MemberId) -> Amount {
        self.cells
            .get(&(payer.clone(), receiver.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Overwrites a cell. Non-positive or malformed amounts clear it.
    /// Returns the previous value.
    pub fn set(&mut self, payer: &MemberId, receiver: &MemberId, amount: Amount) -> Amount {
        let key = (payer.clone(), receiver.clone());
        let amount = coerce_amount(amount);
        let old = if amount > 0.0 {
            self.cells.insert(key, amount)
        } else {
            self.cells.remove(&key)
        };
        old.unwrap_or(0.0)
    }

    /// Adds to a cell (negative deltas reduce it, floored at zero).
    pub fn add(&mut self, payer: &MemberId, receiver: &MemberId, delta: Amount) {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }
        let current = self.get(payer, receiver);
        self.set(payer, receiver, current + delta);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, &MemberId, Amount)> {
        self.cells.iter().map(|((p, r), a)| (p, r, *a))
    }

    /// Non-zero cells in key order.
    pub fn lines(&self) -> Vec<DebtLine> {
        self.iter()
            .map(|(payer, receiver, amount)| DebtLine {
                payer: payer.clone(),
                receiver: receiver.clone(),
                amount,
            })
            .collect()
    }

    /// Every member that appears on either side of a debt.
    pub fn members(&self) -> BTreeSet<MemberId> {
        let mut out = BTreeSet::new();
        for (p, r, _) in self.iter() {
            out.insert(p.clone());
            out.insert(r.clone());
        }
        out
    }

    /// What `member` owes to others (self-cells excluded).
    pub fn total_payable(&self, member: &MemberId) -> Amount {
        self.iter()
            .filter(|(p, r, _)| *p == member && *r != member)
            .map(|(_, _, a)| a)
            .sum()
    }

    /// What others owe to `member` (self-cells excluded).
    pub fn total_receivable(&self, member: &MemberId) -> Amount {
        self.iter()
            .filter(|(p, r, _)| *r == member && *p != member)
            .map(|(_, _, a)| a)
            .sum()
    }

    /// Receivable minus payable for each listed member, counting only debts
    /// between listed members.
    pub fn net_positions(&self, members: &[MemberId]) -> BTreeMap<MemberId, Amount> {
        let known: BTreeSet<&MemberId> = members.iter().collect();
        let mut net: BTreeMap<MemberId, Amount> = members.iter().map(|m| (m.clone(), 0.0)).collect();

        for (payer, receiver, amount) in self.iter() {
            if payer == receiver || !known.contains(payer) || !known.contains(receiver) {
                continue;
            }
            if let Some(v) = net.get_mut(payer) {
                *v -= amount;
            }
            if let Some(v) = net.get_mut(receiver) {
                *v += amount;
            }
        }
        net
    }

    pub fn cell_key(payer: &MemberId, receiver: &MemberId) -> String {
        format!("{}{}{}", payer, KEY_SEPARATOR, receiver)
    }

    /// Splits a persisted key at the first separator. Keys without one are ignored.
    pub fn parse_key(key: &str) -> Option<(MemberId, MemberId)> {
        let (payer, receiver) = key.split_once(KEY_SEPARATOR)?;
        if payer.is_empty() || receiver.is_empty() {
            return None;
        }
        Some((MemberId::from(payer), MemberId::from(receiver)))
    }

    /// Flattened `"payer_receiver" -> amount` form stored in the matrix document.
    pub fn to_document(&self) -> BTreeMap<String, Amount> {
        self.iter()
            .map(|(p, r, a)| (Self::cell_key(p, r), a))
            .collect()
    }

    /// Builds a matrix from the stored form, dropping unparseable keys and
    /// coercing bad amounts to zero.
    pub fn from_document(doc: &BTreeMap<String, Amount>) -> Self {
        let mut matrix = Self::new();
        for (key, amount) in doc {
            match Self::parse_key(key) {
                Some((payer, receiver)) => {
                    matrix.set(&payer, &receiver, *amount);
                }
                None => tracing::warn!("⚠️ Ignoring malformed matrix key {:?}", key),
            }
        }
        matrix
    }
}

impl FromIterator<(MemberId, MemberId, Amount)> for DebtMatrix {
    fn from_iter<I: IntoIterator<Item = (MemberId, MemberId, Amount)>>(iter: I) -> Self {
        let mut matrix = DebtMatrix::new();
        for (payer, receiver, amount) in iter {
            matrix.add(&payer, &receiver, amount);
        }
        matrix
    }
}

impl Serialize for DebtMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DebtMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Values may have been typed into a form; accept numbers and numeric strings.
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        let doc: BTreeMap<String, Amount> = raw
            .into_iter()
            .map(|(k, v)| {
                let amount = match v {
                    serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
                    serde_json::Value::String(s) => guild_common::utils::amount::parse_amount(&s),
                    _ => 0.0,
                };
                (k, amount)
            })
            .collect();
        Ok(DebtMatrix::from_document(&doc))
    }
}

/// The persisted settlement document: `{ "matrix": { "A_B": 100, ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixDocument {
    #[serde(default)]
    pub matrix: DebtMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> MemberId {
        MemberId::from(s)
    }

    #[test]
    fn test_set_and_get() {
        let mut m = DebtMatrix::new();
        assert_eq!(m.get(&id("A"), &id("B")), 0.0);

        assert_eq!(m.set(&id("A"), &id("B"), 100.0), 0.0);
        assert_eq!(m.get(&id("A"), &id("B")), 100.0);
        assert_eq!(m.get(&id("B"), &id("A")), 0.0);

        assert_eq!(m.set(&id("A"), &id("B"), -3.0), 100.0);
        assert!(m.is_empty());
    }

    #[test]
    fn test_add_floors_at_zero() {
        let mut m = DebtMatrix::new();
        m.add(&id("A"), &id("B"), 50.0);
        m.add(&id("A"), &id("B"), 25.0);
        assert_eq!(m.get(&id("A"), &id("B")), 75.0);
        m.add(&id("A"), &id("B"), -100.0);
        assert_eq!(m.get(&id("A"), &id("B")), 0.0);
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn test_both_directions_coexist() {
        let mut m = DebtMatrix::new();
        m.set(&id("A"), &id("B"), 100.0);
        m.set(&id("B"), &id("A"), 30.0);
        assert_eq!(m.len(), 2);
        assert_eq!(m.total_payable(&id("A")), 100.0);
        assert_eq!(m.total_receivable(&id("A")), 30.0);
    }

    #[test]
    fn test_net_positions() {
        let mut m = DebtMatrix::new();
        m.set(&id("A"), &id("B"), 100.0);
        m.set(&id("B"), &id("A"), 30.0);
        m.set(&id("C"), &id("A"), 10.0);

        let net = m.net_positions(&[id("A"), id("B"), id("C")]);
        assert_eq!(net[&id("A")], -60.0);
        assert_eq!(net[&id("B")], 70.0);
        assert_eq!(net[&id("C")], -10.0);
        assert_eq!(net.values().sum::<f64>(), 0.0);

        // Debts involving unlisted members are not counted.
        let partial = m.net_positions(&[id("A"), id("B")]);
        assert_eq!(partial[&id("A")], -70.0);
    }

    #[test]
    fn test_document_round_trip_and_key_order() {
        let json = r#"{ "matrix": { "vina_Ricky": 500, "Avalon_Wolf": "1,000", "broken": 9, "A_B": 0 } }"#;
        let doc: MatrixDocument = serde_json::from_str(json).unwrap();
        let lines = doc.matrix.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].payer, id("Avalon"));
        assert_eq!(lines[0].amount, 1_000.0);
        assert_eq!(lines[1].payer, id("vina"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["matrix"]["vina_Ricky"], 500.0);
        assert!(back["matrix"].get("A_B").is_none());
    }

    #[test]
    fn test_parse_key_splits_at_first_separator() {
        assert_eq!(DebtMatrix::parse_key("A_B_C"), Some((id("A"), id("B_C"))));
        assert_eq!(DebtMatrix::parse_key("nounderscore"), None);
        assert_eq!(DebtMatrix::parse_key("_B"), None);
    }
}
