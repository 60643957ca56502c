#![forbid(unsafe_code)]

//! Pipeline data model: deals, stages, and immutable stage-collection snapshots.
//!
//! A [`StageCollection`] is never mutated in place. Every reducer operation
//! builds a new collection that shares each untouched [`Stage`] with its
//! predecessor through an `Arc`, so a render layer can skip columns whose
//! stage pointer did not change ([`Arc::ptr_eq`]).
//!
//! # Invariants
//!
//! 1. A stage's `aggregate_value` is the sum of its deals' amounts. The only
//!    constructors ([`Stage::new`], [`Stage::with_deals`], deserialization)
//!    recompute it.
//! 2. Deal order inside a stage is render order.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable, unique deal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(String);

impl DealId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DealId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DealId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable stage identifier. Visibility caps are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Deal
// ---------------------------------------------------------------------------

/// The draggable unit. Belongs to exactly one stage at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<NaiveDate>,
}

impl Deal {
    /// Create a deal with no company, assignee, or date.
    #[must_use]
    pub fn new(id: impl Into<DealId>, name: impl Into<String>, amount: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount,
            company_name: String::new(),
            assignee: None,
            created_on: None,
        }
    }

    /// Set the company name.
    #[must_use]
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company_name = company.into();
        self
    }

    /// Set the assignee.
    #[must_use]
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Set the creation date.
    #[must_use]
    pub fn created_on(mut self, date: NaiveDate) -> Self {
        self.created_on = Some(date);
        self
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A named, ordered column of deals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StageRecord", rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    deals: Arc<[Deal]>,
    aggregate_value: f64,
}

/// Wire shape accepted on input; the aggregate is always recomputed.
#[derive(Deserialize)]
struct StageRecord {
    id: StageId,
    name: String,
    #[serde(default)]
    deals: Vec<Deal>,
}

impl From<StageRecord> for Stage {
    fn from(record: StageRecord) -> Self {
        Self::new(record.id, record.name, record.deals)
    }
}

impl Stage {
    /// Build a stage and compute its aggregate value.
    #[must_use]
    pub fn new(id: impl Into<StageId>, name: impl Into<String>, deals: Vec<Deal>) -> Self {
        let aggregate_value = sum_amounts(&deals);
        Self {
            id: id.into(),
            name: name.into(),
            deals: deals.into(),
            aggregate_value,
        }
    }

    /// Same id and name, new deal list, recomputed aggregate.
    #[must_use]
    pub fn with_deals(&self, deals: Vec<Deal>) -> Self {
        Self::new(self.id.clone(), self.name.clone(), deals)
    }

    /// Deals in render order.
    #[must_use]
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Sum of all deal amounts in this stage (unfiltered).
    #[must_use]
    pub fn aggregate_value(&self) -> f64 {
        self.aggregate_value
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Index of the deal with `id`, if it lives in this stage.
    #[must_use]
    pub fn position(&self, id: &DealId) -> Option<usize> {
        self.deals.iter().position(|deal| &deal.id == id)
    }
}

/// Sum of deal amounts.
#[must_use]
pub fn sum_amounts<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> f64 {
    deals.into_iter().map(|deal| deal.amount).sum()
}

// ---------------------------------------------------------------------------
// StageCollection
// ---------------------------------------------------------------------------

/// Immutable snapshot of the whole board, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageCollection {
    stages: Vec<Arc<Stage>>,
}

impl StageCollection {
    /// Build a collection from owned stages.
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages: stages.into_iter().map(Arc::new).collect(),
        }
    }

    /// Stages in column order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<Stage>] {
        &self.stages
    }

    #[must_use]
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index).map(Arc::as_ref)
    }

    /// Index of the stage with the given id.
    #[must_use]
    pub fn stage_index(&self, id: &StageId) -> Option<usize> {
        self.stages.iter().position(|stage| &stage.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total number of deals across every stage.
    #[must_use]
    pub fn deal_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.len()).sum()
    }

    /// Every deal id, stage by stage, in render order.
    #[must_use]
    pub fn deal_ids(&self) -> Vec<DealId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.deals().iter().map(|deal| deal.id.clone()))
            .collect()
    }

    /// Look up a deal anywhere on the board.
    #[must_use]
    pub fn deal(&self, id: &DealId) -> Option<&Deal> {
        self.stages
            .iter()
            .find_map(|stage| stage.deals().iter().find(|deal| &deal.id == id))
    }

    /// Copy-on-write replacement: returns a new collection in which only the
    /// listed stage indices point at fresh stages. Out-of-range indices are
    /// ignored.
    #[must_use]
    pub fn replace_stages(&self, updates: impl IntoIterator<Item = (usize, Stage)>) -> Self {
        let mut stages = self.stages.clone();
        for (index, stage) in updates {
            if let Some(slot) = stages.get_mut(index) {
                *slot = Arc::new(stage);
            }
        }
        Self { stages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StageCollection {
        StageCollection::new(vec![
            Stage::new(
                "s1",
                "Prospect",
                vec![Deal::new("D1", "Alpha", 100.0), Deal::new("D2", "Beta", 200.0)],
            ),
            Stage::new("s2", "Qualified", vec![Deal::new("D3", "Gamma", 50.0)]),
        ])
    }

    #[test]
    fn stage_aggregate_is_sum_of_amounts() {
        let board = sample();
        assert_eq!(board.stage(0).unwrap().aggregate_value(), 300.0);
        assert_eq!(board.stage(1).unwrap().aggregate_value(), 50.0);
    }

    #[test]
    fn with_deals_recomputes_aggregate() {
        let board = sample();
        let stage = board.stage(0).unwrap().with_deals(vec![Deal::new("D9", "Z", 7.5)]);
        assert_eq!(stage.aggregate_value(), 7.5);
        assert_eq!(stage.name, "Prospect");
    }

    #[test]
    fn replace_stages_keeps_untouched_pointers() {
        let board = sample();
        let fresh = board.stage(0).unwrap().with_deals(Vec::new());
        let next = board.replace_stages([(0, fresh)]);
        assert!(!Arc::ptr_eq(&board.stages()[0], &next.stages()[0]));
        assert!(Arc::ptr_eq(&board.stages()[1], &next.stages()[1]));
    }

    #[test]
    fn deal_ids_follow_render_order() {
        let ids: Vec<String> = sample()
            .deal_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, ["D1", "D2", "D3"]);
    }

    #[test]
    fn deserialized_stage_ignores_incoming_aggregate() {
        let json = r#"[{"id":"s1","name":"Prospect","aggregateValue":999,
            "deals":[{"id":"D1","name":"Alpha","amount":10,"companyName":"Acme"}]}]"#;
        let board: StageCollection = serde_json::from_str(json).unwrap();
        let stage = board.stage(0).unwrap();
        assert_eq!(stage.aggregate_value(), 10.0);
        assert_eq!(stage.deals()[0].company_name, "Acme");
    }

    #[test]
    fn serialization_uses_camel_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"aggregateValue\":300.0"));
        assert!(json.contains("\"companyName\""));
    }
}
