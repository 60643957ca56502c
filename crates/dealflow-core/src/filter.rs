#![forbid(unsafe_code)]

//! Filter composition for the render layer.
//!
//! Filters never touch the underlying [`StageCollection`]. They decide which
//! deals of each stage reach the render/visibility layer and what total the
//! column header shows. All predicates compose by conjunction.
//!
//! - **Search**: case-insensitive substring on deal name or company name.
//! - **Stage**: a selected stage empties every *other* column. Names are
//!   compared through [`normalize_stage_name`].
//! - **Assignee**: case-insensitive exact match.
//! - **Date range**: inclusive bounds on `created_on`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Deal, Stage, StageCollection, sum_amounts};

/// Normalize a stage name for comparison: trim, lowercase, and collapse runs
/// of whitespace, `_`, and `-` into a single space.
#[must_use]
pub fn normalize_stage_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inclusive date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// The filter inputs produced by the (external) filter controls.
///
/// Equality is the dataset identity used to decide whether visibility caps
/// must be reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardFilter {
    pub search: String,
    pub stage: Option<String>,
    pub assignee: Option<String>,
    pub date_range: Option<DateRange>,
}

impl BoardFilter {
    /// A filter that lets everything through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    #[must_use]
    pub fn stage(mut self, name: impl Into<String>) -> Self {
        self.stage = Some(name.into());
        self
    }

    #[must_use]
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    #[must_use]
    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// True when no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.stage.is_none()
            && self.assignee.is_none()
            && self.date_range.is_none()
    }

    /// Whether the stage filter lets this stage's deals through at all.
    #[must_use]
    pub fn includes_stage(&self, stage: &Stage) -> bool {
        match &self.stage {
            Some(selected) => normalize_stage_name(selected) == normalize_stage_name(&stage.name),
            None => true,
        }
    }

    /// Deal-level predicates (search, assignee, date range).
    #[must_use]
    pub fn matches_deal(&self, deal: &Deal) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty()
            && !deal.name.to_lowercase().contains(&needle)
            && !deal.company_name.to_lowercase().contains(&needle)
        {
            return false;
        }

        if let Some(assignee) = &self.assignee {
            let Some(owner) = &deal.assignee else {
                return false;
            };
            if !owner.eq_ignore_ascii_case(assignee) {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            let Some(date) = deal.created_on else {
                return false;
            };
            if !range.contains(date) {
                return false;
            }
        }

        true
    }

    /// Filtered deal list for one stage, preserving render order.
    #[must_use]
    pub fn filter_stage<'a>(&self, stage: &'a Stage) -> Vec<&'a Deal> {
        if !self.includes_stage(stage) {
            return Vec::new();
        }
        stage
            .deals()
            .iter()
            .filter(|deal| self.matches_deal(deal))
            .collect()
    }

    /// Apply the filter to every stage of a collection.
    #[must_use]
    pub fn apply<'a>(&self, collection: &'a StageCollection) -> Vec<FilteredStage<'a>> {
        collection
            .stages()
            .iter()
            .map(|stage| {
                let deals = self.filter_stage(stage);
                let total = sum_amounts(deals.iter().copied());
                FilteredStage {
                    stage: stage.as_ref(),
                    deals,
                    total,
                }
            })
            .collect()
    }
}

/// One stage after filtering. `total` is computed over the filtered deals.
#[derive(Debug, Clone)]
pub struct FilteredStage<'a> {
    pub stage: &'a Stage,
    pub deals: Vec<&'a Deal>,
    pub total: f64,
}
