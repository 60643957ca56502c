#![forbid(unsafe_code)]

//! Per-stage lazy-rendering caps.
//!
//! Each stage shows at most `cap` deals of its (filtered) list; "load more"
//! raises the cap by a fixed increment. The window is independent of stage
//! content: it is reset wholesale whenever the upstream dataset identity
//! changes (filter change, reload, rollback) and is left alone by
//! optimistic drag commits.
//!
//! The one coupling with the drag engine is the union rule: a deal being
//! dragged must stay in the rendered set of its current stage even when it
//! sits past the cap, or the gesture would lose its drag source mid-flight.

use std::collections::HashMap;

use crate::config::VisibilityConfig;
use crate::model::{Deal, DealId, StageId};

/// Stage-keyed render caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityWindow {
    default_cap: usize,
    increment: usize,
    caps: HashMap<StageId, usize>,
}

/// Deals to render for one stage in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSet<'a> {
    pub deals: Vec<&'a Deal>,
    /// Filtered deals not shown (the dragged deal never counts as hidden).
    pub hidden: usize,
}

impl RenderSet<'_> {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.hidden > 0
    }
}

impl Default for VisibilityWindow {
    fn default() -> Self {
        Self::new(&VisibilityConfig::default())
    }
}

impl VisibilityWindow {
    #[must_use]
    pub fn new(config: &VisibilityConfig) -> Self {
        Self {
            default_cap: config.default_cap,
            increment: config.increment,
            caps: HashMap::new(),
        }
    }

    #[must_use]
    pub fn default_cap(&self) -> usize {
        self.default_cap
    }

    /// Current cap for a stage.
    #[must_use]
    pub fn cap(&self, stage: &StageId) -> usize {
        self.caps.get(stage).copied().unwrap_or(self.default_cap)
    }

    /// Raise a stage's cap by the increment if `total` exceeds it.
    ///
    /// Returns whether the cap changed.
    pub fn load_more(&mut self, stage: &StageId, total: usize) -> bool {
        let cap = self.cap(stage);
        if total <= cap {
            return false;
        }
        self.caps
            .insert(stage.clone(), cap.saturating_add(self.increment));
        true
    }

    /// Back to the default cap for every stage.
    pub fn reset(&mut self) {
        self.caps.clear();
    }

    /// Build the render set: the first `cap` deals, plus the dragged deal
    /// (appended once) if it lies beyond the cap.
    #[must_use]
    pub fn render_set<'a>(
        &self,
        stage: &StageId,
        deals: &[&'a Deal],
        dragging: Option<&DealId>,
    ) -> RenderSet<'a> {
        let cap = self.cap(stage);
        let shown = deals.len().min(cap);
        let mut visible: Vec<&'a Deal> = deals[..shown].to_vec();
        let mut hidden = deals.len() - shown;

        if let Some(dragged) = dragging
            && let Some(deal) = deals[shown..].iter().find(|deal| &deal.id == dragged)
        {
            visible.push(*deal);
            hidden -= 1;
        }

        RenderSet {
            deals: visible,
            hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deals(n: usize) -> Vec<Deal> {
        (0..n)
            .map(|i| Deal::new(format!("D{i}"), format!("deal {i}"), i as f64))
            .collect()
    }

    fn window(cap: usize, increment: usize) -> VisibilityWindow {
        VisibilityWindow::new(&VisibilityConfig {
            default_cap: cap,
            increment,
        })
    }

    #[test]
    fn default_cap_is_twenty() {
        let window = VisibilityWindow::default();
        assert_eq!(window.cap(&"s1".into()), 20);
    }

    #[test]
    fn render_set_truncates_to_cap() {
        let all = deals(5);
        let refs: Vec<&Deal> = all.iter().collect();
        let set = window(3, 2).render_set(&"s1".into(), &refs, None);
        assert_eq!(set.deals.len(), 3);
        assert_eq!(set.hidden, 2);
        assert!(set.has_more());
    }

    #[test]
    fn dragged_deal_beyond_cap_is_unioned_once() {
        let all = deals(5);
        let refs: Vec<&Deal> = all.iter().collect();
        let dragged: DealId = "D4".into();
        let set = window(3, 2).render_set(&"s1".into(), &refs, Some(&dragged));
        let ids: Vec<&str> = set.deals.iter().map(|deal| deal.id.as_str()).collect();
        assert_eq!(ids, ["D0", "D1", "D2", "D4"]);
        assert_eq!(set.hidden, 1);
    }

    #[test]
    fn dragged_deal_within_cap_is_not_duplicated() {
        let all = deals(5);
        let refs: Vec<&Deal> = all.iter().collect();
        let dragged: DealId = "D1".into();
        let set = window(3, 2).render_set(&"s1".into(), &refs, Some(&dragged));
        assert_eq!(set.deals.len(), 3);
        assert_eq!(set.hidden, 2);
    }

    #[test]
    fn load_more_grows_only_when_items_remain() {
        let mut window = window(3, 2);
        let stage: StageId = "s1".into();
        assert!(!window.load_more(&stage, 3));
        assert_eq!(window.cap(&stage), 3);
        assert!(window.load_more(&stage, 4));
        assert_eq!(window.cap(&stage), 5);
        assert_eq!(window.cap(&"s2".into()), 3);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut window = window(3, 2);
        let stage: StageId = "s1".into();
        window.load_more(&stage, 10);
        window.reset();
        assert_eq!(window.cap(&stage), 3);
    }
}
