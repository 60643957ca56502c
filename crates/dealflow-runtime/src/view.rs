#![forbid(unsafe_code)]

//! Render pass: what each column shows right now.
//!
//! Combines the visible collection (working copy while dragging), the
//! active filter, and the visibility caps into a plain, serializable
//! snapshot. Column totals are over the filtered deals; `aggregate_value`
//! is the unfiltered stage sum.

use serde::Serialize;

use dealflow_core::{BoardFilter, Deal, DealId, StageCollection, StageId, VisibilityWindow};

/// One rendered column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub stage_id: StageId,
    pub name: String,
    pub deals: Vec<Deal>,
    /// Sum over the filtered deals.
    pub total: f64,
    pub aggregate_value: f64,
    /// Filtered deals in this column, shown or not.
    pub matching: usize,
    pub hidden: usize,
    pub has_more: bool,
}

impl ColumnView {
    /// Ids of the rendered deals, in order.
    #[must_use]
    pub fn deal_ids(&self) -> Vec<&str> {
        self.deals.iter().map(|deal| deal.id.as_str()).collect()
    }
}

/// The whole board for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dragging: Option<DealId>,
}

impl BoardView {
    /// Column by stage name (exact).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnView> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Build the render snapshot.
#[must_use]
pub fn render(
    collection: &StageCollection,
    filter: &BoardFilter,
    window: &VisibilityWindow,
    dragging: Option<&DealId>,
) -> BoardView {
    let columns = filter
        .apply(collection)
        .into_iter()
        .map(|filtered| {
            let set = window.render_set(&filtered.stage.id, &filtered.deals, dragging);
            ColumnView {
                stage_id: filtered.stage.id.clone(),
                name: filtered.stage.name.clone(),
                has_more: set.has_more(),
                hidden: set.hidden,
                deals: set.deals.into_iter().cloned().collect(),
                total: filtered.total,
                aggregate_value: filtered.stage.aggregate_value(),
                matching: filtered.deals.len(),
            }
        })
        .collect();
    BoardView {
        columns,
        dragging: dragging.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealflow_core::{Stage, VisibilityConfig};

    fn board() -> StageCollection {
        StageCollection::new(vec![
            Stage::new(
                "s1",
                "Prospect",
                (0..5)
                    .map(|i| Deal::new(format!("D{i}"), format!("deal {i}"), 10.0))
                    .collect(),
            ),
            Stage::new("s2", "Won", vec![Deal::new("W1", "big", 99.0).company("Acme")]),
        ])
    }

    #[test]
    fn columns_are_capped_and_totalled() {
        let window = VisibilityWindow::new(&VisibilityConfig {
            default_cap: 2,
            increment: 2,
        });
        let view = render(&board(), &BoardFilter::new(), &window, None);
        let prospect = view.column("Prospect").unwrap();
        assert_eq!(prospect.deal_ids(), ["D0", "D1"]);
        assert_eq!(prospect.hidden, 3);
        assert!(prospect.has_more);
        assert_eq!(prospect.total, 50.0);
        assert_eq!(prospect.matching, 5);
        assert!(view.dragging.is_none());
    }

    #[test]
    fn filtered_totals_differ_from_aggregate() {
        let filter = BoardFilter::new().search("acme");
        let view = render(&board(), &filter, &VisibilityWindow::default(), None);
        let prospect = view.column("Prospect").unwrap();
        assert!(prospect.deals.is_empty());
        assert_eq!(prospect.total, 0.0);
        assert_eq!(prospect.aggregate_value, 50.0);
        assert_eq!(view.column("Won").unwrap().total, 99.0);
    }

    #[test]
    fn dragged_deal_is_rendered_past_cap() {
        let window = VisibilityWindow::new(&VisibilityConfig {
            default_cap: 2,
            increment: 2,
        });
        let dragged: DealId = "D4".into();
        let view = render(&board(), &BoardFilter::new(), &window, Some(&dragged));
        let prospect = view.column("Prospect").unwrap();
        assert_eq!(prospect.deal_ids(), ["D0", "D1", "D4"]);
        assert_eq!(prospect.hidden, 2);
        assert_eq!(view.dragging, Some(dragged));
    }

    #[test]
    fn view_serializes_in_camel_case() {
        let window = VisibilityWindow::new(&VisibilityConfig {
            default_cap: 2,
            increment: 2,
        });
        let idle = render(&board(), &BoardFilter::new(), &window, None);
        let json = serde_json::to_value(&idle).unwrap();
        let prospect = &json["columns"][0];
        assert_eq!(prospect["stageId"], "s1");
        assert_eq!(prospect["hasMore"], true);
        assert_eq!(prospect["aggregateValue"], 50.0);
        assert_eq!(json["columns"][1]["deals"][0]["companyName"], "Acme");
        assert!(json.get("dragging").is_none());

        let dragged: DealId = "D4".into();
        let active = render(&board(), &BoardFilter::new(), &window, Some(&dragged));
        let json = serde_json::to_value(&active).unwrap();
        assert_eq!(json["dragging"], "D4");
        assert_eq!(json["columns"][0]["deals"][2]["id"], "D4");
    }
}
