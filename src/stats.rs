use crate::ledger::CompletionLedger;
use crate::models::Activity;
use serde::Serialize;

pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Serialize)]
pub struct ActivityStat {
    pub id: String,
    pub category: String,
    pub title: String,
    pub completion_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// `"All"` followed by each category in catalog order.
    pub categories: Vec<String>,
    pub entries: Vec<ActivityStat>,
    pub total_completions: u64,
}

/// Builds the per-activity completion table, most completed first.
/// `category` of `None` or `"All"` disables filtering.
pub fn build_stats(
    catalog: &[Activity],
    ledger: &CompletionLedger,
    category: Option<&str>,
) -> StatsReport {
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for activity in catalog {
        if !categories.contains(&activity.category) {
            categories.push(activity.category.clone());
        }
    }

    let filter = category.filter(|name| *name != ALL_CATEGORIES);
    let mut entries: Vec<ActivityStat> = catalog
        .iter()
        .filter(|activity| filter.is_none_or(|name| activity.category == name))
        .map(|activity| ActivityStat {
            id: activity.id.clone(),
            category: activity.category.clone(),
            title: activity.title.clone(),
            completion_count: ledger.count(&activity.id),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.completion_count
            .cmp(&a.completion_count)
            .then_with(|| a.title.cmp(&b.title))
    });

    let total_completions = entries
        .iter()
        .fold(0u64, |acc, entry| acc.saturating_add(entry.completion_count));

    StatsReport {
        categories,
        entries,
        total_completions,
    }
}
