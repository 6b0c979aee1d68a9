//! Filter, sort and paginate an in-memory release list.
//!
//! Predicates run in a fixed sequence (search, category, date range), then the
//! survivors are ordered by `datetime` and sliced into 1-indexed pages. The
//! pipeline is pure and cannot fail.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::models::{Category, ReleaseNote};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// `all` or a single category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "all" => Some(CategoryFilter::All),
            other => Category::parse(other).map(CategoryFilter::Only),
        }
    }

    fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

/// Inclusive date range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| instant >= from) && self.to.map_or(true, |to| instant <= to)
    }
}

/// Quick date selections offered next to the custom range picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePreset {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "currentMonth")]
    CurrentMonth,
    #[serde(rename = "lastMonth")]
    LastMonth,
    #[serde(rename = "custom")]
    Custom,
}

impl DatePreset {
    /// The range this preset stands for relative to `now` (UTC calendar days).
    /// `All` and `Custom` return None: the caller keeps whatever explicit
    /// bounds it has.
    pub fn range(&self, now: DateTime<Utc>) -> Option<DateRange> {
        let today = now.date_naive();
        match self {
            DatePreset::All | DatePreset::Custom => None,
            DatePreset::Today => Some(day_span(today, today)),
            DatePreset::CurrentMonth => {
                let first = first_of_month(today.year(), today.month());
                Some(day_span(first, last_of_month(first)))
            }
            DatePreset::LastMonth => {
                let (year, month) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                let first = first_of_month(year, month);
                Some(day_span(first, last_of_month(first)))
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    first_of_month(year, month)
        .pred_opt()
        .unwrap_or(first)
}

/// From the first instant of `start` to the last millisecond of `end`.
fn day_span(start: NaiveDate, end: NaiveDate) -> DateRange {
    let from = start.and_hms_opt(0, 0, 0).map(|t| Utc.from_utc_datetime(&t));
    let to = end
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .map(|t| Utc.from_utc_datetime(&t) - Duration::milliseconds(1));
    DateRange { from, to }
}

/// Everything that shapes the visible release list.
#[derive(Debug, Clone, Default)]
pub struct ReleaseQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub date_range: DateRange,
    pub sort: SortOrder,
    /// 1-indexed; out-of-range values are clamped.
    pub page: usize,
}

impl ReleaseQuery {
    pub fn matches(&self, release: &ReleaseNote) -> bool {
        self.matches_search(release)
            && self.category.matches(release.category)
            && self.date_range.contains(release.datetime)
    }

    fn matches_search(&self, release: &ReleaseNote) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || release.title.to_lowercase().contains(&needle)
            || release.description.to_lowercase().contains(&needle)
    }
}

/// Filtered and ordered releases, before pagination.
pub fn filter_and_sort(releases: Vec<ReleaseNote>, query: &ReleaseQuery) -> Vec<ReleaseNote> {
    let mut visible: Vec<ReleaseNote> = releases
        .into_iter()
        .filter(|release| query.matches(release))
        .collect();

    // sort_by is stable, so equal datetimes keep their input order
    match query.sort {
        SortOrder::Asc => visible.sort_by(|a, b| a.datetime.cmp(&b.datetime)),
        SortOrder::Desc => visible.sort_by(|a, b| b.datetime.cmp(&a.datetime)),
    }
    visible
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Effective page after clamping
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Slice `[(page-1)*page_size, page*page_size)` out of `items`, clamping the
/// page into `[1, max(total_pages, 1)]`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total,
        total_pages,
    }
}

/// The full pipeline: filter, sort, paginate.
pub fn run(releases: Vec<ReleaseNote>, query: &ReleaseQuery, page_size: usize) -> Page<ReleaseNote> {
    paginate(filter_and_sort(releases, query), query.page, page_size)
}
