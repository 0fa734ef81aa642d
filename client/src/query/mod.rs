//! Canonical list queries.
//!
//! A listing screen's pagination, filter, date-range and sort state is
//! turned into an ordered clause list ([`QuerySpec`]) whose encoding is
//! deterministic: pagination first, then text filters in declared order,
//! then the date range, then the sort.
//!
//! ```text
//! current=2&pageSize=10&fullName=/an/i&sort=-createdAt
//! ```

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Listing configuration
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascend,
    Descend,
}

/// A sort on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascend(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Ascend }
    }

    pub fn descend(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Descend }
    }
}

/// `field` sorts ascending, `-field` descending.
impl std::str::FromStr for Sort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (raw, false),
        };

        if field.is_empty() || field.starts_with('-') {
            return Err(format!("expected a field name, optionally prefixed with '-', got '{}'", s));
        }

        Ok(if descending { Sort::descend(field) } else { Sort::ascend(field) })
    }
}

/// What a listing screen can filter and sort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSpec {
    /// Text filters, in the order they are encoded.
    pub filter_fields: Vec<&'static str>,
    /// Field a date range applies to, if the screen has one.
    pub range_field: Option<&'static str>,
    /// Sort used when the table has none selected.
    pub default_sort: Sort,
}

impl ListingSpec {
    /// User table: email / full name filters, creation date range.
    pub fn users() -> Self {
        Self {
            filter_fields: vec!["email", "fullName"],
            range_field: Some("createdAt"),
            default_sort: Sort::descend("createdAt"),
        }
    }

    /// Book table: title / author filters, no date range.
    pub fn books() -> Self {
        Self {
            filter_fields: vec!["mainText", "author"],
            range_field: None,
            default_sort: Sort::descend("updatedAt"),
        }
    }
}

// =============================================================================
// Table state
// =============================================================================

/// Current state of a listing table, as the screen holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub page: u32,
    pub page_size: u32,
    /// Raw filter input keyed by field. Blank values count as absent.
    pub filters: HashMap<String, String>,
    /// Date range bounds; either may be unset while the user is picking.
    pub date_range: (Option<NaiveDate>, Option<NaiveDate>),
    pub sort: Option<Sort>,
}

impl ListState {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            filters: HashMap::new(),
            date_range: (None, None),
            sort: None,
        }
    }

    pub fn filter(mut self, field: &str, value: &str) -> Self {
        self.filters.insert(field.to_string(), value.to_string());
        self
    }

    pub fn range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = (start, end);
        self
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

// =============================================================================
// Query clauses
// =============================================================================

/// One `key=value` pair of the encoded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Current(u32),
    PageSize(u32),
    /// Case-insensitive substring match; `literal` is the raw user input.
    Contains { field: String, literal: String },
    From { field: String, at: DateTime<Utc> },
    Until { field: String, at: DateTime<Utc> },
    Sort(Sort),
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Current(page) => write!(f, "current={}", page),
            Clause::PageSize(size) => write!(f, "pageSize={}", size),
            Clause::Contains { field, literal } => {
                let pattern = regex::escape(literal);
                write!(f, "{}=/{}/i", field, urlencoding::encode(&pattern))
            }
            Clause::From { field, at } => write!(f, "{}>={}", field, rfc3339(at)),
            Clause::Until { field, at } => write!(f, "{}<={}", field, rfc3339(at)),
            Clause::Sort(sort) => match sort.order {
                SortOrder::Ascend => write!(f, "sort={}", sort.field),
                SortOrder::Descend => write!(f, "sort=-{}", sort.field),
            },
        }
    }
}

fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Canonical, ordered list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    clauses: Vec<Clause>,
}

impl QuerySpec {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Query string without the leading `?`.
    pub fn encode(&self) -> String {
        self.clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds queries for one listing screen.
#[derive(Debug, Clone)]
pub struct ListQueryBuilder {
    spec: ListingSpec,
}

impl ListQueryBuilder {
    pub fn new(spec: ListingSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ListingSpec {
        &self.spec
    }

    /// Build the query for `state`. Filters on undeclared fields are ignored.
    pub fn build(&self, state: &ListState) -> QuerySpec {
        let mut clauses = vec![Clause::Current(state.page), Clause::PageSize(state.page_size)];

        for field in &self.spec.filter_fields {
            let Some(value) = state.filters.get(*field) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            clauses.push(Clause::Contains {
                field: field.to_string(),
                literal: value.to_string(),
            });
        }

        if let Some(field) = self.spec.range_field {
            if let (Some(start), Some(end)) = state.date_range {
                if start <= end {
                    clauses.push(Clause::From { field: field.to_string(), at: start_of_day(start) });
                    clauses.push(Clause::Until { field: field.to_string(), at: end_of_day(end) });
                } else {
                    log::debug!("ignoring inverted {} range {} > {}", field, start, end);
                }
            }
        }

        let sort = state
            .sort
            .clone()
            .unwrap_or_else(|| self.spec.default_sort.clone());
        clauses.push(Clause::Sort(sort));

        QuerySpec { clauses }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!("fullName".parse::<Sort>().unwrap(), Sort::ascend("fullName"));
        assert_eq!("-price".parse::<Sort>().unwrap(), Sort::descend("price"));
        assert_eq!(" -createdAt ".parse::<Sort>().unwrap(), Sort::descend("createdAt"));
        assert!("-".parse::<Sort>().is_err());
        assert!("".parse::<Sort>().is_err());
        assert!("--price".parse::<Sort>().is_err());
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn users() -> ListQueryBuilder {
        ListQueryBuilder::new(ListingSpec::users())
    }

    #[test]
    fn test_user_name_filter_default_sort() {
        let state = ListState::new(2, 10).filter("fullName", "an");
        assert_eq!(
            users().build(&state).encode(),
            "current=2&pageSize=10&fullName=/an/i&sort=-createdAt"
        );
    }

    #[test]
    fn test_filters_follow_declared_order() {
        let state = ListState::new(1, 5)
            .filter("fullName", "bob")
            .filter("email", "gmail");
        assert_eq!(
            users().build(&state).encode(),
            "current=1&pageSize=5&email=/gmail/i&fullName=/bob/i&sort=-createdAt"
        );
    }

    #[test]
    fn test_date_range_and_ascending_sort() {
        let state = ListState::new(1, 10)
            .range(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)))
            .sorted(Sort::ascend("fullName"));
        assert_eq!(
            users().build(&state).encode(),
            "current=1&pageSize=10&createdAt>=2024-01-01T00:00:00Z&createdAt<=2024-01-31T23:59:59Z&sort=fullName"
        );
    }

    #[test]
    fn test_single_day_range_kept() {
        let state = ListState::default().range(Some(date(2024, 3, 5)), Some(date(2024, 3, 5)));
        let query = users().build(&state);
        assert_eq!(query.clauses().len(), 5);
    }

    #[test]
    fn test_inverted_range_omitted() {
        let state = ListState::new(1, 10).range(Some(date(2024, 2, 1)), Some(date(2024, 1, 1)));
        assert_eq!(users().build(&state).encode(), "current=1&pageSize=10&sort=-createdAt");
    }

    #[test]
    fn test_partial_range_omitted() {
        let start_only = ListState::new(1, 10).range(Some(date(2024, 2, 1)), None);
        let end_only = ListState::new(1, 10).range(None, Some(date(2024, 2, 1)));
        assert_eq!(users().build(&start_only).encode(), "current=1&pageSize=10&sort=-createdAt");
        assert_eq!(users().build(&end_only).encode(), "current=1&pageSize=10&sort=-createdAt");
    }

    #[test]
    fn test_blank_and_undeclared_filters_ignored() {
        let state = ListState::new(1, 10)
            .filter("email", "   ")
            .filter("role", "ADMIN");
        assert_eq!(users().build(&state).encode(), "current=1&pageSize=10&sort=-createdAt");
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let state = ListState::new(1, 10).filter("email", "a.b+c");
        let query = users().build(&state).encode();
        assert_eq!(query, "current=1&pageSize=10&email=/a%5C.b%5C%2Bc/i&sort=-createdAt");
    }

    #[test]
    fn test_book_listing_defaults() {
        let builder = ListQueryBuilder::new(ListingSpec::books());
        let state = ListState::new(3, 20)
            .filter("author", "Tolkien")
            .range(Some(date(2024, 1, 1)), Some(date(2024, 12, 31)));
        assert_eq!(
            builder.build(&state).encode(),
            "current=3&pageSize=20&author=/Tolkien/i&sort=-updatedAt"
        );
    }

    #[test]
    fn test_explicit_descending_sort() {
        let state = ListState::new(1, 10).sorted(Sort::descend("price"));
        let builder = ListQueryBuilder::new(ListingSpec::books());
        assert_eq!(builder.build(&state).to_string(), "current=1&pageSize=10&sort=-price");
    }
}
