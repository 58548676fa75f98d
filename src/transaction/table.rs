//! The view model behind the transaction table on the account page.
//!
//! The table state lives in the query string, so every control on the page is
//! a link or form that requests the same page with an updated [TableQuery].
//! The server decodes the query into a [TransactionTable], derives the
//! visible rows and renders them. Nothing here touches the database.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    account::AccountId,
    transaction::{Transaction, TransactionId, TransactionType},
};

/// The column the table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Category,
}

impl SortField {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Category => "category",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Amount => "Amount",
            Self::Category => "Category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Which column to sort by and in which direction, newest first by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Show only recurring or only one-time transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurringFilter {
    #[serde(rename = "recurring")]
    Recurring,
    #[serde(rename = "one-time")]
    OneTime,
}

impl RecurringFilter {
    pub const ALL: [Self; 2] = [Self::Recurring, Self::OneTime];

    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Recurring => "recurring",
            Self::OneTime => "one-time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recurring => "Recurring",
            Self::OneTime => "One-time",
        }
    }

    fn matches(self, transaction: &Transaction) -> bool {
        match self {
            Self::Recurring => transaction.is_recurring(),
            Self::OneTime => !transaction.is_recurring(),
        }
    }
}

/// The table state as it appears in the query string of the account page.
///
/// Empty values decode as `None`, so the "All" option of a filter can be
/// submitted as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub type_filter: Option<TransactionType>,
    pub recurring: Option<RecurringFilter>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    /// Repeated once per selected row, e.g. `selected=1&selected=4`.
    #[serde(default)]
    pub selected: Vec<TransactionId>,
}

impl TableQuery {
    pub(crate) fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(search) = self.search.as_deref().filter(|search| !search.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        if let Some(type_filter) = self.type_filter {
            pairs.push(("type", type_filter.as_str().to_owned()));
        }
        if let Some(recurring) = self.recurring {
            pairs.push(("recurring", recurring.as_query_value().to_owned()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_query_value().to_owned()));
        }
        if let Some(direction) = self.direction {
            pairs.push(("direction", direction.as_query_value().to_owned()));
        }
        for id in &self.selected {
            pairs.push(("selected", id.to_string()));
        }

        serde_urlencoded::to_string(&pairs).unwrap_or_else(|error| {
            tracing::error!("Could not encode table query {self:?}: {error}");
            String::new()
        })
    }

    /// The URL of `route` showing the table in this state.
    pub(crate) fn to_url(&self, route: &str) -> String {
        let query = self.to_query_string();

        if query.is_empty() {
            route.to_owned()
        } else {
            format!("{route}?{query}")
        }
    }
}

/// The ids to delete and the account to refresh afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteRequest {
    pub ids: Vec<TransactionId>,
    pub account_id: Option<AccountId>,
}

/// The filter, sort and selection state of the transaction table over an
/// unchanging list of transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    source: Vec<Transaction>,
    pub search: String,
    pub type_filter: Option<TransactionType>,
    pub recurring_filter: Option<RecurringFilter>,
    pub sort: SortConfig,
    selected: BTreeSet<TransactionId>,
    delete_pending: bool,
}

impl TransactionTable {
    /// Create a table over `source` with no filters and the default sort.
    pub fn new(source: Vec<Transaction>) -> Self {
        Self {
            source,
            search: String::new(),
            type_filter: None,
            recurring_filter: None,
            sort: SortConfig::default(),
            selected: BTreeSet::new(),
            delete_pending: false,
        }
    }

    /// Restore the table state from the query string.
    ///
    /// Selected ids that are not visible under the decoded filters are dropped.
    pub fn from_query(source: Vec<Transaction>, query: TableQuery) -> Self {
        let mut table = Self {
            search: query.search.unwrap_or_default(),
            type_filter: query.type_filter,
            recurring_filter: query.recurring,
            sort: SortConfig {
                field: query.sort.unwrap_or_default(),
                direction: query.direction.unwrap_or_default(),
            },
            selected: query.selected.into_iter().collect(),
            ..Self::new(source)
        };
        table.prune_selection();

        table
    }

    /// Encode the table state so it can be restored with [TransactionTable::from_query].
    pub fn to_query(&self) -> TableQuery {
        TableQuery {
            search: Some(self.search.clone()).filter(|search| !search.is_empty()),
            type_filter: self.type_filter,
            recurring: self.recurring_filter,
            sort: Some(self.sort.field),
            direction: Some(self.sort.direction),
            selected: self.selected.iter().copied().collect(),
        }
    }

    /// All transactions the table was created with, unfiltered and in their original order.
    pub fn source(&self) -> &[Transaction] {
        &self.source
    }

    /// The rows to display: the source filtered by search text, type and
    /// recurrence, then sorted.
    ///
    /// The sort is stable, rows that compare equal keep their source order in
    /// both directions.
    pub fn visible(&self) -> Vec<&Transaction> {
        let search = self.search.to_lowercase();

        let mut rows: Vec<&Transaction> = self
            .source
            .iter()
            .filter(|transaction| {
                search.is_empty()
                    || transaction
                        .description
                        .as_ref()
                        .is_some_and(|description| description.to_lowercase().contains(&search))
            })
            .filter(|transaction| {
                self.type_filter
                    .is_none_or(|type_filter| transaction.transaction_type == type_filter)
            })
            .filter(|transaction| {
                self.recurring_filter
                    .is_none_or(|recurring_filter| recurring_filter.matches(transaction))
            })
            .collect();

        let SortConfig { field, direction } = self.sort;
        rows.sort_by(|a, b| {
            let ordering = compare(field, a, b);

            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        rows
    }

    /// Clicking the active column while ascending flips it to descending,
    /// any other click sorts by `field` ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = match self.sort {
            SortConfig {
                field: current,
                direction: SortDirection::Asc,
            } if current == field => SortConfig {
                field,
                direction: SortDirection::Desc,
            },
            _ => SortConfig {
                field,
                direction: SortDirection::Asc,
            },
        };
    }

    pub fn is_selected(&self, id: TransactionId) -> bool {
        self.selected.contains(&id)
    }

    /// The selected ids in ascending order.
    pub fn selected(&self) -> Vec<TransactionId> {
        self.selected.iter().copied().collect()
    }

    pub fn toggle_selected(&mut self, id: TransactionId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Whether there is at least one visible row and all of them are selected.
    pub fn all_visible_selected(&self) -> bool {
        let visible = self.visible();

        !visible.is_empty()
            && visible
                .iter()
                .all(|transaction| self.selected.contains(&transaction.id))
    }

    /// Clear the selection if every visible row is selected, otherwise select
    /// exactly the visible rows.
    pub fn toggle_select_all(&mut self) {
        self.selected = if self.all_visible_selected() {
            BTreeSet::new()
        } else {
            self.visible()
                .iter()
                .map(|transaction| transaction.id)
                .collect()
        };
    }

    /// Drop selected ids that the current filters hide.
    pub fn prune_selection(&mut self) {
        let visible: BTreeSet<TransactionId> = self
            .visible()
            .iter()
            .map(|transaction| transaction.id)
            .collect();

        self.selected.retain(|id| visible.contains(id));
    }

    /// Whether a bulk delete has started and not yet finished.
    ///
    /// Only tracked within one request. Rendered pages show progress through
    /// htmx instead, which disables the delete button while the request is in flight.
    pub fn delete_pending(&self) -> bool {
        self.delete_pending
    }

    /// Start deleting the selected rows.
    ///
    /// The account to refresh is the account of the first transaction in the
    /// unfiltered source. Returns `None` and leaves the state unchanged when
    /// nothing is selected.
    pub fn begin_bulk_delete(&mut self) -> Option<BulkDeleteRequest> {
        if self.selected.is_empty() {
            return None;
        }

        self.delete_pending = true;

        Some(BulkDeleteRequest {
            ids: self.selected(),
            account_id: self.source.first().map(|transaction| transaction.account_id),
        })
    }

    /// Record the outcome of a bulk delete, the selection is kept when it failed.
    pub fn finish_bulk_delete(&mut self, succeeded: bool) {
        self.delete_pending = false;

        if succeeded {
            self.selected.clear();
        }
    }
}

fn compare(field: SortField, a: &Transaction, b: &Transaction) -> Ordering {
    match field {
        SortField::Date => a.date.cmp(&b.date),
        SortField::Amount => a.signed_amount().cmp(&b.signed_amount()),
        SortField::Category => a.category.cmp(&b.category),
    }
}
