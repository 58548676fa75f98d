//! The fixed set of transaction categories with their labels and colours.

use crate::{Error, transaction::TransactionType};

/// A category that a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// The key stored in the database and sent in forms.
    pub key: &'static str,
    /// The name shown to the user.
    pub label: &'static str,
    /// The type of transaction this category applies to.
    pub transaction_type: TransactionType,
    /// A CSS hex colour used for badges and charts.
    pub color: &'static str,
}

const fn income(key: &'static str, label: &'static str, color: &'static str) -> Category {
    Category {
        key,
        label,
        transaction_type: TransactionType::Income,
        color,
    }
}

const fn expense(key: &'static str, label: &'static str, color: &'static str) -> Category {
    Category {
        key,
        label,
        transaction_type: TransactionType::Expense,
        color,
    }
}

/// All categories, income first.
pub const CATEGORIES: &[Category] = &[
    income("salary", "Salary", "#22c55e"),
    income("freelance", "Freelance", "#06b6d4"),
    income("investments", "Investments", "#6366f1"),
    income("business", "Business", "#ec4899"),
    income("rental", "Rental", "#f59e0b"),
    income("other-income", "Other Income", "#64748b"),
    expense("housing", "Housing", "#ef4444"),
    expense("transportation", "Transportation", "#f97316"),
    expense("groceries", "Groceries", "#84cc16"),
    expense("utilities", "Utilities", "#06b6d4"),
    expense("entertainment", "Entertainment", "#8b5cf6"),
    expense("food", "Food", "#f43f5e"),
    expense("shopping", "Shopping", "#ec4899"),
    expense("healthcare", "Healthcare", "#14b8a6"),
    expense("education", "Education", "#6366f1"),
    expense("personal", "Personal Care", "#d946ef"),
    expense("travel", "Travel", "#0ea5e9"),
    expense("insurance", "Insurance", "#64748b"),
    expense("gifts", "Gifts & Donations", "#f472b6"),
    expense("bills", "Bills & Fees", "#fb7185"),
    expense("other-expense", "Other Expenses", "#94a3b8"),
];

/// The colour used for keys that are not in [CATEGORIES].
pub const UNKNOWN_CATEGORY_COLOR: &str = "#94a3b8";

/// Look up a category by its key.
pub fn find_category(key: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.key == key)
}

/// The categories that apply to `transaction_type`, in display order.
pub fn categories_for(transaction_type: TransactionType) -> impl Iterator<Item = &'static Category> {
    CATEGORIES
        .iter()
        .filter(move |category| category.transaction_type == transaction_type)
}

/// The label for `key`, or the key itself if it is not a known category.
pub fn category_label(key: &str) -> &str {
    find_category(key).map_or(key, |category| category.label)
}

/// The badge colour for `key`.
pub fn category_color(key: &str) -> &'static str {
    find_category(key).map_or(UNKNOWN_CATEGORY_COLOR, |category| category.color)
}

/// Check that `key` names a category for `transaction_type`.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the key is unknown or belongs to the other transaction type.
pub fn validate_category(key: &str, transaction_type: TransactionType) -> Result<(), Error> {
    match find_category(key) {
        Some(category) if category.transaction_type == transaction_type => Ok(()),
        _ => Err(Error::InvalidCategory(key.to_owned())),
    }
}
