//! Financial accounts: the model, the default account rule and the account page.

mod account_page;
mod core;
mod create_endpoint;
mod default_endpoint;
mod list_endpoint;

pub use self::core::{
    Account, AccountId, AccountSummary, AccountType, count_accounts, create_account_table,
    get_account, list_accounts, map_account_row,
};
pub use account_page::get_account_page;
pub use create_endpoint::{
    CreateAccountRequest, NewAccount, create_account, create_account_api_endpoint,
    create_account_endpoint, parse_balance,
};
pub use default_endpoint::{set_default_account, set_default_account_endpoint};
pub use list_endpoint::list_accounts_api_endpoint;
