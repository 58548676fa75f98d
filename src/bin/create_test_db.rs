use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finzo::{
    AccountType, DEFAULT_IDENTITY_HEADER, NewAccount, NewTransaction, Principal,
    RecurringInterval, TransactionType, create_account, create_transaction, ensure_user,
    initialize_db,
};

/// A utility for creating a demo database for the finzo server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The subject ID of the demo user, as the identity proxy would send it.
    #[arg(long, short, default_value = "demo")]
    user: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user \"{}\"...", args.user);
    let user = ensure_user(&Principal::new(&args.user), &conn)?;

    println!("Creating accounts...");
    let everyday = create_account(
        user.id,
        &NewAccount {
            name: "Everyday".to_owned(),
            balance: "1250.00".to_owned(),
            account_type: AccountType::Current,
            is_default: true,
        },
        &conn,
    )?;
    let savings = create_account(
        user.id,
        &NewAccount {
            name: "Rainy Day".to_owned(),
            balance: "5000.00".to_owned(),
            account_type: AccountType::Savings,
            is_default: false,
        },
        &conn,
    )?;

    println!("Creating transactions...");
    let today = OffsetDateTime::now_utc().date();
    let transactions = [
        (everyday.id, TransactionType::Income, "3200.00", "salary", "Pay day", 14, Some(RecurringInterval::Monthly)),
        (everyday.id, TransactionType::Expense, "1450.00", "housing", "Rent", 12, Some(RecurringInterval::Monthly)),
        (everyday.id, TransactionType::Expense, "84.35", "groceries", "Weekly shop", 6, Some(RecurringInterval::Weekly)),
        (everyday.id, TransactionType::Expense, "12.50", "food", "Lunch", 3, None),
        (everyday.id, TransactionType::Expense, "60.00", "transportation", "Fuel", 2, None),
        (everyday.id, TransactionType::Expense, "19.99", "entertainment", "Streaming", 1, Some(RecurringInterval::Monthly)),
        (savings.id, TransactionType::Income, "250.00", "other-income", "Transfer from Everyday", 10, Some(RecurringInterval::Monthly)),
        (savings.id, TransactionType::Income, "4.17", "investments", "Interest", 0, None),
    ];

    for (account_id, transaction_type, amount, category, description, days_ago, recurring_interval) in transactions {
        create_transaction(
            user.id,
            &NewTransaction {
                account_id,
                transaction_type,
                amount: amount.to_owned(),
                category: category.to_owned(),
                description: Some(description.to_owned()),
                date: today - Duration::days(days_ago),
                is_recurring: recurring_interval.is_some(),
                recurring_interval,
            },
            &conn,
        )?;
    }

    println!(
        "Success! Start the server with this database and send the header \
        \"{DEFAULT_IDENTITY_HEADER}: {}\" to sign in.",
        args.user
    );

    Ok(())
}
