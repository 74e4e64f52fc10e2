use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Month};

use pantry_ledger::{
    NewReceipt, NewReceiptItem, Recurrence, Transaction, TransactionKind, create_receipt,
    create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the pantry_ledger API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The subject identifier of the test user.
    #[arg(long, default_value = "test-user")]
    subject: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {:?}...", args.subject);
    let user = create_user(&args.subject, &conn)?;

    println!("Creating incomes and expenses...");
    let start = Date::from_calendar_date(2024, Month::January, 1)?;

    create_transaction(
        TransactionKind::Income,
        user.id,
        Transaction::build(Decimal::new(3200_00, 2), start, "Salary")
            .recurrence(Recurrence::Monthly, None),
        &conn,
    )?;
    create_transaction(
        TransactionKind::Expense,
        user.id,
        Transaction::build(Decimal::new(1450_00, 2), start, "Rent")
            .recurrence(Recurrence::Monthly, None),
        &conn,
    )?;
    create_transaction(
        TransactionKind::Expense,
        user.id,
        Transaction::build(
            Decimal::new(12_99, 2),
            Date::from_calendar_date(2024, Month::January, 31)?,
            "Streaming subscription",
        )
        .recurrence(Recurrence::Monthly, None),
        &conn,
    )?;
    create_transaction(
        TransactionKind::Expense,
        user.id,
        Transaction::build(
            Decimal::new(89_00, 2),
            Date::from_calendar_date(2024, Month::March, 3)?,
            "Concert tickets",
        ),
        &conn,
    )?;

    println!("Creating receipts...");
    create_receipt(
        user.id,
        NewReceipt {
            date: Date::from_calendar_date(2024, Month::February, 10)?,
            store: "Corner Grocer".to_owned(),
            items: vec![
                NewReceiptItem {
                    name: "Milk".to_owned(),
                    quantity: 2,
                    unit_price: Decimal::new(3_49, 2),
                },
                NewReceiptItem {
                    name: "Bread".to_owned(),
                    quantity: 1,
                    unit_price: Decimal::new(4_20, 2),
                },
            ],
        },
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
