use std::fs::File;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::repository;
use crate::error::{ModelError, StoreError};
use crate::models::label::{LabelId, LabelRegistry};
use crate::models::symbol::{Currency, Symbol};
use crate::models::transaction::{TransactionRecord, TransactionType};

const COLUMNS: usize = 8;
const LABEL_SEPARATOR: char = '|';

#[derive(Debug)]
pub enum ImportFormat {
    Csv,
}

/// A parsed line: the record without labels, and the label names it carries.
#[derive(Debug)]
pub struct ImportedRow {
    pub record: TransactionRecord,
    pub labels: Vec<String>,
}

/// Parses the whole file before touching the registry or the database, then writes every
/// row in one SQLite transaction. On failure nothing is stored and labels created for the
/// import are dropped again.
pub fn import_transactions_to_db(
    conn: &Connection,
    registry: &mut LabelRegistry,
    format: ImportFormat,
    path: &str,
) -> Result<usize, StoreError> {
    let rows = match format {
        ImportFormat::Csv => import_csv(path)?,
    };

    let mut transactions = Vec::with_capacity(rows.len());
    let mut created = Vec::new();
    let written = match attach_labels(registry, rows, &mut transactions, &mut created) {
        Ok(()) => write_all(conn, &transactions, registry),
        Err(e) => Err(e.into()),
    };

    // The records are not handed back, so their links go with them.
    for transaction in transactions.iter_mut() {
        transaction.detach_labels(registry);
    }
    if written.is_err() {
        for id in created {
            registry.remove(id);
        }
    }

    let count = written?;
    tracing::info!(path, count, "imported transactions");
    Ok(count)
}

fn attach_labels(
    registry: &mut LabelRegistry,
    rows: Vec<ImportedRow>,
    transactions: &mut Vec<TransactionRecord>,
    created: &mut Vec<LabelId>,
) -> Result<(), ModelError> {
    for row in rows {
        let mut record = row.record;
        let mut ids = Vec::with_capacity(row.labels.len());
        for name in &row.labels {
            let id = match registry.find_by_name(name) {
                Some(label) => label.id(),
                None => {
                    let id = registry.create(name);
                    created.push(id);
                    id
                }
            };
            ids.push(id);
        }
        record.set_labels(registry, &ids)?;
        transactions.push(record);
    }
    Ok(())
}

fn write_all(
    conn: &Connection,
    transactions: &[TransactionRecord],
    registry: &LabelRegistry,
) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;
    for (line_index, transaction) in transactions.iter().enumerate() {
        repository::insert_transaction(&tx, transaction, registry).map_err(|e| StoreError::Line {
            line: line_index + 1,
            source: Box::new(e),
        })?;
    }
    tx.commit()?;
    Ok(transactions.len())
}

fn import_csv(path: &str) -> Result<Vec<ImportedRow>, StoreError> {
    let file = File::open(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        let row = result
            .map_err(StoreError::from)
            .and_then(|record| {
                let fields: Vec<&str> = record.iter().collect();
                create_transaction(&fields).map_err(StoreError::from)
            })
            .map_err(|e| StoreError::Line {
                line: line_index + 1,
                source: Box::new(e),
            })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Builds a row from `date,type,ticker,currency,price,quantity,commission,labels`.
pub fn create_transaction(fields: &[&str]) -> Result<ImportedRow, ModelError> {
    if fields.len() != COLUMNS {
        return Err(ModelError::InvalidArgument(format!(
            "Invalid number of columns: expected {}, got {}",
            COLUMNS,
            fields.len()
        )));
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d")
        .map_err(|_| ModelError::InvalidArgument("Invalid date format. Please use YYYY-MM-DD.".to_string()))?;
    let transaction_type = TransactionType::from_str(fields[1])?;

    let ticker = fields[2];
    if ticker.is_empty() {
        return Err(ModelError::NullValue("symbol"));
    }
    let currency = Currency::from_str(fields[3])?;

    let mut record = TransactionRecord::new();
    record.set_date(date);
    record.set_type(transaction_type)?;
    record.set_symbol(Symbol::new(ticker, currency))?;
    record.set_price(parse_amount(fields[4], "price")?)?;
    record.set_quantity(parse_amount(fields[5], "quantity")?)?;
    record.set_commission(parse_amount(fields[6], "commission")?)?;

    let labels = fields[7]
        .split(LABEL_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ImportedRow { record, labels })
}

fn parse_amount(value: &str, field: &'static str) -> Result<Option<Decimal>, ModelError> {
    if value.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(value).map(Some).map_err(|_| {
        ModelError::InvalidArgument(format!(
            "Invalid {} format {}. Please provide a valid decimal number.",
            field, value
        ))
    })
}
