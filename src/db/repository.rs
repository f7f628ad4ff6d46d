use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{Connection, Params, params};
use rust_decimal::Decimal;

use crate::db::label_repository;
use crate::error::{ModelError, StoreError};
use crate::models::label::{LabelId, LabelRegistry};
use crate::models::symbol::{Currency, Symbol};
use crate::models::transaction::{TransactionRecord, TransactionType};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SELECT_TRANSACTIONS: &str = "SELECT t.id, t.date, t.transaction_type, s.ticker, s.currency, t.price, t.quantity, t.commission
     FROM transactions t
     JOIN symbols s ON s.id = t.symbol_id";

const ORDER_BY: &str = "ORDER BY t.date ASC, t.id ASC";

struct StoredRow {
    id: i64,
    date: String,
    transaction_type: String,
    ticker: String,
    currency: String,
    price: String,
    quantity: String,
    commission: String,
}

struct RowValues<'a> {
    date: String,
    transaction_type: &'static str,
    symbol: &'a Symbol,
    price: String,
    quantity: String,
    commission: String,
}

fn row_values(record: &TransactionRecord) -> Result<RowValues<'_>, ModelError> {
    record.validate()?;
    Ok(RowValues {
        date: record
            .date_time()
            .ok_or(ModelError::NullValue("date"))?
            .format(DATE_TIME_FORMAT)
            .to_string(),
        transaction_type: record.transaction_type().ok_or(ModelError::NullValue("type"))?.as_str(),
        symbol: record.symbol().ok_or(ModelError::NullValue("symbol"))?,
        price: record.price().ok_or(ModelError::NullValue("price"))?.to_string(),
        quantity: record.quantity().ok_or(ModelError::NullValue("quantity"))?.to_string(),
        commission: record.commission().ok_or(ModelError::NullValue("commission"))?.to_string(),
    })
}

/// Persists a new record with its symbol, labels and label links, then assigns its identity.
pub fn add_transaction(
    conn: &Connection,
    record: &mut TransactionRecord,
    registry: &mut LabelRegistry,
) -> Result<i64, StoreError> {
    if let Some(id) = record.id() {
        return Err(ModelError::IdentityAlreadyAssigned(id).into());
    }

    let tx = conn.unchecked_transaction()?;
    let id = insert_transaction(&tx, record, registry)?;
    tx.commit()?;

    record.assign_id(registry, id)?;
    tracing::info!(transaction_id = id, "transaction stored");
    Ok(id)
}

/// Writes the rows of a new record. The caller owns the surrounding SQLite transaction.
pub(crate) fn insert_transaction(
    conn: &Connection,
    record: &TransactionRecord,
    registry: &LabelRegistry,
) -> Result<i64, StoreError> {
    let values = row_values(record)?;
    let symbol_id = upsert_symbol(conn, values.symbol)?;
    conn.execute(
        "INSERT INTO transactions (date, transaction_type, symbol_id, price, quantity, commission)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            values.date,
            values.transaction_type,
            symbol_id,
            values.price,
            values.quantity,
            values.commission,
        ],
    )?;
    let id = conn.last_insert_rowid();
    write_label_links(conn, id, record, registry)?;
    tracing::debug!(transaction_id = id, ticker = %values.symbol.ticker, "transaction row written");
    Ok(id)
}

/// Rewrites the stored fields and label links of an already persisted record.
pub fn update_transaction(
    conn: &Connection,
    record: &TransactionRecord,
    registry: &LabelRegistry,
) -> Result<(), StoreError> {
    let id = record.id().ok_or(ModelError::NullValue("id"))?;
    let values = row_values(record)?;

    let tx = conn.unchecked_transaction()?;
    let symbol_id = upsert_symbol(&tx, values.symbol)?;
    let rows_affected = tx.execute(
        "UPDATE transactions
         SET date = ?1, transaction_type = ?2, symbol_id = ?3, price = ?4, quantity = ?5, commission = ?6
         WHERE id = ?7",
        params![
            values.date,
            values.transaction_type,
            symbol_id,
            values.price,
            values.quantity,
            values.commission,
            id,
        ],
    )?;
    if rows_affected == 0 {
        return Err(StoreError::NotFound(id));
    }
    tx.execute("DELETE FROM transaction_labels WHERE transaction_id = ?1", [id])?;
    write_label_links(&tx, id, record, registry)?;
    tx.commit()?;

    tracing::info!(transaction_id = id, "transaction updated");
    Ok(())
}

/// Deletes a persisted record and clears its label back-references.
pub fn remove_transaction(
    conn: &Connection,
    record: &mut TransactionRecord,
    registry: &mut LabelRegistry,
) -> Result<(), StoreError> {
    let id = record.id().ok_or(ModelError::NullValue("id"))?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM transaction_labels WHERE transaction_id = ?1", [id])?;
    let rows_affected = tx.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(StoreError::NotFound(id));
    }
    tx.commit()?;

    record.detach_labels(registry);
    tracing::info!(transaction_id = id, "transaction removed");
    Ok(())
}

/// Loaded records are linked into `registry` under their stored keys. Loading a record again
/// replaces the links of its earlier copies.
pub fn get_all_transactions(
    conn: &Connection,
    registry: &mut LabelRegistry,
) -> Result<Vec<TransactionRecord>, StoreError> {
    query_transactions(conn, registry, "", params![])
}

pub fn get_transactions_by_symbol(
    conn: &Connection,
    registry: &mut LabelRegistry,
    ticker: &str,
) -> Result<Vec<TransactionRecord>, StoreError> {
    query_transactions(conn, registry, "WHERE s.ticker = ?1", [ticker])
}

pub fn get_transactions_by_currency(
    conn: &Connection,
    registry: &mut LabelRegistry,
    currency: Currency,
) -> Result<Vec<TransactionRecord>, StoreError> {
    query_transactions(conn, registry, "WHERE s.currency = ?1", [currency.as_str()])
}

pub fn get_transactions_by_label(
    conn: &Connection,
    registry: &mut LabelRegistry,
    label: LabelId,
) -> Result<Vec<TransactionRecord>, StoreError> {
    query_transactions(
        conn,
        registry,
        "WHERE t.id IN (SELECT transaction_id FROM transaction_labels WHERE label_id = ?1)",
        [label.to_string()],
    )
}

/// Earliest transaction date, or `None` when nothing is stored.
pub fn get_min_date(conn: &Connection) -> Result<Option<NaiveDateTime>, StoreError> {
    let min: Option<String> = conn.query_row("SELECT MIN(date) FROM transactions", [], |row| row.get(0))?;
    min.map(|date| parse_date(&date)).transpose()
}

fn upsert_symbol(conn: &Connection, symbol: &Symbol) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO symbols (ticker, currency) VALUES (?1, ?2)
         ON CONFLICT(ticker) DO UPDATE SET currency = excluded.currency",
        params![symbol.ticker, symbol.currency.as_str()],
    )?;
    let id = conn.query_row(
        "SELECT id FROM symbols WHERE ticker = ?1",
        params![symbol.ticker],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn write_label_links(
    conn: &Connection,
    transaction_id: i64,
    record: &TransactionRecord,
    registry: &LabelRegistry,
) -> Result<(), StoreError> {
    for (position, label_id) in record.labels().iter().enumerate() {
        let label = registry.get(*label_id).ok_or(ModelError::NullValue("label"))?;
        label_repository::save_label(conn, label)?;
        conn.execute(
            "INSERT INTO transaction_labels (transaction_id, label_id, position) VALUES (?1, ?2, ?3)",
            params![transaction_id, label_id.to_string(), position as i64],
        )?;
    }
    Ok(())
}

fn query_transactions<P: Params>(
    conn: &Connection,
    registry: &mut LabelRegistry,
    filter: &str,
    params: P,
) -> Result<Vec<TransactionRecord>, StoreError> {
    label_repository::load_labels(conn, registry)?;

    let sql = format!("{} {} {}", SELECT_TRANSACTIONS, filter, ORDER_BY);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(StoredRow {
            id: row.get(0)?,
            date: row.get(1)?,
            transaction_type: row.get(2)?,
            ticker: row.get(3)?,
            currency: row.get(4)?,
            price: row.get(5)?,
            quantity: row.get(6)?,
            commission: row.get(7)?,
        })
    })?;

    let mut stored = Vec::new();
    for row in rows {
        stored.push(row?);
    }

    let mut transactions: Vec<TransactionRecord> = Vec::with_capacity(stored.len());
    for row in stored {
        let mut record = TransactionRecord::new();
        if let Err(e) = fill_record(conn, registry, &mut record, row) {
            record.detach_labels(registry);
            for loaded in transactions.iter_mut() {
                loaded.detach_labels(registry);
            }
            return Err(e);
        }
        transactions.push(record);
    }
    Ok(transactions)
}

fn fill_record(
    conn: &Connection,
    registry: &mut LabelRegistry,
    record: &mut TransactionRecord,
    row: StoredRow,
) -> Result<(), StoreError> {
    tracing::debug!(transaction_id = row.id, "loading transaction");
    record.assign_id(registry, row.id)?;
    record.set_naive_date_time(parse_date(&row.date)?);
    record.set_type(parse_column::<TransactionType>(&row.transaction_type, "type")?)?;
    record.set_symbol(Symbol::new(&row.ticker, parse_column::<Currency>(&row.currency, "currency")?))?;
    record.set_price(parse_decimal(&row.price)?)?;
    record.set_quantity(parse_decimal(&row.quantity)?)?;
    record.set_commission(parse_decimal(&row.commission)?)?;

    let mut stmt =
        conn.prepare("SELECT label_id FROM transaction_labels WHERE transaction_id = ?1 ORDER BY position ASC")?;
    let label_ids = stmt.query_map([row.id], |r| r.get::<_, String>(0))?;
    for label_id in label_ids {
        let label_id = label_id?;
        let id = parse_column::<LabelId>(&label_id, "label id")?;
        if !registry.contains(id) {
            tracing::warn!(transaction_id = row.id, label_id = %label_id, "skipping link to unknown label");
            continue;
        }
        record.add_label(registry, id)?;
    }
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("Invalid date '{}': {}", value, e)))
}

fn parse_decimal(value: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(value).map_err(|e| StoreError::Corrupt(format!("Invalid amount '{}': {}", value, e)))
}

fn parse_column<T>(value: &str, column: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| StoreError::Corrupt(format!("Invalid {} '{}': {}", column, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::models::label::Label;
    use chrono::NaiveDate;

    fn create_test_transaction(
        registry: &mut LabelRegistry,
        day: u32,
        ticker: &str,
        currency: Currency,
        labels: &[&str],
    ) -> TransactionRecord {
        let mut record = TransactionRecord::new();
        record.set_date(NaiveDate::from_ymd_opt(2025, 1, day).unwrap());
        record.set_type(TransactionType::Buy).unwrap();
        record.set_symbol(Symbol::new(ticker, currency)).unwrap();
        record.set_price(Decimal::new(10050, 2)).unwrap();
        record.set_quantity(Decimal::new(10, 0)).unwrap();
        record.set_commission(Decimal::new(995, 2)).unwrap();
        for name in labels {
            let id = registry.get_or_create(name);
            record.add_label(registry, id).unwrap();
        }
        record
    }

    fn tickers(records: &[TransactionRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.symbol().unwrap().ticker.clone())
            .collect()
    }

    #[test]
    fn test_add_transaction_assigns_identity() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 15, "ABC", Currency::Usd, &[]);

        let id = add_transaction(&conn, &mut record, &mut registry).unwrap();
        assert!(id > 0);
        assert_eq!(record.id(), Some(id));
    }

    #[test]
    fn test_add_transaction_twice_is_rejected() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 15, "ABC", Currency::Usd, &[]);

        let id = add_transaction(&conn, &mut record, &mut registry).unwrap();
        let result = add_transaction(&conn, &mut record, &mut registry);
        assert!(matches!(
            result,
            Err(StoreError::Model(ModelError::IdentityAlreadyAssigned(existing))) if existing == id
        ));
    }

    #[test]
    fn test_add_incomplete_transaction_fails() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = TransactionRecord::new();
        record.set_type(TransactionType::Sell).unwrap();

        let result = add_transaction(&conn, &mut record, &mut registry);
        assert!(matches!(result, Err(StoreError::Model(ModelError::NullValue("quantity")))));
        assert_eq!(record.id(), None);

        let mut fresh = LabelRegistry::new();
        assert!(get_all_transactions(&conn, &mut fresh).unwrap().is_empty());
    }

    #[test]
    fn test_get_all_transactions_empty() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();

        let result = get_all_transactions(&conn, &mut registry);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 0);
    }

    #[test]
    fn test_get_all_transactions_restores_fields_and_labels() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 15, "ABC", Currency::Usd, &["tech", "growth"]);
        let expected_line = record.render(&registry).to_string();
        add_transaction(&conn, &mut record, &mut registry).unwrap();

        let mut loaded_registry = LabelRegistry::new();
        let loaded = get_all_transactions(&conn, &mut loaded_registry).unwrap();
        assert_eq!(loaded.len(), 1);

        let loaded = &loaded[0];
        assert_eq!(loaded.id(), record.id());
        assert_eq!(loaded.price().unwrap().to_string(), "100.50000000");
        assert_eq!(loaded.render(&loaded_registry).to_string(), expected_line);

        for label_id in loaded.labels() {
            assert!(loaded_registry.get(*label_id).unwrap().contains(loaded.key()));
        }
    }

    #[test]
    fn test_loading_twice_into_one_registry_keeps_single_link() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 15, "ABC", Currency::Usd, &["tech"]);
        add_transaction(&conn, &mut record, &mut registry).unwrap();
        let tech = registry.find_by_name("tech").unwrap().id();
        assert_eq!(registry.get(tech).unwrap().transactions(), &[record.key()]);

        let first = get_all_transactions(&conn, &mut registry).unwrap();
        drop(first);
        let second = get_all_transactions(&conn, &mut registry).unwrap();

        assert_eq!(second[0].key(), record.key());
        assert_eq!(registry.get(tech).unwrap().transactions(), &[record.key()]);

        let by_label = get_transactions_by_label(&conn, &mut registry, tech).unwrap();
        assert_eq!(by_label.len(), 1);
        assert_eq!(registry.get(tech).unwrap().transactions().len(), 1);
    }

    #[test]
    fn test_date_time_keeps_sub_second_precision() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 15, "ABC", Currency::Usd, &[]);
        let date_time = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_milli_opt(9, 30, 15, 250)
            .unwrap();
        record.set_date_time(date_time.and_utc());
        add_transaction(&conn, &mut record, &mut registry).unwrap();

        let mut fresh = LabelRegistry::new();
        let loaded = get_all_transactions(&conn, &mut fresh).unwrap();
        assert_eq!(loaded[0].date_time(), Some(date_time));
        assert_eq!(get_min_date(&conn).unwrap(), Some(date_time));
    }

    #[test]
    fn test_failed_load_leaves_no_links() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut good = create_test_transaction(&mut registry, 1, "ABC", Currency::Usd, &["tech"]);
        let mut bad = create_test_transaction(&mut registry, 2, "XYZ", Currency::Usd, &["tech"]);
        add_transaction(&conn, &mut good, &mut registry).unwrap();
        add_transaction(&conn, &mut bad, &mut registry).unwrap();
        conn.execute("UPDATE transactions SET commission = 'oops' WHERE id = ?1", [bad.id().unwrap()])
            .unwrap();

        let mut fresh = LabelRegistry::new();
        assert!(get_all_transactions(&conn, &mut fresh).is_err());
        let tech = fresh.find_by_name("tech").unwrap();
        assert!(tech.transactions().is_empty());
    }

    #[test]
    fn test_get_transactions_ordered_by_date() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut late = create_test_transaction(&mut registry, 20, "LATE", Currency::Usd, &[]);
        let mut early = create_test_transaction(&mut registry, 3, "EARLY", Currency::Usd, &[]);
        add_transaction(&conn, &mut late, &mut registry).unwrap();
        add_transaction(&conn, &mut early, &mut registry).unwrap();

        let mut fresh = LabelRegistry::new();
        let all = get_all_transactions(&conn, &mut fresh).unwrap();
        assert_eq!(tickers(&all), vec!["EARLY", "LATE"]);
    }

    #[test]
    fn test_get_transactions_by_symbol() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        for (day, ticker) in [(1, "ABC"), (2, "XYZ"), (3, "ABC")] {
            let mut record = create_test_transaction(&mut registry, day, ticker, Currency::Usd, &[]);
            add_transaction(&conn, &mut record, &mut registry).unwrap();
        }

        let mut fresh = LabelRegistry::new();
        let found = get_transactions_by_symbol(&conn, &mut fresh, "ABC").unwrap();
        assert_eq!(tickers(&found), vec!["ABC", "ABC"]);

        let none = get_transactions_by_symbol(&conn, &mut fresh, "QQQ").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_get_transactions_by_currency_joins_symbol() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut us = create_test_transaction(&mut registry, 1, "AAPL", Currency::Usd, &[]);
        let mut ca = create_test_transaction(&mut registry, 2, "SHOP", Currency::Cad, &[]);
        add_transaction(&conn, &mut us, &mut registry).unwrap();
        add_transaction(&conn, &mut ca, &mut registry).unwrap();

        let mut fresh = LabelRegistry::new();
        let found = get_transactions_by_currency(&conn, &mut fresh, Currency::Cad).unwrap();
        assert_eq!(tickers(&found), vec!["SHOP"]);
        assert_eq!(found[0].symbol().unwrap().currency, Currency::Cad);
    }

    #[test]
    fn test_get_transactions_by_label() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut first = create_test_transaction(&mut registry, 1, "AAPL", Currency::Usd, &["tech"]);
        let mut second = create_test_transaction(&mut registry, 2, "XOM", Currency::Usd, &["energy"]);
        let mut third = create_test_transaction(&mut registry, 3, "MSFT", Currency::Usd, &["tech", "energy"]);
        for record in [&mut first, &mut second, &mut third] {
            add_transaction(&conn, record, &mut registry).unwrap();
        }
        let tech = registry.find_by_name("tech").unwrap().id();

        let mut fresh = LabelRegistry::new();
        let found = get_transactions_by_label(&conn, &mut fresh, tech).unwrap();
        assert_eq!(tickers(&found), vec!["AAPL", "MSFT"]);
        assert_eq!(fresh.get(tech).unwrap().transactions().len(), 2);
    }

    #[test]
    fn test_get_min_date() {
        let conn = establish_test_connection().unwrap();
        assert_eq!(get_min_date(&conn).unwrap(), None);

        let mut registry = LabelRegistry::new();
        for day in [12, 4, 28] {
            let mut record = create_test_transaction(&mut registry, day, "ABC", Currency::Usd, &[]);
            add_transaction(&conn, &mut record, &mut registry).unwrap();
        }

        let expected = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(get_min_date(&conn).unwrap(), Some(expected));
    }

    #[test]
    fn test_update_transaction_replaces_labels() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &["old"]);
        add_transaction(&conn, &mut record, &mut registry).unwrap();

        let new_label = registry.create("new");
        record.set_labels(&mut registry, &[new_label]).unwrap();
        record.set_price(Decimal::new(1, 0)).unwrap();
        update_transaction(&conn, &record, &registry).unwrap();

        let mut fresh = LabelRegistry::new();
        let loaded = get_all_transactions(&conn, &mut fresh).unwrap();
        assert_eq!(loaded[0].price().unwrap().to_string(), "1.00000000");
        assert!(loaded[0].render(&fresh).to_string().ends_with(";[new];"));

        let old = registry.find_by_name("old").unwrap().id();
        let by_old = get_transactions_by_label(&conn, &mut fresh, old).unwrap();
        assert!(by_old.is_empty());
    }

    #[test]
    fn test_update_unpersisted_transaction_fails() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &[]);

        let result = update_transaction(&conn, &record, &registry);
        assert!(matches!(result, Err(StoreError::Model(ModelError::NullValue("id")))));
    }

    #[test]
    fn test_remove_transaction_detaches_labels() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &["tech"]);
        add_transaction(&conn, &mut record, &mut registry).unwrap();
        let tech = registry.find_by_name("tech").unwrap().id();

        remove_transaction(&conn, &mut record, &mut registry).unwrap();

        assert!(record.labels().is_empty());
        assert!(registry.get(tech).unwrap().transactions().is_empty());
        let mut fresh = LabelRegistry::new();
        assert!(get_all_transactions(&conn, &mut fresh).unwrap().is_empty());
    }

    #[test]
    fn test_remove_transaction_not_found() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &["tech"]);
        record.assign_id(&mut registry, 404).unwrap();

        let result = remove_transaction(&conn, &mut record, &mut registry);
        assert!(matches!(result, Err(StoreError::NotFound(404))));
        assert_eq!(record.labels().len(), 1);
    }

    #[test]
    fn test_unknown_label_link_is_skipped() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let orphan = Label::new("orphan");
        registry.insert(orphan.clone());
        let mut record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &[]);
        record.add_label(&mut registry, orphan.id()).unwrap();
        add_transaction(&conn, &mut record, &mut registry).unwrap();

        conn.execute_batch("PRAGMA foreign_keys = OFF; DELETE FROM labels;").unwrap();

        let mut fresh = LabelRegistry::new();
        let loaded = get_all_transactions(&conn, &mut fresh).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].labels().is_empty());
    }

    #[test]
    fn test_corrupt_amount_is_reported() {
        let conn = establish_test_connection().unwrap();
        let mut registry = LabelRegistry::new();
        let mut record = create_test_transaction(&mut registry, 5, "ABC", Currency::Usd, &[]);
        add_transaction(&conn, &mut record, &mut registry).unwrap();
        conn.execute("UPDATE transactions SET price = 'abc'", []).unwrap();

        let result = get_all_transactions(&conn, &mut registry);
        assert!(matches!(result, Err(StoreError::Corrupt(message)) if message.contains("Invalid amount")));
    }
}
