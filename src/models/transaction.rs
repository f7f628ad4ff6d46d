use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ModelError;
use crate::models::amount;
use crate::models::label::{Label, LabelId, LabelRegistry};
use crate::models::symbol::Symbol;

const DATE_FORMAT: &str = "%Y%m%d";
const SEPARATOR: &str = ";";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Dividend => "DIVIDEND",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            "dividend" => Ok(TransactionType::Dividend),
            other => Err(ModelError::InvalidArgument(format!(
                "Invalid transaction type '{}'. Use 'buy', 'sell' or 'dividend'.",
                other
            ))),
        }
    }
}

/// Identity label back-collections refer to records by. A new record gets a random key;
/// once stored, it switches to the key derived from its storage id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey(Uuid);

impl RecordKey {
    pub fn new() -> Self {
        RecordKey(Uuid::new_v4())
    }

    /// Key shared by every in-memory copy of the stored record `id`.
    pub fn stored(id: i64) -> Self {
        RecordKey(Uuid::from_u128(id as u64 as u128))
    }
}

impl Default for RecordKey {
    fn default() -> Self {
        Self::new()
    }
}

/// One buy, sell or dividend event against an instrument.
///
/// A record starts empty and is populated through its setters, each of which rejects
/// absent values. Label membership is kept symmetric with each [`Label`]'s back-collection:
/// a label is in `labels()` exactly as many times as the record's key is in
/// `label.transactions()`.
#[derive(Debug)]
pub struct TransactionRecord {
    key: RecordKey,
    id: Option<i64>,
    quantity: Option<Decimal>,
    commission: Option<Decimal>,
    price: Option<Decimal>,
    transaction_type: Option<TransactionType>,
    symbol: Option<Symbol>,
    date: Option<NaiveDateTime>,
    labels: Vec<LabelId>,
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionRecord {
    pub fn new() -> Self {
        Self {
            key: RecordKey::new(),
            id: None,
            quantity: None,
            commission: None,
            price: None,
            transaction_type: None,
            symbol: None,
            date: None,
            labels: Vec::new(),
        }
    }

    pub fn key(&self) -> RecordKey {
        self.key
    }

    /// Storage identity; `None` until the record has been persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Sets the storage identity and moves the record's label links over to
    /// [`RecordKey::stored`]. Links left behind by earlier copies of the same stored record
    /// are dropped first, so a reload replaces them instead of adding to them.
    pub(crate) fn assign_id(&mut self, registry: &mut LabelRegistry, id: i64) -> Result<(), ModelError> {
        if let Some(existing) = self.id {
            if existing != id {
                return Err(ModelError::IdentityAlreadyAssigned(existing));
            }
            return Ok(());
        }

        let stored = RecordKey::stored(id);
        registry.forget(stored);
        for label_id in &self.labels {
            if let Some(label) = registry.get_mut(*label_id) {
                label.rekey(self.key, stored);
            }
        }
        self.key = stored;
        self.id = Some(id);
        Ok(())
    }

    pub fn quantity(&self) -> Option<Decimal> {
        self.quantity
    }

    pub fn commission(&self) -> Option<Decimal> {
        self.commission
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date.map(|d| d.date())
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    pub fn has_label(&self, id: LabelId) -> bool {
        self.labels.contains(&id)
    }

    // Negative amounts are accepted.
    pub fn set_quantity(&mut self, quantity: impl Into<Option<Decimal>>) -> Result<(), ModelError> {
        let quantity = quantity.into().ok_or(ModelError::NullValue("quantity"))?;
        self.quantity = Some(amount::with_scale(quantity));
        Ok(())
    }

    pub fn set_commission(&mut self, commission: impl Into<Option<Decimal>>) -> Result<(), ModelError> {
        let commission = commission.into().ok_or(ModelError::NullValue("commission"))?;
        self.commission = Some(amount::with_scale(commission));
        Ok(())
    }

    pub fn set_price(&mut self, price: impl Into<Option<Decimal>>) -> Result<(), ModelError> {
        let price = price.into().ok_or(ModelError::NullValue("price"))?;
        self.price = Some(amount::with_scale(price));
        Ok(())
    }

    pub fn set_type(&mut self, transaction_type: impl Into<Option<TransactionType>>) -> Result<(), ModelError> {
        let transaction_type = transaction_type.into().ok_or(ModelError::NullValue("type"))?;
        self.transaction_type = Some(transaction_type);
        Ok(())
    }

    pub fn set_symbol(&mut self, symbol: impl Into<Option<Symbol>>) -> Result<(), ModelError> {
        let symbol = symbol.into().ok_or(ModelError::NullValue("symbol"))?;
        self.symbol = Some(symbol);
        Ok(())
    }

    /// Stores the date at midnight.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date.and_time(chrono::NaiveTime::MIN));
    }

    /// Stores the wall-clock time of `date_time` in its own time zone.
    pub fn set_date_time<Tz: TimeZone>(&mut self, date_time: DateTime<Tz>) {
        self.date = Some(date_time.naive_local());
    }

    pub(crate) fn set_naive_date_time(&mut self, date_time: NaiveDateTime) {
        self.date = Some(date_time);
    }

    /// Associates the label with this record on both sides. Associating the same label
    /// twice yields two entries on each side.
    pub fn add_label(&mut self, registry: &mut LabelRegistry, label: LabelId) -> Result<(), ModelError> {
        let label = registry.get_mut(label).ok_or(ModelError::NullValue("label"))?;
        ensure_named(label)?;
        self.labels.push(label.id());
        label.link(self.key);
        Ok(())
    }

    /// Dissociates the label on both sides. A label that is not attached is left alone.
    pub fn remove_label(&mut self, registry: &mut LabelRegistry, label: LabelId) -> Result<(), ModelError> {
        let label = registry.get_mut(label).ok_or(ModelError::NullValue("label"))?;
        ensure_named(label)?;
        if let Some(pos) = self.labels.iter().position(|id| *id == label.id()) {
            self.labels.remove(pos);
        }
        label.unlink(self.key);
        Ok(())
    }

    /// Replaces the label set. The input is validated as a whole before anything changes.
    pub fn set_labels(&mut self, registry: &mut LabelRegistry, labels: &[LabelId]) -> Result<(), ModelError> {
        for id in labels {
            let label = registry.get(*id).ok_or(ModelError::NullValue("label"))?;
            ensure_named(label)?;
        }

        self.detach_labels(registry);
        for id in labels {
            self.add_label(registry, *id)?;
        }
        Ok(())
    }

    /// Drops every label association on both sides; used before the record is destroyed.
    pub fn detach_labels(&mut self, registry: &mut LabelRegistry) {
        for id in self.labels.drain(..) {
            if let Some(label) = registry.get_mut(id) {
                label.unlink(self.key);
            }
        }
    }

    /// Checks that every field required for persistence is set.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.quantity.is_none() {
            return Err(ModelError::NullValue("quantity"));
        }
        if self.commission.is_none() {
            return Err(ModelError::NullValue("commission"));
        }
        if self.price.is_none() {
            return Err(ModelError::NullValue("price"));
        }
        if self.transaction_type.is_none() {
            return Err(ModelError::NullValue("type"));
        }
        if self.symbol.is_none() {
            return Err(ModelError::NullValue("symbol"));
        }
        if self.date.is_none() {
            return Err(ModelError::NullValue("date"));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Semicolon-separated summary for logs: `date;type;ticker;price;quantity;commission;[labels];`.
    pub fn render<'a>(&'a self, registry: &'a LabelRegistry) -> RecordLine<'a> {
        RecordLine { record: self, registry }
    }
}

fn ensure_named(label: &Label) -> Result<(), ModelError> {
    if label.name().is_empty() {
        return Err(ModelError::InvalidArgument("Label name cannot be empty".to_string()));
    }
    Ok(())
}

pub struct RecordLine<'a> {
    record: &'a TransactionRecord,
    registry: &'a LabelRegistry,
}

impl fmt::Display for RecordLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        if let Some(date) = record.date {
            write!(f, "{}", date.format(DATE_FORMAT))?;
        }
        f.write_str(SEPARATOR)?;
        write_opt(f, record.transaction_type.as_ref())?;
        write_opt(f, record.symbol.as_ref().map(|s| &s.ticker))?;
        write_opt(f, record.price.as_ref())?;
        write_opt(f, record.quantity.as_ref())?;
        write_opt(f, record.commission.as_ref())?;

        let names: Vec<&str> = record
            .labels
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .map(|label| label.name())
            .collect();
        write!(f, "[{}]{}", names.join(", "), SEPARATOR)
    }
}

fn write_opt<T: fmt::Display>(f: &mut fmt::Formatter<'_>, value: Option<T>) -> fmt::Result {
    if let Some(value) = value {
        write!(f, "{}", value)?;
    }
    f.write_str(SEPARATOR)
}
