use rusqlite::{Connection, params};

use crate::error::{ModelError, StoreError};
use crate::models::label::{Label, LabelId, LabelRegistry};

pub fn save_label(conn: &Connection, label: &Label) -> Result<(), StoreError> {
    if label.name().is_empty() {
        return Err(ModelError::InvalidArgument("Label name cannot be empty".to_string()).into());
    }
    conn.execute(
        "INSERT INTO labels (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![label.id().to_string(), label.name()],
    )?;
    Ok(())
}

/// Registers every stored label that the registry does not know yet. Returns how many were added.
pub fn load_labels(conn: &Connection, registry: &mut LabelRegistry) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name FROM labels ORDER BY rowid ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut added = 0;
    for row in rows {
        let (id, name) = row?;
        let id = id
            .parse::<LabelId>()
            .map_err(|e| StoreError::Corrupt(format!("Invalid label id '{}': {}", id, e)))?;
        if !registry.contains(id) {
            registry.insert(Label::with_id(id, &name));
            added += 1;
        }
    }
    Ok(added)
}
