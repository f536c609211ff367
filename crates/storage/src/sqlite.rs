use rusqlite::types::{FromSql, ToSql};
use rusqlite::Connection;

use itemgrid_core::ids::PreferenceScope;

use crate::error::StorageError;
use crate::traits::{PreferenceKind, PreferenceStore};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn get_value<T: FromSql>(
        &self,
        scope: &PreferenceScope,
        kind: PreferenceKind,
    ) -> Result<Option<T>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM preferences WHERE account_id = ?1 AND section = ?2 AND kind = ?3",
        )?;
        let mut rows = stmt.query_map(
            rusqlite::params![
                scope.account_id().as_uuid().as_bytes().as_slice(),
                scope.section(),
                kind.as_str(),
            ],
            |row| row.get::<_, T>(0),
        )?;

        match rows.next() {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) => Err(StorageError::Sqlite(e)),
            None => Ok(None),
        }
    }

    fn put_value(
        &mut self,
        scope: &PreferenceScope,
        kind: PreferenceKind,
        value: &dyn ToSql,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO preferences (account_id, section, kind, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(account_id, section, kind) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                scope.account_id().as_uuid().as_bytes().as_slice(),
                scope.section(),
                kind.as_str(),
                value,
            ],
        )?;
        tracing::debug!(%scope, kind = kind.as_str(), "preference stored");
        Ok(())
    }
}

impl PreferenceStore for SqliteStorage {
    fn get_template(&self, scope: &PreferenceScope) -> Result<Option<String>, StorageError> {
        self.get_value::<String>(scope, PreferenceKind::Template)
    }

    fn put_template(&mut self, scope: &PreferenceScope, raw: &str) -> Result<(), StorageError> {
        self.put_value(scope, PreferenceKind::Template, &raw)
    }

    fn get_visible_columns(
        &self,
        scope: &PreferenceScope,
    ) -> Result<Option<Vec<String>>, StorageError> {
        let Some(bytes) = self.get_value::<Vec<u8>>(scope, PreferenceKind::VisibleColumns)? else {
            return Ok(None);
        };
        let keys: Vec<String> = rmp_serde::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(keys))
    }

    fn put_visible_columns(
        &mut self,
        scope: &PreferenceScope,
        keys: &[String],
    ) -> Result<(), StorageError> {
        let bytes =
            rmp_serde::to_vec(keys).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.put_value(scope, PreferenceKind::VisibleColumns, &bytes)
    }

    fn get_column_count(&self, scope: &PreferenceScope) -> Result<Option<u32>, StorageError> {
        let Some(raw) = self.get_value::<i64>(scope, PreferenceKind::ColumnCount)? else {
            return Ok(None);
        };
        match u32::try_from(raw) {
            Ok(count) if count > 0 => Ok(Some(count)),
            _ => {
                tracing::warn!(%scope, raw, "ignoring out-of-range column count");
                Ok(None)
            }
        }
    }

    fn put_column_count(
        &mut self,
        scope: &PreferenceScope,
        count: u32,
    ) -> Result<(), StorageError> {
        if count == 0 {
            return Err(StorageError::InvalidValue(
                "column count must be at least 1".into(),
            ));
        }
        self.put_value(scope, PreferenceKind::ColumnCount, &i64::from(count))
    }

    fn clear(&mut self, scope: &PreferenceScope, kind: PreferenceKind) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM preferences WHERE account_id = ?1 AND section = ?2 AND kind = ?3",
            rusqlite::params![
                scope.account_id().as_uuid().as_bytes().as_slice(),
                scope.section(),
                kind.as_str(),
            ],
        )?;
        Ok(())
    }

    fn stored_kinds(&self, scope: &PreferenceScope) -> Result<Vec<PreferenceKind>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind FROM preferences WHERE account_id = ?1 AND section = ?2 ORDER BY kind",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![
                scope.account_id().as_uuid().as_bytes().as_slice(),
                scope.section(),
            ],
            |row| row.get::<_, String>(0),
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(PreferenceKind::parse(&row?)?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemgrid_core::ids::AccountId;

    fn scope(section: &str) -> PreferenceScope {
        PreferenceScope::new(AccountId::new(), section)
    }

    #[test]
    fn absent_preferences_read_as_none() -> Result<(), StorageError> {
        let storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        assert_eq!(storage.get_template(&s)?, None);
        assert_eq!(storage.get_visible_columns(&s)?, None);
        assert_eq!(storage.get_column_count(&s)?, None);
        assert!(storage.stored_kinds(&s)?.is_empty());
        Ok(())
    }

    #[test]
    fn visible_columns_keep_order() -> Result<(), StorageError> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        let keys = vec!["status".to_string(), "name".to_string(), "amount".to_string()];
        storage.put_visible_columns(&s, &keys)?;
        assert_eq!(storage.get_visible_columns(&s)?, Some(keys));
        Ok(())
    }

    #[test]
    fn put_overwrites_previous_value() -> Result<(), StorageError> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        storage.put_template(&s, r#"{"fields":[]}"#)?;
        storage.put_template(&s, r#"{"fields":[{"key":"a"}]}"#)?;
        assert_eq!(
            storage.get_template(&s)?.as_deref(),
            Some(r#"{"fields":[{"key":"a"}]}"#)
        );
        Ok(())
    }

    #[test]
    fn scopes_are_independent() -> Result<(), StorageError> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let account = AccountId::new();
        let leads = PreferenceScope::new(account, "leads");
        let deals = PreferenceScope::new(account, "deals");
        let other = PreferenceScope::new(AccountId::new(), "leads");
        storage.put_column_count(&leads, 4)?;
        assert_eq!(storage.get_column_count(&leads)?, Some(4));
        assert_eq!(storage.get_column_count(&deals)?, None);
        assert_eq!(storage.get_column_count(&other)?, None);
        Ok(())
    }

    #[test]
    fn zero_column_count_rejected() -> Result<(), StorageError> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        assert!(matches!(
            storage.put_column_count(&s, 0),
            Err(StorageError::InvalidValue(_))
        ));
        Ok(())
    }

    #[test]
    fn non_positive_stored_count_reads_as_none() -> Result<(), StorageError> {
        let storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        storage.conn().execute(
            "INSERT INTO preferences (account_id, section, kind, value) VALUES (?1, ?2, 'column-count', -3)",
            rusqlite::params![s.account_id().as_uuid().as_bytes().as_slice(), s.section()],
        )?;
        assert_eq!(storage.get_column_count(&s)?, None);
        Ok(())
    }

    #[test]
    fn corrupt_selection_is_a_serialization_error() -> Result<(), StorageError> {
        let storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        storage.conn().execute(
            "INSERT INTO preferences (account_id, section, kind, value) VALUES (?1, ?2, 'visible-columns', x'c1')",
            rusqlite::params![s.account_id().as_uuid().as_bytes().as_slice(), s.section()],
        )?;
        assert!(matches!(
            storage.get_visible_columns(&s),
            Err(StorageError::Serialization(_))
        ));
        Ok(())
    }

    #[test]
    fn clear_removes_only_that_kind() -> Result<(), StorageError> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let s = scope("leads");
        storage.put_template(&s, "{}")?;
        storage.put_column_count(&s, 3)?;
        storage.clear(&s, PreferenceKind::Template)?;
        assert_eq!(storage.get_template(&s)?, None);
        assert_eq!(storage.stored_kinds(&s)?, vec![PreferenceKind::ColumnCount]);
        Ok(())
    }

    #[test]
    fn file_backed_store_persists_across_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prefs.db");
        let path = path.to_str().ok_or("non-utf8 temp path")?;
        let s = scope("leads");
        {
            let mut storage = SqliteStorage::open(path)?;
            storage.put_visible_columns(&s, &["name".to_string()])?;
        }
        let storage = SqliteStorage::open(path)?;
        assert_eq!(storage.get_visible_columns(&s)?, Some(vec!["name".to_string()]));
        Ok(())
    }
}
