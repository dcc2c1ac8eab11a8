//! Key-value entry operations on the cache database.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get the value stored under `key`.
    ///
    /// Returns None if the key doesn't exist.
    pub async fn get_entry(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM cache_entries WHERE key = ?1", params![key], |row| {
                    row.get(0)
                });

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Write all entries in one transaction.
    ///
    /// Either every entry is stored or none is.
    pub async fn put_entries(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO cache_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            updated_at = excluded.updated_at",
                    )?;
                    for (key, value) in &entries {
                        stmt.execute(params![key, value, &updated_at])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entries stored under exactly these keys, in one transaction.
    ///
    /// Returns the number of deleted entries. Missing keys are skipped.
    pub async fn delete_entries(&self, keys: Vec<String>) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut count = 0;
                {
                    let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1")?;
                    for key in &keys {
                        count += stmt.execute(params![key])? as u64;
                    }
                }
                tx.commit()?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    /// List stored keys in ascending order.
    pub async fn list_keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM cache_entries ORDER BY key")?;
                let keys = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entries(vec![("chameleo_products".to_string(), "[]".to_string())])
            .await
            .unwrap();

        let value = db.get_entry("chameleo_products").await.unwrap();
        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_entry("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entries(vec![("k".to_string(), "1".to_string())]).await.unwrap();
        db.put_entries(vec![("k".to_string(), "2".to_string())]).await.unwrap();

        assert_eq!(db.get_entry("k").await.unwrap().as_deref(), Some("2"));
        assert_eq!(db.list_keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_entries_matches_exact_keys() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entries(vec![
            ("chameleo_products".to_string(), "[]".to_string()),
            ("chameleo_last_sync".to_string(), "x".to_string()),
            ("chameleo_staging_products".to_string(), "[]".to_string()),
        ])
        .await
        .unwrap();

        let deleted = db
            .delete_entries(vec![
                "chameleo_products".to_string(),
                "chameleo_last_sync".to_string(),
                "chameleo_collections".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.list_keys().await.unwrap(), vec!["chameleo_staging_products".to_string()]);
    }
}
