use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::model::{Product, StorageError, StoredProduct};

/// Append-only store of normalized products. Rows are inserted per search
/// run, never updated, and only removed by [`ProductStore::delete_older_than`].
pub struct ProductStore {
    conn: Connection,
    path: String,
}

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total_products: i64,
    pub products_per_store: HashMap<String, i64>,
    pub unique_search_terms: i64,
    pub most_recent_scrape: Option<DateTime<Utc>>,
    pub database_path: String,
}

impl ProductStore {
    /// Opens the database and runs migrations. A failure here is fatal to
    /// startup; nothing later in the pipeline is.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    fn migrate(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                store TEXT NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                volume TEXT,
                image TEXT,
                link TEXT,
                price_per_liter REAL,
                liter_value REAL,
                unit_count INTEGER,
                unit_size REAL,
                unit_type TEXT,
                price_per_unit REAL,
                search_term TEXT,
                scraped_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_store ON products(store);
            CREATE INDEX IF NOT EXISTS idx_search_term ON products(search_term);
            CREATE INDEX IF NOT EXISTS idx_scraped_at ON products(scraped_at);
            CREATE INDEX IF NOT EXISTS idx_store_name ON products(store, name);
            ",
        )?;
        Ok(())
    }

    /// Inserts one row per product. A row that fails to insert is logged
    /// and skipped; the batch and the run carry on. Returns the number of
    /// rows actually saved.
    pub fn save_batch(&self, products: &[Product], search_term: &str) -> usize {
        let now = Utc::now();
        let mut saved = 0;

        for product in products {
            let result = self.conn.execute(
                "INSERT INTO products (
                    store, name, price, volume, image, link,
                    price_per_liter, liter_value, unit_count, unit_size, unit_type, price_per_unit,
                    search_term, scraped_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    &product.store,
                    &product.name,
                    product.price,
                    &product.volume,
                    &product.image,
                    &product.link,
                    product.price_per_liter,
                    product.liter_value,
                    product.unit_count,
                    product.unit_size,
                    &product.unit_type,
                    product.price_per_unit,
                    search_term,
                    now,
                    now,
                ],
            );
            match result {
                Ok(_) => saved += 1,
                Err(e) => warn!(product = %product.name, error = %e, "failed to save product"),
            }
        }

        saved
    }

    pub fn by_search_term(
        &self,
        search_term: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredProduct>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, store, name, price, volume, image, link,
                    price_per_liter, liter_value, unit_count, unit_size, unit_type, price_per_unit,
                    search_term, scraped_at, updated_at
             FROM products WHERE search_term = ?1
             ORDER BY scraped_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![search_term, limit as i64, offset as i64], Self::map_product)?;
        rows.collect::<Result<_, _>>().map_err(StorageError::from)
    }

    pub fn by_store(
        &self,
        store: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredProduct>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, store, name, price, volume, image, link,
                    price_per_liter, liter_value, unit_count, unit_size, unit_type, price_per_unit,
                    search_term, scraped_at, updated_at
             FROM products WHERE store = ?1
             ORDER BY scraped_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![store, limit as i64, offset as i64], Self::map_product)?;
        rows.collect::<Result<_, _>>().map_err(StorageError::from)
    }

    pub fn all(&self, limit: usize, offset: usize) -> Result<Vec<StoredProduct>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, store, name, price, volume, image, link,
                    price_per_liter, liter_value, unit_count, unit_size, unit_type, price_per_unit,
                    search_term, scraped_at, updated_at
             FROM products
             ORDER BY scraped_at DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], Self::map_product)?;
        rows.collect::<Result<_, _>>().map_err(StorageError::from)
    }

    /// Deletes rows scraped more than `days` days ago; returns how many.
    pub fn delete_older_than(&self, days: u32) -> Result<usize, StorageError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let deleted = self
            .conn
            .execute("DELETE FROM products WHERE scraped_at < ?1", params![cutoff])?;
        Ok(deleted)
    }

    pub fn stats(&self) -> Result<StoreStats, StorageError> {
        let total_products: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT store, COUNT(*) FROM products GROUP BY store ORDER BY COUNT(*) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let products_per_store = rows.collect::<Result<HashMap<_, _>, _>>()?;

        let unique_search_terms: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT search_term) FROM products",
            [],
            |row| row.get(0),
        )?;

        let most_recent_scrape: Option<DateTime<Utc>> = self.conn.query_row(
            "SELECT MAX(scraped_at) FROM products",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            total_products,
            products_per_store,
            unique_search_terms,
            most_recent_scrape,
            database_path: self.path.clone(),
        })
    }

    fn map_product(row: &Row) -> Result<StoredProduct, rusqlite::Error> {
        Ok(StoredProduct {
            id: row.get(0)?,
            store: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
            volume: row.get(4)?,
            image: row.get(5)?,
            link: row.get(6)?,
            price_per_liter: row.get(7)?,
            liter_value: row.get(8)?,
            unit_count: row.get(9)?,
            unit_size: row.get(10)?,
            unit_type: row.get(11)?,
            price_per_unit: row.get(12)?,
            search_term: row.get(13)?,
            scraped_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Product;

    fn store() -> ProductStore {
        ProductStore::open(":memory:").unwrap()
    }

    fn product(store_name: &str, name: &str, price_per_liter: f64) -> Product {
        Product {
            store: store_name.to_string(),
            name: name.to_string(),
            price: 1.99,
            volume: "33cl".to_string(),
            image: String::new(),
            link: String::new(),
            logo: String::new(),
            price_per_liter,
            liter_value: 0.33,
            unit_count: 1,
            unit_size: 33.0,
            unit_type: "CL".to_string(),
            price_per_unit: 1.99,
        }
    }

    #[test]
    fn saves_and_reads_back_a_batch() {
        let db = store();
        let saved = db.save_batch(
            &[product("Aldi", "Duvel 33cl", 6.0), product("Lidl", "Duvel 33cl", 5.5)],
            "duvel",
        );
        assert_eq!(saved, 2);

        let rows = db.by_search_term("duvel", 100, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].search_term, "duvel");
        assert_eq!(rows[0].scraped_at, rows[0].updated_at);

        assert!(db.by_search_term("jupiler", 100, 0).unwrap().is_empty());
    }

    #[test]
    fn filters_by_store_and_paginates() {
        let db = store();
        db.save_batch(
            &[
                product("Aldi", "Duvel 33cl", 6.0),
                product("Aldi", "Duvel 4x33cl", 5.8),
                product("Lidl", "Duvel 33cl", 5.5),
            ],
            "duvel",
        );

        assert_eq!(db.by_store("Aldi", 100, 0).unwrap().len(), 2);
        assert_eq!(db.by_store("Lidl", 100, 0).unwrap().len(), 1);
        assert_eq!(db.all(2, 0).unwrap().len(), 2);
        assert_eq!(db.all(2, 2).unwrap().len(), 1);
    }

    #[test]
    fn save_batch_skips_rows_that_fail_to_insert() {
        let db = store();
        // Make one specific row fail at insert time.
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_one BEFORE INSERT ON products
                 WHEN NEW.name = 'Duvel vat 5l'
                 BEGIN SELECT RAISE(ABORT, 'rejected by trigger'); END;",
            )
            .unwrap();

        let saved = db.save_batch(
            &[
                product("Aldi", "Duvel 33cl", 6.0),
                product("Aldi", "Duvel vat 5l", 4.4),
                product("Lidl", "Duvel 4x33cl", 5.8),
            ],
            "duvel",
        );
        assert_eq!(saved, 2);

        let rows = db.by_search_term("duvel", 100, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.name != "Duvel vat 5l"));

        // A batch where every insert fails still returns cleanly.
        db.conn.execute_batch("DROP TABLE products;").unwrap();
        assert_eq!(db.save_batch(&[product("Aldi", "Duvel 33cl", 6.0)], "duvel"), 0);
    }

    #[test]
    fn retention_deletes_only_old_rows() {
        let db = store();
        db.save_batch(&[product("Aldi", "Duvel 33cl", 6.0)], "duvel");

        // Age one row beyond the retention window.
        let old = Utc::now() - Duration::days(30);
        db.conn
            .execute(
                "INSERT INTO products (store, name, price, search_term, scraped_at, updated_at)
                 VALUES ('Lidl', 'Oude Geuze', 4.5, 'geuze', ?1, ?1)",
                params![old],
            )
            .unwrap();

        let deleted = db.delete_older_than(7).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.all(100, 0).unwrap().len(), 1);
        assert_eq!(db.all(100, 0).unwrap()[0].store, "Aldi");
    }

    #[test]
    fn stats_aggregate_the_table() {
        let db = store();
        let empty = db.stats().unwrap();
        assert_eq!(empty.total_products, 0);
        assert!(empty.most_recent_scrape.is_none());

        db.save_batch(
            &[
                product("Aldi", "Duvel 33cl", 6.0),
                product("Aldi", "Duvel 4x33cl", 5.8),
                product("Lidl", "Duvel 33cl", 5.5),
            ],
            "duvel",
        );
        db.save_batch(&[product("Aldi", "Jupiler 25cl", 4.0)], "jupiler");

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.products_per_store["Aldi"], 3);
        assert_eq!(stats.products_per_store["Lidl"], 1);
        assert_eq!(stats.unique_search_terms, 2);
        assert!(stats.most_recent_scrape.is_some());
    }
}
