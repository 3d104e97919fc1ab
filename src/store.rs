use rusqlite::{params, Connection};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::models::BookRecord;

const CURRENT_DB_VERSION: u32 = 1;

const BOOKS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS books (
    book_id TEXT PRIMARY KEY,
    title TEXT,
    subtitle TEXT,
    authors TEXT,
    description TEXT,
    categories TEXT,
    page_count INTEGER,
    language TEXT,
    image_link TEXT,
    average_rating REAL,
    ratings_count INTEGER,
    publisher TEXT,
    published_year TEXT,
    is_ebook INTEGER,
    saleability TEXT,
    amount_list_price REAL,
    currency_code_list_price TEXT,
    amount_retail_price REAL,
    currency_code_retail_price TEXT,
    buy_link TEXT,
    country TEXT
)";

const BOOK_COLUMNS: &str = "book_id, title, subtitle, authors, description, categories, \
    page_count, language, image_link, average_rating, ratings_count, publisher, \
    published_year, is_ebook, saleability, amount_list_price, currency_code_list_price, \
    amount_retail_price, currency_code_retail_price, buy_link, country";

const INSERT_BOOK_SQL: &str = "INSERT INTO books (book_id, title, subtitle, authors, description, \
    categories, page_count, language, image_link, average_rating, ratings_count, publisher, \
    published_year, is_ebook, saleability, amount_list_price, currency_code_list_price, \
    amount_retail_price, currency_code_retail_price, buy_link, country)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)";

const UPSERT_BOOK_SQL: &str = "INSERT INTO books (book_id, title, subtitle, authors, description, \
    categories, page_count, language, image_link, average_rating, ratings_count, publisher, \
    published_year, is_ebook, saleability, amount_list_price, currency_code_list_price, \
    amount_retail_price, currency_code_retail_price, buy_link, country)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
    ON CONFLICT(book_id) DO UPDATE SET
        title = excluded.title,
        subtitle = excluded.subtitle,
        authors = excluded.authors,
        description = excluded.description,
        categories = excluded.categories,
        page_count = excluded.page_count,
        language = excluded.language,
        image_link = excluded.image_link,
        average_rating = excluded.average_rating,
        ratings_count = excluded.ratings_count,
        publisher = excluded.publisher,
        published_year = excluded.published_year,
        is_ebook = excluded.is_ebook,
        saleability = excluded.saleability,
        amount_list_price = excluded.amount_list_price,
        currency_code_list_price = excluded.currency_code_list_price,
        amount_retail_price = excluded.amount_retail_price,
        currency_code_retail_price = excluded.currency_code_retail_price,
        buy_link = excluded.buy_link,
        country = excluded.country";

/// What `append` does with a record whose `book_id` is already stored.
/// Records without an id never collide.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Refresh the stored row with the newly fetched values.
    #[default]
    Upsert,
    /// Fail the whole batch.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendStats {
    pub inserted: usize,
    pub updated: usize,
}

/// Rows returned by a read-only query, columns in query order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// One row as (column, value) pairs.
    pub fn row(&self, row: usize) -> Option<Vec<(&str, &Value)>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
        )
    }
}

pub struct Store {
    conn: Connection,
    policy: DuplicatePolicy,
}

impl Store {
    pub fn open(path: &Path, policy: DuplicatePolicy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn, policy })
    }

    pub fn open_in_memory(policy: DuplicatePolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, policy })
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Create the `books` table if needed. Safe to run on every start.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(BOOKS_TABLE_SQL)?;
        let version: u32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < CURRENT_DB_VERSION {
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {}", CURRENT_DB_VERSION))?;
        }
        Ok(())
    }

    /// Write a batch in one transaction. A failed batch leaves no rows behind.
    pub fn append(&mut self, records: &[BookRecord]) -> Result<AppendStats> {
        let policy = self.policy;
        let tx = self.conn.transaction()?;
        let mut stats = AppendStats::default();
        {
            let mut exists = tx.prepare("SELECT 1 FROM books WHERE book_id = ?1")?;
            let mut insert = tx.prepare(INSERT_BOOK_SQL)?;
            let mut upsert = tx.prepare(UPSERT_BOOK_SQL)?;

            for record in records {
                let existing = match record.book_id.as_deref() {
                    Some(id) => exists.exists(params![id])?,
                    None => false,
                };
                if !existing {
                    insert.execute(book_params(record).as_slice())?;
                    stats.inserted += 1;
                    continue;
                }
                match policy {
                    DuplicatePolicy::Upsert => {
                        upsert.execute(book_params(record).as_slice())?;
                        stats.updated += 1;
                    }
                    DuplicatePolicy::Reject => {
                        let id = record.book_id.clone().unwrap_or_default();
                        log::warn!("rejecting batch: book {} is already stored", id);
                        return Err(Error::DuplicateBook(id));
                    }
                }
            }
        }
        tx.commit()?;

        log::info!(
            "stored books inserted={} updated={}",
            stats.inserted,
            stats.updated
        );
        Ok(stats)
    }

    /// Run a read-only statement and collect every row.
    pub fn query(&self, sql: &str) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(Error::ReadOnly(sql.trim().to_string()));
        }
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|index| row.get::<_, Value>(index))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ResultSet { columns, rows })
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Every stored book, in insertion order.
    pub fn books(&self) -> Result<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM books ORDER BY rowid", BOOK_COLUMNS))?;
        let books = stmt
            .query_map([], |row| {
                Ok(BookRecord {
                    book_id: row.get(0)?,
                    title: row.get(1)?,
                    subtitle: row.get(2)?,
                    authors: row.get(3)?,
                    description: row.get(4)?,
                    categories: row.get(5)?,
                    page_count: row.get(6)?,
                    language: row.get(7)?,
                    image_link: row.get(8)?,
                    average_rating: row.get(9)?,
                    ratings_count: row.get(10)?,
                    publisher: row.get(11)?,
                    published_year: row.get(12)?,
                    is_ebook: row.get(13)?,
                    saleability: row.get(14)?,
                    amount_list_price: row.get(15)?,
                    currency_code_list_price: row.get(16)?,
                    amount_retail_price: row.get(17)?,
                    currency_code_retail_price: row.get(18)?,
                    buy_link: row.get(19)?,
                    country: row.get(20)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }
}

fn book_params(record: &BookRecord) -> Vec<&dyn rusqlite::ToSql> {
    vec![
        &record.book_id as &dyn rusqlite::ToSql,
        &record.title,
        &record.subtitle,
        &record.authors,
        &record.description,
        &record.categories,
        &record.page_count,
        &record.language,
        &record.image_link,
        &record.average_rating,
        &record.ratings_count,
        &record.publisher,
        &record.published_year,
        &record.is_ebook,
        &record.saleability,
        &record.amount_list_price,
        &record.currency_code_list_price,
        &record.amount_retail_price,
        &record.currency_code_retail_price,
        &record.buy_link,
        &record.country,
    ]
}

#[cfg(test)]
mod tests {
    use super::{DuplicatePolicy, Store, Value};
    use crate::error::Error;
    use crate::models::fixtures::book;
    use crate::models::BookRecord;

    fn store(policy: DuplicatePolicy) -> Store {
        let store = Store::open_in_memory(policy).expect("open store");
        store.init_schema().expect("init schema");
        store
    }

    fn table_layout(store: &Store) -> Vec<(String, String, i64)> {
        let info = store
            .query("SELECT name, type, pk FROM pragma_table_info('books')")
            .expect("table info");
        info.rows
            .iter()
            .map(|row| match row.as_slice() {
                [Value::Text(name), Value::Text(kind), Value::Integer(pk)] => {
                    (name.clone(), kind.clone(), *pk)
                }
                other => panic!("unexpected table_info row {:?}", other),
            })
            .collect()
    }

    #[test]
    fn schema_has_expected_columns() {
        let store = store(DuplicatePolicy::Upsert);
        let layout = table_layout(&store);
        assert_eq!(layout.len(), 21);
        assert_eq!(layout[0], ("book_id".to_string(), "TEXT".to_string(), 1));
        let kind_of = |name: &str| {
            layout
                .iter()
                .find(|(column, _, _)| column == name)
                .map(|(_, kind, _)| kind.clone())
                .unwrap_or_default()
        };
        assert_eq!(kind_of("page_count"), "INTEGER");
        assert_eq!(kind_of("is_ebook"), "INTEGER");
        assert_eq!(kind_of("average_rating"), "REAL");
        assert_eq!(kind_of("amount_retail_price"), "REAL");
        assert_eq!(kind_of("country"), "TEXT");
    }

    #[test]
    fn init_schema_is_idempotent() {
        let store = store(DuplicatePolicy::Upsert);
        let before = table_layout(&store);
        store.init_schema().expect("second init");
        assert_eq!(table_layout(&store), before);
        let version = store
            .query("SELECT user_version FROM pragma_user_version")
            .expect("version");
        assert_eq!(version.rows[0][0], Value::Integer(1));
    }

    #[test]
    fn append_adds_one_row_per_record() {
        let mut store = store(DuplicatePolicy::Reject);
        store.append(&[book("a")]).expect("seed");
        let before = store.count().expect("count");
        let stats = store
            .append(&[book("b"), book("c"), book("d")])
            .expect("append");
        assert_eq!(stats.inserted, 3);
        assert_eq!(store.count().expect("count"), before + 3);
    }

    #[test]
    fn upsert_refreshes_existing_rows() {
        let mut store = store(DuplicatePolicy::Upsert);
        store.append(&[book("a"), book("b")]).expect("seed");

        let mut refreshed = book("a");
        refreshed.title = "Second Edition".to_string();
        refreshed.ratings_count = 99;
        let stats = store
            .append(&[refreshed.clone(), book("c")])
            .expect("upsert");

        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(store.count().expect("count"), 3);
        let books = store.books().expect("books");
        assert_eq!(books[0], refreshed);
    }

    #[test]
    fn reject_rolls_back_the_whole_batch() {
        let mut store = store(DuplicatePolicy::Reject);
        store.append(&[book("a")]).expect("seed");

        let err = store
            .append(&[book("b"), book("a")])
            .expect_err("duplicate should be rejected");
        assert!(matches!(err, Error::DuplicateBook(ref id) if id == "a"));
        assert_eq!(store.count().expect("count"), 1);

        let err = store
            .append(&[book("x"), book("x")])
            .expect_err("duplicate within a batch");
        assert!(matches!(err, Error::DuplicateBook(_)));
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn records_without_id_are_always_inserted() {
        let mut store = store(DuplicatePolicy::Reject);
        let anonymous = BookRecord::default();
        let stats = store
            .append(&[anonymous.clone(), anonymous])
            .expect("append");
        assert_eq!(stats.inserted, 2);
        assert_eq!(store.count().expect("count"), 2);
    }

    #[test]
    fn books_round_trip_every_column() {
        let mut store = store(DuplicatePolicy::Upsert);
        let mut record = book("full");
        record.subtitle = "A Subtitle".to_string();
        record.currency_code_list_price = "EUR".to_string();
        record.buy_link = "https://example.com/buy".to_string();
        store.append(&[record.clone()]).expect("append");
        assert_eq!(store.books().expect("books"), vec![record]);
    }

    #[test]
    fn query_keeps_column_order() {
        let mut store = store(DuplicatePolicy::Upsert);
        store.append(&[book("a")]).expect("append");
        let result = store
            .query("SELECT publisher, title, book_id FROM books")
            .expect("query");
        assert_eq!(result.columns, vec!["publisher", "title", "book_id"]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(0, "book_id"), Some(&Value::Text("a".to_string())));
        let row = result.row(0).expect("row");
        assert_eq!(row[0].0, "publisher");
        assert_eq!(row[2].1, &Value::Text("a".to_string()));
    }

    #[test]
    fn query_refuses_writes() {
        let mut store = store(DuplicatePolicy::Upsert);
        store.append(&[book("a")]).expect("append");
        let err = store.query("DELETE FROM books").expect_err("write");
        assert!(matches!(err, Error::ReadOnly(_)));
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("books.db");
        {
            let mut store = Store::open(&path, DuplicatePolicy::Upsert).expect("open");
            store.init_schema().expect("init");
            store.append(&[book("persisted")]).expect("append");
        }
        let store = Store::open(&path, DuplicatePolicy::Upsert).expect("reopen");
        store.init_schema().expect("init again");
        assert_eq!(store.count().expect("count"), 1);
    }
}
