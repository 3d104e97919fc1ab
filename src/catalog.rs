use crate::error::{Error, Result};
use crate::store::{ResultSet, Store};

/// A named, parameterless analysis over the `books` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQuery {
    pub name: &'static str,
    pub sql: &'static str,
    /// Result columns, in order.
    pub columns: &'static [&'static str],
    /// Row cap enforced by the SQL itself, for "Top N" style analyses.
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn run(&self, store: &Store) -> Result<ResultSet> {
        log::info!("running analysis \"{}\"", self.name);
        store.query(self.sql)
    }
}

// Year filters only accept four-digit years so "Unknown" never compares as
// a recent year.
pub static CATALOG: &[CatalogQuery] = &[
    CatalogQuery {
        name: "Availability of eBooks vs Physical Books",
        sql: "SELECT CASE WHEN is_ebook = 1 THEN 'eBook' ELSE 'Physical Book' END AS book_type, \
              COUNT(*) AS count FROM books GROUP BY is_ebook",
        columns: &["book_type", "count"],
        limit: None,
    },
    CatalogQuery {
        name: "Publisher with Most Books Published",
        sql: "SELECT publisher, COUNT(*) AS book_count FROM books GROUP BY publisher \
              ORDER BY book_count DESC, publisher LIMIT 1",
        columns: &["publisher", "book_count"],
        limit: Some(1),
    },
    CatalogQuery {
        name: "Publisher with Highest Average Rating",
        sql: "SELECT publisher, AVG(average_rating) AS avg_rating FROM books GROUP BY publisher \
              ORDER BY avg_rating DESC, publisher LIMIT 1",
        columns: &["publisher", "avg_rating"],
        limit: Some(1),
    },
    CatalogQuery {
        name: "Top 5 Most Expensive Books",
        sql: "SELECT title, amount_retail_price FROM books \
              ORDER BY amount_retail_price DESC, title LIMIT 5",
        columns: &["title", "amount_retail_price"],
        limit: Some(5),
    },
    CatalogQuery {
        name: "Books Published After 2010 with at Least 500 Pages",
        sql: "SELECT title, page_count FROM books \
              WHERE published_year GLOB '[0-9][0-9][0-9][0-9]' AND published_year > '2010' \
              AND page_count >= 500",
        columns: &["title", "page_count"],
        limit: None,
    },
    CatalogQuery {
        name: "Books with Discounts Greater than 20%",
        sql: "SELECT title, amount_list_price, amount_retail_price FROM books \
              WHERE amount_list_price > 0 \
              AND (amount_list_price - amount_retail_price) / amount_list_price > 0.2",
        columns: &["title", "amount_list_price", "amount_retail_price"],
        limit: None,
    },
    CatalogQuery {
        name: "Top 3 Authors with Most Books",
        sql: "SELECT authors, COUNT(*) AS book_count FROM books GROUP BY authors \
              ORDER BY book_count DESC, authors LIMIT 3",
        columns: &["authors", "book_count"],
        limit: Some(3),
    },
    CatalogQuery {
        name: "Books with More than 3 Authors",
        sql: "SELECT title, authors FROM books \
              WHERE LENGTH(authors) - LENGTH(REPLACE(authors, ',', '')) + 1 > 3",
        columns: &["title", "authors"],
        limit: None,
    },
    CatalogQuery {
        name: "Books Published in the Last 5 Years",
        sql: "SELECT title, published_year FROM books \
              WHERE published_year GLOB '[0-9][0-9][0-9][0-9]' \
              AND CAST(published_year AS INTEGER) >= CAST(strftime('%Y', 'now') AS INTEGER) - 5",
        columns: &["title", "published_year"],
        limit: None,
    },
    CatalogQuery {
        name: "Top 3 Most Popular Books by Rating",
        sql: "SELECT title, average_rating FROM books \
              ORDER BY average_rating DESC, title LIMIT 3",
        columns: &["title", "average_rating"],
        limit: Some(3),
    },
    CatalogQuery {
        name: "Top 5 Most Expensive eBooks",
        sql: "SELECT title, amount_retail_price FROM books WHERE is_ebook = 1 \
              ORDER BY amount_retail_price DESC, title LIMIT 5",
        columns: &["title", "amount_retail_price"],
        limit: Some(5),
    },
    CatalogQuery {
        name: "Top 5 Books by Ratings Count",
        sql: "SELECT title, ratings_count FROM books \
              ORDER BY ratings_count DESC, title LIMIT 5",
        columns: &["title", "ratings_count"],
        limit: Some(5),
    },
    CatalogQuery {
        name: "Books with Missing Descriptions",
        sql: "SELECT title FROM books WHERE description = 'No description available.'",
        columns: &["title"],
        limit: None,
    },
    CatalogQuery {
        name: "Books with Missing Images",
        sql: "SELECT title FROM books WHERE image_link = ''",
        columns: &["title"],
        limit: None,
    },
    CatalogQuery {
        name: "Books with a Rating Below 3",
        sql: "SELECT title FROM books WHERE average_rating < 3",
        columns: &["title"],
        limit: None,
    },
    CatalogQuery {
        name: "Books by Publisher with the Most Ratings",
        sql: "SELECT publisher, SUM(ratings_count) AS total_ratings FROM books \
              GROUP BY publisher ORDER BY total_ratings DESC, publisher LIMIT 1",
        columns: &["publisher", "total_ratings"],
        limit: Some(1),
    },
    CatalogQuery {
        name: "Books Over 1000 Pages",
        sql: "SELECT title, page_count FROM books WHERE page_count > 1000",
        columns: &["title", "page_count"],
        limit: None,
    },
    CatalogQuery {
        name: "Top 5 Books by Category",
        sql: "SELECT categories, COUNT(*) AS book_count FROM books GROUP BY categories \
              ORDER BY book_count DESC, categories LIMIT 5",
        columns: &["categories", "book_count"],
        limit: Some(5),
    },
    CatalogQuery {
        name: "Top 3 Publishers with the Most eBooks",
        sql: "SELECT publisher, COUNT(*) AS ebook_count FROM books WHERE is_ebook = 1 \
              GROUP BY publisher ORDER BY ebook_count DESC, publisher LIMIT 3",
        columns: &["publisher", "ebook_count"],
        limit: Some(3),
    },
    CatalogQuery {
        name: "Most Expensive Books by Publisher",
        sql: "SELECT publisher, MAX(amount_retail_price) AS max_retail_price FROM books \
              GROUP BY publisher ORDER BY max_retail_price DESC, publisher LIMIT 1",
        columns: &["publisher", "max_retail_price"],
        limit: Some(1),
    },
];

pub fn find(name: &str) -> Option<&'static CatalogQuery> {
    CATALOG.iter().find(|query| query.name == name)
}

pub fn lookup(name: &str) -> Result<&'static CatalogQuery> {
    find(name).ok_or_else(|| Error::UnknownQuery(name.to_string()))
}

pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|query| query.name)
}
