use anyhow::Result;
use chrono::{DateTime, Utc};
use libsql::Connection;

use crate::model::{Book, RatedBook, Review};

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub published_date: String,
}

/// Data access for books and reviews.
pub struct Catalog<'a> {
    conn: &'a Connection,
}

impl<'a> Catalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_book(&self, input: CreateBook) -> Result<Book> {
        let query = r#"
            INSERT INTO books (title, author, published_date)
            VALUES (?, ?, ?)
            RETURNING id, title, author, published_date
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![input.title, input.author, input.published_date],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(self.row_to_book(&row)?)
        } else {
            anyhow::bail!("Failed to create book")
        }
    }

    pub async fn get_book(&self, id: i32) -> Result<Option<Book>> {
        let query = r#"
            SELECT id, title, author, published_date
            FROM books WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_book(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Full catalog in insertion order, no pagination.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let query = r#"
            SELECT id, title, author, published_date
            FROM books
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut books = Vec::new();

        while let Some(row) = rows.next().await? {
            books.push(self.row_to_book(&row)?);
        }

        Ok(books)
    }

    /// Substring match on title OR author. SQLite's LIKE is ASCII
    /// case-insensitive, which is the search contract here.
    pub async fn search_books(&self, query_str: &str) -> Result<Vec<Book>> {
        let query = r#"
            SELECT id, title, author, published_date
            FROM books
            WHERE title LIKE ? OR author LIKE ?
        "#;

        let pattern = format!("%{}%", query_str);
        let mut rows = self
            .conn
            .query(query, libsql::params![pattern.clone(), pattern])
            .await?;
        let mut books = Vec::new();

        while let Some(row) = rows.next().await? {
            books.push(self.row_to_book(&row)?);
        }

        Ok(books)
    }

    /// Inserts a review for an existing book. Returns `None` when the book
    /// id is unknown. `created_at` is assigned by the store.
    pub async fn create_review(
        &self,
        book_id: i32,
        user_id: i32,
        content: &str,
        rating: i32,
    ) -> Result<Option<Review>> {
        if self.get_book(book_id).await?.is_none() {
            return Ok(None);
        }

        let query = r#"
            INSERT INTO reviews (book_id, user_id, content, rating)
            VALUES (?, ?, ?, ?)
            RETURNING id, content, rating, user_id, created_at
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![book_id, user_id, content, rating])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_review(&row)?))
        } else {
            anyhow::bail!("Failed to create review")
        }
    }

    pub async fn list_reviews(&self, book_id: i32) -> Result<Vec<Review>> {
        let query = r#"
            SELECT id, content, rating, user_id, created_at
            FROM reviews
            WHERE book_id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![book_id]).await?;
        let mut reviews = Vec::new();

        while let Some(row) = rows.next().await? {
            reviews.push(self.row_to_review(&row)?);
        }

        Ok(reviews)
    }

    /// Ranks books by mean review rating, descending. Books with no reviews
    /// never appear (inner join); ties break by ascending book id so the
    /// ordering is deterministic. Averages are rounded to 2 decimal places.
    pub async fn top_rated(&self, limit: u32) -> Result<Vec<RatedBook>> {
        let query = r#"
            SELECT
                books.id,
                books.title,
                books.author,
                books.published_date,
                AVG(reviews.rating) as avg_rating
            FROM books
            JOIN reviews ON reviews.book_id = books.id
            GROUP BY books.id, books.title, books.author, books.published_date
            ORDER BY avg_rating DESC, books.id ASC
            LIMIT ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![limit as i32]).await?;
        let mut ranked = Vec::new();

        while let Some(row) = rows.next().await? {
            let book = self.row_to_book(&row)?;
            let avg_rating: f64 = row.get(4)?;
            ranked.push(RatedBook {
                book,
                average_rating: (avg_rating * 100.0).round() / 100.0,
            });
        }

        Ok(ranked)
    }

    fn row_to_book(&self, row: &libsql::Row) -> Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            published_date: row.get(3)?,
        })
    }

    fn row_to_review(&self, row: &libsql::Row) -> Result<Review> {
        let created_at: String = row.get(4)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| anyhow::anyhow!("failed to parse created_at: {e}"))?
            .with_timezone(&Utc);

        Ok(Review {
            id: row.get(0)?,
            content: row.get(1)?,
            rating: row.get(2)?,
            user_id: row.get(3)?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Accounts;
    use crate::db::Database;

    async fn seed_user(db: &Database) -> i32 {
        Accounts::new(db.connection())
            .create_user("reviewer", "hash")
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn seed_book(catalog: &Catalog<'_>, title: &str, author: &str) -> Book {
        catalog
            .create_book(CreateBook {
                title: title.to_string(),
                author: author.to_string(),
                published_date: "1965-08-01".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_books_returns_everything_in_insertion_order() {
        let db = Database::in_memory().await.unwrap();
        let catalog = Catalog::new(db.connection());

        seed_book(&catalog, "Dune", "Frank Herbert").await;
        seed_book(&catalog, "The Hobbit", "J.R.R. Tolkien").await;

        let books = catalog.list_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[1].title, "The Hobbit");
    }

    #[tokio::test]
    async fn search_matches_title_and_author_case_insensitively() {
        let db = Database::in_memory().await.unwrap();
        let catalog = Catalog::new(db.connection());

        seed_book(&catalog, "The Hobbit", "J.R.R. Tolkien").await;
        seed_book(&catalog, "Tolkien: Maker of Middle-earth", "Catherine McIlwaine").await;
        seed_book(&catalog, "Dune", "Frank Herbert").await;

        let hits = catalog.search_books("tolkien").await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = catalog.search_books("HERBERT").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Dune");

        let hits = catalog.search_books("austen").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn create_review_returns_none_for_unknown_book() {
        let db = Database::in_memory().await.unwrap();
        let user_id = seed_user(&db).await;
        let catalog = Catalog::new(db.connection());

        let review = catalog.create_review(42, user_id, "Great", 5).await.unwrap();
        assert!(review.is_none());
    }

    #[tokio::test]
    async fn list_reviews_is_scoped_to_the_requested_book() {
        let db = Database::in_memory().await.unwrap();
        let user_id = seed_user(&db).await;
        let catalog = Catalog::new(db.connection());

        let dune = seed_book(&catalog, "Dune", "Frank Herbert").await;
        let hobbit = seed_book(&catalog, "The Hobbit", "J.R.R. Tolkien").await;

        catalog.create_review(dune.id, user_id, "Great", 5).await.unwrap();
        catalog.create_review(dune.id, user_id, "Re-read it", 4).await.unwrap();
        catalog.create_review(hobbit.id, user_id, "Fine", 3).await.unwrap();

        let reviews = catalog.list_reviews(dune.id).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.user_id == user_id));

        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![5, 4]);
    }

    #[tokio::test]
    async fn top_rated_excludes_unreviewed_books_and_rounds_averages() {
        let db = Database::in_memory().await.unwrap();
        let user_id = seed_user(&db).await;
        let catalog = Catalog::new(db.connection());

        let dune = seed_book(&catalog, "Dune", "Frank Herbert").await;
        let hobbit = seed_book(&catalog, "The Hobbit", "J.R.R. Tolkien").await;
        seed_book(&catalog, "Unreviewed", "Nobody").await;

        for rating in [4, 5] {
            catalog.create_review(dune.id, user_id, "Good", rating).await.unwrap();
        }
        for rating in [3, 4, 4] {
            catalog.create_review(hobbit.id, user_id, "Fine", rating).await.unwrap();
        }

        let ranked = catalog.top_rated(5).await.unwrap();
        assert_eq!(ranked.len(), 2);

        assert_eq!(ranked[0].book.id, dune.id);
        assert_eq!(ranked[0].average_rating, 4.5);

        // 11 / 3 = 3.666..., rounded to exactly two decimals
        assert_eq!(ranked[1].book.id, hobbit.id);
        assert_eq!(ranked[1].average_rating, 3.67);
    }

    #[tokio::test]
    async fn top_rated_truncates_to_the_limit_with_id_tiebreak() {
        let db = Database::in_memory().await.unwrap();
        let user_id = seed_user(&db).await;
        let catalog = Catalog::new(db.connection());

        let mut ids = Vec::new();
        for n in 0..7 {
            let book = seed_book(&catalog, &format!("Book {n}"), "Author").await;
            catalog.create_review(book.id, user_id, "Same", 5).await.unwrap();
            ids.push(book.id);
        }

        let ranked = catalog.top_rated(5).await.unwrap();
        assert_eq!(ranked.len(), 5);

        // all averages tie at 5.0, so the lowest five ids win, in order
        let ranked_ids: Vec<i32> = ranked.iter().map(|r| r.book.id).collect();
        assert_eq!(ranked_ids, ids[..5].to_vec());
    }
}
