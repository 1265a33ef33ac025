use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub published_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i32,
    pub content: String,
    pub rating: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A book paired with the mean of its review ratings. `average_rating` is
/// already rounded to 2 decimal places when it leaves the catalog layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedBook {
    #[serde(flatten)]
    pub book: Book,
    pub average_rating: f64,
}
