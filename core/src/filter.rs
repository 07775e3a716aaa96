//! Client-side narrowing of an already-fetched book list.

use crate::types::{Book, BookQuery};

/// Case-insensitive substring filter over title, genre and author.
///
/// An empty title matches every title; empty genre or author filters are
/// no-ops on their axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: String,
    pub genre: String,
    pub author: String,
}

impl BookFilter {
    pub fn new(title: impl Into<String>, genre: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            author: author.into(),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        contains_ignore_case(&book.title, &self.title)
            && (self.genre.is_empty() || contains_ignore_case(&book.genre, &self.genre))
            && (self.author.is_empty() || contains_ignore_case(&book.author, &self.author))
    }

    /// Matching books, in input order.
    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        books.iter().filter(|book| self.matches(book)).cloned().collect()
    }

    /// Server-side query for the search action. Genre and author are sent
    /// exactly as typed, empty strings included.
    pub fn server_query(&self) -> BookQuery {
        BookQuery::new()
            .genre(self.genre.clone())
            .author(self.author.clone())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
