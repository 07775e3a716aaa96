//! Screen state as values.
//!
//! Each transition consumes the current state and returns the next one; the
//! rendering layer decides when to redraw.

use crate::api::BookApi;
use crate::error::ApiError;
use crate::filter::BookFilter;
use crate::types::{parse_page_count, Book, BookFormData, BookQuery};

/// State behind the book list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListState {
    books: Vec<Book>,
    filter: BookFilter,
    filter_open: bool,
}

impl BookListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded books, e.g. after `fetch_books`.
    pub fn with_books(self, books: Vec<Book>) -> Self {
        Self { books, ..self }
    }

    pub fn with_filter(self, filter: BookFilter) -> Self {
        Self { filter, ..self }
    }

    pub fn toggle_filter(self) -> Self {
        Self {
            filter_open: !self.filter_open,
            ..self
        }
    }

    /// Drop a book after it was deleted on the backend.
    pub fn without_book(mut self, id: &str) -> Self {
        self.books.retain(|book| book.id() != Some(id));
        self
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn filter(&self) -> &BookFilter {
        &self.filter
    }

    pub fn filter_open(&self) -> bool {
        self.filter_open
    }

    /// The books to display: the loaded list narrowed by the filter.
    pub fn visible(&self) -> Vec<Book> {
        self.filter.apply(&self.books)
    }

    /// Query for the explicit search action. The client-side filter still
    /// applies to whatever comes back.
    pub fn search_query(&self) -> BookQuery {
        self.filter.server_query()
    }
}

/// Whether the form creates a new book or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { book_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Genre,
    Description,
    TotalPages,
}

/// State behind the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFormState {
    mode: FormMode,
    data: BookFormData,
}

impl BookFormState {
    /// Blank form; page count starts at 0.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            data: BookFormData::default(),
        }
    }

    pub fn edit(book_id: impl Into<String>, data: BookFormData) -> Result<Self, ApiError> {
        let book_id = book_id.into();
        if book_id.trim().is_empty() {
            return Err(ApiError::MissingBookId);
        }
        Ok(Self {
            mode: FormMode::Edit { book_id },
            data,
        })
    }

    /// Edit form prefilled from a fetched book.
    pub fn from_book(book: &Book) -> Result<Self, ApiError> {
        let id = book.id().ok_or(ApiError::MissingBookId)?;
        Self::edit(id, book.form_data())
    }

    /// Apply one keystroke-level change. Page count text is coerced to an
    /// integer immediately.
    pub fn with_field(mut self, field: BookField, value: &str) -> Self {
        match field {
            BookField::Title => self.data.title = value.to_string(),
            BookField::Author => self.data.author = value.to_string(),
            BookField::Genre => self.data.genre = value.to_string(),
            BookField::Description => self.data.description = value.to_string(),
            BookField::TotalPages => self.data.total_pages = parse_page_count(value),
        }
        self
    }

    /// Clear the fields, keeping the mode.
    pub fn reset(self) -> Self {
        Self {
            data: BookFormData::default(),
            ..self
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn data(&self) -> &BookFormData {
        &self.data
    }

    /// Send the form: create in `Create` mode, update in `Edit` mode.
    pub async fn submit(&self, api: &BookApi) -> Result<Book, ApiError> {
        match &self.mode {
            FormMode::Create => api.create_book(&self.data).await,
            FormMode::Edit { book_id } => api.update_book(book_id, &self.data).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, title: &str, genre: &str) -> Book {
        Book {
            id: Some(id.to_string()),
            title: title.to_string(),
            author: "Anon".to_string(),
            genre: genre.to_string(),
            ..Book::default()
        }
    }

    #[test]
    fn list_transitions_return_new_state() {
        let state = BookListState::new()
            .with_books(vec![book("1", "Dune", "SciFi"), book("2", "Emma", "Romance")])
            .toggle_filter()
            .with_filter(BookFilter::new("", "sci", ""));

        assert!(state.filter_open());
        assert_eq!(state.books().len(), 2);
        let visible = state.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Dune");
    }

    #[test]
    fn without_book_removes_only_that_id() {
        let state = BookListState::new()
            .with_books(vec![book("1", "Dune", "SciFi"), book("2", "Emma", "Romance")])
            .without_book("1");
        assert_eq!(state.books().len(), 1);
        assert_eq!(state.books()[0].id(), Some("2"));
    }

    #[test]
    fn search_query_uses_genre_and_author_only() {
        let state = BookListState::new().with_filter(BookFilter::new("dune", "SciFi", ""));
        let query = state.search_query();
        assert_eq!(query.genre.as_deref(), Some("SciFi"));
        assert_eq!(query.author.as_deref(), Some(""));
    }

    #[test]
    fn create_form_starts_blank() {
        let form = BookFormState::create();
        assert_eq!(form.mode(), &FormMode::Create);
        assert_eq!(form.data(), &BookFormData::default());
        assert_eq!(form.data().total_pages, 0);
    }

    #[test]
    fn total_pages_text_is_coerced() {
        let form = BookFormState::create()
            .with_field(BookField::Title, "Dune")
            .with_field(BookField::TotalPages, "412 pages");
        assert_eq!(form.data().title, "Dune");
        assert_eq!(form.data().total_pages, 412);

        let form = form.with_field(BookField::TotalPages, "lots");
        assert_eq!(form.data().total_pages, 0);
    }

    #[test]
    fn edit_requires_an_id() {
        assert!(matches!(
            BookFormState::edit("", BookFormData::default()),
            Err(ApiError::MissingBookId)
        ));
        assert!(BookFormState::from_book(&Book::default()).is_err());
    }

    #[test]
    fn from_book_prefills_fields() {
        let form = BookFormState::from_book(&book("7", "Emma", "Romance")).unwrap();
        assert_eq!(
            form.mode(),
            &FormMode::Edit {
                book_id: "7".to_string()
            }
        );
        assert_eq!(form.data().genre, "Romance");
    }

    #[test]
    fn reset_keeps_mode() {
        let form = BookFormState::from_book(&book("7", "Emma", "Romance"))
            .unwrap()
            .reset();
        assert!(matches!(form.mode(), FormMode::Edit { .. }));
        assert_eq!(form.data().title, "");
    }
}
