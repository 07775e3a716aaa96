//! C-ABI wrapper around `booktrack-core`.
//!
//! # Overview
//! Exposes the catalog API through `extern "C"` functions so a mobile or
//! desktop host can build requests, execute them with its own HTTP stack,
//! and parse the responses without linking an async runtime.
//!
//! # Design
//! - Every `extern "C"` function runs inside `catch_unwind` so panics never
//!   cross the boundary.
//! - `build_*` / `parse_*` mirror `BookClient` 1:1. Builders take an
//!   optional token that becomes the `Authorization: Bearer` header; the
//!   host owns token storage.
//! - A single `FfiBookResult` with `FfiDataTag` + `void* data` carries
//!   payloads and normalized errors alike.
//! - The caller owns every returned pointer and releases it with the
//!   matching `booktrack_free_*` function.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use booktrack_core::http::AUTHORIZATION;
use booktrack_core::{
    ApiError, AuthToken, Book, BookClient, BookFilter, BookQuery, HttpRequest, HttpResponse,
};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`, e.g. `https://host/api`.
///
/// Returns null if `base_url` is null or not UTF-8. Free the handle with
/// `booktrack_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_client_new(base_url: *const c_char) -> *mut FfiBookClient {
    catch_unwind(|| match borrow_str(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiBookClient {
            inner: BookClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `booktrack_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_client_free(client: *mut FfiBookClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Shared tail of every builder: null checks, token attachment, conversion.
fn build<F>(client: *const FfiBookClient, token: *const c_char, f: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&BookClient) -> Result<HttpRequest, ApiError> + UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match f(&client.inner) {
            Ok(mut req) => {
                if let Some(token) = borrow_str(token).map(AuthToken::new) {
                    if !token.is_empty() {
                        req.set_header(AUTHORIZATION, token.bearer());
                    }
                }
                FfiHttpRequest::from_core(req)
            }
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `POST /auth/login`. Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_login(
    client: *const FfiBookClient,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    let (Some(username), Some(password)) = (borrow_str(username), borrow_str(password)) else {
        return std::ptr::null_mut();
    };
    build(client, std::ptr::null(), |c| c.build_login(username, password))
}

/// `POST /auth/register`. Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_register(
    client: *const FfiBookClient,
    username: *const c_char,
    password: *const c_char,
    email: *const c_char,
) -> *mut FfiHttpRequest {
    let (Some(username), Some(password), Some(email)) =
        (borrow_str(username), borrow_str(password), borrow_str(email))
    else {
        return std::ptr::null_mut();
    };
    build(client, std::ptr::null(), |c| {
        c.build_register(username, password, email)
    })
}

/// `GET /profile`. `token` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_fetch_profile(
    client: *const FfiBookClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, |c| Ok(c.build_fetch_profile()))
}

/// `GET /books`. Null `genre`/`author` are omitted; an empty string is sent
/// as an empty parameter. Negative `limit`/`page` are omitted.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_list_books(
    client: *const FfiBookClient,
    token: *const c_char,
    genre: *const c_char,
    author: *const c_char,
    limit: i32,
    page: i32,
) -> *mut FfiHttpRequest {
    let query = BookQuery {
        genre: borrow_str(genre).map(str::to_string),
        author: borrow_str(author).map(str::to_string),
        limit: u32::try_from(limit).ok(),
        page: u32::try_from(page).ok(),
    };
    build(client, token, move |c| c.build_list_books(Some(&query)))
}

/// `GET /books/{id}`. Returns null if `id` is null or blank.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_get_book(
    client: *const FfiBookClient,
    token: *const c_char,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    let Some(id) = borrow_str(id) else {
        return std::ptr::null_mut();
    };
    build(client, token, |c| c.build_get_book(id))
}

/// `POST /books`. Returns null if `form` is null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_create_book(
    client: *const FfiBookClient,
    token: *const c_char,
    form: *const FfiBookForm,
) -> *mut FfiHttpRequest {
    if form.is_null() {
        return std::ptr::null_mut();
    }
    let input = unsafe { &*form }.to_core();
    build(client, token, move |c| c.build_create_book(&input))
}

/// `PUT /books/{id}` with every form field. Returns null if `id` or `form`
/// is null, or `id` is blank.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_update_book(
    client: *const FfiBookClient,
    token: *const c_char,
    id: *const c_char,
    form: *const FfiBookForm,
) -> *mut FfiHttpRequest {
    let Some(id) = borrow_str(id) else {
        return std::ptr::null_mut();
    };
    if form.is_null() {
        return std::ptr::null_mut();
    }
    let input = unsafe { &*form }.to_core();
    build(client, token, move |c| c.build_update_book(id, &input))
}

/// `DELETE /books/{id}`. Returns null if `id` is null or blank.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_build_delete_book(
    client: *const FfiBookClient,
    token: *const c_char,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    let Some(id) = borrow_str(id) else {
        return std::ptr::null_mut();
    };
    build(client, token, |c| c.build_delete_book(id))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Copy the host's response into a core `HttpResponse`. A null body reads
/// as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: borrow_str(resp.body).unwrap_or_default().to_string(),
    }
}

/// Shared body of every parser: null checks, panic capture, error mapping.
fn parse<T, P, W>(
    name: &str,
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
    parser: P,
    wrap: W,
) -> *mut FfiBookResult
where
    P: FnOnce(&BookClient, HttpResponse) -> Result<T, ApiError> + UnwindSafe,
    W: FnOnce(T) -> *mut FfiBookResult + UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return FfiBookResult::null_arg("client");
        }
        if response.is_null() {
            return FfiBookResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parser(&client.inner, resp) {
            Ok(value) => wrap(value),
            Err(e) => FfiBookResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiBookResult::panic(name))
}

/// Login response. `data_tag = Token` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_login(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_login",
        client,
        response,
        BookClient::parse_login,
        |token: AuthToken| FfiBookResult::ok_token(token.as_str()),
    )
}

/// Register response. On success `data_tag = Json` with the inner `data`
/// payload, or `None` when the backend sent none.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_register(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_register",
        client,
        response,
        BookClient::parse_register,
        |value: serde_json::Value| {
            if value.is_null() {
                FfiBookResult::ok_empty()
            } else {
                FfiBookResult::ok_json(&value)
            }
        },
    )
}

/// Profile response. `data_tag = User` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_fetch_profile(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_fetch_profile",
        client,
        response,
        BookClient::parse_fetch_profile,
        FfiBookResult::ok_user,
    )
}

/// List response. `data_tag = BookList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_list_books(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_list_books",
        client,
        response,
        BookClient::parse_list_books,
        FfiBookResult::ok_book_list,
    )
}

/// Detail response. `data_tag = Book` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_get_book(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_get_book",
        client,
        response,
        BookClient::parse_get_book,
        FfiBookResult::ok_book,
    )
}

/// Create response. `data_tag = Book` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_create_book(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_create_book",
        client,
        response,
        BookClient::parse_create_book,
        FfiBookResult::ok_book,
    )
}

/// Update response. `data_tag = Book` on success.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_update_book(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_update_book",
        client,
        response,
        BookClient::parse_update_book,
        FfiBookResult::ok_book,
    )
}

/// Delete response. Any 2xx is success with `data_tag = None`.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_parse_delete_book(
    client: *const FfiBookClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBookResult {
    parse(
        "booktrack_parse_delete_book",
        client,
        response,
        BookClient::parse_delete_book,
        |(): ()| FfiBookResult::ok_empty(),
    )
}

// ---------------------------------------------------------------------------
// Client-side filter
// ---------------------------------------------------------------------------

/// Narrow a parsed book list by case-insensitive title, genre and author
/// substrings. Null or empty filters match everything. Returns a new
/// `BookList` result; `books` is left untouched.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_filter_books(
    books: *const FfiBookList,
    title: *const c_char,
    genre: *const c_char,
    author: *const c_char,
) -> *mut FfiBookResult {
    catch_unwind(|| {
        if books.is_null() {
            return FfiBookResult::null_arg("books");
        }
        let books: Vec<Book> = unsafe { &*books }
            .as_slice()
            .iter()
            .map(FfiBook::to_core)
            .collect();
        let filter = BookFilter::new(
            borrow_str(title).unwrap_or_default(),
            borrow_str(genre).unwrap_or_default(),
            borrow_str(author).unwrap_or_default(),
        );
        FfiBookResult::ok_book_list(filter.apply(&books))
    })
    .unwrap_or_else(|_| FfiBookResult::panic("booktrack_filter_books"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `booktrack_build_*`. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        req.free_fields();
    });
}

/// Free a result returned by any `booktrack_parse_*` or
/// `booktrack_filter_books`. Safe with null. `data_tag` decides what
/// `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_free_result(result: *mut FfiBookResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        result.free_fields();
    });
}

/// Free a C string allocated by this library. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn booktrack_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
