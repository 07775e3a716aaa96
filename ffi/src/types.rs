//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! for strings, pointer plus length for lists, and tagged enums with
//! explicit discriminants. Conversions live here so `lib.rs` stays focused
//! on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use booktrack_core::{ApiError, Book, BookFormData, HttpMethod, HttpRequest, User};

/// Opaque handle to a `BookClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiBookClient {
    pub(crate) inner: booktrack_core::BookClient,
}

/// Copy a Rust string into a C string owned by the caller. Interior NULs
/// are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Read a borrowed C string. Null and invalid UTF-8 both read as `None`.
pub(crate) fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Release a string produced by [`c_string`]. Null is ignored.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as plain data.
///
/// Built by `booktrack_build_*`. The host executes it and hands the
/// response back through `booktrack_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    /// Absolute URL including any query string.
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// JSON body, or null for GET and DELETE.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Box<[FfiHeader]> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), c_string),
        }))
    }

    /// Free every owned field, leaving the struct itself to the caller.
    pub(crate) fn free_fields(&self) {
        free_c_string(self.path);
        free_c_string(self.body);
        if !self.headers.is_null() && self.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.headers,
                    self.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

/// An HTTP response as plain data.
///
/// The host fills this in after executing a request. The FFI layer reads
/// but never frees these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Book form input. Null strings read as empty.
#[repr(C)]
pub struct FfiBookForm {
    pub title: *const c_char,
    pub author: *const c_char,
    pub genre: *const c_char,
    pub description: *const c_char,
    pub total_pages: u32,
}

impl FfiBookForm {
    pub(crate) fn to_core(&self) -> BookFormData {
        let text = |ptr| borrow_str(ptr).unwrap_or_default().to_string();
        BookFormData {
            title: text(self.title),
            author: text(self.author),
            genre: text(self.genre),
            description: text(self.description),
            total_pages: self.total_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error categories carried by `FfiBookResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The backend answered with its own error payload.
    Backend = 1,
    /// No usable response; the message is the "Network error" sentinel.
    Network = 2,
    MissingBookId = 3,
    Serialization = 4,
    Deserialization = 5,
    CredentialStore = 6,
    Panic = 7,
    NullArg = 8,
}

/// Tells `booktrack_free_result` what `FfiBookResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Book = 1,
    BookList = 2,
    User = 3,
    /// `data` is a NUL-terminated token string.
    Token = 4,
    /// `data` is a NUL-terminated JSON document.
    Json = 5,
}

#[repr(C)]
pub struct FfiBook {
    /// Null when the backend omitted `_id`.
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub author: *mut c_char,
    pub genre: *mut c_char,
    pub description: *mut c_char,
    pub total_pages: u32,
}

impl FfiBook {
    pub(crate) fn from_core(book: Book) -> Self {
        FfiBook {
            id: book.id.map_or(std::ptr::null_mut(), c_string),
            title: c_string(book.title),
            author: c_string(book.author),
            genre: c_string(book.genre),
            description: c_string(book.description),
            total_pages: book.total_pages,
        }
    }

    pub(crate) fn to_core(&self) -> Book {
        let text = |ptr: *mut c_char| borrow_str(ptr).unwrap_or_default().to_string();
        Book {
            id: borrow_str(self.id).map(str::to_string),
            title: text(self.title),
            author: text(self.author),
            genre: text(self.genre),
            description: text(self.description),
            total_pages: self.total_pages,
        }
    }

    fn free_fields(&self) {
        for ptr in [self.id, self.title, self.author, self.genre, self.description] {
            free_c_string(ptr);
        }
    }
}

#[repr(C)]
pub struct FfiBookList {
    pub items: *mut FfiBook,
    pub len: u32,
}

impl FfiBookList {
    pub(crate) fn from_core(books: Vec<Book>) -> Self {
        let items: Box<[FfiBook]> = books.into_iter().map(FfiBook::from_core).collect();
        let len = items.len() as u32;
        let items = if items.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(items) as *mut FfiBook
        };
        FfiBookList { items, len }
    }

    /// Borrow the items as a slice. Empty when `items` is null.
    pub(crate) fn as_slice(&self) -> &[FfiBook] {
        if self.items.is_null() || self.len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.items, self.len as usize) }
        }
    }

    fn free_items(&self) {
        if self.items.is_null() || self.len == 0 {
            return;
        }
        let items = unsafe {
            Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.items,
                self.len as usize,
            ))
        };
        for item in items.iter() {
            item.free_fields();
        }
    }
}

#[repr(C)]
pub struct FfiUser {
    pub id: *mut c_char,
    pub username: *mut c_char,
    pub email: *mut c_char,
    /// RFC 3339 timestamp.
    pub created_at: *mut c_char,
}

impl FfiUser {
    fn from_core(user: User) -> Self {
        FfiUser {
            id: c_string(user.id),
            username: c_string(user.username),
            email: c_string(user.email),
            created_at: c_string(user.created_at.to_rfc3339()),
        }
    }

    fn free_fields(&self) {
        for ptr in [self.id, self.username, self.email, self.created_at] {
            free_c_string(ptr);
        }
    }
}

/// Result envelope for every parse and filter operation.
///
/// On success `error_code` is `Ok`, both error strings are null, and `data`
/// points to the payload named by `data_tag`. On failure `error_message`
/// holds a display message, `error_json` the error payload exactly as the
/// backend sent it (or the `{"message": ...}` sentinel), and `data` is null.
#[repr(C)]
pub struct FfiBookResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub error_json: *mut c_char,
    /// Status of the failing response, or 0 when there was none.
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiBookResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiBookResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            error_json: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, message: String, json: String) -> *mut Self {
        Box::into_raw(Box::new(FfiBookResult {
            error_code,
            error_message: c_string(message),
            error_json: c_string(json),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_book(book: Book) -> *mut Self {
        let book = Box::new(FfiBook::from_core(book));
        Self::ok(FfiDataTag::Book, Box::into_raw(book) as *mut c_void)
    }

    pub(crate) fn ok_book_list(books: Vec<Book>) -> *mut Self {
        let list = Box::new(FfiBookList::from_core(books));
        Self::ok(FfiDataTag::BookList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_user(user: User) -> *mut Self {
        let user = Box::new(FfiUser::from_core(user));
        Self::ok(FfiDataTag::User, Box::into_raw(user) as *mut c_void)
    }

    pub(crate) fn ok_token(token: &str) -> *mut Self {
        Self::ok(FfiDataTag::Token, c_string(token) as *mut c_void)
    }

    pub(crate) fn ok_json(value: &serde_json::Value) -> *mut Self {
        Self::ok(FfiDataTag::Json, c_string(value.to_string()) as *mut c_void)
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err {
            ApiError::Backend { .. } => FfiErrorCode::Backend,
            ApiError::Network { .. } => FfiErrorCode::Network,
            ApiError::MissingBookId => FfiErrorCode::MissingBookId,
            ApiError::SerializationError(_) => FfiErrorCode::Serialization,
            ApiError::DeserializationError(_) => FfiErrorCode::Deserialization,
            ApiError::CredentialStore(_) => FfiErrorCode::CredentialStore,
        };
        let message = match err.message() {
            m if m.is_empty() => err.to_string(),
            m => m,
        };
        let json = err.payload().to_string();
        Self::failure(error_code, err.status().unwrap_or(0), message, json)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let message = format!("null argument: {name}");
        let json = serde_json::json!({ "message": message }).to_string();
        Self::failure(FfiErrorCode::NullArg, 0, message, json)
    }

    pub(crate) fn panic(name: &str) -> *mut Self {
        let message = format!("panic in {name}");
        let json = serde_json::json!({ "message": message }).to_string();
        Self::failure(FfiErrorCode::Panic, 0, message, json)
    }

    /// Free the strings and the tagged payload, leaving the struct itself.
    pub(crate) fn free_fields(&self) {
        free_c_string(self.error_message);
        free_c_string(self.error_json);
        if self.data.is_null() {
            return;
        }
        match self.data_tag {
            FfiDataTag::Book => {
                let book = unsafe { Box::from_raw(self.data as *mut FfiBook) };
                book.free_fields();
            }
            FfiDataTag::BookList => {
                let list = unsafe { Box::from_raw(self.data as *mut FfiBookList) };
                list.free_items();
            }
            FfiDataTag::User => {
                let user = unsafe { Box::from_raw(self.data as *mut FfiUser) };
                user.free_fields();
            }
            FfiDataTag::Token | FfiDataTag::Json => free_c_string(self.data as *mut c_char),
            FfiDataTag::None => {}
        }
    }
}
