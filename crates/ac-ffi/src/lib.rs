//! C FFI bindings for ac-core
//!
//! This crate provides a C-compatible API so a desktop front end can pick
//! files, show the preview and save the result while ac-core does the work.

use ac_core::{BlankAddressPolicy, OutputFormat, CANONICAL_COLUMNS};
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;

/// Opaque handle to a deduplicated result
pub struct FfiDedupResult {
    inner: ac_core::DedupResult,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_last_error(message: impl Into<String>) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(message.into()));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Combine CSV or workbook files (in precedence order) and deduplicate their addresses
///
/// # Safety
/// - `paths` must be a valid pointer to an array of C strings
/// - `count` must be the correct length of the array
/// - Returns null on error; see `ac_last_error`
#[no_mangle]
pub unsafe extern "C" fn ac_combine_files(
    paths: *const *const c_char,
    count: usize,
    drop_blank: bool,
) -> *mut FfiDedupResult {
    clear_last_error();
    if paths.is_null() || count == 0 {
        set_last_error("no input files given");
        return ptr::null_mut();
    }

    let mut inputs: Vec<PathBuf> = Vec::with_capacity(count);
    for i in 0..count {
        match read_str(*paths.add(i)) {
            Some(p) => inputs.push(PathBuf::from(p)),
            None => {
                set_last_error(format!("input path {} is null or not UTF-8", i));
                return ptr::null_mut();
            }
        }
    }

    let policy = if drop_blank {
        BlankAddressPolicy::Exclude
    } else {
        BlankAddressPolicy::Collapse
    };

    match ac_core::combine_files(&inputs, policy) {
        Ok(result) => Box::into_raw(Box::new(FfiDedupResult { inner: result })),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a result
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files` or null
#[no_mangle]
pub unsafe extern "C" fn ac_free_result(result: *mut FfiDedupResult) {
    if !result.is_null() {
        drop(Box::from_raw(result));
    }
}

/// Get the message of the last failed call on this thread
///
/// # Safety
/// - Returns null if the last call succeeded
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| match e.borrow().as_deref() {
        Some(message) => into_c_string(message),
        None => ptr::null_mut(),
    })
}

/// Get the number of unique rows in a result
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
#[no_mangle]
pub unsafe extern "C" fn ac_result_row_count(result: *const FfiDedupResult) -> usize {
    if result.is_null() {
        return 0;
    }
    (*result).inner.row_count()
}

/// Get the number of output columns (always six)
#[no_mangle]
pub extern "C" fn ac_result_col_count() -> usize {
    CANONICAL_COLUMNS.len()
}

/// Get a column name by index
///
/// # Safety
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_result_col_name(index: usize) -> *mut c_char {
    CANONICAL_COLUMNS
        .get(index)
        .map(|name| into_c_string(name))
        .unwrap_or(ptr::null_mut())
}

/// Get a display-formatted cell value
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - Returns null if row or col is out of bounds
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_result_cell(
    result: *const FfiDedupResult,
    row: usize,
    col: usize,
) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }

    (&(*result)
        .inner
        .records)
        .get(row)
        .and_then(|r| r.record.values().get(col).copied())
        .map(into_c_string)
        .unwrap_or(ptr::null_mut())
}

/// Get the provenance of a row, e.g. "File 2, row 14"
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - Returns null if row is out of bounds
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_result_provenance(
    result: *const FfiDedupResult,
    row: usize,
) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }

    (&(*result)
        .inner
        .records)
        .get(row)
        .map(|r| into_c_string(&r.provenance.to_string()))
        .unwrap_or(ptr::null_mut())
}

/// Get the run counters
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - Each out pointer may be null to skip that counter
#[no_mangle]
pub unsafe extern "C" fn ac_result_counts(
    result: *const FfiDedupResult,
    total: *mut usize,
    unique: *mut usize,
    duplicates: *mut usize,
) {
    if result.is_null() {
        return;
    }
    let summary = &(*result).inner.summary;
    if !total.is_null() {
        *total = summary.total_rows;
    }
    if !unique.is_null() {
        *unique = summary.unique_rows;
    }
    if !duplicates.is_null() {
        *duplicates = summary.duplicates;
    }
}

/// Get the summary as JSON
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_result_summary_json(result: *const FfiDedupResult) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*result).inner.summary) {
        Ok(json) => into_c_string(&json),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the plain-text preview (summary plus first `limit` rows)
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_result_preview(result: *const FfiDedupResult, limit: usize) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }
    into_c_string(&ac_core::render_preview(&(*result).inner, limit))
}

/// Write a result to a file; `format` is "csv" or "json"
///
/// # Safety
/// - `result` must be a valid pointer returned by `ac_combine_files`
/// - `path` and `format` must be valid C strings
/// - Returns 0 on success, -1 on error; see `ac_last_error`
#[no_mangle]
pub unsafe extern "C" fn ac_result_export(
    result: *const FfiDedupResult,
    path: *const c_char,
    format: *const c_char,
) -> c_int {
    clear_last_error();
    if result.is_null() {
        set_last_error("result is null");
        return -1;
    }

    let (path, format) = match (read_str(path), read_str(format)) {
        (Some(p), Some(f)) => (p, f),
        _ => {
            set_last_error("path or format is null or not UTF-8");
            return -1;
        }
    };

    let exported = format
        .parse::<OutputFormat>()
        .and_then(|f| ac_core::export(&(*result).inner, path, f));

    match exported {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(e.to_string());
            -1
        }
    }
}

/// Get the comparison key for an address
///
/// # Safety
/// - `address` must be a valid C string
/// - Returns null if `address` is null or not UTF-8
/// - Caller must free the returned string with `ac_free_string`
#[no_mangle]
pub unsafe extern "C" fn ac_address_key(address: *const c_char) -> *mut c_char {
    match read_str(address) {
        Some(a) => into_c_string(ac_core::address_key(a).as_str()),
        None => ptr::null_mut(),
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by an ac_* function or null
#[no_mangle]
pub unsafe extern "C" fn ac_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    unsafe fn take_string(s: *mut c_char) -> Option<String> {
        if s.is_null() {
            return None;
        }
        let owned = CStr::from_ptr(s).to_string_lossy().into_owned();
        ac_free_string(s);
        Some(owned)
    }

    #[test]
    fn test_combine_and_read_cells() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "FullName,Address,Zip\nJohn Smith,1 Elm Street,01234\n").unwrap();
        fs::write(&b, "First,Address\njo,1 elm st\nann,2 Elm St\n").unwrap();

        let paths: Vec<CString> = [&a, &b]
            .iter()
            .map(|p| CString::new(p.to_str().unwrap()).unwrap())
            .collect();
        let ptrs: Vec<*const c_char> = paths.iter().map(|p| p.as_ptr()).collect();

        unsafe {
            let result = ac_combine_files(ptrs.as_ptr(), ptrs.len(), false);
            assert!(!result.is_null());

            assert_eq!(ac_result_row_count(result), 2);
            assert_eq!(ac_result_col_count(), 6);
            assert_eq!(take_string(ac_result_col_name(2)).as_deref(), Some("Address"));
            assert_eq!(take_string(ac_result_cell(result, 0, 0)).as_deref(), Some("John"));
            assert_eq!(take_string(ac_result_cell(result, 0, 5)).as_deref(), Some("01234"));
            assert!(ac_result_cell(result, 9, 0).is_null());
            assert_eq!(
                take_string(ac_result_provenance(result, 1)).as_deref(),
                Some("File 2, row 2")
            );

            let (mut total, mut unique, mut dups) = (0usize, 0usize, 0usize);
            ac_result_counts(result, &mut total, &mut unique, &mut dups);
            assert_eq!((total, unique, dups), (3, 2, 1));

            let out = CString::new(dir.path().join("out.csv").to_str().unwrap()).unwrap();
            let fmt = CString::new("csv").unwrap();
            assert_eq!(ac_result_export(result, out.as_ptr(), fmt.as_ptr()), 0);
            assert!(dir.path().join("out.csv").exists());

            ac_free_result(result);
        }
    }

    #[test]
    fn test_schema_error_sets_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        fs::write(&a, "Name\nJohn\n").unwrap();
        let path = CString::new(a.to_str().unwrap()).unwrap();
        let ptrs = [path.as_ptr()];

        unsafe {
            let result = ac_combine_files(ptrs.as_ptr(), 1, false);
            assert!(result.is_null());
            let message = take_string(ac_last_error()).unwrap();
            assert!(message.contains("File 1"));
        }
    }

    #[test]
    fn test_address_key() {
        let address = CString::new("42 Streetwood Road.").unwrap();
        unsafe {
            assert_eq!(
                take_string(ac_address_key(address.as_ptr())).as_deref(),
                Some("42 streetwood rd")
            );
            assert!(ac_address_key(ptr::null()).is_null());
        }
    }
}
