//! Row sources: an in-memory vector, a JSON file, or a closure.

use stache::Value;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::loader::{FetchQuery, RowSource};

/// The `offset..offset + limit` window of `rows`.
fn window(rows: &[Value], query: &FetchQuery) -> Vec<Value> {
    let start = query.offset.min(rows.len());
    let end = match query.limit {
        Some(limit) => start.saturating_add(limit).min(rows.len()),
        None => rows.len(),
    };
    rows[start..end].to_vec()
}

/// Serves windows of a fixed list of rows.
///
/// The search text is ignored: filtering happens in the table.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<Value>,
}

impl InMemorySource {
    /// A source over `rows`.
    pub fn new(rows: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Rows behind the source
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Does the source hold no rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for InMemorySource {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<Value>, FetchError> {
        Ok(window(&self.rows, query))
    }
}

/// Serves windows of a JSON file holding an array of rows. The file is
/// read again on every fetch, so rows appended to it show up.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// A source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file read on each fetch
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode every row of the file.
    pub async fn read_all(&self) -> Result<Vec<Value>, FetchError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.clone(),
                source,
            })?;
        decode_rows(&bytes)
    }
}

impl RowSource for JsonFileSource {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<Value>, FetchError> {
        let rows = self.read_all().await?;
        Ok(window(&rows, query))
    }
}

/// Decode a JSON array of rows.
pub fn decode_rows(bytes: &[u8]) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_slice(bytes)? {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Value::from).collect()),
        other => Err(FetchError::NotAnArray {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A source backed by a closure returning a future.
///
/// The closure receives an owned copy of the query so the future can keep
/// it.
#[derive(Debug, Clone)]
pub struct FnSource<F> {
    f: F,
}

/// Wrap a closure as a [`RowSource`].
pub fn from_fn<F, Fut>(f: F) -> FnSource<F>
where
    F: Fn(FetchQuery) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, FetchError>>,
{
    FnSource { f }
}

impl<F, Fut> RowSource for FnSource<F>
where
    F: Fn(FetchQuery) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, FetchError>>,
{
    fn fetch(&self, query: &FetchQuery) -> impl Future<Output = Result<Vec<Value>, FetchError>> {
        (self.f)(query.clone())
    }
}
