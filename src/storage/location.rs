//! Shareable parameter backed by an owned URL.
//!
//! Native stand-in for the browser location: the blob lives in one query
//! parameter and writes rewrite the URL in place. A `LocationParam` without a
//! URL models an environment with no navigable location.

use parking_lot::Mutex;
use url::Url;

use crate::error::StorageError;

use super::traits::BlobStorage;

#[derive(Debug)]
pub struct LocationParam {
    url: Mutex<Option<Url>>,
}

impl LocationParam {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(Some(url)),
        }
    }

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(input)?))
    }

    /// No navigable location: reads are unavailable and writes are dropped.
    pub fn detached() -> Self {
        Self {
            url: Mutex::new(None),
        }
    }

    /// Current shareable link.
    pub fn href(&self) -> Option<String> {
        self.url.lock().as_ref().map(|u| u.as_str().to_string())
    }

    /// Replace the location, as when a shared link is opened.
    pub fn navigate(&self, url: Url) {
        *self.url.lock() = Some(url);
    }

    /// Rewrite the query so that `name` maps to `value`, or disappears when
    /// `value` is `None`. Other pairs keep their order.
    fn rewrite(&self, name: &str, value: Option<&str>) -> Result<(), StorageError> {
        let mut guard = self.url.lock();
        let url = guard.as_mut().ok_or_else(no_location)?;

        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut replaced = false;
        for (k, v) in url.query_pairs() {
            if k == name {
                if let (Some(value), false) = (value, replaced) {
                    pairs.push((k.into_owned(), value.to_string()));
                    replaced = true;
                }
                continue;
            }
            pairs.push((k.into_owned(), v.into_owned()));
        }
        if let (Some(value), false) = (value, replaced) {
            pairs.push((name.to_string(), value.to_string()));
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&pairs);
        }
        Ok(())
    }
}

fn no_location() -> StorageError {
    StorageError::Unavailable("no navigable location".into())
}

impl BlobStorage for LocationParam {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let guard = self.url.lock();
        let url = guard.as_ref().ok_or_else(no_location)?;
        Ok(url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty()))
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        self.rewrite(name, Some(blob))
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.rewrite(name, None)
    }
}
