use std::cell::RefCell;
use std::collections::HashMap;

use sha2::{Digest, Sha256};

use super::ExtractionError;

/// Page/resolution budget for one OCR request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanBudget {
    pub max_pages: u32,
    pub dpi: u32,
}

/// OCR collaborator abstraction (allows mocking for tests).
///
/// Assumed deterministic for an identical (carrier content, pages, dpi)
/// triple and non-deterministic across budget changes, which is exactly
/// what the cache key encodes.
pub trait OcrEngine {
    fn recognize(&self, handle: &str, budget: ScanBudget) -> Result<String, ExtractionError>;
}

/// Content-addressed cache wrapper around an OCR engine.
///
/// Keyed by (carrier digest, pages, dpi) so repeated runs over unchanged
/// input are idempotent and cheap. Failures are not cached; a transient
/// timeout should not poison later rounds.
pub struct CachedOcr<E> {
    inner: E,
    cache: RefCell<HashMap<(String, ScanBudget), String>>,
}

impl<E: OcrEngine> CachedOcr<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<E: OcrEngine> OcrEngine for CachedOcr<E> {
    fn recognize(&self, handle: &str, budget: ScanBudget) -> Result<String, ExtractionError> {
        let key = (carrier_digest(handle), budget);
        if let Some(hit) = self.cache.borrow().get(&key) {
            tracing::debug!(handle, pages = budget.max_pages, dpi = budget.dpi, "OCR cache hit");
            return Ok(hit.clone());
        }
        let text = self.inner.recognize(handle, budget)?;
        self.cache.borrow_mut().insert(key, text.clone());
        Ok(text)
    }
}

fn carrier_digest(handle: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(handle.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Mock OCR engine returning canned text per handle, counting calls.
pub struct MockOcrEngine {
    responses: HashMap<String, String>,
    fallback: String,
    calls: RefCell<u32>,
    fail_handles: Vec<String>,
}

impl MockOcrEngine {
    pub fn new(fallback: &str) -> Self {
        Self {
            responses: HashMap::new(),
            fallback: fallback.to_string(),
            calls: RefCell::new(0),
            fail_handles: Vec::new(),
        }
    }

    pub fn with_response(mut self, handle: &str, text: &str) -> Self {
        self.responses.insert(handle.to_string(), text.to_string());
        self
    }

    /// Requests for this handle return an error, exercising the silent
    /// degradation path.
    pub fn failing_on(mut self, handle: &str) -> Self {
        self.fail_handles.push(handle.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.borrow()
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, handle: &str, _budget: ScanBudget) -> Result<String, ExtractionError> {
        *self.calls.borrow_mut() += 1;
        if self.fail_handles.iter().any(|h| h == handle) {
            return Err(ExtractionError::Timeout {
                handle: handle.to_string(),
            });
        }
        Ok(self
            .responses
            .get(handle)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}
