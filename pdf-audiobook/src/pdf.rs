// PDF loading and page-range text extraction

use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ways extraction can fail. All of them end the job.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to open PDF {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Page range {start}..{end} is empty (document has {total} pages)")]
    EmptyRange {
        start: usize,
        end: usize,
        total: usize,
    },

    #[error("No text found in pages {start}..{end}")]
    NoText { start: usize, end: usize },
}

/// A document whose pages can be read as plain text.
pub trait PageSource {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Text of the page at a 0-based index. Pages without text return `""`.
    fn page_text(&self, index: usize) -> anyhow::Result<String>;
}

/// Opens documents by path.
pub trait DocumentLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, ExtractionError>;
}

/// Selection of pages, 0-based and end-exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl PageRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Resolve against a document's page count.
    ///
    /// `start` defaults to 0 and `end` to `total`; both are clamped so that
    /// `0 <= start <= end <= total`.
    pub fn resolve(&self, total: usize) -> Range<usize> {
        let start = self.start.unwrap_or(0).min(total);
        let end = self.end.unwrap_or(total).clamp(start, total);
        start..end
    }
}

/// A PDF parsed with lopdf.
pub struct PdfDocument {
    doc: lopdf::Document,
    /// lopdf page numbers (1-based) in reading order
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let doc = lopdf::Document::load(path).map_err(|e| ExtractionError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let page_numbers = doc.get_pages().keys().copied().collect();
        Ok(Self { doc, page_numbers })
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> anyhow::Result<String> {
        let page_number = self
            .page_numbers
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("page index {} out of bounds", index))?;
        let text = self.doc.extract_text(&[*page_number])?;
        Ok(text)
    }
}

/// Production loader backed by lopdf.
#[derive(Debug, Default)]
pub struct LopdfLoader;

impl DocumentLoader for LopdfLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, ExtractionError> {
        Ok(Box::new(PdfDocument::open(path)?))
    }
}

/// Concatenate the text of every page in `range`, in page order, with no
/// separator.
///
/// A page that fails to decode contributes nothing; the rest of the range is
/// still read. A range with nothing but whitespace counts as having no text.
pub fn extract_text(source: &dyn PageSource, range: PageRange) -> Result<String, ExtractionError> {
    let total = source.page_count();
    let pages = range.resolve(total);

    if pages.is_empty() {
        return Err(ExtractionError::EmptyRange {
            start: pages.start,
            end: pages.end,
            total,
        });
    }

    let mut text = String::new();
    for index in pages.clone() {
        match source.page_text(index) {
            Ok(page) => text.push_str(&page),
            Err(e) => log::warn!("page {}: no usable text ({})", index, e),
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractionError::NoText {
            start: pages.start,
            end: pages.end,
        });
    }

    Ok(text)
}

/// Open `path` and extract the text of `range`.
pub fn extract_from_path(
    loader: &dyn DocumentLoader,
    path: &Path,
    range: PageRange,
) -> Result<String, ExtractionError> {
    let source = loader.open(path)?;
    log::info!(
        "PDF '{}' has {} pages",
        path.display(),
        source.page_count()
    );
    extract_text(source.as_ref(), range)
}

#[cfg(test)]
pub mod testing {
    //! In-memory documents for pipeline tests.

    use super::*;
    use std::collections::HashMap;

    /// Pages held in memory. `None` simulates a page whose text can't be decoded.
    #[derive(Debug, Clone)]
    pub struct MemoryDocument {
        pub pages: Vec<Option<String>>,
    }

    impl MemoryDocument {
        pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
            Self {
                pages: pages.iter().map(|p| Some(p.as_ref().to_string())).collect(),
            }
        }
    }

    impl PageSource for MemoryDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> anyhow::Result<String> {
            match self.pages.get(index) {
                Some(Some(text)) => Ok(text.clone()),
                Some(None) => anyhow::bail!("undecodable page"),
                None => anyhow::bail!("out of bounds"),
            }
        }
    }

    /// Loader serving in-memory documents keyed by path.
    #[derive(Debug, Default, Clone)]
    pub struct MemoryLoader {
        docs: HashMap<PathBuf, MemoryDocument>,
    }

    impl MemoryLoader {
        pub fn with(mut self, path: impl Into<PathBuf>, doc: MemoryDocument) -> Self {
            self.docs.insert(path.into(), doc);
            self
        }
    }

    impl DocumentLoader for MemoryLoader {
        fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, ExtractionError> {
            self.docs
                .get(path)
                .cloned()
                .map(|d| Box::new(d) as Box<dyn PageSource>)
                .ok_or_else(|| ExtractionError::Open {
                    path: path.to_path_buf(),
                    reason: "not found".to_string(),
                })
        }
    }
}
