//! Page counting and page selection

use crate::RenderError;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

/// Reports how many pages a document has
pub trait PageCounter: Send + Sync {
    /// Number of pages in `document`
    fn page_count(&self, document: &Path) -> Result<u32, RenderError>;
}

/// Counts pages with poppler's `pdfinfo`
#[derive(Debug, Clone)]
pub struct PdfinfoPageCounter {
    program: String,
}

impl Default for PdfinfoPageCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl PdfinfoPageCounter {
    /// Program invoked when none is configured
    pub const DEFAULT_PROGRAM: &'static str = "pdfinfo";

    /// Create a counter invoking `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageCounter for PdfinfoPageCounter {
    fn page_count(&self, document: &Path) -> Result<u32, RenderError> {
        let output = Command::new(&self.program)
            .arg(document)
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            RenderError::page_count(format!(
                "no 'Pages:' line in {} output for {}",
                self.program,
                document.display()
            ))
        })
    }
}

/// Extract the page count from `pdfinfo` output
#[must_use]
pub fn parse_pdfinfo_pages(output: &str) -> Option<u32> {
    output.lines().find_map(|line| {
        line.strip_prefix("Pages:")
            .and_then(|rest| rest.trim().parse().ok())
    })
}

/// Which pages of a document to render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// Inclusive 1-based ranges
    Ranges(Vec<(u32, u32)>),
}

impl PageSelection {
    /// Most pages a single selection may expand to
    pub const MAX_PAGES: u32 = 100_000;

    /// Expand the selection into sorted, de-duplicated page numbers.
    ///
    /// Pages past `page_count` are rejected, as is a selection naming more
    /// than [`Self::MAX_PAGES`] pages.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>, RenderError> {
        let selected = match self {
            Self::All => u64::from(page_count),
            Self::Ranges(ranges) => ranges
                .iter()
                .map(|&(start, end)| u64::from(end.saturating_sub(start)) + 1)
                .sum(),
        };
        if selected > u64::from(Self::MAX_PAGES) {
            return Err(RenderError::invalid_config(format!(
                "selection names {selected} pages, at most {} can be rendered at once",
                Self::MAX_PAGES
            )));
        }

        let mut pages = match self {
            Self::All => (1..=page_count).collect::<Vec<_>>(),
            Self::Ranges(ranges) => {
                let mut pages = Vec::new();
                for &(start, end) in ranges {
                    if end > page_count {
                        return Err(RenderError::invalid_config(format!(
                            "page {end} is out of range (document has {page_count} pages)"
                        )));
                    }
                    pages.extend(start..=end);
                }
                pages
            }
        };
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }
}

impl FromStr for PageSelection {
    type Err = RenderError;

    /// Parse `all` or a comma-separated list such as `1,3-5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let parse_page = |p: &str| -> Result<u32, RenderError> {
            match p.trim().parse::<u32>() {
                Ok(0) => Err(RenderError::invalid_config("pages are numbered from 1")),
                Ok(n) => Ok(n),
                Err(_) => Err(RenderError::invalid_config(format!(
                    "invalid page number '{}'",
                    p.trim()
                ))),
            }
        };

        let mut ranges = Vec::new();
        for part in s.split(',') {
            let range = match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_page(start)?, parse_page(end)?);
                    if start > end {
                        return Err(RenderError::invalid_config(format!(
                            "invalid page range '{}'",
                            part.trim()
                        )));
                    }
                    (start, end)
                }
                None => {
                    let page = parse_page(part)?;
                    (page, page)
                }
            };
            ranges.push(range);
        }
        Ok(Self::Ranges(ranges))
    }
}
