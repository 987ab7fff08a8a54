use serde::Serialize;
use std::str::FromStr;

use crate::{Category, Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional filters for insight listings. `relevant: Some(false)` selects
/// only the non-relevant insights; it is not the same as no filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsightFilter {
    pub category: Option<Category>,
    pub relevant: Option<bool>,
}

impl InsightFilter {
    pub fn relevant_only() -> Self {
        Self {
            relevant: Some(true),
            ..Default::default()
        }
    }

    pub fn by_category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ProcessedAt,
    ConfidenceScore,
    CreatedAt,
    Id,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::ProcessedAt => "processed_at",
            SortField::ConfidenceScore => "confidence_score",
            SortField::CreatedAt => "created_at",
            SortField::Id => "id",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "processedAt" | "processed_at" => Ok(SortField::ProcessedAt),
            "confidenceScore" | "confidence_score" => Ok(SortField::ConfidenceScore),
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "id" => Ok(SortField::Id),
            other => Err(Error::InvalidQuery(format!("Unknown sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::ProcessedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for Sort {
    type Err = Error;

    /// Parses `field,direction`. Anything that is not exactly two parts falls
    /// back to the default ordering; any direction other than `desc` is ascending.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Ok(Sort::default());
        }
        let direction = if parts[1].eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Ok(Sort {
            field: parts[0].parse()?,
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32, sort: Sort) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }
}
