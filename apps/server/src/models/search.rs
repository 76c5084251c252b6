//! Search request, normalized criteria, sorting and paging

use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use validator::Validate;

use super::question::{Category, Question};
use crate::{Error, Result};

/// Search request as received from a caller.
///
/// Every field is optional. `sort`/`direction` are accepted as aliases of
/// `sortField`/`sortDirection`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSpec {
    pub category: Option<String>,
    #[validate(length(max = 200))]
    pub keyword: Option<String>,
    #[validate(length(max = 20))]
    pub tags: Option<Vec<String>>,
    pub is_solved: Option<bool>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    #[serde(alias = "sort")]
    pub sort_field: Option<String>,
    #[serde(alias = "direction")]
    pub sort_direction: Option<String>,
}

impl SearchSpec {
    /// Validate and canonicalize into [`SearchCriteria`].
    ///
    /// Blank keywords and blank tag names are treated as absent, tag names
    /// are trimmed and deduplicated.
    pub fn normalize(self, default_size: u32, max_size: u32) -> Result<SearchCriteria> {
        self.validate()?;

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::parse::<Category>)
            .transpose()?;

        let keyword = self
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let tags: Vec<String> = self
            .tags
            .unwrap_or_default()
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let page = match self.page {
            None => 0,
            Some(p) if p < 0 => {
                return Err(Error::Validation("page must not be negative".to_string()))
            }
            Some(p) => u32::try_from(p)
                .map_err(|_| Error::Validation(format!("page {p} is out of range")))?,
        };

        let size = match self.size {
            None => default_size,
            Some(s) if s <= 0 => {
                return Err(Error::Validation("size must be positive".to_string()))
            }
            Some(s) if s > i64::from(max_size) => {
                return Err(Error::Validation(format!(
                    "size must not exceed {max_size}"
                )))
            }
            Some(s) => s as u32,
        };

        Ok(SearchCriteria {
            category,
            keyword,
            tags,
            is_solved: self.is_solved,
            page: PageRequest { page, size },
            sort: SortSpec::resolve(self.sort_field.as_deref(), self.sort_direction.as_deref()),
        })
    }
}

/// Normalized search input. Tags are trimmed, non-blank, unique and sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub category: Option<Category>,
    pub keyword: Option<String>,
    pub tags: Vec<String>,
    pub is_solved: Option<bool>,
    pub page: PageRequest,
    pub sort: SortSpec,
}

impl SearchCriteria {
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Zero-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Window that fetches one row past the page to detect a next page.
    pub fn probe_window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset(),
            limit: i64::from(self.size) + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Content,
    Category,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Public field name to sort field. Names are matched case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, SortField); 5] = [
            ("id", SortField::Id),
            ("content", SortField::Content),
            ("category", SortField::Category),
            ("createdAt", SortField::CreatedAt),
            ("updatedAt", SortField::UpdatedAt),
        ];
        let name = name.trim();
        NAMES
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, field)| field)
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Content => "content",
            SortField::Category => "category",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Unrecognized or missing input is ascending.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl SortSpec {
    /// Resolve caller sort input.
    ///
    /// A missing field sorts by id in the requested direction. An
    /// unrecognized field falls back to id ascending, ignoring direction.
    pub fn resolve(field: Option<&str>, direction: Option<&str>) -> Self {
        let direction = SortDirection::parse_lenient(direction);
        match field.map(str::trim).filter(|f| !f.is_empty()) {
            None => SortSpec {
                field: SortField::Id,
                direction,
            },
            Some(name) => match SortField::from_name(name) {
                Some(field) => SortSpec { field, direction },
                None => SortSpec::default(),
            },
        }
    }

    /// Whether an id tie-breaker must follow the primary key.
    pub fn needs_tie_breaker(&self) -> bool {
        self.field != SortField::Id
    }

    /// Total order over questions: primary field, then id ascending.
    pub fn compare(&self, a: &Question, b: &Question) -> Ordering {
        let primary = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Content => a.content.cmp(&b.content),
            SortField::Category => a.category.as_str().cmp(b.category.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
