//! Page windows and sort direction for list queries.

pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sort {
    #[default]
    Desc,
    Asc,
}

impl Sort {
    /// Splits `created-at-desc` into `("created-at", Sort::Desc)`.
    pub fn split_suffix(raw: &str) -> Option<(&str, Self)> {
        if let Some(field) = raw.strip_suffix("-desc") {
            Some((field, Self::Desc))
        } else {
            raw.strip_suffix("-asc").map(|field| (field, Self::Asc))
        }
    }
}

/// One page of a list: `per_page` in 1..=100, `page` starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub per_page: u32,
    pub page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

impl PageRequest {
    /// Builds a page from optional `per-page` / `page` query values.
    pub fn from_query(per_page: Option<u32>, page: Option<u32>) -> Self {
        Self {
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE),
            page: page.unwrap_or(1),
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
            page: self.page.max(1),
        }
    }

    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(self) -> u64 {
        u64::from(self.per_page)
    }
}
