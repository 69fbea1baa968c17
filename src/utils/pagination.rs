pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
    pub offset: u64,
}

/// 1-based page; per_page clamped to 1..=100.
pub fn paginate(page: Option<u32>, per_page: Option<u32>) -> Page {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    Page {
        page,
        per_page,
        offset: (page as u64 - 1) * per_page as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(paginate(None, None), Page { page: 1, per_page: 10, offset: 0 });
        assert_eq!(paginate(Some(0), Some(0)), Page { page: 1, per_page: 1, offset: 0 });
        assert_eq!(paginate(Some(3), Some(500)), Page { page: 3, per_page: 100, offset: 200 });
    }
}
