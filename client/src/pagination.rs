use std::fmt;

/// Which listing page is shown, and how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: u32,
    total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            current_page: 1,
            total_pages: 1,
        }
    }
}

impl Pagination {
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page before the current one, `None` on the first page.
    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.current_page - 1)
    }

    /// Page after the current one, `None` on the last page.
    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.current_page + 1)
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    pub fn set_total_pages(&mut self, total: u32) {
        self.total_pages = total.max(1);
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prev = if self.has_previous() { "<" } else { " " };
        let next = if self.has_next() { ">" } else { " " };
        write!(f, "{prev} {}/{} {next}", self.current_page, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let mut pagination = Pagination::default();
        assert_eq!(pagination.previous(), None);
        assert_eq!(pagination.next(), None);

        pagination.set_total_pages(3);
        assert_eq!(pagination.previous(), None);
        assert_eq!(pagination.next(), Some(2));

        pagination.set_current_page(3);
        assert_eq!(pagination.previous(), Some(2));
        assert_eq!(pagination.next(), None);
    }

    #[test]
    fn test_never_below_one() {
        let mut pagination = Pagination::default();
        pagination.set_total_pages(0);
        pagination.set_current_page(0);
        assert_eq!(pagination.total_pages(), 1);
        assert_eq!(pagination.current_page(), 1);
    }

    #[test]
    fn test_display() {
        let mut pagination = Pagination::default();
        pagination.set_total_pages(5);
        pagination.set_current_page(2);
        assert_eq!(pagination.to_string(), "< 2/5 >");

        pagination.set_current_page(5);
        assert_eq!(pagination.to_string(), "< 5/5  ");
    }
}
