use crate::error::MarkingError;

/// Page position within a decoded sheet. Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNavigator {
    current: u32,
    total: u32,
    visited: u32,
}

impl PageNavigator {
    /// A document always has at least one page; zero is treated as one.
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
            visited: 0,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of forward moves taken, revisits included.
    pub fn visited(&self) -> u32 {
        self.visited
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    pub fn next(&mut self) -> Result<u32, MarkingError> {
        if self.current == self.total {
            return Err(self.out_of_range(self.current as i64 + 1));
        }
        self.current += 1;
        self.visited += 1;
        Ok(self.current)
    }

    pub fn prev(&mut self) -> Result<u32, MarkingError> {
        if self.current == 1 {
            return Err(self.out_of_range(0));
        }
        self.current -= 1;
        Ok(self.current)
    }

    pub fn jump_to(&mut self, page: i64) -> Result<u32, MarkingError> {
        if page < 1 || page > self.total as i64 {
            return Err(self.out_of_range(page));
        }
        self.current = page as u32;
        Ok(self.current)
    }

    fn out_of_range(&self, requested: i64) -> MarkingError {
        MarkingError::PageOutOfRange {
            requested,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_next_counts_visits_and_stops_at_end() {
        let mut nav = PageNavigator::new(3);
        assert_eq!(nav.next(), Ok(2));
        assert_eq!(nav.visited(), 1);
        assert_eq!(nav.next(), Ok(3));
        assert_eq!(nav.visited(), 2);
        assert_matches!(
            nav.next(),
            Err(MarkingError::PageOutOfRange {
                requested: 4,
                total: 3
            })
        );
        assert_eq!(nav.current(), 3);
        assert_eq!(nav.visited(), 2);
    }

    #[test]
    fn test_prev_fails_on_first_page() {
        let mut nav = PageNavigator::new(2);
        assert_matches!(nav.prev(), Err(MarkingError::PageOutOfRange { .. }));
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn test_revisits_still_count() {
        let mut nav = PageNavigator::new(3);
        nav.next().unwrap();
        nav.prev().unwrap();
        nav.next().unwrap();
        assert_eq!(nav.visited(), 2);
    }

    #[test]
    fn test_jump_is_validated() {
        let mut nav = PageNavigator::new(4);
        assert_eq!(nav.jump_to(4), Ok(4));
        assert_matches!(nav.jump_to(0), Err(MarkingError::PageOutOfRange { .. }));
        assert_matches!(nav.jump_to(5), Err(MarkingError::PageOutOfRange { .. }));
        assert_eq!(nav.current(), 4);
        assert_eq!(nav.visited(), 0);
    }
}
