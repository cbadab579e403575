use serde::{Deserialize, Serialize};

/// Offset-paginated listing wrapper. Listings select `COUNT(*) OVER()` into
/// each row so one query yields both the page and the window total.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_count: i64,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let last_offset = ((total_rows - 1) / page_size) * page_size;
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);
        let page_count = (total_rows + page_size - 1) / page_size;

        let shown_to = (current_offset + page_size).min(total_rows);
        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_count,
            message: Some(format!("{current_offset} - {shown_to} / {total_rows}")),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_count: 1,
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_yield_the_no_result_page() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 6, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.message.as_deref(), Some("No results"));
    }

    #[test]
    fn offsets_are_clamped_to_the_window() {
        let rows: Vec<i32> = (0..6).collect();
        let page = PageContext::from_rows(rows, 14, 6, 0);

        assert_eq!(page.page_count, 3);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.next_offset, 6);
    }

    #[test]
    fn last_page_does_not_advance_past_the_end() {
        let rows: Vec<i32> = (0..2).collect();
        let page = PageContext::from_rows(rows, 14, 6, 12);

        assert_eq!(page.next_offset, 12);
        assert_eq!(page.prev_offset, 6);
        assert_eq!(page.message.as_deref(), Some("12 - 14 / 14"));
    }
}
