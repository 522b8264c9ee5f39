/// Splits a sorted post list into index pages.
///
/// The page count truncates (`len / page_size`): with 12 posts and pages of
/// 5 there are 2 pages, and the last 2 posts are on none of them. Page 1 is
/// always available so a short blog still gets a front page.
pub struct Paginator<'a, T> {
    post_list: &'a [T],
    page_size: usize,
    page_count: usize,
}

pub fn page_count(post_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    post_count / page_size
}

impl<'a, T> Paginator<'a, T> {
    pub fn from(post_list: &'a [T], page_size: usize) -> Self {
        Paginator {
            post_list,
            page_size,
            page_count: page_count(post_list.len(), page_size),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages that get rendered: `1..=max(page_count, 1)`.
    pub fn rendered_pages(&self) -> usize {
        self.page_count.max(1)
    }

    pub fn get_page(&self, page: usize) -> Result<&'a [T], String> {
        match page {
            0 => return Err("Page has to be greater than 0".to_string()),
            x if x > self.rendered_pages() => return Err(format!("Page has to be less than page_count ({})", self.page_count)),
            _ => {}
        };

        let index = (page - 1) * self.page_size;
        let end = (index + self.page_size).min(self.post_list.len());
        let start = index.min(end);
        Ok(&self.post_list[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_truncates() {
        assert_eq!(page_count(12, 5), 2);
        assert_eq!(page_count(10, 5), 2);
        assert_eq!(page_count(4, 5), 0);
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(3, 0), 0);
    }

    #[test]
    fn test_happy_case() {
        let items = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];
        let paginator = Paginator::from(&items, 3);
        assert_eq!(paginator.page_count(), 4);
        assert_eq!(paginator.get_page(1), Ok([1, 2, 3].as_slice()));
        assert_eq!(paginator.get_page(2), Ok([4, 5, 6].as_slice()));
        assert_eq!(paginator.get_page(4), Ok([10, 11, 12].as_slice()));

        assert_eq!(paginator.get_page(0), Err("Page has to be greater than 0".to_string()));
        assert_eq!(paginator.get_page(5), Err("Page has to be less than page_count (4)".to_string()));
    }

    #[test]
    fn test_short_list_has_front_page() {
        let items = vec![1, 2];
        let paginator = Paginator::from(&items, 5);
        assert_eq!(paginator.page_count(), 0);
        assert_eq!(paginator.rendered_pages(), 1);
        assert_eq!(paginator.get_page(1), Ok([1, 2].as_slice()));
    }

    #[test]
    fn test_empty() {
        let items: Vec<u32> = vec![];
        let paginator = Paginator::from(&items, 3);
        assert_eq!(paginator.page_count(), 0);
        assert_eq!(paginator.get_page(1), Ok([].as_slice()));
        assert_eq!(paginator.get_page(2), Err("Page has to be less than page_count (0)".to_string()));
    }
}
