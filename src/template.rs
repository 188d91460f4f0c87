use askama_actix::Template;

const PAGINATOR_LOOK_AHEAD: i32 = 2;

/// Windowed page navigation.
///
/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 11 12 [13]
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: i32,
    pub page_count: i32,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
}

pub trait PaginatorToHtml {
    fn as_html(&self) -> String;
    fn has_pages(&self) -> bool;
    fn is_current_page(&self, page: &i32) -> bool;
    /// Pages to render in order; None marks an elided run ("...").
    fn get_items(&self) -> Vec<Option<i32>>;
    fn page_url(&self, page: &i32) -> String;
}

impl PaginatorToHtml for Paginator {
    fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    fn is_current_page(&self, page: &i32) -> bool {
        *page == self.this_page
    }

    fn page_url(&self, page: &i32) -> String {
        if *page <= 1 {
            self.base_url.clone()
        } else {
            format!("{}/page-{}", self.base_url.trim_end_matches('/'), page)
        }
    }

    fn get_items(&self) -> Vec<Option<i32>> {
        // The cursor window reaches LOOK_AHEAD to either side. Runs that
        // would touch page 1 or the last page merge with them instead of
        // eliding a single page.
        let near_start = self.this_page - PAGINATOR_LOOK_AHEAD <= 1 + PAGINATOR_LOOK_AHEAD;
        let near_end =
            self.this_page + PAGINATOR_LOOK_AHEAD >= self.page_count - PAGINATOR_LOOK_AHEAD;

        let mut items: Vec<Option<i32>> = Vec::new();
        match (near_start, near_end) {
            (true, true) => {
                items.extend((1..=self.page_count).map(Some));
            }
            (true, false) => {
                items.extend((1..=self.this_page + PAGINATOR_LOOK_AHEAD).map(Some));
                items.push(None);
                items.push(Some(self.page_count));
            }
            (false, true) => {
                items.push(Some(1));
                items.push(None);
                items.extend(
                    ((self.this_page - PAGINATOR_LOOK_AHEAD)..=self.page_count).map(Some),
                );
            }
            (false, false) => {
                items.push(Some(1));
                items.push(None);
                items.extend(
                    ((self.this_page - PAGINATOR_LOOK_AHEAD)
                        ..=(self.this_page + PAGINATOR_LOOK_AHEAD))
                        .map(Some),
                );
                items.push(None);
                items.push(Some(self.page_count));
            }
        }
        items
    }

    fn as_html(&self) -> String {
        if self.has_pages() {
            let mut buffer = String::new();
            let template = PaginatorTemplate { paginator: self };
            if template.render_into(&mut buffer).is_err() {
                "[Paginator Util Error]".to_owned()
            } else {
                buffer
            }
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(this_page: i32, page_count: i32) -> Paginator {
        Paginator {
            base_url: "/threads/1/".to_owned(),
            this_page,
            page_count,
        }
    }

    #[test]
    fn single_page_renders_nothing() {
        let p = pages(1, 1);
        assert!(!p.has_pages());
        assert_eq!(p.as_html(), "");
    }

    #[test]
    fn short_paginator_is_one_run() {
        let items = pages(2, 5).get_items();
        assert_eq!(items, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn leading_cursor_elides_the_tail() {
        let items = pages(3, 13).get_items();
        assert_eq!(
            items,
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(13)]
        );
    }

    #[test]
    fn middle_cursor_elides_both_sides() {
        let items = pages(6, 13).get_items();
        assert_eq!(
            items,
            vec![
                Some(1),
                None,
                Some(4),
                Some(5),
                Some(6),
                Some(7),
                Some(8),
                None,
                Some(13)
            ]
        );
    }

    #[test]
    fn trailing_cursor_elides_the_head() {
        let items = pages(12, 13).get_items();
        assert_eq!(
            items,
            vec![Some(1), None, Some(10), Some(11), Some(12), Some(13)]
        );
    }

    #[test]
    fn page_one_links_to_the_base_url() {
        let p = pages(2, 3);
        assert_eq!(p.page_url(&1), "/threads/1/");
        assert_eq!(p.page_url(&3), "/threads/1/page-3");
    }
}
