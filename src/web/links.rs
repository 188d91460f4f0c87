//! Relative URL builders for threads, posts, and categories.
//!
//! Handlers build redirect targets and paginator bases through these so
//! the path shapes live in one place.

use crate::orm::categories;

/// The thread index doubles as the root category's landing page.
pub fn category_url(category: &categories::Model) -> String {
    if category.level > 0 {
        format!("/categories/{}/", category.id)
    } else {
        "/threads/".to_owned()
    }
}

pub fn category_last_thread_url(category: &categories::Model) -> Option<String> {
    category.last_thread_id.map(|id| thread_url(id, 1))
}

pub fn category_last_post_url(category: &categories::Model) -> Option<String> {
    category.last_thread_id.map(thread_last_post_url)
}

/// Read-marker API endpoint; scoped to the category unless it is the root.
pub fn category_read_api_url(category: &categories::Model) -> String {
    if category.level > 0 {
        format!("/api/threads/read?category={}", category.id)
    } else {
        "/api/threads/read".to_owned()
    }
}

/// Page 1 is the bare thread URL; deeper pages get a page- suffix.
pub fn thread_url(thread_id: i32, page: i32) -> String {
    if page > 1 {
        format!("/threads/{}/page-{}", thread_id, page)
    } else {
        format!("/threads/{}/", thread_id)
    }
}

pub fn thread_last_post_url(thread_id: i32) -> String {
    format!("/threads/{}/last", thread_id)
}

pub fn thread_new_post_url(thread_id: i32) -> String {
    format!("/threads/{}/new", thread_id)
}

pub fn thread_unapproved_post_url(thread_id: i32) -> String {
    format!("/threads/{}/unapproved", thread_id)
}

pub fn thread_api_url(thread_id: i32) -> String {
    format!("/api/threads/{}", thread_id)
}

pub fn post_url(thread_id: i32, post_id: i32) -> String {
    format!("/threads/{}/post-{}", thread_id, post_id)
}

pub fn post_api_url(thread_id: i32, post_id: i32) -> String {
    format!("/api/threads/{}/posts/{}", thread_id, post_id)
}

/// Joins a relative path against the configured site base URL.
pub fn absolute_url(path: &str) -> String {
    let base = crate::app_config::get_app_config().site.base_url;

    match url::Url::parse(&base).and_then(|base| base.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(err) => {
            log::warn!("Bad base_url in configuration: {}", err);
            path.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i32, level: i32, last_thread_id: Option<i32>) -> categories::Model {
        categories::Model {
            id,
            name: "General".to_owned(),
            slug: "general".to_owned(),
            level,
            thread_count: 0,
            post_count: 0,
            last_thread_id,
        }
    }

    #[test]
    fn root_category_links_to_the_thread_index() {
        assert_eq!(category_url(&category(1, 0, None)), "/threads/");
        assert_eq!(category_url(&category(7, 1, None)), "/categories/7/");
    }

    #[test]
    fn category_thread_shortcuts_require_a_last_thread() {
        let empty = category(7, 1, None);
        assert_eq!(category_last_thread_url(&empty), None);
        assert_eq!(category_last_post_url(&empty), None);

        let busy = category(7, 1, Some(31));
        assert_eq!(
            category_last_thread_url(&busy),
            Some("/threads/31/".to_owned())
        );
        assert_eq!(
            category_last_post_url(&busy),
            Some("/threads/31/last".to_owned())
        );
    }

    #[test]
    fn read_api_url_scopes_to_non_root_categories() {
        assert_eq!(
            category_read_api_url(&category(1, 0, None)),
            "/api/threads/read"
        );
        assert_eq!(
            category_read_api_url(&category(7, 2, None)),
            "/api/threads/read?category=7"
        );
    }

    #[test]
    fn page_one_is_elided_from_thread_urls() {
        assert_eq!(thread_url(31, 1), "/threads/31/");
        assert_eq!(thread_url(31, 0), "/threads/31/");
        assert_eq!(thread_url(31, 3), "/threads/31/page-3");
    }

    #[test]
    fn post_and_api_urls() {
        assert_eq!(post_url(31, 450), "/threads/31/post-450");
        assert_eq!(thread_api_url(31), "/api/threads/31");
        assert_eq!(post_api_url(31, 450), "/api/threads/31/posts/450");
    }
}
