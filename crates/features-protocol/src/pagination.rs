//! Offset/limit pagination for item listings.

use crate::links::{href_with_query, Format};
use crate::types::Link;

/// One page of an items response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
    pub number_matched: u64,
    pub number_returned: u64,
    /// Offset of the next page, if there is one.
    pub next_offset: Option<u64>,
    /// Offset of the previous page, if there is one.
    pub prev_offset: Option<u64>,
}

impl Page {
    /// Compute page figures for an already clamped `limit`.
    pub fn new(limit: u64, offset: u64, number_matched: u64) -> Self {
        let number_returned = limit.min(number_matched.saturating_sub(offset));

        let next_offset = if offset.saturating_add(limit) < number_matched {
            Some((offset + limit).min(number_matched - 1))
        } else {
            None
        };
        let prev_offset = (offset > 0).then(|| offset.saturating_sub(limit));

        Self {
            limit,
            offset,
            number_matched,
            number_returned,
            next_offset,
            prev_offset,
        }
    }

    /// `next` and `prev` links for this page. `query` carries the other
    /// request parameters, which are kept; `limit`, `offset` and `f` are
    /// rewritten.
    pub fn links(&self, href: &str, query: &[(String, String)], format: Format) -> Vec<Link> {
        let mut links = Vec::new();
        if let Some(offset) = self.next_offset {
            links.push(self.link(href, query, format, offset, "next", "Next page"));
        }
        if let Some(offset) = self.prev_offset {
            links.push(self.link(href, query, format, offset, "prev", "Previous page"));
        }
        links
    }

    fn link(
        &self,
        href: &str,
        query: &[(String, String)],
        format: Format,
        offset: u64,
        rel: &str,
        title: &str,
    ) -> Link {
        let limit = self.limit.to_string();
        let offset = offset.to_string();
        let mut pairs: Vec<(&str, &str)> = query
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "limit" | "offset" | "f"))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.push(("limit", &limit));
        pairs.push(("offset", &offset));
        pairs.push(("f", format.f_param()));

        Link::new(href_with_query(href, &pairs), rel)
            .with_type(format.media_type())
            .with_title(title)
    }
}
