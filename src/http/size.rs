//! Estimated HTTP/1.1 wire sizes, counted the way a request or response
//! dump would render them.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, USER_AGENT};

use super::WorkItem;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: usize = 2;
/// `": "` between a header name and its value.
const HEADER_SEPARATOR: usize = 2;

pub(super) fn request_size(item: &WorkItem, user_agent: &str) -> u64 {
    let url = item.url();
    let mut target_len = url.path().len();
    if let Some(query) = url.query() {
        target_len = target_len.saturating_add(1).saturating_add(query.len());
    }

    // VERB SP target SP version CRLF
    let mut total = item
        .verb()
        .as_str()
        .len()
        .saturating_add(1)
        .saturating_add(target_len)
        .saturating_add(1)
        .saturating_add(HTTP_VERSION.len())
        .saturating_add(CRLF);

    let mut host_len = url.host_str().map_or(0, str::len);
    if let Some(port) = url.port() {
        host_len = host_len
            .saturating_add(1)
            .saturating_add(port.to_string().len());
    }
    total = total.saturating_add(header_line("Host".len(), host_len));

    let overrides_agent = item.headers().iter().any(|(name, _)| *name == USER_AGENT);
    if !overrides_agent {
        total = total.saturating_add(header_line("User-Agent".len(), user_agent.len()));
    }

    for (name, value) in item.headers() {
        total = total.saturating_add(header_line(name.as_str().len(), value.as_bytes().len()));
    }

    to_u64(total.saturating_add(CRLF))
}

pub(super) fn response_head_size(status: StatusCode, headers: &HeaderMap) -> u64 {
    let reason_len = status.canonical_reason().map_or(0, str::len);
    // version SP code SP reason CRLF
    let mut total = HTTP_VERSION
        .len()
        .saturating_add(1)
        .saturating_add(status.as_str().len())
        .saturating_add(1)
        .saturating_add(reason_len)
        .saturating_add(CRLF);

    for (name, value) in headers {
        total = total.saturating_add(header_line(name.as_str().len(), value.as_bytes().len()));
    }

    to_u64(total.saturating_add(CRLF))
}

const fn header_line(name_len: usize, value_len: usize) -> usize {
    name_len
        .saturating_add(HEADER_SEPARATOR)
        .saturating_add(value_len)
        .saturating_add(CRLF)
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
