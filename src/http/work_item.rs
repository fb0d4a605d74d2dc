use std::fmt;
use std::path::Path;

use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::error::{AppError, AppResult, HttpError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVerb {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        }
    }

    #[must_use]
    pub fn to_method(self) -> reqwest::Method {
        match self {
            HttpVerb::Get => reqwest::Method::GET,
            HttpVerb::Post => reqwest::Method::POST,
            HttpVerb::Put => reqwest::Method::PUT,
            HttpVerb::Patch => reqwest::Method::PATCH,
            HttpVerb::Delete => reqwest::Method::DELETE,
            HttpVerb::Head => reqwest::Method::HEAD,
            HttpVerb::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpVerb {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpVerb::Get),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "PATCH" => Ok(HttpVerb::Patch),
            "DELETE" => Ok(HttpVerb::Delete),
            "HEAD" => Ok(HttpVerb::Head),
            "OPTIONS" => Ok(HttpVerb::Options),
            _ => Err(ValidationError::UnsupportedVerb { verb: s.to_owned() }),
        }
    }
}

/// One parsed line of the URL file.
///
/// The source line is kept so the item can be shipped to worker processes
/// verbatim and parsed again on the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    verb: HttpVerb,
    url: Url,
    headers: Vec<(HeaderName, HeaderValue)>,
    line: String,
}

impl WorkItem {
    /// Parses `[-X VERB] [-H 'Name: value']... URL`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown flags, missing flag values, bad headers,
    /// unsupported verbs, or a missing or invalid URL.
    pub fn parse(line: &str) -> Result<Self, ValidationError> {
        let tokens = tokenize(line);
        let mut verb = HttpVerb::default();
        let mut headers = Vec::new();
        let mut target: Option<String> = None;

        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            match token.as_str() {
                "-X" | "--verb" | "--request" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| ValidationError::WorkItemDanglingFlag {
                            flag: token.clone(),
                        })?;
                    verb = value.parse()?;
                }
                "-H" | "--header" => {
                    let mut value = iter
                        .next()
                        .ok_or_else(|| ValidationError::WorkItemDanglingFlag {
                            flag: token.clone(),
                        })?;
                    // `-H Name: value` written without quotes.
                    if value.ends_with(':')
                        && let Some(rest) = iter.next()
                    {
                        value.push(' ');
                        value.push_str(&rest);
                    }
                    headers.push(parse_header_pair(&value)?);
                }
                flag if flag.starts_with('-') => {
                    return Err(ValidationError::WorkItemUnknownFlag {
                        flag: flag.to_owned(),
                    });
                }
                _ => {
                    if target.is_some() {
                        return Err(ValidationError::WorkItemExtraUrl {
                            input: line.to_owned(),
                        });
                    }
                    target = Some(token);
                }
            }
        }

        let target = target.ok_or_else(|| ValidationError::WorkItemMissingUrl {
            input: line.to_owned(),
        })?;
        let url = parse_target(&target)?;

        Ok(Self {
            verb,
            url,
            headers,
            line: line.trim().to_owned(),
        })
    }

    #[must_use]
    pub const fn verb(&self) -> HttpVerb {
        self.verb
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// Parses every non-blank, non-comment line.
///
/// # Errors
///
/// Returns the first invalid line, numbered from 1.
pub fn parse_work_items<I, S>(lines: I) -> Result<Vec<WorkItem>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let item = WorkItem::parse(line).map_err(|err| ValidationError::InvalidWorkItem {
            line: index.saturating_add(1),
            reason: err.to_string(),
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Reads and parses a URL file.
///
/// # Errors
///
/// Returns an error when the file cannot be read, a line is invalid, or the
/// file holds no work items.
pub fn load_work_items(path: &Path) -> AppResult<Vec<WorkItem>> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::http(HttpError::ReadUrlFile {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let items = parse_work_items(content.lines())?;
    if items.is_empty() {
        return Err(AppError::validation(ValidationError::EmptyWorkItems));
    }
    Ok(items)
}

fn parse_header_pair(value: &str) -> Result<(HeaderName, HeaderValue), ValidationError> {
    let invalid = || ValidationError::InvalidHeaderFormat {
        value: value.to_owned(),
    };
    let (name, header_value) = crate::args::parse_header(value)?;
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_err| invalid())?;
    let header_value = HeaderValue::from_str(&header_value).map_err(|_err| invalid())?;
    Ok((name, header_value))
}

fn parse_target(target: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(target).map_err(|err| ValidationError::InvalidUrl {
        url: target.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}

/// Splits on whitespace; single or double quotes group a token.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
