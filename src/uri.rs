//! URI parsing/encoding and URI↔filesystem-path conversion (§4.4).
//!
//! Ported from `original_source`'s `uri` class: a state-machine split into
//! scheme/user/password/host/port/path/query/fragment, percent-decoding
//! every component during parse and re-encoding each against its own
//! allowed-character set on the way back out via `percent-encoding`.

use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Encodes every byte except the RFC 3986 unreserved set (letters, digits,
/// `-._~`); individual components widen this with the separators they leave
/// unescaped (`/` for paths, `&` for queries).
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
const PATH_SAFE: &AsciiSet = &UNRESERVED.remove(b'/');
const QUERY_SAFE: &AsciiSet = &UNRESERVED.remove(b'&');

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("uri is missing a scheme")]
    MissingScheme,
    #[error("invalid percent-encoding at byte {0}")]
    InvalidPercentEncoding(usize),
}

impl Uri {
    /// Parses `text` into its components, percent-decoding each as it goes.
    pub fn parse(text: &str) -> Result<Self, UriError> {
        let (scheme, rest) = split_scheme(text)?;
        let mut uri = Uri { scheme, ..Uri::default() };

        let (authority_and_path, query, fragment) = split_query_fragment(rest);
        uri.query = query.map(|q| percent_decode(q)).transpose()?;
        uri.fragment = fragment.map(|f| percent_decode(f)).transpose()?;

        if let Some(after_slashes) = authority_and_path.strip_prefix("//") {
            let (authority, path) = split_authority_path(after_slashes);
            let (userinfo, hostport) = split_authority(authority);
            if let Some(userinfo) = userinfo {
                let (user, password) = match userinfo.split_once(':') {
                    Some((u, p)) => (u, Some(p)),
                    None => (userinfo, None),
                };
                uri.user = Some(percent_decode(user)?);
                uri.password = password.map(percent_decode).transpose()?;
            }
            let (host, port) = split_host_port(hostport);
            if !host.is_empty() {
                uri.host = Some(percent_decode(host)?);
            }
            uri.port = port.map(|p| p.parse()).transpose().map_err(|_| UriError::InvalidPercentEncoding(0))?;
            uri.path = percent_decode(path)?;
        } else {
            uri.path = percent_decode(authority_and_path)?;
        }

        Ok(uri)
    }

    /// Re-encodes the URI, percent-escaping each component against the
    /// allowed-character set that component uses.
    pub fn encoded(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.scheme);
        out.push(':');

        let has_authority = self.host.is_some() || self.user.is_some() || self.port.is_some();
        if has_authority {
            out.push_str("//");
            if let Some(user) = &self.user {
                out.push_str(&percent_encode(user, UNRESERVED));
                if let Some(password) = &self.password {
                    out.push(':');
                    out.push_str(&percent_encode(password, UNRESERVED));
                }
                out.push('@');
            }
            if let Some(host) = &self.host {
                out.push_str(&percent_encode(host, UNRESERVED));
            }
            if let Some(port) = self.port {
                out.push(':');
                out.push_str(&port.to_string());
            }
        }

        out.push_str(&percent_encode(&self.path, PATH_SAFE));

        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(&percent_encode(query, QUERY_SAFE));
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(&percent_encode(fragment, UNRESERVED));
        }
        out
    }

    /// Converts a `file://` URI into a filesystem path. Requires the
    /// `file` scheme; any authority other than an empty or `localhost` host
    /// is preserved as a UNC-style prefix.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme != "file" {
            return None;
        }
        match &self.host {
            None | Some(_) if self.host.as_deref().is_none_or(|h| h.is_empty() || h == "localhost") => {
                Some(PathBuf::from(&self.path))
            }
            Some(host) => Some(PathBuf::from(format!("//{host}{}", self.path))),
        }
    }

    /// Converts a filesystem path into a `file://` URI.
    pub fn from_file_path(path: &Path) -> Self {
        let path_str = path.to_string_lossy().replace('\\', "/");
        let path_str = if path_str.starts_with('/') { path_str } else { format!("/{path_str}") };
        Uri { scheme: "file".to_string(), path: path_str, ..Uri::default() }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

fn split_scheme(text: &str) -> Result<(String, &str), UriError> {
    let colon = text.find(':').ok_or(UriError::MissingScheme)?;
    let scheme = &text[..colon];
    if scheme.is_empty() || !scheme.chars().next().unwrap().is_ascii_alphabetic() {
        return Err(UriError::MissingScheme);
    }
    Ok((scheme.to_ascii_lowercase(), &text[colon + 1..]))
}

fn split_query_fragment(text: &str) -> (&str, Option<&str>, Option<&str>) {
    let (before_fragment, fragment) = match text.find('#') {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    };
    let (before_query, query) = match before_fragment.find('?') {
        Some(i) => (&before_fragment[..i], Some(&before_fragment[i + 1..])),
        None => (before_fragment, None),
    };
    (before_query, query, fragment)
}

fn split_authority_path(text: &str) -> (&str, &str) {
    match text.find('/') {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

fn split_authority(authority: &str) -> (Option<&str>, &str) {
    match authority.find('@') {
        Some(i) => (Some(&authority[..i]), &authority[i + 1..]),
        None => (None, authority),
    }
}

fn split_host_port(hostport: &str) -> (&str, Option<&str>) {
    match hostport.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => (host, Some(port)),
        _ => (hostport, None),
    }
}

fn percent_decode(text: &str) -> Result<String, UriError> {
    percent_decode_str(text).decode_utf8().map(|s| s.into_owned()).map_err(|_| UriError::InvalidPercentEncoding(0))
}

fn percent_encode(text: &str, allowed: &'static AsciiSet) -> String {
    utf8_percent_encode(text, allowed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_components() {
        let uri = Uri::parse("tl://user:pass@host:8080/a/b%20c?q=1&r=2#frag").unwrap();
        assert_eq!(uri.scheme, "tl");
        assert_eq!(uri.user.as_deref(), Some("user"));
        assert_eq!(uri.password.as_deref(), Some("pass"));
        assert_eq!(uri.host.as_deref(), Some("host"));
        assert_eq!(uri.port, Some(8080));
        assert_eq!(uri.path, "/a/b c");
        assert_eq!(uri.query.as_deref(), Some("q=1&r=2"));
        assert_eq!(uri.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn round_trips_on_canonical_subset() {
        let original = "file:///a/b%20c/d";
        let uri = Uri::parse(original).unwrap();
        assert_eq!(uri.encoded(), original);
    }

    #[test]
    fn file_path_round_trip() {
        let path = Path::new("/a/b/c.tl");
        let uri = Uri::from_file_path(path);
        assert_eq!(uri.to_file_path().unwrap(), path);
    }

    #[test]
    fn path_without_authority_parses() {
        let uri = Uri::parse("untitled:Untitled-1").unwrap();
        assert_eq!(uri.scheme, "untitled");
        assert_eq!(uri.path, "Untitled-1");
        assert!(uri.host.is_none());
    }
}
