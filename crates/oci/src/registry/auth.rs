//! `WWW-Authenticate` challenges returned by registries.

use crate::error::RegistryError;

/// Authentication scheme a registry asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

impl Challenge {
    /// Parse a `WWW-Authenticate` header value.
    ///
    /// Parameter values may be quoted; quoted values can contain commas
    /// (scopes such as `repository:foo:pull,push`).
    pub fn parse(header: &str) -> Result<Self, RegistryError> {
        let header = header.trim();
        let (scheme, rest) = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };

        if scheme.eq_ignore_ascii_case("basic") {
            return Ok(Challenge::Basic);
        }

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(RegistryError::Protocol(format!(
                "unsupported authentication scheme '{}'",
                scheme
            )));
        }

        let params = parse_params(rest)?;
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        };

        let realm = get("realm").ok_or_else(|| {
            RegistryError::Protocol("bearer challenge without realm".to_string())
        })?;

        Ok(Challenge::Bearer {
            realm,
            service: get("service"),
            scope: get("scope"),
        })
    }
}

fn parse_params(input: &str) -> Result<Vec<(String, String)>, RegistryError> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if chars.next() != Some('=') {
            return Err(RegistryError::Protocol(format!(
                "malformed challenge parameter '{}'",
                key.trim()
            )));
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(RegistryError::Protocol(
                    "unterminated quoted challenge parameter".to_string(),
                ));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.push((key.trim().to_string(), value));
    }

    Ok(params)
}
