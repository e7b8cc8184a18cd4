//! resolv.conf model
//!
//! Parses an existing resolv.conf, keeping comments and unknown options in
//! place, and lets nameservers and search domains be appended within the
//! resolver's limits.

use crate::SysconfigError;
use std::fmt;

/// Maximum nameservers the resolver honours
pub const MAX_NAMESERVERS: usize = 3;

/// Maximum search domains
pub const MAX_SEARCH_DOMAINS: usize = 6;

/// Maximum length of the search list
pub const MAX_SEARCH_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Blank,
    Comment(String),
    Option {
        key: String,
        value: String,
        /// Trailing `# ...` / `; ...`, including its leading whitespace
        tail: String,
    },
}

/// In-memory resolv.conf
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvConf {
    lines: Vec<Line>,
}

impl ResolvConf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|raw| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Line::Blank;
                }
                if trimmed.starts_with('#') || trimmed.starts_with(';') {
                    return Line::Comment(trimmed.to_string());
                }
                let (head, tail) = match raw.find(['#', ';']) {
                    Some(pos) => raw.split_at(pos),
                    None => (raw, ""),
                };
                let head = head.trim();
                let (key, value) = head
                    .split_once(char::is_whitespace)
                    .map(|(k, v)| (k, v.trim()))
                    .unwrap_or((head, ""));
                let tail = if tail.is_empty() {
                    String::new()
                } else {
                    format!(" {}", tail)
                };
                Line::Option {
                    key: key.to_string(),
                    value: value.to_string(),
                    tail,
                }
            })
            .collect();
        Self { lines }
    }

    fn option_values<'a>(&'a self, wanted: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines.iter().filter_map(move |line| match line {
            Line::Option { key, value, .. } if key == wanted => Some(value.as_str()),
            _ => None,
        })
    }

    fn remove_option(&mut self, wanted: &str) {
        self.lines
            .retain(|line| !matches!(line, Line::Option { key, .. } if key == wanted));
    }

    fn push_option(&mut self, key: &str, value: String) {
        self.lines.push(Line::Option {
            key: key.to_string(),
            value,
            tail: String::new(),
        });
    }

    pub fn nameservers(&self) -> Vec<String> {
        self.option_values("nameserver").map(str::to_string).collect()
    }

    pub fn search_domains(&self) -> Vec<String> {
        self.option_values("search")
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect()
    }

    /// Add a nameserver; already present ones are left alone
    pub fn add_nameserver(&mut self, nameserver: &str) -> Result<(), SysconfigError> {
        let mut current = self.nameservers();
        if current.iter().any(|ns| ns == nameserver) {
            return Ok(());
        }
        if current.len() >= MAX_NAMESERVERS {
            return Err(SysconfigError::ResolvConf(format!(
                "Adding '{}' would go beyond the '{}' maximum nameservers",
                nameserver, MAX_NAMESERVERS
            )));
        }

        current.push(nameserver.to_string());
        self.remove_option("nameserver");
        for ns in current {
            self.push_option("nameserver", ns);
        }
        Ok(())
    }

    /// Add a search domain; already present ones are left alone
    pub fn add_search_domain(&mut self, domain: &str) -> Result<(), SysconfigError> {
        let mut current = self.search_domains();
        if current.iter().any(|d| d == domain) {
            return Ok(());
        }

        current.push(domain.to_string());
        if current.len() > MAX_SEARCH_DOMAINS {
            return Err(SysconfigError::ResolvConf(format!(
                "Adding '{}' would go beyond the '{}' maximum search domains",
                domain, MAX_SEARCH_DOMAINS
            )));
        }
        let joined = current.join(" ");
        if joined.len() > MAX_SEARCH_LENGTH {
            return Err(SysconfigError::ResolvConf(format!(
                "Adding '{}' would go beyond the {} character search list limit",
                domain, MAX_SEARCH_LENGTH
            )));
        }

        self.remove_option("search");
        self.push_option("search", joined);
        Ok(())
    }
}

impl fmt::Display for ResolvConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Blank => writeln!(f)?,
                Line::Comment(text) => writeln!(f, "{}", text)?,
                Line::Option { key, value, tail } => writeln!(f, "{} {}{}", key, value, tail)?,
            }
        }
        Ok(())
    }
}
