//! On-disk user record formats
//!
//! A record holds exactly one password and one roles container. The XML
//! form mirrors the historical layout:
//!
//! ```xml
//! <user>
//!   <name>p.fogg</name>
//!   <roles>
//!     <name>user</name>
//!   </roles>
//!   <password>password</password>
//!   <email>p.fogg@example.org</email>
//! </user>
//! ```
//!
//! An absent roles container is malformed; a user without roles has an
//! empty `<roles/>` element.

use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error produced when a record does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRecordError(String);

impl ParseRecordError {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseRecordError {}

/// Error type for parsing a record format name
#[derive(Debug, Clone)]
pub struct ParseRecordFormatError(String);

impl fmt::Display for ParseRecordFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid record format: {}", self.0)
    }
}

impl std::error::Error for ParseRecordFormatError {}

/// Serialization used for per-user record files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// `user.xml` documents
    #[default]
    Xml,
    /// `user.toml` documents
    Toml,
}

impl RecordFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordFormat::Xml => "xml",
            RecordFormat::Toml => "toml",
        }
    }

    /// File name used for a record when none is configured
    pub fn default_file_name(&self) -> &'static str {
        match self {
            RecordFormat::Xml => "user.xml",
            RecordFormat::Toml => "user.toml",
        }
    }

    /// Parse a record document in this format
    pub fn parse(&self, content: &str) -> Result<UserRecord, ParseRecordError> {
        match self {
            RecordFormat::Xml => parse_xml(content),
            RecordFormat::Toml => parse_toml(content),
        }
    }
}

impl FromStr for RecordFormat {
    type Err = ParseRecordFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(RecordFormat::Xml),
            "toml" => Ok(RecordFormat::Toml),
            _ => Err(ParseRecordFormatError(s.to_string())),
        }
    }
}

/// Parsed contents of one user record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    /// Informational only; the lookup key names the principal
    pub name: Option<String>,
    pub password: String,
    pub roles: Vec<String>,
    pub email: Option<String>,
}

impl UserRecord {
    pub fn into_principal(self, username: &str) -> crate::Principal {
        crate::Principal::new(username, self.password, self.roles, self.email)
    }
}

fn parse_toml(content: &str) -> Result<UserRecord, ParseRecordError> {
    toml::from_str(content).map_err(|e| ParseRecordError::new(e.message().to_string()))
}

fn parse_xml(content: &str) -> Result<UserRecord, ParseRecordError> {
    // A fresh document per call; nothing is shared between parses.
    // Internal DTDs are accepted, external ones are never fetched.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(content, options)
        .map_err(|e| ParseRecordError::new(e.to_string()))?;

    let user = doc
        .descendants()
        .find(|n| is_element_named(n, "user"))
        .ok_or_else(|| ParseRecordError::new("missing <user> element"))?;

    let password = user
        .descendants()
        .find(|n| is_element_named(n, "password"))
        .map(|n| text_content(&n))
        .ok_or_else(|| ParseRecordError::new("missing <password> element"))?;

    let roles_container = user
        .descendants()
        .find(|n| is_element_named(n, "roles"))
        .ok_or_else(|| ParseRecordError::new("missing <roles> element"))?;

    let roles = roles_container
        .children()
        .filter(|n| is_element_named(n, "name"))
        .map(|n| text_content(&n))
        .collect();

    let name = user
        .children()
        .find(|n| is_element_named(n, "name"))
        .map(|n| text_content(&n));

    let email = user
        .descendants()
        .find(|n| is_element_named(n, "email"))
        .map(|n| text_content(&n));

    Ok(UserRecord {
        name,
        password,
        roles,
        email,
    })
}

fn is_element_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.has_tag_name(name)
}

/// Concatenated text of every descendant text node, untrimmed
fn text_content(node: &Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
