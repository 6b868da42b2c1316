//! Reference URIs.
//!
//! Every versioned op or object in the trace store is addressed by a URI of the form
//! `weave:///entity/project/kind/name:digest[/key/value...]`. Tables drop the name
//! (`.../table/digest`) and calls carry their id instead (`.../call/id`).

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const REF_SCHEME: &str = "weave";
pub const REF_PREFIX: &str = "weave:///";

/// Digest or version selector: `*` matches every version.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*|[a-zA-Z0-9]+)$").unwrap());
static TABLE_DIGEST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]+$").unwrap());

/// Kind segment of a reference URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Object,
    Op,
    Table,
    Call,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Object => "object",
            RefKind::Op => "op",
            RefKind::Table => "table",
            RefKind::Call => "call",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "object" => Ok(RefKind::Object),
            "op" => Ok(RefKind::Op),
            "table" => Ok(RefKind::Table),
            "call" => Ok(RefKind::Call),
            other => Err(Error::InvalidReference(format!("unknown ref kind: {}", other))),
        }
    }
}

/// Parsed reference URI.
///
/// For `Table` refs `name` is empty and `digest` holds the table digest.
/// For `Call` refs `name` holds the call id and `digest` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub entity: String,
    pub project: String,
    pub kind: RefKind,
    pub name: String,
    pub digest: String,
    /// Trailing path segments, always an even number of `key, value` items.
    pub extra: Vec<String>,
}

impl ObjectRef {
    pub fn new(
        entity: impl Into<String>,
        project: impl Into<String>,
        kind: RefKind,
        name: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            project: project.into(),
            kind,
            name: name.into(),
            digest: digest.into(),
            extra: Vec::new(),
        }
    }

    /// Build an op reference from a composite `entity/project` id.
    pub fn op(project_id: &str, name: &str, digest: &str) -> Result<Self> {
        let (entity, project) = split_project_id(project_id)?;
        Ok(Self::new(entity, project, RefKind::Op, name, digest))
    }

    /// Build an object reference from a composite `entity/project` id.
    pub fn object(project_id: &str, name: &str, digest: &str) -> Result<Self> {
        let (entity, project) = split_project_id(project_id)?;
        Ok(Self::new(entity, project, RefKind::Object, name, digest))
    }

    pub fn project_id(&self) -> String {
        format!("{}/{}", self.entity, self.project)
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push(key.into());
        self.extra.push(value.into());
        self
    }

    /// Iterate `(key, value)` pairs of the extra path.
    pub fn extra_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    /// True when the digest selects every version of the name.
    pub fn is_wildcard(&self) -> bool {
        self.digest == "*"
    }

    /// Same reference without the extra path.
    pub fn base(&self) -> Self {
        Self {
            extra: Vec::new(),
            ..self.clone()
        }
    }

    pub fn uri(&self) -> String {
        let tail = match self.kind {
            RefKind::Object | RefKind::Op => format!("{}:{}", self.name, self.digest),
            RefKind::Table => self.digest.clone(),
            RefKind::Call => self.name.clone(),
        };
        let mut uri = format!(
            "{}{}/{}/{}/{}",
            REF_PREFIX, self.entity, self.project, self.kind, tail
        );
        for part in &self.extra {
            uri.push('/');
            uri.push_str(part);
        }
        uri
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl FromStr for ObjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_uri(s)
    }
}

/// Split an `entity/project` composite id.
pub fn split_project_id(project_id: &str) -> Result<(&str, &str)> {
    match project_id.split_once('/') {
        Some((entity, project))
            if !entity.is_empty() && !project.is_empty() && !project.contains('/') =>
        {
            Ok((entity, project))
        }
        _ => Err(Error::InvalidInput(format!(
            "Invalid project_id: {}",
            project_id
        ))),
    }
}

/// Cheap check used when scanning values for references.
pub fn is_ref(s: &str) -> bool {
    s.starts_with(REF_PREFIX)
}

pub fn parse_uri(uri: &str) -> Result<ObjectRef> {
    let invalid = || Error::InvalidReference(uri.to_string());

    let path = uri.strip_prefix(REF_PREFIX).ok_or_else(invalid)?;
    let path = path.trim_end_matches('/');
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 4 {
        return Err(invalid());
    }

    let (entity, project) = (parts[0], parts[1]);
    if entity.is_empty() || project.is_empty() {
        return Err(invalid());
    }
    let kind: RefKind = parts[2].parse().map_err(|_| invalid())?;
    let head = parts[3];
    let extra: Vec<String> = parts[4..].iter().map(|s| s.to_string()).collect();
    if extra.len() % 2 != 0 {
        return Err(invalid());
    }

    let (name, digest) = match kind {
        RefKind::Object | RefKind::Op => {
            let (name, digest) = head.split_once(':').ok_or_else(invalid)?;
            if name.is_empty() || !VERSION_PATTERN.is_match(digest) {
                return Err(invalid());
            }
            (name.to_string(), digest.to_string())
        }
        RefKind::Table => {
            if !TABLE_DIGEST_PATTERN.is_match(head) {
                return Err(invalid());
            }
            (String::new(), head.to_string())
        }
        RefKind::Call => {
            if head.is_empty() {
                return Err(invalid());
            }
            (head.to_string(), String::new())
        }
    };

    Ok(ObjectRef {
        entity: entity.to_string(),
        project: project.to_string(),
        kind,
        name,
        digest,
        extra,
    })
}

/// Short display form: `name:abc`, plus `/1234` for every `id` extra pair.
///
/// Strings that are not references come back unchanged.
pub fn nice_ref(uri: &str) -> String {
    let Ok(parsed) = parse_uri(uri) else {
        return uri.to_string();
    };
    let digest: String = parsed.digest.chars().take(3).collect();
    let mut nice = format!("{}:{}", parsed.name, digest);
    for (key, value) in parsed.extra_pairs() {
        if key == "id" {
            let short: String = value.chars().take(4).collect();
            nice.push('/');
            nice.push_str(&short);
        }
    }
    nice
}

/// Components of a fully qualified op name, split positionally on `/` and `:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpNameParts {
    pub entity: String,
    pub project: String,
    pub kind: String,
    pub name: String,
    pub version: String,
    /// Everything after the `name:version` segment, joined with `/`.
    pub path: Option<String>,
}

pub fn split_op_name(op_name: &str) -> Result<OpNameParts> {
    let invalid = || Error::InvalidReference(op_name.to_string());

    if !is_ref(op_name) {
        return Err(invalid());
    }
    // "weave:", "", "", entity, project, kind, name:version, path...
    let parts: Vec<&str> = op_name.split('/').collect();
    if parts.len() < 7 {
        return Err(invalid());
    }
    let (name, version) = parts[6].split_once(':').ok_or_else(invalid)?;
    let path = if parts.len() > 7 {
        Some(parts[7..].join("/"))
    } else {
        None
    };

    Ok(OpNameParts {
        entity: parts[3].to_string(),
        project: parts[4].to_string(),
        kind: parts[5].to_string(),
        name: name.to_string(),
        version: version.to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_ref() {
        let parsed = parse_uri("weave:///e/p/object/foo:abc123").unwrap();
        assert_eq!(parsed.entity, "e");
        assert_eq!(parsed.project, "p");
        assert_eq!(parsed.kind, RefKind::Object);
        assert_eq!(parsed.name, "foo");
        assert!(parsed.digest.starts_with("abc123"));
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_uri_reproduces_input() {
        let uris = [
            "weave:///e/p/object/foo:abc123",
            "weave:///e/p/op/Model.predict:*",
            "weave:///e/p/object/ds:d1/attr/rows/id/ffee0011",
            "weave:///e/p/table/0a1b2c",
            "weave:///e/p/call/0190-abcd",
        ];
        for uri in uris {
            assert_eq!(parse_uri(uri).unwrap().uri(), uri);
        }
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let parsed = parse_uri("weave:///e/p/object/foo:abc/").unwrap();
        assert_eq!(parsed.uri(), "weave:///e/p/object/foo:abc");
    }

    #[test]
    fn test_invalid_refs() {
        let bad = [
            "foo:abc",
            "weave:///e/p",
            "weave:///e/p/widget/foo:abc",
            "weave:///e/p/object/foo",
            "weave:///e/p/object/:abc",
            "weave:///e/p/object/foo:ab-c",
            "weave:///e/p/object/foo:abc/key",
            "weave:////p/object/foo:abc",
        ];
        for uri in bad {
            let err = parse_uri(uri).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid reference"),
                "{} -> {}",
                uri,
                err
            );
        }
    }

    #[test]
    fn test_op_constructor_requires_composite_project() {
        let r = ObjectRef::op("ent/proj", "score", "d1").unwrap();
        assert_eq!(r.uri(), "weave:///ent/proj/op/score:d1");
        assert!(ObjectRef::op("proj", "score", "d1").is_err());
        assert!(ObjectRef::op("a/b/c", "score", "d1").is_err());
    }

    #[test]
    fn test_nice_ref() {
        assert_eq!(nice_ref("weave:///e/p/object/foo:abc123"), "foo:abc");
        assert_eq!(
            nice_ref("weave:///e/p/object/ds:abc123/attr/rows/id/ffee0011"),
            "ds:abc/ffee"
        );
        assert_eq!(nice_ref("plain text"), "plain text");
    }

    #[test]
    fn test_split_op_name() {
        let parts = split_op_name("weave:///ent/proj/op/predict:v1digest").unwrap();
        assert_eq!(parts.entity, "ent");
        assert_eq!(parts.project, "proj");
        assert_eq!(parts.kind, "op");
        assert_eq!(parts.name, "predict");
        assert_eq!(parts.version, "v1digest");
        assert_eq!(parts.path, None);

        let parts = split_op_name("weave:///ent/proj/op/predict:d/attr/x").unwrap();
        assert_eq!(parts.path.as_deref(), Some("attr/x"));
    }

    #[test]
    fn test_split_op_name_rejects_malformed() {
        for bad in ["predict", "weave:///ent/proj/op", "weave:///ent/proj/op/predict"] {
            let err = split_op_name(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidReference(_)));
        }
    }
}
