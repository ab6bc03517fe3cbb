use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid application id '{0}': expected <namespace>:<kind>:<name>")]
pub struct ParseIdError(String);

/// Identifies an application as `namespace:kind:name`. The namespace may be
/// empty for applications that don't live in one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApplicationId {
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

impl ApplicationId {
    pub fn new<T: Into<String>, U: Into<String>, V: Into<String>>(
        namespace: T,
        kind: U,
        name: V,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl FromStr for ApplicationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();

        match parts[..] {
            [namespace, kind, name] if !kind.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, kind, name))
            }
            _ => Err(ParseIdError(s.to_string())),
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.kind, self.name)
    }
}
