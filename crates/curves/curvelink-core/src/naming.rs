//! Scene node and attribute names.
//!
//! Grammar (host convention):
//!   |ns:group|ns:node.attribute
//! - '|' separates DAG path segments (a leading '|' marks an absolute path)
//! - ':' separates the namespace from the node name inside a segment
//! - '.' separates the node from the attribute in a curve name
//!
//! Examples:
//!   "rigA:arm_L"          -> short="rigA:arm_L", namespace="rigA", base="arm_L"
//!   "|rigA:grp|rigA:arm"  -> short="rigA:arm",   namespace="rigA", base="arm"
//!   "face.jawOpen"        -> curve node="face", attribute="jawOpen"

use std::fmt;

/// A destination or source node identified by its flat scene name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    name: String,
}

impl NodeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Full name as given, DAG path included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last DAG segment, namespace kept.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('|').next().unwrap_or(&self.name)
    }

    /// Namespace of the short name, or "" when there is none.
    pub fn namespace(&self) -> &str {
        let short = self.short_name();
        match short.rfind(':') {
            Some(idx) => &short[..idx],
            None => "",
        }
    }

    /// Short name without its namespace.
    pub fn base_name(&self) -> &str {
        strip_namespace(self.short_name())
    }

    /// Return a copy living in `namespace`.
    ///
    /// Only DAG segments in the old namespace change: their namespace is
    /// replaced, or stripped when `namespace` is empty. Parents in other
    /// namespaces are kept as they are.
    pub fn with_namespace(&self, namespace: &str) -> NodeRef {
        let old = self.namespace();
        if old == namespace {
            return self.clone();
        }

        let name = self
            .name
            .split('|')
            .map(|seg| {
                if seg.is_empty() {
                    return String::new();
                }
                let (seg_ns, base) = seg.rsplit_once(':').unwrap_or(("", seg));
                if seg_ns != old {
                    seg.to_string()
                } else if namespace.is_empty() {
                    base.to_string()
                } else {
                    format!("{namespace}:{base}")
                }
            })
            .collect::<Vec<_>>()
            .join("|");
        NodeRef { name }
    }

    /// Suffix containment used by the object matcher: either full name ends with the other.
    pub fn tail_matches(&self, other: &NodeRef) -> bool {
        self.name.ends_with(other.name()) || other.name.ends_with(self.name())
    }
}

fn strip_namespace(segment: &str) -> &str {
    segment.rsplit(':').next().unwrap_or(segment)
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for NodeRef {
    fn from(name: &str) -> Self {
        NodeRef::new(name)
    }
}

impl From<String> for NodeRef {
    fn from(name: String) -> Self {
        NodeRef { name }
    }
}

/// An attribute on a destination node ("node.attribute").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrRef {
    pub node: NodeRef,
    pub attr: String,
}

impl AttrRef {
    pub fn new(node: impl Into<NodeRef>, attr: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            attr: attr.into(),
        }
    }

    /// Parse a "node.attribute" string, see [`split_curve_name`].
    pub fn parse(full: &str) -> Self {
        let (node, attr) = split_curve_name(full);
        Self::new(node, attr)
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.node.name(), self.attr)
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attr)
    }
}

/// Split a curve name at the first '.'; a bare name is used as both node and attribute.
pub fn split_curve_name(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((node, attr)) => (node, attr),
        None => (name, name),
    }
}
