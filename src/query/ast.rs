use indexmap::IndexMap;
use serde::Serialize;

/// Parameters of a call, in the order they were written.
///
/// Equality ignores order; iteration keeps it.
pub type Parameters = IndexMap<String, String>;

/// Which of the three AST shapes a node has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Top-level call
    Root,
    /// Nested call with its own parameters and children
    Node,
    /// Plain field reference
    Leaf,
}

/// AST node for a parsed query.
///
/// Roots, nodes and leaves share one payload; leaves always have empty
/// `parameters` and `children`, roots and nodes always have children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Parameters,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn root(name: impl Into<String>, parameters: Parameters, children: Vec<AstNode>) -> Self {
        Self {
            kind: NodeKind::Root,
            name: name.into(),
            alias: None,
            parameters,
            children,
        }
    }

    pub fn node(name: impl Into<String>, parameters: Parameters, children: Vec<AstNode>) -> Self {
        Self {
            kind: NodeKind::Node,
            name: name.into(),
            alias: None,
            parameters,
            children,
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Leaf,
            name: name.into(),
            alias: None,
            parameters: Parameters::new(),
            children: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Key this node's value is reported under: the alias if any, else the name
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Build a [`Parameters`] map from string pairs
pub fn parameters<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Parameters {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
