use std::collections::BTreeSet;

use indexmap::IndexMap;
use text_size::TextRange;

use crate::arena::Key;

pub type NodeId = Key<Node>;

/// Declaration modifiers collected in front of a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Final,
    Abstract,
    Private,
    Protected,
    Public,
    Static,
}

/// Parameters with a default value are keyed by name, the others by position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgKey {
    Index(usize),
    Name(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    /// Alias to fully qualified name, in declaration order.
    pub uses: IndexMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassLike {
    pub name: String,
    pub extends: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub args: IndexMap<ArgKey, String>,
    pub visibility: BTreeSet<Modifier>,
    pub is_method: bool,
    pub is_closure: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The implicit global namespace.
    File(Namespace),
    Open,
    Close,
    Namespace(Namespace),
    Use,
    Class(ClassLike),
    Interface(ClassLike),
    Trait(ClassLike),
    Function(Function),
    /// Declaration-level text in a class or trait body.
    Attribute,
    Code,
    Comment,
    /// Text outside of PHP tags.
    Plain,
    String,
}

impl NodeKind {
    pub fn abbr(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Open => "open",
            Self::Close => "close",
            Self::Namespace(_) => "namespace",
            Self::Use => "use",
            Self::Class(_) => "class",
            Self::Interface(_) => "interface",
            Self::Trait(_) => "trait",
            Self::Function(_) => "function",
            Self::Attribute => "a",
            Self::Code => "c",
            Self::Comment => "d",
            Self::Plain => "p",
            Self::String => "s",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::File(namespace) | Self::Namespace(namespace) => Some(&namespace.name),
            Self::Class(class) | Self::Interface(class) | Self::Trait(class) => Some(&class.name),
            Self::Function(function) => Some(&function.name),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        match self {
            Self::File(namespace) | Self::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn namespace_mut(&mut self) -> Option<&mut Namespace> {
        match self {
            Self::File(namespace) | Self::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn class_like(&self) -> Option<&ClassLike> {
        match self {
            Self::Class(class) | Self::Interface(class) | Self::Trait(class) => Some(class),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }
}

/// Zero-based, inclusive line span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub stop: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Source of the node itself; for scopes, the opening text.
    pub text: TextRange,
    /// Closing text of a scope, empty for everything else.
    pub close: TextRange,
    pub lines: Option<LineRange>,
    pub coverable: bool,
    pub in_php: bool,
    pub has_methods: bool,
    pub parent: Option<NodeId>,
    pub namespace: NodeId,
    pub function: Option<NodeId>,
    pub children: Vec<NodeId>,
}
