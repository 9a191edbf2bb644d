//! Arena-backed syntax tree
//!
//! Nodes live in a flat arena and refer to each other through `NodeId`
//! indices, so parent links never create ownership cycles. Structure is
//! mutated through a single operation, `attach`, which detaches a node from
//! any previous parent before re-parenting it. Facts attached after parsing
//! (inferred types, analysis notes) go in a typed side table keyed by node,
//! never into the nodes themselves.

use crate::tokens::LiteralValue;
use crate::utils::SourceSpan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable index of a node within its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Variable declaration scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarScope {
    Local,
    Global,
    Component,
}

/// Member visibility inside classes and interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Node classification with rule-specific payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // === PROGRAM STRUCTURE ===
    Program,
    Import {
        path: String,
    },

    // === DECLARATIONS ===
    ClassDeclaration {
        name: String,
    },
    InterfaceDeclaration {
        name: String,
    },
    /// Method signature inside a class or interface body
    MethodHeader {
        name: String,
        visibility: Visibility,
    },
    PropertyDeclaration {
        name: String,
        visibility: Visibility,
    },
    InstanceDeclaration,
    ConstantDeclaration {
        name: String,
    },
    /// `method Name ... end-method` implementation block
    MethodImplementation {
        name: String,
    },
    GetterImplementation {
        name: String,
    },
    SetterImplementation {
        name: String,
    },
    /// `Declare Function ... PeopleCode ...`
    FunctionDeclaration {
        name: String,
    },
    /// `Function Name ... End-Function`
    FunctionDefinition {
        name: String,
    },
    Parameter {
        name: String,
    },
    TypeName {
        text: String,
    },

    // === STATEMENTS ===
    Block,
    IfStatement,
    ElseBlock,
    EvaluateStatement,
    WhenClause,
    WhenOtherClause,
    ForStatement {
        variable: String,
    },
    WhileStatement,
    RepeatStatement,
    TryStatement,
    CatchClause,
    BreakStatement,
    ContinueStatement,
    ExitStatement,
    ReturnStatement,
    ErrorStatement,
    WarningStatement,
    ThrowStatement,
    VariableDeclaration {
        scope: VarScope,
    },
    AssignmentStatement,
    ExpressionStatement,
    /// Placeholder for a statement that failed to parse
    SyntaxErrorStatement {
        message: String,
    },

    // === EXPRESSIONS ===
    BinaryExpression {
        op: String,
    },
    UnaryExpression {
        op: String,
    },
    LiteralExpression {
        value: LiteralValue,
    },
    IdentifierExpression {
        name: String,
    },
    MemberAccessExpression {
        member: String,
    },
    CallExpression,
    IndexExpression,
    CreateExpression {
        class_name: String,
    },
    /// `@` dynamic reference
    AtExpression,
    /// `expr As Type`
    CastExpression,
    /// Placeholder for an expression that failed to parse
    SyntaxErrorExpression {
        message: String,
    },
}

impl NodeKind {
    pub fn is_error_placeholder(&self) -> bool {
        matches!(
            self,
            Self::SyntaxErrorStatement { .. } | Self::SyntaxErrorExpression { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::BinaryExpression { .. }
                | Self::UnaryExpression { .. }
                | Self::LiteralExpression { .. }
                | Self::IdentifierExpression { .. }
                | Self::MemberAccessExpression { .. }
                | Self::CallExpression
                | Self::IndexExpression
                | Self::CreateExpression { .. }
                | Self::AtExpression
                | Self::CastExpression
                | Self::SyntaxErrorExpression { .. }
        )
    }
}

/// Facts attached to nodes after parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attr {
    /// Free-form analysis note
    Note(String),
    /// Inferred or declared type
    TypeName(String),
    /// Boolean marker
    Flag(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: SourceSpan,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Node arena for one parsed program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
    attrs: HashMap<NodeId, Vec<Attr>>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: SourceSpan) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> SourceSpan {
        self.nodes[id.index()].span
    }

    pub fn set_span(&mut self, id: NodeId, span: SourceSpan) {
        self.nodes[id.index()].span = span;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// The single structural mutator: make `child` the last child of
    /// `parent`, detaching it from any previous parent first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn detach(&mut self, child: NodeId) {
        if let Some(previous) = self.nodes[child.index()].parent.take() {
            self.nodes[previous.index()]
                .children
                .retain(|&c| c != child);
        }
    }

    // === ATTRIBUTE SIDE TABLE ===

    pub fn add_attr(&mut self, id: NodeId, attr: Attr) {
        self.attrs.entry(id).or_default().push(attr);
    }

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        self.attrs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    // === TREE QUERIES ===

    /// Nearest ancestor satisfying the predicate, excluding the node itself
    pub fn ancestor_matching(
        &self,
        id: NodeId,
        predicate: impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if predicate(self.node(node)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// All descendants satisfying the predicate, in declaration order,
    /// excluding the node itself
    pub fn descendants_matching(
        &self,
        id: NodeId,
        predicate: impl Fn(&Node) -> bool,
    ) -> Vec<NodeId> {
        let mut matches = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if predicate(self.node(node)) {
                matches.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        matches
    }

    /// First node satisfying the predicate in parent-first depth-first
    /// order, including the start node
    pub fn find(&self, start: NodeId, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if predicate(self.node(node)) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_sample() -> (Ast, NodeId, NodeId, NodeId, NodeId) {
        let mut ast = Ast::new();
        let program = ast.alloc(NodeKind::Program, SourceSpan::dummy());
        let class = ast.alloc(
            NodeKind::ClassDeclaration {
                name: "Widget".to_string(),
            },
            SourceSpan::dummy(),
        );
        let method = ast.alloc(
            NodeKind::MethodImplementation {
                name: "Redraw".to_string(),
            },
            SourceSpan::dummy(),
        );
        let body = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        ast.attach(program, class);
        ast.attach(class, method);
        ast.attach(method, body);
        (ast, program, class, method, body)
    }

    #[test]
    fn test_attach_sets_both_links() {
        let (ast, program, class, method, _) = build_sample();
        assert_eq!(ast.parent(class), Some(program));
        assert_eq!(ast.children(program), &[class]);
        assert_eq!(ast.parent(method), Some(class));
    }

    #[test]
    fn test_reattach_detaches_from_previous_parent() {
        let (mut ast, program, class, method, _) = build_sample();
        // Move the method directly under the program
        ast.attach(program, method);
        assert_eq!(ast.parent(method), Some(program));
        assert!(ast.children(class).is_empty());
        assert_eq!(ast.children(program), &[class, method]);
    }

    #[test]
    fn test_ancestor_matching_skips_self() {
        let (ast, program, _, method, body) = build_sample();
        let found = ast.ancestor_matching(body, |n| {
            matches!(n.kind, NodeKind::MethodImplementation { .. })
        });
        assert_eq!(found, Some(method));

        let none = ast.ancestor_matching(program, |_| true);
        assert_eq!(none, None);
    }

    #[test]
    fn test_descendants_matching_declaration_order() {
        let mut ast = Ast::new();
        let program = ast.alloc(NodeKind::Program, SourceSpan::dummy());
        let first = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        let second = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        let nested = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        ast.attach(program, first);
        ast.attach(program, second);
        ast.attach(first, nested);

        let blocks = ast.descendants_matching(program, |n| matches!(n.kind, NodeKind::Block));
        assert_eq!(blocks, vec![first, nested, second]);
    }

    #[test]
    fn test_find_is_parent_first() {
        let (ast, program, class, _, _) = build_sample();
        let found = ast.find(program, |n| !matches!(n.kind, NodeKind::Program));
        assert_eq!(found, Some(class));
        // Includes the start node itself
        assert_eq!(ast.find(program, |_| true), Some(program));
    }

    #[test]
    fn test_attribute_side_table() {
        let (mut ast, _, class, _, _) = build_sample();
        assert!(ast.attrs(class).is_empty());

        ast.add_attr(class, Attr::TypeName("Widget".to_string()));
        ast.add_attr(class, Attr::Flag("analyzed".to_string()));
        assert_eq!(ast.attrs(class).len(), 2);
        assert_eq!(ast.attrs(class)[0], Attr::TypeName("Widget".to_string()));
    }

    #[test]
    fn test_error_placeholder_classification() {
        let stmt = NodeKind::SyntaxErrorStatement {
            message: "x".to_string(),
        };
        let expr = NodeKind::SyntaxErrorExpression {
            message: "x".to_string(),
        };
        assert!(stmt.is_error_placeholder());
        assert!(expr.is_error_placeholder());
        assert!(expr.is_expression());
        assert!(!NodeKind::Block.is_error_placeholder());
    }
}
