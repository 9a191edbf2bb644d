pub mod nodes;
pub mod visitor;

pub use nodes::{Ast, Attr, Node, NodeId, NodeKind, VarScope, Visibility};
pub use visitor::{evaluate_children, walk_children, Evaluator, Visitor};
