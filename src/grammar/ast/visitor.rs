//! Visitor traits over the node arena
//!
//! Two flavors: `Visitor` for side-effecting traversal and `Evaluator` for
//! traversals that produce a value per node. Both default to plain
//! depth-first recursion through the free walk functions, so a concrete
//! visitor overrides only the node kinds it cares about and calls back into
//! the walk function for everything else. Visitors read the tree; only the
//! attribute side table may change after parsing.

use super::nodes::{Ast, NodeId};

/// Side-effecting traversal
pub trait Visitor {
    fn visit_node(&mut self, ast: &Ast, node: NodeId) {
        walk_children(self, ast, node);
    }
}

/// Recurse into all children of `node`, in order
pub fn walk_children<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, node: NodeId) {
    for &child in ast.children(node) {
        visitor.visit_node(ast, child);
    }
}

/// Value-producing traversal. The default result for a node is the value of
/// its last-visited child, or `T::default()` for a leaf.
pub trait Evaluator<T: Default> {
    fn evaluate_node(&mut self, ast: &Ast, node: NodeId) -> T {
        evaluate_children(self, ast, node)
    }
}

pub fn evaluate_children<T: Default, E: Evaluator<T> + ?Sized>(
    evaluator: &mut E,
    ast: &Ast,
    node: NodeId,
) -> T {
    let mut result = T::default();
    for &child in ast.children(node) {
        result = evaluator.evaluate_node(ast, child);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::nodes::NodeKind;
    use crate::utils::SourceSpan;

    fn sample_tree() -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let program = ast.alloc(NodeKind::Program, SourceSpan::dummy());
        let outer = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        let stmt = ast.alloc(NodeKind::BreakStatement, SourceSpan::dummy());
        let inner = ast.alloc(NodeKind::Block, SourceSpan::dummy());
        let error = ast.alloc(
            NodeKind::SyntaxErrorStatement {
                message: "bad".to_string(),
            },
            SourceSpan::dummy(),
        );
        ast.attach(program, outer);
        ast.attach(outer, stmt);
        ast.attach(outer, inner);
        ast.attach(inner, error);
        (ast, program)
    }

    struct BlockCounter {
        blocks: usize,
        visited: Vec<NodeId>,
    }

    impl Visitor for BlockCounter {
        fn visit_node(&mut self, ast: &Ast, node: NodeId) {
            self.visited.push(node);
            if matches!(ast.kind(node), NodeKind::Block) {
                self.blocks += 1;
            }
            walk_children(self, ast, node);
        }
    }

    #[test]
    fn test_default_traversal_reaches_every_node() {
        let (ast, program) = sample_tree();
        let mut counter = BlockCounter {
            blocks: 0,
            visited: Vec::new(),
        };
        counter.visit_node(&ast, program);
        assert_eq!(counter.visited.len(), 5);
        assert_eq!(counter.blocks, 2);
        // Parent-first: program before its descendants
        assert_eq!(counter.visited[0], program);
    }

    struct ErrorFinder;

    impl Evaluator<usize> for ErrorFinder {
        fn evaluate_node(&mut self, ast: &Ast, node: NodeId) -> usize {
            let own = usize::from(ast.kind(node).is_error_placeholder());
            let mut total = own;
            for &child in ast.children(node) {
                total += self.evaluate_node(ast, child);
            }
            total
        }
    }

    #[test]
    fn test_evaluator_accumulates_over_tree() {
        let (ast, program) = sample_tree();
        assert_eq!(ErrorFinder.evaluate_node(&ast, program), 1);
    }

    struct DefaultOnly;
    impl Visitor for DefaultOnly {}

    #[test]
    fn test_default_implementation_recurses_without_effect() {
        let (ast, program) = sample_tree();
        // Must terminate and not panic
        DefaultOnly.visit_node(&ast, program);
    }
}
