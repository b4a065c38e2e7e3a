//! Kind-filtered pre-order search over a syntax subtree.
//!
//! The node kind is picked by the predicate's argument type:
//!
//! ```ignore
//! let call = cursor::find(&module, |c: &CallExpr| c.args.is_empty());
//! ```
//!
//! JSX elements and fragments are opaque: nothing inside markup is reported.

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

pub struct Finder<T, P> {
    predicate: P,
    first_only: bool,
    found: Vec<T>,
}

impl<T, P> Finder<T, P> {
    fn halted(&self) -> bool {
        self.first_only && !self.found.is_empty()
    }
}

macro_rules! searchable_kinds {
    ($($kind:ty => $visit:ident),* $(,)?) => {$(
        impl<P: FnMut(&$kind) -> bool> Visit for Finder<$kind, P> {
            fn $visit(&mut self, node: &$kind) {
                if self.halted() {
                    return;
                }
                if (self.predicate)(node) {
                    self.found.push(node.clone());
                    if self.first_only {
                        return;
                    }
                }
                node.visit_children_with(self);
            }

            fn visit_expr(&mut self, node: &Expr) {
                if !self.halted() {
                    node.visit_children_with(self);
                }
            }

            fn visit_stmt(&mut self, node: &Stmt) {
                if !self.halted() {
                    node.visit_children_with(self);
                }
            }

            fn visit_jsx_element(&mut self, _: &JSXElement) {}

            fn visit_jsx_fragment(&mut self, _: &JSXFragment) {}
        }
    )*};
}

searchable_kinds! {
    CallExpr => visit_call_expr,
    Ident => visit_ident,
    ObjectLit => visit_object_lit,
    ArrowExpr => visit_arrow_expr,
    ReturnStmt => visit_return_stmt,
    VarDeclarator => visit_var_declarator,
}

/// First node of kind `T` under `root`, in pre-order, satisfying `predicate`.
pub fn find<T, N, P>(root: &N, predicate: P) -> Option<T>
where
    P: FnMut(&T) -> bool,
    N: VisitWith<Finder<T, P>>,
    Finder<T, P>: Visit,
{
    let mut finder = Finder {
        predicate,
        first_only: true,
        found: Vec::with_capacity(1),
    };
    root.visit_with(&mut finder);
    finder.found.pop()
}

/// Every node of kind `T` under `root` satisfying `predicate`, in pre-order.
pub fn find_all<T, N, P>(root: &N, predicate: P) -> Vec<T>
where
    P: FnMut(&T) -> bool,
    N: VisitWith<Finder<T, P>>,
    Finder<T, P>: Visit,
{
    let mut finder = Finder {
        predicate,
        first_only: false,
        found: vec![],
    };
    root.visit_with(&mut finder);
    finder.found
}

/// `true` when `expr` (ignoring parentheses) is the identifier `name`.
pub fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(unparen(expr), Expr::Ident(i) if &*i.sym == name)
}

pub fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(p) = expr {
        expr = &p.expr;
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Source, SourceKind};
    use indoc::indoc;

    fn parse(text: &str) -> Module {
        Source::parse("cursor.jsx", SourceKind::Jsx, text.to_string())
            .unwrap()
            .module
    }

    fn callee_name(call: &CallExpr) -> Option<String> {
        match &call.callee {
            Callee::Expr(e) => match &**e {
                Expr::Ident(i) => Some(i.sym.to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    #[test]
    fn find_returns_first_match_in_pre_order() {
        let module = parse("outer(inner(1), second(2));\nthird();\n");
        let call = find(&module, |c: &CallExpr| callee_name(c).is_some()).unwrap();
        assert_eq!(callee_name(&call).as_deref(), Some("outer"));
    }

    #[test]
    fn find_all_reports_nested_matches_in_order() {
        let module = parse("outer(inner(1), second(2));\nthird();\n");
        let names: Vec<_> = find_all(&module, |_: &CallExpr| true)
            .iter()
            .filter_map(callee_name)
            .collect();
        assert_eq!(names, vec!["outer", "inner", "second", "third"]);
    }

    #[test]
    fn markup_is_opaque() {
        let module = parse(indoc! {"
            const view = <div onClick={() => hidden()}>{shown}</div>;
            visible();
        "});
        let names: Vec<_> = find_all(&module, |_: &CallExpr| true)
            .iter()
            .filter_map(callee_name)
            .collect();
        assert_eq!(names, vec!["visible"]);
        assert!(find(&module, |i: &Ident| &*i.sym == "shown").is_none());
    }

    #[test]
    fn absent_match_is_none() {
        let module = parse("const a = { b: 1 };\n");
        assert!(find(&module, |_: &ArrowExpr| true).is_none());
        assert_eq!(find_all(&module, |_: &ObjectLit| true).len(), 1);
    }

    #[test]
    fn unparen_strips_nesting() {
        let module = parse("((value));\n");
        let ModuleItem::Stmt(Stmt::Expr(stmt)) = &module.body[0] else {
            panic!("expected expression statement");
        };
        assert!(is_ident(&stmt.expr, "value"));
    }
}
