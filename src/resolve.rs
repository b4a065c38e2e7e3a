//! Module-scope name resolution: top-level declarations and import bindings.
//!
//! Only the module's own top-level statements are searched. Block-scoped and
//! nested declarations are never considered.

use std::collections::HashMap;

use swc_core::{
    common::{Span, Spanned},
    ecma::ast::*,
};

use crate::cursor::unparen;

// -----------------------------------------------------------------------------
// Function values
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(BlockStmt),
    /// Concise arrow body.
    Expr(Box<Expr>),
}

impl FunctionBody {
    pub fn span(&self) -> Span {
        match self {
            FunctionBody::Block(b) => b.span,
            FunctionBody::Expr(e) => e.span(),
        }
    }
}

/// Parameters and body of an arrow, function expression or function declaration.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub span: Span,
    pub params: Vec<Pat>,
    pub body: FunctionBody,
}

impl FunctionValue {
    fn from_expr(expr: &Expr) -> Option<Self> {
        match unparen(expr) {
            Expr::Arrow(arrow) => Some(Self {
                span: arrow.span,
                params: arrow.params.clone(),
                body: match &*arrow.body {
                    BlockStmtOrExpr::BlockStmt(b) => FunctionBody::Block(b.clone()),
                    BlockStmtOrExpr::Expr(e) => FunctionBody::Expr(e.clone()),
                },
            }),
            Expr::Fn(f) => Self::from_function(&f.function),
            _ => None,
        }
    }

    fn from_function(function: &Function) -> Option<Self> {
        Some(Self {
            span: function.span,
            params: function.params.iter().map(|p| p.pat.clone()).collect(),
            body: FunctionBody::Block(function.body.clone()?),
        })
    }
}

// -----------------------------------------------------------------------------
// Top-level bindings
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum BindingInit {
    Function(FunctionValue),
    Value(Box<Expr>),
    Uninitialized,
}

#[derive(Debug, Clone)]
pub struct TopLevelBinding {
    pub name: String,
    /// The whole statement, `export` keyword included.
    pub statement: Span,
    /// What to cut to delete this binding: the statement when the binding is
    /// its only declarator, otherwise the declarator and one separating comma.
    pub removal: Span,
    /// `removal` covers the whole statement.
    pub whole_statement: bool,
    pub is_function_declaration: bool,
    pub init: BindingInit,
}

/// A resolved function-valued declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub binding: TopLevelBinding,
    pub function: FunctionValue,
}

fn top_level_decls(module: &Module) -> impl Iterator<Item = (Span, &Decl)> {
    module.body.iter().filter_map(|item| match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => Some((decl.span(), decl)),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => Some((export.span, &export.decl)),
        _ => None,
    })
}

fn var_binding(statement: Span, var: &VarDecl, name: &str) -> Option<TopLevelBinding> {
    let index = var
        .decls
        .iter()
        .position(|d| matches!(&d.name, Pat::Ident(b) if &*b.id.sym == name))?;
    let declarator = &var.decls[index];
    let (removal, whole_statement) = if var.decls.len() == 1 {
        (statement, true)
    } else if let Some(next) = var.decls.get(index + 1) {
        (Span::new(declarator.span.lo, next.span.lo), false)
    } else {
        (Span::new(var.decls[index - 1].span.hi, declarator.span.hi), false)
    };
    let init = match &declarator.init {
        Some(init) => match FunctionValue::from_expr(init) {
            Some(f) => BindingInit::Function(f),
            None => BindingInit::Value(init.clone()),
        },
        None => BindingInit::Uninitialized,
    };
    Some(TopLevelBinding {
        name: name.to_string(),
        statement,
        removal,
        whole_statement,
        is_function_declaration: false,
        init,
    })
}

fn fn_binding(statement: Span, f: &FnDecl, name: &str) -> Option<TopLevelBinding> {
    if &*f.ident.sym != name {
        return None;
    }
    let init = match FunctionValue::from_function(&f.function) {
        Some(value) => BindingInit::Function(value),
        None => BindingInit::Uninitialized,
    };
    Some(TopLevelBinding {
        name: name.to_string(),
        statement,
        removal: statement,
        whole_statement: true,
        is_function_declaration: true,
        init,
    })
}

/// Any top-level binding of `name`: a variable declarator (first) or a
/// function declaration.
pub fn resolve_binding(module: &Module, name: &str) -> Option<TopLevelBinding> {
    let mut function = None;
    for (statement, decl) in top_level_decls(module) {
        match decl {
            Decl::Var(var) => {
                if let Some(binding) = var_binding(statement, var, name) {
                    return Some(binding);
                }
            }
            Decl::Fn(f) if function.is_none() => function = fn_binding(statement, f, name),
            _ => {}
        }
    }
    function
}

/// A top-level function-valued binding of `name`: a variable bound to an arrow
/// or function expression takes precedence over a function declaration.
pub fn resolve_declaration(module: &Module, name: &str) -> Option<Declaration> {
    let mut declared = None;
    for (statement, decl) in top_level_decls(module) {
        let binding = match decl {
            Decl::Var(var) => var_binding(statement, var, name),
            Decl::Fn(f) => fn_binding(statement, f, name),
            _ => None,
        };
        let Some(binding) = binding else { continue };
        let BindingInit::Function(function) = &binding.init else {
            continue;
        };
        let function = function.clone();
        if !binding.is_function_declaration {
            return Some(Declaration { binding, function });
        }
        declared.get_or_insert(Declaration { binding, function });
    }
    declared
}

// -----------------------------------------------------------------------------
// Import bindings
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    /// `default`, `*` for namespaces, otherwise the exported name.
    pub imported: String,
    pub source: String,
    pub specifier: Span,
    pub declaration: Span,
}

/// Local name -> import binding, for every top-level import specifier.
#[derive(Debug, Default)]
pub struct ImportTable {
    by_local: HashMap<String, ImportBinding>,
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(i) => i.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

impl ImportTable {
    pub fn collect(module: &Module) -> Self {
        let mut by_local = HashMap::new();
        for item in &module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) = item else {
                continue;
            };
            let source = decl.src.value.to_string();
            for s in &decl.specifiers {
                let (local, imported) = match s {
                    ImportSpecifier::Named(named) => (
                        &named.local,
                        named
                            .imported
                            .as_ref()
                            .map(export_name)
                            .unwrap_or_else(|| named.local.sym.to_string()),
                    ),
                    ImportSpecifier::Default(def) => (&def.local, "default".to_string()),
                    ImportSpecifier::Namespace(ns) => (&ns.local, "*".to_string()),
                };
                by_local.insert(
                    local.sym.to_string(),
                    ImportBinding {
                        local: local.sym.to_string(),
                        imported,
                        source: source.clone(),
                        specifier: s.span(),
                        declaration: decl.span,
                    },
                );
            }
        }
        Self { by_local }
    }

    pub fn get(&self, local: &str) -> Option<&ImportBinding> {
        self.by_local.get(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Source, SourceKind};
    use indoc::indoc;

    fn parse(text: &str) -> Source {
        Source::parse("resolve.jsx", SourceKind::Jsx, text.to_string()).unwrap()
    }

    #[test]
    fn resolves_arrow_binding() {
        let src = parse("const Comp = ({ a }) => <div>{a}</div>;\n");
        let decl = resolve_declaration(&src.module, "Comp").unwrap();
        assert_eq!(decl.function.params.len(), 1);
        assert!(matches!(decl.function.body, FunctionBody::Expr(_)));
        assert!(decl.binding.whole_statement);
    }

    #[test]
    fn resolves_function_declaration_and_export() {
        let src = parse(indoc! {"
            export function Comp(props) {
              return null;
            }
        "});
        let decl = resolve_declaration(&src.module, "Comp").unwrap();
        assert!(decl.binding.is_function_declaration);
        assert!(src.snippet(decl.binding.statement).starts_with("export function"));
        assert!(matches!(decl.function.body, FunctionBody::Block(_)));
    }

    #[test]
    fn variable_binding_wins_over_function_declaration() {
        let src = parse(indoc! {"
            function Comp() { return 1; }
            var Comp = function () { return 2; };
        "});
        let decl = resolve_declaration(&src.module, "Comp").unwrap();
        assert!(!decl.binding.is_function_declaration);
    }

    #[test]
    fn nested_declarations_are_ignored() {
        let src = parse(indoc! {"
            function outer() {
              const Comp = () => null;
            }
        "});
        assert!(resolve_declaration(&src.module, "Comp").is_none());
        assert!(resolve_binding(&src.module, "Comp").is_none());
    }

    #[test]
    fn non_function_binding_is_not_a_declaration() {
        let src = parse("const actions = { a };\n");
        assert!(resolve_declaration(&src.module, "actions").is_none());
        let binding = resolve_binding(&src.module, "actions").unwrap();
        assert!(matches!(binding.init, BindingInit::Value(_)));
    }

    #[test]
    fn removal_of_one_declarator_keeps_siblings() {
        let src = parse("const a = 1, actions = { b }, c = 3;\n");
        let middle = resolve_binding(&src.module, "actions").unwrap();
        assert!(!middle.whole_statement);
        assert_eq!(src.snippet(middle.removal), "actions = { b }, ");
        let last = resolve_binding(&src.module, "c").unwrap();
        assert_eq!(src.snippet(last.removal), ", c = 3");
    }

    #[test]
    fn import_table_records_aliases() {
        let src = parse(indoc! {"
            import React, { useState } from 'react';
            import { connect as link } from 'react-redux';
            import * as api from './api';
        "});
        let table = ImportTable::collect(&src.module);
        let link = table.get("link").unwrap();
        assert_eq!(link.imported, "connect");
        assert_eq!(link.source, "react-redux");
        assert_eq!(src.snippet(link.specifier), "connect as link");
        assert_eq!(table.get("React").unwrap().imported, "default");
        assert_eq!(table.get("api").unwrap().imported, "*");
        assert_eq!(table.get("useState").unwrap().source, "react");
        assert!(table.get("connect").is_none());
    }
}
