//! Recognizes `export default connect(mapState?, actions?)(Component)`.

use swc_core::{
    common::{Span, Spanned},
    ecma::ast::*,
};

use crate::config::Config;
use crate::cursor::{self, unparen};
use crate::error::{Error, Result};
use crate::resolve::ImportTable;
use crate::source::Source;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectMatch {
    /// `connect(…)(Component)`: the call applying the factory's result.
    pub wrapper_call: Span,
    /// `connect(…)`.
    pub factory_call: Span,
    /// Local name the factory was called through.
    pub factory_local: String,
    pub component: Named,
    pub state_mapper: Option<Named>,
    pub action_bundle: Option<Named>,
}

fn callee_ident(call: &CallExpr) -> Option<&Ident> {
    match &call.callee {
        Callee::Expr(e) => match unparen(e) {
            Expr::Ident(i) => Some(i),
            _ => None,
        },
        _ => None,
    }
}

/// Whether `local` names the wrapper factory. An imported local must come from
/// one of the configured modules under the configured name; a local with no
/// import binding is matched by its literal name.
fn is_factory(local: &str, imports: &ImportTable, config: &Config) -> bool {
    match imports.get(local) {
        Some(import) => {
            import.imported == config.factory_name
                && config.factory_sources.iter().any(|s| *s == import.source)
        }
        None => local == config.factory_name,
    }
}

/// Classifies one factory argument: an identifier, or `null` / `undefined`
/// standing in for an omitted argument.
fn factory_argument(arg: &ExprOrSpread, position: &str) -> Result<Option<Named>> {
    if arg.spread.is_some() {
        return Err(Error::unsupported(format!(
            "spread {position} argument to the wrapper factory"
        )));
    }
    match unparen(&arg.expr) {
        Expr::Lit(Lit::Null(_)) => Ok(None),
        Expr::Ident(i) if &*i.sym == "undefined" => Ok(None),
        Expr::Ident(i) => Ok(Some(Named {
            name: i.sym.to_string(),
            span: i.span,
        })),
        _ => Err(Error::unsupported(format!(
            "{position} argument to the wrapper factory must be an identifier"
        ))),
    }
}

pub fn match_connect(source: &Source, imports: &ImportTable, config: &Config) -> Result<ConnectMatch> {
    let export = source
        .module
        .body
        .iter()
        .find_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(e)) => Some(e),
            _ => None,
        })
        .ok_or_else(|| Error::not_found("default export"))?;

    let factory = cursor::find(&*export.expr, |call: &CallExpr| {
        callee_ident(call).is_some_and(|i| is_factory(&i.sym, imports, config))
    })
    .ok_or_else(|| {
        Error::not_found(format!("`{}(...)` call in the default export", config.factory_name))
    })?;
    let factory_local = callee_ident(&factory)
        .map(|i| i.sym.to_string())
        .unwrap_or_default();

    let wrapper = cursor::find(&*export.expr, |call: &CallExpr| match &call.callee {
        Callee::Expr(e) => matches!(unparen(e), Expr::Call(inner) if inner.span == factory.span),
        _ => false,
    })
    .ok_or_else(|| {
        Error::not_found(format!("call applying `{factory_local}(...)` to a component"))
    })?;

    let component = match wrapper.args.first() {
        None => return Err(Error::not_found("component argument of the wrapper call")),
        Some(arg) if arg.spread.is_some() => {
            return Err(Error::unsupported("spread component argument"))
        }
        Some(arg) => match unparen(&arg.expr) {
            Expr::Ident(i) => Named {
                name: i.sym.to_string(),
                span: i.span,
            },
            other => {
                let (line, column) = source.location(other.span().lo);
                return Err(Error::unsupported(format!(
                    "wrapped component at {line}:{column} is not an identifier"
                )));
            }
        },
    };

    if factory.args.len() > 2 {
        return Err(Error::ArityViolation(factory.args.len()));
    }
    let state_mapper = match factory.args.first() {
        Some(arg) => factory_argument(arg, "first")?,
        None => None,
    };
    let action_bundle = match factory.args.get(1) {
        Some(arg) => factory_argument(arg, "second")?,
        None => None,
    };

    Ok(ConnectMatch {
        wrapper_call: wrapper.span,
        factory_call: factory.span,
        factory_local,
        component,
        state_mapper,
        action_bundle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use indoc::indoc;

    fn run(text: &str) -> Result<(Source, ConnectMatch)> {
        let source = Source::parse("match.jsx", SourceKind::Jsx, text.to_string())?;
        let imports = ImportTable::collect(&source.module);
        let found = match_connect(&source, &imports, &Config::default())?;
        Ok((source, found))
    }

    fn names(m: &ConnectMatch) -> (Option<&str>, Option<&str>) {
        (
            m.state_mapper.as_ref().map(|n| n.name.as_str()),
            m.action_bundle.as_ref().map(|n| n.name.as_str()),
        )
    }

    #[test]
    fn matches_two_argument_form() {
        let (source, m) = run(indoc! {"
            import { connect } from 'react-redux';
            export default connect(mapState, actions)(Counter);
        "})
        .unwrap();
        assert_eq!(m.component.name, "Counter");
        assert_eq!(names(&m), (Some("mapState"), Some("actions")));
        assert_eq!(source.snippet(m.wrapper_call), "connect(mapState, actions)(Counter)");
        assert_eq!(source.snippet(m.factory_call), "connect(mapState, actions)");
        assert!(m.wrapper_call.contains(m.factory_call));
        assert!(m.wrapper_call.contains(m.component.span));
    }

    #[test]
    fn optional_argument_matrix() {
        let (_, m) = run("export default connect()(C);\n").unwrap();
        assert_eq!(names(&m), (None, None));
        let (_, m) = run("export default connect(mapState)(C);\n").unwrap();
        assert_eq!(names(&m), (Some("mapState"), None));
        let (_, m) = run("export default connect(null, actions)(C);\n").unwrap();
        assert_eq!(names(&m), (None, Some("actions")));
        let (_, m) = run("export default connect(undefined, actions)(C);\n").unwrap();
        assert_eq!(names(&m), (None, Some("actions")));
    }

    #[test]
    fn three_arguments_violate_arity() {
        let err = run("export default connect(a, b, merge)(C);\n").unwrap_err();
        assert!(matches!(err, Error::ArityViolation(3)));
        insta::assert_snapshot!(err.to_string(), @"arity exceeds 2: wrapper factory called with 3 arguments");
    }

    #[test]
    fn inline_component_is_unsupported() {
        let err = run("export default connect(a)(() => null);\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }

    #[test]
    fn inline_bundle_is_unsupported() {
        let err = run("export default connect(a, { inc })(C);\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }

    #[test]
    fn missing_default_export() {
        let err = run("export const C = connect(a)(B);\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"pattern not found: default export");
    }

    #[test]
    fn factory_without_application() {
        let err = run("export default connect(a, b);\n").unwrap_err();
        assert!(matches!(err, Error::PatternNotFound(_)));
    }

    #[test]
    fn aliased_import_is_recognized() {
        let (_, m) = run(indoc! {"
            import { connect as link } from 'react-redux';
            export default link(mapState)(C);
        "})
        .unwrap();
        assert_eq!(m.factory_local, "link");
    }

    #[test]
    fn factory_from_another_module_is_ignored() {
        let err = run(indoc! {"
            import { connect } from './socket';
            export default connect(mapState)(C);
        "})
        .unwrap_err();
        assert!(matches!(err, Error::PatternNotFound(_)));
    }

    #[test]
    fn parenthesized_factory_call_is_applied() {
        let (source, m) = run("export default (connect(mapState))(C);\n").unwrap();
        assert_eq!(m.component.name, "C");
        assert_eq!(source.snippet(m.wrapper_call), "(connect(mapState))(C)");
        assert_eq!(source.snippet(m.factory_call), "connect(mapState)");
    }

    #[test]
    fn wrapper_nested_in_another_call() {
        let (source, m) = run("export default withRouter(connect(s, a)(Page));\n").unwrap();
        assert_eq!(source.snippet(m.wrapper_call), "connect(s, a)(Page)");
    }
}
