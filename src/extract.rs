//! Reads the selector outputs of the state mapper and the action names of the
//! action bundle, keeping expression text verbatim.

use indexmap::IndexMap;
use swc_core::{common::Spanned, ecma::ast::*};

use crate::cursor::unparen;
use crate::error::{Error, Result};
use crate::resolve::{BindingInit, FunctionBody, FunctionValue, TopLevelBinding};
use crate::source::Source;

/// A prop derived from global state and the projection that derives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorBinding {
    pub name: String,
    pub projection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateMapping {
    /// Source text of the mapper's first parameter (`state`, `{ todos }`, ...).
    pub state_param: Option<String>,
    pub selectors: Vec<SelectorBinding>,
}

/// An action exposed through the bundle: the prop key and the source text of
/// the action creator it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub name: String,
    pub creator: String,
}

/// Key / verbatim value pairs of an object literal. Repeated keys keep their
/// first position and their last value, as the literal itself would.
fn object_entries(source: &Source, object: &ObjectLit, what: &str) -> Result<IndexMap<String, String>> {
    let mut entries = IndexMap::new();
    for prop in &object.props {
        let prop = match prop {
            PropOrSpread::Prop(p) => p,
            PropOrSpread::Spread(s) => {
                return Err(Error::unsupported(format!(
                    "spread `{}` in {what}",
                    source.snippet(s.expr.span())
                )))
            }
        };
        let (key, value) = match &**prop {
            Prop::Shorthand(i) => (i.sym.to_string(), i.sym.to_string()),
            Prop::KeyValue(kv) => match &kv.key {
                PropName::Ident(key) => (
                    key.sym.to_string(),
                    source.snippet(kv.value.span()).to_string(),
                ),
                other => {
                    return Err(Error::unsupported(format!(
                        "key `{}` in {what} is not a plain identifier",
                        source.snippet(other.span())
                    )))
                }
            },
            other => {
                return Err(Error::unsupported(format!(
                    "property `{}` in {what} is not a key/value pair",
                    source.snippet(other.span())
                )))
            }
        };
        entries.insert(key, value);
    }
    Ok(entries)
}

/// The object literal a state mapper returns: a concise body, or a block
/// whose only statement returns it.
fn returned_object(body: &FunctionBody) -> Option<&ObjectLit> {
    let expr = match body {
        FunctionBody::Expr(e) => &**e,
        FunctionBody::Block(block) => match block.stmts.as_slice() {
            [Stmt::Return(ReturnStmt { arg: Some(arg), .. })] => &**arg,
            _ => return None,
        },
    };
    match unparen(expr) {
        Expr::Object(o) => Some(o),
        _ => None,
    }
}

/// Source text of a parameter, type annotation included.
pub fn param_text<'s>(source: &'s Source, pat: &Pat) -> &'s str {
    let span = match pat {
        Pat::Ident(BindingIdent {
            id,
            type_ann: Some(ann),
        }) => id.span.with_hi(ann.span.hi),
        other => other.span(),
    };
    source.snippet(span)
}

pub fn extract_state_mapping(source: &Source, mapper: &FunctionValue, name: &str) -> Result<StateMapping> {
    let object = returned_object(&mapper.body).ok_or_else(|| {
        Error::unsupported(format!("`{name}` does not return an object literal"))
    })?;
    let selectors = object_entries(source, object, &format!("`{name}`"))?
        .into_iter()
        .map(|(name, projection)| SelectorBinding { name, projection })
        .collect();
    Ok(StateMapping {
        state_param: mapper
            .params
            .first()
            .map(|p| param_text(source, p).to_string()),
        selectors,
    })
}

pub fn extract_actions(source: &Source, bundle: &TopLevelBinding) -> Result<Vec<ActionBinding>> {
    let object = match &bundle.init {
        BindingInit::Value(init) => match unparen(init) {
            Expr::Object(o) => Some(o),
            _ => None,
        },
        _ => None,
    }
    .ok_or_else(|| {
        Error::unsupported(format!("`{}` is not bound to an object literal", bundle.name))
    })?;
    Ok(object_entries(source, object, &format!("`{}`", bundle.name))?
        .into_iter()
        .map(|(name, creator)| ActionBinding { name, creator })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{resolve_binding, resolve_declaration};
    use crate::source::SourceKind;
    use indoc::indoc;

    fn parse(text: &str) -> Source {
        Source::parse("extract.jsx", SourceKind::Jsx, text.to_string()).unwrap()
    }

    fn mapping(text: &str) -> Result<StateMapping> {
        let source = parse(text);
        let decl = resolve_declaration(&source.module, "mapState").unwrap();
        extract_state_mapping(&source, &decl.function, "mapState")
    }

    fn actions(text: &str) -> Result<Vec<ActionBinding>> {
        let source = parse(text);
        let binding = resolve_binding(&source.module, "actions").unwrap();
        extract_actions(&source, &binding)
    }

    #[test]
    fn projections_are_verbatim_and_ordered() {
        let m = mapping("const mapState = (state) => ({a: state.x.y, b: state.z});\n").unwrap();
        assert_eq!(m.state_param.as_deref(), Some("state"));
        assert_eq!(
            m.selectors,
            vec![
                SelectorBinding { name: "a".into(), projection: "state.x.y".into() },
                SelectorBinding { name: "b".into(), projection: "state.z".into() },
            ]
        );
    }

    #[test]
    fn projection_formatting_is_preserved() {
        let m = mapping(indoc! {"
            function mapState(s) {
              return {
                total: s.items
                  .filter((i) => i.done).length,
              };
            }
        "})
        .unwrap();
        assert_eq!(m.selectors[0].projection, "s.items\n      .filter((i) => i.done).length");
    }

    #[test]
    fn block_with_extra_statements_is_unsupported() {
        let err = mapping(indoc! {"
            const mapState = (state) => {
              const x = state.x;
              return { x };
            };
        "})
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unsupported shape: `mapState` does not return an object literal");
    }

    #[test]
    fn computed_keys_are_unsupported() {
        let err = mapping("const mapState = (state) => ({ [key]: state.a });\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }

    #[test]
    fn action_names_in_order() {
        let list = actions("const actions = { increment, reset: resetCounter };\n").unwrap();
        assert_eq!(
            list,
            vec![
                ActionBinding { name: "increment".into(), creator: "increment".into() },
                ActionBinding { name: "reset".into(), creator: "resetCounter".into() },
            ]
        );
    }

    #[test]
    fn repeated_action_key_keeps_first_position_last_value() {
        let list = actions("const actions = { a: one, b, a: two };\n").unwrap();
        let pairs: Vec<_> = list.iter().map(|a| (a.name.as_str(), a.creator.as_str())).collect();
        assert_eq!(pairs, vec![("a", "two"), ("b", "b")]);
    }

    #[test]
    fn non_object_bundle_is_unsupported() {
        let err = actions("const actions = (dispatch) => ({ a: () => dispatch(x()) });\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }

    #[test]
    fn spread_in_bundle_is_unsupported() {
        let err = actions("const actions = { ...counterActions };\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unsupported shape: spread `counterActions` in `actions`");
    }
}
