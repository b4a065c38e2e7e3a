//! The rewrite itself: a fixed sequence of splice steps over the file text.
//!
//! Every step reads spans from the current parse only. Its edits are disjoint
//! by construction, are applied outside-in as one splice, and the whole text is
//! parsed again before the next step runs.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use swc_core::{common::Spanned, ecma::ast::*};

use crate::config::{wrapper_name, Config};
use crate::error::{Error, Result};
use crate::extract::{extract_actions, extract_state_mapping, ActionBinding, StateMapping};
use crate::imports::{import_edits, HookUsage};
use crate::matcher::{match_connect, ConnectMatch, Named};
use crate::rename::{collect_renames, resolved_module};
use crate::resolve::{resolve_binding, resolve_declaration, FunctionBody, FunctionValue, ImportTable};
use crate::source::{splice, Edit, Source, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Unwrap,
    StripStateMapper,
    StripActionBundle,
    Imports,
    Component,
    Done,
}

impl Step {
    fn next(self) -> Self {
        match self {
            Step::Unwrap => Step::StripStateMapper,
            Step::StripStateMapper => Step::StripActionBundle,
            Step::StripActionBundle => Step::Imports,
            Step::Imports => Step::Component,
            Step::Component | Step::Done => Step::Done,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Step::Unwrap => "unwrap",
            Step::StripStateMapper => "strip-state-mapper",
            Step::StripActionBundle => "strip-action-bundle",
            Step::Imports => "imports",
            Step::Component => "component",
            Step::Done => "done",
        }
    }
}

/// What the original parse told us; owned, so it outlives every revision.
struct Plan {
    found: ConnectMatch,
    mapping: StateMapping,
    actions: Vec<ActionBinding>,
}

/// How a prop injected by the wrapper is supplied after the rewrite.
enum Injected {
    /// Read through the selector hook, bound to the prop's destructured local.
    Selector,
    /// Replaced by the stable dispatching callback of that name.
    Action(String),
}

/// The component parameter once the injected props are gone.
#[derive(Default)]
struct PropsRewrite {
    edits: Vec<Edit>,
    /// Selector key -> local it was destructured into, when they differ.
    selector_locals: HashMap<String, String>,
    /// Action locals and the callback that replaces them.
    renames: HashMap<Id, String>,
    /// Locals of the dropped props.
    dropped: HashSet<String>,
}

impl PropsRewrite {
    fn selector_local<'a>(&'a self, key: &'a str) -> &'a str {
        self.selector_locals.get(key).map_or(key, String::as_str)
    }
}

/// Rewrites `text` so its `connect`-wrapped default export uses hooks.
pub fn rewrite(name: &str, kind: SourceKind, text: String, config: &Config) -> Result<String> {
    let span = tracing::info_span!("rewrite", file = name);
    let _guard = span.enter();

    let mut source = Source::parse(name, kind, text)?;
    let plan = Plan::new(&source, config)?;

    let mut step = Step::Unwrap;
    while step != Step::Done {
        let edits = plan.edits(step, &source, config)?;
        tracing::debug!(step = step.name(), edits = edits.len(), "rewrite step");
        if !edits.is_empty() {
            source = apply(&source, step, edits)?;
        }
        step = step.next();
    }
    Ok(source.into_text())
}

/// Splices one step's edits and parses the result as the next revision.
fn apply(source: &Source, step: Step, edits: Vec<Edit>) -> Result<Source> {
    let text = splice(source.text(), edits)?;
    source.reparse(text).map_err(|e| match e {
        Error::Parse {
            line,
            column,
            message,
        } => Error::InvalidRewrite {
            step: step.name(),
            message: format!("{line}:{column}: {message}"),
        },
        other => other,
    })
}

impl Plan {
    fn new(source: &Source, config: &Config) -> Result<Self> {
        let imports = ImportTable::collect(&source.module);
        let found = match_connect(source, &imports, config)?;

        let component = &found.component.name;
        if resolve_declaration(&source.module, component).is_none() {
            return Err(Error::not_found(format!(
                "function declaration of component `{component}`"
            )));
        }

        let mapping = match &found.state_mapper {
            Some(mapper) => {
                let decl = resolve_declaration(&source.module, &mapper.name).ok_or_else(|| {
                    Error::not_found(format!("function declaration of `{}`", mapper.name))
                })?;
                extract_state_mapping(source, &decl.function, &mapper.name)?
            }
            None => StateMapping::default(),
        };
        let actions = match &found.action_bundle {
            Some(bundle) => {
                let binding = resolve_binding(&source.module, &bundle.name).ok_or_else(|| {
                    Error::not_found(format!("declaration of `{}`", bundle.name))
                })?;
                extract_actions(source, &binding)?
            }
            None => vec![],
        };
        tracing::debug!(
            component = %component,
            selectors = mapping.selectors.len(),
            actions = actions.len(),
            "matched connect pattern"
        );

        Ok(Self {
            found,
            mapping,
            actions,
        })
    }

    fn edits(&self, step: Step, source: &Source, config: &Config) -> Result<Vec<Edit>> {
        match step {
            Step::Unwrap => Ok(vec![Edit::replace(
                source.range(self.found.wrapper_call),
                self.found.component.name.clone(),
            )]),
            Step::StripStateMapper => strip_declaration(source, self.found.state_mapper.as_ref()),
            Step::StripActionBundle => strip_declaration(source, self.found.action_bundle.as_ref()),
            Step::Imports if config.rewrite_imports => Ok(import_edits(
                source,
                &self.found.factory_local,
                HookUsage {
                    selectors: !self.mapping.selectors.is_empty(),
                    actions: !self.actions.is_empty(),
                },
                config,
            )),
            Step::Imports | Step::Done => Ok(vec![]),
            Step::Component => self.component_edits(source, config),
        }
    }

    fn injected(&self) -> IndexMap<String, Injected> {
        let selectors = self
            .mapping
            .selectors
            .iter()
            .map(|s| (s.name.clone(), Injected::Selector));
        let actions = self
            .actions
            .iter()
            .map(|a| (a.name.clone(), Injected::Action(wrapper_name(&a.name))));
        selectors.chain(actions).collect()
    }

    /// Locals the prelude declares, in order.
    fn generated_names(&self, props: &PropsRewrite, config: &Config) -> Vec<String> {
        let mut names: Vec<String> = self
            .mapping
            .selectors
            .iter()
            .map(|s| props.selector_local(&s.name).to_string())
            .collect();
        if !self.actions.is_empty() {
            names.push(config.dispatch_name.clone());
        }
        names.extend(self.actions.iter().map(|a| wrapper_name(&a.name)));
        names
    }

    /// Statements placed at the top of the component body.
    fn prelude(&self, props: &PropsRewrite, config: &Config) -> Vec<String> {
        let state = self.mapping.state_param.as_deref().unwrap_or_default();
        let dispatch = &config.dispatch_name;
        let mut lines = vec![];
        for selector in &self.mapping.selectors {
            let projection = if selector.projection.trim_start().starts_with('{') {
                format!("({})", selector.projection)
            } else {
                selector.projection.clone()
            };
            lines.push(format!(
                "const {} = {}(({state}) => {projection});",
                props.selector_local(&selector.name),
                config.selector_hook
            ));
        }
        if !self.actions.is_empty() {
            lines.push(format!("const {dispatch} = {}();", config.dispatch_hook));
        }
        for action in &self.actions {
            lines.push(format!(
                "const {} = {}((...args) => {dispatch}({}(...args)), [{dispatch}]);",
                wrapper_name(&action.name),
                config.callback_hook,
                action.creator
            ));
        }
        lines
    }

    fn component_edits(&self, source: &Source, config: &Config) -> Result<Vec<Edit>> {
        let name = &self.found.component.name;
        let module = resolved_module(source);
        let decl = resolve_declaration(&module, name).ok_or_else(|| {
            Error::not_found(format!("function declaration of component `{name}`"))
        })?;
        let function = &decl.function;

        let props = match function.params.first() {
            Some(first) => props_edits(
                source,
                name,
                first,
                function.params.len() == 1,
                &self.injected(),
            )?,
            None => PropsRewrite::default(),
        };
        check_collisions(name, function, &props, &self.generated_names(&props, config))?;

        let body = body_edits(source, function, &self.prelude(&props, config), &props.renames)?;
        let mut edits = props.edits;
        edits.extend(body);
        Ok(edits)
    }
}

fn strip_declaration(source: &Source, target: Option<&Named>) -> Result<Vec<Edit>> {
    let Some(target) = target else {
        return Ok(vec![]);
    };
    let binding = resolve_binding(&source.module, &target.name)
        .ok_or_else(|| Error::not_found(format!("declaration of `{}`", target.name)))?;
    let range = if binding.whole_statement {
        source.statement_removal(binding.statement)
    } else {
        source.range(binding.removal)
    };
    Ok(vec![Edit::delete(range)])
}

fn binding_ident(pat: &Pat) -> Option<&Ident> {
    match pat {
        Pat::Ident(b) => Some(&b.id),
        Pat::Assign(a) => binding_ident(&a.left),
        _ => None,
    }
}

/// Every name a binding pattern introduces.
fn pattern_names<'a>(pat: &'a Pat, out: &mut Vec<&'a str>) {
    match pat {
        Pat::Ident(b) => out.push(&*b.id.sym),
        Pat::Array(a) => a.elems.iter().flatten().for_each(|p| pattern_names(p, out)),
        Pat::Rest(r) => pattern_names(&r.arg, out),
        Pat::Assign(a) => pattern_names(&a.left, out),
        Pat::Object(o) => {
            for prop in &o.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pattern_names(&kv.value, out),
                    ObjectPatProp::Assign(a) => out.push(&*a.key.id.sym),
                    ObjectPatProp::Rest(r) => pattern_names(&r.arg, out),
                }
            }
        }
        _ => {}
    }
}

/// Parameter names that survive plus the body's own top-level declarations.
fn component_bindings<'a>(function: &'a FunctionValue, props: &PropsRewrite) -> Vec<&'a str> {
    let mut names = vec![];
    for param in &function.params {
        pattern_names(param, &mut names);
    }
    names.retain(|n| !props.dropped.contains(*n));
    if let FunctionBody::Block(block) = &function.body {
        for stmt in &block.stmts {
            match stmt {
                Stmt::Decl(Decl::Var(var)) => {
                    var.decls.iter().for_each(|d| pattern_names(&d.name, &mut names))
                }
                Stmt::Decl(Decl::Fn(f)) => names.push(&*f.ident.sym),
                Stmt::Decl(Decl::Class(c)) => names.push(&*c.ident.sym),
                _ => {}
            }
        }
    }
    names
}

/// Fails when a generated local would redeclare a name already bound in the
/// component, or another generated local.
fn check_collisions(
    component: &str,
    function: &FunctionValue,
    props: &PropsRewrite,
    generated: &[String],
) -> Result<()> {
    let bound: HashSet<&str> = component_bindings(function, props).into_iter().collect();
    let mut seen = HashSet::new();
    for name in generated {
        if bound.contains(name.as_str()) || !seen.insert(name.as_str()) {
            return Err(Error::unsupported(format!(
                "`{name}` is already declared in `{component}`"
            )));
        }
    }
    Ok(())
}

/// Drops the injected props from the component's destructured props.
fn props_edits(
    source: &Source,
    component: &str,
    props: &Pat,
    only_param: bool,
    injected: &IndexMap<String, Injected>,
) -> Result<PropsRewrite> {
    let object = match props {
        Pat::Object(o) => Some(o),
        Pat::Assign(a) => match &*a.left {
            Pat::Object(o) => Some(o),
            _ => None,
        },
        _ => None,
    };
    let Some(object) = object else {
        if injected.is_empty() {
            return Ok(PropsRewrite::default());
        }
        return Err(Error::unsupported(format!(
            "props of `{component}` are not destructured"
        )));
    };

    let mut rewrite = PropsRewrite::default();
    let mut kept = vec![];
    for prop in &object.props {
        let (key, local) = match prop {
            ObjectPatProp::Assign(a) => (Some(a.key.id.sym.to_string()), Some(&a.key.id)),
            ObjectPatProp::KeyValue(kv) => match &kv.key {
                PropName::Ident(key) => (Some(key.sym.to_string()), binding_ident(&kv.value)),
                _ => (None, None),
            },
            ObjectPatProp::Rest(_) => (None, None),
        };
        let Some((key, how)) = key.as_ref().and_then(|k| injected.get(k).map(|how| (k, how))) else {
            kept.push(source.snippet(prop.span()));
            continue;
        };
        let local = local.ok_or_else(|| {
            Error::unsupported(format!("prop `{key}` of `{component}` is destructured further"))
        })?;
        rewrite.dropped.insert(local.sym.to_string());
        match how {
            Injected::Selector if &*local.sym != key.as_str() => {
                rewrite
                    .selector_locals
                    .insert(key.clone(), local.sym.to_string());
            }
            Injected::Selector => {}
            Injected::Action(wrapper) => {
                if &*local.sym != wrapper.as_str() {
                    rewrite.renames.insert(local.to_id(), wrapper.clone());
                }
            }
        }
    }
    if kept.len() == object.props.len() {
        return Ok(rewrite);
    }

    if kept.is_empty() && only_param && object.type_ann.is_none() {
        rewrite.edits.push(Edit::delete(source.range(props.span())));
    } else if let (Some(first), Some(last)) = (object.props.first(), object.props.last()) {
        rewrite.edits.push(Edit::replace(
            source.offset(first.span().lo)..source.offset(last.span().hi),
            kept.join(", "),
        ));
    }
    Ok(rewrite)
}

/// Prelude insertion plus reference renames inside the component body.
fn body_edits(
    source: &Source,
    function: &FunctionValue,
    prelude: &[String],
    renames: &HashMap<Id, String>,
) -> Result<Vec<Edit>> {
    let nl = source.newline();
    match &function.body {
        FunctionBody::Block(block) => {
            let mut edits = collect_renames(source, block, renames);
            if prelude.is_empty() {
                return Ok(edits);
            }
            match block.stmts.first() {
                Some(first) => {
                    let at = source.offset(first.span().lo);
                    let indent = source.indent_at(at);
                    let text: String = prelude.iter().map(|l| format!("{l}{nl}{indent}")).collect();
                    edits.push(Edit::insert(at, text));
                }
                None => {
                    let range = source.range(block.span);
                    let outer = source.line_indent(range.start);
                    let indent = format!("{outer}  ");
                    let lines: String = prelude.iter().map(|l| format!("{nl}{indent}{l}")).collect();
                    let inner = &source.text()[range.start + 1..range.end - 1];
                    if inner.trim().is_empty() {
                        edits.push(Edit::replace(range, format!("{{{lines}{nl}{outer}}}")));
                    } else {
                        edits.push(Edit::insert(range.start + 1, lines));
                    }
                }
            }
            Ok(edits)
        }
        FunctionBody::Expr(expr) => {
            let renamed = collect_renames(source, &**expr, renames);
            if prelude.is_empty() {
                return Ok(renamed);
            }
            let range = source.range(expr.span());
            let local = renamed
                .into_iter()
                .map(|e| Edit::replace(e.range.start - range.start..e.range.end - range.start, e.text))
                .collect();
            let value = splice(&source.text()[range.clone()], local)?;

            let outer = source.line_indent(source.offset(function.span.lo));
            let indent = format!("{outer}  ");
            let mut block = format!("{{{nl}");
            for line in prelude {
                block.push_str(&format!("{indent}{line}{nl}"));
            }
            block.push_str(&format!("{indent}return {value};{nl}{outer}}}"));
            Ok(vec![Edit::replace(range, block)])
        }
    }
}
