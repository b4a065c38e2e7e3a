//! Keeps the module's imports in step with the rewritten component: the
//! factory specifier goes once nothing references it, the hooks come in.

use indexmap::IndexMap;
use swc_core::{
    common::{Span, Spanned},
    ecma::{
        ast::*,
        visit::{Visit, VisitWith},
    },
};

use crate::config::Config;
use crate::resolve::ImportTable;
use crate::source::{Edit, Source};

/// Which generated statements the component step will emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookUsage {
    pub selectors: bool,
    pub actions: bool,
}

fn wanted_imports(table: &ImportTable, usage: HookUsage, config: &Config) -> IndexMap<String, Vec<String>> {
    let mut wanted: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut want = |source: &str, name: &str| {
        let present = table
            .get(name)
            .is_some_and(|b| b.imported == name && b.source == source);
        if !present {
            wanted
                .entry(source.to_string())
                .or_default()
                .push(name.to_string());
        }
    };
    if usage.selectors {
        want(&config.hooks_source, &config.selector_hook);
    }
    if usage.actions {
        want(&config.hooks_source, &config.dispatch_hook);
        want(&config.callback_source, &config.callback_hook);
    }
    wanted
}

/// Looks for `name` anywhere outside `except`, markup included.
struct Reference<'a> {
    name: &'a str,
    except: Span,
    found: bool,
}

impl Visit for Reference<'_> {
    fn visit_ident(&mut self, ident: &Ident) {
        if &*ident.sym == self.name && !self.except.contains(ident.span) {
            self.found = true;
        }
    }
}

fn is_referenced(module: &Module, name: &str, except: Span) -> bool {
    let mut reference = Reference {
        name,
        except,
        found: false,
    };
    module.visit_with(&mut reference);
    reference.found
}

fn quote_style(source: &Source) -> char {
    source
        .module
        .body
        .iter()
        .find_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(d)) => source.snippet(d.src.span).chars().next(),
            _ => None,
        })
        .unwrap_or('"')
}

/// `import <default>, { <named> } from ` for the specifiers that survive.
fn import_head(default: Option<&str>, named: &[String]) -> String {
    let mut clause = vec![];
    if let Some(default) = default {
        clause.push(default.to_string());
    }
    if !named.is_empty() {
        clause.push(format!("{{ {} }}", named.join(", ")));
    }
    format!("import {} from ", clause.join(", "))
}

/// Start of the line following the module's last import, or the top of the
/// file (after a shebang line) when it has none.
fn new_import_anchor(source: &Source) -> usize {
    let text = source.text();
    let last = source.module.body.iter().rev().find_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(d)) => Some(d.span),
        _ => None,
    });
    let from = match last {
        Some(span) => source.offset(span.hi),
        None if text.starts_with("#!") => 0,
        None => return 0,
    };
    text[from..]
        .find('\n')
        .map(|nl| from + nl + 1)
        .unwrap_or(text.len())
}

pub fn import_edits(source: &Source, factory_local: &str, usage: HookUsage, config: &Config) -> Vec<Edit> {
    let table = ImportTable::collect(&source.module);
    let mut wanted = wanted_imports(&table, usage, config);

    let removable = table.get(factory_local).filter(|factory| {
        let still_used = is_referenced(&source.module, factory_local, factory.declaration);
        factory.imported == config.factory_name
            && config.factory_sources.contains(&factory.source)
            && !still_used
    });

    let mut edits = vec![];
    let mut deletions = vec![];
    for item in &source.module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) = item else {
            continue;
        };
        let dropped = removable.filter(|f| f.declaration == decl.span).map(|f| f.specifier);
        let extendable = !decl.type_only
            && !decl
                .specifiers
                .iter()
                .any(|s| matches!(s, ImportSpecifier::Namespace(_)));
        let additions = if extendable {
            wanted.shift_remove(&*decl.src.value).unwrap_or_default()
        } else {
            vec![]
        };
        if dropped.is_none() && additions.is_empty() {
            continue;
        }

        let mut default = None;
        let mut named = vec![];
        for s in &decl.specifiers {
            if Some(s.span()) == dropped {
                continue;
            }
            match s {
                ImportSpecifier::Default(d) => default = Some(source.snippet(d.span)),
                _ => named.push(source.snippet(s.span()).to_string()),
            }
        }
        named.extend(additions);

        if default.is_none() && named.is_empty() {
            deletions.push(Edit::delete(source.statement_removal(decl.span)));
        } else {
            edits.push(Edit::replace(
                source.offset(decl.span.lo)..source.offset(decl.src.span.lo),
                import_head(default, &named),
            ));
        }
    }

    if !wanted.is_empty() {
        let quote = quote_style(source);
        let nl = source.newline();
        let lines: String = wanted
            .iter()
            .map(|(module, names)| {
                format!("{}{quote}{module}{quote};{nl}", import_head(None, names))
            })
            .collect();
        let anchor = new_import_anchor(source);
        match deletions
            .iter_mut()
            .find(|d| d.range.start <= anchor && anchor <= d.range.end)
        {
            Some(deletion) => deletion.text = lines,
            None => edits.push(Edit::insert(anchor, lines)),
        }
    }

    edits.extend(deletions);
    edits
}
