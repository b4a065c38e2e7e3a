//! Reference-level renaming of bindings inside one function.
//!
//! Identifiers are matched by their resolved `Id` (symbol and syntax context)
//! after swc's resolver has run, so shadowing bindings, property keys, member
//! names and string contents are never touched.

use std::collections::HashMap;

use swc_core::{
    common::{Globals, Mark, GLOBALS},
    ecma::{
        ast::*,
        transforms::base::resolver,
        visit::{Visit, VisitMutWith, VisitWith},
    },
};

use crate::source::{Edit, Source};

/// Clone of `source.module` with every identifier carrying its resolved
/// syntax context. Spans are untouched, so they still index `source.text()`.
pub fn resolved_module(source: &Source) -> Module {
    let mut module = source.module.clone();
    GLOBALS.set(&Globals::new(), || {
        let unresolved = Mark::new();
        let top_level = Mark::new();
        module.visit_mut_with(&mut resolver(
            unresolved,
            top_level,
            source.kind().is_typescript(),
        ));
    });
    module
}

pub struct ReferenceCollector<'a> {
    source: &'a Source,
    renames: &'a HashMap<Id, String>,
    edits: Vec<Edit>,
}

impl Visit for ReferenceCollector<'_> {
    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(to) = self.renames.get(&ident.to_id()) {
            self.edits
                .push(Edit::replace(self.source.range(ident.span), to.clone()));
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        if let Prop::Shorthand(ident) = prop {
            if let Some(to) = self.renames.get(&ident.to_id()) {
                self.edits.push(Edit::replace(
                    self.source.range(ident.span),
                    format!("{}: {to}", ident.sym),
                ));
                return;
            }
        }
        prop.visit_children_with(self);
    }

    // `<increment />` names a tag, not the binding.
    fn visit_jsx_element_name(&mut self, _: &JSXElementName) {}
}

/// Edits renaming every reference to a key of `renames` found under `node`.
pub fn collect_renames<N>(source: &Source, node: &N, renames: &HashMap<Id, String>) -> Vec<Edit>
where
    N: for<'a> VisitWith<ReferenceCollector<'a>>,
{
    if renames.is_empty() {
        return vec![];
    }
    let mut collector = ReferenceCollector {
        source,
        renames,
        edits: vec![],
    };
    node.visit_with(&mut collector);
    collector.edits
}
