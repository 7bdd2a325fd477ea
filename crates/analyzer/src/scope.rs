// SPDX-License-Identifier: MIT

//! Locates a `spawn!` invocation inside a re-parsed file and classifies the free variables its
//! closure references (spec.md §4.C).

use crate::error::AnalyzeError;
use ispawn_core::scope::{FreeVariable, ScopeDescriptor, ScopeKind};
use ispawn_core::CallSite;
use proc_macro2::LineColumn;
use std::collections::HashSet;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

/// Finds the `spawn!` macro call in `file` closest to `call_site` and returns the free-variable
/// partition for its closure argument.
pub fn locate_spawn_macro(
    file: &syn::File,
    call_site: &CallSite,
) -> Result<ScopeDescriptor, AnalyzeError> {
    let mut locator = MacroLocator {
        target: LineColumn {
            line: call_site.line as usize,
            column: call_site.column as usize,
        },
        best: None,
        best_distance: usize::MAX,
        scopes: vec![top_level_names(file)],
    };
    locator.visit_file(file);

    let (closure_tokens, root_scope) = locator.best.ok_or_else(|| AnalyzeError::MacroNotFound {
        call_site: call_site.clone(),
    })?;

    let closure: syn::ExprClosure =
        syn::parse2(closure_tokens).map_err(|_| AnalyzeError::NotAClosure {
            call_site: call_site.clone(),
        })?;

    Ok(classify_closure(&closure, &root_scope))
}

/// Names visible at module scope: `fn`/`static`/`const`/`struct`/`enum` items and `use` bindings.
/// These resolve to [`ScopeKind::TopLevel`] rather than [`ScopeKind::Local`] — they're
/// re-resolved by name inside the worker instead of captured by value.
fn top_level_names(file: &syn::File) -> HashSet<String> {
    let mut names = HashSet::new();
    for item in &file.items {
        match item {
            syn::Item::Fn(i) => {
                names.insert(i.sig.ident.to_string());
            }
            syn::Item::Static(i) => {
                names.insert(i.ident.to_string());
            }
            syn::Item::Const(i) => {
                names.insert(i.ident.to_string());
            }
            syn::Item::Struct(i) => {
                names.insert(i.ident.to_string());
            }
            syn::Item::Enum(i) => {
                names.insert(i.ident.to_string());
            }
            syn::Item::Type(i) => {
                names.insert(i.ident.to_string());
            }
            syn::Item::Use(i) => collect_use_names(&i.tree, &mut names),
            _ => {}
        }
    }
    names
}

fn collect_use_names(tree: &syn::UseTree, names: &mut HashSet<String>) {
    match tree {
        syn::UseTree::Path(p) => collect_use_names(&p.tree, names),
        syn::UseTree::Name(n) => {
            names.insert(n.ident.to_string());
        }
        syn::UseTree::Rename(r) => {
            names.insert(r.rename.to_string());
        }
        syn::UseTree::Glob(_) => {}
        syn::UseTree::Group(g) => {
            for item in &g.items {
                collect_use_names(item, names);
            }
        }
    }
}

/// Walks the file tracking lexical scope, remembering the scope stack in effect at the
/// `spawn!` invocation whose span starts closest to `target`.
struct MacroLocator {
    target: LineColumn,
    best: Option<(proc_macro2::TokenStream, Vec<HashSet<String>>)>,
    best_distance: usize,
    scopes: Vec<HashSet<String>>,
}

impl MacroLocator {
    fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn bind(&mut self, name: String) {
        if let Some(layer) = self.scopes.last_mut() {
            layer.insert(name);
        }
    }

    fn distance(&self, at: LineColumn) -> usize {
        if at.line == self.target.line {
            at.column.abs_diff(self.target.column)
        } else {
            at.line.abs_diff(self.target.line) * 10_000
        }
    }
}

impl<'ast> Visit<'ast> for MacroLocator {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.push_scope();
        for arg in &node.sig.inputs {
            bind_fn_arg(self, arg);
        }
        visit::visit_block(self, &node.block);
        self.pop_scope();
    }

    fn visit_expr_closure(&mut self, node: &'ast syn::ExprClosure) {
        self.push_scope();
        for input in &node.inputs {
            bind_pat(self, input);
        }
        visit::visit_expr_closure(self, node);
        self.pop_scope();
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        self.push_scope();
        visit::visit_block(self, node);
        self.pop_scope();
    }

    fn visit_expr_for_loop(&mut self, node: &'ast syn::ExprForLoop) {
        self.push_scope();
        bind_pat(self, &node.pat);
        visit::visit_expr(self, &node.expr);
        visit::visit_block(self, &node.body);
        self.pop_scope();
    }

    fn visit_expr_if(&mut self, node: &'ast syn::ExprIf) {
        self.push_scope();
        bind_let_cond(self, &node.cond);
        visit::visit_block(self, &node.then_branch);
        self.pop_scope();
        if let Some((_, else_branch)) = &node.else_branch {
            visit::visit_expr(self, else_branch);
        }
    }

    fn visit_expr_while(&mut self, node: &'ast syn::ExprWhile) {
        self.push_scope();
        bind_let_cond(self, &node.cond);
        visit::visit_block(self, &node.body);
        self.pop_scope();
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        self.push_scope();
        bind_pat(self, &node.pat);
        visit::visit_arm(self, node);
        self.pop_scope();
    }

    fn visit_local(&mut self, node: &'ast syn::Local) {
        visit::visit_local(self, node);
        bind_pat(self, &node.pat);
    }

    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        if node.path.segments.last().map(|s| s.ident == "spawn").unwrap_or(false) {
            let start = node.span().start();
            let at = LineColumn {
                line: start.line,
                column: start.column,
            };
            let dist = self.distance(at);
            if dist < self.best_distance {
                self.best_distance = dist;
                self.best = Some((node.tokens.clone(), self.scopes.clone()));
            }
        }
        visit::visit_macro(self, node);
    }
}

fn bind_fn_arg(locator: &mut MacroLocator, arg: &syn::FnArg) {
    if let syn::FnArg::Typed(pat_type) = arg {
        bind_pat(locator, &pat_type.pat);
    }
}

/// Visits an `if`/`while` condition, binding the pattern into the caller's already-pushed scope
/// when it's an `if let`/`while let` (`syn::Expr::Let`) — the scrutinee itself is visited first,
/// before the pattern is bound, since it executes before the match it's being tested against.
fn bind_let_cond(locator: &mut MacroLocator, cond: &syn::Expr) {
    if let syn::Expr::Let(let_expr) = cond {
        visit::visit_expr(locator, &let_expr.expr);
        bind_pat(locator, &let_expr.pat);
    } else {
        visit::visit_expr(locator, cond);
    }
}

fn bind_pat(locator: &mut MacroLocator, pat: &syn::Pat) {
    collect_pat_idents(pat, &mut |name| locator.bind(name));
}

fn collect_pat_idents(pat: &syn::Pat, sink: &mut impl FnMut(String)) {
    match pat {
        syn::Pat::Ident(p) => {
            sink(p.ident.to_string());
            if let Some((_, sub)) = &p.subpat {
                collect_pat_idents(sub, sink);
            }
        }
        syn::Pat::Tuple(p) => {
            for elem in &p.elems {
                collect_pat_idents(elem, sink);
            }
        }
        syn::Pat::TupleStruct(p) => {
            for elem in &p.elems {
                collect_pat_idents(elem, sink);
            }
        }
        syn::Pat::Struct(p) => {
            for field in &p.fields {
                collect_pat_idents(&field.pat, sink);
            }
        }
        syn::Pat::Reference(p) => collect_pat_idents(&p.pat, sink),
        syn::Pat::Slice(p) => {
            for elem in &p.elems {
                collect_pat_idents(elem, sink);
            }
        }
        syn::Pat::Or(p) => {
            for case in &p.cases {
                collect_pat_idents(case, sink);
            }
        }
        syn::Pat::Paren(p) => collect_pat_idents(&p.pat, sink),
        _ => {}
    }
}

/// Walks a closure body collecting single-segment path expressions not bound inside the
/// closure itself, then resolves each one against the enclosing scope stack.
struct FreeVarCollector {
    bound: Vec<HashSet<String>>,
    free: HashSet<String>,
}

impl FreeVarCollector {
    fn push_scope(&mut self) {
        self.bound.push(HashSet::new());
    }

    fn pop_scope(&mut self) {
        self.bound.pop();
    }

    fn bind(&mut self, name: String) {
        if let Some(layer) = self.bound.last_mut() {
            layer.insert(name);
        }
    }

    fn is_bound_inside(&self, name: &str) -> bool {
        self.bound.iter().any(|layer| layer.contains(name))
    }

    /// As [`bind_let_cond`], binding into whichever scope layer is on top when called.
    fn bind_let_cond(&mut self, cond: &syn::Expr) {
        if let syn::Expr::Let(let_expr) = cond {
            self.visit_expr(&let_expr.expr);
            collect_pat_idents(&let_expr.pat, &mut |name| self.bind(name));
        } else {
            self.visit_expr(cond);
        }
    }
}

impl<'ast> Visit<'ast> for FreeVarCollector {
    fn visit_expr_closure(&mut self, node: &'ast syn::ExprClosure) {
        self.push_scope();
        for input in &node.inputs {
            collect_pat_idents(input, &mut |name| self.bind(name));
        }
        visit::visit_expr_closure(self, node);
        self.pop_scope();
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        self.push_scope();
        visit::visit_block(self, node);
        self.pop_scope();
    }

    fn visit_local(&mut self, node: &'ast syn::Local) {
        visit::visit_local(self, node);
        let pat = &node.pat;
        collect_pat_idents(pat, &mut |name| self.bind(name));
    }

    fn visit_expr_for_loop(&mut self, node: &'ast syn::ExprForLoop) {
        self.push_scope();
        collect_pat_idents(&node.pat, &mut |name| self.bind(name));
        visit::visit_expr(self, &node.expr);
        visit::visit_block(self, &node.body);
        self.pop_scope();
    }

    fn visit_expr_if(&mut self, node: &'ast syn::ExprIf) {
        self.push_scope();
        self.bind_let_cond(&node.cond);
        visit::visit_block(self, &node.then_branch);
        self.pop_scope();
        if let Some((_, else_branch)) = &node.else_branch {
            self.visit_expr(else_branch);
        }
    }

    fn visit_expr_while(&mut self, node: &'ast syn::ExprWhile) {
        self.push_scope();
        self.bind_let_cond(&node.cond);
        visit::visit_block(self, &node.body);
        self.pop_scope();
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        self.push_scope();
        collect_pat_idents(&node.pat, &mut |name| self.bind(name));
        visit::visit_arm(self, node);
        self.pop_scope();
    }

    fn visit_expr_path(&mut self, node: &'ast syn::ExprPath) {
        if node.qself.is_none() && node.path.segments.len() == 1 {
            let name = node.path.segments[0].ident.to_string();
            if !self.is_bound_inside(&name) {
                self.free.insert(name);
            }
        }
        visit::visit_expr_path(self, node);
    }

    fn visit_expr_field(&mut self, node: &'ast syn::ExprField) {
        // Only the base expression can reference a free variable; the field name cannot.
        self.visit_expr(&node.base);
    }

    fn visit_expr_struct(&mut self, node: &'ast syn::ExprStruct) {
        for field in &node.fields {
            self.visit_expr(&field.expr);
        }
        if let Some(rest) = &node.rest {
            self.visit_expr(rest);
        }
    }
}

fn classify_closure(closure: &syn::ExprClosure, root_scope: &[HashSet<String>]) -> ScopeDescriptor {
    let mut collector = FreeVarCollector {
        bound: vec![HashSet::new()],
        free: HashSet::new(),
    };
    for input in &closure.inputs {
        collect_pat_idents(input, &mut |name| collector.bind(name));
    }
    collector.visit_expr(&closure.body);

    let mut vars = Vec::new();
    for name in collector.free {
        let kind = resolve_against_scope(&name, root_scope);
        vars.push(FreeVariable { name, kind });
    }
    vars.sort_by(|a, b| a.name.cmp(&b.name));
    ScopeDescriptor::from_variables(vars)
}

fn resolve_against_scope(name: &str, scopes: &[HashSet<String>]) -> ScopeKind {
    for (depth, layer) in scopes.iter().enumerate().rev() {
        if layer.contains(name) {
            return if depth == 0 {
                ScopeKind::TopLevel
            } else {
                ScopeKind::Local
            };
        }
    }
    ScopeKind::Global
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
