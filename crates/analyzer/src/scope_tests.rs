// SPDX-License-Identifier: MIT

use super::*;
use ispawn_core::scope::ScopeKind;
use proptest::prelude::*;

fn parse(src: &str) -> syn::File {
    syn::parse_file(src).unwrap()
}

fn site_for(src: &str, needle: &str) -> CallSite {
    let offset = src.find(needle).expect("needle not found in fixture");
    let line = src[..offset].matches('\n').count() as u32 + 1;
    let column = match src[..offset].rfind('\n') {
        Some(nl) => (offset - nl - 1) as u32,
        None => offset as u32,
    };
    CallSite::new("fixture.rs", line, column)
}

#[test]
fn classifies_local_top_level_and_global() {
    let src = r#"
        const LIMIT: u32 = 10;

        fn helper() -> u32 { 0 }

        fn caller() {
            let counter = 0;
            spawn!(move || {
                let total = counter + LIMIT + helper();
                std::cmp::min(total, 1)
            });
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    assert_eq!(descriptor.locals, vec!["counter".to_string()]);
    let mut top_levels = descriptor.top_levels.clone();
    top_levels.sort();
    assert_eq!(top_levels, vec!["LIMIT".to_string(), "helper".to_string()]);
    assert!(descriptor.globals.iter().any(|g| g == "std"));
}

#[test]
fn excludes_identifiers_bound_inside_the_closure() {
    let src = r#"
        fn caller() {
            let seed = 1;
            spawn!(move || {
                let derived = seed + 1;
                derived * 2
            });
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    assert_eq!(descriptor.locals, vec!["seed".to_string()]);
    assert!(!descriptor.locals.contains(&"derived".to_string()));
}

#[test]
fn picks_closure_parameters_as_bound_not_free() {
    let src = r#"
        fn caller() {
            let data = vec![1, 2, 3];
            spawn!(move |extra: i32| {
                data.len() as i32 + extra
            });
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    assert_eq!(descriptor.locals, vec!["data".to_string()]);
    assert!(!descriptor.locals.contains(&"extra".to_string()));
}

#[test]
fn binds_an_if_let_pattern_as_a_local_inside_its_then_branch() {
    let src = r#"
        fn caller() {
            let opt = Some(5);
            if let Some(x) = opt {
                spawn!(move || x + 1);
            }
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    assert_eq!(descriptor.locals, vec!["x".to_string()]);
    assert!(descriptor.globals.is_empty());
}

#[test]
fn binds_a_while_let_pattern_as_a_local_inside_the_loop_body() {
    let src = r#"
        fn caller() {
            let mut queue = vec![1, 2, 3];
            while let Some(item) = queue.pop() {
                spawn!(move || item * 2);
            }
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    assert_eq!(descriptor.locals, vec!["item".to_string()]);
    assert!(descriptor.globals.is_empty());
}

#[test]
fn if_let_scrutinee_itself_resolves_in_the_outer_scope() {
    let src = r#"
        fn caller() {
            let opt = Some(5);
            if let Some(x) = opt {
                spawn!(move || opt.is_some() as i32 + x);
            }
        }
    "#;
    let file = parse(src);
    let site = site_for(src, "spawn!");

    let descriptor = locate_spawn_macro(&file, &site).unwrap();

    let mut locals = descriptor.locals.clone();
    locals.sort();
    assert_eq!(locals, vec!["opt".to_string(), "x".to_string()]);
}

#[test]
fn errors_when_no_spawn_macro_present() {
    let src = "fn caller() {}";
    let file = parse(src);
    let site = CallSite::new("fixture.rs", 1, 0);

    let result = locate_spawn_macro(&file, &site);
    assert!(matches!(result, Err(AnalyzeError::MacroNotFound { .. })));
}

#[test]
fn resolve_against_scope_finds_locals_before_top_level() {
    let mut root = HashSet::new();
    root.insert("shared".to_string());
    let mut inner = HashSet::new();
    inner.insert("shadow".to_string());
    let scopes = vec![root, inner];

    assert_eq!(resolve_against_scope("shadow", &scopes), ScopeKind::Local);
    assert_eq!(resolve_against_scope("shared", &scopes), ScopeKind::TopLevel);
    assert_eq!(resolve_against_scope("missing", &scopes), ScopeKind::Global);
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,7}"
        .prop_filter("must not collide with a Rust keyword", |s| {
            !matches!(s.as_str(), "let" | "fn" | "if" | "for" | "use" | "mod" | "mut" | "ref" | "box")
        })
}

proptest! {
    /// spec.md §8's "scope partition is disjoint" property: every free variable a closure
    /// references resolves to exactly one of `locals`/`top_levels`/`globals`, never more than one.
    #[test]
    fn scope_partition_is_always_disjoint(names in prop::collection::hash_set(ident(), 1..6)) {
        let locals: Vec<String> = names.into_iter().collect();
        let sum_expr = locals.join(" + ");
        let lets: String = locals.iter().map(|n| format!("let {n} = 1;\n")).collect();
        let src = format!(
            "fn caller() {{\n{lets}spawn!(move || {sum_expr});\n}}"
        );

        let file = parse(&src);
        let site = site_for(&src, "spawn!");
        let descriptor = locate_spawn_macro(&file, &site).unwrap();

        let locals_set: HashSet<_> = descriptor.locals.iter().collect();
        let top_levels_set: HashSet<_> = descriptor.top_levels.iter().collect();
        let globals_set: HashSet<_> = descriptor.globals.iter().collect();

        prop_assert!(locals_set.is_disjoint(&top_levels_set));
        prop_assert!(locals_set.is_disjoint(&globals_set));
        prop_assert!(top_levels_set.is_disjoint(&globals_set));
        prop_assert_eq!(locals_set.len(), locals.len());
    }

    /// spec.md §8's "scope analysis is idempotent" property: re-running the analyzer over the
    /// same file and call site always yields the same partition.
    #[test]
    fn scope_partition_is_idempotent(names in prop::collection::hash_set(ident(), 1..6)) {
        let locals: Vec<String> = names.into_iter().collect();
        let sum_expr = locals.join(" + ");
        let lets: String = locals.iter().map(|n| format!("let {n} = 1;\n")).collect();
        let src = format!(
            "fn caller() {{\n{lets}spawn!(move || {sum_expr});\n}}"
        );

        let file = parse(&src);
        let site = site_for(&src, "spawn!");

        let first = locate_spawn_macro(&file, &site).unwrap();
        let second = locate_spawn_macro(&file, &site).unwrap();
        prop_assert_eq!(first, second);
    }
}
