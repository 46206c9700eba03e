#![allow(clippy::unwrap_used)]
//! Integration tests for component identity, state retention, and
//! mark-and-sweep pruning across render passes.

use nib::{Cleanup, Ctx, Deps, SetState};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

type CleanupLog = Rc<RefCell<Vec<String>>>;

/// Keyed list item: state seeded from the given seed, one mount effect whose
/// cleanup records the instance id when the item is destroyed.
fn item(ctx: &mut Ctx, props: &(String, CleanupLog)) -> String {
    let (seed, log) = props;
    let (value, _set) = ctx.use_state(seed.clone());
    let id = ctx.use_id();
    let log = log.clone();
    ctx.use_effect(Deps::Once, move || {
        Some(Box::new(move || log.borrow_mut().push(id.to_string())) as Cleanup)
    });
    value
}

/// Renders one keyed `item` per (key, seed) pair.
fn list(ctx: &mut Ctx, props: &(Vec<(String, String)>, CleanupLog)) -> String {
    let (entries, log) = props;
    entries
        .iter()
        .map(|(key, seed)| ctx.render_keyed(key, item, &(seed.clone(), log.clone())))
        .collect::<Vec<_>>()
        .join(",")
}

fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, s)| ((*k).to_string(), (*s).to_string()))
        .collect()
}

#[test]
fn test_removed_child_is_pruned_with_cleanup_exactly_once() {
    let log: CleanupLog = Rc::default();
    let mut ctx = Ctx::new();

    let out = ctx.render_pass(
        list,
        &(entries(&[("a", "a"), ("b", "b"), ("c", "c")]), log.clone()),
    );
    assert_eq!(out, "a,b,c");
    assert_eq!(ctx.registry().len(), 4);
    assert!(log.borrow().is_empty());

    // Drop the middle child: its instance goes away, its cleanup runs, the
    // survivors are untouched.
    let out = ctx.render_pass(list, &(entries(&[("a", "a"), ("c", "c")]), log.clone()));
    assert_eq!(out, "a,c");
    assert_eq!(ctx.registry().len(), 3);
    assert!(ctx.registry().get("list/item:b").is_none());
    assert!(ctx.registry().get("list/item:a").is_some());
    assert!(ctx.registry().get("list/item:c").is_some());
    assert_eq!(log.borrow().as_slice(), ["list/item:b"]);

    // Further passes must not re-run the cleanup.
    ctx.render_pass(list, &(entries(&[("a", "a"), ("c", "c")]), log.clone()));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_survivors_keep_state_across_prune() {
    let log: CleanupLog = Rc::default();
    let mut ctx = Ctx::new();

    let out = ctx.render_pass(list, &(entries(&[("a", "1"), ("b", "2")]), log.clone()));
    assert_eq!(out, "1,2");

    // "a" survives with a different seed: the live slot wins, so the output
    // still shows the original value.
    let out = ctx.render_pass(list, &(entries(&[("a", "9")]), log.clone()));
    assert_eq!(out, "1");
    assert_eq!(log.borrow().as_slice(), ["list/item:b"]);
}

#[test]
fn test_remount_after_prune_starts_fresh() {
    let log: CleanupLog = Rc::default();
    let mut ctx = Ctx::new();

    ctx.render_pass(list, &(entries(&[("a", "old")]), log.clone()));
    ctx.render_pass(list, &(entries(&[]), log.clone()));
    assert_eq!(log.borrow().as_slice(), ["list/item:a"]);

    // The id returns: a brand-new instance with re-seeded state and a fresh
    // mount effect.
    let out = ctx.render_pass(list, &(entries(&[("a", "new")]), log.clone()));
    assert_eq!(out, "new");
    ctx.render_pass(list, &(entries(&[]), log.clone()));
    assert_eq!(log.borrow().as_slice(), ["list/item:a", "list/item:a"]);
}

#[test]
fn test_stale_setter_is_benign_after_prune() {
    type Smuggled = Rc<RefCell<Option<SetState<u32>>>>;

    fn leaf(ctx: &mut Ctx, out: &Smuggled) -> String {
        let (value, set) = ctx.use_state(1u32);
        *out.borrow_mut() = Some(set);
        value.to_string()
    }
    fn maybe(ctx: &mut Ctx, props: &(bool, Smuggled)) -> String {
        if props.0 {
            ctx.render(leaf, &props.1)
        } else {
            String::new()
        }
    }

    let smuggled: Smuggled = Rc::default();
    let mut ctx = Ctx::new();
    ctx.render_pass(maybe, &(true, smuggled.clone()));
    let set = smuggled.borrow_mut().take().unwrap();

    ctx.render_pass(maybe, &(false, smuggled.clone()));
    assert!(ctx.registry().get("maybe/leaf.0").is_none());

    // The captured setter outlived its instance; the write must vanish
    // without panicking.
    set.set(99);
    ctx.render_pass(maybe, &(false, smuggled));
}

#[test]
fn test_unkeyed_ordinals_shift_on_insertion() {
    fn cell(ctx: &mut Ctx, seed: &u32) -> String {
        let (v, _) = ctx.use_state(*seed);
        v.to_string()
    }
    fn row(ctx: &mut Ctx, seeds: &Vec<u32>) -> String {
        seeds
            .iter()
            .map(|s| ctx.render(cell, s))
            .collect::<Vec<_>>()
            .join(",")
    }

    let mut ctx = Ctx::new();
    assert_eq!(ctx.render_pass(row, &vec![10, 20]), "10,20");

    // Prepending without keys makes ordinal 0 inherit the old front cell's
    // state. This is the documented hazard keyed rendering exists for.
    assert_eq!(ctx.render_pass(row, &vec![5, 10, 20]), "10,20,20");
}

proptest! {
    /// After any two renders, the registry holds exactly the root plus the
    /// second render's keys, and cleanups ran exactly for the dropped set.
    #[test]
    fn registry_tracks_rendered_keys(
        first in proptest::collection::btree_set("[a-z]{1,6}", 1..8),
        second in proptest::collection::btree_set("[a-z]{1,6}", 0..8),
    ) {
        let first: Vec<String> = first.into_iter().collect();
        let second: Vec<String> = second.into_iter().collect();
        let pair_up = |keys: &[String]| -> Vec<(String, String)> {
            keys.iter().map(|k| (k.clone(), k.clone())).collect()
        };

        let log: CleanupLog = Rc::default();
        let mut ctx = Ctx::new();
        ctx.render_pass(list, &(pair_up(&first), log.clone()));
        ctx.render_pass(list, &(pair_up(&second), log.clone()));

        prop_assert_eq!(ctx.registry().len(), second.len() + 1);
        for key in &second {
            let id = format!("list/item:{key}");
            prop_assert!(ctx.registry().get(&id).is_some());
        }

        let second_set: BTreeSet<&String> = second.iter().collect();
        let expected: BTreeSet<String> = first
            .iter()
            .filter(|k| !second_set.contains(k))
            .map(|k| format!("list/item:{k}"))
            .collect();
        let cleaned: BTreeSet<String> = log.borrow().iter().cloned().collect();
        prop_assert_eq!(cleaned, expected);
    }
}
