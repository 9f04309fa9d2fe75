// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::{Conflict, MailPolicy};

fn defaults() -> CatalogDefaults {
    CatalogDefaults { username: "alice".to_string(), hostname: "example.org".to_string() }
}

fn parse(text: &str) -> Result<Catalog, CatalogError> {
    parse_str(text, &defaults())
}

#[test]
fn empty_catalog_is_distinct() {
    assert!(parse("").unwrap_err().is_empty());
    assert!(parse("# nothing but comments\n").unwrap_err().is_empty());
    assert!(parse("[default]\nmail = never\n").unwrap_err().is_empty());
}

#[test]
fn partition_startup_and_scheduled() {
    let catalog = parse(
        "[cleanup]\ncommand = rm -rf /tmp/scratch\n\n\
         [backup]\ncommand = run-backup\ninterval = 1d\n",
    )
    .unwrap();
    assert!(catalog.startup.contains_key("cleanup"));
    assert!(catalog.jobs.contains_key("backup"));
    assert!(catalog.get("cleanup").is_some());
}

#[test]
fn inheritance_overlays_most_specific_last() {
    let catalog = parse(
        "[default]\nmail = never\n\n\
         [foo]\ncommand = foo\ntime = 0 3 * * *\n\n\
         [foo.bar]\nqueue = blk\n\n\
         [foo.baz]\ncommand = baz\n",
    )
    .unwrap();

    let foo = &catalog.jobs["foo"];
    let bar = &catalog.jobs["foo.bar"];
    let baz = &catalog.jobs["foo.baz"];

    assert_eq!(bar.command, foo.command);
    assert_eq!(bar.time, foo.time);
    assert_eq!(bar.queue, "blk");
    assert_eq!(baz.command, "baz");
    assert_eq!(baz.time, foo.time);
    assert_eq!(foo.mail, MailPolicy::Never);
    assert_eq!(baz.mail, MailPolicy::Never);

    // The child's own queue default is its own name, unless inherited.
    assert_eq!(foo.queue, "foo");
    assert_eq!(baz.queue, "foo.baz");
}

#[test]
fn inheritance_composition_is_associative() {
    // Overlaying default, a, a.b in one pass must equal composing
    // (default ∘ a) and then a.b on top.
    let full = parse(
        "[default]\nmail = always\nconflict = skip\n\n\
         [a]\ncommand = a\ninterval = 5\nconflict = kill\n\n\
         [a.b]\ncommand = b\n",
    )
    .unwrap();

    let staged = parse(
        // The (default ∘ a) composition written out literally.
        "[a]\ncommand = a\ninterval = 5\nmail = always\nconflict = kill\n\n\
         [a.b]\ncommand = b\n",
    )
    .unwrap();

    assert_eq!(full.jobs["a.b"].command, staged.jobs["a.b"].command);
    assert_eq!(full.jobs["a.b"].mail, staged.jobs["a.b"].mail);
    assert_eq!(full.jobs["a.b"].conflict, staged.jobs["a.b"].conflict);
    assert_eq!(full.jobs["a.b"].interval, staged.jobs["a.b"].interval);
}

#[test]
fn child_queue_defaults_to_own_name_not_parents() {
    let catalog = parse(
        "[a]\ncommand = a\ninterval = 5\n\n[a.b]\ninterval = 10\n",
    )
    .unwrap();
    assert_eq!(catalog.jobs["a"].queue, "a");
    assert_eq!(catalog.jobs["a.b"].queue, "a.b");
    assert_eq!(catalog.jobs["a.b"].command, "a");
}

#[test]
fn error_missing_parent() {
    let err = parse("[a.b]\ncommand = x\ninterval = 5\n").unwrap_err();
    assert!(err.to_string().contains("missing parent"), "{err}");
}

#[test]
fn error_unresolved_post_target() {
    let err = parse("[a]\ncommand = x\npost = ghost\n").unwrap_err();
    assert!(err.to_string().contains("ghost"), "{err}");
}

#[test]
fn post_target_may_be_startup_job() {
    let catalog = parse(
        "[seed]\ncommand = seed\n\n[next]\ncommand = x\npost = seed\n",
    )
    .unwrap();
    assert_eq!(catalog.jobs["next"].post, vec!["seed"]);
}

#[test]
fn error_invalid_job_name() {
    let err = parse("[bad name]\ncommand = x\n").unwrap_err();
    assert!(err.to_string().contains("invalid job name"), "{err}");
}

#[test]
fn loglevel_only_in_default() {
    let catalog = parse("[default]\nloglevel = debug\n\n[a]\ncommand = x\ninterval = 5\n").unwrap();
    assert_eq!(catalog.loglevel, LogLevel::Debug);

    let err = parse("[a]\ncommand = x\ninterval = 5\nloglevel = debug\n").unwrap_err();
    assert!(err.to_string().contains("loglevel"), "{err}");

    let err = parse("[default]\nloglevel = verbose\n\n[a]\ncommand = x\ninterval = 5\n")
        .unwrap_err();
    assert!(err.to_string().contains("loglevel"), "{err}");
}

#[test]
fn loglevel_is_not_inherited_as_a_job_key() {
    // The default section carries loglevel plus job defaults; only the
    // job defaults flow down.
    let catalog = parse(
        "[default]\nloglevel = info\nconflict = skip\n\n[a]\ncommand = x\ninterval = 5\n",
    )
    .unwrap();
    assert_eq!(catalog.jobs["a"].conflict, Conflict::Skip);
}

#[test]
fn deep_inheritance_chain() {
    let catalog = parse(
        "[a]\ncommand = a\ninterval = 5\n\n\
         [a.b]\nqueue = shared\n\n\
         [a.b.c]\nmail = never\n",
    )
    .unwrap();
    let leaf = &catalog.jobs["a.b.c"];
    assert_eq!(leaf.command, "a");
    assert_eq!(leaf.queue, "shared");
    assert_eq!(leaf.mail, MailPolicy::Never);
    assert!(leaf.interval.is_some());
}
