//! End-to-end runs through dispatcher and session

use super::test_utils::{cacheable_text, delta_msg, encode, finished, new_session, reference_to};
use deltatree::cache::MissPolicy;
use deltatree::dispatch::MessageDispatcher;
use deltatree::delta::DeltaKind;
use deltatree::element::{Element, NamedDataSet};
use deltatree::protocol::{BincodeCodec, Delta, ForwardMsg, MsgBody, ScriptFinishedStatus};
use deltatree::tree::root::Logo;
use deltatree::session::AppSession;
use std::sync::Arc;

fn wired() -> (MessageDispatcher, Arc<AppSession>) {
    let mut dispatcher = MessageDispatcher::new(Arc::new(BincodeCodec), MissPolicy::Fatal);
    let session = AppSession::shared();
    session.attach(&mut dispatcher);
    dispatcher.arm().unwrap();
    (dispatcher, session)
}

#[test]
fn test_two_runs_prune_what_the_second_skipped() {
    let (mut dispatcher, session) = wired();
    let header = cacheable_text(&[0, 0], "header");

    for msg in [
        new_session("r1", "page", 2, &[]),
        header.clone(),
        delta_msg(&[0, 1], "page", None, Element::text("only in r1")),
        finished(ScriptFinishedStatus::FinishedOk),
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }
    assert_eq!(session.current_tree().main().children.len(), 2);

    // Second run resends the header by reference and skips the other element.
    for msg in [
        new_session("r2", "page", 2, &[]),
        reference_to(&header, &[0, 0]),
        finished(ScriptFinishedStatus::FinishedOk),
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }

    let tree = session.current_tree();
    assert_eq!(tree.generation_id(), "r2");
    assert_eq!(tree.main().children.len(), 1);
    let leaf = tree.get_at(&[0, 0]).unwrap();
    assert_eq!(leaf.as_leaf().unwrap().element.as_ref(), &Element::text("header"));
    assert_eq!(leaf.generation_id(), "r2");
}

#[test]
fn test_fragment_run_leaves_rest_of_page() {
    let (mut dispatcher, session) = wired();

    for msg in [
        new_session("r1", "page", 2, &[]),
        delta_msg(&[0, 0], "page", None, Element::text("static")),
        delta_msg(&[0, 1], "page", Some("frag"), Element::text("tick 1")),
        finished(ScriptFinishedStatus::FinishedOk),
        new_session("r2", "page", 2, &["frag"]),
        delta_msg(&[0, 1], "page", Some("frag"), Element::text("tick 2")),
        finished(ScriptFinishedStatus::FinishedFragmentRunOk),
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }

    let tree = session.current_tree();
    assert_eq!(tree.main().children.len(), 2);
    assert_eq!(tree.get_at(&[0, 0]).unwrap().generation_id(), "r1");
    assert_eq!(tree.get_at(&[0, 1]).unwrap().generation_id(), "r2");
    assert!(session.run().is_fragment_run());
}

#[test]
fn test_interrupted_run_keeps_everything_and_cache_age() {
    let (mut dispatcher, session) = wired();
    for msg in [
        new_session("r1", "page", 0, &[]),
        delta_msg(&[0, 0], "page", None, Element::text("a")),
        finished(ScriptFinishedStatus::FinishedOk),
        new_session("r2", "page", 0, &[]),
        finished(ScriptFinishedStatus::FinishedEarlyForRerun),
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }

    assert!(session.current_tree().get_at(&[0, 0]).is_some());
    assert_eq!(dispatcher.cache().generation(), 1);
}

#[test]
fn test_bad_append_shows_error_element() {
    let (mut dispatcher, session) = wired();
    let mut append = delta_msg(&[0, 0], "page", None, Element::text("unused"));
    append.body = MsgBody::Delta(Delta {
        fragment_id: None,
        kind: DeltaKind::AppendToLeaf(NamedDataSet::unnamed(Vec::new())),
    });

    for msg in [
        new_session("r1", "page", 2, &[]),
        delta_msg(&[0, 0], "page", None, Element::text("not a table")),
        append,
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }

    let tree = session.current_tree();
    let leaf = tree.get_at(&[0, 0]).unwrap();
    assert_eq!(leaf.as_leaf().unwrap().element.kind(), "exception");
    assert_eq!(session.placeholder_count(), 1);
}

#[test]
fn test_logo_and_page_switch() {
    let (mut dispatcher, session) = wired();
    let mut logo = ForwardMsg::new(MsgBody::Logo(Logo {
        image: "logo.png".to_string(),
        link: None,
        icon_image: None,
    }));
    logo.metadata.active_script_hash = "page-a".to_string();

    for msg in [
        new_session("r1", "page-a", 2, &[]),
        delta_msg(&[0, 0], "page-a", None, Element::text("a")),
        delta_msg(&[1, 0], "shared", None, Element::text("nav")),
        logo,
        finished(ScriptFinishedStatus::FinishedOk),
    ] {
        dispatcher.receive(encode(&msg)).unwrap();
    }
    assert_eq!(session.current_tree().logo().unwrap().owner_hash, "page-a");

    dispatcher
        .receive(encode(&new_session("r2", "page-b", 2, &[])))
        .unwrap();
    let tree = session.current_tree();
    assert_eq!(tree.owner_hash(), "page-b");
    assert!(tree.main().is_empty());
    assert!(tree.logo().is_none());
}
