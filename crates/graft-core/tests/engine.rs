//! End-to-end tests of indexing and replay against real repositories.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Pair, minutes_ago, options};
use git2::Oid;
use graft_core::{
    CandidateCommitEntry, CandidateCommitIndex, GraftReplayer, GraftRun, Presence, ReplayPhase,
    TrackedPathMap,
};

fn entry_for(index: &CandidateCommitIndex, id: Oid) -> Option<&CandidateCommitEntry> {
    index
        .entries()
        .iter()
        .find(|e| e.source_commit.as_ref().is_some_and(|c| c.id == id))
}

#[test]
fn replays_only_commits_missing_from_destination() {
    let pair = Pair::new();
    let c1 = pair
        .source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "C1: tweak a", minutes_ago(300));
    pair.source
        .commit(&[("lib/b.txt", Some("b v1\n"))], "C2: add b", minutes_ago(200));
    pair.source
        .commit(&[("lib/a.txt", Some("a v3\n"))], "C3: rework a", minutes_ago(100));

    let ported = pair.destination.commit(
        &[("pkg/a.txt", Some("a v1\n"))],
        &format!("C1: tweak a\n\n>>{c1}<<\n"),
        minutes_ago(250),
    );

    let mut run = GraftRun::new(pair.context(), options(false));
    let report = run.execute().unwrap();

    let branch = report.branch.clone().expect("branch should be created");
    assert!(branch.starts_with("graft-"));
    assert_eq!(report.graft_count(), 2);
    assert_eq!(
        pair.destination.summaries_until(&branch, ported),
        vec!["C3: rework a", "C2: add b"]
    );

    let tip = pair.destination.branch_tip(&branch);
    assert_eq!(pair.destination.tree_content(&tip, "pkg/a.txt"), "a v3\n");
    assert_eq!(pair.destination.tree_content(&tip, "pkg/b.txt"), "b v1\n");

    assert_eq!(report.in_both, 1);
    assert_eq!(report.destination_only, 1);
    assert_eq!(report.source_only, 2);
    assert!(report.unmatched_paths.is_empty());
}

#[test]
fn graft_commit_carries_token_and_original_author() {
    let pair = Pair::new();
    let time = minutes_ago(60);
    let c1 = pair
        .source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "Fix a\n\nDetails.\n", time);

    let report = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();

    let tip = pair.destination.branch_tip(report.branch.as_deref().unwrap());
    let message = tip.message().unwrap();
    assert!(message.starts_with("Fix a\n\n"));
    assert!(message.contains(&format!(">>{c1}<<")));
    assert!(message.contains("    Details."));
    assert_eq!(tip.author().email(), Some(common::AUTHOR_EMAIL));
    assert_eq!(tip.author().when().seconds(), time);
}

#[test]
fn second_run_creates_no_commits() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "C1", minutes_ago(30));
    pair.source
        .commit(&[("lib/c.txt", Some("c\n"))], "C2", minutes_ago(20));

    let first = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();
    assert_eq!(first.graft_count(), 2);

    let second = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();
    assert_eq!(second.graft_count(), 0);
    assert_eq!(second.source_only, 0);

    let second_branch = second.branch.unwrap();
    assert_ne!(first.branch.unwrap(), second_branch);
    assert_eq!(
        pair.destination.branch_tip(&second_branch).id(),
        pair.destination.branch_tip("main").id()
    );
}

#[test]
fn replays_in_ascending_commit_time() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/one.txt", Some("1\n"))], "C1", minutes_ago(30));
    pair.source
        .commit(&[("lib/two.txt", Some("2\n"))], "C2", minutes_ago(20));
    pair.source
        .commit(&[("lib/three.txt", Some("3\n"))], "C3", minutes_ago(10));

    let report = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();

    let branch = report.branch.unwrap();
    assert_eq!(
        pair.destination
            .summaries_until(&branch, pair.destination_root),
        vec!["C3", "C2", "C1"]
    );
    let order: Vec<_> = report
        .grafted
        .iter()
        .map(|g| g.source.summary.as_str())
        .collect();
    assert_eq!(order, vec!["C1", "C2", "C3"]);
}

#[test]
fn partial_mapping_applies_mappable_files() {
    let pair = Pair::new();
    pair.source.commit(
        &[
            ("lib/ok.txt", Some("fine\n")),
            ("lib/missing/deep.txt", Some("lost\n")),
        ],
        "Touch two areas",
        minutes_ago(15),
    );

    let mut run = GraftRun::new(pair.context(), options(false));
    let report = run.execute().unwrap();

    assert_eq!(report.graft_count(), 1);
    assert_eq!(report.grafted[0].files, vec!["pkg/ok.txt".to_string()]);

    let tip = pair.destination.branch_tip(report.branch.as_deref().unwrap());
    assert_eq!(pair.destination.tree_content(&tip, "pkg/ok.txt"), "fine\n");
    assert!(!pair.destination.tree_has(&tip, "pkg/missing"));
    assert!(run.unmatched().contains("lib/missing/deep.txt"));
    assert!(report.unmatched_paths.contains("lib/missing/deep.txt"));
}

#[test]
fn commit_with_no_mappable_file_is_skipped() {
    let pair = Pair::new();
    std::fs::create_dir_all(pair.source.path().join("lib/vendor")).unwrap();
    pair.source
        .commit(&[("lib/vendor/dep.txt", Some("v\n"))], "Vendor", minutes_ago(40));
    pair.source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "Real change", minutes_ago(20));

    let paths = TrackedPathMap::parse(&["lib > pkg"], &["lib/vendor".to_string()], &[]).unwrap();
    let report = GraftRun::new(pair.context_with(paths), options(false))
        .execute()
        .unwrap();

    assert_eq!(report.graft_count(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].summary, "Vendor");
    assert_eq!(
        pair.destination
            .summaries_until(report.branch.as_deref().unwrap(), pair.destination_root),
        vec!["Real change"]
    );
    // Ignored files are filtered, not unmapped.
    assert!(report.unmatched_paths.is_empty());
}

#[test]
fn deletions_are_replayed() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/a.txt", None)], "Remove a", minutes_ago(10));

    let report = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();

    let tip = pair.destination.branch_tip(report.branch.as_deref().unwrap());
    assert!(!pair.destination.tree_has(&tip, "pkg/a.txt"));
    assert!(pair.destination.tree_has(&tip, "README.md"));
}

#[test]
fn root_and_merge_bot_commits_are_never_candidates() {
    let pair = Pair::new();
    let bot = pair.source.commit_as(
        &[("lib/a.txt", Some("merged\n"))],
        "Merge pull request #1",
        minutes_ago(50),
        "noreply@github.com",
    );
    let human = pair
        .source
        .commit(&[("lib/a.txt", Some("human\n"))], "Human change", minutes_ago(40));

    let mut run = GraftRun::new(pair.context(), options(true));
    run.execute().unwrap();

    let index = run.index();
    assert!(entry_for(index, pair.source_root).is_none());
    assert!(entry_for(index, bot).is_none());
    assert!(entry_for(index, human).is_some());
    assert!(
        index
            .entries()
            .iter()
            .all(|e| e.destination_commit.as_ref().map(|c| c.id) != Some(pair.destination_root))
    );
}

#[test]
fn matching_digest_counts_as_already_grafted() {
    let pair = Pair::new();
    let time = minutes_ago(45);
    pair.source
        .commit(&[("lib/a.txt", Some("same\n"))], "Same change", time);
    pair.destination
        .commit(&[("pkg/a.txt", Some("same\n"))], "Same change", time);

    let report = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();

    assert_eq!(report.graft_count(), 0);
    assert_eq!(report.in_both, 1);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].presence, Presence::InBoth);
}

#[test]
fn commits_outside_lookback_window_are_ignored() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/a.txt", Some("old\n"))], "Ancient", minutes_ago(60 * 24 * 40));
    pair.source
        .commit(&[("lib/a.txt", Some("new\n"))], "Recent", minutes_ago(5));

    let report = GraftRun::new(pair.context(), options(true))
        .execute()
        .unwrap();

    let planned: Vec<_> = report
        .grafted
        .iter()
        .map(|g| g.source.summary.as_str())
        .collect();
    assert_eq!(planned, vec!["Recent"]);
}

#[test]
fn dry_run_plans_without_mutating() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/b.txt", Some("b\n"))], "Add b", minutes_ago(10));
    let branches_before = pair.destination.branch_names();

    let ctx = pair.context();
    let index = graft_core::CandidateCommitIndex::build(
        &ctx,
        &graft_core::IndexOptions {
            since: None,
            merge_bot_emails: vec![],
            branch_prefix: "graft".into(),
        },
    )
    .unwrap();

    let mut replayer = GraftReplayer::new(&ctx, "graft", true).unwrap();
    assert_eq!(replayer.phase(), ReplayPhase::NotStarted);
    let mut unmatched = graft_core::UnmatchedPathSet::default();
    let outcome = replayer.run(&index, &mut unmatched).unwrap();

    assert_eq!(replayer.phase(), ReplayPhase::Done);
    assert!(outcome.dry_run);
    assert!(outcome.branch.is_none());
    assert_eq!(outcome.grafted.len(), 1);
    assert!(outcome.grafted[0].created.is_none());
    assert_eq!(outcome.grafted[0].files, vec!["pkg/b.txt".to_string()]);

    assert_eq!(pair.destination.branch_names(), branches_before);
    assert_eq!(
        pair.destination.branch_tip("main").id(),
        pair.destination_root
    );
    assert_eq!(
        std::fs::read_to_string(pair.destination.path().join("pkg/b.txt")).unwrap(),
        "b v0\n"
    );
}

#[test]
fn earlier_unmerged_graft_branch_prevents_duplicates() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "C1", minutes_ago(30));

    let first = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();
    assert_eq!(first.graft_count(), 1);

    pair.source
        .commit(&[("lib/a.txt", Some("a v2\n"))], "C2", minutes_ago(5));

    let second = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();
    let planned: Vec<_> = second
        .grafted
        .iter()
        .map(|g| g.source.summary.as_str())
        .collect();
    assert_eq!(planned, vec!["C2"]);
}

#[test]
fn squashed_graft_commits_are_all_recognized() {
    let pair = Pair::new();
    let c1 = pair
        .source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "C1: tweak a", minutes_ago(60));
    let c2 = pair
        .source
        .commit(&[("lib/b.txt", Some("b v1\n"))], "C2: tweak b", minutes_ago(50));

    pair.destination.commit(
        &[("pkg/a.txt", Some("a v1\n")), ("pkg/b.txt", Some("b v1\n"))],
        &format!("Squashed grafts (#12)\n\n* C1: tweak a\n\n>>{c1}<<\n\n* C2: tweak b\n\n>>{c2}<<\n"),
        minutes_ago(40),
    );

    let mut run = GraftRun::new(pair.context(), options(true));
    let report = run.execute().unwrap();

    assert_eq!(report.graft_count(), 0);
    assert_eq!(report.in_both, 2);
    assert_eq!(report.source_only, 0);
    assert!(entry_for(run.index(), c1).unwrap().destination_commit.is_some());
    assert!(entry_for(run.index(), c2).unwrap().destination_commit.is_some());
}

#[test]
fn change_already_present_in_destination_makes_no_commit() {
    let pair = Pair::new();
    pair.source
        .commit(&[("lib/a.txt", Some("a v1\n"))], "Tweak a", minutes_ago(30));
    pair.destination.commit(
        &[("pkg/a.txt", Some("a v1\n"))],
        "Port a tweak by hand",
        minutes_ago(20),
    );

    let report = GraftRun::new(pair.context(), options(false))
        .execute()
        .unwrap();

    assert_eq!(report.graft_count(), 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].summary, "Tweak a");

    let branch = report.branch.unwrap();
    assert_eq!(
        pair.destination.branch_tip(&branch).id(),
        pair.destination.branch_tip("main").id()
    );
}
