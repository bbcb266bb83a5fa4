// tests/comment_tree_tests.rs
//
// The tree builder is a pure function of (rows, options, requester), so it
// is tested directly against hand-built row sets, no database required.

use chrono::{Duration, TimeZone, Utc};
use promptshare::comment_tree::{
    CommentNode, DELETED_PLACEHOLDER, ListMode, ListOptions, Requester, RootOrder,
    build_comment_page,
};
use promptshare::models::comment::CommentRow;

const PROMPT_ID: i64 = 7;

fn row(id: i64, parent: Option<i64>, t: i64) -> CommentRow {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    CommentRow {
        id,
        prompt_id: PROMPT_ID,
        author_id: 100 + id,
        author_username: format!("user{}", id),
        parent_comment_id: parent,
        content: format!("comment {}", id),
        created_at: base + Duration::seconds(t),
        updated_at: base + Duration::seconds(t),
        deleted_at: None,
    }
}

fn deleted(mut r: CommentRow) -> CommentRow {
    r.deleted_at = Some(r.created_at + Duration::seconds(3600));
    r
}

fn opts(mode: ListMode) -> ListOptions {
    ListOptions {
        mode,
        ..ListOptions::default()
    }
}

fn tree_opts() -> ListOptions {
    opts(ListMode::Tree)
}

/// Depth-first flattening of a forest into ids.
fn flatten_ids(nodes: &[CommentNode]) -> Vec<i64> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.id);
        for reply in node.replies.iter().rev() {
            stack.push(reply);
        }
    }
    out
}

// Scenario: R1(root, t=1), R2(root, t=2), C1(parent=R1, t=3).
fn two_roots_one_reply() -> Vec<CommentRow> {
    vec![row(1, None, 1), row(2, None, 2), row(3, Some(1), 3)]
}

#[test]
fn tree_mode_attaches_replies_under_parents() {
    let rows = two_roots_one_reply();
    let page = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);

    assert_eq!(page.total_roots, 2);
    assert_eq!(page.total_comments, 3);
    assert_eq!(page.comments.len(), 2);

    let r1 = &page.comments[0];
    assert_eq!(r1.id, 1);
    assert_eq!(r1.reply_count, 1);
    assert_eq!(r1.replies.len(), 1);
    assert_eq!(r1.replies[0].id, 3);

    let r2 = &page.comments[1];
    assert_eq!(r2.id, 2);
    assert!(r2.replies.is_empty());
}

#[test]
fn deleted_root_is_redacted_but_keeps_children() {
    let mut rows = two_roots_one_reply();
    rows[0] = deleted(rows[0].clone());

    let page = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);

    let r1 = &page.comments[0];
    assert!(r1.deleted);
    assert_eq!(r1.content, DELETED_PLACEHOLDER);
    assert!(r1.author.is_none());
    // Deletion does not cascade: the reply renders with its original text.
    assert_eq!(r1.replies.len(), 1);
    assert_eq!(r1.replies[0].content, "comment 3");
    assert!(r1.replies[0].author.is_some());
}

#[test]
fn redaction_is_identical_for_every_requester() {
    let mut rows = two_roots_one_reply();
    rows[0] = deleted(rows[0].clone());
    let author_id = rows[0].author_id;

    let as_author = Requester {
        user_id: Some(author_id),
        moderator: false,
    };
    let as_moderator = Requester {
        user_id: Some(999),
        moderator: true,
    };

    for requester in [Requester::ANONYMOUS, as_author, as_moderator] {
        let page = build_comment_page(&rows, tree_opts(), requester);
        let r1 = &page.comments[0];
        assert_eq!(r1.content, DELETED_PLACEHOLDER);
        assert!(r1.author.is_none());
        assert!(!r1.editable);
        assert!(!r1.deletable);
    }
}

#[test]
fn root_pagination_keeps_whole_subtrees() {
    let rows = two_roots_one_reply();
    let page1 = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Tree,
            order: RootOrder::Oldest,
            page: 1,
            page_size: 1,
        },
        Requester::ANONYMOUS,
    );
    let page2 = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Tree,
            order: RootOrder::Oldest,
            page: 2,
            page_size: 1,
        },
        Requester::ANONYMOUS,
    );

    assert_eq!(page1.total_roots, 2);
    assert_eq!(page1.comments.len(), 1);
    assert_eq!(page1.comments[0].id, 1);
    // The reply rides along with its root even though page size is 1.
    assert_eq!(page1.comments[0].replies.len(), 1);

    assert_eq!(page2.comments.len(), 1);
    assert_eq!(page2.comments[0].id, 2);
}

#[test]
fn page_past_the_end_is_empty_not_an_error() {
    let rows = two_roots_one_reply();
    let page = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Tree,
            order: RootOrder::Oldest,
            page: 5,
            page_size: 10,
        },
        Requester::ANONYMOUS,
    );
    assert!(page.comments.is_empty());
    assert_eq!(page.total_roots, 2);
}

#[test]
fn empty_input_yields_empty_output() {
    let rows: Vec<CommentRow> = Vec::new();

    let flat = build_comment_page(&rows, opts(ListMode::Flat), Requester::ANONYMOUS);
    assert!(flat.comments.is_empty());
    assert_eq!(flat.total_roots, 0);
    assert_eq!(flat.total_comments, 0);

    let tree = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);
    assert!(tree.comments.is_empty());
}

#[test]
fn flat_mode_contains_every_row_in_order() {
    let rows = vec![
        row(1, None, 10),
        deleted(row(2, Some(1), 20)),
        row(3, Some(2), 30),
        row(4, None, 40),
    ];

    let page = build_comment_page(&rows, opts(ListMode::Flat), Requester::ANONYMOUS);
    // Deleted rows are redacted, never dropped.
    assert_eq!(page.comments.len(), rows.len());
    let ids: Vec<i64> = page.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(page.comments.iter().all(|c| c.replies.is_empty()));

    let newest = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Flat,
            order: RootOrder::Newest,
            ..ListOptions::default()
        },
        Requester::ANONYMOUS,
    );
    let ids: Vec<i64> = newest.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[test]
fn tree_flattened_matches_flat_id_set() {
    let rows = vec![
        row(1, None, 5),
        row(2, Some(1), 6),
        row(3, Some(2), 7),
        deleted(row(4, Some(1), 8)),
        row(5, None, 9),
        row(6, Some(5), 10),
    ];

    let flat = build_comment_page(&rows, opts(ListMode::Flat), Requester::ANONYMOUS);
    let tree = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);

    let mut flat_ids: Vec<i64> = flat.comments.iter().map(|c| c.id).collect();
    let mut tree_ids = flatten_ids(&tree.comments);
    flat_ids.sort_unstable();
    tree_ids.sort_unstable();
    assert_eq!(flat_ids, tree_ids);
}

#[test]
fn replies_stay_oldest_first_even_when_roots_are_newest_first() {
    let rows = vec![
        row(1, None, 1),
        row(2, None, 2),
        row(3, Some(1), 30),
        row(4, Some(1), 20),
        row(5, Some(1), 10),
    ];

    let page = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Tree,
            order: RootOrder::Newest,
            ..ListOptions::default()
        },
        Requester::ANONYMOUS,
    );

    // Roots newest-first...
    let root_ids: Vec<i64> = page.comments.iter().map(|c| c.id).collect();
    assert_eq!(root_ids, vec![2, 1]);
    // ...but replies remain in posting order.
    let reply_ids: Vec<i64> = page.comments[1].replies.iter().map(|c| c.id).collect();
    assert_eq!(reply_ids, vec![5, 4, 3]);
}

#[test]
fn building_twice_is_deterministic_and_does_not_mutate_input() {
    let rows = vec![
        row(1, None, 1),
        deleted(row(2, Some(1), 2)),
        row(3, Some(2), 3),
    ];
    let snapshot = rows.clone();

    let first = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);
    let second = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);

    assert_eq!(first, second);
    assert_eq!(rows, snapshot);
}

#[test]
fn affordance_flags_follow_ownership_and_role() {
    let rows = two_roots_one_reply();
    let author_of_r1 = rows[0].author_id;

    let anon = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);
    assert!(anon.comments.iter().all(|c| !c.editable && !c.deletable));

    let as_author = build_comment_page(
        &rows,
        tree_opts(),
        Requester {
            user_id: Some(author_of_r1),
            moderator: false,
        },
    );
    assert!(as_author.comments[0].editable);
    assert!(as_author.comments[0].deletable);
    assert!(!as_author.comments[1].editable);

    let as_moderator = build_comment_page(
        &rows,
        tree_opts(),
        Requester {
            user_id: Some(999),
            moderator: true,
        },
    );
    assert!(as_moderator.comments.iter().all(|c| c.editable && c.deletable));
}

#[test]
fn deleted_childless_root_still_renders() {
    let rows = vec![deleted(row(1, None, 1))];
    let page = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);

    assert_eq!(page.comments.len(), 1);
    assert_eq!(page.comments[0].content, DELETED_PLACEHOLDER);
    assert_eq!(page.comments[0].reply_count, 0);
}

#[test]
fn flat_mode_reports_direct_reply_counts() {
    let rows = vec![
        row(1, None, 1),
        row(2, Some(1), 2),
        row(3, Some(1), 3),
        row(4, Some(2), 4),
    ];
    let page = build_comment_page(&rows, opts(ListMode::Flat), Requester::ANONYMOUS);

    let counts: Vec<(i64, i64)> = page.comments.iter().map(|c| (c.id, c.reply_count)).collect();
    assert_eq!(counts, vec![(1, 2), (2, 1), (3, 0), (4, 0)]);
}

#[test]
fn deep_reply_chains_do_not_overflow_the_stack() {
    // One root with a 5000-deep single-file reply chain.
    let mut rows = vec![row(1, None, 0)];
    for i in 2..=5000 {
        rows.push(row(i, Some(i - 1), i));
    }

    let page = build_comment_page(&rows, tree_opts(), Requester::ANONYMOUS);
    assert_eq!(page.comments.len(), 1);

    let mut depth = 0;
    let mut node = &page.comments[0];
    while let Some(next) = node.replies.first() {
        node = next;
        depth += 1;
    }
    assert_eq!(depth, 4999);
}

#[test]
fn extreme_page_numbers_yield_an_empty_page() {
    let rows = two_roots_one_reply();

    // page comes straight from a query parameter; i64::MAX must not panic
    // in the offset arithmetic, just land past the end.
    for page in [i64::MAX, i64::MAX - 1, 1 << 40] {
        let result = build_comment_page(
            &rows,
            ListOptions {
                mode: ListMode::Tree,
                order: RootOrder::Oldest,
                page,
                page_size: 100,
            },
            Requester::ANONYMOUS,
        );
        assert!(result.comments.is_empty());
        assert_eq!(result.total_roots, 2);
    }
}

#[test]
fn page_size_is_clamped_to_the_maximum() {
    let rows: Vec<CommentRow> = (1..=150).map(|i| row(i, None, i)).collect();
    let page = build_comment_page(
        &rows,
        ListOptions {
            mode: ListMode::Tree,
            order: RootOrder::Oldest,
            page: 1,
            page_size: 10_000,
        },
        Requester::ANONYMOUS,
    );

    assert_eq!(page.page_size, 100);
    assert_eq!(page.comments.len(), 100);
    assert_eq!(page.total_roots, 150);
}
