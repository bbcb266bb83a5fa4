// src/comment_tree.rs

//! In-memory assembly of a prompt's comment thread.
//!
//! Takes the flat rows fetched for one prompt and produces either a flat
//! chronological sequence or a paginated forest of nested replies. This is a
//! pure function of (rows, options, requester): no I/O, no shared state, and
//! the input slice is never mutated, so the same input always produces the
//! same output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::comment::CommentRow;
use crate::utils::jwt::Claims;

/// Fixed placeholder shown in place of a soft-deleted comment's content.
pub const DELETED_PLACEHOLDER: &str = "[deleted]";

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Presentation mode for a comment listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Single chronological sequence, no nesting.
    #[default]
    Flat,
    /// Paginated roots, each carrying its full reply subtree.
    Tree,
}

/// Ordering direction for root comments (and the flat sequence).
///
/// Replies within a parent are always oldest-first, independent of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootOrder {
    /// Chronological discussion order (default).
    #[default]
    Oldest,
    Newest,
}

/// Normalized listing options. `page` is 1-indexed.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub mode: ListMode,
    pub order: RootOrder,
    pub page: i64,
    pub page_size: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            mode: ListMode::Flat,
            order: RootOrder::Oldest,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Identity context of the requester, used only for the per-node
/// editable/deletable affordance flags. Content visibility never depends
/// on it: a deleted comment is redacted for everyone, author included.
#[derive(Debug, Clone, Copy, Default)]
pub struct Requester {
    pub user_id: Option<i64>,
    pub moderator: bool,
}

impl Requester {
    pub const ANONYMOUS: Requester = Requester {
        user_id: None,
        moderator: false,
    };

    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            Some(c) => Requester {
                user_id: Some(c.user_id()),
                moderator: c.is_moderator(),
            },
            None => Requester::ANONYMOUS,
        }
    }
}

/// Author display info. Omitted entirely on redacted nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentAuthor {
    pub id: i64,
    pub username: String,
}

/// One rendered comment. In flat mode `replies` is always empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    pub id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub author: Option<CommentAuthor>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted: bool,
    /// Advisory flags for the presentation layer; never affect content.
    pub editable: bool,
    pub deletable: bool,
    /// Number of direct replies (including redacted ones).
    pub reply_count: i64,
    pub replies: Vec<CommentNode>,
}

/// One page of a prompt's comment listing.
///
/// `total_roots` is the pagination domain; `total_comments` counts every
/// row including nested replies and is informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentPage {
    pub mode: ListMode,
    pub order: RootOrder,
    pub page: i64,
    pub page_size: i64,
    pub total_roots: i64,
    pub total_comments: i64,
    pub comments: Vec<CommentNode>,
}

/// Builds a page of a prompt's comment listing from its flat row set.
///
/// Soft-deleted rows are never dropped: removing one would detach its reply
/// subtree. They are redacted instead (placeholder content, no author).
/// Flat mode returns the entire sequence; pagination applies to tree roots,
/// and a root included in a page carries its whole subtree regardless of
/// depth.
pub fn build_comment_page(
    rows: &[CommentRow],
    opts: ListOptions,
    requester: Requester,
) -> CommentPage {
    let page = opts.page.max(1);
    let page_size = opts.page_size.clamp(1, MAX_PAGE_SIZE);

    // Chronological visit order, stable on id when timestamps collide.
    let mut ordered: Vec<usize> = (0..rows.len()).collect();
    ordered.sort_by_key(|&i| (rows[i].created_at, rows[i].id));

    // parent id -> direct children, oldest first.
    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    for &i in &ordered {
        match rows[i].parent_comment_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(i),
            None => roots.push(i),
        }
    }

    let total_roots = roots.len() as i64;
    let total_comments = rows.len() as i64;

    let comments = match opts.mode {
        ListMode::Flat => {
            let mut seq = ordered;
            if opts.order == RootOrder::Newest {
                seq.reverse();
            }
            seq.iter()
                .map(|&i| {
                    let mut node = project(&rows[i], requester);
                    node.reply_count = child_count(&children, rows[i].id);
                    node
                })
                .collect()
        }
        ListMode::Tree => {
            if opts.order == RootOrder::Newest {
                roots.reverse();
            }
            // page is unbounded client input; saturate instead of overflowing
            // so absurd page numbers yield an empty page, not a panic.
            let start = (page - 1).saturating_mul(page_size) as usize;
            roots
                .iter()
                .skip(start)
                .take(page_size as usize)
                .map(|&i| build_subtree(i, rows, &children, requester))
                .collect()
        }
    };

    CommentPage {
        mode: opts.mode,
        order: opts.order,
        page,
        page_size,
        total_roots,
        total_comments,
        comments,
    }
}

fn child_count(children: &HashMap<i64, Vec<usize>>, id: i64) -> i64 {
    children.get(&id).map_or(0, |c| c.len() as i64)
}

/// Projects one row into its rendered node, applying the redaction rule.
fn project(row: &CommentRow, requester: Requester) -> CommentNode {
    let deleted = row.deleted_at.is_some();
    let owned = requester.user_id == Some(row.author_id);
    // Redacted nodes carry no affordances: their content is gone for
    // everyone, and a repeated delete would be a no-op anyway.
    let can_modify = !deleted && (owned || requester.moderator);

    CommentNode {
        id: row.id,
        parent_comment_id: row.parent_comment_id,
        content: if deleted {
            DELETED_PLACEHOLDER.to_string()
        } else {
            row.content.clone()
        },
        author: if deleted {
            None
        } else {
            Some(CommentAuthor {
                id: row.author_id,
                username: row.author_username.clone(),
            })
        },
        created_at: row.created_at,
        deleted,
        editable: can_modify,
        deletable: can_modify,
        reply_count: 0,
        replies: Vec::new(),
    }
}

/// Attaches a root's entire reply subtree with an explicit stack, so thread
/// depth is bounded by memory rather than the call stack.
fn build_subtree(
    root: usize,
    rows: &[CommentRow],
    children: &HashMap<i64, Vec<usize>>,
    requester: Requester,
) -> CommentNode {
    const NO_CHILDREN: &[usize] = &[];
    let kids_of = |id: i64| children.get(&id).map_or(NO_CHILDREN, |v| v.as_slice());

    let mut stack: Vec<(CommentNode, std::slice::Iter<'_, usize>)> =
        vec![(project(&rows[root], requester), kids_of(rows[root].id).iter())];

    loop {
        // Each parent id appears once in the children index and parents are
        // fixed at creation, so no index is ever visited twice.
        let next = stack
            .last_mut()
            .map(|(_, pending)| pending.next().copied())
            .unwrap_or(None);

        match next {
            Some(child) => {
                stack.push((project(&rows[child], requester), kids_of(rows[child].id).iter()));
            }
            None => {
                let (mut node, _) = stack.pop().expect("stack holds at least the root");
                node.reply_count = node.replies.len() as i64;
                match stack.last_mut() {
                    Some((parent, _)) => parent.replies.push(node),
                    None => return node,
                }
            }
        }
    }
}
