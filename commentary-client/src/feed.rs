use std::collections::HashSet;

use crate::api::{Comment, CommentId, Query};

/// Comments as displayed, newest first, never holding the same id twice
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentList {
    comments: Vec<Comment>,
    ids: HashSet<CommentId>,
}

impl CommentList {
    pub fn new() -> CommentList {
        CommentList::default()
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    pub fn to_vec(&self) -> Vec<Comment> {
        self.comments.clone()
    }

    /// Start over from a first page, keeping the displayed comments that are newer than all of it
    ///
    /// Those arrived live after the service answered the first page query.
    pub fn replace(&mut self, batch: Vec<Comment>) {
        let newest = batch.first().map(|c| (c.created_at, c.id));
        let batch_ids = batch.iter().map(|c| c.id).collect::<HashSet<_>>();
        let kept = std::mem::take(&mut self.comments)
            .into_iter()
            .filter(|c| {
                !batch_ids.contains(&c.id) && newest.map_or(true, |n| (c.created_at, c.id) > n)
            })
            .collect::<Vec<_>>();
        self.ids.clear();
        self.append(kept);
        self.append(batch);
    }

    /// Add an older batch at the end, skipping comments already displayed
    ///
    /// Returns the number of comments actually added
    pub fn append(&mut self, batch: Vec<Comment>) -> usize {
        let before = self.comments.len();
        for c in batch {
            if self.ids.insert(c.id) {
                self.comments.push(c);
            }
        }
        self.comments.len() - before
    }

    /// Returns false, leaving the list untouched, if the comment is already displayed
    pub fn prepend(&mut self, c: Comment) -> bool {
        if !self.ids.insert(c.id) {
            return false;
        }
        self.comments.insert(0, c);
        true
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cursor {
    pub offset: usize,
    pub page_size: usize,

    /// Number of comments the service last reported, plus live inserts received since
    pub total: usize,

    /// Whether a page was ever successfully loaded
    pub loaded: bool,
}

impl Cursor {
    pub fn new(page_size: usize) -> Cursor {
        Cursor {
            offset: 0,
            page_size,
            total: 0,
            loaded: false,
        }
    }

    pub fn next_query(&self, table: &str) -> Query {
        Query::page(table, self.offset, self.page_size)
    }

    /// Record a successfully displayed page
    ///
    /// The displayed list is always a newest-first prefix of the service ordering, so its length
    /// is where the next page starts, whether live inserts landed before or after the service
    /// answered. `total` may predate inserts already displayed, hence never less than `displayed`.
    pub fn advance(&mut self, displayed: usize, total: usize) {
        self.total = std::cmp::max(total, displayed);
        self.offset = displayed;
        self.loaded = true;
    }

    /// A live insert lands at the head of the service ordering, shifting every loaded row by one
    ///
    /// Keeps `offset` equal to the displayed length between page loads.
    pub fn record_insert(&mut self) {
        self.total += 1;
        if self.loaded {
            self.offset += 1;
        }
    }

    pub fn has_more(&self) -> bool {
        self.loaded && self.offset < self.total
    }
}
