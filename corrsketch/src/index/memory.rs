// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;

use super::Document;
use super::PostingsReader;
use super::PostingsStore;
use super::ScoredDoc;
use super::Term;
use crate::error::Error;

// a segment is merged into its predecessor once the predecessor is at most this many times larger
const MERGE_RATIO: usize = 2;

/// An in-memory inverted index of fingerprint terms.
///
/// Writes go to a pending buffer guarded by a mutex. [`PostingsStore::refresh`] freezes the buffer
/// into an immutable segment and publishes a new [`StoreSnapshot`] that shares every older
/// segment with the previous one, so publishing costs the size of the new writes rather than the
/// size of the index. A document in a newer segment, or a deletion recorded there, shadows any
/// older copy of the same id. Adjacent segments of similar size are merged on refresh, which keeps
/// the number of segments logarithmic in the number of writes.
///
/// Readers hold an `Arc` to the snapshot that was current when they started, so they never wait
/// for writers beyond the pointer swap.
///
/// # Examples
///
/// ```
/// # use corrsketch::index::Document;
/// # use corrsketch::index::InMemoryPostingsStore;
/// # use corrsketch::index::PostingsReader;
/// # use corrsketch::index::PostingsStore;
/// let store = InMemoryPostingsStore::new();
/// let doc = Document {
///     id: "c0".to_string(),
///     fingerprints: vec![[0, 0, 0, 1], [0, 0, 0, 2]],
///     values: vec![0; 16],
/// };
/// store.upsert(doc).unwrap();
/// assert_eq!(store.reader().unwrap().num_docs(), 0);
///
/// store.refresh().unwrap();
/// let hits = store.reader().unwrap().disjunctive_search(&[[0, 0, 0, 2]], 10).unwrap();
/// assert_eq!(hits[0].id, "c0");
/// assert_eq!(hits[0].score, 1.0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryPostingsStore {
    pending: Mutex<Pending>,
    published: RwLock<Arc<StoreSnapshot>>,
}

#[derive(Debug, Default)]
struct Pending {
    documents: HashMap<Arc<str>, Arc<StoredDocument>>,
    deleted: HashSet<Arc<str>>,
    next_sequence: u64,
    dirty: bool,
}

/// An immutable view of an [`InMemoryPostingsStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    // oldest first
    segments: Vec<Arc<Segment>>,
    live_docs: usize,
}

#[derive(Debug, Default)]
struct Segment {
    documents: HashMap<Arc<str>, Arc<StoredDocument>>,
    // ids whose older copies this segment hides
    deleted: HashSet<Arc<str>>,
    postings: HashMap<Term, Vec<Arc<str>>>,
}

#[derive(Debug)]
struct StoredDocument {
    document: Document,
    sequence: u64,
}

impl InMemoryPostingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostingsStore for InMemoryPostingsStore {
    type Reader = Arc<StoreSnapshot>;

    fn upsert(&self, document: Document) -> Result<(), Error> {
        let mut pending = self.pending.lock();
        let sequence = pending.next_sequence;
        pending.next_sequence += 1;

        let id: Arc<str> = Arc::from(document.id.as_str());
        pending.deleted.remove(&id);
        let stored = Arc::new(StoredDocument { document, sequence });
        pending.documents.insert(id, stored);
        pending.dirty = true;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, Error> {
        let mut pending = self.pending.lock();
        let buffered = pending.documents.remove(id).is_some();
        let published = !pending.deleted.contains(id) && self.published.read().lookup(id).is_some();
        if published {
            pending.deleted.insert(Arc::from(id));
        }
        pending.dirty |= buffered || published;
        Ok(buffered || published)
    }

    fn refresh(&self) -> Result<(), Error> {
        let mut pending = self.pending.lock();
        if !pending.dirty {
            return Ok(());
        }
        pending.dirty = false;
        let documents = std::mem::take(&mut pending.documents);
        let deleted = std::mem::take(&mut pending.deleted);

        let current = Arc::clone(&self.published.read());
        let mut live_docs = current.live_docs;
        for id in &deleted {
            if current.lookup(id).is_some() {
                live_docs -= 1;
            }
        }
        for id in documents.keys() {
            if current.lookup(id).is_none() {
                live_docs += 1;
            }
        }

        let mut segments = current.segments.clone();
        let fresh = Segment::build(documents, deleted);
        if fresh.size() > 0 {
            segments.push(Arc::new(fresh));
        }
        while let [.., older, newer] = segments.as_slice() {
            if older.size() > MERGE_RATIO * newer.size() {
                break;
            }
            let merged = Segment::merge(older, newer, segments.len() == 2);
            segments.truncate(segments.len() - 2);
            segments.push(Arc::new(merged));
        }

        tracing::debug!(segments = segments.len(), live_docs, "published store snapshot");
        *self.published.write() = Arc::new(StoreSnapshot {
            segments,
            live_docs,
        });
        Ok(())
    }

    fn reader(&self) -> Result<Self::Reader, Error> {
        Ok(Arc::clone(&self.published.read()))
    }
}

impl Segment {
    fn build(
        documents: HashMap<Arc<str>, Arc<StoredDocument>>,
        deleted: HashSet<Arc<str>>,
    ) -> Self {
        let mut postings: HashMap<Term, Vec<Arc<str>>> = HashMap::new();
        for (id, stored) in &documents {
            let terms: HashSet<&Term> = stored.document.fingerprints.iter().collect();
            for term in terms {
                postings.entry(*term).or_default().push(Arc::clone(id));
            }
        }
        Self {
            documents,
            deleted,
            postings,
        }
    }

    /// Folds `newer` over `older`. Deletions are dropped once nothing older remains to hide.
    fn merge(older: &Segment, newer: &Segment, is_oldest: bool) -> Self {
        let mut documents = older.documents.clone();
        let mut deleted = older.deleted.clone();
        for id in &newer.deleted {
            documents.remove(id);
            deleted.insert(Arc::clone(id));
        }
        for (id, stored) in &newer.documents {
            deleted.remove(id);
            documents.insert(Arc::clone(id), Arc::clone(stored));
        }
        if is_oldest {
            deleted.clear();
        }
        Self::build(documents, deleted)
    }

    fn size(&self) -> usize {
        self.documents.len() + self.deleted.len()
    }

    fn shadows(&self, id: &str) -> bool {
        self.documents.contains_key(id) || self.deleted.contains(id)
    }
}

impl StoreSnapshot {
    /// Returns the number of segments backing this snapshot.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    fn lookup(&self, id: &str) -> Option<&Arc<StoredDocument>> {
        for segment in self.segments.iter().rev() {
            if let Some(stored) = segment.documents.get(id) {
                return Some(stored);
            }
            if segment.deleted.contains(id) {
                return None;
            }
        }
        None
    }

    fn is_shadowed(&self, segment: usize, id: &str) -> bool {
        self.segments[segment + 1..].iter().any(|s| s.shadows(id))
    }
}

impl PostingsReader for StoreSnapshot {
    fn disjunctive_search(&self, terms: &[Term], top_k: usize) -> Result<Vec<ScoredDoc>, Error> {
        let unique: HashSet<&Term> = terms.iter().collect();
        let mut matches: HashMap<(usize, &str), u32> = HashMap::new();
        for (position, segment) in self.segments.iter().enumerate() {
            for &term in &unique {
                if let Some(ids) = segment.postings.get(term) {
                    for id in ids {
                        *matches.entry((position, &**id)).or_default() += 1;
                    }
                }
            }
        }

        let mut hits: Vec<ScoredDoc> = matches
            .into_iter()
            .filter(|&((position, id), _)| !self.is_shadowed(position, id))
            .filter_map(|((position, id), count)| {
                let stored = self.segments[position].documents.get(id)?;
                Some(ScoredDoc {
                    id: id.to_string(),
                    score: count as f64,
                    sequence: stored.sequence,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.sequence.cmp(&b.sequence))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    fn fetch(&self, id: &str) -> Result<Option<Document>, Error> {
        Ok(self.lookup(id).map(|stored| stored.document.clone()))
    }

    fn num_docs(&self) -> usize {
        self.live_docs
    }
}
