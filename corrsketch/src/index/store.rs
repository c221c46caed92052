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

use std::sync::Arc;

use crate::codec::HASH_WIDTH;
use crate::error::Error;

/// A fingerprint term: a key hash encoded as 4 big-endian bytes.
pub type Term = [u8; HASH_WIDTH];

/// The stored form of one indexed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Unique document id; upserting an existing id replaces the document.
    pub id: String,
    /// One term per retained key, in ascending key order. Repeated keys repeat their term.
    pub fingerprints: Vec<Term>,
    /// Values aligned with `fingerprints`, encoded as big-endian doubles.
    pub values: Vec<u8>,
}

/// A document matched by a disjunctive search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    /// Document id.
    pub id: String,
    /// Match score; higher means more query terms matched.
    pub score: f64,
    /// Position of the document's latest upsert in the store's write order.
    pub sequence: u64,
}

/// A term-postings store holding indexed documents.
///
/// Writes are buffered until [`PostingsStore::refresh`] publishes them; a
/// [`PostingsStore::reader`] observes the documents as of the last refresh and never changes
/// afterwards, so a search sees each document either entirely before or entirely after an
/// upsert.
pub trait PostingsStore: Send + Sync {
    /// A point-in-time view of the published documents.
    type Reader: PostingsReader;

    /// Inserts `document`, replacing any document with the same id.
    fn upsert(&self, document: Document) -> Result<(), Error>;

    /// Deletes the document `id`; returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool, Error>;

    /// Publishes all buffered writes to new readers.
    fn refresh(&self) -> Result<(), Error>;

    /// Returns a view of the documents published by the last refresh.
    fn reader(&self) -> Result<Self::Reader, Error>;
}

/// Read operations over a point-in-time view of a [`PostingsStore`].
pub trait PostingsReader {
    /// Returns the `top_k` documents matching any of `terms`, best first.
    fn disjunctive_search(&self, terms: &[Term], top_k: usize) -> Result<Vec<ScoredDoc>, Error>;

    /// Returns the stored document `id`, if present.
    fn fetch(&self, id: &str) -> Result<Option<Document>, Error>;

    /// Returns the number of visible documents.
    fn num_docs(&self) -> usize;
}

impl<R: PostingsReader + ?Sized> PostingsReader for Arc<R> {
    fn disjunctive_search(&self, terms: &[Term], top_k: usize) -> Result<Vec<ScoredDoc>, Error> {
        (**self).disjunctive_search(terms, top_k)
    }

    fn fetch(&self, id: &str) -> Result<Option<Document>, Error> {
        (**self).fetch(id)
    }

    fn num_docs(&self) -> usize {
        (**self).num_docs()
    }
}
