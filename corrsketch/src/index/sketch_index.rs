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

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use super::Document;
use super::InMemoryPostingsStore;
use super::PostingsReader;
use super::PostingsStore;
use super::Term;
use crate::codec::decode_hash;
use crate::codec::decode_values;
use crate::codec::encode_hash;
use crate::correlation::CorrelationEstimate;
use crate::correlation::CorrelationEstimator;
use crate::error::Error;
use crate::sketch::ImmutableSketch;
use crate::synopsis::Samples;

/// Configuration of a [`SketchIndex`].
#[derive(Debug, Clone, Default)]
pub struct SketchIndexConfig {
    /// Estimator used to re-rank candidates. When `None`, each search uses the query sketch's
    /// own estimator.
    pub rerank_estimator: Option<Arc<dyn CorrelationEstimator>>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Id the candidate was indexed under.
    pub id: String,
    /// Estimated correlation between the candidate and the query.
    pub estimate: CorrelationEstimate,
    /// Key-overlap score the candidate was retrieved with.
    pub overlap: f64,
}

/// A searchable collection of correlation sketches.
///
/// Each indexed sketch is stored as one fingerprint term per retained key plus its encoded value
/// array. A search retrieves the candidates sharing the most keys with the query, rebuilds their
/// sketches and returns them ordered by estimated correlation with the query.
///
/// Indexing calls are serialized; searches run concurrently with them and observe each indexed
/// sketch either completely or not at all. After [`SketchIndex::close`] every operation fails
/// with [`ErrorKind::IndexClosed`](crate::error::ErrorKind::IndexClosed).
///
/// # Examples
///
/// ```
/// # use corrsketch::index::SketchIndex;
/// # use corrsketch::sketch::ImmutableSketch;
/// let index = SketchIndex::new();
/// let a = ImmutableSketch::new(vec![1, 2, 3, 4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let b = ImmutableSketch::new(vec![1, 2, 3, 4], vec![4.0, 3.0, 2.0, 1.0]).unwrap();
/// index.index("up", &a).unwrap();
/// index.index("down", &b).unwrap();
///
/// let hits = index.search(&a, 10).unwrap();
/// assert_eq!(hits[0].id, "up");
/// assert_eq!(hits[1].id, "down");
/// assert_eq!(hits[1].estimate.coefficient, -1.0);
/// ```
#[derive(Debug)]
pub struct SketchIndex<S = InMemoryPostingsStore> {
    store: S,
    config: SketchIndexConfig,
    writer: Mutex<()>,
    open: AtomicBool,
}

impl SketchIndex<InMemoryPostingsStore> {
    /// Creates an index backed by an [`InMemoryPostingsStore`].
    pub fn new() -> Self {
        Self::with_store(InMemoryPostingsStore::new(), SketchIndexConfig::default())
    }
}

impl Default for SketchIndex<InMemoryPostingsStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PostingsStore> SketchIndex<S> {
    /// Creates an index over `store`.
    pub fn with_store(store: S, config: SketchIndexConfig) -> Self {
        Self {
            store,
            config,
            writer: Mutex::new(()),
            open: AtomicBool::new(true),
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true until [`SketchIndex::close`] is called.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Closes the index. Closing twice is a no-op.
    pub fn close(&self) {
        // wait for an in-flight write so it is not cut off between upsert and refresh
        let _guard = self.writer.lock();
        if self.open.swap(false, Ordering::AcqRel) {
            tracing::debug!("closed sketch index");
        }
    }

    /// Indexes `sketch` under `id`, replacing any sketch previously indexed under it.
    ///
    /// The sketch is visible to searches that start after this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IndexClosed`](crate::error::ErrorKind::IndexClosed) after
    /// [`SketchIndex::close`], or the store's error if the write fails.
    pub fn index(&self, id: &str, sketch: &ImmutableSketch) -> Result<(), Error> {
        let _guard = self.writer.lock();
        self.ensure_open("index")?;

        let document = Document {
            id: id.to_string(),
            fingerprints: sketch.keys().iter().map(|&key| encode_hash(key)).collect(),
            values: sketch.encoded_values(),
        };
        self.store.upsert(document)?;
        self.store.refresh()?;
        tracing::debug!(id, keys = sketch.len(), "indexed sketch");
        Ok(())
    }

    /// Removes the sketch indexed under `id`; returns whether there was one.
    ///
    /// # Errors
    ///
    /// Same as [`SketchIndex::index`].
    pub fn remove(&self, id: &str) -> Result<bool, Error> {
        let _guard = self.writer.lock();
        self.ensure_open("remove")?;

        let existed = self.store.delete(id)?;
        self.store.refresh()?;
        tracing::debug!(id, existed, "removed sketch");
        Ok(existed)
    }

    /// Returns the number of searchable sketches.
    ///
    /// # Errors
    ///
    /// Same as [`SketchIndex::search`].
    pub fn len(&self) -> Result<usize, Error> {
        self.ensure_open("len")?;
        Ok(self.store.reader()?.num_docs())
    }

    /// Returns true if no sketch is searchable.
    ///
    /// # Errors
    ///
    /// Same as [`SketchIndex::search`].
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    /// Finds indexed sketches correlated with `query`.
    ///
    /// The `k` sketches sharing the most keys with the query are retrieved and re-ranked by
    /// descending correlation coefficient; ties keep the higher overlap first, then the earlier
    /// indexed. Candidates whose correlation cannot be estimated (too few shared keys, a constant
    /// column) or whose stored form fails to decode are left out.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IndexClosed`](crate::error::ErrorKind::IndexClosed) after
    /// [`SketchIndex::close`], or the store's error if retrieval fails.
    pub fn search(&self, query: &ImmutableSketch, k: usize) -> Result<Vec<SearchResult>, Error> {
        self.ensure_open("search")?;
        if k == 0 || query.is_empty() {
            return Ok(vec![]);
        }

        let terms: Vec<Term> = query
            .keys()
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|&key| encode_hash(key))
            .collect();
        let estimator = self
            .config
            .rerank_estimator
            .as_ref()
            .unwrap_or(query.estimator());

        let reader = self.store.reader()?;
        let candidates = reader.disjunctive_search(&terms, k)?;
        tracing::debug!(candidates = candidates.len(), "retrieved candidates");

        let mut ranked = Vec::with_capacity(candidates.len());
        for (position, candidate) in candidates.into_iter().enumerate() {
            let Some(document) = reader.fetch(&candidate.id)? else {
                tracing::debug!(id = %candidate.id, "candidate vanished from snapshot");
                continue;
            };
            let sketch = match decode_document(&document, estimator) {
                Ok(sketch) => sketch,
                Err(err) => {
                    tracing::warn!(id = %candidate.id, error = %err, "skipping undecodable sketch");
                    continue;
                }
            };
            match sketch.correlation_to_with(query, estimator.as_ref()) {
                Ok(estimate) => ranked.push((
                    position,
                    SearchResult {
                        id: candidate.id,
                        estimate,
                        overlap: candidate.score,
                    },
                )),
                Err(err) => {
                    tracing::debug!(id = %candidate.id, error = %err, "skipping candidate");
                }
            }
        }

        // candidates arrive ordered by overlap, then insertion
        ranked.sort_by(|(pa, a), (pb, b)| {
            rank_key(b)
                .total_cmp(&rank_key(a))
                .then(b.overlap.total_cmp(&a.overlap))
                .then(pa.cmp(pb))
        });
        Ok(ranked.into_iter().map(|(_, result)| result).collect())
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), Error> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::index_closed(operation))
        }
    }
}

fn rank_key(result: &SearchResult) -> f64 {
    let coefficient = result.estimate.coefficient;
    if coefficient.is_nan() {
        f64::NEG_INFINITY
    } else {
        coefficient
    }
}

fn decode_document(
    document: &Document,
    estimator: &Arc<dyn CorrelationEstimator>,
) -> Result<ImmutableSketch, Error> {
    let keys = document
        .fingerprints
        .iter()
        .map(|term| decode_hash(term))
        .collect::<Result<Vec<_>, _>>()?;
    let values = decode_values(&document.values)?;
    if keys.len() != values.len() {
        return Err(Error::deserial("stored keys and values differ in length")
            .with_context("keys", keys.len())
            .with_context("values", values.len()));
    }
    let samples = Samples {
        keys,
        values,
        unique_keys: false,
    };
    Ok(ImmutableSketch::from_samples(samples, estimator.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::Spearman;
    use crate::error::ErrorKind;

    fn sketch(keys: &[i32], values: &[f64]) -> ImmutableSketch {
        ImmutableSketch::new(keys.to_vec(), values.to_vec()).unwrap()
    }

    #[test]
    fn test_reindex_replaces() {
        let index = SketchIndex::new();
        let query = sketch(&[1, 2, 3], &[1.0, 2.0, 3.0]);
        index.index("c", &sketch(&[1, 2, 3], &[3.0, 2.0, 1.0])).unwrap();
        index.index("c", &sketch(&[1, 2, 3], &[1.0, 2.0, 4.0])).unwrap();
        assert_eq!(index.len().unwrap(), 1);
        let hits = index.search(&query, 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].estimate.coefficient > 0.9);
    }

    #[test]
    fn test_failing_candidates_are_skipped() {
        let index = SketchIndex::new();
        let query = sketch(&[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0]);
        index.index("constant", &sketch(&[1, 2, 3], &[5.0, 5.0, 5.0])).unwrap();
        index.index("single", &sketch(&[4, 10], &[1.0, 2.0])).unwrap();
        index.index("good", &sketch(&[1, 2, 3], &[2.0, 4.0, 7.0])).unwrap();
        let hits = index.search(&query, 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[test]
    fn test_undecodable_documents_are_skipped() {
        let index = SketchIndex::new();
        let query = sketch(&[1, 2, 3], &[1.0, 2.0, 3.0]);
        index.index("good", &sketch(&[1, 2, 3], &[1.0, 2.0, 3.5])).unwrap();
        let corrupt = Document {
            id: "corrupt".to_string(),
            fingerprints: vec![encode_hash(1), encode_hash(2)],
            values: vec![0; 15],
        };
        index.store().upsert(corrupt).unwrap();
        index.store().refresh().unwrap();

        let hits = index.search(&query, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "good");
    }

    #[test]
    fn test_ties_prefer_overlap_then_insertion() {
        let index = SketchIndex::new();
        let query = sketch(&[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0]);
        index.index("first", &sketch(&[1, 2, 3], &[1.0, 2.0, 3.0])).unwrap();
        index.index("wide", &sketch(&[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0])).unwrap();
        index.index("second", &sketch(&[2, 3, 4], &[1.0, 2.0, 3.0])).unwrap();
        let hits = index.search(&query, 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["wide", "first", "second"]);
        assert_eq!(hits[0].overlap, 4.0);
    }

    #[test]
    fn test_rerank_estimator_overrides_query() {
        let config = SketchIndexConfig {
            rerank_estimator: Some(Arc::new(Spearman::default())),
        };
        let index = SketchIndex::with_store(InMemoryPostingsStore::new(), config);
        let query = sketch(&[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0]);
        index.index("cubic", &sketch(&[1, 2, 3, 4], &[1.0, 8.0, 27.0, 640.0])).unwrap();
        let hits = index.search(&query, 1).unwrap();
        assert_eq!(hits[0].estimate.coefficient, 1.0);
    }

    #[test]
    fn test_closed_index_rejects_operations() {
        let index = SketchIndex::new();
        let s = sketch(&[1, 2], &[1.0, 2.0]);
        index.index("a", &s).unwrap();
        index.close();
        index.close();
        assert!(!index.is_open());
        assert_eq!(index.index("b", &s).unwrap_err().kind(), ErrorKind::IndexClosed);
        assert_eq!(index.search(&s, 1).unwrap_err().kind(), ErrorKind::IndexClosed);
        assert_eq!(index.remove("a").unwrap_err().kind(), ErrorKind::IndexClosed);
    }

    #[test]
    fn test_remove() {
        let index = SketchIndex::new();
        let s = sketch(&[1, 2], &[1.0, 2.0]);
        index.index("a", &s).unwrap();
        assert!(index.remove("a").unwrap());
        assert!(index.is_empty().unwrap());
        assert!(index.search(&s, 3).unwrap().is_empty());
    }
}
