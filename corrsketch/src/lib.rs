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

//! # Correlation Sketches
//!
//! Estimates the correlation between numeric columns that are joinable through a shared key,
//! without performing the join. Each column is summarized by a sketch of its (key, value) rows
//! that retains a bounded sample: the min-hash synopses also stream in bounded memory, while the
//! priority sketch groups every distinct key before sampling. Two sketches estimate set
//! statistics of their key sets (distinct count, union, intersection, Jaccard similarity,
//! containment) and the correlation of the joined values from a merge-join of their samples.
//!
//! The library is organized leaf-first:
//!
//! * [`hash`] hashes keys and maps hashes to uniform order keys.
//! * [`synopsis`] holds the KMV and GKMV min-hash synopses; [`priority`] the priority sketch for
//!   columns with repeated keys.
//! * [`sketch`] pairs a synopsis with a [`correlation`] estimator and freezes it for comparison.
//! * [`index`] searches a corpus of sketches for columns correlated with a query; [`pairwise`]
//!   compares every pair of a corpus exhaustively.
//!
//! The library logs through [`tracing`] and never installs a subscriber.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod aggregate;
pub mod codec;
pub mod correlation;
pub mod error;
pub mod hash;
pub mod index;
pub mod join;
pub mod pairwise;
pub mod priority;
pub mod sketch;
pub mod stats;
pub mod synopsis;
