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

//! Correlation search over a corpus of sketches.
//!
//! The [`SketchIndex`] treats its backing store as a term-postings collaborator behind the
//! [`PostingsStore`] trait: each sketch becomes a [`Document`] whose fingerprint terms are its
//! retained key hashes. Retrieval by shared terms is only a coarse recall filter; the final
//! ranking is by correlation estimated from the reconstructed sketches.
//!
//! [`InMemoryPostingsStore`] is the bundled store: an inverted index published as immutable
//! snapshots, giving searches snapshot isolation from concurrent indexing.

mod memory;
mod sketch_index;
mod store;

pub use self::memory::InMemoryPostingsStore;
pub use self::memory::StoreSnapshot;
pub use self::sketch_index::SearchResult;
pub use self::sketch_index::SketchIndex;
pub use self::sketch_index::SketchIndexConfig;
pub use self::store::Document;
pub use self::store::PostingsReader;
pub use self::store::PostingsStore;
pub use self::store::ScoredDoc;
pub use self::store::Term;
