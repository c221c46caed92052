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

//! Priority sketches for columns whose join keys repeat.
//!
//! KMV-style synopses treat every distinct key alike, so a key that occurs a thousand times in a
//! one-to-many join is as likely to be dropped as one that occurs once. A priority sketch first
//! groups the stream by key, then keeps the `max_size` keys with the highest priority
//! `weight / u`, where `u` is the key's [order key](crate::hash::order_key):
//!
//! * **PRISK** ([`PriorityWeight::Frequency`]) weighs a key by how many rows carry it.
//! * **WPRISK** ([`PriorityWeight::Magnitude`]) weighs a key by the magnitude of its value.
//!
//! Since `u` depends only on the key's hash, two columns sketched independently agree on the
//! relative priority of keys with equal weight, which keeps their samples joinable.
//!
//! With [`AggregateFunction::None`](crate::aggregate::AggregateFunction::None) the repeated rows
//! of each retained key are all kept, deliberately biasing the sample toward frequent keys.
//!
//! # Usage
//!
//! ```rust
//! use corrsketch::aggregate::AggregateFunction;
//! use corrsketch::priority::PrioritySketch;
//! use corrsketch::priority::PrioritySketchConfig;
//! use corrsketch::synopsis::Sampler;
//!
//! let config = PrioritySketchConfig {
//!     aggregate: AggregateFunction::Sum,
//!     max_size: 3,
//!     ..Default::default()
//! };
//! let mut sketch = PrioritySketch::new(config).unwrap();
//! for key in [6, 1, 1, 1, 1, 1, 1, 1, 2, 3, 4, 5] {
//!     sketch.update(key, key as f64);
//! }
//! let samples = sketch.samples();
//! assert!(samples.unique_keys);
//! assert_eq!(samples.len(), 3);
//! let position = samples.keys.iter().position(|&k| k == 1).unwrap();
//! assert_eq!(samples.values[position], 7.0);
//! ```
//!
//! # References
//!
//! - Duffield, Lund and Thorup (2007). "Priority sampling for estimation of arbitrary subset
//!   sums"

mod sketch;

pub use self::sketch::DEFAULT_MAX_SIZE;
pub use self::sketch::PrioritySketch;
pub use self::sketch::PrioritySketchConfig;
pub use self::sketch::PriorityWeight;
