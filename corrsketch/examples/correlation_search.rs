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

//! Indexes a corpus of synthetic columns and searches it for columns correlated with a query.
//!
//! Run with `RUST_LOG=corrsketch=debug` to see the index at work.

use std::error::Error;

use corrsketch::index::SketchIndex;
use corrsketch::pairwise::all_pairs;
use corrsketch::sketch::CorrelationSketch;
use corrsketch::sketch::ImmutableSketch;
use corrsketch::synopsis::Kmv;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ROWS: usize = 20_000;
const COLUMNS: usize = 12;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut rng = StdRng::seed_from_u64(7);
    let base: Vec<f64> = (0..ROWS).map(|_| rng.random_range(0.0..100.0)).collect();

    // column i follows the base column with a strength that fades with i and covers a shrinking
    // share of its keys
    let mut corpus = Vec::with_capacity(COLUMNS);
    for column in 0..COLUMNS {
        let strength = 1.0 - column as f64 / COLUMNS as f64;
        let coverage = ROWS - column * ROWS / (2 * COLUMNS);
        let mut sketch = CorrelationSketch::new(Kmv::builder().k(512).build()?);
        for (row, &x) in base.iter().enumerate().take(coverage) {
            let noise = rng.random_range(0.0..100.0);
            sketch.update(&format!("row-{row}"), strength * x + (1.0 - strength) * noise);
        }
        corpus.push((format!("column-{column:02}"), sketch.freeze()));
    }

    let index = SketchIndex::new();
    for (id, sketch) in &corpus {
        index.index(id, sketch)?;
    }

    let mut query = CorrelationSketch::new(Kmv::builder().k(512).build()?);
    for (row, &x) in base.iter().enumerate() {
        query.update(&format!("row-{row}"), x);
    }
    let query: ImmutableSketch = query.freeze();

    println!("top matches for the base column:");
    for hit in index.search(&query, 5)? {
        println!(
            "  {:<10} r = {:>6.3}  overlap = {:>4}  n = {}",
            hit.id, hit.estimate.coefficient, hit.overlap, hit.estimate.sample_size
        );
    }

    let strongest = all_pairs(&corpus)
        .into_iter()
        .filter_map(|pair| Some((pair.left, pair.right, pair.estimate.ok()?.coefficient)))
        .max_by(|a, b| a.2.total_cmp(&b.2));
    if let Some((left, right, r)) = strongest {
        println!("most correlated pair in the corpus: {left} ~ {right} (r = {r:.3})");
    }

    index.close();
    Ok(())
}
