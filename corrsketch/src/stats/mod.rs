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

//! Numerical support for the correlation estimators.
//!
//! Significance tests need `ln Γ` at integer and half-integer arguments only (Student's t with an
//! integer number of degrees of freedom), which reduces to log-factorials. Those are memoized in a
//! [`LogFactorialCache`] owned by the estimator that uses it rather than in global state.

mod distribution;
mod log_factorial;
mod rank;

pub use self::distribution::inverse_normal_cdf;
pub use self::distribution::regularized_incomplete_beta;
pub use self::distribution::student_t_two_tailed;
pub use self::log_factorial::LogFactorialCache;
pub use self::rank::mean_ranks;
