// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side mutations.
//!
//! Multi-statement writes run inside `immediate_transaction` so the write
//! lock is taken before the first read that decides what to write.

pub mod audit;
pub mod invoices;
pub mod manifests;
pub mod pin;
pub mod seed;
