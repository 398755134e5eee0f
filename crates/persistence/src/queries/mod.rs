// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side queries.
//!
//! Every query here uses the Diesel DSL. Row structs stay private to the
//! module that loads them; callers receive the types from `data_models`.

pub mod audit;
pub mod invoices;
pub mod manifests;
pub mod pin;
pub mod returns;
