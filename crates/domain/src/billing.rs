// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// The legal entity an invoice was issued under.
///
/// The invoicing provider addresses its ledger per company, so every storno
/// or collection needs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCompany {
    /// The company identifier.
    pub company_id: String,
    /// The registered name.
    pub name: String,
    /// The tax registration code the provider keys its ledger on.
    pub vat_code: String,
}

/// Resolves the billing entity for an invoice.
///
/// Precedence:
/// 1. the company recorded directly on the invoice
/// 2. the company of the store the invoice's order was placed in
///
/// Returns `None` when neither is known; callers must refuse the operation.
#[must_use]
pub fn resolve_billing_company(
    invoice_company: Option<BillingCompany>,
    order_store_company: Option<BillingCompany>,
) -> Option<BillingCompany> {
    invoice_company.or(order_store_company)
}
