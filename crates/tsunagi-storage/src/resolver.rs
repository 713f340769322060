// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution: map a platform handle (plus optional identifier
//! hints) to a durable customer, creating or merging as needed.
//!
//! The whole algorithm runs inside a single transaction on the writer
//! thread: lookup by handle (archived customers included), cross-channel
//! match on hinted identifiers, create-or-restore, then idempotent
//! identifier binding. On any error the transaction rolls back and the
//! caller observes no partial creation. The UNIQUE (kind, value) constraint
//! on identifiers is the final backstop against duplicate-identity races.

use rusqlite::params;
use tracing::{info, warn};

use tsunagi_core::TsunagiError;
use tsunagi_core::types::{CustomerState, IdentifierKind};

use crate::database::Database;
use crate::models::Customer;
use crate::queries::customers::{CUSTOMER_COLUMNS, row_to_customer};
use crate::queries::{activities, identifiers};

/// Input to identity resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Platform handle of the contact.
    pub handle: String,
    /// Display name from a platform profile fetch, if available.
    pub display_name: Option<String>,
    /// Identifier hints (kind string, value) extracted from profile fields
    /// or carried by the contact; used for cross-channel unification.
    pub hints: Vec<(String, String)>,
}

impl ResolveRequest {
    /// A minimal request: handle only, fixed defaults, no enrichment.
    pub fn new(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            display_name: None,
            hints: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn with_hint(mut self, kind: IdentifierKind, value: &str) -> Self {
        self.hints.push((kind.to_string(), value.to_string()));
        self
    }
}

/// Resolve a handle to a customer, creating or merging inside one atomic
/// transaction.
pub async fn resolve(db: &Database, req: ResolveRequest) -> Result<Customer, TsunagiError> {
    db.connection()
        .call(move |conn| -> Result<Customer, tokio_rusqlite::Error> {
            let tx = conn.transaction()?;
            let customer = resolve_in_tx(&tx, &req)?;
            tx.commit()?;
            Ok(customer)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve with the minimal-creation fallback.
///
/// An inbound message must never be dropped purely because enrichment
/// (profile fetch, phone-pattern extraction) produced a request the full
/// path cannot satisfy; when the full resolution fails, a second attempt
/// runs with fixed defaults and no hints.
pub async fn resolve_with_fallback(
    db: &Database,
    req: ResolveRequest,
) -> Result<Customer, TsunagiError> {
    let handle = req.handle.clone();
    match resolve(db, req).await {
        Ok(customer) => Ok(customer),
        Err(e) => {
            warn!(
                handle = handle.as_str(),
                error = %e,
                "full identity resolution failed, attempting minimal creation"
            );
            resolve(db, ResolveRequest::new(&handle))
                .await
                .map_err(|e| TsunagiError::Resolution(format!("minimal path failed: {e}")))
        }
    }
}

fn resolve_in_tx(
    tx: &rusqlite::Transaction<'_>,
    req: &ResolveRequest,
) -> Result<Customer, tokio_rusqlite::Error> {
    let line_kind = IdentifierKind::Line.to_string();

    // Step 1: lookup by handle, archived customers included.
    let mut customer_id = identifiers::find_customer_id_in_tx(tx, &line_kind, &req.handle)?;

    // Step 2: cross-channel match on hinted identifiers of other kinds.
    // A person who first arrived via a web form and later messages via the
    // platform must land on the same customer.
    if customer_id.is_none() {
        for (kind, value) in &req.hints {
            if *kind == line_kind {
                continue;
            }
            if let Some(matched) = identifiers::find_customer_id_in_tx(tx, kind, value)? {
                activities::record_in_tx(
                    tx,
                    matched,
                    "channels_unified",
                    Some(&serde_json::json!({
                        "attached_handle": req.handle,
                        "matched_kind": kind,
                        "matched_value": value,
                    })),
                )?;
                info!(
                    handle = req.handle.as_str(),
                    customer_id = matched,
                    matched_kind = kind.as_str(),
                    "channels unified"
                );
                customer_id = Some(matched);
                break;
            }
        }
    }

    // Step 3: create when nothing matched.
    let customer_id = match customer_id {
        Some(id) => id,
        None => {
            let display_name = req
                .display_name
                .clone()
                .unwrap_or_else(|| placeholder_name(&req.handle));
            tx.execute(
                "INSERT INTO customers (display_name, channel) VALUES (?1, 'line')",
                params![display_name],
            )?;
            let id = tx.last_insert_rowid();
            activities::record_in_tx(
                tx,
                id,
                "created",
                Some(&serde_json::json!({ "handle": req.handle })),
            )?;
            id
        }
    };

    // Step 4: restore an archived match. Restoration is a state transition.
    let state: String = tx.query_row(
        "SELECT state FROM customers WHERE id = ?1",
        params![customer_id],
        |row| row.get(0),
    )?;
    if state == CustomerState::Archived.to_string() {
        tx.execute(
            "UPDATE customers SET state = 'active',
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1",
            params![customer_id],
        )?;
        activities::record_in_tx(
            tx,
            customer_id,
            "restored",
            Some(&serde_json::json!({ "handle": req.handle })),
        )?;
    }

    // Step 5: idempotently bind the handle and every hint. Ownership of an
    // already-bound pair never moves.
    identifiers::ensure_in_tx(tx, &line_kind, &req.handle, customer_id)?;
    for (kind, value) in &req.hints {
        identifiers::ensure_in_tx(tx, kind, value, customer_id)?;
    }

    let customer = tx.query_row(
        &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
        params![customer_id],
        row_to_customer,
    )?;
    Ok(customer)
}

/// Placeholder display name for a customer created without a profile hint.
fn placeholder_name(handle: &str) -> String {
    let short: String = handle.chars().take(8).collect();
    format!("LINE user {short}")
}
