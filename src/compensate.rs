// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compensating rollback for identity-coupled writes.
//!
//! Onboarding creates a provider account first and a directory record
//! second. When the second step fails, the provider account must be
//! removed again or it becomes an orphan that blocks the email forever.
//! The undo is best-effort: if it also fails, the original error is still
//! what the caller sees, and the orphan is logged for manual cleanup.

use std::future::Future;

use crate::identity::IdentityError;

/// Run `local` and, on failure, run `undo` before returning the original
/// error. An undo failure is logged and swallowed; it never masks or
/// replaces the local error.
pub async fn with_compensation<T, E, F, U, UF>(local: F, undo: U) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    U: FnOnce() -> UF,
    UF: Future<Output = Result<(), IdentityError>>,
{
    match local.await {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Err(undo_err) = undo().await {
                tracing::warn!(error = %undo_err, "compensating rollback failed, provider account orphaned");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn success_skips_undo() {
        let undone = AtomicBool::new(false);
        let result: Result<u32, &str> = with_compensation(async { Ok(7) }, || async {
            undone.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(!undone.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failure_runs_undo_and_keeps_original_error() {
        let undone = AtomicBool::new(false);
        let result: Result<u32, &str> =
            with_compensation(async { Err("local failed") }, || async {
                undone.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert_eq!(result.unwrap_err(), "local failed");
        assert!(undone.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn undo_failure_never_masks_the_local_error() {
        let result: Result<u32, &str> =
            with_compensation(async { Err("local failed") }, || async {
                Err(IdentityError::Unavailable("provider down".to_string()))
            })
            .await;
        assert_eq!(result.unwrap_err(), "local failed");
    }
}
