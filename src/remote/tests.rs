#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{parse_row_values, Entry, ExpenseCategory, IncomeCategory, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TEST_COST: u32 = 4;

fn store() -> SqliteRemote {
    SqliteRemote::open_in_memory(TEST_COST).unwrap()
}

fn row(title: &str, amount: Decimal, entry: Entry, date: &str) -> TransactionRow {
    Transaction::new(
        title.into(),
        amount,
        entry,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
    )
    .to_row()
}

fn auth_message(err: RemoteError) -> String {
    match err {
        RemoteError::Auth(msg) => msg,
        other => panic!("expected auth error, got {other:?}"),
    }
}

// ── Accounts ──────────────────────────────────────────────────

#[test]
fn test_sign_up_then_sign_in() {
    let mut remote = store();
    let first = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let second = remote.sign_in("saver1@financepro.local", "secret1").unwrap();
    assert_eq!(second.email, "saver1@financepro.local");
    assert_ne!(first.token, second.token);
}

#[test]
fn test_duplicate_sign_up_rejected() {
    let mut remote = store();
    remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let err = remote
        .sign_up("saver1@financepro.local", "other-pass")
        .unwrap_err();
    assert_eq!(auth_message(err), ALREADY_REGISTERED);
}

#[test]
fn test_wrong_password_rejected() {
    let mut remote = store();
    remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let err = remote
        .sign_in("saver1@financepro.local", "wrong-pass")
        .unwrap_err();
    assert_eq!(auth_message(err), INVALID_CREDENTIALS);
}

#[test]
fn test_unknown_user_rejected() {
    let mut remote = store();
    let err = remote.sign_in("ghost@financepro.local", "secret1").unwrap_err();
    assert_eq!(auth_message(err), INVALID_CREDENTIALS);
}

#[test]
fn test_get_session_and_sign_out() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    assert_eq!(remote.get_session(&session.token).unwrap(), Some(session.clone()));

    remote.sign_out(&session).unwrap();
    assert_eq!(remote.get_session(&session.token).unwrap(), None);
    assert!(matches!(
        remote.list(&session),
        Err(RemoteError::Unauthorized)
    ));
}

#[test]
fn test_update_password() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    remote.update_password(&session, "better-secret").unwrap();

    assert!(remote.sign_in("saver1@financepro.local", "secret1").is_err());
    assert!(remote
        .sign_in("saver1@financepro.local", "better-secret")
        .is_ok());
}

// ── Rows ──────────────────────────────────────────────────────

#[test]
fn test_list_is_date_descending() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    for (title, date) in [("Jan", "2024-01-10"), ("Mar", "2024-03-02"), ("Feb", "2024-02-14")] {
        let r = row(title, dec!(10), Entry::Expense(ExpenseCategory::Food), date);
        remote.insert(&session, &r).unwrap();
    }
    let txns = parse_row_values(remote.list(&session).unwrap(), "test");
    let titles: Vec<&str> = txns.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Mar", "Feb", "Jan"]);
}

#[test]
fn test_rows_roundtrip_through_validation() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let r = row("Invoice", dec!(1250.75), Entry::Income(IncomeCategory::Freelance), "2024-05-01");
    remote.insert(&session, &r).unwrap();

    let values = remote.list(&session).unwrap();
    assert_eq!(values[0]["amount"], serde_json::json!(1250.75));
    assert_eq!(values[0]["type"], "income");

    let txns = parse_row_values(values, "test");
    assert_eq!(txns[0].to_row(), r);
}

#[test]
fn test_rows_are_scoped_to_user() {
    let mut remote = store();
    let alice = remote.sign_up("alice1@financepro.local", "secret1").unwrap();
    let bobby = remote.sign_up("bobby1@financepro.local", "secret1").unwrap();

    let r = row("Rent", dec!(900), Entry::Expense(ExpenseCategory::Bills), "2024-02-01");
    remote.insert(&alice, &r).unwrap();

    assert_eq!(remote.list(&alice).unwrap().len(), 1);
    assert!(remote.list(&bobby).unwrap().is_empty());

    // Bobby cannot touch Alice's row.
    assert!(matches!(
        remote.update(&bobby, &r.id, &r),
        Err(RemoteError::NotFound(_))
    ));
    remote.delete(&bobby, &r.id).unwrap();
    assert_eq!(remote.list(&alice).unwrap().len(), 1);
}

#[test]
fn test_update_and_delete() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let mut r = row("Coffe", dec!(3), Entry::Expense(ExpenseCategory::Food), "2024-02-01");
    remote.insert(&session, &r).unwrap();

    r.title = "Coffee".into();
    r.amount = dec!(3.5);
    remote.update(&session, &r.id.clone(), &r).unwrap();
    let txns = parse_row_values(remote.list(&session).unwrap(), "test");
    assert_eq!(txns[0].title, "Coffee");
    assert_eq!(txns[0].amount, dec!(3.5));

    remote.delete(&session, &r.id).unwrap();
    assert!(remote.list(&session).unwrap().is_empty());
    // Deleting again is fine.
    remote.delete(&session, &r.id).unwrap();
}

#[test]
fn test_duplicate_insert_is_an_error() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let r = row("Bus", dec!(2), Entry::Expense(ExpenseCategory::Transport), "2024-02-01");
    remote.insert(&session, &r).unwrap();
    assert!(matches!(
        remote.insert(&session, &r),
        Err(RemoteError::Storage(_))
    ));
}

#[test]
fn test_unknown_token_is_unauthorized() {
    let mut remote = store();
    let fake = Session {
        token: "not-a-token".into(),
        email: "nobody@financepro.local".into(),
    };
    let r = row("Bus", dec!(2), Entry::Expense(ExpenseCategory::Transport), "2024-02-01");
    assert!(matches!(
        remote.insert(&fake, &r),
        Err(RemoteError::Unauthorized)
    ));
}

#[test]
fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.db");
    let token = {
        let mut remote = SqliteRemote::open(&path, TEST_COST);
        let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
        let r = row("Salary", dec!(3000), Entry::Income(IncomeCategory::Salary), "2024-01-31");
        remote.insert(&session, &r).unwrap();
        session.token
    };
    let remote = SqliteRemote::open(&path, TEST_COST);
    let session = remote.get_session(&token).unwrap().unwrap();
    assert_eq!(remote.list(&session).unwrap().len(), 1);
}

#[test]
fn test_amounts_keep_every_digit() {
    let mut remote = store();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    let r = row(
        "Windfall",
        dec!(12345678901234.5678),
        Entry::Income(IncomeCategory::Other),
        "2024-06-01",
    );
    remote.insert(&session, &r).unwrap();

    let txns = parse_row_values(remote.list(&session).unwrap(), "test");
    assert_eq!(txns[0].amount, dec!(12345678901234.5678));
}

// ── Unreachable store ─────────────────────────────────────────

#[test]
fn test_unreachable_file_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("share").join("cloud.db");
    let mut remote = SqliteRemote::open(&path, TEST_COST);
    assert!(!remote.is_available());

    assert!(matches!(
        remote.get_session("tok"),
        Err(RemoteError::Unavailable(_))
    ));
    assert!(matches!(
        remote.sign_in("saver1@financepro.local", "secret1"),
        Err(RemoteError::Unavailable(_))
    ));
}

#[test]
fn test_sign_up_retries_once_the_drive_appears() {
    let dir = tempfile::tempdir().unwrap();
    let share = dir.path().join("share");
    let mut remote = SqliteRemote::open(&share.join("cloud.db"), TEST_COST);
    assert!(!remote.is_available());

    std::fs::create_dir(&share).unwrap();
    let session = remote.sign_up("saver1@financepro.local", "secret1").unwrap();
    assert!(remote.is_available());
    assert!(remote.list(&session).unwrap().is_empty());
}
