#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{Entry, ExpenseCategory, IncomeCategory, TransactionRow};
use crate::remote::{SqliteRemote, ALREADY_REGISTERED, INVALID_CREDENTIALS};
use crate::storage::{KEY_EXPENSES, KEY_SESSION};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::HashMap;

// ── Fake remote ───────────────────────────────────────────────

/// In-memory remote with switchable failures and a call log.
#[derive(Default)]
struct FakeRemote {
    accounts: HashMap<String, String>,
    tokens: HashMap<String, String>,
    rows: Vec<serde_json::Value>,
    calls: Vec<String>,
    fail_writes: bool,
    fail_list: bool,
}

impl FakeRemote {
    fn with_account(email: &str, password: &str) -> Self {
        let mut fake = Self::default();
        fake.accounts.insert(email.into(), password.into());
        fake
    }

    fn session_for(&mut self, email: &str) -> Session {
        let token = format!("tok-{}-{}", email, self.tokens.len());
        self.tokens.insert(token.clone(), email.into());
        Session {
            token,
            email: email.into(),
        }
    }

    fn check(&self, session: &Session) -> Result<(), RemoteError> {
        if self.tokens.contains_key(&session.token) {
            Ok(())
        } else {
            Err(RemoteError::Unauthorized)
        }
    }

    fn write_guard(&self) -> Result<(), RemoteError> {
        if self.fail_writes {
            Err(RemoteError::Unavailable("network unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for FakeRemote {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.calls.push(format!("sign_in:{email}"));
        match self.accounts.get(email) {
            Some(p) if p == password => Ok(self.session_for(email)),
            _ => Err(RemoteError::Auth(INVALID_CREDENTIALS.into())),
        }
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.calls.push(format!("sign_up:{email}"));
        if self.accounts.contains_key(email) {
            return Err(RemoteError::Auth(ALREADY_REGISTERED.into()));
        }
        self.accounts.insert(email.into(), password.into());
        Ok(self.session_for(email))
    }

    fn sign_out(&mut self, session: &Session) -> Result<(), RemoteError> {
        self.calls.push("sign_out".into());
        self.tokens.remove(&session.token);
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>, RemoteError> {
        Ok(self.tokens.get(token).map(|email| Session {
            token: token.into(),
            email: email.clone(),
        }))
    }

    fn update_password(&mut self, session: &Session, new_password: &str) -> Result<(), RemoteError> {
        self.check(session)?;
        self.calls.push("update_password".into());
        self.accounts
            .insert(session.email.clone(), new_password.into());
        Ok(())
    }

    fn list(&self, session: &Session) -> Result<Vec<serde_json::Value>, RemoteError> {
        self.check(session)?;
        if self.fail_list {
            return Err(RemoteError::Unavailable("network unreachable".into()));
        }
        Ok(self.rows.clone())
    }

    fn insert(&mut self, session: &Session, row: &TransactionRow) -> Result<(), RemoteError> {
        self.check(session)?;
        self.calls.push(format!("insert:{}", row.id));
        self.write_guard()?;
        self.rows.insert(0, serde_json::to_value(row).unwrap());
        Ok(())
    }

    fn update(&mut self, session: &Session, id: &str, row: &TransactionRow) -> Result<(), RemoteError> {
        self.check(session)?;
        self.calls.push(format!("update:{id}"));
        self.write_guard()?;
        for value in &mut self.rows {
            if value["id"] == id {
                *value = serde_json::to_value(row).unwrap();
            }
        }
        Ok(())
    }

    fn delete(&mut self, session: &Session, id: &str) -> Result<(), RemoteError> {
        self.check(session)?;
        self.calls.push(format!("delete:{id}"));
        self.write_guard()?;
        self.rows.retain(|value| value["id"] != id);
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────

const USER: &str = "saver01";
const EMAIL: &str = "saver01@financepro.local";
const PASS: &str = "secret1";

fn txn(title: &str, amount: rust_decimal::Decimal, entry: Entry, date: &str) -> Transaction {
    Transaction::new(
        title.into(),
        amount,
        entry,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
    )
}

fn coffee() -> Transaction {
    txn("Coffee", dec!(4.5), Entry::Expense(ExpenseCategory::Food), "2024-03-02")
}

fn rent() -> Transaction {
    txn("Rent", dec!(900), Entry::Expense(ExpenseCategory::Bills), "2024-03-01")
}

fn salary() -> Transaction {
    txn("Salary", dec!(3000), Entry::Income(IncomeCategory::Salary), "2024-02-28")
}

fn local_tracker(remote: FakeRemote) -> Tracker<FakeRemote> {
    Tracker::open(LocalStore::open_in_memory().unwrap(), remote)
}

fn titles(tracker: &Tracker<FakeRemote>) -> Vec<String> {
    tracker
        .transactions()
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

fn local_titles(tracker: &Tracker<FakeRemote>) -> Vec<String> {
    tracker
        .local()
        .load_transactions()
        .into_iter()
        .map(|t| t.title)
        .collect()
}

// ── Unreachable cloud store ───────────────────────────────────

#[test]
fn test_starts_local_when_cloud_store_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let remote = SqliteRemote::open(&dir.path().join("share").join("cloud.db"), 4);
    let local = LocalStore::open_in_memory().unwrap();
    local.save_transactions(&[rent()]);
    local.save(KEY_SESSION, "tok-from-last-run");

    let mut tracker = Tracker::open(local, remote);
    assert!(!tracker.is_cloud());
    assert_eq!(tracker.transactions().len(), 1);

    tracker.create(coffee());
    assert_eq!(tracker.local().load_transactions().len(), 2);

    let err = tracker.sign_in(USER, PASS).unwrap_err();
    assert!(matches!(err, TrackerError::Remote(RemoteError::Unavailable(_))));
    assert!(!tracker.is_cloud());
}

// ── Local mode ────────────────────────────────────────────────

#[test]
fn test_fresh_tracker_defaults() {
    let tracker = local_tracker(FakeRemote::default());
    assert!(tracker.transactions().is_empty());
    assert_eq!(tracker.budget_limit(), dec!(2000));
    assert_eq!(tracker.theme(), Theme::Light);
    assert_eq!(tracker.mode(), &Mode::Local);
    assert!(tracker.username().is_none());
}

#[test]
fn test_create_prepends_and_persists_locally() {
    let mut tracker = local_tracker(FakeRemote::default());
    tracker.create(rent());
    tracker.create(coffee());
    assert_eq!(titles(&tracker), vec!["Coffee", "Rent"]);
    assert_eq!(local_titles(&tracker), vec!["Coffee", "Rent"]);
    assert!(tracker.remote().calls.is_empty());
}

#[test]
fn test_update_keeps_id_and_position() {
    let mut tracker = local_tracker(FakeRemote::default());
    tracker.create(rent());
    let original = coffee();
    tracker.create(original.clone());

    let mut edited = original.clone();
    edited.title = "Espresso".into();
    edited.amount = dec!(3);
    tracker.update(edited).unwrap();

    assert_eq!(titles(&tracker), vec!["Espresso", "Rent"]);
    assert_eq!(tracker.transactions()[0].id, original.id);
    assert_eq!(local_titles(&tracker), vec!["Espresso", "Rent"]);
}

#[test]
fn test_update_unknown_id() {
    let mut tracker = local_tracker(FakeRemote::default());
    let err = tracker.update(coffee()).unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn test_delete() {
    let mut tracker = local_tracker(FakeRemote::default());
    let c = coffee();
    tracker.create(rent());
    tracker.create(c.clone());

    let removed = tracker.delete(&c.id).unwrap();
    assert_eq!(removed.title, "Coffee");
    assert_eq!(titles(&tracker), vec!["Rent"]);
    assert_eq!(local_titles(&tracker), vec!["Rent"]);
    assert!(matches!(
        tracker.delete(&c.id),
        Err(TrackerError::NotFound(_))
    ));
}

#[test]
fn test_replace_all_in_local_mode_writes_through() {
    let mut tracker = local_tracker(FakeRemote::default());
    tracker.create(coffee());
    tracker.replace_all(vec![rent(), salary()]);
    assert_eq!(local_titles(&tracker), vec!["Rent", "Salary"]);
}

#[test]
fn test_revision_bumps_on_every_change() {
    let mut tracker = local_tracker(FakeRemote::default());
    let start = tracker.revision();
    let c = coffee();
    tracker.create(c.clone());
    tracker.update(c.clone()).unwrap();
    tracker.delete(&c.id).unwrap();
    tracker.set_budget(dec!(100));
    assert_eq!(tracker.revision(), start + 4);
}

#[test]
fn test_open_loads_existing_local_state() {
    let local = LocalStore::open_in_memory().unwrap();
    local.save_transactions(&[rent()]);
    local.save_budget(dec!(1234));
    local.save(KEY_THEME, &Theme::Dark);

    let tracker = Tracker::open(local, FakeRemote::default());
    assert_eq!(titles(&tracker), vec!["Rent"]);
    assert_eq!(tracker.budget_limit(), dec!(1234));
    assert_eq!(tracker.theme(), Theme::Dark);
}

// ── Local -> Cloud ────────────────────────────────────────────

#[test]
fn test_sign_in_replaces_local_list_with_remote() {
    let mut remote = FakeRemote::with_account(EMAIL, PASS);
    remote.rows = vec![serde_json::to_value(salary().to_row()).unwrap()];
    let mut tracker = local_tracker(remote);
    tracker.create(coffee());
    tracker.create(rent());

    tracker.sign_in(USER, PASS).unwrap();

    assert!(tracker.is_cloud());
    assert_eq!(tracker.username(), Some("saver01"));
    assert_eq!(titles(&tracker), vec!["Salary"]);
    // Local edits are not pushed to the remote store.
    assert_eq!(tracker.remote().rows.len(), 1);
    // Nor is local storage touched.
    assert_eq!(local_titles(&tracker), vec!["Rent", "Coffee"]);
}

#[test]
fn test_sign_up_starts_with_empty_remote_list() {
    let mut tracker = local_tracker(FakeRemote::default());
    tracker.create(coffee());
    tracker.sign_up(USER, PASS).unwrap();
    assert!(tracker.is_cloud());
    assert!(tracker.transactions().is_empty());
}

#[test]
fn test_sign_in_persists_session_token() {
    let mut tracker = local_tracker(FakeRemote::with_account(EMAIL, PASS));
    tracker.sign_in(USER, PASS).unwrap();
    let token: Option<String> = tracker.local().load(KEY_SESSION, None);
    assert_eq!(token.as_deref(), tracker.session().map(|s| s.token.as_str()));
}

#[test]
fn test_invalid_credentials_make_no_remote_call() {
    let mut tracker = local_tracker(FakeRemote::with_account(EMAIL, PASS));
    let err = tracker.sign_in("short", PASS).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(ValidationError::UsernameTooShort)
    ));
    assert!(tracker.remote().calls.is_empty());
    assert!(!tracker.is_cloud());
}

#[test]
fn test_auth_errors_are_remapped() {
    let mut tracker = local_tracker(FakeRemote::with_account(EMAIL, PASS));
    let err = tracker.sign_in(USER, "wrong-pass").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect username or password. Please try again."
    );

    let err = tracker.sign_up(USER, "another1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "This username is already taken. Please choose another."
    );
    assert!(!tracker.is_cloud());
}

#[test]
fn test_fetch_failure_keeps_list_and_records_issue() {
    let mut remote = FakeRemote::with_account(EMAIL, PASS);
    remote.fail_list = true;
    let mut tracker = local_tracker(remote);
    tracker.create(coffee());

    tracker.sign_in(USER, PASS).unwrap();

    assert!(tracker.is_cloud());
    assert_eq!(titles(&tracker), vec!["Coffee"]);
    assert_eq!(tracker.issues().len(), 1);
    assert_eq!(tracker.issues()[0].op, SyncOp::Fetch);
}

#[test]
fn test_malformed_remote_rows_are_skipped() {
    let mut remote = FakeRemote::with_account(EMAIL, PASS);
    remote.rows = vec![
        serde_json::to_value(rent().to_row()).unwrap(),
        serde_json::json!({"id": "x", "title": "Bad", "amount": -5, "type": "expense",
                           "category": "Food", "date": "2024-01-01"}),
        serde_json::json!({"id": "y", "title": "Worse"}),
    ];
    let mut tracker = local_tracker(remote);
    tracker.sign_in(USER, PASS).unwrap();
    assert_eq!(titles(&tracker), vec!["Rent"]);
}

// ── Cloud mode ────────────────────────────────────────────────

fn cloud_tracker() -> Tracker<FakeRemote> {
    let mut tracker = local_tracker(FakeRemote::with_account(EMAIL, PASS));
    tracker.create(rent());
    tracker.sign_in(USER, PASS).unwrap();
    tracker
}

#[test]
fn test_cloud_mutations_mirror_and_skip_local_storage() {
    let mut tracker = cloud_tracker();
    let c = coffee();
    tracker.create(c.clone());

    let mut edited = c.clone();
    edited.title = "Latte".into();
    tracker.update(edited).unwrap();

    assert_eq!(titles(&tracker), vec!["Latte"]);
    assert_eq!(tracker.remote().rows.len(), 1);
    assert_eq!(tracker.remote().rows[0]["title"], "Latte");

    tracker.delete(&c.id).unwrap();
    assert!(tracker.remote().rows.is_empty());

    let calls = &tracker.remote().calls;
    assert!(calls.contains(&format!("insert:{}", c.id)));
    assert!(calls.contains(&format!("update:{}", c.id)));
    assert!(calls.contains(&format!("delete:{}", c.id)));

    // Local storage still holds the pre-sign-in list.
    assert_eq!(local_titles(&tracker), vec!["Rent"]);
    assert!(tracker.issues().is_empty());
}

#[test]
fn test_mirror_failure_is_recorded_without_rollback() {
    let mut tracker = cloud_tracker();
    tracker.remote_mut().fail_writes = true;

    let c = coffee();
    tracker.create(c.clone());

    assert_eq!(titles(&tracker), vec!["Coffee"]);
    assert!(tracker.remote().rows.is_empty());
    let issues = tracker.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].op, SyncOp::Insert);
    assert_eq!(issues[0].id.as_deref(), Some(c.id.as_str()));
    assert!(issues[0].to_string().starts_with("insert "));
}

#[test]
fn test_resync_restores_remote_state_and_clears_issues() {
    let mut tracker = cloud_tracker();
    tracker.remote_mut().fail_writes = true;
    tracker.create(coffee());
    assert_eq!(tracker.issues().len(), 1);

    tracker.remote_mut().fail_writes = false;
    tracker.resync();

    assert!(tracker.transactions().is_empty());
    assert!(tracker.issues().is_empty());
}

#[test]
fn test_replace_all_in_cloud_mode_stays_in_memory() {
    let mut tracker = cloud_tracker();
    tracker.replace_all(vec![salary()]);
    assert_eq!(titles(&tracker), vec!["Salary"]);
    assert_eq!(local_titles(&tracker), vec!["Rent"]);
    assert!(tracker.remote().rows.is_empty());
}

#[test]
fn test_preferences_saved_locally_in_cloud_mode() {
    let mut tracker = cloud_tracker();
    tracker.set_budget(dec!(1500));
    assert_eq!(tracker.toggle_theme(), Theme::Dark);

    assert_eq!(tracker.local().load_budget(dec!(2000)), dec!(1500));
    assert_eq!(tracker.local().load(KEY_THEME, Theme::Light), Theme::Dark);
}

// ── Cloud -> Local ────────────────────────────────────────────

#[test]
fn test_sign_out_reloads_stale_local_list() {
    let mut tracker = cloud_tracker();
    tracker.create(coffee());
    tracker.remote_mut().fail_writes = true;
    tracker.create(salary());

    tracker.sign_out();

    assert_eq!(tracker.mode(), &Mode::Local);
    assert_eq!(titles(&tracker), vec!["Rent"]);
    assert!(tracker.issues().is_empty());
    let token: Option<String> = tracker.local().load(KEY_SESSION, None);
    assert!(token.is_none());
    assert!(tracker.remote().tokens.is_empty());
}

#[test]
fn test_open_restores_persisted_session() {
    let mut remote = FakeRemote::with_account(EMAIL, PASS);
    let session = remote.session_for(EMAIL);
    remote.rows = vec![serde_json::to_value(salary().to_row()).unwrap()];

    let local = LocalStore::open_in_memory().unwrap();
    local.save_transactions(&[rent()]);
    local.save(KEY_SESSION, &session.token);

    let tracker = Tracker::open(local, remote);
    assert_eq!(tracker.session(), Some(&session));
    assert_eq!(titles(&tracker), vec!["Salary"]);
}

#[test]
fn test_open_drops_unknown_session_token() {
    let local = LocalStore::open_in_memory().unwrap();
    local.save_transactions(&[rent()]);
    local.save(KEY_SESSION, "stale-token");

    let tracker = Tracker::open(local, FakeRemote::default());
    assert!(!tracker.is_cloud());
    assert_eq!(titles(&tracker), vec!["Rent"]);
    let token: Option<String> = tracker.local().load(KEY_SESSION, None);
    assert!(token.is_none());
}

#[test]
fn test_raw_expenses_key_untouched_by_cloud_session() {
    let mut tracker = cloud_tracker();
    tracker.create(coffee());
    let raw: Vec<serde_json::Value> = tracker.local().load(KEY_EXPENSES, Vec::new());
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["title"], "Rent");
}

// ── Password change ───────────────────────────────────────────

#[test]
fn test_change_password_requires_session() {
    let mut tracker = local_tracker(FakeRemote::default());
    let err = tracker
        .change_password(PASS, "newpass1", "newpass1")
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotSignedIn));
}

#[test]
fn test_change_password_checks_current() {
    let mut tracker = cloud_tracker();
    let err = tracker
        .change_password("not-it", "newpass1", "newpass1")
        .unwrap_err();
    assert_eq!(err.to_string(), "Current password is incorrect");
    assert_eq!(tracker.remote().accounts[EMAIL], PASS);
}

#[test]
fn test_change_password_validates_before_remote() {
    let mut tracker = cloud_tracker();
    let calls_before = tracker.remote().calls.len();
    let err = tracker
        .change_password(PASS, "newpass1", "newpass2")
        .unwrap_err();
    assert_eq!(err.to_string(), "New passwords do not match");
    assert_eq!(tracker.remote().calls.len(), calls_before);
}

#[test]
fn test_change_password_success_keeps_session() {
    let mut tracker = cloud_tracker();
    let session = tracker.session().cloned().unwrap();
    tracker
        .change_password(PASS, "newpass1", "newpass1")
        .unwrap();
    assert_eq!(tracker.remote().accounts[EMAIL], "newpass1");
    assert_eq!(tracker.session(), Some(&session));
    assert!(tracker.remote().tokens.contains_key(&session.token));
}
