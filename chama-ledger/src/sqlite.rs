use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use uuid::Uuid;

use chama_core::{
    GroupId, GroupLoan, GroupLoanStatus, LoanId, MeetingTotals, MemberId, MemberLoan,
    MemberLoanStatus, Submission, SubmissionId, SubmissionStatus,
};

use crate::{LedgerRecord, LedgerStore, RecordKind, StoreError, StoreResult};

const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS members (
    member_id TEXT PRIMARY KEY,
    savings_balance TEXT NOT NULL DEFAULT '0'
);
CREATE TABLE IF NOT EXISTS lending_groups (
    group_id TEXT PRIMARY KEY,
    savings_balance TEXT NOT NULL DEFAULT '0',
    social_fund_balance TEXT NOT NULL DEFAULT '0'
);
CREATE TABLE IF NOT EXISTS member_loans (
    loan_id TEXT PRIMARY KEY,
    member_id TEXT NOT NULL,
    principal TEXT NOT NULL,
    remaining_balance TEXT NOT NULL,
    weeks_due INTEGER NOT NULL,
    weeks_paid INTEGER NOT NULL,
    status TEXT NOT NULL,
    days_overdue INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS member_loans_idx_member ON member_loans(member_id);
CREATE TABLE IF NOT EXISTS group_loans (
    loan_id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    principal TEXT NOT NULL,
    outstanding_balance TEXT NOT NULL,
    status TEXT NOT NULL,
    approved_on TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS group_loans_idx_group ON group_loans(group_id, approved_on);
CREATE TABLE IF NOT EXISTS submissions (
    submission_id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    meeting_date TEXT NOT NULL,
    facilitator_id TEXT NOT NULL,
    totals TEXT NOT NULL,
    status TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE (group_id, meeting_date)
);
CREATE TABLE IF NOT EXISTS ledger_records (
    record_key TEXT PRIMARY KEY,
    record_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    group_id TEXT NOT NULL,
    member_id TEXT,
    loan_id TEXT,
    amount TEXT NOT NULL,
    meeting_date TEXT NOT NULL,
    submission_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    detail TEXT
);
CREATE INDEX IF NOT EXISTS ledger_records_idx_submission ON ledger_records(submission_id);
"#;

/// SQLite-backed ledger store used by the live runtime.
///
/// Monetary columns hold exact decimal text, never floats. Every balance
/// change runs inside an immediate transaction, which is what makes each
/// increment atomic under concurrent submissions.
#[derive(Clone, Debug)]
pub struct SqliteLedgerStore {
    path: PathBuf,
}

impl SqliteLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { path: path.into() };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(LEDGER_SCHEMA)?;
        Ok(())
    }

    fn connect(&self) -> StoreResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        Ok(conn)
    }

    /// Seed or replace a member loan snapshot.
    pub fn put_member_loan(&self, loan: &MemberLoan) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO member_loans (
                loan_id, member_id, principal, remaining_balance,
                weeks_due, weeks_paid, status, days_overdue
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                loan.id.to_string(),
                loan.member.to_string(),
                loan.principal.to_string(),
                loan.remaining_balance.to_string(),
                loan.weeks_due,
                loan.weeks_paid,
                loan.status.as_str(),
                loan.days_overdue,
            ],
        )?;
        Ok(())
    }

    /// Seed or replace a group loan snapshot.
    pub fn put_group_loan(&self, loan: &GroupLoan) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO group_loans (
                loan_id, group_id, principal, outstanding_balance, status, approved_on
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                loan.id.to_string(),
                loan.group.to_string(),
                loan.principal.to_string(),
                loan.outstanding_balance.to_string(),
                loan.status.as_str(),
                loan.approved_on.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn member_savings(&self, member: MemberId) -> StoreResult<Decimal> {
        let conn = self.connect()?;
        let balance: Option<String> = conn
            .query_row(
                "SELECT savings_balance FROM members WHERE member_id = ?1",
                params![member.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        balance.map_or(Ok(Decimal::ZERO), |text| parse_decimal(&text))
    }

    pub fn group_savings(&self, group: GroupId) -> StoreResult<Decimal> {
        self.group_balance(group, "savings_balance")
    }

    pub fn group_social_fund(&self, group: GroupId) -> StoreResult<Decimal> {
        self.group_balance(group, "social_fund_balance")
    }

    pub fn group_loan(&self, loan: LoanId) -> StoreResult<Option<GroupLoan>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT loan_id, group_id, principal, outstanding_balance, status, approved_on
             FROM group_loans WHERE loan_id = ?1",
            params![loan.to_string()],
            row_to_group_loan,
        )
        .optional()?
        .transpose()
    }

    fn group_balance(&self, group: GroupId, column: &str) -> StoreResult<Decimal> {
        let conn = self.connect()?;
        let sql = format!("SELECT {column} FROM lending_groups WHERE group_id = ?1");
        let balance: Option<String> = conn
            .query_row(&sql, params![group.to_string()], |row| row.get(0))
            .optional()?;
        balance.map_or(Ok(Decimal::ZERO), |text| parse_decimal(&text))
    }

    fn adjust_balance(
        &self,
        ensure_sql: &str,
        select_sql: &str,
        update_sql: &str,
        key: &str,
        delta: Decimal,
    ) -> StoreResult<Decimal> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(ensure_sql, params![key])?;
        let current: String = tx.query_row(select_sql, params![key], |row| row.get(0))?;
        let updated = parse_decimal(&current)? + delta;
        tx.execute(update_sql, params![updated.to_string(), key])?;
        tx.commit()?;
        Ok(updated)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn member_loan(&self, member: MemberId) -> StoreResult<Option<MemberLoan>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT loan_id, member_id, principal, remaining_balance,
                    weeks_due, weeks_paid, status, days_overdue
             FROM member_loans
             WHERE member_id = ?1 AND status IN ('active', 'overdue')
             ORDER BY loan_id LIMIT 1",
            params![member.to_string()],
            row_to_member_loan,
        )
        .optional()?
        .transpose()
    }

    fn outstanding_group_loans(&self, group: GroupId) -> StoreResult<Vec<GroupLoan>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT loan_id, group_id, principal, outstanding_balance, status, approved_on
             FROM group_loans
             WHERE group_id = ?1
             ORDER BY approved_on ASC, loan_id ASC",
        )?;
        let mut rows = stmt.query(params![group.to_string()])?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            let loan = row_to_group_loan(row)??;
            if loan.is_outstanding() {
                loans.push(loan);
            }
        }
        Ok(loans)
    }

    fn find_submission(&self, group: GroupId, date: NaiveDate) -> StoreResult<Option<Submission>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT submission_id, group_id, meeting_date, facilitator_id, totals, status, recorded_at
             FROM submissions WHERE group_id = ?1 AND meeting_date = ?2",
            params![group.to_string(), date.to_string()],
            row_to_submission,
        )
        .optional()?
        .transpose()
    }

    fn insert_submission(&self, submission: &Submission) -> StoreResult<()> {
        let conn = self.connect()?;
        let totals = serde_json::to_string(&submission.totals)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let result = conn.execute(
            "INSERT INTO submissions (
                submission_id, group_id, meeting_date, facilitator_id, totals, status, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                submission.id.to_string(),
                submission.group.to_string(),
                submission.date.to_string(),
                submission.facilitator.to_string(),
                totals,
                submission.status.as_str(),
                submission.recorded_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(format!(
                    "submission for group {} on {}",
                    submission.group, submission.date
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn set_submission_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> StoreResult<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE submissions SET status = ?1 WHERE submission_id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::Missing(format!("submission {id}")));
        }
        Ok(())
    }

    fn credit_member_savings(&self, member: MemberId, delta: Decimal) -> StoreResult<Decimal> {
        self.adjust_balance(
            "INSERT OR IGNORE INTO members (member_id) VALUES (?1)",
            "SELECT savings_balance FROM members WHERE member_id = ?1",
            "UPDATE members SET savings_balance = ?1 WHERE member_id = ?2",
            &member.to_string(),
            delta,
        )
    }

    fn credit_group_savings(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal> {
        self.adjust_balance(
            "INSERT OR IGNORE INTO lending_groups (group_id) VALUES (?1)",
            "SELECT savings_balance FROM lending_groups WHERE group_id = ?1",
            "UPDATE lending_groups SET savings_balance = ?1 WHERE group_id = ?2",
            &group.to_string(),
            delta,
        )
    }

    fn credit_group_social_fund(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal> {
        self.adjust_balance(
            "INSERT OR IGNORE INTO lending_groups (group_id) VALUES (?1)",
            "SELECT social_fund_balance FROM lending_groups WHERE group_id = ?1",
            "UPDATE lending_groups SET social_fund_balance = ?1 WHERE group_id = ?2",
            &group.to_string(),
            delta,
        )
    }

    fn apply_member_loan_payment(&self, loan: LoanId, amount: Decimal) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (remaining_text, weeks_paid, status_text): (String, u32, String) = tx
            .query_row(
                "SELECT remaining_balance, weeks_paid, status FROM member_loans WHERE loan_id = ?1",
                params![loan.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::Missing(format!("member loan {loan}")))?;
        let remaining = parse_decimal(&remaining_text)?;
        if amount > remaining {
            return Err(StoreError::Overpayment {
                loan,
                amount,
                remaining,
            });
        }
        let updated = remaining - amount;
        let status = if updated.is_zero() {
            MemberLoanStatus::Repaid.as_str().to_string()
        } else {
            status_text
        };
        tx.execute(
            "UPDATE member_loans SET remaining_balance = ?1, weeks_paid = ?2, status = ?3
             WHERE loan_id = ?4",
            params![
                updated.to_string(),
                weeks_paid + 1,
                status,
                loan.to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn apply_group_loan_payment(
        &self,
        loan: LoanId,
        expected_outstanding: Decimal,
        applied: Decimal,
    ) -> StoreResult<Decimal> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (outstanding_text, status_text): (String, String) = tx
            .query_row(
                "SELECT outstanding_balance, status FROM group_loans WHERE loan_id = ?1",
                params![loan.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::Missing(format!("group loan {loan}")))?;
        let outstanding = parse_decimal(&outstanding_text)?;
        if outstanding != expected_outstanding {
            return Err(StoreError::Conflict {
                entity: format!("group loan {loan}"),
                expected: expected_outstanding,
                found: outstanding,
            });
        }
        if applied > outstanding {
            return Err(StoreError::Overpayment {
                loan,
                amount: applied,
                remaining: outstanding,
            });
        }
        let updated = outstanding - applied;
        let status = if updated.is_zero() {
            GroupLoanStatus::Repaid.as_str().to_string()
        } else {
            status_text
        };
        tx.execute(
            "UPDATE group_loans SET outstanding_balance = ?1, status = ?2 WHERE loan_id = ?3",
            params![updated.to_string(), status, loan.to_string()],
        )?;
        tx.commit()?;
        Ok(updated)
    }

    fn record_exists(&self, key: &str) -> StoreResult<bool> {
        let conn = self.connect()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM ledger_records WHERE record_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn upsert_record(&self, record: &LedgerRecord) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO ledger_records (
                record_key, record_id, kind, group_id, member_id, loan_id,
                amount, meeting_date, submission_id, recorded_at, detail
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.key,
                record.id.to_string(),
                record.kind.as_str(),
                record.group.to_string(),
                record.member.map(|id| id.to_string()),
                record.loan.map(|id| id.to_string()),
                record.amount.to_string(),
                record.date.to_string(),
                record.submission.to_string(),
                record.recorded_at.to_rfc3339(),
                record.detail.as_ref().map(|value| value.to_string()),
            ],
        )?;
        Ok(())
    }

    fn records_for_submission(
        &self,
        submission: SubmissionId,
    ) -> StoreResult<Vec<LedgerRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT record_key, record_id, kind, group_id, member_id, loan_id,
                    amount, meeting_date, submission_id, recorded_at, detail
             FROM ledger_records WHERE submission_id = ?1",
        )?;
        let mut rows = stmt.query(params![submission.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(row_to_record(row)??);
        }
        Ok(records)
    }
}

fn parse_decimal(text: &str) -> StoreResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|err| StoreError::Serialization(format!("invalid decimal {text}: {err}")))
}

fn parse_date(text: &str) -> StoreResult<NaiveDate> {
    NaiveDate::from_str(text)
        .map_err(|err| StoreError::Serialization(format!("invalid date {text}: {err}")))
}

fn parse_timestamp(text: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::Serialization(format!("invalid timestamp {text}: {err}")))
}

fn parse_uuid(text: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|err| StoreError::Serialization(format!("invalid id {text}: {err}")))
}

fn row_to_member_loan(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoreResult<MemberLoan>> {
    let loan_id: String = row.get(0)?;
    let member_id: String = row.get(1)?;
    let principal: String = row.get(2)?;
    let remaining: String = row.get(3)?;
    let weeks_due: u32 = row.get(4)?;
    let weeks_paid: u32 = row.get(5)?;
    let status: String = row.get(6)?;
    let days_overdue: u32 = row.get(7)?;
    Ok((|| -> StoreResult<MemberLoan> {
        Ok(MemberLoan {
            id: LoanId::from(parse_uuid(&loan_id)?),
            member: MemberId::from(parse_uuid(&member_id)?),
            principal: parse_decimal(&principal)?,
            remaining_balance: parse_decimal(&remaining)?,
            weeks_due,
            weeks_paid,
            status: MemberLoanStatus::from_str(&status).map_err(StoreError::Serialization)?,
            days_overdue,
        })
    })())
}

fn row_to_group_loan(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoreResult<GroupLoan>> {
    let loan_id: String = row.get(0)?;
    let group_id: String = row.get(1)?;
    let principal: String = row.get(2)?;
    let outstanding: String = row.get(3)?;
    let status: String = row.get(4)?;
    let approved_on: String = row.get(5)?;
    Ok((|| -> StoreResult<GroupLoan> {
        Ok(GroupLoan {
            id: LoanId::from(parse_uuid(&loan_id)?),
            group: GroupId::from(parse_uuid(&group_id)?),
            principal: parse_decimal(&principal)?,
            outstanding_balance: parse_decimal(&outstanding)?,
            status: GroupLoanStatus::from_str(&status).map_err(StoreError::Serialization)?,
            approved_on: parse_date(&approved_on)?,
        })
    })())
}

fn row_to_submission(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoreResult<Submission>> {
    let submission_id: String = row.get(0)?;
    let group_id: String = row.get(1)?;
    let meeting_date: String = row.get(2)?;
    let facilitator_id: String = row.get(3)?;
    let totals: String = row.get(4)?;
    let status: String = row.get(5)?;
    let recorded_at: String = row.get(6)?;
    Ok((|| -> StoreResult<Submission> {
        let totals: MeetingTotals = serde_json::from_str(&totals)
            .map_err(|err| StoreError::Serialization(format!("invalid totals payload: {err}")))?;
        Ok(Submission {
            id: SubmissionId::from(parse_uuid(&submission_id)?),
            group: GroupId::from(parse_uuid(&group_id)?),
            date: parse_date(&meeting_date)?,
            facilitator: chama_core::FacilitatorId::from(parse_uuid(&facilitator_id)?),
            totals,
            status: SubmissionStatus::from_str(&status).map_err(StoreError::Serialization)?,
            recorded_at: parse_timestamp(&recorded_at)?,
        })
    })())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoreResult<LedgerRecord>> {
    let key: String = row.get(0)?;
    let record_id: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let group_id: String = row.get(3)?;
    let member_id: Option<String> = row.get(4)?;
    let loan_id: Option<String> = row.get(5)?;
    let amount: String = row.get(6)?;
    let meeting_date: String = row.get(7)?;
    let submission_id: String = row.get(8)?;
    let recorded_at: String = row.get(9)?;
    let detail: Option<String> = row.get(10)?;
    Ok((|| -> StoreResult<LedgerRecord> {
        Ok(LedgerRecord {
            id: parse_uuid(&record_id)?,
            key,
            kind: RecordKind::from_str(&kind).map_err(StoreError::Serialization)?,
            group: GroupId::from(parse_uuid(&group_id)?),
            member: member_id
                .map(|id| parse_uuid(&id).map(MemberId::from))
                .transpose()?,
            loan: loan_id
                .map(|id| parse_uuid(&id).map(LoanId::from))
                .transpose()?,
            amount: parse_decimal(&amount)?,
            date: parse_date(&meeting_date)?,
            submission: SubmissionId::from(parse_uuid(&submission_id)?),
            recorded_at: parse_timestamp(&recorded_at)?,
            detail: detail
                .map(|json| {
                    serde_json::from_str(&json).map_err(|err| {
                        StoreError::Serialization(format!("invalid record detail: {err}"))
                    })
                })
                .transpose()?,
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn open_store() -> (tempfile::TempDir, SqliteLedgerStore) {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::new(dir.path().join("ledger.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn balances_accumulate_across_calls() {
        let (_dir, store) = open_store();
        let member = MemberId::new();
        assert_eq!(store.credit_member_savings(member, dec!(1500)).unwrap(), dec!(1500));
        assert_eq!(store.credit_member_savings(member, dec!(250)).unwrap(), dec!(1750));
        assert_eq!(store.member_savings(member).unwrap(), dec!(1750));
    }

    #[test]
    fn group_loans_roundtrip_and_sort_oldest_first() {
        let (_dir, store) = open_store();
        let group = GroupId::new();
        let older = GroupLoan {
            id: LoanId::new(),
            group,
            principal: dec!(10000),
            outstanding_balance: dec!(5000),
            status: GroupLoanStatus::Active,
            approved_on: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        };
        let newer = GroupLoan {
            id: LoanId::new(),
            group,
            principal: dec!(6000),
            outstanding_balance: dec!(3000),
            status: GroupLoanStatus::Overdue,
            approved_on: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
        };
        store.put_group_loan(&newer).unwrap();
        store.put_group_loan(&older).unwrap();

        let loans = store.outstanding_group_loans(group).unwrap();
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[0], older);
        assert_eq!(loans[1], newer);
    }

    #[test]
    fn group_loan_cas_detects_stale_snapshots() {
        let (_dir, store) = open_store();
        let loan = GroupLoan {
            id: LoanId::new(),
            group: GroupId::new(),
            principal: dec!(10000),
            outstanding_balance: dec!(5000),
            status: GroupLoanStatus::Active,
            approved_on: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        };
        store.put_group_loan(&loan).unwrap();

        assert_eq!(
            store
                .apply_group_loan_payment(loan.id, dec!(5000), dec!(2000))
                .unwrap(),
            dec!(3000)
        );
        let err = store
            .apply_group_loan_payment(loan.id, dec!(5000), dec!(3000))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn duplicate_submission_key_is_rejected() {
        let (_dir, store) = open_store();
        let submission = Submission {
            id: SubmissionId::new(),
            group: GroupId::new(),
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            facilitator: chama_core::FacilitatorId::new(),
            totals: MeetingTotals::default(),
            status: SubmissionStatus::Pending,
            recorded_at: Utc::now(),
        };
        store.insert_submission(&submission).unwrap();

        let mut duplicate = submission.clone();
        duplicate.id = SubmissionId::new();
        let err = store.insert_submission(&duplicate).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let found = store
            .find_submission(submission.group, submission.date)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, submission.id);
        assert_eq!(found.status, SubmissionStatus::Pending);
    }

    #[test]
    fn records_upsert_by_key_instead_of_duplicating() {
        let (_dir, store) = open_store();
        let group = GroupId::new();
        let submission = SubmissionId::new();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let record = LedgerRecord::new(
            format!("{submission}/savings/demo"),
            RecordKind::Savings,
            group,
            date,
            submission,
            dec!(1200),
            Utc::now(),
        );
        store.upsert_record(&record).unwrap();
        assert!(store.record_exists(&record.key).unwrap());

        let mut replayed = record.clone();
        replayed.amount = dec!(1200);
        store.upsert_record(&replayed).unwrap();

        let records = store.records_for_submission(submission).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, dec!(1200));
    }
}
