use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info, warn};

use chama_config::Settings;
use chama_core::{
    AllocationPlan, AllocationSlice, CollectionEntry, CommissionPolicy, FacilitatorId,
    FineSchedule, GroupId, GroupLoan, LoanId, MeetingTotals, RetryPolicy, Submission,
    SubmissionId, SubmissionStatus,
};
use chama_engine::{
    aggregate, allocate, build_entries, commission_for, Commission, RosterRow, ScheduleFault,
};
use chama_ledger::{LedgerRecord, LedgerStore, RecordKind, StoreError};

use crate::intent::{execute, BalanceMutation, MutationIntent};
use crate::retry::with_retry;
use crate::{Clock, SubmissionError, SubmissionResult};

/// Parameters for constructing a coordinator.
#[derive(Clone, Debug, Default)]
pub struct CoordinatorConfig {
    pub fines: FineSchedule,
    pub commission: CommissionPolicy,
    pub retry: RetryPolicy,
    /// Decimal places of the smallest currency unit.
    pub unit_scale: u32,
}

impl From<&Settings> for CoordinatorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            fines: settings.fines.clone(),
            commission: settings.commission.clone(),
            retry: settings.retry.clone(),
            unit_scale: settings.unit_scale,
        }
    }
}

/// Speculative result of the calculation stages; produced without any
/// ledger write, e.g. for an on-screen preview before submission.
#[derive(Clone, Debug)]
pub struct SubmissionPreview {
    pub entries: Vec<CollectionEntry>,
    pub totals: MeetingTotals,
    pub plan: AllocationPlan,
    pub commission: Commission,
    pub faults: Vec<ScheduleFault>,
}

/// Outcome of a successful submission.
#[derive(Clone, Debug)]
pub struct SubmissionReceipt {
    pub submission: SubmissionId,
    pub group: GroupId,
    pub date: NaiveDate,
    pub totals: MeetingTotals,
    /// Cumulative allocation across this run and any resumed partial run.
    pub plan: AllocationPlan,
    pub commission: Commission,
    pub faults: Vec<ScheduleFault>,
    pub resumed: bool,
}

/// Orchestrates one meeting's reconciliation end to end.
///
/// The calculation stages are pure; every side effect funnels through the
/// mutation saga, whose terminal step (flipping the submission status to
/// `Submitted`) only happens after every other write succeeded.
pub struct SubmissionCoordinator<S, C> {
    store: Arc<S>,
    clock: C,
    facilitator: FacilitatorId,
    config: CoordinatorConfig,
}

struct Computed {
    entries: Vec<CollectionEntry>,
    totals: MeetingTotals,
    commission: Commission,
    faults: Vec<ScheduleFault>,
}

impl<S, C> SubmissionCoordinator<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C, facilitator: FacilitatorId, config: CoordinatorConfig) -> Self {
        Self {
            store,
            clock,
            facilitator,
            config,
        }
    }

    /// Run the calculation stages speculatively: obligations, totals,
    /// waterfall plan, and commission, with zero ledger writes.
    pub fn preview(&self, group: GroupId, roster: &[RosterRow]) -> SubmissionResult<SubmissionPreview> {
        let computed = self.compute(roster)?;
        let loans = with_retry(&self.config.retry, || {
            self.store.outstanding_group_loans(group)
        })?;
        let plan = allocate(computed.totals.pool_amount(), &loans)?;
        Ok(SubmissionPreview {
            entries: computed.entries,
            totals: computed.totals,
            plan,
            commission: computed.commission,
            faults: computed.faults,
        })
    }

    /// Reconcile one meeting: run the calculators, then apply the full
    /// set of ledger mutations as a single logical unit.
    ///
    /// A (group, date) pair already marked `Submitted` is rejected; an
    /// incomplete prior run for the same pair is resumed under its
    /// original submission id, where intent keys make every replayed
    /// step detect-and-skip.
    pub fn submit(&self, group: GroupId, roster: &[RosterRow]) -> SubmissionResult<SubmissionReceipt> {
        if roster.is_empty() {
            return Err(SubmissionError::EmptyRoster);
        }
        let date = self.clock.today();
        let existing = with_retry(&self.config.retry, || {
            self.store.find_submission(group, date)
        })?;
        let (submission_id, resumed) = match existing {
            Some(prior) if prior.status == SubmissionStatus::Submitted => {
                return Err(SubmissionError::Duplicate { group, date });
            }
            Some(prior) => {
                info!(submission = %prior.id, %group, %date, "resuming incomplete submission");
                (prior.id, true)
            }
            None => (SubmissionId::new(), false),
        };

        let computed = self.compute(roster)?;
        info!(
            %group,
            %date,
            rows = computed.entries.len(),
            grand_total = %computed.totals.grand_total,
            "reconciling meeting submission"
        );

        // Validate the waterfall before any write so a calculation fault
        // aborts with a clean ledger.
        let loans = with_retry(&self.config.retry, || {
            self.store.outstanding_group_loans(group)
        })?;
        allocate(computed.totals.pool_amount(), &loans)?;

        let submission = Submission {
            id: submission_id,
            group,
            date,
            facilitator: self.facilitator,
            totals: computed.totals.clone(),
            status: SubmissionStatus::Pending,
            recorded_at: self.clock.now(),
        };
        if !resumed {
            match with_retry(&self.config.retry, || {
                self.store.insert_submission(&submission)
            }) {
                Ok(()) => {}
                // Another facilitator won the race for this meeting.
                Err(StoreError::Duplicate(_)) => {
                    return Err(SubmissionError::Duplicate { group, date });
                }
                Err(err) => return Err(err.into()),
            }
        }

        match self.run_saga(&submission, &computed) {
            Ok(plan) => {
                with_retry(&self.config.retry, || {
                    self.store
                        .set_submission_status(submission_id, SubmissionStatus::Submitted)
                })?;
                info!(
                    submission = %submission_id,
                    %group,
                    %date,
                    pool = %plan.pool,
                    to_savings = %plan.to_savings,
                    commission = %computed.commission.amount,
                    "meeting submission reconciled"
                );
                Ok(SubmissionReceipt {
                    submission: submission_id,
                    group,
                    date,
                    totals: computed.totals,
                    plan,
                    commission: computed.commission,
                    faults: computed.faults,
                    resumed,
                })
            }
            Err(err) => {
                error!(submission = %submission_id, error = %err, "submission aborted mid-saga");
                if let Err(mark_err) = self
                    .store
                    .set_submission_status(submission_id, SubmissionStatus::Failed)
                {
                    error!(
                        submission = %submission_id,
                        error = %mark_err,
                        "could not mark submission failed"
                    );
                }
                Err(err)
            }
        }
    }

    fn compute(&self, roster: &[RosterRow]) -> SubmissionResult<Computed> {
        let mut loans = HashMap::new();
        for row in roster {
            if let Some(loan) = with_retry(&self.config.retry, || {
                self.store.member_loan(row.member)
            })? {
                loans.insert(row.member, loan);
            }
        }
        let (entries, faults) =
            build_entries(roster, &loans, &self.config.fines, self.config.unit_scale);
        for fault in &faults {
            warn!(
                member = %fault.member,
                loan = %fault.loan,
                error = %fault.error,
                "dropping loan writes for member with broken schedule"
            );
        }
        let totals = aggregate(&entries);
        let commission = commission_for(&entries, &self.config.commission);
        Ok(Computed {
            entries,
            totals,
            commission,
            faults,
        })
    }

    fn run_saga(
        &self,
        submission: &Submission,
        computed: &Computed,
    ) -> SubmissionResult<AllocationPlan> {
        for entry in &computed.entries {
            for intent in self.member_intents(submission, entry) {
                execute(self.store.as_ref(), &self.config.retry, &intent)?;
            }
        }

        let plan = self.apply_allocation(submission, computed.totals.pool_amount())?;

        if computed.commission.amount > Decimal::ZERO {
            let record = LedgerRecord::new(
                format!("{}/commission", submission.id),
                RecordKind::Commission,
                submission.group,
                submission.date,
                submission.id,
                computed.commission.amount,
                self.clock.now(),
            )
            .with_detail(json!({
                "loan_count": computed.commission.loan_count,
                "fee_total": computed.commission.fee_total,
            }));
            execute(
                self.store.as_ref(),
                &self.config.retry,
                &MutationIntent::record_only(record),
            )?;
        }

        Ok(plan)
    }

    fn member_intents(&self, submission: &Submission, entry: &CollectionEntry) -> Vec<MutationIntent> {
        let id = submission.id;
        let member = entry.member;
        let now = self.clock.now();
        let record = |key: String, kind: RecordKind, amount: Decimal| {
            LedgerRecord::new(key, kind, submission.group, submission.date, id, amount, now)
                .for_member(member)
        };

        let mut intents = Vec::new();
        if entry.savings > Decimal::ZERO {
            intents.push(MutationIntent::with_mutation(
                record(format!("{id}/savings/{member}"), RecordKind::Savings, entry.savings),
                BalanceMutation::CreditMemberSavings {
                    member,
                    amount: entry.savings,
                },
            ));
        }
        if entry.social_fund > Decimal::ZERO {
            intents.push(MutationIntent::with_mutation(
                record(
                    format!("{id}/social-fund/{member}"),
                    RecordKind::SocialFund,
                    entry.social_fund,
                ),
                BalanceMutation::CreditGroupSocialFund {
                    group: submission.group,
                    amount: entry.social_fund,
                },
            ));
        }
        if entry.registration > Decimal::ZERO {
            // Registration is overhead revenue: recorded, never pooled or
            // credited to a balance.
            intents.push(MutationIntent::record_only(record(
                format!("{id}/registration/{member}"),
                RecordKind::Registration,
                entry.registration,
            )));
        }
        if let (Some(loan), true) = (entry.loan, entry.loan_repayment > Decimal::ZERO) {
            intents.push(MutationIntent::with_mutation(
                record(
                    format!("{id}/repayment/{member}"),
                    RecordKind::Repayment,
                    entry.loan_repayment,
                )
                .for_loan(loan),
                BalanceMutation::MemberLoanPayment {
                    loan,
                    amount: entry.loan_repayment,
                },
            ));
        }
        if entry.fines > Decimal::ZERO {
            let mut fine = record(format!("{id}/fine/{member}"), RecordKind::Fine, entry.fines);
            if let Some(loan) = entry.loan {
                fine = fine.for_loan(loan);
            }
            intents.push(MutationIntent::record_only(fine));
        }
        // Attendance is always written, keyed per (group, member, date) so
        // replays and corrections land on the same row.
        intents.push(MutationIntent::record_only(
            record(
                format!(
                    "attendance/{}/{member}/{}",
                    submission.group, submission.date
                ),
                RecordKind::Attendance,
                Decimal::ZERO,
            )
            .with_detail(json!({ "absent": entry.is_absent })),
        ));
        intents
    }

    /// Waterfall application with optimistic concurrency: on a stale
    /// snapshot the outstanding loans are re-read and the remaining pool
    /// re-allocated, up to the retry budget.
    fn apply_allocation(
        &self,
        submission: &Submission,
        pool: Decimal,
    ) -> SubmissionResult<AllocationPlan> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let loans = with_retry(&self.config.retry, || {
                self.store.outstanding_group_loans(submission.group)
            })?;
            let (already_applied, already_saved, sliced) =
                self.allocation_progress(submission.id)?;
            let remaining_pool = pool - already_applied - already_saved;
            if remaining_pool < Decimal::ZERO {
                return Err(chama_engine::EngineError::AllocationOverrun {
                    pool,
                    applied: already_applied,
                    to_savings: already_saved,
                }
                .into());
            }
            // Loans already served by a previous partial run keep their
            // slice; only the rest compete for the remaining pool.
            let eligible: Vec<GroupLoan> = loans
                .into_iter()
                .filter(|loan| !sliced.contains(&loan.id))
                .collect();
            let plan = allocate(remaining_pool, &eligible)?;

            match self.apply_plan(submission, &plan, &eligible) {
                Ok(()) => return self.finish_allocation(submission, pool),
                Err(StoreError::Conflict { entity, .. }) if attempt < max_attempts => {
                    warn!(attempt, %entity, "allocation snapshot went stale, recomputing");
                    continue;
                }
                Err(StoreError::Conflict { .. }) => {
                    return Err(SubmissionError::Conflict { attempts: attempt });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn apply_plan(
        &self,
        submission: &Submission,
        plan: &AllocationPlan,
        loans: &[GroupLoan],
    ) -> Result<(), StoreError> {
        for slice in &plan.slices {
            let expected = loans
                .iter()
                .find(|loan| loan.id == slice.loan)
                .map(|loan| loan.outstanding_balance)
                .unwrap_or(Decimal::ZERO);
            let record = LedgerRecord::new(
                format!("{}/allocation/{}", submission.id, slice.loan),
                RecordKind::Allocation,
                submission.group,
                submission.date,
                submission.id,
                slice.applied,
                self.clock.now(),
            )
            .for_loan(slice.loan);
            execute(
                self.store.as_ref(),
                &self.config.retry,
                &MutationIntent::with_mutation(
                    record,
                    BalanceMutation::GroupLoanPayment {
                        loan: slice.loan,
                        expected_outstanding: expected,
                        applied: slice.applied,
                    },
                ),
            )?;
        }
        if plan.to_savings > Decimal::ZERO {
            let record = LedgerRecord::new(
                format!("{}/allocation/savings", submission.id),
                RecordKind::Savings,
                submission.group,
                submission.date,
                submission.id,
                plan.to_savings,
                self.clock.now(),
            );
            execute(
                self.store.as_ref(),
                &self.config.retry,
                &MutationIntent::with_mutation(
                    record,
                    BalanceMutation::CreditGroupSavings {
                        group: submission.group,
                        amount: plan.to_savings,
                    },
                ),
            )?;
        }
        Ok(())
    }

    /// Rebuild the cumulative plan from the submission's records and
    /// upsert the allocation log row capturing it.
    fn finish_allocation(
        &self,
        submission: &Submission,
        pool: Decimal,
    ) -> SubmissionResult<AllocationPlan> {
        let mut records = with_retry(&self.config.retry, || {
            self.store.records_for_submission(submission.id)
        })?;
        records.sort_by(|a, b| (a.recorded_at, &a.key).cmp(&(b.recorded_at, &b.key)));

        let mut slices = Vec::new();
        let mut to_savings = Decimal::ZERO;
        for record in &records {
            match record.kind {
                RecordKind::Allocation => {
                    if let Some(loan) = record.loan {
                        slices.push(AllocationSlice {
                            loan,
                            applied: record.amount,
                        });
                    }
                }
                RecordKind::Savings if record.member.is_none() => {
                    to_savings += record.amount;
                }
                _ => {}
            }
        }
        let cumulative = AllocationPlan {
            pool,
            slices,
            to_savings,
        };

        let detail = serde_json::to_value(&cumulative)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let log = LedgerRecord::new(
            format!("{}/allocation/plan", submission.id),
            RecordKind::Allocation,
            submission.group,
            submission.date,
            submission.id,
            pool,
            self.clock.now(),
        )
        .with_detail(detail);
        with_retry(&self.config.retry, || self.store.upsert_record(&log))?;
        Ok(cumulative)
    }

    fn allocation_progress(
        &self,
        submission: SubmissionId,
    ) -> SubmissionResult<(Decimal, Decimal, HashSet<LoanId>)> {
        let records = with_retry(&self.config.retry, || {
            self.store.records_for_submission(submission)
        })?;
        let mut applied = Decimal::ZERO;
        let mut saved = Decimal::ZERO;
        let mut sliced = HashSet::new();
        for record in records {
            match record.kind {
                RecordKind::Allocation => {
                    if let Some(loan) = record.loan {
                        applied += record.amount;
                        sliced.insert(loan);
                    }
                }
                RecordKind::Savings if record.member.is_none() => {
                    saved += record.amount;
                }
                _ => {}
            }
        }
        Ok((applied, saved, sliced))
    }
}
