//! Payment ledger behavior through full runs

use loan_tape_core_rs::models::state::LoanState;
use loan_tape_core_rs::orchestrator::{Orchestrator, SimulationConfig};
use loan_tape_core_rs::reporting::ledger_entry;
use loan_tape_core_rs::risk::{ArchetypeCatalog, RiskVectorSource, TransitionParams};
use loan_tape_core_rs::transitions::SeasoningRule;
use loan_tape_core_rs::{
    Loan, PaymentStatus, ReferenceArchetypeModel, Underwriting, YearMonth,
};
use chrono::NaiveDate;

struct AlwaysDelinquent;

impl RiskVectorSource for AlwaysDelinquent {
    fn archetype_catalog(&self) -> ArchetypeCatalog {
        ArchetypeCatalog::new(vec!["LATE".into()]).unwrap()
    }

    fn predict_risk_vectors(&self, loans: &[Loan]) -> Vec<Vec<f64>> {
        loans.iter().map(|_| vec![1.0]).collect()
    }

    fn base_transition_parameters(&self, _archetype: &str, _age: usize) -> TransitionParams {
        TransitionParams {
            p_current_to_30: 1.0,
            ..TransitionParams::ZERO
        }
    }
}

fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn loan(id: &str) -> Loan {
    Loan::new(
        id.into(),
        format!("APP-{id}"),
        month(2022, 1),
        1_200_000,
        36,
        0.12,
        Underwriting::default(),
    )
    .unwrap()
}

#[test]
fn test_scenario_c_single_missed_record_on_first_delinquency() {
    let config = SimulationConfig {
        start_month: month(2022, 1),
        end_month: month(2022, 6),
        seasoning: SeasoningRule {
            months: 0,
            factor: 0.10,
        },
        ..SimulationConfig::default()
    };
    let output = Orchestrator::new(config, vec![loan("LN-C")], &AlwaysDelinquent)
        .unwrap()
        .run()
        .unwrap();

    // Stays DPD30 after the first month (no roll, no cure)
    assert_eq!(output.snapshots.len(), 6);
    assert!(output
        .snapshots
        .iter()
        .all(|s| s.loan_status == LoanState::Dpd30));

    assert_eq!(output.payments.len(), 1);
    let missed = &output.payments[0];
    assert_eq!(missed.payment_status, PaymentStatus::Missed);
    assert_eq!(missed.actual_payment_amount, 0);
    assert_eq!(missed.principal_paid, 0);
    assert_eq!(missed.interest_paid, 0);
    assert_eq!(missed.interest_accrued, 12_000);
    assert_eq!(missed.payment_id, "PMT-LN-C-1-MISSED");
    assert_eq!(missed.payment_received_date, None);
    assert_eq!(
        missed.payment_due_date,
        NaiveDate::from_ymd_opt(2022, 1, 31).unwrap()
    );
    assert_eq!(output.summary.missed_payment_count, 1);
}

#[test]
fn test_performing_payment_splits_interest_first() {
    let l = loan("LN-P");
    let entry = ledger_entry(&l, LoanState::Current, LoanState::Current, 1_164_000).unwrap();
    // 1% of 1,164,000 = 11,640 interest; 33,333 scheduled
    assert_eq!(entry.accrued, 11_640);
    assert_eq!(entry.interest, 11_640);
    assert_eq!(entry.principal, 33_333 - 11_640);
    assert_eq!(entry.actual, 33_333);
}

#[test]
fn test_every_record_reconciles_in_a_full_run() {
    let config = SimulationConfig {
        seed: 1234,
        start_month: month(2022, 1),
        end_month: month(2024, 12),
        ..SimulationConfig::default()
    };
    let loans: Vec<Loan> = (0..150)
        .map(|i| {
            Loan::new(
                format!("LN-{i}"),
                format!("APP-{i}"),
                month(2022, 1).add_months(i % 12),
                200_000 + 10_000 * i,
                36,
                0.08 + (i % 10) as f64 * 0.015,
                Underwriting {
                    fico_score: 560 + (i as u16 * 7) % 260,
                    debt_to_income: 0.05 + (i % 9) as f64 * 0.05,
                    annual_income: 60_000.0,
                },
            )
            .unwrap()
        })
        .collect();

    let output = Orchestrator::new(config, loans, &ReferenceArchetypeModel::new())
        .unwrap()
        .run()
        .unwrap();

    assert!(!output.payments.is_empty());
    for record in &output.payments {
        assert!(record.is_balanced(), "unbalanced {}", record.payment_id);
        assert_eq!(
            record.principal_paid + record.interest_paid,
            record.actual_payment_amount
        );
        assert!(record.actual_payment_amount >= 0);
        match record.payment_status {
            PaymentStatus::Missed => {
                assert_eq!(record.actual_payment_amount, 0);
                assert!(record.payment_id.ends_with("-MISSED"));
                assert!(record.payment_received_date.is_none());
            }
            PaymentStatus::PaidOff => assert_eq!(record.interest_paid, 0),
            PaymentStatus::Paid => {
                assert_eq!(record.actual_payment_amount, record.scheduled_payment_amount);
                assert!(record.interest_paid <= record.interest_accrued);
                assert_eq!(record.payment_received_date, Some(record.payment_due_date));
            }
        }
    }

    let collected: i64 = output.payments.iter().map(|p| p.actual_payment_amount).sum();
    assert_eq!(collected, output.summary.total_collected);
}

#[test]
fn test_payoff_record_matches_last_reported_balance() {
    let config = SimulationConfig {
        seed: 99,
        start_month: month(2022, 1),
        end_month: month(2026, 12),
        ..SimulationConfig::default()
    };
    let loans: Vec<Loan> = (0..80)
        .map(|i| {
            Loan::new(
                format!("LN-{i}"),
                format!("APP-{i}"),
                month(2022, 1),
                500_000,
                36,
                0.12,
                Underwriting {
                    fico_score: 780,
                    debt_to_income: 0.10,
                    annual_income: 90_000.0,
                },
            )
            .unwrap()
        })
        .collect();

    let output = Orchestrator::new(config, loans, &ReferenceArchetypeModel::new())
        .unwrap()
        .run()
        .unwrap();

    for payoff in output
        .payments
        .iter()
        .filter(|p| p.payment_status == PaymentStatus::PaidOff)
    {
        let history: Vec<_> = output
            .snapshots
            .iter()
            .filter(|s| s.loan_id == payoff.loan_id)
            .collect();
        let last = history.last().unwrap();
        assert_eq!(last.loan_status, LoanState::PaidOff);
        assert_eq!(last.snapshot_date, payoff.payment_due_date);

        let prior_balance = if history.len() >= 2 {
            history[history.len() - 2].current_balance
        } else {
            last.original_loan_amount
        };
        assert_eq!(payoff.actual_payment_amount, prior_balance);
    }
}
