use rust_decimal::Decimal;

use crate::model::ledger::JournalLine;
use crate::model::payroll::PayrollRun;
use crate::payroll::accounts::PayrollAccounts;
use crate::payroll::error::PayrollError;

/// Rejects journals the ledger must never see: fewer than two legs, negative
/// or two-sided legs, or Σdebit ≠ Σcredit.
pub fn ensure_balanced(lines: &[JournalLine]) -> Result<(), PayrollError> {
    if lines.len() < 2 {
        return Err(PayrollError::InvalidInput(
            "a journal needs at least one debit and one credit leg".into(),
        ));
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;
    for line in lines {
        let one_sided = (line.debit.is_zero()) != (line.credit.is_zero());
        if line.debit.is_sign_negative() || line.credit.is_sign_negative() || !one_sided {
            return Err(PayrollError::InvalidInput(format!(
                "journal leg on {} must carry exactly one positive amount",
                line.account_code
            )));
        }
        debit += line.debit;
        credit += line.credit;
    }

    if debit != credit {
        return Err(PayrollError::InvalidInput(format!(
            "journal is unbalanced: debit {debit} != credit {credit}"
        )));
    }
    Ok(())
}

/// Accrual journal: expense against payable, BPJS and tax liabilities.
pub fn accrual_journal(
    run: &PayrollRun,
    accounts: &PayrollAccounts,
) -> Result<Vec<JournalLine>, PayrollError> {
    let period = run.period;
    let gross: Decimal = run.lines.iter().map(|l| l.gross_salary).sum();
    let net: Decimal = run.lines.iter().map(|l| l.net_salary).sum();
    let bpjs: Decimal = run.lines.iter().map(|l| l.bpjs_total()).sum();
    let tax: Decimal = run.lines.iter().map(|l| l.pph21).sum();

    let mut lines = vec![JournalLine::debit(
        &accounts.expense,
        gross,
        format!("Salary expense {period}"),
    )];
    if net > Decimal::ZERO {
        lines.push(JournalLine::credit(
            &accounts.payable,
            net,
            format!("Net salary payable {period}"),
        ));
    }
    if bpjs > Decimal::ZERO {
        lines.push(JournalLine::credit(
            &accounts.bpjs,
            bpjs,
            format!("BPJS contributions {period}"),
        ));
    }
    if tax > Decimal::ZERO {
        lines.push(JournalLine::credit(
            &accounts.tax,
            tax,
            format!("PPh 21 withholding {period}"),
        ));
    }

    ensure_balanced(&lines)?;
    Ok(lines)
}

/// Cash journal settling the payable created at posting.
pub fn disbursement_journal(
    run: &PayrollRun,
    accounts: &PayrollAccounts,
    payment_number: &str,
) -> Result<Vec<JournalLine>, PayrollError> {
    let net = run.summary.net;
    let lines = vec![
        JournalLine::debit(
            &accounts.payable,
            net,
            format!("Salary payment {} ({payment_number})", run.period),
        ),
        JournalLine::credit(
            &accounts.cash,
            net,
            format!("Salary payment {} ({payment_number})", run.period),
        ),
    ];
    ensure_balanced(&lines)?;
    Ok(lines)
}
