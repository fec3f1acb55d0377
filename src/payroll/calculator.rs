//! Converts one employee's time-ledger rows into a [`PayrollLine`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::payroll::PayrollLine;
use crate::payroll::money::{round_hours, round_money};

pub const FORMULA_VERSION: &str = "flat-2024.1";

const TRANSPORT_RATE: Decimal = dec!(0.07);
const MEAL_RATE: Decimal = dec!(0.03);
const POSITION_RATE: Decimal = dec!(0.10);

/// Standard monthly working hours.
const OVERTIME_DIVISOR: Decimal = dec!(173);
const OVERTIME_MULTIPLIER: Decimal = dec!(1.5);

const BPJS_HEALTH_RATE: Decimal = dec!(0.01);
const BPJS_HEALTH_CAP: Decimal = dec!(150000);
const BPJS_EMPLOYMENT_RATE: Decimal = dec!(0.02);
const BPJS_EMPLOYMENT_CAP: Decimal = dec!(360000);
const PPH21_RATE: Decimal = dec!(0.05);

const STANDARD_DAY_HOURS: Decimal = dec!(8);
const BREAK_THRESHOLD_HOURS: Decimal = dec!(6);
const UNPAID_BREAK_HOURS: Decimal = dec!(1);
const SECONDS_PER_HOUR: Decimal = dec!(3600);

/// Hours worked on one row, net of the unpaid break, rounded to 2 places.
///
/// Rows missing either timestamp count as zero.
pub fn working_hours(record: &AttendanceRecord) -> Decimal {
    let (Some(check_in), Some(check_out)) = (record.check_in, record.check_out) else {
        return Decimal::ZERO;
    };

    let raw = Decimal::from((check_out - check_in).num_seconds()) / SECONDS_PER_HOUR;
    let worked = if raw >= BREAK_THRESHOLD_HOURS {
        raw - UNPAID_BREAK_HOURS
    } else {
        raw
    };
    round_hours(worked.max(Decimal::ZERO))
}

pub fn overtime_hours(record: &AttendanceRecord) -> Decimal {
    round_hours((working_hours(record) - STANDARD_DAY_HOURS).max(Decimal::ZERO))
}

/// `rows` may contain other employees' records; only `employee.id` rows are counted.
pub fn calculate_line(employee: &Employee, rows: &[AttendanceRecord]) -> PayrollLine {
    let mut attendance_days = 0u32;
    let mut leave_days = 0u32;
    let mut late_count = 0u32;
    let mut overtime = Decimal::ZERO;

    for row in rows.iter().filter(|r| r.employee_id == employee.id) {
        if row.status.counts_as_attendance() {
            attendance_days += 1;
        }
        if row.status == AttendanceStatus::Leave {
            leave_days += 1;
        }
        if row.is_late {
            late_count += 1;
        }
        overtime += overtime_hours(row);
    }
    let overtime = round_hours(overtime);

    let base = employee.base_salary;
    // Every money field is whole units so journal legs built from lines and
    // from the summary agree.
    let basic_salary = round_money(base);
    let transport_allowance = round_money(base * TRANSPORT_RATE);
    let meal_allowance = round_money(base * MEAL_RATE);
    let position_allowance = round_money(base * POSITION_RATE);
    let overtime_pay = round_money(overtime * (base / OVERTIME_DIVISOR) * OVERTIME_MULTIPLIER);

    let gross_salary =
        basic_salary + transport_allowance + meal_allowance + position_allowance + overtime_pay;

    let bpjs_kesehatan = round_money(base * BPJS_HEALTH_RATE).min(BPJS_HEALTH_CAP);
    let bpjs_ketenagakerjaan = round_money(base * BPJS_EMPLOYMENT_RATE).min(BPJS_EMPLOYMENT_CAP);

    let taxable = (gross_salary - (bpjs_kesehatan + bpjs_ketenagakerjaan)).max(Decimal::ZERO);
    let pph21 = round_money(taxable * PPH21_RATE);

    let total_deductions = bpjs_kesehatan + bpjs_ketenagakerjaan + pph21;
    let net_salary = (gross_salary - total_deductions).max(Decimal::ZERO);

    PayrollLine {
        employee_id: employee.id,
        employee_code: employee.employee_code.clone(),
        employee_name: employee.full_name.clone(),
        department: employee.department.clone(),
        attendance_days,
        leave_days,
        late_count,
        overtime_hours: overtime,
        basic_salary,
        transport_allowance,
        meal_allowance,
        position_allowance,
        overtime_pay,
        bpjs_kesehatan,
        bpjs_ketenagakerjaan,
        pph21,
        gross_salary,
        total_deductions,
        net_salary,
    }
}
