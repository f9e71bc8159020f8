use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::calculator::OvertimePolicy;

/// Result of one payroll run. Every deduction component is kept so the
/// summary sheet can show how the final amount was reached.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollSummary {
    #[schema(example = "Om")]
    pub employee: String,

    #[schema(example = 18000.0)]
    pub monthly_salary: f64,

    #[schema(example = 200.0)]
    pub total_worked_hours: f64,

    #[schema(example = 0.0)]
    pub total_overtime_hours: f64,

    #[schema(example = 208.0)]
    pub contracted_hours: f64,

    #[schema(example = 86.538)]
    pub per_hour_rate: f64,

    #[schema(example = 692.31)]
    pub leave_deduction: f64,

    #[schema(example = 200.0)]
    pub tax_deduction: f64,

    #[schema(example = 0.0)]
    pub deposit_deduction: f64,

    #[schema(example = 892.31)]
    pub total_deductions: f64,

    /// How overtime was paid in this run.
    pub overtime_policy: OvertimePolicy,

    /// Per-hour rate applied to overtime hours.
    #[schema(example = 100.0)]
    pub overtime_rate: f64,

    #[schema(example = 0.0)]
    pub overtime_pay: f64,

    /// Not clamped, a negative value means deductions exceed the salary.
    #[schema(example = 17107.69)]
    pub final_payable: f64,

    /// Distinct calendar dates present in the period.
    #[schema(example = 25)]
    pub attended_days: usize,

    /// Month name the tax charge was looked up by.
    #[schema(example = "January", nullable = true)]
    pub tax_month: Option<String>,

    /// Hour values that could not be parsed and were counted as 0.
    #[schema(example = 0)]
    pub parse_failures: usize,
}
