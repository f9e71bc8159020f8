use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-employee payroll inputs, keyed by the staff name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "name": "Om",
        "monthly_salary": 18000.0,
        "working_days": 26,
        "standard_hours_per_day": 8.0,
        "security_deposit": 2600.0
    })
)]
pub struct EmployeeConfig {
    #[schema(example = "Om")]
    pub name: String,

    #[schema(example = 18000.0)]
    pub monthly_salary: f64,

    #[schema(example = 26)]
    pub working_days: i32,

    #[schema(example = 8.0)]
    pub standard_hours_per_day: f64,

    #[schema(example = 0.0)]
    pub security_deposit: f64,
}

/// Values used when the configuration store has no entry for an employee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigDefaults {
    pub monthly_salary: f64,
    pub working_days: i32,
    pub standard_hours_per_day: f64,
    pub security_deposit: f64,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            monthly_salary: 18000.0,
            working_days: 26,
            standard_hours_per_day: 8.0,
            security_deposit: 0.0,
        }
    }
}

impl ConfigDefaults {
    pub fn for_employee(&self, name: &str) -> EmployeeConfig {
        EmployeeConfig {
            name: name.to_string(),
            monthly_salary: self.monthly_salary,
            working_days: self.working_days,
            standard_hours_per_day: self.standard_hours_per_day,
            security_deposit: self.security_deposit,
        }
    }
}
