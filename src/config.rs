use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::engine::calculator::{OvertimePolicy, TaxSchedule};
use crate::model::attendance::TIME_FORMAT;
use crate::model::employee::ConfigDefaults;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_attendance_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Payroll
    pub auto_checkout_time: NaiveTime,
    pub config_defaults: ConfigDefaults,
    pub overtime: OvertimeSettings,
    pub tax: TaxSchedule,

    /// Seeds the first HR account when none exists.
    pub bootstrap_hr: Option<(String, String)>,
}

/// Configured overtime parameters for both modes. `mode` picks the default
/// one; requests may switch modes and still get the configured parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeSettings {
    pub mode: String,
    pub fixed_rate: f64,
    pub multiplier: f64,
}

impl Default for OvertimeSettings {
    fn default() -> Self {
        Self {
            mode: "fixed".to_string(),
            fixed_rate: 100.0,
            multiplier: 1.5,
        }
    }
}

impl OvertimeSettings {
    pub fn policy(&self) -> Result<OvertimePolicy> {
        overtime_policy(&self.mode, self.fixed_rate, self.multiplier)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let auto_checkout_time = match env::var("AUTO_CHECKOUT_TIME") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
                .with_context(|| format!("AUTO_CHECKOUT_TIME={raw:?} is not HH:MM:SS"))?,
            Err(_) => NaiveTime::from_hms_opt(18, 30, 0).context("default auto-checkout time")?,
        };

        let fallback = ConfigDefaults::default();
        let config_defaults = ConfigDefaults {
            monthly_salary: or_default("DEFAULT_MONTHLY_SALARY", fallback.monthly_salary)?,
            working_days: or_default("DEFAULT_WORKING_DAYS", fallback.working_days)?,
            standard_hours_per_day: or_default(
                "DEFAULT_STANDARD_HOURS",
                fallback.standard_hours_per_day,
            )?,
            security_deposit: or_default("DEFAULT_SECURITY_DEPOSIT", fallback.security_deposit)?,
        };

        let ot = OvertimeSettings::default();
        let overtime = OvertimeSettings {
            mode: or_default("OVERTIME_MODE", ot.mode)?,
            fixed_rate: or_default("OVERTIME_FIXED_RATE", ot.fixed_rate)?,
            multiplier: or_default("OVERTIME_MULTIPLIER", ot.multiplier)?,
        };
        overtime.policy()?;
        let tax = TaxSchedule::new(or_default("TAX_DEFAULT", 200.0)?)
            .with_month("February", or_default("TAX_FEBRUARY", 300.0)?);

        let bootstrap_hr = match (env::var("BOOTSTRAP_HR_NAME"), env::var("BOOTSTRAP_HR_PIN")) {
            (Ok(name), Ok(pin)) => Some((name, pin)),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", 604_800)?, // default 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_attendance_per_min: or_default("RATE_ATTENDANCE_PER_MIN", 30)?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            auto_checkout_time,
            config_defaults,
            overtime,
            tax,
            bootstrap_hr,
        })
    }
}

/// `fixed` pays a flat amount per overtime hour, `multiplier` a multiple of
/// the employee's hourly rate.
pub fn overtime_policy(mode: &str, fixed_rate: f64, multiplier: f64) -> Result<OvertimePolicy> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "fixed" | "fixed_rate" => Ok(OvertimePolicy::FixedRate {
            rate_per_hour: fixed_rate,
        }),
        "multiplier" => Ok(OvertimePolicy::Multiplier { multiplier }),
        other => bail!("unknown overtime mode {other:?}, expected `fixed` or `multiplier`"),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 604_800,
            rate_login_per_min: 60,
            rate_attendance_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            auto_checkout_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            config_defaults: ConfigDefaults::default(),
            overtime: OvertimeSettings::default(),
            tax: TaxSchedule::default(),
            bootstrap_hr: None,
        }
    }
}
