use thiserror::Error;

/// Failures coming out of the record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record {0} not found")]
    NotFound(u64),
}

/// Rejections of the check-in / check-out state machine.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("already checked in today at {at}")]
    AlreadyCheckedIn { at: String },

    #[error("already checked out today at {at}")]
    AlreadyCheckedOut { at: String },

    #[error("no check-in record found for today, check in first")]
    NoOpenShift,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq)]
pub enum PayrollError {
    #[error(
        "working days ({working_days}) and standard hours per day ({standard_hours_per_day}) must be greater than 0"
    )]
    InvalidConfiguration {
        working_days: i32,
        standard_hours_per_day: f64,
    },
}

/// An uploaded timesheet that could not be read.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read XLSX: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Could not read XLSX: the workbook has no worksheet")]
    NoWorksheet,
}
