use crate::date;
use time::Date;

///
/// SessionContext
///
/// Caller-supplied invocation context: the company that applies when input
/// leaves it blank, the acting user recorded into bookkeeping fields, and
/// the session date stamped on every mutation. All three are injected by
/// the host; the engine never reads ambient process state.
///

#[derive(Clone, Debug)]
pub struct SessionContext {
    company: i64,
    user: String,
    date: Date,
}

impl SessionContext {
    #[must_use]
    pub fn new(company: i64, user: impl Into<String>, date: Date) -> Self {
        Self {
            company,
            user: user.into(),
            date,
        }
    }

    #[must_use]
    pub const fn company(&self) -> i64 {
        self.company
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Session date in its stored `yyyyMMdd` integer form.
    #[must_use]
    pub fn date_number(&self) -> i64 {
        date::as_number(self.date)
    }
}
