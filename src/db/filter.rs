//! Query filter utilities for building parameterized SQL queries.

use chrono::{Datelike, NaiveDate};

use crate::period::MonthYear;
use crate::types::UserId;

/// Restricts a session query to one user and, optionally, one month or day.
#[derive(Debug, Clone, Copy)]
pub struct SessionFilter {
    pub user_id: UserId,
    pub month: Option<MonthYear>,
    pub day: Option<u32>,
}

impl SessionFilter {
    /// All sessions of a user.
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            month: None,
            day: None,
        }
    }

    /// Sessions of a user in one month.
    pub const fn month(user_id: UserId, month: MonthYear) -> Self {
        Self {
            user_id,
            month: Some(month),
            day: None,
        }
    }

    /// Sessions of a user on one calendar day.
    pub fn day(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            month: Some(MonthYear::containing(date)),
            day: Some(date.day()),
        }
    }

    /// Append filter clauses to a query string.
    /// Columns are qualified with `alias` when one is given.
    pub fn apply(&self, alias: Option<&str>, query: &mut String, params: &mut Vec<i64>) {
        let col = |name: &str| alias.map_or_else(|| name.to_string(), |a| format!("{a}.{name}"));

        query.push_str(&format!(" AND {} = ?", col("user_id")));
        params.push(self.user_id.get());

        if let Some(month) = self.month {
            query.push_str(&format!(" AND {} = ? AND {} = ?", col("year"), col("month")));
            params.push(i64::from(month.year));
            params.push(i64::from(month.month));
        }
        if let Some(day) = self.day {
            query.push_str(&format!(" AND {} = ?", col("day_of_month")));
            params.push(i64::from(day));
        }
    }

    /// Build the `WHERE 1=1 ...` clause and its parameters in one go.
    pub fn where_clause(&self, alias: Option<&str>) -> (String, Vec<i64>) {
        let mut clause = " WHERE 1=1".to_string();
        let mut params = Vec::new();
        self.apply(alias, &mut clause, &mut params);
        (clause, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_only() {
        let (clause, params) = SessionFilter::user(UserId::new(9)).where_clause(None);
        assert_eq!(clause, " WHERE 1=1 AND user_id = ?");
        assert_eq!(params, vec![9]);
    }

    #[test]
    fn test_month_with_alias() {
        let month = MonthYear::new(2024, 3).unwrap();
        let (clause, params) = SessionFilter::month(UserId::new(1), month).where_clause(Some("s"));
        assert_eq!(
            clause,
            " WHERE 1=1 AND s.user_id = ? AND s.year = ? AND s.month = ?"
        );
        assert_eq!(params, vec![1, 2024, 3]);
    }

    #[test]
    fn test_single_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let mut query = "SELECT 1 FROM listening_sessions WHERE 1=1".to_string();
        let mut params = Vec::new();
        SessionFilter::day(UserId::new(2), date).apply(None, &mut query, &mut params);

        assert!(query.ends_with("AND year = ? AND month = ? AND day_of_month = ?"));
        assert_eq!(params, vec![2, 2024, 3, 17]);
    }
}
