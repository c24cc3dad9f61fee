//! Grouped aggregations over the stores, shaped for the dashboard client.

use chrono::{DateTime, Duration, Utc};
use libman_persistence::{Database, PersistenceResult};
use serde::Serialize;

/// Time window for the most-borrowed ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    All,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Period::All),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    /// Earliest borrow date included in the window, if bounded.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::All => None,
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(now - Duration::days(30)),
            Period::Year => Some(now - Duration::days(365)),
        }
    }
}

/// Dashboard headline counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_books: i64,
    /// Sum of copies currently on shelves
    pub available_books: i64,
    pub total_users: i64,
    pub active_borrows: i64,
    pub total_transactions: i64,
    pub overdue_books: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronTypeCount {
    pub user_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub overview: Overview,
    pub popular_categories: Vec<CategoryCount>,
    pub user_type_stats: Vec<PatronTypeCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostBorrowedRow {
    pub title: String,
    pub author: String,
    pub category: String,
    pub borrow_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronTypeActivity {
    pub user_type: String,
    pub total_borrows: i64,
    pub unique_users: i64,
    /// Mean days between borrow and return, over returned loans
    pub average_borrow_duration: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPattern {
    /// Calendar month, 1-12, aggregated across years
    pub month: i64,
    pub total_transactions: i64,
    pub average_borrow_duration: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportRow {
    pub month: i64,
    pub total_borrows: i64,
    pub total_returns: i64,
    pub total_overdue: i64,
}

/// Read-only reporting over the stores.
#[derive(Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Headline counters plus category and patron-type breakdowns.
    pub async fn dashboard(&self) -> PersistenceResult<DashboardReport> {
        let pool = self.db.pool();
        let now = Utc::now();

        let total_books =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books").fetch_one(pool).await?;
        let available_books = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(available_copies), 0) FROM books",
        )
        .fetch_one(pool)
        .await?;
        let total_users =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patrons").fetch_one(pool).await?;
        let active_borrows = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM loans WHERE status IN ('borrowed', 'overdue')",
        )
        .fetch_one(pool)
        .await?;
        let total_transactions =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM loans").fetch_one(pool).await?;
        let overdue_books = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE status = 'overdue'
               OR (status = 'borrowed' AND due_date < ?)
            "#,
        )
        .bind(now)
        .fetch_one(pool)
        .await?;

        let popular_categories = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT b.category, COUNT(*) AS borrow_count
            FROM loans l
            JOIN books b ON b.id = l.book_id
            GROUP BY b.category
            ORDER BY borrow_count DESC, b.category
            LIMIT 5
            "#,
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

        let user_type_stats = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.patron_type, COUNT(*) AS borrow_count
            FROM loans l
            JOIN patrons p ON p.id = l.patron_id
            GROUP BY p.patron_type
            ORDER BY borrow_count DESC, p.patron_type
            "#,
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(user_type, count)| PatronTypeCount { user_type, count })
        .collect();

        Ok(DashboardReport {
            overview: Overview {
                total_books,
                available_books,
                total_users,
                active_borrows,
                total_transactions,
                overdue_books,
            },
            popular_categories,
            user_type_stats,
        })
    }

    /// Titles ranked by borrow count inside the period window.
    pub async fn most_borrowed(
        &self,
        limit: i64,
        period: Period,
    ) -> PersistenceResult<Vec<MostBorrowedRow>> {
        let cutoff = period.cutoff(Utc::now());
        let where_clause = if cutoff.is_some() {
            " WHERE l.borrow_date >= ?"
        } else {
            ""
        };
        let sql = format!(
            r#"
            SELECT b.title, b.author, b.category, COUNT(*) AS borrow_count
            FROM loans l
            JOIN books b ON b.id = l.book_id
            {where_clause}
            GROUP BY b.id
            ORDER BY borrow_count DESC, b.title
            LIMIT ?
            "#
        );

        let mut query = sqlx::query_as::<_, (String, String, String, i64)>(&sql);
        if let Some(cutoff) = cutoff {
            query = query.bind(cutoff);
        }
        let rows = query.bind(limit).fetch_all(self.db.pool()).await?;

        Ok(rows
            .into_iter()
            .map(|(title, author, category, borrow_count)| MostBorrowedRow {
                title,
                author,
                category,
                borrow_count,
            })
            .collect())
    }

    /// Borrowing totals, patron reach and mean loan duration per type.
    pub async fn patron_type_activity(&self) -> PersistenceResult<Vec<PatronTypeActivity>> {
        let rows = sqlx::query_as::<_, (String, i64, i64, Option<f64>)>(
            r#"
            SELECT p.patron_type,
                   COUNT(*) AS total_borrows,
                   COUNT(DISTINCT p.id) AS unique_users,
                   AVG(CASE WHEN l.return_date IS NOT NULL
                            THEN julianday(l.return_date) - julianday(l.borrow_date)
                       END) AS avg_days
            FROM loans l
            JOIN patrons p ON p.id = l.patron_id
            GROUP BY p.patron_type
            ORDER BY total_borrows DESC, p.patron_type
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_type, total_borrows, unique_users, avg)| PatronTypeActivity {
                user_type,
                total_borrows,
                unique_users,
                average_borrow_duration: avg.unwrap_or(0.0),
            })
            .collect())
    }

    /// Activity per calendar month, aggregated across all years.
    pub async fn reading_patterns(&self) -> PersistenceResult<Vec<MonthlyPattern>> {
        let rows = sqlx::query_as::<_, (i64, i64, Option<f64>)>(
            r#"
            SELECT CAST(strftime('%m', l.borrow_date) AS INTEGER) AS month,
                   COUNT(*) AS total_transactions,
                   AVG(CASE WHEN l.return_date IS NOT NULL
                            THEN julianday(l.return_date) - julianday(l.borrow_date)
                       END) AS avg_days
            FROM loans l
            GROUP BY month
            ORDER BY month
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(month, total_transactions, avg)| MonthlyPattern {
                month,
                total_transactions,
                average_borrow_duration: avg.unwrap_or(0.0),
            })
            .collect())
    }

    /// Borrows, returns and overdue counts for every month of `year`.
    /// Always yields twelve rows so charts can plot the full year.
    pub async fn monthly_report(&self, year: i32) -> PersistenceResult<Vec<MonthlyReportRow>> {
        let pool = self.db.pool();
        let now = Utc::now();

        let borrows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT CAST(strftime('%m', borrow_date) AS INTEGER) AS month, COUNT(*)
            FROM loans
            WHERE CAST(strftime('%Y', borrow_date) AS INTEGER) = ?
            GROUP BY month
            "#,
        )
        .bind(year)
        .fetch_all(pool)
        .await?;

        let returns = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT CAST(strftime('%m', return_date) AS INTEGER) AS month, COUNT(*)
            FROM loans
            WHERE return_date IS NOT NULL
              AND CAST(strftime('%Y', return_date) AS INTEGER) = ?
            GROUP BY month
            "#,
        )
        .bind(year)
        .fetch_all(pool)
        .await?;

        // Overdue bucketed by the month the loan was due: counts entries
        // returned late plus entries still out past their due date.
        let overdue = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT CAST(strftime('%m', due_date) AS INTEGER) AS month, COUNT(*)
            FROM loans
            WHERE CAST(strftime('%Y', due_date) AS INTEGER) = ?
              AND (status = 'overdue'
                   OR (return_date IS NOT NULL AND return_date > due_date)
                   OR (status = 'borrowed' AND due_date < ?))
            GROUP BY month
            "#,
        )
        .bind(year)
        .bind(now)
        .fetch_all(pool)
        .await?;

        let mut report: Vec<MonthlyReportRow> = (1..=12)
            .map(|month| MonthlyReportRow {
                month,
                total_borrows: 0,
                total_returns: 0,
                total_overdue: 0,
            })
            .collect();
        for (month, count) in borrows {
            if let Some(row) = report.get_mut((month - 1) as usize) {
                row.total_borrows = count;
            }
        }
        for (month, count) in returns {
            if let Some(row) = report.get_mut((month - 1) as usize) {
                row.total_returns = count;
            }
        }
        for (month, count) in overdue {
            if let Some(row) = report.get_mut((month - 1) as usize) {
                row.total_overdue = count;
            }
        }

        Ok(report)
    }
}
