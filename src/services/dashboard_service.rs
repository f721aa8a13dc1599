// src/services/dashboard_service.rs

use chrono::{Days, Months, NaiveDate, NaiveTime, Utc};
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        dashboard::{DashboardMetrics, DateRange, ReportPoint, ReportResponse},
        tenancy::TenantId,
    },
};

const DEFAULT_PERIOD: &str = "monthly";

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_metrics<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
    ) -> Result<DashboardMetrics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.metrics(executor, tenant_id).await
    }

    /// Soma e contagem das vendas no intervalo fechado [start, end].
    pub async fn get_report<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        period: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ReportResponse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let range = resolve_range(start_date, end_date, Utc::now().date_naive());

        // [start 00:00, end + 1 dia 00:00)
        let from = range.start.and_time(NaiveTime::MIN).and_utc();
        let until = range
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(range.end)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let aggregate = self.repo.sales_between(executor, tenant_id, from, until).await?;

        Ok(ReportResponse {
            period: period
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_PERIOD)
                .to_string(),
            data: vec![ReportPoint {
                date: range.start,
                value: aggregate.value,
                count: aggregate.count,
            }],
        })
    }
}

// Datas ausentes ou inválidas: início = hoje - 1 mês, fim = hoje.
pub(crate) fn resolve_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> DateRange {
    let parse = |raw: Option<&str>| {
        raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    };

    let start = parse(start_date)
        .unwrap_or_else(|| today.checked_sub_months(Months::new(1)).unwrap_or(today));
    let end = parse(end_date).unwrap_or(today);

    DateRange { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_dates_are_used() {
        let range = resolve_range(Some("2025-01-01"), Some("2025-01-31"), day(2025, 6, 1));
        assert_eq!(range, DateRange { start: day(2025, 1, 1), end: day(2025, 1, 31) });
    }

    #[test]
    fn missing_dates_default_to_last_month() {
        let range = resolve_range(None, None, day(2025, 3, 15));
        assert_eq!(range, DateRange { start: day(2025, 2, 15), end: day(2025, 3, 15) });
    }

    #[test]
    fn unparsable_dates_fall_back_to_defaults() {
        let range = resolve_range(Some("ontem"), Some("15/03/2025"), day(2025, 3, 15));
        assert_eq!(range, DateRange { start: day(2025, 2, 15), end: day(2025, 3, 15) });
    }
}
