// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_products: i64,
    pub total_invoices: i64,
    pub revenue: Decimal,      // Soma dos totais das notas de venda
    pub low_stock_items: i64,  // Produtos com estoque < 10
}

// 2. Soma/contagem das vendas no intervalo
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SalesAggregate {
    pub value: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportPoint {
    pub date: NaiveDate,
    pub value: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub period: String,
    pub data: Vec<ReportPoint>,
}

// Intervalo fechado [start, end] em dias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
