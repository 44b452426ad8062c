//! # Sales Report
//!
//! A pure projection over sales for a date period.
//!
//! ## Output Shape
//! ```text
//! {
//!   "periodo":  { "inicio": "2024-03-01", "fim": "2024-03-31" },
//!   "resumo":   { "totalVendas": 42, "faturamento": 123450, "ticketMedio": 2939 },
//!   "produtosMaisVendidos": [ { "id", "name", "quantity", "revenue" }, ... ],   (top 10)
//!   "vendasPorDia":   { "2024-03-01": 10500, ... },
//!   "formasPagamento": { "cash": 30, "pix": 12 }
//! }
//! ```
//!
//! Money is in centavos. Only completed sales count. A sale belongs to the
//! day of its `created_at` in the store's UTC offset.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Sale, SaleStatus};
use crate::TOP_PRODUCTS_LIMIT;

// =============================================================================
// Report Types
// =============================================================================

/// Inclusive date range, in local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub inicio: NaiveDate,
    pub fim: NaiveDate,
}

impl ReportPeriod {
    pub fn new(inicio: NaiveDate, fim: NaiveDate) -> Self {
        ReportPeriod { inicio, fim }
    }

    /// First to last day of `today`'s month.
    pub fn current_month(today: NaiveDate) -> Self {
        let inicio = today.with_day(1).unwrap_or(today);
        let next_month = if today.month() == 12 {
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
        };
        let fim = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(today);
        ReportPeriod { inicio, fim }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.inicio <= date && date <= self.fim
    }

    /// UTC instants `[from, to)` covering the period at `offset`.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let start_of = |date: NaiveDate| {
            let local = date.and_hms_opt(0, 0, 0).unwrap_or_default();
            offset
                .from_local_datetime(&local)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        };
        let from = start_of(self.inicio);
        let to = start_of(self.fim) + Duration::days(1);
        (from, to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_vendas: u64,
    pub faturamento: Money,
    /// faturamento / totalVendas, rounded half up; zero with no sales.
    pub ticket_medio: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// The exported report document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub periodo: ReportPeriod,
    pub resumo: ReportSummary,
    pub produtos_mais_vendidos: Vec<ProductPerformance>,
    pub vendas_por_dia: BTreeMap<NaiveDate, Money>,
    pub formas_pagamento: BTreeMap<String, u64>,
}

// =============================================================================
// Projection
// =============================================================================

/// Builds the report for `period` from any collection of sales.
///
/// Sales outside the period or not completed are skipped, so callers may
/// pass a superset.
pub fn build_report(sales: &[Sale], period: ReportPeriod, offset: FixedOffset) -> SalesReport {
    let in_range: Vec<(&Sale, NaiveDate)> = sales
        .iter()
        .filter(|s| s.status == SaleStatus::Completed)
        .map(|s| (s, s.created_at.with_timezone(&offset).date_naive()))
        .filter(|(_, day)| period.contains(*day))
        .collect();

    let total_vendas = in_range.len() as u64;
    let faturamento: Money = in_range.iter().map(|(s, _)| s.total()).sum();
    let ticket_medio = if total_vendas == 0 {
        Money::zero()
    } else {
        let n = total_vendas as i64;
        Money::from_cents((faturamento.cents() + n / 2) / n)
    };

    let mut by_product: HashMap<&str, ProductPerformance> = HashMap::new();
    let mut vendas_por_dia: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    let mut formas_pagamento: BTreeMap<String, u64> = BTreeMap::new();

    for (sale, day) in &in_range {
        for item in &sale.items {
            let entry = by_product
                .entry(item.product_id.as_str())
                .or_insert_with(|| ProductPerformance {
                    id: item.product_id.clone(),
                    name: item.product_name.clone(),
                    quantity: 0,
                    revenue: Money::zero(),
                });
            entry.quantity += item.quantity;
            entry.revenue += item.subtotal();
        }

        *vendas_por_dia.entry(*day).or_default() += sale.total();
        *formas_pagamento
            .entry(sale.payment_method.as_str().to_string())
            .or_default() += 1;
    }

    let mut produtos_mais_vendidos: Vec<ProductPerformance> = by_product.into_values().collect();
    produtos_mais_vendidos.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.quantity.cmp(&a.quantity))
            .then_with(|| a.id.cmp(&b.id))
    });
    produtos_mais_vendidos.truncate(TOP_PRODUCTS_LIMIT);

    SalesReport {
        periodo: period,
        resumo: ReportSummary {
            total_vendas,
            faturamento,
            ticket_medio,
        },
        produtos_mais_vendidos,
        vendas_por_dia,
        formas_pagamento,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleItem};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale_at(
        created_at: DateTime<Utc>,
        method: PaymentMethod,
        status: SaleStatus,
        items: &[(&str, i64, i64)],
    ) -> Sale {
        let items: Vec<SaleItem> = items
            .iter()
            .map(|(id, qty, price)| SaleItem {
                product_id: id.to_string(),
                product_name: format!("Produto {}", id),
                quantity: *qty,
                unit_price_cents: *price,
                subtotal_cents: qty * price,
            })
            .collect();
        let total: i64 = items.iter().map(|i| i.subtotal_cents).sum();
        Sale {
            id: format!("s-{}", created_at.timestamp()),
            items,
            subtotal_cents: total,
            discount_bps: 0,
            discount_cents: 0,
            total_cents: total,
            payment_method: method,
            status,
            cashier_id: "u-1".to_string(),
            cashier_name: "Ana".to_string(),
            customer_id: None,
            customer_name: None,
            created_at,
            cancelled_at: None,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_report_totals_and_breakdowns() {
        let sales = vec![
            sale_at(utc(2024, 3, 1, 12), PaymentMethod::Cash, SaleStatus::Completed, &[("A", 2, 1000)]),
            sale_at(utc(2024, 3, 1, 15), PaymentMethod::Pix, SaleStatus::Completed, &[("B", 1, 500), ("A", 1, 1000)]),
            sale_at(utc(2024, 3, 2, 12), PaymentMethod::Cash, SaleStatus::Cancelled, &[("A", 5, 1000)]),
            sale_at(utc(2024, 4, 1, 12), PaymentMethod::Card, SaleStatus::Completed, &[("C", 1, 9999)]),
        ];
        let period = ReportPeriod::new(date(2024, 3, 1), date(2024, 3, 31));

        let report = build_report(&sales, period, FixedOffset::east_opt(0).unwrap());

        assert_eq!(report.resumo.total_vendas, 2);
        assert_eq!(report.resumo.faturamento.cents(), 3500);
        assert_eq!(report.resumo.ticket_medio.cents(), 1750);
        assert_eq!(report.produtos_mais_vendidos[0].id, "A");
        assert_eq!(report.produtos_mais_vendidos[0].quantity, 3);
        assert_eq!(report.produtos_mais_vendidos[0].revenue.cents(), 3000);
        assert_eq!(report.vendas_por_dia[&date(2024, 3, 1)].cents(), 3500);
        assert_eq!(report.formas_pagamento["cash"], 1);
        assert_eq!(report.formas_pagamento["pix"], 1);
        assert!(!report.formas_pagamento.contains_key("card"));
    }

    #[test]
    fn test_days_follow_store_offset() {
        // 01:00 UTC on the 2nd is still the 1st in São Paulo (UTC-3).
        let sales = vec![sale_at(
            utc(2024, 3, 2, 1),
            PaymentMethod::Cash,
            SaleStatus::Completed,
            &[("A", 1, 100)],
        )];
        let period = ReportPeriod::new(date(2024, 3, 1), date(2024, 3, 1));
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();

        let report = build_report(&sales, period, offset);
        assert_eq!(report.resumo.total_vendas, 1);

        let (from, to) = period.utc_bounds(offset);
        assert_eq!(from, utc(2024, 3, 1, 3));
        assert_eq!(to, utc(2024, 3, 2, 3));
    }

    #[test]
    fn test_top_products_limited_to_ten() {
        let ids: Vec<String> = (0..15).map(|i| format!("p{:02}", i)).collect();
        let sales: Vec<Sale> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                sale_at(
                    utc(2024, 3, 10, 10),
                    PaymentMethod::Card,
                    SaleStatus::Completed,
                    &[(id.as_str(), 1, 100 + i as i64)],
                )
            })
            .collect();
        let period = ReportPeriod::current_month(date(2024, 3, 15));

        let report = build_report(&sales, period, FixedOffset::east_opt(0).unwrap());

        assert_eq!(report.produtos_mais_vendidos.len(), TOP_PRODUCTS_LIMIT);
        assert_eq!(report.produtos_mais_vendidos[0].id, "p14");
    }

    #[test]
    fn test_empty_report_and_json_shape() {
        let period = ReportPeriod::current_month(date(2024, 2, 10));
        assert_eq!(period.fim, date(2024, 2, 29));

        let report = build_report(&[], period, FixedOffset::east_opt(0).unwrap());
        assert_eq!(report.resumo.ticket_medio, Money::zero());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["periodo"]["inicio"], "2024-02-01");
        assert_eq!(json["resumo"]["totalVendas"], 0);
        assert!(json["produtosMaisVendidos"].as_array().unwrap().is_empty());
        assert!(json["vendasPorDia"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_current_month_december() {
        let period = ReportPeriod::current_month(date(2024, 12, 5));
        assert_eq!(period.inicio, date(2024, 12, 1));
        assert_eq!(period.fim, date(2024, 12, 31));
    }
}
