//! # Sales Report Loader
//!
//! Fetches the sales of a period from a [`SaleStore`] and projects them
//! with [`till_core::build_report`].

use chrono::FixedOffset;
use tracing::debug;

use till_core::{build_report, ReportPeriod, SaleStore, SalesReport};

use crate::error::SessionResult;

/// Report for `period`, with days counted in the store's `offset`.
pub async fn sales_report<S>(
    sales: &S,
    period: ReportPeriod,
    offset: FixedOffset,
) -> SessionResult<SalesReport>
where
    S: SaleStore + ?Sized,
{
    let (from, to) = period.utc_bounds(offset);
    let loaded = sales.list_sales(from, to).await?;
    debug!(count = loaded.len(), %from, %to, "Loaded sales for report");

    Ok(build_report(&loaded, period, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySaleStore;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use till_core::{PaymentMethod, Sale, SaleItem, SaleStatus};

    fn sale(id: &str, created_at: DateTime<Utc>, total_cents: i64) -> Sale {
        Sale {
            id: id.to_string(),
            items: vec![SaleItem {
                product_id: "A".to_string(),
                product_name: "Arroz".to_string(),
                quantity: 1,
                unit_price_cents: total_cents,
                subtotal_cents: total_cents,
            }],
            subtotal_cents: total_cents,
            discount_bps: 0,
            discount_cents: 0,
            total_cents,
            payment_method: PaymentMethod::Pix,
            status: SaleStatus::Completed,
            cashier_id: "u-1".to_string(),
            cashier_name: "Ana".to_string(),
            customer_id: None,
            customer_name: None,
            created_at,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_report_uses_local_days() {
        let store = InMemorySaleStore::new();
        // 02:00 UTC on March 1st is still February 28th in UTC-3
        store
            .record_sale(&sale("s-feb", Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap(), 999))
            .await
            .unwrap();
        store
            .record_sale(&sale("s-mar", Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(), 1000))
            .await
            .unwrap();

        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let march = ReportPeriod::current_month(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        let report = sales_report(&store, march, offset).await.unwrap();

        assert_eq!(report.resumo.total_vendas, 1);
        assert_eq!(report.resumo.faturamento.cents(), 1000);
        assert_eq!(report.formas_pagamento.get("pix"), Some(&1));
    }
}
