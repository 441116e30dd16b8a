use std::sync::Arc;

use crate::db::Database;
use crate::errors::AppResult;
use crate::models::{ConversionRates, IndustryPerformance, LocationPerformance, PipelineValue, WinRateReport};

/// Read-only metrics over the Lead -> Opportunity -> Quote -> Order funnel.
///
/// Every operation re-reads the underlying collections; nothing is cached
/// between calls. Percentages are rounded to two decimals and a zero
/// denominator always yields 0.0 rather than an error.
pub struct FunnelAnalytics {
    db: Arc<Database>,
}

impl FunnelAnalytics {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn conversion_rates(&self) -> AppResult<ConversionRates> {
        let total_leads = self.db.count_leads()?;
        let total_opportunities = self.db.count_opportunities()?;
        let total_quotes = self.db.count_quotes()?;
        let total_orders = self.db.count_orders()?;
        let total_won = self.db.count_won_orders()?;

        Ok(ConversionRates {
            total_leads,
            total_opportunities,
            total_quotes,
            total_orders,
            total_won,
            lead_to_opportunity: percentage(total_opportunities, total_leads),
            opportunity_to_quote: percentage(total_quotes, total_opportunities),
            quote_to_order: percentage(total_orders, total_quotes),
            order_win_rate: percentage(total_won, total_orders),
            overall_conversion: percentage(total_won, total_leads),
        })
    }

    pub fn win_rate(&self) -> AppResult<WinRateReport> {
        let won_orders = self.db.count_won_orders()?;
        let total_orders = self.db.count_orders()?;

        Ok(WinRateReport {
            won_orders,
            total_orders,
            win_rate: percentage(won_orders, total_orders),
        })
    }

    pub fn pipeline_value(&self) -> AppResult<PipelineValue> {
        let opportunities_value = self.db.sum_opportunity_values()?;
        let quotes_value = self.db.sum_quote_amounts()?;
        let won_value = self.db.sum_won_order_amounts()?;
        let total_closed_value = self.db.sum_order_amounts()?;

        // total_pipeline intentionally counts value at both the opportunity
        // and the quote stage; a deal that progressed appears in both sums.
        Ok(PipelineValue {
            opportunities_value: round2(opportunities_value),
            quotes_value: round2(quotes_value),
            won_value: round2(won_value),
            total_closed_value: round2(total_closed_value),
            total_pipeline: round2(opportunities_value + quotes_value),
        })
    }

    /// Segments the funnel by lead industry. Won orders and deal values are
    /// resolved through the full Order->Quote->Opportunity->Lead chain, so a
    /// lead with several opportunities is counted once per won descendant.
    pub fn performance_by_industry(&self) -> AppResult<Vec<IndustryPerformance>> {
        let industries = self.db.distinct_industries()?;
        let mut results = Vec::with_capacity(industries.len());

        for industry in industries {
            let leads = self.db.count_leads_by_industry(&industry)?;
            let won_orders = self.db.count_won_orders_by_industry(&industry)?;
            let avg_deal_value = self.db.avg_won_amount_by_industry(&industry)?;

            results.push(IndustryPerformance {
                win_rate: percentage(won_orders, leads),
                avg_deal_value: round2(avg_deal_value),
                industry,
                leads,
                won_orders,
            });
        }
        Ok(results)
    }

    /// Segments the funnel by lead location. The value metric here is the
    /// summed estimated value of all opportunities in the market, not the
    /// average of won deals as in the industry report.
    pub fn performance_by_location(&self) -> AppResult<Vec<LocationPerformance>> {
        let locations = self.db.distinct_locations()?;
        let mut results = Vec::with_capacity(locations.len());

        for location in locations {
            let leads = self.db.count_leads_by_location(&location)?;
            let won_orders = self.db.count_won_orders_by_location(&location)?;
            let pipeline_value = self.db.sum_pipeline_by_location(&location)?;

            results.push(LocationPerformance {
                win_rate: percentage(won_orders, leads),
                pipeline_value: round2(pipeline_value),
                location,
                leads,
                won_orders,
            });
        }
        Ok(results)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        round2(numerator as f64 / denominator as f64 * 100.0)
    } else {
        0.0
    }
}
