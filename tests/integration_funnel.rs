use std::sync::Arc;

use salespipe::csv_io;
use salespipe::seed::populate_sample_data;
use salespipe::{Database, FunnelAnalytics};

fn seeded_analytics() -> (tempfile::TempDir, Arc<Database>, FunnelAnalytics) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Arc::new(Database::new(&dir.path().join("funnel.db")).expect("db"));
    populate_sample_data(&db).expect("seed");
    (dir, db.clone(), FunnelAnalytics::new(db))
}

#[test]
fn seeded_funnel_reports_expected_conversion_rates() {
    let (_dir, _db, analytics) = seeded_analytics();
    let rates = analytics.conversion_rates().expect("conversion rates");

    assert_eq!(rates.total_leads, 8);
    assert_eq!(rates.total_opportunities, 5);
    assert_eq!(rates.total_quotes, 3);
    assert_eq!(rates.total_orders, 3);
    assert_eq!(rates.total_won, 2);

    assert_eq!(rates.lead_to_opportunity, 62.5);
    assert_eq!(rates.opportunity_to_quote, 60.0);
    assert_eq!(rates.quote_to_order, 100.0);
    assert_eq!(rates.order_win_rate, 66.67);
    assert_eq!(rates.overall_conversion, 25.0);
}

#[test]
fn seeded_funnel_reports_expected_pipeline_value() {
    let (_dir, _db, analytics) = seeded_analytics();
    let value = analytics.pipeline_value().expect("pipeline value");

    assert_eq!(value.opportunities_value, 650_000.0);
    assert_eq!(value.quotes_value, 319_000.0);
    assert_eq!(value.won_value, 232_000.0);
    assert_eq!(value.total_closed_value, 232_000.0);
    assert_eq!(value.total_pipeline, 969_000.0);
}

#[test]
fn seeded_funnel_segments_by_industry_and_location() {
    let (_dir, _db, analytics) = seeded_analytics();

    let industries = analytics.performance_by_industry().expect("by industry");
    let automotive = industries
        .iter()
        .find(|segment| segment.industry == "automotive")
        .expect("automotive segment");
    assert_eq!(automotive.leads, 3);
    assert_eq!(automotive.won_orders, 2);
    assert_eq!(automotive.win_rate, 66.67);
    assert_eq!(automotive.avg_deal_value, 116_000.0);

    let locations = analytics.performance_by_location().expect("by location");
    let germany = locations
        .iter()
        .find(|segment| segment.location == "Germany")
        .expect("germany segment");
    assert_eq!(germany.leads, 2);
    assert_eq!(germany.won_orders, 2);
    assert_eq!(germany.win_rate, 100.0);
    assert_eq!(germany.pipeline_value, 245_000.0);

    // Benelux never closed a deal, yet its open opportunity still counts
    // toward location pipeline.
    let benelux = locations
        .iter()
        .find(|segment| segment.location == "Benelux")
        .expect("benelux segment");
    assert_eq!(benelux.won_orders, 0);
    assert_eq!(benelux.win_rate, 0.0);
    assert_eq!(benelux.pipeline_value, 120_000.0);
}

#[test]
fn win_rate_report_matches_seeded_orders() {
    let (_dir, _db, analytics) = seeded_analytics();
    let report = analytics.win_rate().expect("win rate");

    assert_eq!(report.won_orders, 2);
    assert_eq!(report.total_orders, 3);
    assert_eq!(report.win_rate, 66.67);
}

#[test]
fn exported_leads_can_rebuild_a_lead_book() {
    let (dir, db, _analytics) = seeded_analytics();

    let csv_path = dir.path().join("leads.csv");
    let exported = csv_io::export_leads(&db, &csv_path).expect("export");
    assert_eq!(exported, 8);

    let rebuilt = Database::new(&dir.path().join("rebuilt.db")).expect("rebuilt db");
    let imported = csv_io::import_leads(&rebuilt, &csv_path).expect("import");
    assert_eq!(imported, 8);

    let original = db.list_leads().expect("original leads");
    let copied = rebuilt.list_leads().expect("copied leads");
    assert_eq!(original.len(), copied.len());
    for (a, b) in original.iter().zip(copied.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.email, b.email);
        assert_eq!(a.industry, b.industry);
        assert_eq!(a.location, b.location);
        assert_eq!(a.company_size, b.company_size);
    }
}
