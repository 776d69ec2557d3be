use crate::explain::Attribution;
use crate::features::ModelDomain;

/// Maps risk-driving features to operator guidance. Recommendations follow
/// the explanation: the features pushing risk up decide which texts are
/// returned, most influential first.
pub fn for_attributions(domain: ModelDomain, attributions: &[Attribution], limit: usize) -> Vec<String> {
    let picked: Vec<String> = attributions
        .iter()
        .filter(|a| a.contribution > 0.0)
        .filter_map(|a| advice(domain, &a.feature))
        .map(|s| s.to_string())
        .take(limit)
        .collect();

    if picked.is_empty() {
        // Nothing pushes risk up: fall back to the standing watch list
        default_recommendations(domain).iter().map(|s| s.to_string()).collect()
    } else {
        picked
    }
}

/// Standing per-domain watch lists, also served by the placeholder scorer.
pub fn default_recommendations(domain: ModelDomain) -> &'static [&'static str] {
    match domain {
        ModelDomain::Supplier => &[
            "Monitor onTimeDeliveryRate",
            "Verify financial health",
            "Check geopolitical factors",
        ],
        ModelDomain::Shipment => &[
            "Monitor ETA deviation",
            "Check weather conditions",
            "Verify carrier reliability",
        ],
        ModelDomain::Inventory => &[
            "Review safety stock levels",
            "Check demand forecast",
            "Monitor reorder point",
        ],
    }
}

fn advice(domain: ModelDomain, feature: &str) -> Option<&'static str> {
    let text = match (domain, feature) {
        (ModelDomain::Supplier, "onTimeDeliveryRate") => "Monitor onTimeDeliveryRate",
        (ModelDomain::Supplier, "financialScore") => "Verify financial health",
        (ModelDomain::Supplier, "defectRate") => "Audit quality controls for rising defect rate",
        (ModelDomain::Supplier, "disputeFrequency") => "Review open disputes with this supplier",
        (ModelDomain::Supplier, "geopoliticalRiskFlag") => "Check geopolitical factors",
        (ModelDomain::Supplier, "totalShipments") => "Limited shipment history, widen sourcing",
        (ModelDomain::Supplier, "averageDelayDays") => "Escalate recurring delivery delays",
        (ModelDomain::Supplier, "daysSinceLastShip") => "Confirm supplier is still active",
        (ModelDomain::Supplier, "activeShipmentCount") => "Rebalance load across suppliers",
        (ModelDomain::Supplier, "categoryRisk") => "Review category exposure",

        (ModelDomain::Shipment, "etaDeviationHours") => "Monitor ETA deviation",
        (ModelDomain::Shipment, "weatherLevel") => "Check weather conditions",
        (ModelDomain::Shipment, "carrierReliability") => "Verify carrier reliability",
        (ModelDomain::Shipment, "routeRisk") => "Evaluate alternate routing",
        (ModelDomain::Shipment, "transitDays") => "Review transit time against SLA",
        (ModelDomain::Shipment, "distanceKm") => "Consider staging stock closer to destination",
        (ModelDomain::Shipment, "handoffCount") => "Reduce carrier handoffs on this lane",
        (ModelDomain::Shipment, "customsFlag") => "Pre-clear customs documentation",
        (ModelDomain::Shipment, "priorDelayRate") => "Flag lane with recurring delays",
        (ModelDomain::Shipment, "valueUsd") => "Add insurance review for high-value cargo",

        (ModelDomain::Inventory, "currentStock") => "Review current stock position",
        (ModelDomain::Inventory, "averageDailyDemand") => "Check demand forecast",
        (ModelDomain::Inventory, "leadTimeDays") => "Negotiate shorter replenishment lead time",
        (ModelDomain::Inventory, "safetyStock") => "Review safety stock levels",
        (ModelDomain::Inventory, "reorderPoint") => "Monitor reorder point",
        (ModelDomain::Inventory, "demandVolatility") => "Buffer against demand volatility",
        (ModelDomain::Inventory, "daysOfSupply") => "Days of supply trending low, expedite replenishment",
        (ModelDomain::Inventory, "openPurchaseOrders") => "Chase open purchase orders",
        (ModelDomain::Inventory, "shelfLifeDays") => "Rotate stock ahead of shelf-life expiry",
        (ModelDomain::Inventory, "seasonalityIndex") => "Plan for seasonal demand swing",

        _ => return None,
    };
    Some(text)
}
