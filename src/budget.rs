// 📊 Water Budget Planner
// Pure demand model: population, livestock and irrigated area in, daily demand
// breakdown out. Supply is set separately by the caller.

use crate::config::SupplyStandards;
use crate::round_dp;
use serde::{Deserialize, Serialize};

// ============================================================================
// BUDGET
// ============================================================================

/// Daily water budget, all figures in litres/day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub panchayat_id: String,
    pub year: i32,
    pub domestic_lpd: f64,
    /// Irrigation plus livestock
    pub agriculture_lpd: f64,
    /// Not modelled; always zero from `estimate_demand`
    pub industrial_lpd: f64,
    pub total_demand_lpd: f64,
    pub total_supply_lpd: f64,
}

impl Budget {
    pub fn with_supply(mut self, total_supply_lpd: f64) -> Self {
        self.total_supply_lpd = total_supply_lpd;
        self
    }

    pub fn for_panchayat(mut self, panchayat_id: impl Into<String>, year: i32) -> Self {
        self.panchayat_id = panchayat_id.into();
        self.year = year;
        self
    }

    /// Positive = surplus, negative = deficit. Whole litres.
    pub fn surplus_deficit(&self) -> f64 {
        round_dp(self.total_supply_lpd - self.total_demand_lpd, 0)
    }

    pub fn is_deficit(&self) -> bool {
        self.total_supply_lpd < self.total_demand_lpd
    }
}

// ============================================================================
// PLANNER
// ============================================================================

#[derive(Debug, Default)]
pub struct BudgetPlanner {
    standards: SupplyStandards,
}

impl BudgetPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standards(standards: SupplyStandards) -> Self {
        BudgetPlanner { standards }
    }

    /// Daily demand breakdown. Seasonal irrigation depth is spread over the
    /// whole year. Supply is left at zero.
    pub fn estimate_demand(
        &self,
        population: u64,
        livestock: u64,
        irrigated_hectares: f64,
    ) -> Budget {
        let s = &self.standards;

        let domestic = population as f64 * s.lpcd_required;
        let irrigation =
            irrigated_hectares * s.irrigation_mm_per_hectare * 1000.0 / s.days_per_year;
        let livestock_demand = livestock as f64 * s.livestock_lpd;
        let agriculture = irrigation + livestock_demand;

        Budget {
            domestic_lpd: round_dp(domestic, 0),
            agriculture_lpd: round_dp(agriculture, 0),
            industrial_lpd: 0.0,
            total_demand_lpd: round_dp(domestic + agriculture, 0),
            ..Budget::default()
        }
    }

    /// 0-100, where 100 means supply covers demand. Capped at 100; a budget
    /// with no demand is trivially sustainable.
    pub fn sustainability_index(&self, budget: &Budget) -> f64 {
        if budget.total_demand_lpd == 0.0 {
            return 100.0;
        }
        let ratio = budget.total_supply_lpd / budget.total_demand_lpd;
        round_dp((ratio * 100.0).min(100.0), 1)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_demand_breakdown() {
        let planner = BudgetPlanner::new();
        let budget = planner.estimate_demand(2800, 350, 60.0);

        assert_eq!(budget.domestic_lpd, 154_000.0);
        // 60 ha * 500 mm * 1000 / 365 = 82_192, plus 350 * 30 = 10_500
        assert_eq!(budget.agriculture_lpd, 92_692.0);
        assert_eq!(budget.industrial_lpd, 0.0);
        assert_eq!(budget.total_demand_lpd, 246_692.0);
        assert_eq!(budget.total_supply_lpd, 0.0);
    }

    #[test]
    fn test_sustainability_index() {
        let planner = BudgetPlanner::new();
        let budget = planner.estimate_demand(2800, 350, 60.0).with_supply(141_500.0);

        let index = planner.sustainability_index(&budget);
        assert!((index - 57.4).abs() < 0.05, "index was {}", index);
        assert!(budget.is_deficit());
        assert_eq!(budget.surplus_deficit(), -105_192.0);
    }

    #[test]
    fn test_sustainability_is_capped_at_100() {
        let planner = BudgetPlanner::new();
        let budget = planner.estimate_demand(100, 0, 0.0).with_supply(1_000_000.0);

        assert_eq!(planner.sustainability_index(&budget), 100.0);
        assert!(!budget.is_deficit());
        assert_eq!(budget.surplus_deficit(), 994_500.0);
    }

    #[test]
    fn test_no_demand_is_fully_sustainable() {
        let planner = BudgetPlanner::new();
        let budget = planner.estimate_demand(0, 0, 0.0);
        assert_eq!(budget.total_demand_lpd, 0.0);
        assert_eq!(planner.sustainability_index(&budget), 100.0);
    }

    #[test]
    fn test_livestock_only() {
        let budget = BudgetPlanner::new().estimate_demand(0, 100, 0.0);
        assert_eq!(budget.agriculture_lpd, 3_000.0);
        assert_eq!(budget.total_demand_lpd, 3_000.0);
    }

    #[test]
    fn test_custom_lpcd_standard() {
        let planner = BudgetPlanner::with_standards(SupplyStandards {
            lpcd_required: 70.0,
            ..SupplyStandards::default()
        });
        assert_eq!(planner.estimate_demand(1000, 0, 0.0).domestic_lpd, 70_000.0);
    }

    #[test]
    fn test_for_panchayat_sets_identity() {
        let budget = BudgetPlanner::new()
            .estimate_demand(10, 0, 0.0)
            .for_panchayat("GP001", 2024);
        assert_eq!(budget.panchayat_id, "GP001");
        assert_eq!(budget.year, 2024);
    }
}
