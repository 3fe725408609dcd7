//! Pure economy math: income, upkeep, recruitment, desertions

use crate::core::config::GameConfig;

/// Per-turn income from owned provinces.
///
/// Unsupplied provinces contribute a reduced share; each blockade in
/// force shaves a further slice off the total.
pub fn income(
    config: &GameConfig,
    supplied_gdp: i64,
    unsupplied_gdp: i64,
    tech: u8,
    blockades: usize,
) -> i64 {
    let base = supplied_gdp as f64
        + unsupplied_gdp as f64 * config.unsupplied_income_share;
    let teched = base * (1.0 + tech as f64 * config.tech_income_bonus);
    let blockaded =
        teched * (1.0 - config.blockade_income_penalty).powi(blockades as i32);
    blockaded.floor() as i64
}

/// Per-turn upkeep for the standing army and the tech establishment
pub fn maintenance(config: &GameConfig, military: i64, tech: u8) -> i64 {
    military * config.troop_maintenance + tech as i64 * config.tech_maintenance
}

/// Cost of recruiting `batch` K troops at the given tech level
pub fn recruit_cost(config: &GameConfig, batch: i64, tech: u8) -> i64 {
    let discount = (1.0 - tech as f64 * config.tech_recruit_discount).max(0.5);
    ((batch * config.recruit_cost) as f64 * discount).ceil() as i64
}

/// Troops lost when the treasury cannot cover upkeep
pub fn desertions(config: &GameConfig, military: i64) -> i64 {
    if military <= 0 {
        return 0;
    }
    ((military as f64 * config.desertion_rate).ceil() as i64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_income_rewards_tech() {
        let cfg = config();
        assert!(income(&cfg, 100, 0, 5, 0) > income(&cfg, 100, 0, 0, 0));
    }

    #[test]
    fn test_unsupplied_gdp_discounted() {
        let cfg = config();
        assert_eq!(income(&cfg, 100, 0, 0, 0), 100);
        assert_eq!(income(&cfg, 0, 100, 0, 0), 50);
    }

    #[test]
    fn test_blockades_compound() {
        let cfg = config();
        let open = income(&cfg, 100, 0, 0, 0);
        let one = income(&cfg, 100, 0, 0, 1);
        let two = income(&cfg, 100, 0, 0, 2);
        assert!(open > one && one > two);
    }

    #[test]
    fn test_recruit_discount_floors_at_half() {
        let cfg = config();
        let max_tech = recruit_cost(&cfg, 5, 10);
        assert_eq!(max_tech, (5 * cfg.recruit_cost) / 2);
    }

    #[test]
    fn test_desertions_at_least_one() {
        let cfg = config();
        assert_eq!(desertions(&cfg, 1), 1);
        assert_eq!(desertions(&cfg, 0), 0);
        assert_eq!(desertions(&cfg, 100), 10);
    }
}
