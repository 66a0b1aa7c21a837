use cdsim::rl::environment::{generate_spread_series, SyntheticConfig};
use cdsim::{
    EnvAction, Series, SimError, TerminationReason, TradingEnvConfig, TradingEnvironment,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn scenario_config() -> TradingEnvConfig {
    TradingEnvConfig {
        max_units: 3,
        initial_balance: 10_000.0,
        transaction_cost_rate: 0.0005,
        unit_pnl_multiplier: 100_000.0,
        min_balance_fraction: 0.5,
        warmup_rows: 0,
        min_episode_len: 1_000,
        ..Default::default()
    }
}

fn synthetic_series(rows: usize, seed: u64) -> Series {
    let config = SyntheticConfig {
        rows,
        volatility: 0.0005,
        jump_probability: 0.0,
        ..Default::default()
    };
    generate_spread_series(&config, seed).unwrap()
}

/// Config whose P&L is small enough that random episodes usually run long.
fn gentle_config() -> TradingEnvConfig {
    TradingEnvConfig {
        max_units: 4,
        unit_pnl_multiplier: 10_000.0,
        transaction_cost_rate: 0.0005,
        ..Default::default()
    }
}

/// Position stays within bounds and moves by at most one unit per step.
#[test]
fn position_bounded_for_random_actions() {
    let series = synthetic_series(400, 1);
    let config = gentle_config();
    let max_units = config.max_units;
    let mut env = TradingEnvironment::with_rng_seed(series, config, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(99);

    for episode in 0..20 {
        env.reset(Some(episode)).unwrap();
        let mut previous = env.shares_held();

        loop {
            let action = EnvAction::from_index(rng.gen_range(0..3)).unwrap();
            let result = env.step(action).unwrap();
            let shares = result.observation.shares_held;

            assert!((-max_units..=max_units).contains(&shares));
            assert!((shares - previous).abs() <= 1);
            previous = shares;

            if result.done {
                break;
            }
        }
    }
}

/// balance = initial + sum(mark-to-market P&L) - cost * trades
#[test]
fn balance_accounting_identity() {
    let series = synthetic_series(400, 2);
    let config = gentle_config();
    let cost = config.cost_per_unit();
    let initial = config.initial_balance;
    let mut env = TradingEnvironment::with_rng_seed(series, config, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    env.reset(Some(3)).unwrap();
    let mut pnl_sum = 0.0;
    let mut trades = 0usize;

    loop {
        let action = EnvAction::from_index(rng.gen_range(0..3)).unwrap();
        let result = env.step(action).unwrap();
        pnl_sum += result.info.pnl;
        if result.info.executed {
            trades += 1;
        }

        let expected = initial + pnl_sum - cost * trades as f64;
        assert!(
            (env.balance() - expected).abs() < 1e-6,
            "balance {} != expected {}",
            env.balance(),
            expected
        );

        if result.done {
            break;
        }
    }

    assert_eq!(trades, env.history().num_trades());
}

/// Same seed, same start index and first observation.
#[test]
fn reset_is_reproducible_per_seed() {
    let series = synthetic_series(600, 3);
    let config = TradingEnvConfig::default();

    let mut a = TradingEnvironment::with_rng_seed(series.clone(), config.clone(), 1).unwrap();
    let mut b = TradingEnvironment::with_rng_seed(series, config, 2).unwrap();

    let (obs_a, info_a) = a.reset(Some(1234)).unwrap();
    a.step(EnvAction::BuyProtection).unwrap();
    let (obs_a2, info_a2) = a.reset(Some(1234)).unwrap();
    let (obs_b, info_b) = b.reset(Some(1234)).unwrap();

    assert_eq!(info_a.start_index, info_a2.start_index);
    assert_eq!(info_a.start_index, info_b.start_index);
    assert_eq!(obs_a, obs_a2);
    assert_eq!(obs_a, obs_b);
}

/// Unseeded resets are reproducible given the instance RNG seed.
#[test]
fn unseeded_resets_follow_instance_rng() {
    let series = synthetic_series(600, 4);
    let config = TradingEnvConfig::default();

    let mut a = TradingEnvironment::with_rng_seed(series.clone(), config.clone(), 77).unwrap();
    let mut b = TradingEnvironment::with_rng_seed(series, config, 77).unwrap();

    for _ in 0..5 {
        let (_, info_a) = a.reset(None).unwrap();
        let (_, info_b) = b.reset(None).unwrap();
        assert_eq!(info_a.seed, info_b.seed);
        assert_eq!(info_a.start_index, info_b.start_index);
    }
}

/// On the last row, step reports done with zero reward and changes nothing.
#[test]
fn last_row_ends_episode_without_state_change() {
    let series = Series::from_prices(&[1.0, 1.0, 1.2], 1).unwrap();

    for action in EnvAction::all() {
        let mut env = TradingEnvironment::with_rng_seed(series.clone(), scenario_config(), 0)
            .unwrap();
        env.reset(Some(0)).unwrap();
        env.step(EnvAction::BuyProtection).unwrap();
        env.step(EnvAction::Hold).unwrap();
        assert_eq!(env.current_index(), 2);

        let balance = env.balance();
        let shares = env.shares_held();
        let result = env.step(*action).unwrap();

        assert!(result.done);
        assert!(!result.truncated);
        assert_eq!(result.reward, 0.0);
        assert_eq!(result.info.termination, Some(TerminationReason::EndOfData));
        assert_eq!(env.balance(), balance);
        assert_eq!(env.shares_held(), shares);
        assert_eq!(env.current_index(), 2);
    }
}

/// A step that drives balance below zero reports ruin, not drawdown.
#[test]
fn ruin_takes_precedence_over_drawdown() {
    let series = Series::from_prices(&[1.0, 1.0, 0.5, 0.5], 1).unwrap();
    let mut env = TradingEnvironment::with_rng_seed(series, scenario_config(), 0).unwrap();
    env.reset(Some(0)).unwrap();
    env.step(EnvAction::BuyProtection).unwrap();

    let result = env.step(EnvAction::Hold).unwrap();
    let pnl = -0.5 * 100_000.0;

    assert!(result.done);
    assert_eq!(result.info.termination, Some(TerminationReason::Ruin));
    assert!(env.balance() < 0.0);
    assert!((result.reward - (pnl - 0.5 * 10_000.0)).abs() < 1e-6);
}

/// initial 10000, multiplier 100000, cost rate 0.0005 => 50 per unit.
#[test]
fn reference_scenario() {
    let series = Series::from_prices(&[1.0, 1.0, 2.0, 2.0], 1).unwrap();
    let config = scenario_config();
    assert!((config.cost_per_unit() - 50.0).abs() < 1e-9);

    let mut env = TradingEnvironment::with_rng_seed(series, config, 0).unwrap();
    let (obs, info) = env.reset(Some(5)).unwrap();
    assert_eq!(info.initial_balance, 10_000.0);
    assert_eq!(obs.balance, 10_000.0);
    assert_eq!(obs.shares_held, 0);

    let result = env.step(EnvAction::BuyProtection).unwrap();
    assert!((result.observation.balance - 9_950.0).abs() < 1e-9);
    assert_eq!(result.observation.shares_held, 1);
    assert_eq!(result.reward, 0.0);

    let result = env.step(EnvAction::Hold).unwrap();
    assert!((result.reward - 100_000.0).abs() < 1e-6);
    assert!((result.observation.balance - 109_950.0).abs() < 1e-6);
    assert_eq!(
        result.observation.as_array(),
        [2.0, result.observation.indicator, 1.0, result.observation.balance, 1.0]
    );
}

/// Price collapse drives balance negative: done, reward = pnl - 0.5 * initial.
#[test]
fn price_collapse_scenario() {
    let series = Series::from_prices(&[1.0, 1.0, 1.0, 0.8], 1).unwrap();
    let mut env = TradingEnvironment::with_rng_seed(series, scenario_config(), 0).unwrap();
    env.reset(Some(0)).unwrap();
    env.step(EnvAction::BuyProtection).unwrap();
    env.step(EnvAction::Hold).unwrap();

    let result = env.step(EnvAction::Hold).unwrap();
    let pnl = result.info.pnl;

    assert!(result.done);
    assert!(pnl < -19_999.0);
    assert!((result.reward - (pnl - 5_000.0)).abs() < 1e-9);

    let err = env.step(EnvAction::Hold).unwrap_err();
    assert!(matches!(err, SimError::IllegalState(_)));
}

/// Series shorter than warm-up plus one step is a configuration error.
#[test]
fn short_series_is_rejected() {
    let series = Series::from_prices(&[1.0; 10], 14).unwrap();
    let err = TradingEnvironment::new(series, TradingEnvConfig::default()).unwrap_err();
    assert!(matches!(err, SimError::Configuration(_)));
}

/// Short series start at the warm-up boundary and accept a short episode.
#[test]
fn short_series_starts_at_warmup() {
    let series = synthetic_series(40, 5);
    let mut env =
        TradingEnvironment::with_rng_seed(series, TradingEnvConfig::default(), 0).unwrap();

    for seed in 0..10 {
        let (_, info) = env.reset(Some(seed)).unwrap();
        assert_eq!(info.start_index, 14);
    }
    assert_eq!(env.max_steps(), 40 - 14);
}
