//! Simulated paths checked against `simulate.ets` from the R `forecast`
//! package, fitted to the fpp2 `austourists` data.

mod common;

use anofox_holtwinters::prelude::*;
use anofox_holtwinters::models::exponential::DistributionFamily;
use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

/// `np.random.seed(0); np.random.randn(4)`
const INNOVATIONS: [f64; 4] = [1.76405235, 0.40015721, 0.97873798, 2.2408932];

/// Final smoothing state of an R fit: weights, level, slope and the four
/// most recent seasons, newest first.
struct RState {
    model: &'static str,
    damped: bool,
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
    level: f64,
    slope: f64,
    seasons: [f64; 4],
    expected: [f64; 4],
}

const NA: f64 = f64::NAN;

const R_STATES: &[RState] = &[
    RState {
        model: "AAA",
        damped: true,
        alpha: 0.35445427317618,
        beta: 0.0320074905894167,
        gamma: 0.399933869627979,
        phi: 0.979999965983533,
        level: 62.003405788717,
        slope: 0.706524957599738,
        seasons: [3.58786406600866, -0.0747450283892903, -11.7569356589817, 13.3818805055271],
        expected: [77.84173, 52.69818, 65.83254, 71.85204],
    },
    RState {
        model: "MAA",
        damped: true,
        alpha: 0.31114284033284,
        beta: 0.0472138763848083,
        gamma: 0.309502324693322,
        phi: 0.870889202791893,
        level: 59.2902342851514,
        slope: 0.62538315801909,
        seasons: [5.66660224738038, 2.16097311633352, -9.20020909069337, 15.3505801601698],
        expected: [207.81653, 136.97700, 253.56234, 588.95800],
    },
    RState {
        model: "MAM",
        damped: true,
        alpha: 0.483975835390643,
        beta: 0.00351728130401287,
        gamma: 0.00011309784353818,
        phi: 0.979999998322032,
        level: 63.0042707536293,
        slope: 0.275035160634846,
        seasons: [1.03531670491486, 0.960515682506077, 0.770086097577864, 1.23412213281709],
        expected: [215.83822, 127.17132, 269.09483, 704.32105],
    },
    RState {
        model: "MMM",
        damped: true,
        alpha: 0.523526123191035,
        beta: 0.000100021136675999,
        gamma: 0.000100013723372502,
        phi: 0.971025672907157,
        level: 63.2030316675533,
        slope: 1.00458391644788,
        seasons: [1.03476354353096, 0.959953222294316, 0.771346403552048, 1.23394845160922],
        expected: [216.52591, 132.47637, 283.04889, 759.08043],
    },
    RState {
        model: "AAN",
        damped: true,
        alpha: 0.014932817259302,
        beta: 0.0149327068053362,
        gamma: NA,
        phi: 0.979919958387887,
        level: 60.0651024395378,
        slope: 0.699112782133822,
        seasons: [NA; 4],
        expected: [62.51423, 61.87381, 63.14735, 65.11360],
    },
    RState {
        model: "MAN",
        damped: true,
        alpha: 0.0144217343786778,
        beta: 0.0144216994589862,
        gamma: NA,
        phi: 0.979999719878659,
        level: 60.1870032363649,
        slope: 0.698421913047609,
        seasons: [NA; 4],
        expected: [168.25189, 90.46201, 133.54769, 232.81738],
    },
    RState {
        model: "MMN",
        damped: true,
        alpha: 0.015489181776072,
        beta: 0.0154891632646377,
        gamma: NA,
        phi: 0.975139118496093,
        level: 60.1855946424729,
        slope: 1.00999589024928,
        seasons: [NA; 4],
        expected: [167.97747, 90.59675, 134.20300, 235.64502],
    },
    RState {
        model: "AAA",
        damped: false,
        alpha: 0.20281951627363,
        beta: 0.000169786227368617,
        gamma: 0.464523797585052,
        phi: NA,
        level: 62.5598121416791,
        slope: 0.578091734736357,
        seasons: [2.61176734723357, -1.24386240029203, -12.9575427049515, 12.2066400808086],
        expected: [77.10860, 51.51669, 64.46857, 70.36349],
    },
    RState {
        model: "MAA",
        damped: false,
        alpha: 0.416371920801538,
        beta: 0.000100008012920072,
        gamma: 0.352943901103959,
        phi: NA,
        level: 62.0497742976079,
        slope: 0.450130087198346,
        seasons: [3.50368220490457, -0.0544297321113539, -11.6971093199679, 13.1974985095916],
        expected: [209.23158, 149.62943, 270.65579, 637.03828],
    },
    RState {
        model: "ANA",
        damped: false,
        alpha: 0.54216694759434,
        beta: NA,
        gamma: 0.392030170511872,
        phi: NA,
        level: 57.606831186929,
        slope: NA,
        seasons: [8.29613785790501, 4.6033791939889, -7.43956343440823, 17.722316385643],
        expected: [77.09320, 51.52384, 64.36231, 69.84786],
    },
    RState {
        model: "MNA",
        damped: false,
        alpha: 0.532842556756286,
        beta: NA,
        gamma: 0.346387433608713,
        phi: NA,
        level: 58.0372808528325,
        slope: NA,
        seasons: [7.70802088750111, 4.14885814748503, -7.72115936226225, 17.1674660340923],
        expected: [207.86986, 169.42706, 313.97960, 793.97948],
    },
    RState {
        model: "MAM",
        damped: false,
        alpha: 0.315621390571192,
        beta: 0.000100011993615961,
        gamma: 0.000100051297784532,
        phi: NA,
        level: 62.4082004238551,
        slope: 0.513327867101983,
        seasons: [1.03713425342421, 0.959607104686072, 0.770172817592091, 1.23309264451638],
        expected: [214.45750, 106.19605, 211.61304, 492.12223],
    },
    RState {
        model: "MMM",
        damped: false,
        alpha: 0.546068965886,
        beta: 0.0737816453485457,
        gamma: 0.000100031693302807,
        phi: NA,
        level: 63.8203866275649,
        slope: 1.01833305374778,
        seasons: [1.03725227137871, 0.961177239042923, 0.771173487523454, 1.23036313932852],
        expected: [221.01861, 158.55914, 403.22625, 1389.33384],
    },
    RState {
        model: "MNM",
        damped: false,
        alpha: 0.608993139624813,
        beta: NA,
        gamma: 0.000167258612971303,
        phi: NA,
        level: 63.1472153330648,
        slope: NA,
        seasons: [1.0384840572776, 0.961456755855531, 0.768427399477366, 1.23185085956321],
        expected: [215.00997, 140.93035, 309.92465, 875.07985],
    },
    RState {
        model: "AAN",
        damped: false,
        alpha: 0.0097430554119077,
        beta: 0.00974302759255084,
        gamma: NA,
        phi: NA,
        level: 61.1430969243248,
        slope: 0.759041621012503,
        seasons: [NA; 4],
        expected: [63.66619, 63.09571, 64.45832, 66.51967],
    },
    RState {
        model: "MAN",
        damped: false,
        alpha: 0.0101749952821338,
        beta: 0.0101749138539332,
        gamma: NA,
        phi: NA,
        level: 61.6020426238699,
        slope: 0.761407500773051,
        seasons: [NA; 4],
        expected: [172.37584, 91.51932, 134.11221, 230.98970],
    },
    RState {
        model: "MMN",
        damped: false,
        alpha: 0.0664382968951546,
        beta: 0.000100001678373356,
        gamma: NA,
        phi: NA,
        level: 60.7206911970871,
        slope: 1.01221899136391,
        seasons: [NA; 4],
        expected: [169.88595, 97.33527, 142.97017, 252.51834],
    },
    RState {
        model: "ANN",
        damped: false,
        alpha: 0.196432515825523,
        beta: NA,
        gamma: NA,
        phi: NA,
        level: 58.7718395431632,
        slope: NA,
        seasons: [NA; 4],
        expected: [60.53589, 59.51851, 60.17570, 61.63011],
    },
    RState {
        model: "MNN",
        damped: false,
        alpha: 0.205985314333856,
        beta: NA,
        gamma: NA,
        phi: NA,
        level: 58.9770839944419,
        slope: NA,
        seasons: [NA; 4],
        expected: [163.01575, 112.58317, 172.21992, 338.93918],
    },
];

fn trend_from(code: u8) -> TrendType {
    match code {
        b'A' => TrendType::Additive,
        b'M' => TrendType::Multiplicative,
        _ => TrendType::None,
    }
}

fn seasonal_from(code: u8) -> SeasonalType {
    match code {
        b'A' => SeasonalType::Additive,
        b'M' => SeasonalType::Multiplicative,
        _ => SeasonalType::None,
    }
}

/// Fit with the R weights, then overwrite the final state with R's.
fn fit_to_r_state(state: &RState) -> (HoltWintersResults, ErrorType) {
    let code = state.model.as_bytes();
    let error = if code[0] == b'M' {
        ErrorType::Multiplicative
    } else {
        ErrorType::Additive
    };
    let spec = ModelSpec::new(trend_from(code[1]), seasonal_from(code[2]))
        .damped(state.damped)
        .with_seasonal_periods(4);

    let mut config = FitConfig::new()
        .with_smoothing_level(state.alpha)
        .optimized(false);
    if spec.has_trend() {
        config = config.with_smoothing_slope(state.beta);
    }
    if spec.has_season() {
        config = config.with_smoothing_seasonal(state.gamma);
    }
    if spec.damped {
        config = config.with_damping_slope(state.phi);
    }

    let mut fit = ExponentialSmoothing::new(&common::austourists(), spec)
        .unwrap()
        .fit(&config)
        .unwrap();
    let n = fit.nobs();
    fit.level_mut()[n - 1] = state.level;
    if spec.has_trend() {
        fit.trend_mut()[n - 1] = state.slope;
    }
    if spec.has_season() {
        for (back, &s) in state.seasons.iter().enumerate() {
            fit.season_mut()[n - 1 - back] = s;
        }
    }
    (fit, error)
}

#[test]
fn paths_match_r_forecast_package() {
    for state in R_STATES {
        let (fit, error) = fit_to_r_state(state);
        let config = SimulationConfig::new(4)
            .with_error(error)
            .with_random_errors(RandomErrors::given_path(INNOVATIONS.to_vec()));
        let path = fit.simulate(&config).unwrap().as_flat().unwrap();

        for (step, (got, want)) in path.iter().zip(state.expected).enumerate() {
            assert!(
                (got - want).abs() < 1.5e-5,
                "{} damped={} step {}: {} != {}",
                state.model,
                state.damped,
                step,
                got,
                want
            );
        }
    }
}

fn damped_additive_fit() -> HoltWintersResults {
    ExponentialSmoothing::new(
        &common::austourists(),
        ModelSpec::new(TrendType::Additive, SeasonalType::Additive)
            .damped(true)
            .with_seasonal_periods(4),
    )
    .unwrap()
    .fit(&FitConfig::default())
    .unwrap()
}

#[test]
fn anchors_resolve_consistently() {
    let fit = damped_additive_fit();
    let run = |anchor: Location| {
        fit.simulate(&SimulationConfig::new(4).with_anchor(anchor).with_seed(0))
            .unwrap()
    };

    assert_eq!(run(Location::Index(0)), run(Location::Start));
    assert_eq!(
        run(Location::Index(-1)),
        run("2015-12-01".parse().unwrap())
    );
    assert_eq!(run(Location::End), run("2016-03-01".parse().unwrap()));

    let at_end = run(Location::End);
    assert_eq!(at_end.anchor(), fit.nobs());
    let stamps = at_end.timestamps().unwrap();
    assert_eq!(stamps[0].to_string(), "2016-03-01 00:00:00 UTC");
    assert_eq!(stamps[3].to_string(), "2016-12-01 00:00:00 UTC");

    assert!(fit
        .simulate(&SimulationConfig::new(4).with_anchor(Location::Index(69)))
        .is_err());
}

#[test]
fn every_error_source_produces_paths() {
    let fit = damped_additive_fit();
    let given: Vec<Vec<f64>> = (0..4)
        .map(|t| (0..10).map(|r| ((t * 10 + r) as f64 * 0.37).sin()).collect())
        .collect();
    let sources = [
        RandomErrors::Gaussian,
        RandomErrors::Fitted(DistributionFamily::Normal),
        RandomErrors::Fitted(DistributionFamily::Laplace),
        RandomErrors::frozen(Normal::new(0.0, 1.0).unwrap()),
        RandomErrors::Given(given),
        RandomErrors::Bootstrap,
    ];

    for source in sources {
        let label = format!("{:?}", source);
        let result = fit
            .simulate(
                &SimulationConfig::new(4)
                    .with_repetitions(10)
                    .with_random_errors(source)
                    .with_seed(3),
            )
            .unwrap();
        assert_eq!(result.horizon(), 4, "{}", label);
        assert_eq!(result.repetitions(), 10, "{}", label);
        assert!(
            result.paths().iter().flatten().all(|v| v.is_finite()),
            "{}",
            label
        );
    }
}

#[test]
fn given_innovations_must_match_shape() {
    let fit = damped_additive_fit();
    let config = SimulationConfig::new(4)
        .with_repetitions(10)
        .with_random_errors(RandomErrors::given_path(INNOVATIONS.to_vec()));
    assert!(matches!(
        fit.simulate(&config),
        Err(ForecastError::DimensionMismatch { expected: 10, got: 1 })
    ));
}

#[test]
fn seeding_is_reproducible() {
    let fit = damped_additive_fit();
    let config = SimulationConfig::new(4).with_repetitions(10).with_seed(10);

    let seeded = fit.simulate(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    let explicit = fit.simulate_with_rng(&config, &mut rng).unwrap();
    assert_eq!(seeded, explicit);

    let other = fit
        .simulate(&SimulationConfig::new(4).with_repetitions(10).with_seed(11))
        .unwrap();
    assert_ne!(seeded, other);
}

#[test]
fn boxcox_paths_centre_on_forecast() {
    for seasonal in [SeasonalType::Additive, SeasonalType::Multiplicative] {
        let fit = ExponentialSmoothing::new(
            &common::austourists(),
            ModelSpec::new(TrendType::Additive, seasonal).with_seasonal_periods(4),
        )
        .unwrap()
        .fit(&FitConfig::new().with_boxcox(BoxCox::Estimate))
        .unwrap();

        let expected = fit.forecast(4).unwrap();
        let simulated = fit
            .simulate(&SimulationConfig::new(4).with_repetitions(500).with_seed(1))
            .unwrap();
        for (mean, point) in simulated.mean().iter().zip(&expected) {
            assert!((mean - point).abs() < 5.0, "{} vs {}", mean, point);
        }
    }
}

#[test]
fn zero_innovations_reproduce_point_forecast() {
    let fit = damped_additive_fit();
    let config = SimulationConfig::new(6)
        .with_random_errors(RandomErrors::given_path(vec![0.0; 6]));
    let path = fit.simulate(&config).unwrap().as_flat().unwrap();
    for (p, f) in path.iter().zip(fit.forecast(6).unwrap()) {
        assert_abs_diff_eq!(*p, f, epsilon = 1e-9);
    }
}
