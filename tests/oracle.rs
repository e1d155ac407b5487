use crosscat::cc::feature::Feature;
use crosscat::data::Datum;
use crosscat::oracle_utils::{draw_clusters, single_state_weights};
use crosscat::synthetic::{convert_columns_to_categorical, gen_factorial_data};
use crosscat::{Engine, EngineBuilder, Given, HasStates, Oracle, OracleT};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

const N_ROWS: usize = 60;

fn engine(n_states: usize, seed: u64) -> Engine {
    let (table, codebook) =
        gen_factorial_data(seed, 3, 4, N_ROWS, 2, 10.0, 1.0).unwrap();
    let mut engine = EngineBuilder::new(codebook, table)
        .with_nstates(n_states)
        .seed_from_u64(seed)
        .build()
        .unwrap();
    engine.run(25).unwrap();
    engine
}

#[test]
fn new_row_cluster_frequencies_follow_crp_weights() {
    let engine = engine(1, 1337);
    let state = &engine.states()[0];
    let col_ixs: Vec<usize> = (0..engine.n_cols()).collect();
    let view_weights =
        single_state_weights(state, &col_ixs, N_ROWS, &Given::Nothing);

    let n = 1000;
    let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    let mut freqs: Vec<Vec<f64>> = view_weights
        .values()
        .map(|weights| vec![0.0; weights.len()])
        .collect();

    for _ in 0..n {
        let ks = draw_clusters(&view_weights, &mut rng);
        for (freq, k) in freqs.iter_mut().zip(ks.values()) {
            freq[*k] += 1.0 / n as f64;
        }
    }

    assert_eq!(view_weights.len(), state.n_views());
    for ((view_ix, weights), freq) in view_weights.iter().zip(freqs.iter()) {
        let crp_weights = state.views[*view_ix].weights();
        for ((w, crp_w), f) in weights.iter().zip(crp_weights).zip(freq) {
            assert!((w.exp() - crp_w).abs() < 1E-10);
            assert!(
                (f - crp_w).abs() < 0.06,
                "view {view_ix}: frequency {f} vs weight {crp_w}"
            );
        }
    }
}

// A new row picks a cluster by its CRP weight, then draws from that
// cluster's predictive
#[test]
fn sampled_new_rows_mix_clusters_by_crp_weight() {
    let (mut table, mut codebook) =
        gen_factorial_data(1337, 2, 4, N_ROWS, 2, 10.0, 1.0).unwrap();
    for row_ix in 0..table.n_rows() {
        let x = table.cell(row_ix, 0);
        table.set(row_ix, 0, (x / 5.0).round());
    }
    convert_columns_to_categorical(&mut table, &mut codebook, &[0]).unwrap();
    let k = codebook.col_metadata[0].coltype.k().unwrap();

    let mut engine = EngineBuilder::new(codebook, table)
        .with_nstates(1)
        .seed_from_u64(1337)
        .build()
        .unwrap();
    engine.run(25).unwrap();

    let expected: Vec<f64> = {
        let state = &engine.states()[0];
        let view = &state.views[state.asgn().asgn[0]];
        let ftr = &view.ftrs[&0];
        (0..k as u32)
            .map(|x| {
                view.weights()
                    .iter()
                    .enumerate()
                    .map(|(ix, w)| {
                        w * ftr.cpnt_ln_pp(ix, &Datum::Categorical(x), &[]).exp()
                    })
                    .sum()
            })
            .collect()
    };
    approx::assert_relative_eq!(
        expected.iter().sum::<f64>(),
        1.0,
        epsilon = 1E-10
    );

    let oracle = Oracle::from(engine);
    let n = 2000;
    let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    let xs = oracle
        .simple_predictive_sample(N_ROWS, &[0], &Given::Nothing, n, None, &mut rng)
        .unwrap();

    for (x, p) in expected.iter().enumerate() {
        let freq = xs
            .iter()
            .filter(|draw| draw[0] == Datum::Categorical(x as u32))
            .count() as f64
            / n as f64;
        assert!((freq - p).abs() < 0.05, "x = {x}: frequency {freq} vs {p}");
    }
}

#[test]
fn new_row_categorical_samples_follow_predictive_probability() {
    let (mut table, mut codebook) =
        gen_factorial_data(1337, 3, 4, N_ROWS, 2, 10.0, 1.0).unwrap();
    for row_ix in 0..table.n_rows() {
        let x = table.cell(row_ix, 1);
        table.set(row_ix, 1, (x / 5.0).round());
    }
    convert_columns_to_categorical(&mut table, &mut codebook, &[1]).unwrap();
    let k = codebook.col_metadata[1].coltype.k().unwrap();

    let mut engine = EngineBuilder::new(codebook, table)
        .with_nstates(2)
        .seed_from_u64(1337)
        .build()
        .unwrap();
    engine.run(25).unwrap();
    let oracle = Oracle::from(engine);

    let n = 1000;
    let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    let xs = oracle
        .simple_predictive_sample(N_ROWS, &[1], &Given::Nothing, n, None, &mut rng)
        .unwrap();

    for x in 0..k as u32 {
        let freq = xs
            .iter()
            .filter(|draw| draw[0] == Datum::Categorical(x))
            .count() as f64
            / n as f64;
        let p = oracle
            .simple_predictive_probability(
                N_ROWS,
                &[1],
                &[Datum::Categorical(x)],
                &Given::Nothing,
                None,
            )
            .unwrap()
            .exp();
        assert!((freq - p).abs() < 0.06, "x = {x}: frequency {freq} vs {p}");
    }
}

#[test]
fn impute_recovers_held_out_value() {
    let (mut table, codebook) =
        gen_factorial_data(1337, 3, 4, N_ROWS, 2, 10.0, 1.0).unwrap();

    let (row_ix, col_ix) = (7, 2);
    let truth = table.cell(row_ix, col_ix);
    let column_std = {
        let xs = table.column(col_ix);
        crosscat::utils::var(&xs).sqrt()
    };
    table.set_missing(row_ix, col_ix);

    let mut engine = EngineBuilder::new(codebook, table)
        .with_nstates(4)
        .seed_from_u64(1337)
        .build()
        .unwrap();
    engine.run(50).unwrap();

    let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    let (x, confidence) = engine
        .impute_and_confidence(row_ix, col_ix, &Given::Nothing, 1000, &mut rng)
        .unwrap();

    let x = x.to_f64_opt().unwrap();
    assert!(
        (x - truth).abs() < 3.0 * column_std,
        "imputed {x}, truth {truth}, std {column_std}"
    );
    assert!((0.0..=1.0).contains(&confidence));
}

#[test]
fn given_in_same_view_moves_the_prediction() {
    let engine = engine(1, 7);
    let state = &engine.states()[0];

    // find two columns that share a view
    let view = state
        .views
        .iter()
        .find(|view| view.n_cols() > 1 && view.n_cats() > 1);
    let view = match view {
        Some(view) => view,
        // nothing to condition through
        None => return,
    };
    let mut cols = view.ftrs.keys().copied();
    let (col_a, col_b) = (cols.next().unwrap(), cols.next().unwrap());

    let oracle = Oracle::from(engine.clone());
    let (lo, hi) = {
        let xs = oracle.table.column(col_a);
        (
            xs.iter().cloned().fold(f64::INFINITY, f64::min),
            xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    let x = Datum::Continuous(0.0);
    let logp_lo = oracle
        .simple_predictive_density(
            N_ROWS,
            &[col_b],
            &[x],
            &Given::Conditions(vec![(col_a, Datum::Continuous(lo))]),
            None,
        )
        .unwrap();
    let logp_hi = oracle
        .simple_predictive_density(
            N_ROWS,
            &[col_b],
            &[x],
            &Given::Conditions(vec![(col_a, Datum::Continuous(hi))]),
            None,
        )
        .unwrap();
    let logp_nothing = oracle
        .simple_predictive_density(N_ROWS, &[col_b], &[x], &Given::Nothing, None)
        .unwrap();

    assert!(logp_lo.is_finite() && logp_hi.is_finite());
    assert!((logp_lo - logp_nothing).abs() > 1E-6 || (logp_hi - logp_nothing).abs() > 1E-6);
}

#[test]
fn given_in_other_view_is_ignored() {
    let engine = engine(1, 1337);
    let state = &engine.states()[0];
    if state.n_views() < 2 {
        return;
    }
    let col_a = *state.views[0].ftrs.keys().next().unwrap();
    let col_b = *state.views[1].ftrs.keys().next().unwrap();

    let x = [Datum::Continuous(1.0)];
    let with_given = engine
        .simple_predictive_density(
            N_ROWS,
            &[col_b],
            &x,
            &Given::Conditions(vec![(col_a, Datum::Continuous(3.0))]),
            None,
        )
        .unwrap();
    let without = engine
        .simple_predictive_density(N_ROWS, &[col_b], &x, &Given::Nothing, None)
        .unwrap();

    assert!((with_given - without).abs() < 1E-12);
}

#[test]
fn observed_row_ignores_given_for_cluster_choice() {
    let engine = engine(2, 1337);
    let x = [Datum::Continuous(1.0)];
    let with_given = engine
        .simple_predictive_probability(
            3,
            &[0],
            &x,
            &Given::Conditions(vec![(1, Datum::Continuous(-8.0))]),
            None,
        )
        .unwrap();
    let without = engine
        .simple_predictive_probability(3, &[0], &x, &Given::Nothing, None)
        .unwrap();

    assert!((with_given - without).abs() < 1E-12);
}
