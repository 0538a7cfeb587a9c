//! Performance benchmarks for the integration driver
//!
//! Compares the two stepping methods on identical runs and measures how the
//! driver scales with the depth resolution of the biofilm.
//!
//! # What We're Measuring
//!
//! 1. **Cash-Karp 4(5)** (explicit, adaptive):
//!    - 6 function evaluations per attempted step
//!    - Large steps on smooth kinetics
//!
//! 2. **Implicit Euler** (backward, Newton-corrected):
//!    - One finite-difference Jacobian (n evaluations) plus an LU solve
//!      per Newton iteration
//!    - Pays per step, wins only on stiff systems
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench driver_performance
//!
//! # Only the method comparison
//! cargo bench --bench driver_performance methods
//!
//! # Only the grid scaling
//! cargo bench --bench driver_performance layers
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{DMatrix, DVector};

use biofilm_rs::kinetics::{DiagnosticMode, EvalContext, Kinetics};
use biofilm_rs::output::NullSink;
use biofilm_rs::reactor::ReactorParams;
use biofilm_rs::solver::IntegrationDriver;

/// Uniform first-order decay of the whole state vector.
struct Decay;

impl Kinetics for Decay {
    fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        state * -0.2
    }

    fn name(&self) -> &str {
        "Decay"
    }
}

fn params_with_layers(n_layers: usize, stiff: bool) -> ReactorParams {
    ReactorParams::builder(2, 2, n_layers)
        .tank_particulates(DVector::from_element(2, 1.0))
        .tank_substrates(DVector::from_element(2, 8.0))
        .film_particulates(DMatrix::from_element(2, n_layers, 0.4))
        .film_substrates(DMatrix::from_element(2, n_layers, 2.0))
        .initial_thickness(50.0)
        .total_time(12.0)
        .output_period(2.0)
        .discontinuity_period(3.0)
        .plot_period(12.0)
        .stiff(stiff)
        .build()
        .unwrap()
}

fn bench_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("methods");

    for (name, stiff) in [("cash_karp", false), ("implicit_euler", true)] {
        let params = params_with_layers(10, stiff);
        let driver = IntegrationDriver::new(&params).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let run = driver
                    .run(&Decay, &mut NullSink, DiagnosticMode::None)
                    .unwrap();
                black_box(run.final_state.thickness)
            })
        });
    }
    group.finish();
}

fn bench_layer_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("layers");

    for n_layers in [5, 20, 80] {
        let params = params_with_layers(n_layers, false);
        let driver = IntegrationDriver::new(&params).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(n_layers),
            &n_layers,
            |b, _| {
                b.iter(|| {
                    let run = driver
                        .run(&Decay, &mut NullSink, DiagnosticMode::None)
                        .unwrap();
                    black_box(run.times.len())
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_methods, bench_layer_scaling);
criterion_main!(benches);
