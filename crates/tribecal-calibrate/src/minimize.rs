//! Derivative-free local minimization.
//!
//! The optimizer only needs "minimize this scalar function from this
//! starting point", so the search algorithm sits behind [`Minimizer`] and
//! can be swapped without touching how the objective is built.
//!
//! [`NelderMead`] is the default: the classic simplex method with
//! reflection 1, expansion 2, contraction 0.5 and shrink 0.5.

use serde::{Deserialize, Serialize};

/// Fractional perturbation of non-zero coordinates in the initial simplex.
const NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation of zero coordinates in the initial simplex.
const ZERO_DELTA: f64 = 0.00025;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Iterations and evaluations allowed per parameter when no budget is set.
pub const EVALUATIONS_PER_PARAMETER: usize = 200;

/// Best point found by a [`Minimizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Argument of the lowest objective value seen.
    pub point: Vec<f64>,
    /// Objective value at `point`.
    pub value: f64,
    /// Search iterations performed.
    pub iterations: usize,
    /// Objective evaluations performed.
    pub evaluations: usize,
    /// `true` when the search met its tolerances before running out of budget.
    pub converged: bool,
}

/// A derivative-free local search.
pub trait Minimizer {
    /// Minimize `objective` starting from `initial`.
    ///
    /// Always returns the best point found, converged or not.
    fn minimize(&self, objective: &mut dyn FnMut(&[f64]) -> f64, initial: &[f64]) -> Minimum;
}

/// Nelder–Mead stopping criteria.
///
/// Budgets left unset default to `200 × n` for `n` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadOptions {
    /// Maximum simplex iterations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    /// Maximum objective evaluations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_evaluations: Option<usize>,
    /// Convergence tolerance on the simplex spread in parameter space.
    pub xatol: f64,
    /// Convergence tolerance on the spread of objective values.
    pub fatol: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_evaluations: None,
            xatol: 1e-4,
            fatol: 1e-4,
        }
    }
}

impl NelderMeadOptions {
    /// Iteration budget for an `n`-dimensional search.
    pub fn iteration_budget(&self, n: usize) -> usize {
        self.max_iterations
            .unwrap_or(EVALUATIONS_PER_PARAMETER * n.max(1))
    }

    /// Evaluation budget for an `n`-dimensional search.
    pub fn evaluation_budget(&self, n: usize) -> usize {
        self.max_evaluations
            .unwrap_or(EVALUATIONS_PER_PARAMETER * n.max(1))
    }
}

/// Downhill simplex search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NelderMead {
    options: NelderMeadOptions,
}

impl NelderMead {
    /// Create a search with the given stopping criteria.
    pub fn new(options: NelderMeadOptions) -> Self {
        Self { options }
    }

    /// Stopping criteria in use.
    pub fn options(&self) -> &NelderMeadOptions {
        &self.options
    }
}

/// Evaluation counter wrapped around the caller's objective.
struct Counted<'a> {
    objective: &'a mut dyn FnMut(&[f64]) -> f64,
    evaluations: usize,
}

impl Counted<'_> {
    fn eval(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        let value = (self.objective)(x);
        // NaN would poison every comparison in the simplex ordering
        if value.is_nan() { f64::INFINITY } else { value }
    }
}

/// `a + t·(b − a)` per coordinate.
fn lerp(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| x + t * (y - x)).collect()
}

impl Minimizer for NelderMead {
    fn minimize(&self, objective: &mut dyn FnMut(&[f64]) -> f64, initial: &[f64]) -> Minimum {
        let n = initial.len();
        let max_iterations = self.options.iteration_budget(n);
        let max_evaluations = self.options.evaluation_budget(n);
        let mut f = Counted {
            objective,
            evaluations: 0,
        };

        if n == 0 {
            let value = f.eval(initial);
            return Minimum {
                point: Vec::new(),
                value,
                iterations: 0,
                evaluations: f.evaluations,
                converged: true,
            };
        }

        // Initial simplex: x0 plus one vertex per coordinate
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(initial.to_vec());
        for k in 0..n {
            let mut vertex = initial.to_vec();
            vertex[k] = if vertex[k] == 0.0 {
                ZERO_DELTA
            } else {
                vertex[k] * (1.0 + NONZERO_DELTA)
            };
            simplex.push(vertex);
        }

        let mut values: Vec<f64> = Vec::with_capacity(n + 1);
        for vertex in &simplex {
            values.push(f.eval(vertex));
        }
        sort_simplex(&mut simplex, &mut values);

        let mut iterations = 1;
        let mut converged = false;

        while f.evaluations < max_evaluations && iterations < max_iterations {
            let x_spread = simplex[1..]
                .iter()
                .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
                .fold(0.0, f64::max);
            let f_spread = values[1..]
                .iter()
                .map(|v| (values[0] - v).abs())
                .fold(0.0, f64::max);
            if x_spread <= self.options.xatol && f_spread <= self.options.fatol {
                converged = true;
                break;
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
                .collect();
            let worst = simplex[n].clone();

            // All trial points lie on the line through the centroid and the worst vertex
            let reflected = lerp(&centroid, &worst, -REFLECTION);
            let f_reflected = f.eval(&reflected);
            let mut shrink = false;

            if f_reflected < values[0] {
                let expanded = lerp(&centroid, &worst, -REFLECTION * EXPANSION);
                let f_expanded = f.eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
            } else if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
            } else if f_reflected < values[n] {
                let contracted = lerp(&centroid, &worst, -CONTRACTION * REFLECTION);
                let f_contracted = f.eval(&contracted);
                if f_contracted <= f_reflected {
                    simplex[n] = contracted;
                    values[n] = f_contracted;
                } else {
                    shrink = true;
                }
            } else {
                let contracted = lerp(&centroid, &worst, CONTRACTION);
                let f_contracted = f.eval(&contracted);
                if f_contracted < values[n] {
                    simplex[n] = contracted;
                    values[n] = f_contracted;
                } else {
                    shrink = true;
                }
            }

            if shrink {
                let best = simplex[0].clone();
                for j in 1..=n {
                    simplex[j] = lerp(&best, &simplex[j], SHRINK);
                    values[j] = f.eval(&simplex[j]);
                }
            }

            sort_simplex(&mut simplex, &mut values);
            iterations += 1;

            tracing::trace!(
                iteration = iterations,
                evaluations = f.evaluations,
                best = values[0],
                "simplex step"
            );
        }

        Minimum {
            point: simplex.swap_remove(0),
            value: values[0],
            iterations,
            evaluations: f.evaluations,
            converged,
        }
    }
}

/// Order vertices by objective value, best first. Stable, so ties keep their order.
fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}
