//! Derivative-free scalar minimization.
//!
//! [`Powell`] is a direction-set method. With a single parameter the
//! direction set is the unit vector, so each iteration is one line search:
//! bracket the minimum by golden-ratio expansion, then close in on it with
//! Brent's parabolic/golden-section search.

use serde::{Deserialize, Serialize};

/// Golden ratio used when growing a bracket.
const GOLD: f64 = 1.618_034;
/// Golden-section fraction used inside Brent's method.
const CGOLD: f64 = 0.381_966_0;
/// Guard against division by zero in the parabolic step.
const TINY: f64 = 1e-21;
/// Absolute floor on Brent's tolerance.
const MIN_TOL: f64 = 1e-11;
/// Largest parabolic extrapolation, as a multiple of the last bracket step.
const GROW_LIMIT: f64 = 110.0;
/// Iteration cap for a single Brent search.
const BRENT_MAX_ITER: usize = 500;

/// Outcome of a minimization.
#[derive(Clone, Copy, Debug)]
pub struct Minimum {
    pub x: f64,
    pub fun: f64,
    /// `false` if an iteration/evaluation cap was hit or the optimum is not finite.
    pub success: bool,
    pub iterations: usize,
    pub evaluations: usize,
}

/// A local minimizer that needs only function values.
pub trait Minimizer: Send + Sync {
    fn minimize(&self, f: &dyn Fn(f64) -> f64, x0: f64) -> Minimum;
}

/// Convergence settings for [`Powell`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowellParams {
    /// Relative tolerance on the argument (default: 1e-4).
    pub xtol: f64,
    /// Relative tolerance on the function value (default: 1e-4).
    pub ftol: f64,
    /// Maximum direction-set iterations (default: 1000).
    pub max_iter: usize,
    /// Maximum function evaluations (default: 4000). Hard cap: once reached,
    /// the objective is no longer called.
    pub max_fev: usize,
}

impl Default for PowellParams {
    fn default() -> Self {
        Self {
            xtol: 1e-4,
            ftol: 1e-4,
            max_iter: 1000,
            max_fev: 4000,
        }
    }
}

/// Powell's direction-set method for one parameter.
#[derive(Clone, Debug, Default)]
pub struct Powell {
    pub params: PowellParams,
}

impl Powell {
    pub fn new(params: PowellParams) -> Self {
        Self { params }
    }
}

impl Minimizer for Powell {
    fn minimize(&self, f: &dyn Fn(f64) -> f64, x0: f64) -> Minimum {
        let p = &self.params;
        let mut counter = Counted::new(f, p.max_fev);
        let mut x = x0;
        let mut fval = counter.call(x);
        let mut iterations = 0usize;
        let mut converged = false;

        while iterations < p.max_iter && !counter.exhausted() {
            let fx = fval;
            let (step, fstep) = line_search(&mut counter, x, fval, p.xtol * 100.0);
            // Only accept a line-search result that does not go uphill.
            if fstep <= fval {
                x += step;
                fval = fstep;
            }
            iterations += 1;

            if counter.exhausted() {
                break;
            }
            if fx.is_finite() && 2.0 * (fx - fval) <= p.ftol * (fx.abs() + fval.abs()) + 1e-20 {
                converged = true;
                break;
            }
        }

        Minimum {
            x,
            fun: fval,
            success: converged && fval.is_finite() && x.is_finite(),
            iterations,
            evaluations: counter.evaluations,
        }
    }
}

/// Wraps the objective and counts calls. NaN becomes +inf so a search never
/// prefers it. Past `limit` calls the objective is skipped and +inf returned.
struct Counted<'a> {
    f: &'a dyn Fn(f64) -> f64,
    evaluations: usize,
    limit: usize,
}

impl<'a> Counted<'a> {
    fn new(f: &'a dyn Fn(f64) -> f64, limit: usize) -> Self {
        Self {
            f,
            evaluations: 0,
            limit,
        }
    }

    fn exhausted(&self) -> bool {
        self.evaluations >= self.limit
    }

    fn call(&mut self, x: f64) -> f64 {
        if self.exhausted() {
            return f64::INFINITY;
        }
        self.evaluations += 1;
        let v = (self.f)(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    }
}

/// Minimize `f(x + alpha)` over `alpha`, starting from `alpha = 0`.
/// Returns `(alpha, f(x + alpha))`.
fn line_search(counter: &mut Counted, x: f64, fx: f64, tol: f64) -> (f64, f64) {
    let mut along = |alpha: f64| counter.call(x + alpha);
    match bracket(&mut along, 0.0, 1.0, fx) {
        Some(br) => brent(&mut along, br, tol),
        None => (0.0, fx),
    }
}

/// Three points `a, b, c` with `f(b)` no larger than `f(a)` and `f(c)`.
#[derive(Clone, Copy, Debug)]
struct Bracket {
    a: f64,
    b: f64,
    c: f64,
    fb: f64,
}

/// Expand downhill from `(xa, xb)` until the minimum is enclosed.
fn bracket(f: &mut dyn FnMut(f64) -> f64, xa: f64, xb: f64, fa: f64) -> Option<Bracket> {
    let (mut xa, mut xb) = (xa, xb);
    let mut fa = fa;
    let mut fb = f(xb);
    if fa < fb {
        std::mem::swap(&mut xa, &mut xb);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut xc = xb + GOLD * (xb - xa);
    let mut fc = f(xc);
    let mut iter = 0usize;

    while fc < fb {
        let tmp1 = (xb - xa) * (fb - fc);
        let tmp2 = (xb - xc) * (fb - fa);
        let val = tmp2 - tmp1;
        let denom = if val.abs() < TINY { 2.0 * TINY } else { 2.0 * val };
        let mut w = xb - ((xb - xc) * tmp2 - (xb - xa) * tmp1) / denom;
        let wlim = xb + GROW_LIMIT * (xc - xb);
        iter += 1;
        if iter > BRENT_MAX_ITER || !xc.is_finite() {
            return None;
        }

        let mut fw;
        if (w - xc) * (xb - w) > 0.0 {
            fw = f(w);
            if fw < fc {
                return Some(Bracket {
                    a: xb,
                    b: w,
                    c: xc,
                    fb: fw,
                });
            } else if fw > fb {
                return Some(Bracket {
                    a: xa,
                    b: xb,
                    c: w,
                    fb,
                });
            }
            w = xc + GOLD * (xc - xb);
            fw = f(w);
        } else if (w - wlim) * (wlim - xc) >= 0.0 {
            w = wlim;
            fw = f(w);
        } else if (w - wlim) * (xc - w) > 0.0 {
            fw = f(w);
            if fw < fc {
                xb = xc;
                xc = w;
                w = xc + GOLD * (xc - xb);
                fb = fc;
                fc = fw;
                fw = f(w);
            }
        } else {
            w = xc + GOLD * (xc - xb);
            fw = f(w);
        }
        xa = xb;
        xb = xc;
        xc = w;
        fa = fb;
        fb = fc;
        fc = fw;
    }

    Some(Bracket {
        a: xa,
        b: xb,
        c: xc,
        fb,
    })
}

/// Brent's method inside a bracket. Returns `(xmin, fmin)`.
fn brent(f: &mut dyn FnMut(f64) -> f64, br: Bracket, tol: f64) -> (f64, f64) {
    let (mut a, mut b) = if br.a < br.c {
        (br.a, br.c)
    } else {
        (br.c, br.a)
    };
    let (mut x, mut w, mut v) = (br.b, br.b, br.b);
    let (mut fx, mut fw, mut fv) = (br.fb, br.fb, br.fb);
    let mut deltax = 0.0f64;
    let mut rat = 0.0f64;

    for _ in 0..BRENT_MAX_ITER {
        let tol1 = tol * x.abs() + MIN_TOL;
        let tol2 = 2.0 * tol1;
        let xmid = 0.5 * (a + b);
        if (x - xmid).abs() < tol2 - 0.5 * (b - a) {
            break;
        }

        if deltax.abs() <= tol1 {
            deltax = if x >= xmid { a - x } else { b - x };
            rat = CGOLD * deltax;
        } else {
            // Parabola through x, w, v.
            let tmp1 = (x - w) * (fx - fv);
            let mut tmp2 = (x - v) * (fx - fw);
            let mut p = (x - v) * tmp2 - (x - w) * tmp1;
            tmp2 = 2.0 * (tmp2 - tmp1);
            if tmp2 > 0.0 {
                p = -p;
            }
            tmp2 = tmp2.abs();
            let dx_prev = deltax;
            deltax = rat;
            if p > tmp2 * (a - x) && p < tmp2 * (b - x) && p.abs() < (0.5 * tmp2 * dx_prev).abs()
            {
                rat = p / tmp2;
                let u = x + rat;
                if (u - a) < tol2 || (b - u) < tol2 {
                    rat = if xmid - x >= 0.0 { tol1 } else { -tol1 };
                }
            } else {
                deltax = if x >= xmid { a - x } else { b - x };
                rat = CGOLD * deltax;
            }
        }

        let u = if rat.abs() < tol1 {
            if rat >= 0.0 {
                x + tol1
            } else {
                x - tol1
            }
        } else {
            x + rat
        };
        let fu = f(u);

        if fu > fx {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        } else {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        }
    }

    (x, fx)
}
