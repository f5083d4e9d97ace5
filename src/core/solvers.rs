use roots::{find_root_brent, SimpleConvergency};

/// Root of `func` within the bracket `[a, b]`, whose endpoints must give values of opposite sign.
pub(crate) fn find_root_in_bracket(
    func: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    xtol: f64,
) -> anyhow::Result<f64> {
    let mut convergency = SimpleConvergency {
        eps: xtol,
        max_iter: 100,
    };

    find_root_brent::<f64, _>(a, b, func, &mut convergency).map_err(|e| anyhow::anyhow!(e))
}
