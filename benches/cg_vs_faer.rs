use criterion::{Criterion, black_box, criterion_group, criterion_main};
use faer::Mat;
use faer::linalg::solvers::SolveCore;
use matfree::{CgSolver, MatrixOperator};

fn bench_cg_vs_faer(c: &mut Criterion) {
    let n = 200;
    // SPD system A = Mᵀ M + I with deterministic entries.
    let data: Vec<f64> = (0..n * n).map(|i| (i as f64).sin()).collect();
    let m = Mat::from_fn(n, n, |i, j| data[j * n + i]);
    let m_t = m.transpose();
    let a = &m_t * &m + Mat::<f64>::identity(n, n);
    let b: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();

    c.bench_function("matfree cg", |ben| {
        let op = MatrixOperator::new(a.clone());
        let solver = CgSolver::new(1e-8);
        ben.iter(|| {
            let mut x = vec![0.0; n];
            let _info = solver
                .solve(black_box(&op), None, black_box(&b), &mut x, None)
                .unwrap();
        })
    });

    c.bench_function("faer direct lu", |ben| {
        ben.iter(|| {
            let factor = faer::linalg::solvers::FullPivLu::new(a.as_ref());
            let mut y = b.clone();
            let n = y.len();
            let y_mat = faer::MatMut::from_column_major_slice_mut(&mut y, n, 1);
            factor.solve_in_place_with_conj(faer::Conj::No, y_mat);
        })
    });
}

criterion_group!(benches, bench_cg_vs_faer);
criterion_main!(benches);
