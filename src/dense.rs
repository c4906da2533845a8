use derive_builder::Builder;
use faer::complex_native::c64;
use faer::prelude::*;
use num_complex::Complex64;
use num_traits::Zero;
use serde::Serialize;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Largest accepted deviation of `A * inv(A)` from the identity.
const INVERSE_RESIDUAL_TOL: f64 = 1e-8;

/// Dense matrix with element values stored in row-major order.
#[derive(Debug, Clone, PartialEq, Default, Builder, Serialize)]
#[builder(default, build_fn(name = "pre_build", validate = "Self::validate"))]
pub struct Mat<T: Default + Clone> {
    #[builder(setter(custom))]
    rows: usize,
    #[builder(setter(custom))]
    cols: usize,

    values: Vec<T>,
}

impl<T> MatBuilder<T>
where
    T: Default + Clone,
{
    pub fn build(&self) -> Result<Mat<T>, MatBuilderError>
    where
        T: Zero,
    {
        let mut mat = self.pre_build()?;
        if self.values.is_none() {
            mat.values = vec![T::zero(); mat.rows * mat.cols];
        }
        Ok(mat)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(values) = &self.values {
            let rows = self.rows.unwrap_or_default();
            let cols = self.cols.unwrap_or_default();
            if values.len() != rows * cols {
                return Err(format!(
                    "values length ({}) must be rows * cols ({} * {} = {})",
                    values.len(),
                    rows,
                    cols,
                    rows * cols
                ));
            }
        }
        Ok(())
    }
}

impl<T> Mat<T>
where
    T: Default + Copy,
{
    pub fn new(rows: usize, cols: usize) -> MatBuilder<T> {
        MatBuilder {
            rows: Some(rows),
            cols: Some(cols),
            ..Default::default()
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self
    where
        T: Zero,
    {
        Self {
            rows,
            cols,
            values: vec![T::zero(); rows * cols],
        }
    }

    pub fn with_diagonal(diag: &[T]) -> Self
    where
        T: Zero,
    {
        let n = diag.len();
        let mut mat = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            mat.set(i, i, d);
        }
        mat
    }

    pub fn identity(n: usize) -> Self
    where
        T: Zero + num_traits::One,
    {
        Self::with_diagonal(&vec![T::one(); n])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    fn ix(&self, row: usize, col: usize) -> usize {
        assert!(row < self.rows, "row {} out of bounds ({})", row, self.rows);
        assert!(col < self.cols, "col {} out of bounds ({})", col, self.cols);
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.values[self.ix(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: T) {
        let i = self.ix(row, col);
        self.values[i] = v
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        let i = self.ix(row, col);
        &mut self.values[i]
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = &T> {
        assert!(row < self.rows);
        let i = row * self.cols;
        self.values[i..i + self.cols].iter()
    }

    pub fn diagonal(&self) -> impl Iterator<Item = T> + '_ {
        assert_eq!(self.rows, self.cols);
        (0..self.rows).map(move |i| self.get(i, i))
    }

    /// Returns the sub-matrix at the intersection of `rows` and `cols`.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for &r in rows {
            for &c in cols {
                values.push(self.get(r, c));
            }
        }
        Self {
            rows: rows.len(),
            cols: cols.len(),
            values,
        }
    }

    /// Writes `src` into the positions addressed by `rows` x `cols`.
    pub fn set_at(&mut self, rows: &[usize], cols: &[usize], src: &Self) {
        assert_eq!(src.shape(), (rows.len(), cols.len()));
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                self.set(r, c, src.get(i, j));
            }
        }
    }

    pub fn transpose(&self) -> Self {
        let mut values = Vec::with_capacity(self.values.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                values.push(self.get(r, c));
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            values,
        }
    }

    pub fn scale(&self, k: T) -> Self
    where
        T: Mul<Output = T>,
    {
        self.map(|v| v * k)
    }

    pub fn map<F, U>(&self, f: F) -> Mat<U>
    where
        F: Fn(T) -> U,
        U: Default + Copy,
    {
        Mat {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn mat_mat(&self, b: &Self) -> Self
    where
        T: Mul<Output = T> + AddAssign + Zero,
    {
        assert_eq!(
            self.cols, b.rows,
            "rows of b {} must equal columns of a {}",
            b.rows, self.cols
        );
        let mut c = Self::zeros(self.rows, b.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.get(i, k);
                for j in 0..b.cols {
                    *c.get_mut(i, j) += a_ik * b.get(k, j);
                }
            }
        }
        c
    }

    pub fn is_zero(&self) -> bool
    where
        T: Zero,
    {
        self.values.iter().all(|v| v.is_zero())
    }
}

impl Mat<Complex64> {
    /// Inverts a square complex matrix through a partial pivoting LU
    /// factorization. Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        assert_eq!(self.rows, self.cols, "matrix must be square");
        let n = self.rows;
        let scale = self.values.iter().map(|v| v.norm()).fold(0.0, f64::max);
        if scale == 0.0 {
            return None;
        }

        let a = faer::Mat::from_fn(n, n, |i, j| {
            let v = self.get(i, j);
            c64::new(v.re, v.im)
        });
        let identity = faer::Mat::from_fn(n, n, |i, j| {
            c64::new(if i == j { 1.0 } else { 0.0 }, 0.0)
        });

        let lu = a.partial_piv_lu();
        let x = lu.solve(identity.as_ref());

        let inv = Mat {
            rows: n,
            cols: n,
            values: (0..n * n)
                .map(|k| {
                    let v = x.read(k / n, k % n);
                    Complex64::new(v.re, v.im)
                })
                .collect(),
        };
        if inv.values.iter().any(|v| !v.is_finite()) {
            return None;
        }

        // a vanishing pivot leaves a finite but meaningless solve
        let residual = (self * &inv)
            .values
            .iter()
            .enumerate()
            .map(|(k, v)| {
                let e = if k / n == k % n { *v - 1.0 } else { *v };
                e.norm()
            })
            .fold(0.0, f64::max);
        if residual > INVERSE_RESIDUAL_TOL {
            return None;
        }
        Some(inv)
    }
}

impl<'a, T> Add<&'a Mat<T>> for &'a Mat<T>
where
    T: Default + Copy + Add<Output = T>,
{
    type Output = Mat<T>;

    fn add(self, rhs: &'a Mat<T>) -> Mat<T> {
        assert_eq!(self.shape(), rhs.shape());
        Mat {
            rows: self.rows,
            cols: self.cols,
            values: self
                .values
                .iter()
                .zip(&rhs.values)
                .map(|(&a, &b)| a + b)
                .collect(),
        }
    }
}

impl<'a, T> Sub<&'a Mat<T>> for &'a Mat<T>
where
    T: Default + Copy + Sub<Output = T>,
{
    type Output = Mat<T>;

    fn sub(self, rhs: &'a Mat<T>) -> Mat<T> {
        assert_eq!(self.shape(), rhs.shape());
        Mat {
            rows: self.rows,
            cols: self.cols,
            values: self
                .values
                .iter()
                .zip(&rhs.values)
                .map(|(&a, &b)| a - b)
                .collect(),
        }
    }
}

impl<'a, T> Mul<&'a Mat<T>> for &'a Mat<T>
where
    T: Default + Copy + Mul<Output = T> + AddAssign + Zero,
{
    type Output = Mat<T>;

    fn mul(self, rhs: &'a Mat<T>) -> Mat<T> {
        self.mat_mat(rhs)
    }
}

impl<'a, T> Neg for &'a Mat<T>
where
    T: Default + Copy + Neg<Output = T>,
{
    type Output = Mat<T>;

    fn neg(self) -> Mat<T> {
        self.map(|v| -v)
    }
}
