use crate::dense::Mat;
use num_complex::Complex64;
use num_traits::Zero;
use sparsetools::coo::Coo;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Borrowed coordinate form of a sparse matrix. Duplicate entries are
/// summed when read.
pub struct Triplets<'a, T> {
    rows: usize,
    cols: usize,
    rowidx: &'a [usize],
    colidx: &'a [usize],
    values: &'a [T],
}

impl<'a> From<&'a Coo<usize, Complex64>> for Triplets<'a, Complex64> {
    fn from(coo: &'a Coo<usize, Complex64>) -> Self {
        Self {
            rows: coo.rows(),
            cols: coo.cols(),
            rowidx: coo.rowidx(),
            colidx: coo.colidx(),
            values: coo.values(),
        }
    }
}

impl<'a> From<&'a Coo<usize, f64>> for Triplets<'a, f64> {
    fn from(coo: &'a Coo<usize, f64>) -> Self {
        Self {
            rows: coo.rows(),
            cols: coo.cols(),
            rowidx: coo.rowidx(),
            colidx: coo.colidx(),
            values: coo.values(),
        }
    }
}

impl<'a, T> Triplets<'a, T>
where
    T: Default + Copy + Zero + AddAssign,
{
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn summed(&self) -> BTreeMap<(usize, usize), T> {
        let mut entries: BTreeMap<(usize, usize), T> = BTreeMap::new();
        for ((&r, &c), &v) in self.rowidx.iter().zip(self.colidx).zip(self.values) {
            *entries.entry((r, c)).or_insert_with(T::zero) += v;
        }
        entries.retain(|_, v| !v.is_zero());
        entries
    }

    /// Indexes of the rows holding at least one nonzero element, ascending.
    pub fn nonzero_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.summed().keys().map(|&(r, _)| r).collect();
        rows.dedup();
        rows
    }

    /// Indexes of the columns holding at least one nonzero element, ascending.
    pub fn nonzero_cols(&self) -> Vec<usize> {
        let mut cols: Vec<usize> = self.summed().keys().map(|&(_, c)| c).collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    /// Dense `rows.len() x cols.len()` submatrix.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Mat<T> {
        let mut row_pos = vec![None; self.rows];
        rows.iter().enumerate().for_each(|(i, &r)| row_pos[r] = Some(i));
        let mut col_pos = vec![None; self.cols];
        cols.iter().enumerate().for_each(|(j, &c)| col_pos[c] = Some(j));

        let mut sub = Mat::zeros(rows.len(), cols.len());
        for ((&r, &c), &v) in self.rowidx.iter().zip(self.colidx).zip(self.values) {
            if let (Some(i), Some(j)) = (row_pos[r], col_pos[c]) {
                *sub.get_mut(i, j) += v;
            }
        }
        sub
    }

    pub fn to_dense(&self) -> Mat<T> {
        let rows: Vec<usize> = (0..self.rows).collect();
        let cols: Vec<usize> = (0..self.cols).collect();
        self.select(&rows, &cols)
    }
}

/// Nonzero entries of `block` placed at `rows` x `cols`, row by row.
pub fn block_entries<'a, T>(
    rows: &'a [usize],
    cols: &'a [usize],
    block: &'a Mat<T>,
) -> impl Iterator<Item = (usize, usize, T)> + 'a
where
    T: Default + Copy + Zero,
{
    rows.iter().enumerate().flat_map(move |(i, &r)| {
        cols.iter()
            .enumerate()
            .map(move |(j, &c)| (r, c, block.get(i, j)))
            .filter(|(_, _, v)| !v.is_zero())
    })
}
