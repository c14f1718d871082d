//! Data
//!
//! Borrowed matrix views over caller-owned covariate buffers, and the two
//! accepted ways of describing which covariates are continuous.
use crate::errors::QpsIvError;

/// Contiguous Column Major Matrix data container.
///
/// This structure borrows a dense matrix of values stored in a single contiguous
/// memory block, in column-major order (Fortran-style), which allows for efficient
/// column slicing when computing per-covariate moments.
///
/// # Type Parameters
/// * `T` - The numeric type of the data (e.g., `f64`).
#[derive(Debug, Clone, Copy)]
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    // Defaults to column major
    /// Create a new Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix { data, rows, cols }
    }

    /// Check that the backing slice holds exactly `rows * cols` items.
    pub fn validate(&self, name: &str) -> Result<(), QpsIvError> {
        if self.data.len() != self.rows * self.cols {
            return Err(QpsIvError::ShapeMismatch(format!(
                "{} holds {} values, expected {} rows x {} columns = {}",
                name,
                self.data.len(),
                self.rows,
                self.cols,
                self.rows * self.cols
            )));
        }
        Ok(())
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[j * self.rows + i]
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Get access to a row of the data, as an iterator.
    pub fn get_row_iter(&self, row: usize) -> std::iter::StepBy<std::iter::Skip<std::slice::Iter<'a, T>>> {
        self.data.iter().skip(row).step_by(self.rows.max(1))
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<T> {
        if self.cols == 0 {
            return Vec::new();
        }
        self.get_row_iter(row).copied().collect()
    }
}

/// The covariates of every individual, in one of two layouts.
///
/// Both layouts describe the same information: from `Split` the combined
/// form is the column concatenation with continuous columns first.
#[derive(Debug, Clone)]
pub enum Covariates<'a> {
    /// Separate continuous (n x p_c) and discrete (n x p_d) matrices.
    Split {
        continuous: Matrix<'a, f64>,
        discrete: Matrix<'a, f64>,
    },
    /// One combined matrix (n x p) and the column indices of the continuous covariates.
    Combined {
        data: Matrix<'a, f64>,
        continuous: Vec<usize>,
    },
}

/// Covariates laid out per individual, after validating a [`Covariates`] value.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateRows {
    /// Continuous covariates of each individual (n rows of length p_c).
    pub continuous: Vec<Vec<f64>>,
    /// Discrete covariates of each individual (n rows of length p_d).
    pub discrete: Vec<Vec<f64>>,
}

impl CovariateRows {
    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.continuous.len()
    }

    /// Whether there are no individuals.
    pub fn is_empty(&self) -> bool {
        self.continuous.is_empty()
    }

    /// Number of continuous covariates.
    pub fn n_continuous(&self) -> usize {
        self.continuous.first().map_or(0, |r| r.len())
    }
}

impl<'a> Covariates<'a> {
    /// Create the split layout.
    ///
    /// A `discrete` matrix with no columns stands for "no discrete covariates",
    /// whatever its row count, so `Matrix::new(&[], 0, 0)` is accepted.
    pub fn split(continuous: Matrix<'a, f64>, discrete: Matrix<'a, f64>) -> Self {
        Covariates::Split { continuous, discrete }
    }

    /// Create the combined layout.
    pub fn combined(data: Matrix<'a, f64>, continuous: Vec<usize>) -> Self {
        Covariates::Combined { data, continuous }
    }

    /// Number of individuals described.
    pub fn rows(&self) -> usize {
        match self {
            Covariates::Split { continuous, .. } => continuous.rows,
            Covariates::Combined { data, .. } => data.rows,
        }
    }

    /// Validate the layout and gather every individual's continuous and discrete covariates.
    ///
    /// Continuous covariates keep the order in which their columns are listed,
    /// discrete covariates keep their column order in the combined matrix.
    pub fn resolve(&self) -> Result<CovariateRows, QpsIvError> {
        match self {
            Covariates::Split { continuous, discrete } => {
                continuous.validate("continuous covariate matrix")?;
                discrete.validate("discrete covariate matrix")?;
                if discrete.cols > 0 && continuous.rows != discrete.rows {
                    return Err(QpsIvError::ShapeMismatch(format!(
                        "continuous covariates have {} rows but discrete covariates have {}",
                        continuous.rows, discrete.rows
                    )));
                }
                if continuous.cols == 0 {
                    return Err(QpsIvError::NoContinuousCovariates);
                }
                let (continuous, discrete): (Vec<Vec<f64>>, Vec<Vec<f64>>) = (0..continuous.rows)
                    .map(|i| (continuous.get_row(i), discrete.get_row(i)))
                    .unzip();
                Ok(CovariateRows { continuous, discrete })
            }
            Covariates::Combined { data, continuous } => {
                data.validate("covariate matrix")?;
                if continuous.is_empty() {
                    return Err(QpsIvError::NoContinuousCovariates);
                }
                let mut is_continuous = vec![false; data.cols];
                for &c in continuous {
                    if c >= data.cols {
                        return Err(QpsIvError::ShapeMismatch(format!(
                            "continuous column index {} is out of range for {} columns",
                            c, data.cols
                        )));
                    }
                    if is_continuous[c] {
                        return Err(QpsIvError::ShapeMismatch(format!(
                            "continuous column index {} is listed more than once",
                            c
                        )));
                    }
                    is_continuous[c] = true;
                }
                let discrete: Vec<usize> = (0..data.cols).filter(|j| !is_continuous[*j]).collect();
                let gather = |cols: &[usize]| -> Vec<Vec<f64>> {
                    (0..data.rows)
                        .map(|i| cols.iter().map(|&j| *data.get(i, j)).collect())
                        .collect()
                };
                Ok(CovariateRows {
                    continuous: gather(continuous),
                    discrete: gather(&discrete),
                })
            }
        }
    }
}
