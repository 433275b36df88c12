use nalgebra_sparse::CsrMatrix;
use ndarray::ArrayView2;
use nshare::IntoNalgebra;

/// Compressed-row copy of a dense embedding matrix for the iterative
/// backends. Exact zeros (padding cells, zero series values) are not stored.
pub(crate) fn to_csr(x: ArrayView2<f64>) -> CsrMatrix<f64> {
    let dense = x.to_owned().into_nalgebra();
    CsrMatrix::from(&dense)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_csr_keeps_layout_and_drops_zeros() {
        let a = array![[1.0, 0.0, 3.0], [0.0, 5.0, 6.0]];
        let csr = to_csr(a.view());
        assert_eq!((csr.nrows(), csr.ncols()), (2, 3));
        assert_eq!(csr.nnz(), 4);
        let entry = csr.get_entry(1, 2).map(|e| e.into_value());
        assert_eq!(entry, Some(6.0));

        let t = to_csr(a.t());
        assert_eq!((t.nrows(), t.ncols()), (3, 2));
        assert_eq!(t.get_entry(2, 1).map(|e| e.into_value()), Some(6.0));
    }
}
