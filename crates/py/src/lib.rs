use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use wprank_core::{OrdinalSummary, RankError};

fn to_py_err(err: RankError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Weighted percentile rank of a 1-D float array, in input order.
#[pyfunction]
fn weighted_percentile_rank(
    py: Python<'_>,
    weights: PyReadonlyArray1<'_, f64>,
) -> PyResult<Py<PyArray1<f64>>> {
    let weights = weights.as_array().to_owned();
    let ranks = py
        .detach(|| wprank_core::weighted_percentile_rank_array(&weights))
        .map_err(to_py_err)?;
    Ok(ranks.into_pyarray(py).into())
}

#[pyfunction]
fn weighted_percentile_rank_rows(
    py: Python<'_>,
    data: PyReadonlyArray2<'_, f64>,
) -> PyResult<Py<PyArray2<f64>>> {
    let data = data.as_array().to_owned();
    let ranks = py
        .detach(|| wprank_core::weighted_percentile_rank_rows(&data))
        .map_err(to_py_err)?;
    Ok(ranks.into_pyarray(py).into())
}

#[pyfunction]
fn ordinal_summary<'py>(
    py: Python<'py>,
    values: PyReadonlyArray1<'_, f64>,
) -> PyResult<Bound<'py, PyDict>> {
    let values = values.as_array().to_vec();
    let summary = py
        .detach(|| OrdinalSummary::from_values(&values))
        .map_err(to_py_err)?;

    let dict = PyDict::new(py);
    dict.set_item("rank", summary.rank)?;
    dict.set_item("percentile_rank", summary.percentile_rank)?;
    dict.set_item("inverse_rank", summary.inverse_rank)?;
    dict.set_item("cumulative_probability", summary.cumulative_probability)?;
    Ok(dict)
}

#[pymodule]
fn wprank_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(weighted_percentile_rank, m)?)?;
    m.add_function(wrap_pyfunction!(weighted_percentile_rank_rows, m)?)?;
    m.add_function(wrap_pyfunction!(ordinal_summary, m)?)?;
    m.add("__all__", vec![
        "weighted_percentile_rank",
        "weighted_percentile_rank_rows",
        "ordinal_summary",
    ])?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
