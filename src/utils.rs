use crate::errors::QpsIvError;

pub fn fmt_vec_output(v: &[f64]) -> String {
    let mut res = String::new();
    if let Some(last) = v.len().checked_sub(1) {
        if last == 0 {
            return format!("{:.4}", v[0]);
        }
        for n in &v[..last] {
            res.push_str(format!("{:.4}", n).as_str());
            res.push_str(", ");
        }
        res.push_str(format!("{:.4}", &v[last]).as_str());
    }
    res
}

// Validation
pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), QpsIvError> {
    if value.is_nan() || value <= 0.0 || value.is_infinite() {
        Err(QpsIvError::InvalidParameter(
            parameter.to_string(),
            "finite real value greater than 0".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_positive_count_parameter(value: usize, parameter: &str) -> Result<(), QpsIvError> {
    if value == 0 {
        Err(QpsIvError::InvalidParameter(
            parameter.to_string(),
            "a count greater than 0".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Check that a per-individual vector has one entry per individual.
pub fn validate_length(values: &[f64], expected: usize, name: &str) -> Result<(), QpsIvError> {
    if values.len() != expected {
        return Err(QpsIvError::ShapeMismatch(format!(
            "{} has {} entries but there are {} individuals",
            name,
            values.len(),
            expected
        )));
    }
    Ok(())
}

/// Check that the entries of `values` at `indices` are finite.
pub fn validate_finite(values: &[f64], indices: &[usize], name: &str) -> Result<(), QpsIvError> {
    match indices.iter().find(|&&i| !values[i].is_finite()) {
        Some(&i) => Err(QpsIvError::InvalidParameter(
            name.to_string(),
            "finite values".to_string(),
            format!("{} at index {}", values[i], i),
        )),
        None => Ok(()),
    }
}
