//! Controller state file
//!
//! The persisted Metropolis chain state. The means vector and covariance
//! matrix go on the wire as comma-separated decimal strings (the matrix
//! row-major), and non-finite likelihoods as the string `-Infinity`.

use std::fs;
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

mod json_double {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    struct DoubleVisitor;

    impl Visitor<'_> for DoubleVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a number or the strings Infinity/-Infinity/NaN")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => other
                    .parse()
                    .map_err(|_| E::custom(format!("not a double: {other}"))),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(DoubleVisitor)
    }
}

mod csv_vector {
    use nalgebra::DVector;
    use serde::de::{self, Deserialize};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DVector<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        let text = value
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DVector<f64>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.trim().is_empty() {
            return Ok(DVector::zeros(0));
        }
        let values: Vec<f64> = text
            .split(',')
            .map(|v| v.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| de::Error::custom(format!("bad means vector: {text}")))?;
        Ok(DVector::from_vec(values))
    }
}

mod csv_matrix {
    use nalgebra::DMatrix;
    use serde::de::{self, Deserialize};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DMatrix<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut parts = Vec::with_capacity(value.len());
        for i in 0..value.nrows() {
            for j in 0..value.ncols() {
                parts.push(value[(i, j)].to_string());
            }
        }
        serializer.serialize_str(&parts.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DMatrix<f64>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.trim().is_empty() {
            return Ok(DMatrix::zeros(0, 0));
        }
        let values: Vec<f64> = text
            .split(',')
            .map(|v| v.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| de::Error::custom(format!("bad covariance matrix: {text}")))?;
        let n = (values.len() as f64).sqrt() as usize;
        if n * n != values.len() {
            return Err(de::Error::custom(format!(
                "covariance matrix has {} entries, not a square",
                values.len()
            )));
        }
        Ok(DMatrix::from_row_slice(n, n, &values))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerState {
    #[serde(rename = "proposedStep")]
    pub proposed_step: String,
    #[serde(rename = "currentStep")]
    pub current_step: String,
    #[serde(rename = "logLikelihood", with = "json_double")]
    pub log_likelihood: f64,
    #[serde(rename = "numSteps")]
    pub num_steps: u32,
    #[serde(rename = "numAcceptedSteps")]
    pub num_accepted_steps: u32,
    #[serde(rename = "lastStepAccepted")]
    pub last_step_accepted: bool,
    #[serde(rename = "rngSeed")]
    pub rng_seed: i64,
    #[serde(rename = "means", with = "csv_vector")]
    pub means: DVector<f64>,
    #[serde(rename = "covariances", with = "csv_matrix")]
    pub covariances: DMatrix<f64>,
}

impl ControllerState {
    /// A fresh chain state of the given dimension.
    pub fn fresh(dimension: usize) -> Self {
        Self {
            proposed_step: String::new(),
            current_step: String::new(),
            log_likelihood: f64::NEG_INFINITY,
            num_steps: 0,
            num_accepted_steps: 0,
            last_step_accepted: false,
            rng_seed: 0,
            means: DVector::zeros(dimension),
            covariances: DMatrix::zeros(dimension, dimension),
        }
    }

    /// Load the state file; a missing or empty file becomes a fresh state
    /// which is immediately persisted.
    pub fn load(path: &Path, dimension: usize) -> Result<Self> {
        if !path.exists() {
            debug!(file = %path.display(), "no state file, starting fresh");
            let state = Self::fresh(dimension);
            state.save(path)?;
            return Ok(state);
        }
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            let state = Self::fresh(dimension);
            state.save(path)?;
            return Ok(state);
        }
        serde_json::from_str(&text).map_err(|e| Error::BadState(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| Error::BadState(e.to_string()))?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
