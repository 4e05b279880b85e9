use crate::StrError;
use russell_lab::Vector;
use russell_tensor::{Mandel, Tensor2};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the value of a single named internal variable
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HistoryValue {
    /// A scalar internal variable
    Scalar(f64),

    /// A symmetric second-order tensor internal variable (Mandel basis)
    Tensor(Tensor2),
}

/// Holds an ordered collection of named internal variables
///
/// Models declare the keys they need via their `populate_history` functions
/// and write starting values via `init_history`; the caller (the outer
/// integrator) owns the container and integrates it over time. Keys are
/// unique and declaration order is preserved; it is also the order used when
/// flattening to or restoring from a plain vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct History {
    names: Vec<String>,
    values: Vec<HistoryValue>,
}

impl History {
    /// Allocates an empty container
    pub fn new() -> Self {
        History {
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Declares a scalar entry initialized to zero
    pub fn add_scalar(&mut self, name: &str) -> Result<(), StrError> {
        if self.contains(name) {
            return Err("history key is already declared");
        }
        self.names.push(name.to_string());
        self.values.push(HistoryValue::Scalar(0.0));
        Ok(())
    }

    /// Declares a symmetric tensor entry initialized to zero
    pub fn add_tensor(&mut self, name: &str) -> Result<(), StrError> {
        if self.contains(name) {
            return Err("history key is already declared");
        }
        self.names.push(name.to_string());
        self.values.push(HistoryValue::Tensor(Tensor2::new(Mandel::Symmetric)));
        Ok(())
    }

    /// Checks whether a key is declared
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns the value of a scalar entry
    pub fn get_scalar(&self, name: &str) -> Result<f64, StrError> {
        match &self.values[self.index(name)?] {
            HistoryValue::Scalar(value) => Ok(*value),
            HistoryValue::Tensor(..) => Err("history key does not hold a scalar"),
        }
    }

    /// Sets the value of a scalar entry
    pub fn set_scalar(&mut self, name: &str, value: f64) -> Result<(), StrError> {
        let index = self.index(name)?;
        match &mut self.values[index] {
            HistoryValue::Scalar(entry) => {
                *entry = value;
                Ok(())
            }
            HistoryValue::Tensor(..) => Err("history key does not hold a scalar"),
        }
    }

    /// Returns a reference to a tensor entry
    pub fn get_tensor(&self, name: &str) -> Result<&Tensor2, StrError> {
        match &self.values[self.index(name)?] {
            HistoryValue::Tensor(tensor) => Ok(tensor),
            HistoryValue::Scalar(..) => Err("history key does not hold a tensor"),
        }
    }

    /// Sets the value of a tensor entry
    pub fn set_tensor(&mut self, name: &str, value: &Tensor2) -> Result<(), StrError> {
        if value.mandel() != Mandel::Symmetric {
            return Err("tensor entry must use the symmetric 3D Mandel representation");
        }
        let index = self.index(name)?;
        match &mut self.values[index] {
            HistoryValue::Tensor(tensor) => {
                tensor.set_tensor(1.0, value);
                Ok(())
            }
            HistoryValue::Scalar(..) => Err("history key does not hold a tensor"),
        }
    }

    /// Returns the total scalar-equivalent dimension
    pub fn size(&self) -> usize {
        self.values.iter().map(|v| entry_size(v)).sum()
    }

    /// Returns the declared keys in declaration order
    pub fn items(&self) -> Vec<&str> {
        self.names.iter().map(|n| n.as_str()).collect()
    }

    /// Returns the flatten offset of a key
    ///
    /// Derivative vectors and matrices over history entries are indexed by
    /// these offsets.
    pub fn offset(&self, name: &str) -> Result<usize, StrError> {
        let index = self.index(name)?;
        Ok(self.values[..index].iter().map(|v| entry_size(v)).sum())
    }

    /// Flattens all entries to a plain vector in declaration order
    pub fn flatten(&self) -> Vector {
        let mut out = Vector::new(self.size());
        let mut k = 0;
        for value in &self.values {
            match value {
                HistoryValue::Scalar(scalar) => {
                    out[k] = *scalar;
                    k += 1;
                }
                HistoryValue::Tensor(tensor) => {
                    for i in 0..tensor.dim() {
                        out[k] = tensor.vector()[i];
                        k += 1;
                    }
                }
            }
        }
        out
    }

    /// Restores all entries from a plain vector in declaration order
    ///
    /// The round-trip flatten → restore reproduces the original values
    /// bit-for-bit.
    pub fn restore(&mut self, from: &Vector) -> Result<(), StrError> {
        if from.dim() != self.size() {
            return Err("vector size does not match the history layout");
        }
        let mut k = 0;
        for value in &mut self.values {
            match value {
                HistoryValue::Scalar(scalar) => {
                    *scalar = from[k];
                    k += 1;
                }
                HistoryValue::Tensor(tensor) => {
                    for i in 0..tensor.dim() {
                        tensor.vector_mut()[i] = from[k];
                        k += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Sets all entries to zero (e.g., to build a rate container)
    pub fn zero(&mut self) {
        for value in &mut self.values {
            match value {
                HistoryValue::Scalar(scalar) => *scalar = 0.0,
                HistoryValue::Tensor(tensor) => {
                    for i in 0..tensor.dim() {
                        tensor.vector_mut()[i] = 0.0;
                    }
                }
            }
        }
    }

    /// Reads a JSON file with history data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let history = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(history)
    }

    /// Writes a JSON file with the history data
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    fn index(&self, name: &str) -> Result<usize, StrError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or("history key is not declared")
    }
}

fn entry_size(value: &HistoryValue) -> usize {
    match value {
        HistoryValue::Scalar(..) => 1,
        HistoryValue::Tensor(tensor) => tensor.dim(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
