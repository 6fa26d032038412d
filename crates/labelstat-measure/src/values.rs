//! Per-object output arrays

/// Dense per-object values, index `(label - 1) * channels + c`
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValues {
    /// Integer values (cardinalities, raw first non-zero values)
    Int(Vec<i32>),
    /// Floating-point values
    Float(Vec<f32>),
}

impl ObjectValues {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            ObjectValues::Int(v) => v.len(),
            ObjectValues::Float(v) => v.len(),
        }
    }

    /// Check whether there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer values, if stored as integers
    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            ObjectValues::Int(v) => Some(v),
            ObjectValues::Float(_) => None,
        }
    }

    /// Float values, if stored as floats
    pub fn as_float(&self) -> Option<&[f32]> {
        match self {
            ObjectValues::Int(_) => None,
            ObjectValues::Float(v) => Some(v),
        }
    }

    /// Copy the values as `f32`
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            ObjectValues::Int(v) => v.iter().map(|&x| x as f32).collect(),
            ObjectValues::Float(v) => v.clone(),
        }
    }
}
