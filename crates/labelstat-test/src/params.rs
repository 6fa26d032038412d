//! Regression test parameters and comparisons

use crate::error::{TestError, TestResult};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results with expected values (default)
    #[default]
    Compare,
    /// Compare and print every compared value
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, the running comparison index, the mode and all
/// recorded failures. A failed comparison does not stop the test; the
/// verdict is given by [`RegParams::cleanup`].
pub struct RegParams {
    /// Name of the test (e.g., "lists")
    pub test_name: String,
    /// Current comparison index (incremented before each comparison)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "cardinalities")
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current comparison index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// Two NaN values are equal.
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        if self.display() {
            eprintln!("{}: expected {}, actual {}", self.index, expected, actual);
        }
        match value_mismatch(self.index, expected, actual, delta) {
            Ok(()) => true,
            Err(e) => {
                let msg = format!("Failure in {}_reg: {}", self.test_name, e);
                self.fail(msg)
            }
        }
    }

    /// Compare two integer arrays for exact equality
    pub fn compare_int_arrays(&mut self, expected: &[i32], actual: &[i32]) -> bool {
        self.index += 1;
        if expected.len() != actual.len() {
            let msg = format!(
                "Failure in {}_reg: array comparison for index {} - lengths {} vs {}",
                self.test_name,
                self.index,
                expected.len(),
                actual.len()
            );
            return self.fail(msg);
        }
        if let Some(k) = (0..expected.len()).find(|&k| expected[k] != actual[k]) {
            let msg = format!(
                "Failure in {}_reg: array comparison for index {} - element {}: expected {}, actual {}",
                self.test_name, self.index, k, expected[k], actual[k]
            );
            return self.fail(msg);
        }
        true
    }

    /// Compare two float arrays element-wise within `delta`
    ///
    /// NaN matches only NaN.
    pub fn compare_float_arrays(&mut self, expected: &[f32], actual: &[f32], delta: f64) -> bool {
        self.index += 1;
        if expected.len() != actual.len() {
            let msg = format!(
                "Failure in {}_reg: array comparison for index {} - lengths {} vs {}",
                self.test_name,
                self.index,
                expected.len(),
                actual.len()
            );
            return self.fail(msg);
        }
        for (k, (&e, &a)) in expected.iter().zip(actual).enumerate() {
            if let Err(err) = value_mismatch(k, e as f64, a as f64, delta) {
                let msg = format!(
                    "Failure in {}_reg: array comparison for index {} - {}",
                    self.test_name, self.index, err
                );
                return self.fail(msg);
            }
        }
        true
    }

    /// Record a boolean check
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if condition {
            true
        } else {
            let msg = format!(
                "Failure in {}_reg: check {} failed: {}",
                self.test_name, self.index, what
            );
            self.fail(msg)
        }
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all comparisons passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all comparisons have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

fn value_mismatch(index: usize, expected: f64, actual: f64, delta: f64) -> TestResult<()> {
    let same = if expected.is_nan() || actual.is_nan() {
        expected.is_nan() && actual.is_nan()
    } else {
        (expected - actual).abs() <= delta
    };
    if same {
        Ok(())
    } else {
        Err(TestError::ValueMismatch {
            index,
            expected,
            actual,
            delta,
        })
    }
}
