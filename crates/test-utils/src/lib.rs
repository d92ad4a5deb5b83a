//! Fixtures shared by the gravtomo test suites: synthetic coefficient
//! arrays and grids, small model files and physical constants.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Path of a test file, or return early from the test when it is missing.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("skipping: {} not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert every element of an iterable of `&f64` lies within `epsilon` of `value`.
#[macro_export]
macro_rules! assert_all_approx_eq {
    ($iter:expr, $value:expr, $epsilon:expr) => {{
        let value: f64 = $value as f64;
        let epsilon: f64 = $epsilon as f64;
        for (idx, v) in $iter.into_iter().enumerate() {
            let v: f64 = *v as f64;
            if (v - value).abs() > epsilon {
                panic!(
                    "assertion failed: element {} = `{:?}` differs from `{:?}` by more than `{:?}`",
                    idx, v, value, epsilon
                );
            }
        }
    }};
}
