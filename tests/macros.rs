//! Common test macros.

/// Assert that an expression evaluates to `Err` matching a pattern.
///
/// # Usage
/// ```ignore
/// assert_err!(Schema::upgrade_to_cover(&a, &b), MergeError::SchemaMismatch { .. });
/// ```
#[macro_export]
macro_rules! assert_err {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Err(other) => panic!(
                "assertion failed: expected `Err({})`\n  got: `Err({:?})`",
                stringify!($pattern),
                other
            ),
            Ok(_) => panic!(
                "assertion failed: expected `Err({})`, got `Ok(..)`",
                stringify!($pattern)
            ),
        }
    };
}

/// Extract the `int` column of each row as `i64`, whatever its concrete type.
#[macro_export]
macro_rules! int_column {
    ($rows:expr, $col:expr) => {
        $rows
            .iter()
            .map(|row| match &row[$col] {
                ironselect::Value::Int(v) => i64::from(*v),
                ironselect::Value::Long(v) => *v,
                other => panic!("not a whole number: {other:?}"),
            })
            .collect::<Vec<i64>>()
    };
}
