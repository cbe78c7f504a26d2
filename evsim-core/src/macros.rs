#[macro_export]
/// Generates a String similar to output of `dbg` but without printing
macro_rules! format_dbg {
    ($dbg_expr:expr) => {
        format!(
            "[{}:{}] {}: {:?}",
            file!(),
            line!(),
            stringify!($dbg_expr),
            $dbg_expr
        )
    };
    () => {
        format!("[{}:{}]", file!(), line!())
    };
}

#[macro_export]
/// Bails with a [`ConfigurationError`](crate::error::Error::ConfigurationError)
/// built from a format string
macro_rules! bail_config {
    ($($arg:tt)*) => {
        return Err($crate::anyhow::Error::new($crate::error::Error::ConfigurationError(format!($($arg)*))))
    };
}
