/// Reports what the adapter is doing to the `sentry` log target.
///
/// This never goes through a [`Core`](crate::Core), so an application that
/// bridges the `log` crate into its own logger cannot loop back into us.
macro_rules! sentry_debug {
    ($($arg:tt)*) => {
        ::log::debug!(target: "sentry", $($arg)*)
    };
}
