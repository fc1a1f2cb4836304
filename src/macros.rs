#[macro_export]
macro_rules! wrapper {
    // Single expression (like a function name or closure)
    ($f:expr) => {{
        $f()
    }};
    ($f:expr, $( $args:expr $(,)? )* ) => {{
        $f( $($args,)* )
    }};
}

/// Retries a call up to `MAX_ATTEMPTS` times with a fixed back-off, per the
/// bounded-retry policy for inverter and price port calls.
#[macro_export]
macro_rules! retry {
    ($( $args:expr$(,)? )+) => {{
        const MAX_ATTEMPTS: u32 = 4;
        const BACKOFF: std::time::Duration = std::time::Duration::from_secs(4);

        let mut attempt = 1;
        loop {
            let res = $crate::wrapper!($( $args, )*);
            if res.is_ok() || attempt >= MAX_ATTEMPTS {
                break res;
            }
            std::thread::sleep(BACKOFF);
            attempt += 1;
        }
    }};
}
