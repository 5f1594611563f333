//! Macros for ergonomic machine construction.

/// Build a [`Context`](crate::core::Context) from `key => value` pairs.
///
/// Values go through `serde_json::Value::from`, so anything with a `From`
/// conversion into a JSON value works.
///
/// # Example
///
/// ```
/// use statewright::context;
///
/// let ctx = context! {
///     "should_move" => false,
///     "speed" => 2.5,
///     "name" => "hero",
/// };
///
/// assert_eq!(ctx.get_bool("should_move"), Some(false));
/// assert_eq!(ctx.get_f64("speed"), Some(2.5));
/// assert_eq!(ctx.get_str("name"), Some("hero"));
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::core::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::core::Context::new();
        $(
            ctx.set($key, $value);
        )+
        ctx
    }};
}
