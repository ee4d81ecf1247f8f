use thiserror::Error;

/// Failure modes of the pure math layer.
///
/// These surface at the engine boundary as `Conflict` or `ValidationFailed`
/// errors; none of them are recoverable inside a computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// A subtraction on an unsigned decimal would have gone below zero.
    #[error("uint out of bounds: {0}")]
    UintOutOfBounds(String),

    /// Division by a zero denominator.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    /// A sqrt-price pair was not ordered or not positive.
    #[error("invalid price range")]
    InvalidPriceRange,

    /// The requested output exceeds what the available liquidity can provide.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// A tick index fell outside `[MIN_TICK, MAX_TICK]`.
    #[error("tick {0} out of bounds")]
    TickOutOfBounds(i32),

    /// A decimal literal could not be parsed or was negative where a
    /// non-negative value is required.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),
}
