use thiserror::Error;

/// A proposed move is rejected for exactly one of these reasons.
///
/// Variants are checked in declaration order by [`crate::validate_move`];
/// the first one that applies wins. The `Display` text is part of the
/// wire contract — clients match on it — so it must not be reworded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Invalid position")]
    OutOfBounds,
    #[error("No piece at source position")]
    EmptySource,
    #[error("Not your piece")]
    WrongColor,
    #[error("Not your turn")]
    WrongTurn,
    #[error("Cannot capture your own piece")]
    CaptureOwnPiece,
    #[error("Invalid move for this piece")]
    InvalidGeometry,
    #[error("Kings cannot face each other directly")]
    FlyingGeneral,
}
