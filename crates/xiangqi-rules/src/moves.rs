use crate::board::{in_bounds, in_palace, Board, Color, PieceType, RIVER_BLACK_SIDE, RIVER_RED_SIDE};
use crate::error::MoveError;
use crate::game::Game;

/// Validates a proposed move by a player claiming `mover`, per the ordered
/// rejection list. Returns `Ok(())` if the move is legal.
pub fn validate_move(
    game: &Game,
    mover: Color,
    from_row: i32,
    from_col: i32,
    to_row: i32,
    to_col: i32,
) -> Result<(), MoveError> {
    if !in_bounds(from_row, from_col) || !in_bounds(to_row, to_col) {
        return Err(MoveError::OutOfBounds);
    }
    let (fr, fc, tr, tc) = (
        from_row as usize,
        from_col as usize,
        to_row as usize,
        to_col as usize,
    );

    let piece = game.board.get(fr, fc).ok_or(MoveError::EmptySource)?;
    if piece.color != mover {
        return Err(MoveError::WrongColor);
    }
    if game.current_player != mover {
        return Err(MoveError::WrongTurn);
    }
    if let Some(target) = game.board.get(tr, tc) {
        if target.color == mover {
            return Err(MoveError::CaptureOwnPiece);
        }
    }
    if !piece_geometry_ok(&game.board, piece.piece_type, piece.color, fr, fc, tr, tc) {
        return Err(MoveError::InvalidGeometry);
    }

    let mut tentative = game.board.clone();
    tentative.set(tr, tc, tentative.get(fr, fc));
    tentative.set(fr, fc, None);
    if kings_face_each_other(&tentative) {
        return Err(MoveError::FlyingGeneral);
    }

    Ok(())
}

fn piece_geometry_ok(
    board: &Board,
    piece_type: PieceType,
    color: Color,
    fr: usize,
    fc: usize,
    tr: usize,
    tc: usize,
) -> bool {
    match piece_type {
        PieceType::Rook => valid_rook_move(board, fr, fc, tr, tc),
        PieceType::Cannon => valid_cannon_move(board, fr, fc, tr, tc),
        PieceType::Horse => valid_horse_move(board, fr, fc, tr, tc),
        PieceType::Elephant => valid_elephant_move(board, color, fr, fc, tr, tc),
        PieceType::Advisor => valid_advisor_move(color, fr, fc, tr, tc),
        PieceType::King => valid_king_move(color, fr, fc, tr, tc),
        PieceType::Pawn => valid_pawn_move(color, fr, fc, tr, tc),
    }
}

fn pieces_between(board: &Board, fr: usize, fc: usize, tr: usize, tc: usize) -> usize {
    let mut count = 0;
    if fr == tr {
        let (lo, hi) = (fc.min(tc), fc.max(tc));
        for c in (lo + 1)..hi {
            if board.get(fr, c).is_some() {
                count += 1;
            }
        }
    } else if fc == tc {
        let (lo, hi) = (fr.min(tr), fr.max(tr));
        for r in (lo + 1)..hi {
            if board.get(r, fc).is_some() {
                count += 1;
            }
        }
    }
    count
}

fn valid_rook_move(board: &Board, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    if fr != tr && fc != tc {
        return false;
    }
    pieces_between(board, fr, fc, tr, tc) == 0
}

fn valid_cannon_move(board: &Board, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    if fr != tr && fc != tc {
        return false;
    }
    let screens = pieces_between(board, fr, fc, tr, tc);
    let capturing = board.get(tr, tc).is_some();
    if capturing {
        screens == 1
    } else {
        screens == 0
    }
}

fn valid_horse_move(board: &Board, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    let dr = tr as i32 - fr as i32;
    let dc = tc as i32 - fc as i32;
    let (leg_row, leg_col) = match (dr, dc) {
        (2, 1) | (2, -1) => (fr + 1, fc),
        (-2, 1) | (-2, -1) => (fr - 1, fc),
        (1, 2) | (-1, 2) => (fr, fc + 1),
        (1, -2) | (-1, -2) => (fr, fc - 1),
        _ => return false,
    };
    board.get(leg_row, leg_col).is_none()
}

fn valid_elephant_move(
    board: &Board,
    color: Color,
    fr: usize,
    fc: usize,
    tr: usize,
    tc: usize,
) -> bool {
    let dr = tr as i32 - fr as i32;
    let dc = tc as i32 - fc as i32;
    if dr.abs() != 2 || dc.abs() != 2 {
        return false;
    }
    let mid_row = (fr as i32 + dr / 2) as usize;
    let mid_col = (fc as i32 + dc / 2) as usize;
    if board.get(mid_row, mid_col).is_some() {
        return false;
    }
    match color {
        Color::Red => tr <= RIVER_RED_SIDE,
        Color::Black => tr >= RIVER_BLACK_SIDE,
    }
}

fn valid_advisor_move(color: Color, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    let dr = tr as i32 - fr as i32;
    let dc = tc as i32 - fc as i32;
    if dr.abs() != 1 || dc.abs() != 1 {
        return false;
    }
    in_palace(color, tr, tc)
}

fn valid_king_move(color: Color, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    let dr = (tr as i32 - fr as i32).abs();
    let dc = (tc as i32 - fc as i32).abs();
    if dr + dc != 1 {
        return false;
    }
    in_palace(color, tr, tc)
}

fn valid_pawn_move(color: Color, fr: usize, fc: usize, tr: usize, tc: usize) -> bool {
    let dr = tr as i32 - fr as i32;
    let dc = tc as i32 - fc as i32;
    let crossed = match color {
        Color::Red => fr >= RIVER_BLACK_SIDE,
        Color::Black => fr <= RIVER_RED_SIDE,
    };
    let forward = match color {
        Color::Red => 1,
        Color::Black => -1,
    };
    if dc == 0 && dr == forward {
        return true;
    }
    if crossed && dr == 0 && dc.abs() == 1 {
        return true;
    }
    false
}

/// True if both kings are on the board, share a column, and no piece lies
/// strictly between them ("flying general").
pub fn kings_face_each_other(board: &Board) -> bool {
    let red_king = board.find_king(Color::Red);
    let black_king = board.find_king(Color::Black);
    let (Some((rr, rc)), Some((br, bc))) = (red_king, black_king) else {
        return false;
    };
    if rc != bc {
        return false;
    }
    pieces_between(board, rr, rc, br, bc) == 0
}
