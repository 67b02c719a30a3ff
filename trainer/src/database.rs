//! Recorded games in PGN, replayed into `GameRecord`s for training.

use std::fs;
use std::mem;
use std::path::Path;

use cozy_chess::{Board, Move, Piece, Square};
use log::{info, warn};
use utils::{rules, GameOutcome};

use crate::error::Result;
use crate::game::{GameRecord, RecordedPly, Termination};

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Reads every game of a PGN file.
pub fn load_pgn(path: impl AsRef<Path>) -> Result<Vec<GameRecord>> {
    let path = path.as_ref();
    let games = parse_pgn(&fs::read_to_string(path)?);
    info!("Loaded {} games from {}", games.len(), path.display());
    Ok(games)
}

/// Games that do not replay legally are skipped with a warning.
pub fn parse_pgn(text: &str) -> Vec<GameRecord> {
    let mut games = Vec::new();
    for (index, raw) in split_games(text).iter().enumerate() {
        match replay(raw) {
            Ok(record) => games.push(record),
            Err(reason) => warn!("Skipping game {}: {}", index + 1, reason),
        }
    }
    games
}

#[derive(Debug, Default)]
struct RawGame {
    fen: Option<String>,
    result: Option<String>,
    movetext: String,
}

fn split_games(text: &str) -> Vec<RawGame> {
    let mut games = Vec::new();
    let mut current = RawGame::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        match parse_tag(line) {
            Some((name, value)) => {
                if !current.movetext.is_empty() {
                    games.push(mem::take(&mut current));
                }
                match name {
                    "FEN" => current.fen = Some(value.to_string()),
                    "Result" => current.result = Some(value.to_string()),
                    _ => {}
                }
            }
            None => {
                current.movetext.push_str(line);
                current.movetext.push('\n');
            }
        }
    }
    if !current.movetext.is_empty() {
        games.push(current);
    }
    games
}

/// `[Name "Value"]`
fn parse_tag(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (name, value) = inner.split_once(char::is_whitespace)?;
    Some((name, value.trim().trim_matches('"')))
}

/// Movetext words outside comments and variations.
fn tokens(movetext: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut word = String::new();
    let mut in_comment = false;
    let mut in_line_comment = false;
    let mut variation = 0usize;

    for c in movetext.chars() {
        if in_comment {
            in_comment = c != '}';
            continue;
        }
        if in_line_comment {
            in_line_comment = c != '\n';
            continue;
        }
        match c {
            '{' => in_comment = true,
            ';' => in_line_comment = true,
            '(' => variation += 1,
            ')' => variation = variation.saturating_sub(1),
            c if !c.is_whitespace() && variation == 0 => {
                word.push(c);
                continue;
            }
            _ => {}
        }
        if !word.is_empty() {
            out.push(mem::take(&mut word));
        }
    }
    if !word.is_empty() {
        out.push(word);
    }
    out
}

fn replay(raw: &RawGame) -> std::result::Result<GameRecord, String> {
    let mut board = match &raw.fen {
        Some(fen) => fen
            .parse::<Board>()
            .map_err(|e| format!("invalid FEN '{}': {:?}", fen, e))?,
        None => Board::default(),
    };
    let mut result = raw.result.clone();
    let mut plies = Vec::new();

    for token in tokens(&raw.movetext) {
        if RESULTS.contains(&token.as_str()) {
            result = Some(token);
            break;
        }
        let san = if token.starts_with("0-0") || token.starts_with("O-O") {
            token.as_str()
        } else {
            token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
        };
        if san.is_empty() || san.starts_with('$') {
            continue;
        }

        let mv = resolve_san(&board, san)
            .ok_or_else(|| format!("no legal move '{}' at ply {}", san, plies.len() + 1))?;
        let next = rules::apply(&board, mv);
        plies.push(RecordedPly {
            board,
            mv,
            eval: None,
            reference_eval: None,
        });
        board = next;
    }

    if plies.is_empty() {
        return Err("no moves".to_string());
    }

    let (outcome, termination) = match rules::terminal(&board) {
        Some(terminal) => (
            terminal.outcome(board.side_to_move()),
            Termination::from(terminal),
        ),
        None => {
            let outcome = match result.as_deref() {
                Some("1-0") => GameOutcome::WhiteWins,
                Some("0-1") => GameOutcome::BlackWins,
                _ => GameOutcome::Draw,
            };
            (outcome, Termination::Recorded)
        }
    };

    Ok(GameRecord {
        plies,
        final_board: board,
        outcome,
        termination,
    })
}

/// Finds the legal move written as `san` in standard algebraic notation.
pub fn resolve_san(board: &Board, san: &str) -> Option<Move> {
    let san = san.trim_end_matches(['+', '#', '!', '?']);
    let legal = rules::legal_moves(board);

    let king_side = match san {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    };
    if let Some(king_side) = king_side {
        // the king moves onto its own rook
        return legal.into_iter().find(|mv| {
            board.piece_on(mv.from) == Some(Piece::King)
                && board.color_on(mv.to) == Some(board.side_to_move())
                && ((mv.to.file() as u8) > (mv.from.file() as u8)) == king_side
        });
    }

    let (body, promotion) = match san.split_once('=') {
        Some((body, piece)) => (body, Some(piece_from_letter(piece.chars().next()?)?)),
        None => {
            let mut chars = san.chars().rev();
            match (chars.next(), chars.next()) {
                (Some(p), Some(rank)) if rank.is_ascii_digit() && p.is_ascii_uppercase() => {
                    (&san[..san.len() - 1], Some(piece_from_letter(p)?))
                }
                _ => (san, None),
            }
        }
    };

    let mut chars: Vec<char> = body.chars().filter(|&c| c != 'x' && c != ':').collect();
    let piece = match chars.first() {
        Some(&c) if c.is_ascii_uppercase() => {
            chars.remove(0);
            piece_from_letter(c)?
        }
        _ => Piece::Pawn,
    };
    if chars.len() < 2 {
        return None;
    }
    let (hints, to) = chars.split_at(chars.len() - 2);
    let to: Square = to.iter().collect::<String>().parse().ok()?;

    let mut candidates = legal.into_iter().filter(|mv| {
        mv.to == to
            && mv.promotion == promotion
            && board.piece_on(mv.from) == Some(piece)
            && hints.iter().all(|&hint| on_hint(mv.from, hint))
    });
    match (candidates.next(), candidates.next()) {
        (Some(mv), None) => Some(mv),
        _ => None,
    }
}

fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

/// Disambiguation by file or rank.
fn on_hint(square: Square, hint: char) -> bool {
    match hint {
        'a'..='h' => square.file() as u8 == hint as u8 - b'a',
        '1'..='8' => square.rank() as u8 == hint as u8 - b'1',
        _ => false,
    }
}
