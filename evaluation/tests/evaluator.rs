use cozy_chess::Board;
use evaluation::features::NUM_FEATURES;
use evaluation::{
    Evaluator, EvaluatorParameters, LearnedWeights, ParameterStore, ParametricEvaluator,
};
use utils::{game_phase, Position};

const POSITIONS: [&str; 5] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
];

fn eval(evaluator: &mut impl Evaluator, board: &Board) -> i16 {
    evaluator.evaluate(&Position::new(board), game_phase(board))
}

fn swap_case(c: char) -> char {
    if c.is_ascii_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c.to_ascii_uppercase()
    }
}

// Vertical flip with colors swapped. Assumes no en passant square.
fn mirror(fen: &str) -> Board {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let placement = parts[0]
        .split('/')
        .rev()
        .map(|rank| rank.chars().map(swap_case).collect::<String>())
        .collect::<Vec<_>>()
        .join("/");
    let side = if parts[1] == "w" { "b" } else { "w" };
    let castling = if parts[2] == "-" {
        "-".to_string()
    } else {
        let mut rights: Vec<char> = parts[2].chars().map(swap_case).collect();
        rights.sort_by_key(|c| (c.is_ascii_lowercase(), *c));
        rights.into_iter().collect()
    };
    format!(
        "{} {} {} - {} {}",
        placement, side, castling, parts[4], parts[5]
    )
    .parse()
    .unwrap()
}

#[test]
fn evaluation_is_deterministic() {
    let mut evaluator = ParametricEvaluator::fixed(EvaluatorParameters::default());
    for fen in POSITIONS {
        let board: Board = fen.parse().unwrap();
        let first = eval(&mut evaluator, &board);
        // interleave another position to disturb the pawn cache
        let other: Board = POSITIONS[3].parse().unwrap();
        eval(&mut evaluator, &other);
        assert_eq!(first, eval(&mut evaluator, &board), "{}", fen);
    }
}

#[test]
fn evaluation_is_white_positive_and_color_symmetric() {
    let mut weights = LearnedWeights::default();
    for (i, w) in weights.0.iter_mut().enumerate() {
        *w = 0.05 * (i as f32 - 5.0);
    }
    let params = EvaluatorParameters::default().with_learned(weights);
    let mut evaluator = ParametricEvaluator::fixed(params);

    for fen in POSITIONS {
        let board: Board = fen.parse().unwrap();
        let mirrored = mirror(fen);
        let a = eval(&mut evaluator, &board);
        let b = eval(&mut evaluator, &mirrored);
        assert!((a as i32 + b as i32).abs() <= 1, "{}: {} vs {}", fen, a, b);
    }
}

#[test]
fn side_to_move_does_not_flip_sign() {
    let mut evaluator = ParametricEvaluator::fixed(EvaluatorParameters::default());
    let white: Board = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
    let black: Board = "4k3/8/8/8/8/8/8/R3K3 b - - 0 1".parse().unwrap();
    let a = eval(&mut evaluator, &white);
    let b = eval(&mut evaluator, &black);
    assert!(a > 300);
    assert_eq!(a, b);
}

#[test]
fn material_only_counts_material() {
    let mut evaluator = ParametricEvaluator::fixed(EvaluatorParameters::material_only());
    let start = Board::default();
    assert_eq!(eval(&mut evaluator, &start), 0);

    // Black is a knight down; at phase < 1 the value is tapered
    let board: Board = "r1bqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        .parse()
        .unwrap();
    let score = eval(&mut evaluator, &board);
    assert!((295..=325).contains(&score), "{}", score);
}

#[test]
fn refresh_picks_up_published_parameters() {
    let store = ParameterStore::shared(EvaluatorParameters::material_only());
    let mut evaluator = ParametricEvaluator::new(store.clone());
    let board: Board = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
    let before = eval(&mut evaluator, &board);

    // +1 pawn per rook of advantage through the learned term
    let mut weights = LearnedWeights([0.0; NUM_FEATURES]);
    weights.0[3] = 1.0;
    store.publish(store.snapshot().with_learned(weights));

    // unchanged until refreshed
    assert_eq!(eval(&mut evaluator, &board), before);
    assert!(evaluator.refresh());
    assert_eq!(eval(&mut evaluator, &board), before + 100);
    assert!(!evaluator.refresh());
}
