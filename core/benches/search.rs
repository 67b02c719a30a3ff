use cozy_chess::Board;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use evaluation::EvaluatorParameters;
use quill::{Agent, AgentConfig};
use search::EngineConfig;

const SEARCH_DEPTH: u8 = 5;

const POSITIONS: &[(&str, &str)] = &[
    (
        "start",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "italian",
        "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    ),
    (
        "tactical",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ),
    ("rook_ending", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
    ("pawn_ending", "8/5k2/3p4/1p1Pp3/pP2P3/P4K2/8/8 w - - 0 1"),
];

fn agent() -> Agent {
    Agent::with_parameters(EvaluatorParameters::default(), &EngineConfig::default())
}

fn bench_search(c: &mut Criterion) {
    let mut agent = agent();
    let config = AgentConfig {
        depth_limit: Some(SEARCH_DEPTH),
        ..AgentConfig::default()
    };

    let mut group = c.benchmark_group(format!("choose_move/depth_{}", SEARCH_DEPTH));
    group.sample_size(10);
    group.sampling_mode(SamplingMode::Flat);

    for (name, fen) in POSITIONS {
        let board: Board = fen.parse().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &board, |b, board| {
            b.iter(|| {
                agent.new_game();
                black_box(agent.choose_move(board, &config).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut agent = agent();
    let boards: Vec<Board> = POSITIONS.iter().map(|(_, fen)| fen.parse().unwrap()).collect();

    c.bench_function("evaluate", |b| {
        b.iter(|| {
            for board in &boards {
                black_box(agent.evaluate(board));
            }
        })
    });
}

criterion_group!(benches, bench_search, bench_evaluate);
criterion_main!(benches);
