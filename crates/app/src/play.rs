use std::io::Write;

use chrono::Duration;
use gefen_core::model::{GameMode, ItemId, MatchStyle};
use gefen_core::time::format_elapsed;
use services::sessions::{ActiveSession, Face, LearningTour};
use services::{GameLoopService, ProgressService, TourStep};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::{AssemblyPrinter, ChallengePrinter, MatchPrinter};

/// Keep driving timers after input until nothing is due sooner than this.
const QUIET_HORIZON_MS: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Help,
    Quit,
    Leave,
    Stats,
    Reset,
    Start(GameMode),
    Match {
        mode: GameMode,
        style: MatchStyle,
        pairs: Option<u32>,
    },
    Puzzle {
        subject: Option<ItemId>,
        grid: Option<(u32, u32)>,
    },
    Tour(GameMode),
    Pick(usize),
    Place(usize),
    Replay,
    Next,
    Prev,
    Fact,
    Category,
    Say,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let first = words.next()?;
        let rest: Vec<&str> = words.collect();
        let arg = rest.first().copied();
        let input = match first {
            "help" | "?" => Self::Help,
            "quit" | "q" => Self::Quit,
            "leave" | "x" => Self::Leave,
            "stats" => Self::Stats,
            "reset" => Self::Reset,
            "quiz" => Self::Start(GameMode::Quiz),
            "sound" => Self::Start(GameMode::SoundQuiz),
            "odd" => Self::Start(GameMode::OddOneOut),
            "brands-quiz" => Self::Start(GameMode::BrandsQuiz),
            "parts-quiz" => Self::Start(GameMode::PartsQuiz),
            "match" => Self::parse_match(GameMode::Matching, &rest),
            "parts-match" => Self::parse_match(GameMode::PartsMatching, &rest),
            "puzzle" => Self::parse_puzzle(&rest),
            "learn" => Self::Tour(GameMode::Learning),
            "brands" => Self::Tour(GameMode::Brands),
            "parts" => Self::Tour(GameMode::Parts),
            "p" => match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(cell) if cell > 0 => Self::Place(cell - 1),
                _ => Self::Unknown(line.to_owned()),
            },
            "r" => Self::Replay,
            "n" => Self::Next,
            "b" => Self::Prev,
            "f" => Self::Fact,
            "c" => Self::Category,
            "s" => Self::Say,
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Self::Pick(n - 1),
                _ => Self::Unknown(line.to_owned()),
            },
        };
        Some(input)
    }

    /// `[style] [pairs]` in either order; anything else falls back to classic.
    fn parse_match(mode: GameMode, args: &[&str]) -> Self {
        let mut style = MatchStyle::Classic;
        let mut pairs = None;
        for arg in args {
            match *arg {
                "classic" => style = MatchStyle::Classic,
                "images" => style = MatchStyle::Images,
                "audio" => style = MatchStyle::Audio,
                other => pairs = other.parse().ok().or(pairs),
            }
        }
        Self::Match { mode, style, pairs }
    }

    /// `[id] [rows]x[cols]` in either order.
    fn parse_puzzle(args: &[&str]) -> Self {
        let mut subject = None;
        let mut grid = None;
        for arg in args {
            match parse_grid(arg) {
                Some(size) => grid = Some(size),
                None => subject = Some(ItemId::new(*arg)),
            }
        }
        Self::Puzzle { subject, grid }
    }
}

fn parse_grid(arg: &str) -> Option<(u32, u32)> {
    let (rows, cols) = arg.split_once(['x', 'X'])?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}

fn print_help() {
    println!("games:  quiz | sound | odd | brands-quiz | parts-quiz");
    println!("        match [classic|images|audio] [pairs] | parts-match [style] [pairs]");
    println!("        puzzle [id] [rows]x[cols]");
    println!("browse: learn | brands | parts   then n (next) b (back) f (fact) c (category) s (say)");
    println!("play:   <number> picks an option, flips a card or selects a piece");
    println!("        p <number> places the selected piece, r replays the question");
    println!("other:  stats | reset | leave | quit");
}

/// Interactive loop on stdin until `quit` or end of input.
///
/// # Errors
///
/// Returns the I/O error that ended reading stdin.
pub async fn run(mut game: GameLoopService) -> std::io::Result<()> {
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(input) = Input::parse(&line) else {
            continue;
        };
        if input == Input::Quit {
            break;
        }
        handle(&mut game, input).await;
        settle(&mut game).await;
        render(&game);
    }
    game.leave().await;
    Ok(())
}

async fn handle(game: &mut GameLoopService, input: Input) {
    let started = match input {
        Input::Help => {
            print_help();
            Ok(())
        }
        Input::Quit => Ok(()),
        Input::Leave => {
            game.leave().await;
            Ok(())
        }
        Input::Stats => {
            print_stats(game.progress()).await;
            Ok(())
        }
        Input::Reset => {
            let removed = game.reset_progress().await;
            println!("progress cleared ({removed} records)");
            Ok(())
        }
        Input::Start(mode) => game.start_challenge(mode, Box::new(ChallengePrinter)).await,
        Input::Match { mode, style, pairs } => {
            game.start_matching(mode, style, pairs, Box::new(MatchPrinter))
                .await
        }
        Input::Puzzle { subject, grid } => {
            game.start_puzzle(subject.as_ref(), grid, Box::new(AssemblyPrinter))
                .await
        }
        Input::Tour(mode) => game.open_tour(mode).await,
        Input::Pick(n) => {
            pick(game, n);
            Ok(())
        }
        Input::Place(cell) => {
            game.place(cell);
            Ok(())
        }
        Input::Replay => {
            game.replay_prompt();
            Ok(())
        }
        Input::Next => {
            game.tour_step(TourStep::Next).await;
            Ok(())
        }
        Input::Prev => {
            game.tour_step(TourStep::Prev).await;
            Ok(())
        }
        Input::Fact => {
            with_tour(game, LearningTour::speak_fact);
            Ok(())
        }
        Input::Category => {
            with_tour(game, LearningTour::speak_category);
            Ok(())
        }
        Input::Say => {
            with_tour(game, LearningTour::speak_current);
            Ok(())
        }
        Input::Unknown(raw) => {
            println!("unknown command: {raw} (try help)");
            Ok(())
        }
    };
    if let Err(err) = started {
        println!("cannot start: {err}");
    }
}

fn with_tour(game: &GameLoopService, f: impl FnOnce(&LearningTour)) {
    if let Some(ActiveSession::Tour(tour)) = game.active() {
        f(tour);
    }
}

fn pick(game: &mut GameLoopService, n: usize) {
    let candidate = match game.active() {
        Some(ActiveSession::Challenge(s)) => s.options().get(n).map(|o| o.item.id().clone()),
        _ => None,
    };
    if let Some(candidate) = candidate {
        game.respond(&candidate);
    } else if game.flip(n).is_none() {
        game.select(n);
    }
}

/// Run scheduled work in real time until input is unlatched, narration is
/// done and nothing else is imminent.
async fn settle(game: &mut GameLoopService) {
    game.tick().await;
    while let Some(due) = game.next_due() {
        let now = game.now();
        let busy = game.active().is_some_and(ActiveSession::is_busy);
        let quiet = due - now > Duration::milliseconds(QUIET_HORIZON_MS);
        if quiet && !busy && !game.narrator().is_speaking() {
            break;
        }
        if let Ok(wait) = (due - now).to_std() {
            tokio::time::sleep(wait).await;
        }
        game.tick().await;
    }
}

fn render(game: &GameLoopService) {
    match game.active() {
        Some(ActiveSession::Challenge(s)) if !s.is_finished() => {
            let options: Vec<String> = s
                .options()
                .iter()
                .enumerate()
                .map(|(n, o)| format!("{}) {} [{:?}]", n + 1, o.item.display_name(), o.state))
                .collect();
            println!("  {}", options.join("  "));
        }
        Some(ActiveSession::Match(s)) if !s.is_finished() => {
            let cards: Vec<String> = s
                .cards()
                .iter()
                .enumerate()
                .map(|(n, c)| match c.face {
                    Face::Down => format!("{}) ??", n + 1),
                    Face::Up => format!("{}) {}", n + 1, c.item.display_name()),
                    Face::Matched => format!("{}) ✓", n + 1),
                })
                .collect();
            println!("  {}  moves {}", cards.join("  "), s.moves());
        }
        Some(ActiveSession::Assembly(s)) if !s.is_finished() => {
            let tray: Vec<String> = s
                .pieces()
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.placed)
                .map(|(n, _)| {
                    let marker = if s.selected() == Some(n) { "*" } else { "" };
                    format!("{}{marker}", n + 1)
                })
                .collect();
            println!(
                "  pieces left {}  placed {}/{}",
                tray.join(" "),
                s.placed_count(),
                s.total_pieces()
            );
        }
        Some(ActiveSession::Tour(t)) => {
            println!(
                "  {} ({}/{})",
                t.current().display_name(),
                t.index() + 1,
                t.len()
            );
        }
        _ => {}
    }
}

/// Print every stored record.
pub async fn print_stats(progress: &ProgressService) {
    for mode in GameMode::ALL {
        if mode.is_scored() {
            let best = progress.best_score(mode).await;
            if best.total > 0 {
                println!("{mode}: best {}/{}", best.score, best.total);
            }
        }
    }
    for mode in GameMode::ALL.into_iter().filter(|m| m.is_timed()) {
        for (size, best) in progress.best_moves_by_size(mode).await {
            println!(
                "{mode} {size}: {} moves in {}",
                best.moves,
                format_elapsed(best.time)
            );
        }
    }
    println!("stars: {}", progress.total_stars().await);
    for mode in [GameMode::Learning, GameMode::Brands, GameMode::Parts] {
        let viewed = progress.viewed(mode).await.len();
        println!("{mode} viewed: {viewed}");
    }
}
