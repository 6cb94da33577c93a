use clap::Parser;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;
use uno_engine::autoplay::StandardAutoPlayer;
use uno_engine::card::{Card, Color};
use uno_engine::scores::{HighScores, JsonScoreStore};
use uno_engine::table::{GameTable, Notification, TableConfig};
use uno_engine::PlayerId;

/// Terminal frontend for the card game engine. Players share one keyboard
/// and prefix game commands with their name.
#[derive(Debug, Parser)]
#[command(name = "uno-engine", version, about)]
struct Args {
    /// Where high scores are persisted.
    #[arg(long, default_value = "highscores.json")]
    scores: String,

    /// Seconds an idle player gets before their turn is played for them.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Name of the player opening the table.
    #[arg(long, default_value = "player1")]
    name: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let scores = Arc::new(Mutex::new(HighScores::new(Box::new(JsonScoreStore::new(
        &args.scores,
    )))));
    let config = TableConfig {
        min_participants: 2,
        turn_timeout: Duration::from_secs(args.timeout),
    };
    let (sink, mut timer_notes) = unbounded_channel();
    let (table, notes) = GameTable::new_game(
        PlayerId::new(args.name.clone()),
        config,
        Arc::clone(&scores),
        Box::new(StandardAutoPlayer),
        sink,
    );
    render_all(&notes);

    // timer-driven notifications arrive out of band
    tokio::spawn(async move {
        while let Some(note) = timer_notes.recv().await {
            render(&note);
        }
    });

    println!("Commands: join <name> | bot | start | <name> play <card> | <name> draw");
    println!("         | <name> pass | <name> color <r/g/b/y> | <name> cards");
    println!("         | <name> moves | <name> colors | scores | stop | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let words: Vec<&str> = line.split_whitespace().collect();
        debug!("command: {:?}", words);
        match words.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["join", name] => report(table.join(PlayerId::new(*name))),
            ["bot"] => report(table.add_bot()),
            ["start"] => report(table.start()),
            ["stop"] => report(table.stop()),
            ["scores"] => {
                for (player, points) in scores.lock().unwrap().top(10) {
                    println!("  {:>5}  {}", points, player);
                }
            }
            [name, "play", card] => report(table.play(&PlayerId::new(*name), card)),
            [name, "draw"] => report(table.draw(&PlayerId::new(*name))),
            [name, "pass"] => report(table.pass(&PlayerId::new(*name))),
            [name, "color", color] => report(table.choose_color(&PlayerId::new(*name), color)),
            [name, "cards"] => match table.hand(&PlayerId::new(*name)) {
                Ok(cards) => println!("  hand: {}", card_list(&cards, true)),
                Err(rejection) => println!("! {}", rejection),
            },
            [name, "moves"] => match table.valid_moves(&PlayerId::new(*name)) {
                Ok(cards) => println!("  playable: {}", card_list(&cards, true)),
                Err(rejection) => println!("! {}", rejection),
            },
            [name, "colors"] => match table.toggle_colors(&PlayerId::new(*name)) {
                Ok(on) => println!("  colored card listings: {}", if on { "on" } else { "off" }),
                Err(rejection) => println!("! {}", rejection),
            },
            _ => println!("! unrecognized command"),
        }
    }
}

fn report(result: Result<Vec<Notification>, uno_engine::Rejection>) {
    match result {
        Ok(notes) => render_all(&notes),
        Err(rejection) => println!("! {}", rejection),
    }
}

fn render_all(notes: &[Notification]) {
    for note in notes {
        render(note);
    }
}

fn render(note: &Notification) {
    match note {
        Notification::GameOpened { player } => {
            println!("{} opened a game; others may join now", player)
        }
        Notification::PlayerJoined { player } => println!("{} joined the game", player),
        Notification::BotJoined { player } => println!("{} (bot) joined the game", player),
        Notification::GameStarted {
            participants,
            top_card,
        } => {
            let names: Vec<String> = participants.iter().map(|p| p.to_string()).collect();
            println!(
                "game started with {}; top card is {}",
                names.join(", "),
                paint(top_card, true)
            );
        }
        Notification::TurnAnnounce { player, top_card } => {
            println!("it is {}'s turn; top card is {}", player, paint(top_card, true))
        }
        Notification::HandNotice {
            player,
            cards,
            colored,
        } => println!("[{}] your hand: {}", player, card_list(cards, *colored)),
        Notification::CardPlayed { player, card } => {
            println!("{} plays {}", player, paint(card, true))
        }
        Notification::Drew { player } => println!("{} draws a card", player),
        Notification::Passed { player } => println!("{} passes", player),
        Notification::Repiled => println!("the draw pile ran out; the discards were reshuffled"),
        Notification::OrderReversed { order } => {
            let names: Vec<String> = order.iter().map(|p| p.to_string()).collect();
            println!("play order reversed: {}", names.join(", "));
        }
        Notification::TurnSkipped {
            player,
            two_player_rule,
        } => {
            if *two_player_rule {
                println!("{} is skipped (reverse acts as skip head-to-head)", player);
            } else {
                println!("{} is skipped", player);
            }
        }
        Notification::DrewPenalty { player, count } => {
            println!("{} must draw {} cards", player, count)
        }
        Notification::NewCards {
            player,
            cards,
            colored,
        } => println!("[{}] you drew: {}", player, card_list(cards, *colored)),
        Notification::Uno { player } => println!("{} has UNO!", player),
        Notification::AwaitingColor { player } => {
            println!("{} must pick a color (r/g/b/y)", player)
        }
        Notification::ColorChosen { player, color } => {
            println!("{} picks {}", player, color.name())
        }
        Notification::AutoPlaying { player } => println!("playing for {}...", player),
        Notification::Win {
            winner,
            points,
            leftovers,
        } => {
            println!("{} wins with {} points!", winner, points);
            for (player, cards) in leftovers {
                println!("  {} was left holding {}", player, card_list(cards, true));
            }
        }
        Notification::NewHighScore { player, points } => {
            println!("{} set a new personal best of {} points", player, points)
        }
        Notification::GameStopped => println!("the game was stopped"),
    }
}

fn card_list(cards: &[Card], colored: bool) -> String {
    let rendered: Vec<String> = cards.iter().map(|card| paint(card, colored)).collect();
    rendered.join(" ")
}

/// ANSI-colors the canonical card string when the owner wants colors.
fn paint(card: &Card, colored: bool) -> String {
    if !colored {
        return card.to_string();
    }
    let code = match card.color {
        Color::Red => "31",
        Color::Green => "32",
        Color::Blue => "34",
        Color::Yellow => "33",
        Color::Wild => "35",
    };
    format!("\x1b[{}m{}\x1b[0m", code, card)
}
