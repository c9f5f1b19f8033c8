// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songform::composer::{seeded_rng, Composer, CompositionDirector};
use songform::config::ComposerFile;
use songform::generators::Generators;
use songform::sequencer::{PartPool, ScheduledEvent, Scheduler};
use songform::timing::{StepClock, StepTime};

fn print_usage() {
    println!("songform - procedural song-structure composer");
    println!();
    println!("Usage: songform [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>   Composition file (.yaml or .toml)");
    println!("  --loops <N>       Render N pattern loops offline and print the events (default 8)");
    println!("  --play            Run in real time until Ctrl+C");
    println!("  --seed <N>        Seed for a reproducible run");
    println!("  --help            Show this help message");
}

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    loops: Option<u32>,
    play: bool,
    seed: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config = Some(PathBuf::from(path));
            }
            "--loops" => {
                let value = iter.next().ok_or_else(|| anyhow!("--loops requires a count"))?;
                options.loops = Some(
                    value
                        .parse()
                        .map_err(|_| anyhow!("Invalid loop count: {}", value))?,
                );
            }
            "--seed" => {
                let value = iter.next().ok_or_else(|| anyhow!("--seed requires a number"))?;
                options.seed = Some(value.parse().map_err(|_| anyhow!("Invalid seed: {}", value))?);
            }
            "--play" => options.play = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
    }

    Ok(Some(options))
}

/// Everything a run needs, wired together
struct Session {
    composer: Composer,
    clock: StepClock,
    scheduler: Rc<RefCell<Scheduler>>,
    pool: Rc<PartPool>,
}

impl Session {
    fn build(file: &ComposerFile, seed: Option<u64>) -> Result<Self> {
        let settings = file.settings().context("Invalid composition settings")?;
        let catalog = file.catalog().context("Invalid section table")?;
        let pool = Rc::new(file.pool().context("Invalid ensemble")?);
        let scheduler = Rc::new(RefCell::new(Scheduler::new()));

        let director = CompositionDirector::new(
            settings,
            catalog,
            Rc::clone(&pool),
            scheduler.clone(),
            Box::new(seeded_rng(seed)),
            Box::new(move || Generators::builtin(seed)),
        );

        Ok(Self {
            composer: Composer::new(director),
            clock: StepClock::new(settings.tempo),
            scheduler,
            pool,
        })
    }

    fn start(&mut self) -> Result<()> {
        self.clock.start();
        self.composer
            .start(&mut self.clock)
            .context("Failed to start composition")
    }

    /// Play one step and print whatever falls due
    fn step(&mut self) -> Result<Option<StepTime>> {
        let Some(now) = self.clock.tick()? else {
            return Ok(None);
        };
        let due = self.scheduler.borrow_mut().poll(now.step);
        for event in due {
            self.print_event(now, &event);
        }
        Ok(Some(now))
    }

    fn print_event(&self, now: StepTime, event: &ScheduledEvent) {
        let (name, channel) = self
            .pool
            .get(event.destination)
            .map(|d| (d.name.as_str(), d.channel))
            .unwrap_or(("?", 0));
        let bytes = event.to_midi_bytes(channel);
        println!(
            "{:>6} {:>8.3}s  {:<9} ch{:<2}  {:02X} {:02X} {:02X}",
            event.time_step, now.time, name, channel + 1, bytes[0], bytes[1], bytes[2]
        );
    }

    fn stop(&mut self) {
        self.composer.stop(&mut self.clock);
        self.clock.stop();
    }
}

/// Render `loops` pattern loops as fast as possible
fn render(session: &mut Session, loops: u32) -> Result<()> {
    let mut played = 0;
    while played < loops {
        let Some(now) = session.step()? else { break };
        if now.step + 1 == session.composer.director().pattern_step() {
            played += 1;
        }
    }
    info!(loops = played, steps = session.clock.step(), "Render complete");
    Ok(())
}

/// Tick in real time until Ctrl+C
async fn play(session: &mut Session) -> Result<()> {
    let mut interval = tokio::time::interval(session.clock.step_duration());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(bpm = session.clock.bpm(), "Playing (press Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.step()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("songform=info"))
        .context("Invalid log filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            print_usage();
            std::process::exit(1);
        }
    };

    let file = match &options.config {
        Some(path) => ComposerFile::load(path)?,
        None => ComposerFile::default(),
    };
    let seed = options.seed.or(file.composition.seed);

    let mut session = Session::build(&file, seed)?;
    session.start()?;

    let result = if options.play {
        play(&mut session).await
    } else {
        render(&mut session, options.loops.unwrap_or(8))
    };

    if let Err(err) = &result {
        error!("Playback halted: {:#}", err);
    }
    session.stop();
    result
}
