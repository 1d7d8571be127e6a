//! Plan Command
//!
//! Runs the planning pipeline for one trip request and prints the
//! itinerary. With `--interactive`, follow-up instructions are read from
//! stdin one line at a time and routed through the orchestrator until the
//! user quits.

use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::ai::provider::create_provider;
use crate::config::Config;
use crate::geo::{MapboxGeocoder, SharedGeocoder};
use crate::pipeline::{
    ExtractionLimits, ItineraryGenerator, Orchestrator, PlannerSession, SessionPhase, TurnReply,
};
use crate::types::{Place, Result, TripRequest};

/// Plan command options (from CLI arguments)
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// The raw trip request text
    pub request: String,
    /// Cap on trip length, overriding the configured maximum
    pub days_limit: Option<u32>,
    /// Read follow-up instructions from stdin
    pub interactive: bool,
    /// Model override
    pub model: Option<String>,
}

pub async fn run(options: PlanOptions, mut config: Config) -> Result<()> {
    if let Some(model) = options.model {
        config.llm.model = Some(model);
    }

    let provider = create_provider(&config.llm)?;
    let geocoder: SharedGeocoder = Arc::new(MapboxGeocoder::new(config.geocoder.clone())?);
    let retry = config.planner.retry.to_policy();

    let generator = ItineraryGenerator::new(provider.clone(), geocoder.clone(), retry.clone())
        .with_places_per_day(config.planner.places_per_day)
        .with_geocode_parallelism(config.planner.geocode_parallelism);
    let limits = ExtractionLimits {
        max_days: options.days_limit.unwrap_or(config.planner.max_days),
    };
    let orchestrator = Orchestrator::new(provider, geocoder, retry)
        .with_generator(generator)
        .with_limits(limits);

    let mut session = PlannerSession::new();
    let reply = orchestrator
        .submit_request(&mut session, &TripRequest::new(&options.request))
        .await;
    render_reply(&reply);

    if !options.interactive {
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style("Follow-up instructions go here. 'quit' to exit.").dim()
    );

    let stdin = io::stdin();
    loop {
        print!("{} ", style(">").cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let instruction = line.trim();
        if instruction.is_empty() {
            continue;
        }
        if matches!(instruction, "quit" | "exit" | "q") {
            break;
        }

        let reply = orchestrator.handle_turn(&mut session, instruction).await;
        render_reply(&reply);
        if session.phase() == SessionPhase::Error {
            println!("{}", style("Your itinerary was left unchanged.").dim());
        }
    }

    Ok(())
}

fn render_reply(reply: &TurnReply) {
    match reply {
        TurnReply::Modification { places, response } => {
            println!("{} {}", style("✓").green(), response);
            println!();
            for (i, place) in places.iter().enumerate() {
                render_place(i + 1, place);
            }
        }
        TurnReply::Answer { response } => {
            println!("{} {}", style("ℹ").blue(), response);
        }
    }
}

fn render_place(position: usize, place: &Place) {
    let mut line = format!(
        "{:>3}. {} {}",
        position,
        style(&place.name).bold(),
        style(format!("[{}]", place.category)).magenta(),
    );
    if let Some(neighborhood) = &place.neighborhood {
        line.push_str(&format!("  {}", style(neighborhood).dim()));
    }
    println!("{line}");

    if let Some(address) = &place.address {
        println!("       {}", style(address).dim());
    }
    match &place.coordinates {
        Some(c) => println!("       {}", style(format!("{:.4}, {:.4}", c.lat, c.lon)).dim()),
        None => println!("       {}", style("(not on the map)").yellow()),
    }
    if let Some(notes) = &place.notes {
        println!("       {notes}");
    }
}
