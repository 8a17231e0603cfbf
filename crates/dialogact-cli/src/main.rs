//! CLI for dialogact.
//!
//! Creates value tables, runs interactive training conversations in which a
//! human both plays the other speaker and rates every choice, and reports on
//! the learned policy and the rating journal.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dialogact_core::{
    split_coded, Action, Conversation, DialogueActTag, ResponseGenerator, TagClassifier,
};
use dialogact_feedback::{
    append_record, read_journal, RatingAnalyzer, RatingRecord, RewardStatistics,
};
use dialogact_qlearn::{
    ConsoleRewardSource, DialogueSession, HyperParameters, PolicyError, QLearner, RatingRequest,
    RewardSource, TagPairSpace, TurnOrder, Why,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh all-zero value table
    Init {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Overwrite an existing table (and drop its pending episode)
        #[arg(long)]
        force: bool,
    },
    /// Train the policy in an interactive conversation
    Chat {
        #[command(flatten)]
        table: TableArgs,

        // Only used when the table does not exist yet.
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Seed for the exploration draws
        #[arg(long)]
        seed: Option<u64>,

        /// Append every rating to this JSON-lines journal
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Print the greedy action for every state
    Policy {
        #[command(flatten)]
        table: TableArgs,

        /// Emit JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,

        /// Only states whose values have moved off zero
        #[arg(long)]
        learned: bool,
    },
    /// Summarize a rating journal
    Stats {
        /// Path to the journal
        #[arg(long, default_value = "models/qlearner/ratings.jsonl")]
        journal: PathBuf,

        /// Grouping of the summary
        #[arg(long, value_enum, default_value = "action")]
        by: GroupBy,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct TableArgs {
    /// Path to the value table
    #[arg(long, default_value = "models/qlearner/qlearner")]
    table: PathBuf,

    /// How the human's turns are told apart from the agent's
    #[arg(long, value_enum, default_value = "agent-first")]
    turn_order: TurnOrderArg,
}

#[derive(Args)]
struct ScheduleArgs {
    /// Discount factor GAMMA in [0, 1]
    #[arg(long, default_value = "0.1")]
    gamma: f64,

    /// Length of the exploration horizon EXPLORE
    #[arg(long, default_value = "1000")]
    explore: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum TurnOrderArg {
    AgentFirst,
    BySpeaker,
}

impl From<TurnOrderArg> for TurnOrder {
    fn from(arg: TurnOrderArg) -> Self {
        match arg {
            TurnOrderArg::AgentFirst => TurnOrder::AgentFirst,
            TurnOrderArg::BySpeaker => TurnOrder::BySpeaker,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Action,
    State,
}

/// Reads the tag code in front of an utterance, e.g. `qy: do you like cats?`.
struct CodeClassifier;

impl TagClassifier for CodeClassifier {
    fn classify(&mut self, text: &str, _conversation: &Conversation) -> DialogueActTag {
        let (code, _) = split_coded(text);
        DialogueActTag::from_code(code).unwrap_or(DialogueActTag::Other)
    }
}

/// Speaks the action label itself.
struct LabelGenerator;

impl ResponseGenerator for LabelGenerator {
    fn generate(&mut self, _conversation: &Conversation, action: Action) -> String {
        format!("<{}>", action.name())
    }
}

/// For commands that only inspect the table and never ask for a rating.
struct NoRater;

impl RewardSource for NoRater {
    fn request(&mut self, _request: &RatingRequest<'_>) -> io::Result<Option<String>> {
        Ok(None)
    }
}

/// Where the pending episode of `table` lives.
fn episode_path(table: &Path) -> PathBuf {
    let mut path = table.as_os_str().to_owned();
    path.push(".episode.json");
    PathBuf::from(path)
}

fn state_space(table: &TableArgs) -> TagPairSpace {
    TagPairSpace::full().with_turn_order(table.turn_order.into())
}

fn load_learner<R: RewardSource>(table: &TableArgs, rewards: R) -> Result<QLearner<R>> {
    // Placeholder schedule; load replaces it with the persisted one.
    let params = HyperParameters::new(0.0, 1)?;
    let mut learner = QLearner::with_state_space(params, state_space(table), rewards);
    learner
        .load_from_path(&table.table)
        .with_context(|| format!("Failed to load value table {:?}", table.table))?;
    Ok(learner)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_init(table: &TableArgs, schedule: &ScheduleArgs, force: bool) -> Result<()> {
    if table.table.exists() && !force {
        anyhow::bail!(
            "{:?} already exists; pass --force to overwrite it",
            table.table
        );
    }
    let params = HyperParameters::new(schedule.gamma, schedule.explore)?;
    let learner = QLearner::with_state_space(params, state_space(table), NoRater);
    learner.save_to_path(&table.table)?;

    let sidecar = episode_path(&table.table);
    if sidecar.exists() {
        std::fs::remove_file(&sidecar)
            .with_context(|| format!("Failed to remove stale episode {sidecar:?}"))?;
    }

    println!(
        "Initialized {:?}: {} states x {} actions, GAMMA={}, EXPLORE={}",
        table.table,
        learner.table().num_states(),
        learner.table().num_actions(),
        schedule.gamma,
        schedule.explore
    );
    Ok(())
}

/// Prompts until the human enters a known tag code. `None` on end of input.
fn read_human_turn() -> Result<Option<(DialogueActTag, String)>> {
    loop {
        print!("you> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        let (code, text) = split_coded(&line);
        match DialogueActTag::from_code(code) {
            Ok(tag) => return Ok(Some((tag, text.to_string()))),
            Err(e) => println!("{e}. Type a dialogue act code, optionally followed by ': text'."),
        }
    }
}

fn run_chat(
    table: &TableArgs,
    schedule: &ScheduleArgs,
    seed: Option<u64>,
    journal: Option<&Path>,
) -> Result<()> {
    let mut learner = if table.table.exists() {
        load_learner(table, ConsoleRewardSource)?
    } else {
        tracing::info!(path = ?table.table, "no value table yet, starting from zeros");
        let params = HyperParameters::new(schedule.gamma, schedule.explore)?;
        QLearner::with_state_space(params, state_space(table), ConsoleRewardSource)
    };
    if let Some(seed) = seed {
        learner = learner.with_seed(seed);
    }
    let sidecar = episode_path(&table.table);
    learner
        .load_episode(&sidecar)
        .with_context(|| format!("Failed to restore pending episode {sidecar:?}"))?;

    let mut session = DialogueSession::new(CodeClassifier, LabelGenerator, learner);
    let opening = session.open()?;
    println!("agent> {}", opening.text);

    let mut rounds = 0usize;
    let mut failure = None;
    while !session.is_over() {
        let (tag, text) = match read_human_turn() {
            Ok(Some(turn)) => turn,
            Ok(None) => {
                tracing::info!("input closed, ending the conversation");
                break;
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        };
        let reply = match session.respond_tagged(&text, tag) {
            Ok(reply) => reply,
            Err(PolicyError::RewardChannelClosed) => {
                tracing::info!("input closed while waiting for a rating, ending the conversation");
                break;
            }
            Err(err) => {
                failure = Some(err.into());
                break;
            }
        };
        println!("agent> {}", reply.text);

        if let Some(episode) = reply.decision.episode {
            rounds += 1;
            if let Some(path) = journal {
                let state = session
                    .policy()
                    .states()
                    .id_to_state(episode.state_id)
                    .unwrap_or_default();
                let record = RatingRecord::now(
                    episode.state_id,
                    state,
                    episode.action,
                    episode.reward,
                    reply.decision.anneal,
                    reply.decision.why == Why::Explore,
                );
                if let Err(err) = append_record(path, &record)
                    .with_context(|| format!("Failed to append to journal {path:?}"))
                {
                    failure = Some(err);
                    break;
                }
            }
        }
    }

    // Whatever ended the loop, the rounds rated so far are kept.
    let learner = session.finish();
    learner.save_to_path(&table.table)?;
    learner.save_episode(&sidecar)?;
    println!(
        "Saved {:?} after {} rated rounds ({} iterations of exploration left)",
        table.table,
        rounds,
        learner.params().remaining_iters()
    );
    failure.map_or(Ok(()), Err)
}

fn run_policy(table: &TableArgs, json: bool, learned: bool) -> Result<()> {
    let learner = load_learner(table, NoRater)?;
    let entries: Vec<_> = learner
        .policy()
        .into_iter()
        .filter(|entry| !learned || entry.visited)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}\t{}\t{}\t{:.4}",
            entry.state_id, entry.state, entry.action, entry.value
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsReport<'a> {
    journal: &'a Path,
    overall: RewardStatistics,
    groups: BTreeMap<String, RewardStatistics>,
    patterns: Vec<String>,
}

fn run_stats(journal: &Path, by: GroupBy, json: bool) -> Result<()> {
    let records = read_journal(journal)
        .with_context(|| format!("Failed to read journal {journal:?}"))?;
    let analyzer = RatingAnalyzer::default();
    let report = StatsReport {
        journal,
        overall: analyzer.summarize(&records),
        groups: match by {
            GroupBy::Action => analyzer.by_action(&records),
            GroupBy::State => analyzer.by_state(&records),
        },
        patterns: analyzer.analyze_patterns(&records),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "{} ratings, mean reward {:.2}",
        report.overall.count,
        report.overall.mean()
    );
    for (key, stats) in &report.groups {
        println!(
            "{key}\tn={}\tmean={:.2}\tmin={}\tmax={}",
            stats.count,
            stats.mean(),
            stats.min.unwrap_or_default(),
            stats.max.unwrap_or_default()
        );
    }
    for pattern in &report.patterns {
        println!("! {pattern}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init {
            table,
            schedule,
            force,
        } => run_init(&table, &schedule, force),
        Commands::Chat {
            table,
            schedule,
            seed,
            journal,
        } => run_chat(&table, &schedule, seed, journal.as_deref()),
        Commands::Policy {
            table,
            json,
            learned,
        } => run_policy(&table, json, learned),
        Commands::Stats { journal, by, json } => run_stats(&journal, by, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_sidecar_sits_next_to_the_table() {
        assert_eq!(
            episode_path(Path::new("models/qlearner/qlearner")),
            PathBuf::from("models/qlearner/qlearner.episode.json")
        );
    }

    #[test]
    fn code_classifier_falls_back_to_other() {
        let convo = Conversation::new();
        assert_eq!(
            CodeClassifier.classify("qy: cats?", &convo),
            DialogueActTag::QuestionYesNo
        );
        assert_eq!(
            CodeClassifier.classify("<YES_NO_ANSWER>", &convo),
            DialogueActTag::Other
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
