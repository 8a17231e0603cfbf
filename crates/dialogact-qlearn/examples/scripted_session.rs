//! Plays one conversation from stdin against a fresh learner and prints every
//! decision as a JSON line.
//!
//! Each input line is a human turn `code[: text]`. Every rated choice gets the
//! rating given as the first argument (default 3); the optional second
//! argument seeds the generator.

use dialogact_core::{
    split_coded, Action, Conversation, DialogueActTag, ResponseGenerator, TagClassifier,
};
use dialogact_qlearn::{
    Decision, DialogueSession, HyperParameters, QLearner, Reply, ScriptedRewardSource,
};
use serde::Serialize;
use std::io::{self, BufRead};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Serialize)]
struct DecisionRecord<'a> {
    ts: String,
    round: usize,
    human: Option<DialogueActTag>,
    reply: &'a str,
    decision: &'a Decision,
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

struct Untagged;

impl TagClassifier for Untagged {
    fn classify(&mut self, _text: &str, _conversation: &Conversation) -> DialogueActTag {
        DialogueActTag::Other
    }
}

struct Labels;

impl ResponseGenerator for Labels {
    fn generate(&mut self, _conversation: &Conversation, action: Action) -> String {
        format!("[{}]", action.name().to_lowercase())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let rating = args.next().unwrap_or_else(|| "3".to_string());
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(7);

    let lines: Vec<String> = io::stdin()
        .lock()
        .lines()
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect();

    let rewards = ScriptedRewardSource::new(std::iter::repeat(rating).take(lines.len()));
    let policy = QLearner::new(HyperParameters::new(0.1, 1000)?, rewards).with_seed(seed);
    let mut session = DialogueSession::new(Untagged, Labels, policy);

    let emit = |round: usize, human: Option<DialogueActTag>, reply: &Reply| {
        let record = DecisionRecord {
            ts: iso8601_now(),
            round,
            human,
            reply: &reply.text,
            decision: &reply.decision,
        };
        serde_json::to_string(&record).map(|json| println!("{json}"))
    };

    let opening = session.open()?;
    emit(0, None, &opening)?;

    for (round, line) in lines.iter().enumerate() {
        if session.is_over() {
            break;
        }
        let (code, text) = split_coded(line);
        let tag = DialogueActTag::from_code(code)?;
        let reply = session.respond_tagged(text, tag)?;
        emit(round + 1, Some(tag), &reply)?;
    }

    let policy = session.finish();
    eprintln!(
        "{} rounds rated, {} iterations of exploration left",
        policy.rewards().requests(),
        policy.params().remaining_iters()
    );
    Ok(())
}
