use dialogact_core::{split_coded, Conversation, DialogueActTag, Speaker};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut convo = Conversation::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (code, text) = split_coded(&line);
        let tag = DialogueActTag::from_code(code).unwrap_or(DialogueActTag::Other);
        // Agent opens, speakers alternate.
        if convo.len() % 2 == 0 {
            convo.push_agent(text, tag);
        } else {
            convo.push_human(text, tag);
        }

        if let Some(turn) = convo.last() {
            let who = match turn.speaker {
                Speaker::Agent => "agent",
                Speaker::Human => "human",
            };
            println!(
                "{who}\t{}\t{}",
                turn.tag,
                if turn.text.is_empty() { "<silent>" } else { &turn.text }
            );
        }
    }

    Ok(())
}
