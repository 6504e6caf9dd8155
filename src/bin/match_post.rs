use console::Style;
use district_pulse::analyze::topics::match_topics;
use district_pulse::db::Topic;
use district_pulse::settings::settings;
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: match-post <text>");
    eprintln!();
    eprintln!("Runs the topic relevance matcher over ad-hoc text using the");
    eprintln!("configured topic seed list and prints the per-topic scores.");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        process::exit(1);
    }
    let text = args.join(" ");

    // Topic ids here are positional; the seeds have no database identity.
    let topics: Vec<Topic> = settings()
        .topics
        .iter()
        .enumerate()
        .map(|(i, seed)| Topic {
            topic_id: i as i32 + 1,
            name: seed.name.clone(),
            category: seed.category.clone(),
            keywords: serde_json::to_string(&seed.keywords).unwrap_or_else(|_| "[]".into()),
            active: true,
        })
        .collect();

    let matches = match_topics(&text, &[], &topics);

    let bold = Style::new().bold();
    let dim = Style::new().dim();
    let green = Style::new().green();

    println!("{}", dim.apply_to(&text));
    println!();

    if matches.is_empty() {
        println!(
            "no topics above the {} threshold",
            bold.apply_to(settings().matcher.relevance_threshold)
        );
        return;
    }

    for m in &matches {
        let topic = &topics[(m.topic_id - 1) as usize];
        let text_lower = text.to_lowercase();
        let hits: Vec<String> = topic
            .keyword_list()
            .into_iter()
            .filter(|kw| text_lower.contains(&kw.to_lowercase()))
            .collect();

        println!(
            "{} {} {}",
            green.apply_to(format!("{:.2}", m.relevance)),
            bold.apply_to(&topic.name),
            dim.apply_to(format!("[{}]", hits.join(", ")))
        );
    }
}
