use anyhow::Context;
use chrono::{Duration, Utc};
use commentary_api::{NewComment, Time};
use rand::Rng;

const NUM_USERS: usize = 8;
const NUM_COMMENTS: usize = 120;

const USERNAME_WORDS: usize = 2;
const MAX_COMMENT_WORDS: usize = 60;

// Comments are spread over the last SPREAD_HOURS, newest last
const SPREAD_HOURS: i64 = 72;

// Some rows carry markup, to check that it gets displayed escaped
const MARKUP_ONE_IN: usize = 15;

fn gen_username(rng: &mut impl Rng) -> String {
    lipsum::lipsum_words_with_rng(&mut *rng, USERNAME_WORDS).replace('.', "")
}

fn gen_content(rng: &mut impl Rng) -> String {
    let words = rng.gen_range(1..=MAX_COMMENT_WORDS);
    let text = lipsum::lipsum_words_with_rng(&mut *rng, words);
    match rng.gen_range(0..MARKUP_ONE_IN) {
        0 => format!("<b>{text}</b> <script>alert('hi')</script>"),
        _ => text,
    }
}

fn gen_dates(rng: &mut impl Rng, n: usize) -> Vec<Time> {
    let now = Utc::now();
    let mut dates = (0..n)
        .map(|_| now - Duration::minutes(rng.gen_range(0..SPREAD_HOURS * 60)))
        .collect::<Vec<_>>();
    dates.sort();
    dates
}

/// Print a JSON array of rows, ready to be POSTed to the comments table
fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|_| gen_username(&mut rng))
        .collect::<Vec<_>>();
    let dates = gen_dates(&mut rng, NUM_COMMENTS);
    let rows = dates
        .into_iter()
        .map(|created_at| {
            let c = NewComment {
                username: users[rng.gen_range(0..users.len())].clone(),
                content: gen_content(&mut rng),
            };
            serde_json::json!({
                "username": c.username,
                "content": c.content,
                "created_at": created_at,
            })
        })
        .collect::<Vec<_>>();
    let json = serde_json::to_string_pretty(&rows).context("serializing test data")?;
    println!("{json}");
    Ok(())
}
