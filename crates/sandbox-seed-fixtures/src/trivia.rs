//! The downloaded Jeopardy fixture.

use std::time::Duration;

use colored::Colorize;
use reqwest::blocking::Client;
use sandbox_seed_store::{Record, VectorStore};
use serde_json::{json, Value};

use crate::batch::{insert_prepared, BatchReport, InsertFailure};
use crate::catalog::JEOPARDY_QUESTION;
use crate::FixtureError;

pub const TRIVIA_FIXTURE_URL: &str =
    "https://raw.githubusercontent.com/weaviate-tutorials/edu-datasets/main/jeopardy_100.json";

pub const TRIVIA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const PROGRESS_EVERY: usize = 10;

/// Download the fixture: a single GET returning a JSON array.
pub fn fetch_trivia_rows(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<Value>, FixtureError> {
    tracing::debug!(url, "downloading trivia fixture");
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .map_err(|source| FixtureError::Http {
            url: url.to_string(),
            source,
        })?;

    if !resp.status().is_success() {
        return Err(FixtureError::Status {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }

    resp.json::<Vec<Value>>()
        .map_err(|source| FixtureError::Decode {
            url: url.to_string(),
            source,
        })
}

/// Dollar amounts come as numbers, as `"$1,200"` strings, or not at all.
fn parse_value(raw: Option<&Value>) -> Result<i64, FixtureError> {
    match raw {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| FixtureError::Malformed(format!("Value {n} is out of range"))),
        Some(Value::String(s)) => {
            let digits: String = s.chars().filter(|c| !matches!(c, '$' | ',')).collect();
            let digits = digits.trim();
            if digits.is_empty() {
                return Ok(0);
            }
            digits
                .parse::<i64>()
                .map_err(|_| FixtureError::Malformed(format!("Value {s:?} is not an amount")))
        }
        Some(other) => Err(FixtureError::Malformed(format!(
            "Value {other} is not an amount"
        ))),
    }
}

fn required_text<'a>(row: &'a Value, key: &str) -> Result<&'a str, FixtureError> {
    row.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FixtureError::Malformed(format!("missing {key}")))
}

/// Map one fixture row to a `JeopardyQuestion` record.
pub fn trivia_record(index: usize, row: &Value) -> Result<Record, FixtureError> {
    let question = required_text(row, "Question")?;
    let answer = required_text(row, "Answer")?;
    let round = required_text(row, "Round")?;
    let value = parse_value(row.get("Value"))?;

    Ok(Record::new(question_label(index))
        .property("question", json!(question))
        .property("answer", json!(answer))
        .property("round", json!(round))
        .property("value", json!(value)))
}

fn question_label(index: usize) -> String {
    format!("Jeopardy question {}", index + 1)
}

/// Insert every row individually; malformed rows count as failures.
pub fn load_trivia<S>(store: &S, rows: &[Value]) -> BatchReport
where
    S: VectorStore + ?Sized,
{
    println!("Starting Jeopardy data import...");
    let prepared = rows.iter().enumerate().map(|(i, row)| {
        trivia_record(i, row).map_err(|err| InsertFailure {
            label: question_label(i),
            reason: err.to_string(),
        })
    });
    let report = insert_prepared(store, JEOPARDY_QUESTION, prepared, PROGRESS_EVERY);
    println!(
        "{} Successfully imported {} out of {} Jeopardy questions",
        "✓".green(),
        report.succeeded(),
        rows.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Value {
        json!({
            "Question": "This organ removes excess glucose from the blood",
            "Answer": "Liver",
            "Round": "Jeopardy!",
            "Value": value,
        })
    }

    #[test]
    fn dollar_strings_and_numbers_become_ints() {
        for (raw, expected) in [
            (json!(100), 100),
            (json!("$1,200"), 1200),
            (json!("$400"), 400),
            (json!(200.0), 200),
            (Value::Null, 0),
        ] {
            let record = trivia_record(0, &row(raw)).unwrap();
            assert_eq!(record.properties["value"], json!(expected));
        }
    }

    #[test]
    fn missing_value_defaults_to_zero() {
        let mut r = row(Value::Null);
        r.as_object_mut().unwrap().remove("Value");
        let record = trivia_record(4, &r).unwrap();
        assert_eq!(record.properties["value"], json!(0));
        assert_eq!(record.label, "Jeopardy question 5");
    }

    #[test]
    fn rows_without_required_text_are_malformed() {
        let r = json!({ "Question": "q", "Round": "Double Jeopardy!" });
        assert!(matches!(
            trivia_record(0, &r),
            Err(FixtureError::Malformed(msg)) if msg.contains("Answer")
        ));
        assert!(trivia_record(0, &row(json!("lots"))).is_err());
    }

    #[test]
    fn unreachable_host_is_an_http_error() {
        let client = Client::new();
        let err = fetch_trivia_rows(&client, "http://127.0.0.1:1/jeopardy.json", Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, FixtureError::Http { .. }));
    }
}
