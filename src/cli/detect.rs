// src/cli/detect.rs
// Detect command: stream a detection from a running server

use anyhow::{Context, Result};
use std::io::Write;

use crate::detect::{DetectionOutcome, DetectionPayload, DetectionRequest};
use crate::remote::RemoteClient;

pub async fn run_detect(
    server: &str,
    text: Option<String>,
    url: Option<String>,
    date: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    // Same validation the server applies, without a round trip
    let request = DetectionRequest::new(text, url, date)?;
    let payload = DetectionPayload {
        original_tweet: request.original_text().map(str::to_string),
        original_date: request.original_date().map(str::to_string),
        tweet_url: request.original_url().map(str::to_string),
    };

    let echo = !quiet && !json;
    let client = RemoteClient::new(server);
    let outcome = client
        .detect(&payload, |chunk| {
            if echo {
                eprint!("{}", chunk);
                let _ = std::io::stderr().flush();
            }
        })
        .await
        .context("detection failed")?;

    if echo {
        eprintln!();
    }

    // The done event nests the model output under `result`; print only that
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        print_report(&outcome);
    }
    Ok(())
}

fn print_report(outcome: &DetectionOutcome) {
    println!("Finished in {:.1}s", outcome.processing_time_ms as f64 / 1000.0);

    let Some(report) = outcome.result.report() else {
        if let Some(raw) = outcome.result.raw_response() {
            println!("Response was not valid JSON, raw output follows:\n{}", raw);
        } else {
            println!("Unrecognized result shape");
        }
        return;
    };

    let copycats: Vec<_> = report.copycats().collect();
    if copycats.is_empty() {
        println!("No copycats found.");
    }

    for (i, m) in copycats.iter().enumerate() {
        println!("\n{}. {} (confidence: {})", i + 1, m.suspect, m.confidence);
        if let Some(tweet) = &m.matched_tweet {
            if !tweet.url.is_empty() {
                println!("   {}", tweet.url);
            }
            if !tweet.similarity.is_empty() {
                println!("   similarity: {}", tweet.similarity);
            }
        }
        if !m.explanation.is_empty() {
            println!("   {}", m.explanation);
        }
    }

    if let Some(summary) = &report.summary {
        println!("\n{}", summary);
    }
}
